use std::ops::Not;

use http::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Client, NO_BODY};
use crate::context::Context;
use crate::error::ApiError;
use crate::query::{add_options, ListOptions};
use crate::timestamp::Timestamp;
use crate::types::{AccountRef, Page};

use super::Tag;

/// A person in the address book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub id: u64,
    pub object: String,
    pub hash_id: String,

    pub first_name: String,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub gender: Option<String>,
    pub description: Option<String>,

    pub birthdate_day: Option<u32>,
    pub birthdate_month: Option<u32>,
    pub birthdate_year: Option<i32>,
    pub is_birthdate_known: bool,
    pub birthdate_is_age_based: bool,
    pub birthdate_age: Option<u32>,

    pub is_partial: bool,

    pub is_deceased: bool,
    pub deceased_date_day: Option<u32>,
    pub deceased_date_month: Option<u32>,
    pub deceased_date_year: Option<i32>,
    pub deceased_date_is_age_based: bool,
    pub is_deceased_date_known: bool,

    pub information: Option<ContactInformation>,
    pub tags: Vec<Tag>,

    pub account: AccountRef,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInformation {
    pub career: Career,
}

/// Job and company of a contact. Also the body of the career update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Career {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Request body for creating or updating a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactInput {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub gender_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate_day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate_year: Option<i32>,
    pub is_birthdate_known: bool,
    #[serde(skip_serializing_if = "Not::not")]
    pub birthdate_is_age_based: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate_age: Option<u32>,

    #[serde(skip_serializing_if = "Not::not")]
    pub is_partial: bool,

    pub is_deceased: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceased_date_day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceased_date_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceased_date_year: Option<i32>,
    #[serde(skip_serializing_if = "Not::not")]
    pub deceased_date_is_age_based: bool,
    pub is_deceased_date_known: bool,
}

/// Copies the editable fields of an existing contact. The API reports the
/// gender by name only, so `gender_id` is left at 0 and must be set by the
/// caller; the description is not carried over either.
impl From<&Contact> for ContactInput {
    fn from(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            nickname: contact.nickname.clone(),
            gender_id: 0,
            description: None,
            birthdate_day: contact.birthdate_day,
            birthdate_month: contact.birthdate_month,
            birthdate_year: contact.birthdate_year,
            is_birthdate_known: contact.is_birthdate_known,
            birthdate_is_age_based: contact.birthdate_is_age_based,
            birthdate_age: contact.birthdate_age,
            is_partial: contact.is_partial,
            is_deceased: contact.is_deceased,
            deceased_date_day: contact.deceased_date_day,
            deceased_date_month: contact.deceased_date_month,
            deceased_date_year: contact.deceased_date_year,
            deceased_date_is_age_based: contact.deceased_date_is_age_based,
            is_deceased_date_known: contact.is_deceased_date_known,
        }
    }
}

/// Search and pagination parameters for `search_contacts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactSearchListOptions {
    #[serde(flatten)]
    pub list: ListOptions,

    /// Free-text search over names, nicknames and contact fields.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub query: String,
}

#[derive(Serialize)]
struct SetTagsInput<'a> {
    tags: &'a [String],
}

/// Contact endpoints.
pub struct ContactsService<'a> {
    client: &'a Client,
}

impl<'a> ContactsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// List contacts, optionally filtered by a search query.
    pub async fn search_contacts(
        &self,
        ctx: &Context,
        opts: Option<&ContactSearchListOptions>,
    ) -> Result<Page<Contact>, ApiError> {
        let path = add_options("contacts", opts)?;
        let req = self.client.new_request(Method::GET, &path, NO_BODY)?;
        self.client.fetch_page(ctx, req).await
    }

    pub async fn get_contact(&self, ctx: &Context, id: u64) -> Result<Contact, ApiError> {
        let req = self.client.new_request(Method::GET, &format!("contacts/{id}"), NO_BODY)?;
        self.client.fetch_data(ctx, req).await
    }

    pub async fn create_contact(&self, ctx: &Context, input: &ContactInput) -> Result<Contact, ApiError> {
        let req = self.client.new_request(Method::POST, "contacts", Some(input))?;
        self.client.fetch_data(ctx, req).await
    }

    pub async fn update_contact(&self, ctx: &Context, id: u64, input: &ContactInput) -> Result<Contact, ApiError> {
        let req = self.client.new_request(Method::PUT, &format!("contacts/{id}"), Some(input))?;
        self.client.fetch_data(ctx, req).await
    }

    /// Set the job and company of a contact. `None` fields are left out of
    /// the request.
    pub async fn update_contact_career(
        &self,
        ctx: &Context,
        id: u64,
        job: Option<&str>,
        company: Option<&str>,
    ) -> Result<Contact, ApiError> {
        let body = Career {
            job: job.map(str::to_string),
            company: company.map(str::to_string),
        };
        let req = self.client.new_request(Method::PUT, &format!("contacts/{id}/work"), Some(&body))?;
        self.client.fetch_data(ctx, req).await
    }

    /// Attach tags by name, creating the ones that do not exist yet.
    pub async fn add_tags(&self, ctx: &Context, id: u64, tags: &[String]) -> Result<Contact, ApiError> {
        let body = SetTagsInput { tags };
        let req = self.client.new_request(Method::POST, &format!("contacts/{id}/setTags"), Some(&body))?;
        self.client.fetch_data(ctx, req).await
    }

    pub async fn delete_contact(&self, ctx: &Context, id: u64) -> Result<(), ApiError> {
        let req = self.client.new_request(Method::DELETE, &format!("contacts/{id}"), NO_BODY)?;
        self.client.execute(ctx, req).await
    }
}
