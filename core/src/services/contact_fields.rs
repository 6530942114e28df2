use http::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Client, NO_BODY};
use crate::context::Context;
use crate::error::ApiError;
use crate::query::{add_options, ListOptions};
use crate::timestamp::Timestamp;
use crate::types::{AccountRef, Page};

use super::Contact;

/// Kind of contact detail (email, phone, a social network...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactFieldType {
    pub id: u64,
    pub object: String,
    pub name: String,
    /// e.g. `"fa fa-envelope-open-o"`
    pub fontawesome_icon: Option<String>,
    /// URI scheme used to render the value as a link, e.g. `"mailto:"`.
    pub protocol: Option<String>,
    /// Whether the account may delete this type.
    pub delible: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub account: AccountRef,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// One concrete detail of a contact, such as an email address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactField {
    pub id: u64,
    pub object: String,
    pub data: String,
    pub contact_field_type: ContactFieldType,
    pub account: AccountRef,
    pub contact: Contact,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// Request body for creating or updating a contact field. `data` is limited
/// to 255 characters by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactFieldInput {
    pub contact_field_type_id: u64,
    pub contact_id: u64,
    pub data: String,
}

/// Contact field type endpoints.
pub struct ContactFieldTypesService<'a> {
    client: &'a Client,
}

impl<'a> ContactFieldTypesService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list_contact_field_types(
        &self,
        ctx: &Context,
        opts: Option<&ListOptions>,
    ) -> Result<Page<ContactFieldType>, ApiError> {
        let path = add_options("contactfieldtypes", opts)?;
        let req = self.client.new_request(Method::GET, &path, NO_BODY)?;
        self.client.fetch_page(ctx, req).await
    }

    pub async fn get_contact_field_type(&self, ctx: &Context, id: u64) -> Result<ContactFieldType, ApiError> {
        let req = self.client.new_request(Method::GET, &format!("contactfieldtypes/{id}"), NO_BODY)?;
        self.client.fetch_data(ctx, req).await
    }
}

/// Contact field endpoints. Fields are listed per contact but created and
/// addressed through the top-level `contactfields` collection.
pub struct ContactFieldsService<'a> {
    client: &'a Client,
}

impl<'a> ContactFieldsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list_contact_fields(
        &self,
        ctx: &Context,
        contact_id: u64,
        opts: Option<&ListOptions>,
    ) -> Result<Page<ContactField>, ApiError> {
        let path = add_options(&format!("contacts/{contact_id}/contactfields"), opts)?;
        let req = self.client.new_request(Method::GET, &path, NO_BODY)?;
        self.client.fetch_page(ctx, req).await
    }

    pub async fn get_contact_field(&self, ctx: &Context, id: u64) -> Result<ContactField, ApiError> {
        let req = self.client.new_request(Method::GET, &format!("contactfields/{id}"), NO_BODY)?;
        self.client.fetch_data(ctx, req).await
    }

    pub async fn create_contact_field(
        &self,
        ctx: &Context,
        input: &ContactFieldInput,
    ) -> Result<ContactField, ApiError> {
        let req = self.client.new_request(Method::POST, "contactfields", Some(input))?;
        self.client.fetch_data(ctx, req).await
    }

    pub async fn update_contact_field(
        &self,
        ctx: &Context,
        id: u64,
        input: &ContactFieldInput,
    ) -> Result<ContactField, ApiError> {
        let req = self.client.new_request(Method::PUT, &format!("contactfields/{id}"), Some(input))?;
        self.client.fetch_data(ctx, req).await
    }

    pub async fn delete_contact_field(&self, ctx: &Context, id: u64) -> Result<(), ApiError> {
        let req = self.client.new_request(Method::DELETE, &format!("contactfields/{id}"), NO_BODY)?;
        self.client.execute(ctx, req).await
    }
}
