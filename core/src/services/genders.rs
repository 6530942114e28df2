use http::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Client, NO_BODY};
use crate::context::Context;
use crate::error::ApiError;
use crate::query::{add_options, ListOptions};
use crate::timestamp::Timestamp;
use crate::types::{AccountRef, Page};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gender {
    pub id: u64,
    pub object: String,
    pub name: String,
    pub account: AccountRef,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenderInput {
    pub name: String,
}

/// Gender endpoints. Genders are per-account and referenced by contacts
/// through `ContactInput::gender_id`.
pub struct GendersService<'a> {
    client: &'a Client,
}

impl<'a> GendersService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list_genders(&self, ctx: &Context, opts: Option<&ListOptions>) -> Result<Page<Gender>, ApiError> {
        let path = add_options("genders", opts)?;
        let req = self.client.new_request(Method::GET, &path, NO_BODY)?;
        self.client.fetch_page(ctx, req).await
    }

    pub async fn get_gender(&self, ctx: &Context, id: u64) -> Result<Gender, ApiError> {
        let req = self.client.new_request(Method::GET, &format!("genders/{id}"), NO_BODY)?;
        self.client.fetch_data(ctx, req).await
    }

    pub async fn create_gender(&self, ctx: &Context, name: &str) -> Result<Gender, ApiError> {
        let body = GenderInput { name: name.to_string() };
        let req = self.client.new_request(Method::POST, "genders", Some(&body))?;
        self.client.fetch_data(ctx, req).await
    }

    pub async fn update_gender(&self, ctx: &Context, id: u64, name: &str) -> Result<Gender, ApiError> {
        let body = GenderInput { name: name.to_string() };
        let req = self.client.new_request(Method::PUT, &format!("genders/{id}"), Some(&body))?;
        self.client.fetch_data(ctx, req).await
    }

    pub async fn delete_gender(&self, ctx: &Context, id: u64) -> Result<(), ApiError> {
        let req = self.client.new_request(Method::DELETE, &format!("genders/{id}"), NO_BODY)?;
        self.client.execute(ctx, req).await
    }
}
