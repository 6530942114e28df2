use http::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Client, NO_BODY};
use crate::context::Context;
use crate::error::ApiError;
use crate::query::{add_options, ListOptions};
use crate::timestamp::Timestamp;
use crate::types::{AccountRef, Page};

/// A label that can be attached to contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub id: u64,
    pub object: String,
    pub name: String,
    pub name_slug: String,
    pub account: AccountRef,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// Request body for creating or renaming a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagInput {
    pub name: String,
}

/// Tag endpoints.
pub struct TagsService<'a> {
    client: &'a Client,
}

impl<'a> TagsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list_tags(&self, ctx: &Context, opts: Option<&ListOptions>) -> Result<Page<Tag>, ApiError> {
        let path = add_options("tags", opts)?;
        let req = self.client.new_request(Method::GET, &path, NO_BODY)?;
        self.client.fetch_page(ctx, req).await
    }

    pub async fn get_tag(&self, ctx: &Context, id: u64) -> Result<Tag, ApiError> {
        let req = self.client.new_request(Method::GET, &format!("tags/{id}"), NO_BODY)?;
        self.client.fetch_data(ctx, req).await
    }

    pub async fn create_tag(&self, ctx: &Context, name: &str) -> Result<Tag, ApiError> {
        let body = TagInput { name: name.to_string() };
        let req = self.client.new_request(Method::POST, "tags", Some(&body))?;
        self.client.fetch_data(ctx, req).await
    }

    /// Rename a tag.
    pub async fn update_tag(&self, ctx: &Context, id: u64, name: &str) -> Result<Tag, ApiError> {
        let body = TagInput { name: name.to_string() };
        let req = self.client.new_request(Method::PUT, &format!("tags/{id}"), Some(&body))?;
        self.client.fetch_data(ctx, req).await
    }

    pub async fn delete_tag(&self, ctx: &Context, id: u64) -> Result<(), ApiError> {
        let req = self.client.new_request(Method::DELETE, &format!("tags/{id}"), NO_BODY)?;
        self.client.execute(ctx, req).await
    }
}
