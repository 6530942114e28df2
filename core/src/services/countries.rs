use std::collections::BTreeMap;

use http::Method;
use serde::{Deserialize, Serialize};

use crate::client::{Client, NO_BODY};
use crate::context::Context;
use crate::error::ApiError;

/// Reference country record. `id` is the ISO code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Country {
    pub id: String,
    pub object: String,
    pub name: String,
    pub iso: String,
}

/// Country reference data.
pub struct CountriesService<'a> {
    client: &'a Client,
}

impl<'a> CountriesService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// All countries keyed by code. The endpoint is not paginated and takes
    /// no options.
    pub async fn list_countries(&self, ctx: &Context) -> Result<BTreeMap<String, Country>, ApiError> {
        let req = self.client.new_request(Method::GET, "countries", NO_BODY)?;
        self.client.fetch_data(ctx, req).await
    }
}
