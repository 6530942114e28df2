//! Query-string encoding for list and search options.

use serde::Serialize;
use url::form_urlencoded;

use crate::error::ApiError;

/// Pagination parameters accepted by paginated list endpoints. Zero values
/// are left out of the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    /// Page of results to retrieve.
    #[serde(skip_serializing_if = "is_zero")]
    pub page: u32,

    /// Number of results per page.
    #[serde(skip_serializing_if = "is_zero")]
    pub limit: u32,
}

impl ListOptions {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// Append the fields of `opts` to `path` as a query string.
///
/// `None` returns `path` unchanged. Pairs are sorted by key and any query
/// already present on `path` is replaced.
pub fn add_options<T: Serialize + ?Sized>(path: &str, opts: Option<&T>) -> Result<String, ApiError> {
    let Some(opts) = opts else {
        return Ok(path.to_owned());
    };

    let base = path.split_once('?').map_or(path, |(base, _)| base);

    let encoded = serde_urlencoded::to_string(opts)?;
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(encoded.as_bytes())
        .into_owned()
        .collect();
    if pairs.is_empty() {
        return Ok(base.to_owned());
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    Ok(format!("{base}?{query}"))
}
