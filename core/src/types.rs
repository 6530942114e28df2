//! Response envelope and types shared by every resource.
//!
//! # Design
//! Every successful response wraps its payload as `{"data": ..., "meta": ...}`.
//! The envelope is decoded once, generically, by `Envelope<T>`; resource
//! services never declare their own wrapper structs.

use serde::{Deserialize, Serialize};

/// `{"data": T, "meta"?: ListMeta}` wrapper present on every response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

/// Pagination counters returned alongside a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListMeta {
    pub current_page: u32,
    pub from: Option<u32>,
    pub last_page: u32,
    pub path: String,
    pub per_page: u32,
    pub to: Option<u32>,
    pub total: u32,
}

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: ListMeta,
}

impl<T> From<Envelope<Vec<T>>> for Page<T> {
    fn from(envelope: Envelope<Vec<T>>) -> Self {
        Self {
            data: envelope.data,
            meta: envelope.meta.unwrap_or_default(),
        }
    }
}

/// Reference to the account owning a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    #[serde(default)]
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_envelope_decodes_meta() {
        let raw = r#"{
            "data": [1, 2],
            "meta": {"current_page": 1, "from": 1, "last_page": 3, "path": "https://app.monicahq.com/api/tags",
                     "per_page": 2, "to": 2, "total": 5}
        }"#;
        let page: Page<u32> = serde_json::from_str::<Envelope<Vec<u32>>>(raw).unwrap().into();
        assert_eq!(page.data, vec![1, 2]);
        assert_eq!(page.meta.last_page, 3);
        assert_eq!(page.meta.total, 5);
        assert_eq!(page.meta.from, Some(1));
    }

    #[test]
    fn missing_meta_defaults() {
        let page: Page<u32> = serde_json::from_str::<Envelope<Vec<u32>>>(r#"{"data": []}"#).unwrap().into();
        assert!(page.data.is_empty());
        assert_eq!(page.meta, ListMeta::default());
    }

    #[test]
    fn empty_page_has_null_bounds() {
        let raw = r#"{"data": [], "meta": {"current_page": 1, "from": null, "to": null, "total": 0}}"#;
        let envelope: Envelope<Vec<u32>> = serde_json::from_str(raw).unwrap();
        let meta = envelope.meta.unwrap();
        assert_eq!(meta.from, None);
        assert_eq!(meta.total, 0);
    }
}
