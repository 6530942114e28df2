//! Async client core for the Monica contact-management API.
//!
//! # Overview
//! `Client` holds the base URL, credentials and a pluggable `Transport`, and
//! exposes one borrowed service per resource family (`contacts()`,
//! `tags()`, `genders()`, `countries()`, `contact_field_types()`,
//! `contact_fields()`). Every call takes a `Context` that can cancel it or
//! bound it with a deadline.
//!
//! # Design
//! - Request building (`Client::new_request`) is pure; only `bare_do` talks
//!   to the transport, so the pipeline is testable with a scripted transport.
//! - Responses carry the rate-limit headers; the latest values are kept in a
//!   shared snapshot readable through `Client::rate`.
//! - Timestamps from the server come as RFC 3339 strings, Unix seconds or
//!   Unix milliseconds; `Timestamp` accepts all three.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod query;
pub mod rate;
pub mod services;
pub mod timestamp;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::{Client, NO_BODY};
pub use config::{ClientConfig, SecretString};
pub use context::{Context, ContextError};
pub use error::{ApiError, ErrorKind};
pub use http::{DecodedResponse, HttpRequest, Response};
pub use query::{add_options, ListOptions};
pub use rate::Rate;
pub use services::{
    Career, Contact, ContactField, ContactFieldInput, ContactFieldType, ContactInformation, ContactInput,
    ContactSearchListOptions, Country, Gender, GenderInput, Tag, TagInput,
};
pub use timestamp::Timestamp;
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{AccountRef, Envelope, ListMeta, Page};
