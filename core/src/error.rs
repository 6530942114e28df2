//! Error types for the Monica API client.
//!
//! # Design
//! Every failure is terminal for the call that produced it. `ApiError::kind`
//! groups the variants into the categories callers usually branch on:
//! configuration, context, transport, protocol, decode and encoding. Non-2xx
//! responses all land in `HttpError` with the raw status code and body text;
//! the API's own error schema is not parsed.

use thiserror::Error;

use crate::context::ContextError;
use crate::transport::TransportError;

/// Errors returned by `Client` and the resource services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The configured base URL does not end with `/`.
    #[error("base URL must have a trailing slash, but {0:?} does not")]
    BaseUrlMissingTrailingSlash(String),

    /// The configured base URL could not be parsed.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// A required configuration value was not provided.
    #[error("missing configuration value: {0}")]
    MissingConfig(&'static str),

    /// The relative request path is malformed or escapes the base URL.
    #[error("invalid request path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A header value (token, user agent) contains characters HTTP forbids.
    #[error("invalid value for header {name}")]
    InvalidHeader { name: &'static str },

    /// No execution context was supplied to the pipeline.
    #[error("execution context must be provided")]
    MissingContext,

    /// The execution context was canceled or its deadline passed.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// DNS, connection, TLS or body read failure.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// The server returned a status outside 200..=299.
    #[error("status code: {status}\nResponse:\n{body}\n")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(#[source] serde_json::Error),

    /// A successful response carried no envelope where one was required.
    #[error("response carried no data")]
    MissingData,

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(#[source] serde_json::Error),

    /// The options value could not be encoded as a query string.
    #[error("query encoding failed: {0}")]
    QueryEncoding(#[from] serde_urlencoded::ser::Error),
}

/// Coarse classification of an `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Context,
    Transport,
    Protocol,
    Decode,
    Encoding,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BaseUrlMissingTrailingSlash(_)
            | ApiError::InvalidBaseUrl(_)
            | ApiError::MissingConfig(_) => ErrorKind::Configuration,
            ApiError::MissingContext | ApiError::Context(_) => ErrorKind::Context,
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::HttpError { .. } => ErrorKind::Protocol,
            ApiError::DeserializationError(_) | ApiError::MissingData => ErrorKind::Decode,
            ApiError::InvalidPath { .. }
            | ApiError::InvalidHeader { .. }
            | ApiError::SerializationError(_)
            | ApiError::QueryEncoding(_) => ErrorKind::Encoding,
        }
    }

    /// HTTP status of a protocol error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
