//! Request and response values exchanged between the client and a transport.
//!
//! # Design
//! `HttpRequest` is plain data: `Client::new_request` builds it without any
//! I/O and a `Transport` executes it. `Response` is what `Client::bare_do`
//! hands back on success; it owns the still-open body, so whoever holds the
//! `Response` is responsible for reading it (or simply dropping it).

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::rate::Rate;
use crate::transport::{ResponseBody, TransportError};

/// A fully-addressed, authenticated request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// A successful (2xx) response whose body has not been read yet.
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    rate: Rate,
    body: Box<dyn ResponseBody>,
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("rate", &self.rate)
            .finish_non_exhaustive()
    }
}

impl Response {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, rate: Rate, body: Box<dyn ResponseBody>) -> Self {
        Self {
            status,
            headers,
            rate,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Rate-limit state reported with this response.
    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Read the whole body, consuming the response.
    pub async fn bytes(mut self) -> Result<Bytes, TransportError> {
        self.body.read_all().await
    }

    /// Read the whole body as (lossy) UTF-8 text.
    pub async fn text(self) -> Result<String, TransportError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn into_body(self) -> Box<dyn ResponseBody> {
        self.body
    }

    pub(crate) fn into_parts(self) -> (StatusCode, HeaderMap, Rate, Box<dyn ResponseBody>) {
        (self.status, self.headers, self.rate, self.body)
    }
}

/// A response whose JSON body has been decoded into `T`.
///
/// `value` is `None` when the server sent an empty body.
#[derive(Debug, Clone)]
pub struct DecodedResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub rate: Rate,
    pub value: Option<T>,
}
