//! Injectable transport layer.
//!
//! The client never talks to a concrete HTTP library directly: it hands an
//! `HttpRequest` to a `Transport` and gets back a status, headers and an open
//! body. `ReqwestTransport` is the default implementation.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};

use crate::http::HttpRequest;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Connection, TLS or body read failure reported by a transport.
#[derive(Debug)]
pub struct TransportError(Box<dyn Error + Send + Sync>);

impl TransportError {
    pub fn new(e: impl Error + Send + Sync + 'static) -> Self {
        Self(Box::new(e))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self(message.into())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.0)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::new(e)
    }
}

/// An open response body, read chunk by chunk. Dropping it releases the
/// underlying connection resources.
pub trait ResponseBody: Send + 'static {
    /// Next chunk of the body, `None` at end of stream.
    fn next_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, TransportError>>;
}

impl dyn ResponseBody {
    /// Read the remaining body into memory.
    pub async fn read_all(&mut self) -> Result<Bytes, TransportError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

/// What a transport returns for a request that reached the server.
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Box<dyn ResponseBody>,
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Executes fully-built requests.
///
/// Contract:
/// - Must send `method`, `url`, `headers` and `body` exactly as given.
/// - Must return `Ok` for every response that was received, whatever its
///   status; status classification is the client's job.
pub trait Transport: Send + Sync + 'static {
    fn send<'a>(&'a self, req: &'a HttpRequest) -> BoxFuture<'a, Result<TransportResponse, TransportError>>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Transport over a fresh `reqwest::Client` with a whole-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

struct ReqwestBody {
    resp: reqwest::Response,
}

impl ResponseBody for ReqwestBody {
    fn next_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, TransportError>> {
        Box::pin(async move { self.resp.chunk().await.map_err(TransportError::from) })
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(&'a self, req: &'a HttpRequest) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(req.method.clone(), req.url.clone())
                .headers(req.headers.clone());
            if let Some(body) = &req.body {
                builder = builder.body(body.clone());
            }
            let resp = builder.send().await?;
            Ok(TransportResponse {
                status: resp.status(),
                headers: resp.headers().clone(),
                body: Box::new(ReqwestBody { resp }),
            })
        })
    }
}
