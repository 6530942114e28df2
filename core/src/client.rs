//! Request builder and response pipeline for the Monica API.
//!
//! # Design
//! A call goes through three steps:
//! - `new_request` resolves a relative path against the base URL, attaches
//!   the JSON body and the standard headers. No I/O happens here.
//! - `bare_do` sends the request through the `Transport`, records the rate
//!   snapshot and classifies the status. Non-2xx responses become
//!   `ApiError::HttpError` with their body drained and released.
//! - `do_request` reads the body of a successful response and decodes it.
//!
//! Both send steps race the caller's `Context`; a finished context wins over
//! whatever the transport reports.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, Method};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientConfig, SecretString};
use crate::context::Context;
use crate::error::ApiError;
use crate::http::{DecodedResponse, HttpRequest, Response};
use crate::rate::{parse_rate, Rate, RateSnapshot};
use crate::services::{
    ContactFieldTypesService, ContactFieldsService, ContactsService, CountriesService, GendersService,
    TagsService,
};
use crate::transport::{ReqwestTransport, ResponseBody, Transport};
use crate::types::{Envelope, Page};

/// Typed `None` for requests without a body.
pub const NO_BODY: Option<&()> = None;

/// Shared handle to the Monica API. Cloning is cheap and clones share the
/// transport and the rate snapshot.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: Url,
    user_agent: String,
    access_token: SecretString,
    transport: Arc<dyn Transport>,
    rate: RateSnapshot,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("user_agent", &self.inner.user_agent)
            .field("access_token", &self.inner.access_token)
            .field("rate", &self.inner.rate.get())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Client for `base_url` (including `/api/`, with a trailing slash)
    /// authenticated with an OAuth access token.
    pub fn new(base_url: &str, access_token: impl Into<SecretString>) -> Result<Self, ApiError> {
        Self::from_config(ClientConfig::new(base_url, access_token))
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::with_timeout(config.timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(ApiError::InvalidBaseUrl)?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                base_url,
                user_agent: config.user_agent,
                access_token: config.access_token,
                transport,
                rate: RateSnapshot::default(),
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.inner.user_agent
    }

    /// Rate-limit state of the most recently processed response.
    pub fn rate(&self) -> Rate {
        self.inner.rate.get()
    }

    pub fn contacts(&self) -> ContactsService<'_> {
        ContactsService::new(self)
    }

    pub fn contact_fields(&self) -> ContactFieldsService<'_> {
        ContactFieldsService::new(self)
    }

    pub fn contact_field_types(&self) -> ContactFieldTypesService<'_> {
        ContactFieldTypesService::new(self)
    }

    pub fn countries(&self) -> CountriesService<'_> {
        CountriesService::new(self)
    }

    pub fn genders(&self) -> GendersService<'_> {
        GendersService::new(self)
    }

    pub fn tags(&self) -> TagsService<'_> {
        TagsService::new(self)
    }

    /// Build a request for `path`, resolved relative to the base URL.
    ///
    /// `path` must not start with a slash. If `body` is given it is encoded
    /// as JSON and sent with `Content-Type: application/json`.
    pub fn new_request<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, ApiError> {
        let base = &self.inner.base_url;
        if !base.path().ends_with('/') {
            return Err(ApiError::BaseUrlMissingTrailingSlash(base.to_string()));
        }
        let url = resolve(base, path)?;

        let body = body
            .map(|b| serde_json::to_vec(b).map(Bytes::from))
            .transpose()
            .map_err(ApiError::SerializationError)?;

        let mut headers = HeaderMap::new();
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if !self.inner.user_agent.is_empty() {
            let value = HeaderValue::from_str(&self.inner.user_agent)
                .map_err(|_| ApiError::InvalidHeader { name: "User-Agent" })?;
            headers.insert(USER_AGENT, value);
        }
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.inner.access_token.expose()))
            .map_err(|_| ApiError::InvalidHeader { name: "Authorization" })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Send `req` and classify the response.
    ///
    /// On success the body is left unread and belongs to the returned
    /// `Response`. On a non-2xx status the body is read into the error and
    /// released. The rate snapshot is updated for every received response.
    pub async fn bare_do(&self, ctx: Option<&Context>, req: HttpRequest) -> Result<Response, ApiError> {
        let ctx = ctx.ok_or(ApiError::MissingContext)?;
        if let Some(reason) = ctx.err() {
            return Err(reason.into());
        }

        debug!(method = %req.method, url = %req.url, "sending request");
        let sent = tokio::select! {
            biased;
            reason = ctx.done() => return Err(reason.into()),
            sent = self.inner.transport.send(&req) => sent,
        };
        let resp = match sent {
            Ok(resp) => resp,
            Err(err) => {
                if let Some(reason) = ctx.err() {
                    return Err(reason.into());
                }
                return Err(ApiError::Transport(err));
            }
        };

        let rate = parse_rate(&resp.headers);
        self.inner.rate.store(rate);
        debug!(status = resp.status.as_u16(), limit = rate.limit, remaining = rate.remaining, "received response");

        if resp.status.is_success() {
            return Ok(Response::new(resp.status, resp.headers, rate, resp.body));
        }

        let mut body = resp.body;
        let text = tokio::select! {
            biased;
            reason = ctx.done() => return Err(reason.into()),
            bytes = body.read_all() => bytes.map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default(),
        };
        drop(body);
        warn!(status = resp.status.as_u16(), url = %req.url, "request failed");
        Err(ApiError::HttpError {
            status: resp.status.as_u16(),
            body: text,
        })
    }

    /// Send `req` and decode the JSON body into `T`.
    ///
    /// An empty body yields `value: None` rather than an error.
    pub async fn do_request<T: DeserializeOwned>(
        &self,
        ctx: Option<&Context>,
        req: HttpRequest,
    ) -> Result<DecodedResponse<T>, ApiError> {
        let resp = self.bare_do(ctx, req).await?;
        let ctx = ctx.ok_or(ApiError::MissingContext)?;
        let (status, headers, rate, mut body) = resp.into_parts();
        let bytes = read_body(ctx, &mut body).await?;
        drop(body);
        let value = decode_json(&bytes)?;
        Ok(DecodedResponse {
            status,
            headers,
            rate,
            value,
        })
    }

    /// Decode an `Envelope<T>` and return its `data`.
    pub(crate) async fn fetch_data<T: DeserializeOwned>(&self, ctx: &Context, req: HttpRequest) -> Result<T, ApiError> {
        let resp = self.do_request::<Envelope<T>>(Some(ctx), req).await?;
        resp.value.map(|envelope| envelope.data).ok_or(ApiError::MissingData)
    }

    /// Decode a list envelope into a `Page<T>`.
    pub(crate) async fn fetch_page<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        req: HttpRequest,
    ) -> Result<Page<T>, ApiError> {
        let resp = self.do_request::<Envelope<Vec<T>>>(Some(ctx), req).await?;
        resp.value.map(Page::from).ok_or(ApiError::MissingData)
    }

    /// Send `req` and discard whatever JSON comes back.
    pub(crate) async fn execute(&self, ctx: &Context, req: HttpRequest) -> Result<(), ApiError> {
        self.do_request::<IgnoredAny>(Some(ctx), req).await.map(|_| ())
    }
}

fn resolve(base: &Url, path: &str) -> Result<Url, ApiError> {
    let invalid = |reason: &str| ApiError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if path.starts_with('/') {
        return Err(invalid("relative paths must not start with a slash"));
    }
    let url = base.join(path).map_err(|e| invalid(&e.to_string()))?;
    if !url.as_str().starts_with(base.as_str()) {
        return Err(invalid("path resolves outside the base URL"));
    }
    Ok(url)
}

async fn read_body(ctx: &Context, body: &mut Box<dyn ResponseBody>) -> Result<Bytes, ApiError> {
    tokio::select! {
        biased;
        reason = ctx.done() => Err(reason.into()),
        bytes = body.read_all() => bytes.map_err(ApiError::Transport),
    }
}

/// Decode the first JSON value of `bytes`; `None` if there is none.
fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>, ApiError> {
    match serde_json::Deserializer::from_slice(bytes).into_iter::<T>().next() {
        None => Ok(None),
        Some(value) => value.map(Some).map_err(ApiError::DeserializationError),
    }
}
