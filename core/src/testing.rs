//! Scripted in-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};
use parking_lot::Mutex;

use crate::http::HttpRequest;
use crate::transport::{BoxFuture, ResponseBody, Transport, TransportError, TransportResponse};

pub(crate) enum Step {
    Reply(MockReply),
    Fail(TransportError),
    /// Runs when the request is sent, e.g. to cancel a context mid-flight.
    Run(Box<dyn FnOnce() -> Result<MockReply, TransportError> + Send>),
    /// Never completes.
    Hang,
}

#[derive(Clone, Debug)]
pub(crate) struct MockReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Body never ends after yielding `body`.
    pub stall: bool,
}

impl MockReply {
    pub fn json(status: u16, body: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body: Bytes::copy_from_slice(body.as_bytes()),
            stall: false,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }

    pub fn stalled(mut self) -> Self {
        self.stall = true;
        self
    }
}

/// Body that flags its release when dropped.
struct TrackedBody {
    chunk: Option<Bytes>,
    stall: bool,
    released: Arc<AtomicBool>,
}

impl ResponseBody for TrackedBody {
    fn next_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, TransportError>> {
        Box::pin(async move {
            match self.chunk.take() {
                Some(chunk) => Ok(Some(chunk)),
                None if self.stall => std::future::pending().await,
                None => Ok(None),
            }
        })
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct State {
    steps: Mutex<VecDeque<Step>>,
    recorded: Mutex<Vec<HttpRequest>>,
    released: Mutex<Vec<Arc<AtomicBool>>>,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    st: Arc<State>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let t = Self::default();
        t.st.steps.lock().extend(steps);
        t
    }

    pub fn recorded(&self) -> Vec<HttpRequest> {
        self.st.recorded.lock().clone()
    }

    /// Whether the body of the `n`-th reply has been dropped.
    pub fn body_released(&self, n: usize) -> bool {
        self.st.released.lock()[n].load(Ordering::SeqCst)
    }

    fn respond(&self, reply: MockReply) -> TransportResponse {
        let released = Arc::new(AtomicBool::new(false));
        self.st.released.lock().push(released.clone());
        TransportResponse {
            status: reply.status,
            headers: reply.headers,
            body: Box::new(TrackedBody {
                chunk: Some(reply.body).filter(|b| !b.is_empty()),
                stall: reply.stall,
                released,
            }),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(&'a self, req: &'a HttpRequest) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        self.st.recorded.lock().push(req.clone());
        let step = self.st.steps.lock().pop_front();
        Box::pin(async move {
            match step {
                Some(Step::Reply(reply)) => Ok(self.respond(reply)),
                Some(Step::Fail(err)) => Err(err),
                Some(Step::Run(f)) => f().map(|reply| self.respond(reply)),
                Some(Step::Hang) => std::future::pending().await,
                None => Err(TransportError::msg("no scripted reply left")),
            }
        })
    }
}
