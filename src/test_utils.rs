//! Scripted transports and sleepers for tests.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use parking_lot::Mutex;
use serde_json::Value;

use crate::{
    client::{ClientConfig, DevOpsClient},
    error::TransportError,
    framework::{HttpRequest, HttpResponse, Sleeper, Transport},
};

type Reply = Result<HttpResponse, TransportError>;
type Handler = dyn Fn(&HttpRequest) -> Reply + Send + Sync;

/// A transport that answers from a closure and records every request it sees.
#[derive(Clone)]
pub(crate) struct FakeTransport {
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl std::fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTransport")
            .field("requests", &self.requests.lock().len())
            .finish_non_exhaustive()
    }
}

impl FakeTransport {
    /// Answers every request with the closure.
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Reply + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            requests: Arc::default(),
        }
    }

    /// Answers requests with the replies in order, regardless of what is asked.
    pub(crate) fn sequence<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Reply>,
    {
        let replies = Mutex::new(replies.into_iter().collect::<VecDeque<_>>());
        Self::new(move |request| {
            replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected request to {}", request.url))
        })
    }

    /// A transport that fails the test if it is ever used.
    pub(crate) fn unreachable() -> Self {
        Self::new(|request| panic!("no request expected, got {}", request.url))
    }

    /// Returns every request sent so far.
    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Returns the requests whose URL ends with the suffix.
    pub(crate) fn requests_to(&self, suffix: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.url.ends_with(suffix))
            .cloned()
            .collect()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: &HttpRequest) -> Reply {
        self.requests.lock().push(request.clone());
        (self.handler)(request)
    }
}

/// A sleeper that returns at once and remembers how long it was asked to wait.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub(crate) fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}

/// Builds a `200 OK` JSON response.
pub(crate) fn ok_json(value: Value) -> Reply {
    Ok(HttpResponse::new(200, value.to_string()))
}

/// Builds an empty response with the status.
pub(crate) fn status(code: u16) -> Reply {
    Ok(HttpResponse::new(code, Vec::new()))
}

/// Creates a client for organization `org` and project `proj` over the fake transport.
pub(crate) fn client(transport: &FakeTransport) -> DevOpsClient<FakeTransport, RecordingSleeper> {
    DevOpsClient::with_transport(
        ClientConfig::new("org", "proj"),
        transport.clone(),
        RecordingSleeper::default(),
    )
}
