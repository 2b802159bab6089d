//! The seams between the executor and the outside world: sending a request and sleeping.

use std::{fmt, time::Duration};

use reqwest::{Method, blocking::Client, header::HeaderMap};
use tracing::debug;

use crate::error::TransportError;

/// A fully prepared HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: Method,
    /// The absolute URL, without query string.
    pub url: String,
    /// Query parameters, already merged with the defaults.
    pub query: Vec<(String, String)>,
    /// Headers to send.
    pub headers: HeaderMap,
    /// The encoded body, if any.
    pub body: Option<Vec<u8>>,
    /// The deadline of this request.
    pub timeout: Duration,
}

impl HttpRequest {
    /// Returns the value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new<B: Into<Vec<u8>>>(status: u16, body: B) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns whether the status is `200 OK` or `201 Created`.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 201)
    }

    /// Returns whether the status is a server error.
    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one HTTP request and waits for the whole response.
pub trait Transport {
    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if no response was received.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Waits between attempts.
pub trait Sleeper {
    /// Blocks the current thread for the duration.
    fn sleep(&self, duration: Duration);
}

/// A [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// A [`Transport`] backed by a blocking [`reqwest`] client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    token: Option<String>,
}

impl ReqwestTransport {
    /// Creates an unauthenticated transport. Authentication may still be passed as headers.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("devops-artifacts/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            token: None,
        })
    }

    /// Creates a transport that authenticates every request with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the TLS backend cannot be initialized.
    pub fn with_token<T: Into<String>>(token: T) -> Result<Self, TransportError> {
        Ok(Self {
            token: Some(token.into()),
            ..Self::new()?
        })
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!("{} {}…", request.method, request.url);

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .query(&request.query)
            .headers(request.headers.clone())
            .timeout(request.timeout);
        if let Some(token) = &self.token {
            builder = builder.basic_auth("", Some(token));
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(HttpResponse { status, body })
    }
}
