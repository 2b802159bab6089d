//! Executes one logical request: send, classify, back off and retry, decode.

use std::collections::BTreeMap;

use reqwest::{
    Method,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use super::{HttpRequest, HttpResponse, RetryConfig, Sleeper, State, Transport};
use crate::error::{ApiError, Result, TransportError};

/// Sends requests relative to a base URL with uniform retry, timeout and decoding behavior.
///
/// The executor holds only configuration fixed at construction. It can be reused sequentially.
#[derive(Debug)]
pub struct Executor<T, S> {
    base_url: String,
    default_query: BTreeMap<String, String>,
    headers: HeaderMap,
    retry: RetryConfig,
    transport: T,
    sleeper: S,
}

impl<T, S> Executor<T, S>
where
    T: Transport,
    S: Sleeper,
{
    /// Creates an executor.
    ///
    /// `Content-Type: application/json` is always sent, and `headers` are added on top.
    pub fn new<U: Into<String>>(
        base_url: U,
        default_query: BTreeMap<String, String>,
        headers: HeaderMap,
        retry: RetryConfig,
        transport: T,
        sleeper: S,
    ) -> Self {
        let mut all_headers = HeaderMap::new();
        all_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        all_headers.extend(headers);

        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            default_query,
            headers: all_headers,
            retry,
            transport,
            sleeper,
        }
    }

    /// Returns the base URL every relative path is joined to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the retry settings.
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a GET request and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`]. Also fails if the body does not decode as `R`.
    pub fn get<R>(&self, path: &str, query: &[(&str, &str)]) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        let url = self.url(path);
        self.execute(Method::GET, path, query, None)?
            .map(|body| decode(&url, &body))
            .transpose()
    }

    /// Sends a GET request and returns the raw body.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`].
    pub fn get_raw(&self, path: &str, query: &[(&str, &str)]) -> Result<Option<Vec<u8>>> {
        self.execute(Method::GET, path, query, None)
    }

    /// Sends a POST request with a JSON body and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Self::execute`]. Also fails if the body cannot be encoded or the response does not
    /// decode as `R`.
    pub fn post<B, R>(&self, path: &str, query: &[(&str, &str)], body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.write(Method::POST, path, query, body)
    }

    /// Sends a PATCH request with a JSON body and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// See [`Self::post`].
    pub fn patch<B, R>(&self, path: &str, query: &[(&str, &str)], body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.write(Method::PATCH, path, query, body)
    }

    fn write<B, R>(&self, method: Method, path: &str, query: &[(&str, &str)], body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let body = serde_json::to_vec(body).map_err(ApiError::Encode)?;
        match self.execute(method, path, query, Some(body))? {
            Some(body) => decode(&url, &body),
            None => Err(ApiError::NotFound(format!("no response body from {url}"))),
        }
    }

    /// Sends a request, retrying transient failures, and returns the body of a successful response.
    ///
    /// `200` and `201` are successes. Server errors and transport failures are retried with
    /// exponential backoff. Any other status ends the call at once: GET requests yield [`None`],
    /// write requests fail with [`ApiError::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Timeout`] if no response was ever received, or [`ApiError::Failed`] if
    /// the last response still carried an error status once the attempts ran out.
    pub fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<Option<Vec<u8>>> {
        let request = self.prepare(method, path, query, body);

        let mut attempt: u32 = 0;
        let mut last_response: Option<HttpResponse> = None;
        let mut last_error: Option<TransportError> = None;

        loop {
            attempt += 1;
            let state = match self.transport.send(&request) {
                Ok(response) => {
                    let state = self.classify(&request, &response)?;
                    last_response = Some(response);
                    state
                }
                Err(err) => {
                    info!(
                        "exception occurred while trying to reach the server | {err} | url - {}",
                        request.url
                    );
                    last_error = Some(err);
                    State::Retry
                }
            };

            match state {
                State::Retry => match self.retry.retry_if_possible(attempt) {
                    Some(delay) => {
                        debug!("retry invoking {} {}", request.method, request.url);
                        self.sleeper.sleep(delay);
                    }
                    None => break,
                },
                done => return Ok(done.success()),
            }
        }

        Err(match last_response {
            Some(response) => ApiError::Failed {
                url: request.url,
                status: response.status,
                body: response.text(),
            },
            None => ApiError::Timeout {
                url: request.url,
                attempts: attempt,
                source: last_error,
            },
        })
    }

    fn classify(&self, request: &HttpRequest, response: &HttpResponse) -> Result<State<Vec<u8>>> {
        if response.is_success() {
            return Ok(State::Success(response.body.clone()));
        }
        if response.is_server_error() {
            warn!(
                "server error | code - {} | url - {}",
                response.status, request.url
            );
            return Ok(State::Retry);
        }
        if request.method == Method::GET {
            warn!(
                "API responded with non OK status code | code - {} | url - {} | params - {:?}",
                response.status, request.url, request.query
            );
            return Ok(State::Stop);
        }
        Err(ApiError::Rejected {
            url: request.url.clone(),
            status: response.status,
            body: response.text(),
        })
    }

    fn prepare(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> HttpRequest {
        let mut merged = self.default_query.clone();
        merged.extend(
            query
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned())),
        );

        HttpRequest {
            method,
            url: self.url(path),
            query: merged.into_iter().collect(),
            headers: self.headers.clone(),
            body,
            timeout: self.retry.timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn decode<R>(url: &str, body: &[u8]) -> Result<R>
where
    R: DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|source| ApiError::Decode {
        url: url.to_owned(),
        source,
    })
}
