//! Error types shared by every operation of the client.
//!
//! "Nothing found" is not an error: lookups return `Ok(None)` for an absent pull request or
//! artifact. Errors are reserved for bad input, missing entities the caller depends on, and
//! failures that survived the retry loop.

use std::{error::Error as StdError, fmt, path::PathBuf};

use thiserror::Error;

/// A shorthand for results carrying an [`ApiError`].
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// The category of an [`ApiError`], for callers that branch on it.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed an empty or invalid argument. Raised before any I/O.
    InvalidArgument,
    /// A lookup yielded no entity.
    NotFound,
    /// A search ran successfully but its filter combination matched nothing.
    NoMatch,
    /// The request kept failing transiently until the attempts ran out.
    Transient,
    /// The service definitively refused a write request.
    Rejected,
    /// A payload could not be encoded or decoded.
    Decode,
    /// Local I/O failed.
    Io,
    /// The HTTP client itself could not be set up.
    Transport,
}

/// A failure reported by the client.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ApiError {
    /// An argument was empty or invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The build search matched zero builds.
    #[error("no builds for given parameters | branch: {branch} | repo: {repository_id}")]
    NoBuilds {
        /// The branch reference that was searched.
        branch: String,
        /// The repository identifier that was searched.
        repository_id: String,
    },

    /// No response was received after every attempt.
    #[error("no response from {url} after {attempts} attempt(s)")]
    Timeout {
        /// The requested URL.
        url: String,
        /// How many attempts were made.
        attempts: u32,
        /// The last transport failure.
        #[source]
        source: Option<TransportError>,
    },

    /// The last response after every attempt still carried an error status.
    #[error("request to {url} failed with status {status}: {body}")]
    Failed {
        /// The requested URL.
        url: String,
        /// The HTTP status of the last response.
        status: u16,
        /// The body of the last response.
        body: String,
    },

    /// A write request was refused with a non-retryable status.
    #[error("request to {url} was rejected with status {status}: {body}")]
    Rejected {
        /// The requested URL.
        url: String,
        /// The HTTP status of the response.
        status: u16,
        /// The body of the response.
        body: String,
    },

    /// A successful response body did not match the expected shape.
    #[error("failed to parse data from {url}: {source}")]
    Decode {
        /// The requested URL.
        url: String,
        /// The underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Writing to the local filesystem failed.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// The path being written.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build the HTTP client: {0}")]
    Transport(#[source] TransportError),
}

impl ApiError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NoBuilds { .. } => ErrorKind::NoMatch,
            Self::Timeout { .. } | Self::Failed { .. } => ErrorKind::Transient,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::Decode { .. } | Self::Encode(_) => ErrorKind::Decode,
            Self::Io { .. } => ErrorKind::Io,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Failed { status, .. } | Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Rejects an empty required argument before any request is made.
pub(crate) fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(ApiError::InvalidArgument(format!("{what} cannot be empty")))
    } else {
        Ok(())
    }
}

/// A failure below HTTP: connecting, timing out, or reading the body.
#[derive(Debug)]
pub struct TransportError {
    message: String,
    timed_out: bool,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    /// Creates a transport error from a message.
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
            source: None,
        }
    }

    /// Creates a transport error that represents an elapsed deadline.
    pub fn timed_out<M: Into<String>>(message: M) -> Self {
        Self {
            timed_out: true,
            ..Self::new(message)
        }
    }

    /// Returns whether the deadline elapsed before a response arrived.
    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            timed_out: err.is_timeout(),
            source: Some(Box::new(err)),
        }
    }
}
