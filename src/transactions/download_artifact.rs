use std::path::{Path, PathBuf};

use reqwest::{Method, StatusCode};
use tracing::{debug, error, info, warn};

use crate::{
    client::DevOpsClient,
    error::{ApiError, Result, TransportError, require},
    framework::{HttpRequest, HttpResponse, Sleeper, Transport},
};

/// The name the downloaded archive is written under.
pub const ARTIFACT_FILE_NAME: &str = "artifact.zip";
/// How many times a download is attempted by default.
pub const DEFAULT_DOWNLOAD_RETRIES: u32 = 3;

impl<T, S> DevOpsClient<T, S>
where
    T: Transport,
    S: Sleeper,
{
    /// Downloads an artifact into `destination`, which is created if needed, and returns the path
    /// of the written archive.
    ///
    /// The download is attempted up to `retries` times without pause, and stops at the first
    /// `200 OK`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Timeout`] if no attempt got a response, [`ApiError::Failed`] if the last
    /// response was not `200 OK`, and [`ApiError::Io`] if the archive cannot be written.
    pub fn download_artifact<P>(&self, url: &str, destination: P, retries: u32) -> Result<PathBuf>
    where
        P: AsRef<Path>,
    {
        require(url, "download url")?;

        let request = HttpRequest {
            method: Method::GET,
            url: url.to_owned(),
            query: Vec::new(),
            headers: self.executor.headers().clone(),
            body: None,
            timeout: self.executor.retry().download_timeout,
        };
        let attempts = retries.max(1);

        debug!("requesting download from {url}…");
        let mut response: Option<HttpResponse> = None;
        let mut last_error: Option<TransportError> = None;
        for attempt in 1..=attempts {
            if attempt > 1 {
                info!("retry download artifact #{attempt}");
            }
            match self.executor.transport().send(&request) {
                Ok(received) => {
                    let done = received.status == StatusCode::OK.as_u16();
                    if !done {
                        log_status(url, received.status);
                    }
                    response = Some(received);
                    if done {
                        break;
                    }
                }
                Err(err) => {
                    warn!("failed to download artifact at {url}: {err}");
                    last_error = Some(err);
                }
            }
        }

        let response = match response {
            Some(response) if response.status == StatusCode::OK.as_u16() => response,
            Some(response) => {
                return Err(ApiError::Failed {
                    url: url.to_owned(),
                    status: response.status,
                    body: response.text(),
                });
            }
            None => {
                return Err(ApiError::Timeout {
                    url: url.to_owned(),
                    attempts,
                    source: last_error,
                });
            }
        };

        let destination = destination.as_ref();
        std::fs::create_dir_all(destination).map_err(|source| ApiError::Io {
            path: destination.to_path_buf(),
            source,
        })?;
        let path = destination.join(ARTIFACT_FILE_NAME);
        std::fs::write(&path, &response.body).map_err(|source| ApiError::Io {
            path: path.clone(),
            source,
        })?;

        info!(
            "downloaded {} bytes from {url} to {}",
            response.body.len(),
            path.display()
        );
        Ok(path)
    }
}

fn log_status(url: &str, status: u16) {
    match StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
    {
        Some(reason) => error!("failed to request download from {url}: {status} {reason}"),
        None => error!("failed to request download from {url}: {status}"),
    }
}
