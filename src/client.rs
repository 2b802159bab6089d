//! The client and its construction-time configuration.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;

use crate::{
    error::{ApiError, Result},
    framework::{Executor, ReqwestTransport, RetryConfig, Sleeper, ThreadSleeper, Transport},
    git::branch_name,
};

/// The `api-version` sent when an operation does not ask for another one.
pub const DEFAULT_API_VERSION: &str = "5.1";
/// The branch that can never be the source of a pull request.
pub const DEFAULT_BRANCH: &str = "master";

/// Everything a [`DevOpsClient`] needs to know, fixed at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The Azure DevOps organization.
    pub organization: String,
    /// The project within the organization.
    pub project: String,
    /// Replaces `https://dev.azure.com/<organization>/<project>/_apis` when set.
    pub base_url: Option<String>,
    /// The default `api-version` query parameter.
    pub api_version: String,
    /// Extra headers sent with every request, usually authentication.
    pub headers: HeaderMap,
    /// The trunk branch name.
    pub default_branch: String,
    /// Retry and timeout settings.
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Creates a configuration with default settings.
    pub fn new<O, P>(organization: O, project: P) -> Self
    where
        O: Into<String>,
        P: Into<String>,
    {
        Self {
            organization: organization.into(),
            project: project.into(),
            base_url: None,
            api_version: DEFAULT_API_VERSION.to_owned(),
            headers: HeaderMap::new(),
            default_branch: DEFAULT_BRANCH.to_owned(),
            retry: RetryConfig::DEFAULT,
        }
    }

    /// Creates a configuration whose retry settings come from the environment.
    #[cfg(feature = "env_max_retries")]
    pub fn from_env<O, P>(organization: O, project: P) -> Self
    where
        O: Into<String>,
        P: Into<String>,
    {
        Self::new(organization, project)
            .with_retry(RetryConfig::with_max_attempts(*crate::env::MAX_RETRIES))
    }

    /// Points the client at another server, such as an on-premises collection.
    pub fn with_base_url<U: Into<String>>(mut self, base_url: U) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Replaces the default `api-version`.
    pub fn with_api_version<V: Into<String>>(mut self, api_version: V) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Adds headers to every request. Later values replace earlier ones.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Replaces the trunk branch name. Either `main` or `refs/heads/main` may be given.
    pub fn with_default_branch<B: Into<String>>(mut self, branch: B) -> Self {
        self.default_branch = branch.into();
        self
    }

    /// Replaces the retry settings.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the URL every relative path is joined to.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(base_url) => base_url.clone(),
            None => format!(
                "https://dev.azure.com/{}/{}/_apis",
                self.organization, self.project
            ),
        }
    }
}

/// A client for one Azure DevOps project.
///
/// Operations are grouped in [`crate::transactions`]. The transport and the sleeper are generic so
/// they can be replaced in tests.
#[derive(Debug)]
pub struct DevOpsClient<T = ReqwestTransport, S = ThreadSleeper> {
    pub(crate) executor: Executor<T, S>,
    pub(crate) default_branch: String,
}

impl DevOpsClient {
    /// Creates a client over a fresh HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new().map_err(ApiError::Transport)?;
        Ok(Self::with_transport(config, transport, ThreadSleeper))
    }

    /// Creates a client configured from the environment.
    ///
    /// Requests are authenticated with `AZURE_DEVOPS_TOKEN` if it is set.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    #[cfg(all(feature = "env_token", feature = "env_max_retries"))]
    pub fn from_env<O, P>(organization: O, project: P) -> Result<Self>
    where
        O: Into<String>,
        P: Into<String>,
    {
        let config = ClientConfig::from_env(organization, project);
        let transport = match crate::env::DEVOPS_TOKEN.as_deref() {
            Some(token) => ReqwestTransport::with_token(token),
            None => ReqwestTransport::new(),
        }
        .map_err(ApiError::Transport)?;
        Ok(Self::with_transport(config, transport, ThreadSleeper))
    }
}

impl<T, S> DevOpsClient<T, S>
where
    T: Transport,
    S: Sleeper,
{
    /// Creates a client over the given transport and sleeper.
    pub fn with_transport(config: ClientConfig, transport: T, sleeper: S) -> Self {
        let base_url = config.base_url();
        let default_query = BTreeMap::from([("api-version".to_owned(), config.api_version)]);
        Self {
            executor: Executor::new(
                base_url,
                default_query,
                config.headers,
                config.retry,
                transport,
                sleeper,
            ),
            default_branch: branch_name(&config.default_branch).to_owned(),
        }
    }

    /// Returns the executor every operation goes through.
    pub fn executor(&self) -> &Executor<T, S> {
        &self.executor
    }

    /// Returns the trunk branch name, without its `refs/heads/` prefix.
    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }
}
