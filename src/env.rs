//! Defines the environment variables to use.

#![cfg(feature = "env")]

use crate::static_lazy_lock;

/// Parses an environment variable from [`String`] to something else.
///
/// Any error is wrapped in [`anyhow::Error`].
#[macro_export]
macro_rules! parse_env {
    ($key:expr => |$var:ident| $expr:expr) => {
        std::env::var($key)
            .map_err(|e| anyhow::anyhow!(e))
            .and_then(|$var| $expr)
    };
    ($key:expr => |$var:ident| $expr:expr; anyhow) => {
        $crate::parse_env!($key => |$var| $expr.map_err(|e| anyhow::anyhow!(e)))
    };
}

#[cfg(feature = "env_token")]
static_lazy_lock! {
    /// The personal access token, read from `AZURE_DEVOPS_TOKEN`.
    pub DEVOPS_TOKEN: Option<String> = std::env::var("AZURE_DEVOPS_TOKEN")
        .ok()
        .filter(|token| !token.is_empty());
}

#[cfg(feature = "env_max_retries")]
static_lazy_lock! {
    /// The maximum attempts per request, read from `MAX_RETRIES`.
    pub MAX_RETRIES: u32 = parse_env!("MAX_RETRIES" => |s| s.parse::<u32>(); anyhow)
        .unwrap_or(crate::framework::DEFAULT_MAX_ATTEMPTS);
}
