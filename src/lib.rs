//! A client for the Azure DevOps REST API that resolves build artifacts.
//!
//! The crate is built in two layers. [`framework`] sends requests, classifies responses and retries
//! transient failures. [`transactions`] builds the artifact search and the other repository, pull
//! request and build operations on top of it, exposed through [`DevOpsClient`].
//!
//! ```no_run
//! use devops_artifacts::{ArtifactQuery, ClientConfig, DevOpsClient};
//!
//! # fn main() -> Result<(), devops_artifacts::ApiError> {
//! let client = DevOpsClient::new(ClientConfig::new("contoso", "tools"))?;
//! let query = ArtifactQuery::new("installer", "tools-repo").branch("release/2.0");
//!
//! match client.get_artifact_for_repo_and_branch(&query)? {
//!     Some(resolved) => println!("{} at {}", resolved.version, resolved.download_url),
//!     None => println!("not built yet"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod env;
pub mod error;
pub mod framework;
pub mod git;
pub mod pipeline;
pub mod transactions;

#[cfg(test)]
pub(crate) mod test_utils;

pub use client::{ClientConfig, DevOpsClient};
pub use error::{ApiError, ErrorKind, Result, TransportError};
pub use framework::{RetryConfig, State};
pub use transactions::{ArtifactQuery, BuildSearch, ResolvedArtifact};

/// A shorthand to define a statically allocated variable using a [`std::sync::LazyLock`].
///
/// # Examples
///
/// ```rust
/// # use devops_artifacts::static_lazy_lock;
/// # use std::sync::LazyLock;
/// static_lazy_lock! {
///     pub VAR_1: String = String::from("a static variable");
/// }
/// // ...equals to...
/// pub static VAR_2: LazyLock<String> = LazyLock::new(|| String::from("a static variable"));
/// ```
#[macro_export]
macro_rules! static_lazy_lock {
    ($(#[$meta:meta])* $vis:vis $name:ident: $type:ty = $expr:expr $(;)?) => {
        $(#[$meta])*
        $vis static $name: $crate::__priv_macro_use::LazyLock<$type> =
            $crate::__priv_macro_use::LazyLock::new(|| $expr);
    };
}

#[doc(hidden)]
pub mod __priv_macro_use {
    pub use std::sync::LazyLock;
}
