//! Operations of the client, each built on the [`Executor`](crate::framework::Executor).
//!
//! Most operations are a single request with validated parameters. The exception is
//! [`get_artifact_for_repo_and_branch`], which searches recent builds for a published artifact.
//!
//! [`get_artifact_for_repo_and_branch`]: crate::DevOpsClient::get_artifact_for_repo_and_branch

mod builds;
#[cfg(feature = "download")]
mod download_artifact;
mod pull_requests;
mod repositories;
mod resolve_artifact;

pub use builds::*;
#[cfg(feature = "download")]
pub use download_artifact::*;
pub use resolve_artifact::*;
