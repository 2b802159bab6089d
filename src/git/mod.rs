//! Data models of Azure Repos: repositories, refs and pull requests.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The object id that deletes a ref when pushed as its new value.
pub const NULL_OBJECT_ID: &str = "0000000000000000000000000000000000000000";

/// Represents a Git repository from Azure DevOps REST API.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// The stable identifier used by every other endpoint. Empty when the service omitted it.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub default_branch: Option<String>,
    pub url: Option<String>,
}

impl Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Represents a pull request from Azure DevOps REST API.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub pull_request_id: u64,
    #[serde(default)]
    pub source_ref_name: String,
    #[serde(default)]
    pub target_ref_name: String,
    pub status: Option<String>,
    pub title: Option<String>,
}

impl PullRequest {
    /// Returns the ref that builds of this pull request run against.
    pub fn merge_ref(&self) -> String {
        merge_ref(self.pull_request_id)
    }
}

/// Returns the synthetic merge ref of a pull request.
pub fn merge_ref(pull_request_id: u64) -> String {
    format!("refs/pull/{pull_request_id}/merge")
}

/// Returns the full ref of a branch. Names that are already refs are kept as they are.
pub fn branch_ref(branch: &str) -> String {
    if branch.starts_with("refs/") {
        branch.to_owned()
    } else {
        format!("refs/heads/{branch}")
    }
}

/// Returns the short name of a branch, without its `refs/heads/` prefix.
pub fn branch_name(branch: &str) -> &str {
    branch.strip_prefix("refs/heads/").unwrap_or(branch)
}

/// Represents a Git ref from Azure DevOps REST API.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GitRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub object_id: String,
}

/// The body of a pull request creation.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewPullRequest {
    pub source_ref_name: String,
    pub target_ref_name: String,
    pub title: String,
    pub description: String,
    pub is_draft: bool,
}

/// One entry of a ref update, as posted to the refs endpoint.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefUpdate {
    pub name: String,
    pub old_object_id: String,
    pub new_object_id: String,
}

impl RefUpdate {
    /// Creates an update that deletes the ref currently pointing at `old_object_id`.
    pub fn delete<N, O>(name: N, old_object_id: O) -> Self
    where
        N: Into<String>,
        O: Into<String>,
    {
        Self {
            name: name.into(),
            old_object_id: old_object_id.into(),
            new_object_id: NULL_OBJECT_ID.to_owned(),
        }
    }
}
