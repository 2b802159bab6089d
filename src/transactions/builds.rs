use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::{
    client::DevOpsClient,
    error::{ApiError, Result, require},
    framework::{ListResponse, Sleeper, Transport},
    git::{branch_ref, merge_ref},
    pipeline::{Artifact, Build, BuildWindow},
};

/// How many recent builds a search considers by default.
pub const DEFAULT_BUILD_WINDOW: u32 = 300;

const CI_REASONS: &str = "batchedCI,manual,individualCI";
const PULL_REQUEST_REASON: &str = "pullRequest";
const SUCCESSFUL_RESULTS: &str = "succeeded,partiallySucceeded";

/// Which builds a search looks at.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildScope {
    /// Completed and successful CI or manual builds of a branch, by build number prefix.
    Branch {
        /// The branch name or full ref.
        name: String,
        /// Matched against the start of the build number. Empty matches everything.
        build_number_prefix: String,
    },
    /// Active builds of a pull request's merge ref.
    PullRequest {
        /// The pull request id.
        id: u64,
    },
}

/// The filters of a build search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSearch {
    /// Which builds to look at.
    pub scope: BuildScope,
    /// How many of the most recently finished builds to return.
    pub top: u32,
}

impl BuildSearch {
    /// Searches completed builds of a branch.
    pub fn branch<N: Into<String>>(name: N) -> Self {
        Self {
            scope: BuildScope::Branch {
                name: name.into(),
                build_number_prefix: String::new(),
            },
            top: DEFAULT_BUILD_WINDOW,
        }
    }

    /// Searches active builds of a pull request.
    pub fn pull_request(id: u64) -> Self {
        Self {
            scope: BuildScope::PullRequest { id },
            top: DEFAULT_BUILD_WINDOW,
        }
    }

    /// Restricts a branch search to build numbers starting with the prefix. Pull request builds
    /// are never filtered by build number, so this has no effect on them.
    pub fn build_number_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        if let BuildScope::Branch {
            build_number_prefix,
            ..
        } = &mut self.scope
        {
            *build_number_prefix = prefix.into();
        }
        self
    }

    /// Replaces how many builds are returned.
    pub fn top(mut self, top: u32) -> Self {
        self.top = top;
        self
    }

    /// Returns the ref the builds ran against.
    pub fn branch_ref(&self) -> String {
        match &self.scope {
            BuildScope::Branch { name, .. } => branch_ref(name),
            BuildScope::PullRequest { id } => merge_ref(*id),
        }
    }

    fn query(&self, repository_id: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("repositoryId", repository_id.to_owned()),
            ("repositoryType", "TfsGit".to_owned()),
            ("branchName", self.branch_ref()),
            ("queryOrder", "finishTimeDescending".to_owned()),
            ("$top", self.top.to_string()),
        ];
        match &self.scope {
            BuildScope::Branch {
                build_number_prefix,
                ..
            } => query.extend([
                ("reasonFilter", CI_REASONS.to_owned()),
                ("statusFilter", "completed".to_owned()),
                ("resultFilter", SUCCESSFUL_RESULTS.to_owned()),
                ("buildNumber", format!("{build_number_prefix}*")),
            ]),
            BuildScope::PullRequest { .. } => query.extend([
                ("reasonFilter", PULL_REQUEST_REASON.to_owned()),
                ("statusFilter", "active".to_owned()),
                ("buildNumber", "*".to_owned()),
            ]),
        }
        query
    }
}

impl<T, S> DevOpsClient<T, S>
where
    T: Transport,
    S: Sleeper,
{
    /// Fetches the most recently finished builds of a repository that match the search.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for an empty repository id or branch name, and
    /// [`ApiError::NoBuilds`] if nothing matches, which usually means the branch or repository is
    /// wrong.
    pub fn get_top_builds(&self, repository_id: &str, search: &BuildSearch) -> Result<BuildWindow> {
        require(repository_id, "repository id")?;
        if let BuildScope::Branch { name, .. } = &search.scope {
            require(name, "branch name")?;
        }

        let query = search.query(repository_id);
        let query: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        debug!(
            "fetching top {} builds of {} in {repository_id}…",
            search.top,
            search.branch_ref()
        );

        let builds = self
            .executor
            .get::<ListResponse<Build>>("build/builds", &query)?
            .unwrap_or_default();
        let window = BuildWindow::new(builds.value);
        if window.is_empty() {
            error!(
                "no builds for given parameters | branch: {} | repo: {repository_id}",
                search.branch_ref()
            );
            return Err(ApiError::NoBuilds {
                branch: search.branch_ref(),
                repository_id: repository_id.to_owned(),
            });
        }

        info!("fetched {} builds of {}", window.len(), search.branch_ref());
        Ok(window)
    }

    /// Fetches the artifact of a build with the given name.
    ///
    /// [`None`] if the build did not publish it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for an empty build id or artifact name.
    pub fn get_artifact_details(
        &self,
        build_id: &str,
        artifact_name: &str,
    ) -> Result<Option<Artifact>> {
        require(build_id, "build id")?;
        require(artifact_name, "artifact name")?;

        self.executor.get(
            &format!("build/builds/{build_id}/artifacts"),
            &[("artifactName", artifact_name)],
        )
    }

    /// Queues a build. The body is passed through as the service expects it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] if the service refuses the request.
    pub fn queue_build<B>(&self, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        info!("queueing build…");
        self.executor
            .post("build/builds", &[("api-version", "6.0")], body)
    }

    /// Fetches a build by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for an empty build id.
    pub fn get_build_by_id(&self, build_id: &str) -> Result<Option<Value>> {
        require(build_id, "build id")?;
        self.executor.get(&format!("build/builds/{build_id}"), &[])
    }

    /// Fetches build definitions by name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for an empty name.
    pub fn get_definition_by_name(&self, name: &str) -> Result<Option<Value>> {
        require(name, "definition name")?;
        self.executor.get("build/definitions", &[("name", name)])
    }
}
