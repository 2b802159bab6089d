use tracing::{debug, info, warn};

use crate::{
    client::DevOpsClient,
    error::{Result, require},
    framework::{Sleeper, Transport},
    transactions::{BuildSearch, DEFAULT_BUILD_WINDOW},
};

/// What to look for in [`DevOpsClient::get_artifact_for_repo_and_branch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactQuery {
    /// The name the artifact was published under.
    pub artifact_name: String,
    /// The repository name.
    pub repository: String,
    /// The branch the build ran on, or the source branch of the pull request. Defaults to the
    /// client's trunk branch.
    pub branch: Option<String>,
    /// Whether to look at the builds of the branch's active pull request instead of the branch.
    pub pull_request: bool,
    /// Only consider branch builds whose build number starts with this. Ignored for pull requests.
    pub build_number_prefix: String,
    /// How many of the most recent builds to check.
    pub window: u32,
}

impl ArtifactQuery {
    /// Looks for the artifact on the trunk branch of the repository.
    pub fn new<A, R>(artifact_name: A, repository: R) -> Self
    where
        A: Into<String>,
        R: Into<String>,
    {
        Self {
            artifact_name: artifact_name.into(),
            repository: repository.into(),
            branch: None,
            pull_request: false,
            build_number_prefix: String::new(),
            window: DEFAULT_BUILD_WINDOW,
        }
    }

    /// Looks at another branch.
    pub fn branch<B: Into<String>>(mut self, branch: B) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Looks at the builds of the branch's active pull request.
    pub fn pull_request(mut self, pull_request: bool) -> Self {
        self.pull_request = pull_request;
        self
    }

    /// Restricts branch builds to build numbers starting with the prefix.
    pub fn build_number_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        self.build_number_prefix = prefix.into();
        self
    }

    /// Replaces how many recent builds are checked.
    pub fn window(mut self, window: u32) -> Self {
        self.window = window;
        self
    }
}

/// An artifact found by [`DevOpsClient::get_artifact_for_repo_and_branch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    /// The version of the build: its build number up to the first `-`.
    pub version: String,
    /// Where the artifact can be downloaded from.
    pub download_url: String,
    /// The build that published the artifact.
    pub build_id: u64,
    /// The full build number of that build.
    pub build_number: String,
}

impl<T, S> DevOpsClient<T, S>
where
    T: Transport,
    S: Sleeper,
{
    /// Finds the most recent build of a branch, or of its active pull request, that published the
    /// artifact, and returns the build's version with the artifact's download URL.
    ///
    /// Builds are checked one at a time, most recently finished first, and the search stops at the
    /// first build that has the artifact. [`None`] means the artifact has not been built yet: no
    /// build in the window published it, or there is no active pull request for the branch.
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidArgument`](crate::ApiError::InvalidArgument) for an empty artifact name
    ///   or repository, or a pull request search from an empty or trunk branch. Nothing is sent.
    /// - [`ApiError::NotFound`](crate::ApiError::NotFound) if the repository does not exist.
    /// - [`ApiError::NoBuilds`](crate::ApiError::NoBuilds) if the branch has no qualifying builds
    ///   at all.
    /// - Any request failure that survived the retries.
    pub fn get_artifact_for_repo_and_branch(
        &self,
        query: &ArtifactQuery,
    ) -> Result<Option<ResolvedArtifact>> {
        require(&query.artifact_name, "artifact name")?;
        require(&query.repository, "repository name")?;
        let branch = query.branch.as_deref().unwrap_or(&self.default_branch);
        if query.pull_request {
            self.check_pull_request_source(branch)?;
        } else {
            require(branch, "branch name")?;
        }

        let repository = self.get_repository_by_name(&query.repository)?;

        let search = if query.pull_request {
            match self.get_active_pull_request(&repository.id, branch)? {
                Some(pull_request) => {
                    debug!(
                        "resolved {branch} to pull request {}",
                        pull_request.pull_request_id
                    );
                    BuildSearch::pull_request(pull_request.pull_request_id)
                }
                None => {
                    info!("no active pull request from {branch} in {repository}");
                    return Ok(None);
                }
            }
        } else {
            BuildSearch::branch(branch).build_number_prefix(&query.build_number_prefix)
        };
        let search = search.top(query.window);

        let builds = self.get_top_builds(&repository.id, &search)?;
        debug!(
            "searching {} builds of {} for artifact {}…",
            builds.len(),
            search.branch_ref(),
            query.artifact_name
        );

        let found = builds.find_first(|build| -> Result<Option<String>> {
            let build_id = build.id.to_string();
            let Some(artifact) = self.get_artifact_details(&build_id, &query.artifact_name)? else {
                return Ok(None);
            };
            match artifact.download_url() {
                Some(url) => Ok(Some(url.to_owned())),
                None => {
                    warn!("{artifact} of {build} has no download url, skipping");
                    Ok(None)
                }
            }
        })?;

        match found {
            Some((build, download_url)) => {
                info!(
                    "found artifact {} in {build} of {}",
                    query.artifact_name,
                    search.branch_ref()
                );
                Ok(Some(ResolvedArtifact {
                    version: build.version().to_owned(),
                    download_url,
                    build_id: build.id,
                    build_number: build.build_number.clone(),
                }))
            }
            None => {
                info!(
                    "artifact {} not found in the last {} builds of {}",
                    query.artifact_name,
                    builds.len(),
                    search.branch_ref()
                );
                Ok(None)
            }
        }
    }
}
