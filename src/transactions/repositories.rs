use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    client::DevOpsClient,
    error::{ApiError, Result, require},
    framework::{ListResponse, Sleeper, Transport},
    git::{GitRef, RefUpdate, Repository, branch_ref},
};

impl<T, S> DevOpsClient<T, S>
where
    T: Transport,
    S: Sleeper,
{
    /// Looks a repository up by name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for an empty name, and [`ApiError::NotFound`] if the
    /// repository does not exist or the service returned it without an id.
    pub fn get_repository_by_name(&self, name: &str) -> Result<Repository> {
        require(name, "repository name")?;
        debug!("fetching repository {name}…");

        match self
            .executor
            .get::<Repository>(&format!("git/repositories/{name}"), &[])?
        {
            Some(repository) if !repository.id.is_empty() => {
                debug!("fetched repository {repository}");
                Ok(repository)
            }
            _ => Err(ApiError::NotFound(format!("repository {name}"))),
        }
    }

    /// Looks a branch up by name. The result lists every ref under `heads/<branch_name>`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for an empty repository id or branch name.
    pub fn get_branch_by_name(
        &self,
        repository_id: &str,
        branch_name: &str,
    ) -> Result<Option<ListResponse<GitRef>>> {
        require(repository_id, "repository id")?;
        require(branch_name, "branch name")?;

        let filter = format!("heads/{branch_name}");
        self.executor.get(
            &format!("git/repositories/{repository_id}/refs"),
            &[("filter", filter.as_str())],
        )
    }

    /// Reads the metadata and content of a file, at the tip of a branch if one is given.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for an empty repository id or path.
    pub fn read_file_from_repo(
        &self,
        repository_id: &str,
        path: &str,
        branch_name: &str,
    ) -> Result<Option<Value>> {
        require(repository_id, "repository id")?;
        require(path, "file path")?;

        self.executor.get(
            &format!("git/repositories/{repository_id}/items"),
            &[("path", path), ("versionDescriptor.version", branch_name)],
        )
    }

    /// Reads the raw bytes of a file, at the tip of a branch if one is given.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for an empty repository id or path.
    pub fn read_raw_file_from_repo(
        &self,
        repository_id: &str,
        path: &str,
        branch_name: &str,
    ) -> Result<Option<Vec<u8>>> {
        require(repository_id, "repository id")?;
        require(path, "file path")?;

        self.executor.get_raw(
            &format!("git/repositories/{repository_id}/items"),
            &[
                ("path", path),
                ("versionDescriptor.version", branch_name),
                ("$format", "octetStream"),
            ],
        )
    }

    /// Creates a branch by posting a push. The body is passed through as the service expects it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] if the service refuses the push.
    pub fn create_new_branch<B>(&self, repository_id: &str, push: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        require(repository_id, "repository id")?;
        info!("pushing new branch to {repository_id}…");
        self.executor.post(
            &format!("git/repositories/{repository_id}/pushes"),
            &[],
            push,
        )
    }

    /// Deletes a branch currently pointing at `object_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for empty arguments and [`ApiError::Rejected`] if the
    /// service refuses the update.
    pub fn delete_branch(
        &self,
        repository_id: &str,
        branch_name: &str,
        object_id: &str,
    ) -> Result<Value> {
        require(repository_id, "repository id")?;
        require(branch_name, "branch name")?;
        require(object_id, "object id")?;

        info!("deleting branch {branch_name} of {repository_id}…");
        self.executor.post(
            &format!("git/repositories/{repository_id}/refs"),
            &[],
            &[RefUpdate::delete(branch_ref(branch_name), object_id)],
        )
    }

    /// Returns the repositories, in the given order, that have a branch with the name.
    ///
    /// Repositories are checked one at a time. A repository that cannot be looked up is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for an empty branch name, and any error that
    /// survived the retries of a lookup.
    pub fn repos_containing_branch<R>(
        &self,
        repository_ids: &[R],
        branch_name: &str,
    ) -> Result<Vec<String>>
    where
        R: AsRef<str>,
    {
        require(branch_name, "branch name")?;

        let mut found = Vec::new();
        for repository_id in repository_ids.iter().map(<R as AsRef<str>>::as_ref) {
            match self.get_branch_by_name(repository_id, branch_name) {
                Ok(Some(refs)) if refs.count > 0 => found.push(repository_id.to_owned()),
                Ok(_) => debug!("{repository_id} has no branch {branch_name}"),
                Err(ApiError::InvalidArgument(reason)) => warn!("skipping repository: {reason}"),
                Err(err) => return Err(err),
            }
        }

        info!(
            "{} of {} repositories have branch {branch_name}",
            found.len(),
            repository_ids.len()
        );
        Ok(found)
    }
}
