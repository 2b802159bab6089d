use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{
    client::DevOpsClient,
    error::{ApiError, Result, require},
    framework::{ListResponse, Sleeper, Transport},
    git::{NewPullRequest, PullRequest, branch_name, branch_ref},
};

impl<T, S> DevOpsClient<T, S>
where
    T: Transport,
    S: Sleeper,
{
    /// Finds the active pull request whose source is the branch. [`None`] if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] if the branch is empty or is the trunk branch, which
    /// cannot be the source of a pull request.
    pub fn get_active_pull_request(
        &self,
        repository_id: &str,
        branch: &str,
    ) -> Result<Option<PullRequest>> {
        self.check_pull_request_source(branch)?;
        require(repository_id, "repository id")?;

        let source = branch_ref(branch);
        debug!("fetching active pull request from {source}…");
        let pull_requests = self.executor.get::<ListResponse<PullRequest>>(
            &format!("git/repositories/{repository_id}/pullrequests"),
            &[
                ("searchCriteria.status", "active"),
                ("searchCriteria.sourceRefName", source.as_str()),
                ("$top", "1"),
            ],
        )?;

        Ok(pull_requests.and_then(|list| list.value.into_iter().next()))
    }

    /// Opens a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] for empty refs or title, and [`ApiError::Rejected`] if
    /// the service refuses the request.
    pub fn create_pull_request(
        &self,
        repository_id: &str,
        pull_request: &NewPullRequest,
    ) -> Result<Value> {
        require(repository_id, "repository id")?;
        require(&pull_request.source_ref_name, "source branch")?;
        require(&pull_request.target_ref_name, "target branch")?;
        require(&pull_request.title, "pull request title")?;

        info!(
            "creating pull request {} -> {}…",
            pull_request.source_ref_name, pull_request.target_ref_name
        );
        self.executor.post(
            &format!("git/repositories/{repository_id}/pullrequests"),
            &[],
            pull_request,
        )
    }

    /// Abandons a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] if the service refuses the update.
    pub fn abandon_pull_request(&self, repository_id: &str, pull_request_id: u64) -> Result<Value> {
        require(repository_id, "repository id")?;

        info!("abandoning pull request {pull_request_id}…");
        self.executor.patch(
            &format!("git/repositories/{repository_id}/pullrequests/{pull_request_id}"),
            &[("api-version", "6.1-preview.1")],
            &json!({ "status": "abandoned" }),
        )
    }

    pub(crate) fn check_pull_request_source(&self, branch: &str) -> Result<()> {
        let name = branch_name(branch);
        if name.trim().is_empty() || name == branch_name(&self.default_branch) {
            return Err(ApiError::InvalidArgument(format!(
                "invalid pr with source branch of '{branch}'"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::ClientConfig,
        error::ErrorKind,
        test_utils::{FakeTransport, RecordingSleeper, client, ok_json, status},
    };

    #[test]
    fn finds_the_active_pull_request_of_a_branch() {
        let transport = FakeTransport::sequence([ok_json(json!({
            "count": 1,
            "value": [{
                "pullRequestId": 42,
                "sourceRefName": "refs/heads/feature/x",
                "targetRefName": "refs/heads/master",
                "status": "active"
            }]
        }))]);

        let pull_request = client(&transport)
            .get_active_pull_request("repo-id", "feature/x")
            .unwrap()
            .unwrap();

        assert_eq!(pull_request.pull_request_id, 42);
        assert_eq!(pull_request.merge_ref(), "refs/pull/42/merge");

        let request = &transport.requests()[0];
        assert!(request.url.ends_with("/repositories/repo-id/pullrequests"));
        assert_eq!(request.query_value("searchCriteria.status"), Some("active"));
        assert_eq!(
            request.query_value("searchCriteria.sourceRefName"),
            Some("refs/heads/feature/x")
        );
        assert_eq!(request.query_value("$top"), Some("1"));
    }

    #[test]
    fn no_active_pull_request_is_not_an_error() {
        let transport = FakeTransport::sequence([
            ok_json(json!({ "count": 0, "value": [] })),
            status(404),
        ]);
        let client = client(&transport);

        for _ in 0..2 {
            let found = client.get_active_pull_request("repo-id", "feature/x");
            assert_eq!(found.unwrap(), None);
        }
    }

    #[test]
    fn trunk_or_empty_branch_is_rejected_before_any_request() {
        let transport = FakeTransport::unreachable();
        let client = client(&transport);

        for branch in ["", "master", "refs/heads/master"] {
            let result = client.get_active_pull_request("repo-id", branch);
            assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidArgument);
        }
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn trunk_given_as_a_ref_is_still_the_trunk() {
        let transport = FakeTransport::unreachable();
        let client = DevOpsClient::with_transport(
            ClientConfig::new("org", "proj").with_default_branch("refs/heads/main"),
            transport.clone(),
            RecordingSleeper::default(),
        );

        for branch in ["main", "refs/heads/main"] {
            let result = client.get_active_pull_request("repo-id", branch);
            assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidArgument);
        }
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn create_and_abandon() {
        let transport = FakeTransport::new(|_| ok_json(json!({ "pullRequestId": 7 })));
        let client = client(&transport);

        let created = client
            .create_pull_request(
                "repo-id",
                &NewPullRequest {
                    source_ref_name: "refs/heads/feature/x".into(),
                    target_ref_name: "refs/heads/master".into(),
                    title: "Add x".into(),
                    description: "Adds x.".into(),
                    is_draft: false,
                },
            )
            .unwrap();
        assert_eq!(created["pullRequestId"], 7);

        client.abandon_pull_request("repo-id", 7).unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, reqwest::Method::POST);
        assert_eq!(requests[0].query_value("api-version"), Some("5.1"));

        let abandon = &requests[1];
        assert_eq!(abandon.method, reqwest::Method::PATCH);
        assert!(abandon.url.ends_with("/repo-id/pullrequests/7"));
        assert_eq!(abandon.query_value("api-version"), Some("6.1-preview.1"));
        assert_eq!(
            serde_json::from_slice::<Value>(abandon.body.as_deref().unwrap()).unwrap(),
            json!({ "status": "abandoned" })
        );
    }
}
