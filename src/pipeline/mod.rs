//! Data models of Azure Pipelines builds.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub mod artifact;

pub use artifact::{Artifact, ArtifactResource};

/// The lifecycle status of a build.
#[non_exhaustive]
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BuildStatus {
    None,
    InProgress,
    Completed,
    Cancelling,
    Postponed,
    NotStarted,
    All,
    #[serde(other)]
    Unknown,
}

/// The outcome of a finished build.
#[non_exhaustive]
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BuildResult {
    None,
    Succeeded,
    PartiallySucceeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// Represents a build from Azure DevOps REST API.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    #[serde(default)]
    pub id: u64,
    /// Formatted as `<version>-<suffix>`.
    #[serde(default)]
    pub build_number: String,
    pub status: Option<BuildStatus>,
    pub result: Option<BuildResult>,
    pub finish_time: Option<DateTime<Utc>>,
}

impl Build {
    /// Returns the version part of the build number: everything before the first `-`.
    pub fn version(&self) -> &str {
        version_of(&self.build_number)
    }
}

impl Display for Build {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "build {} ({})", self.build_number, self.id)
    }
}

/// Splits a build number on its first `-` and returns the leading segment.
pub fn version_of(build_number: &str) -> &str {
    build_number
        .split_once('-')
        .map_or(build_number, |(version, _)| version)
}

/// The ranked builds of one search, most recently finished first.
///
/// A window can be walked any number of times. Each walk is lazy: [`BuildWindow::find_first`]
/// stops probing as soon as one build yields a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildWindow {
    builds: Vec<Build>,
}

impl BuildWindow {
    /// Ranks the builds by finish time, most recent first. Builds that have not finished keep the
    /// service's order after the finished ones. Entries without an id are dropped.
    pub fn new(builds: Vec<Build>) -> Self {
        let mut builds: Vec<Build> = builds.into_iter().filter(|build| build.id != 0).collect();
        // Stable, so ties and unfinished builds keep the service's order.
        builds.sort_by(|a, b| match (a.finish_time, b.finish_time) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Self { builds }
    }

    /// Iterates the candidates in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, Build> {
        self.builds.iter()
    }

    /// Returns the number of candidates.
    pub fn len(&self) -> usize {
        self.builds.len()
    }

    /// Returns whether there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    /// Probes the builds in rank order and returns the first hit, alongside the build it came from.
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first error from `probe`.
    pub fn find_first<F, R, E>(&self, mut probe: F) -> Result<Option<(&Build, R)>, E>
    where
        F: FnMut(&Build) -> Result<Option<R>, E>,
    {
        for build in &self.builds {
            if let Some(hit) = probe(build)? {
                return Ok(Some((build, hit)));
            }
        }
        Ok(None)
    }
}

impl<'a> IntoIterator for &'a BuildWindow {
    type Item = &'a Build;
    type IntoIter = std::slice::Iter<'a, Build>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn build(id: u64, finish_time: Option<&str>) -> Build {
        Build {
            id,
            build_number: format!("1.0.{id}-abc"),
            status: Some(BuildStatus::Completed),
            result: Some(BuildResult::Succeeded),
            finish_time: finish_time.map(|t| t.parse().unwrap()),
        }
    }

    #[test]
    fn version_is_everything_before_the_first_dash() {
        assert_eq!(version_of("1.2.3-abcdef"), "1.2.3");
        assert_eq!(version_of("1.2.3-rc-1"), "1.2.3");
        assert_eq!(version_of("20240101.4"), "20240101.4");
        assert_eq!(version_of(""), "");
    }

    #[test]
    fn decodes_service_payload() {
        let build: Build = serde_json::from_value(json!({
            "id": 981,
            "buildNumber": "4.1.0-g1a2b3c",
            "status": "completed",
            "result": "partiallySucceeded",
            "finishTime": "2024-05-02T10:20:30.123Z",
            "definition": { "id": 7, "name": "ci" }
        }))
        .unwrap();

        assert_eq!(build.id, 981);
        assert_eq!(build.version(), "4.1.0");
        assert_eq!(build.status, Some(BuildStatus::Completed));
        assert_eq!(build.result, Some(BuildResult::PartiallySucceeded));
        assert!(build.finish_time.is_some());
    }

    #[test]
    fn unknown_enum_values_do_not_fail_decoding() {
        let build: Build = serde_json::from_value(json!({
            "id": 1,
            "status": "somethingNew",
            "result": "mystery"
        }))
        .unwrap();

        assert_eq!(build.status, Some(BuildStatus::Unknown));
        assert_eq!(build.result, Some(BuildResult::Unknown));
        assert_eq!(build.build_number, "");
    }

    #[test]
    fn window_ranks_by_finish_time() {
        let window = BuildWindow::new(vec![
            build(1, Some("2024-01-01T00:00:00Z")),
            build(2, None),
            build(3, Some("2024-03-01T00:00:00Z")),
            build(0, Some("2024-04-01T00:00:00Z")),
            build(4, Some("2024-02-01T00:00:00Z")),
            build(5, None),
        ]);

        let ids: Vec<u64> = window.iter().map(|build| build.id).collect();
        assert_eq!(ids, vec![3, 4, 1, 2, 5]);
    }

    #[test]
    fn find_first_stops_at_the_first_hit() {
        let window = BuildWindow::new((1..=10).map(|id| build(id, None)).collect());
        let mut probed = Vec::new();

        let hit = window
            .find_first(|build| {
                probed.push(build.id);
                Ok::<_, ()>((build.id == 5).then_some("found"))
            })
            .unwrap();

        let (build, value) = hit.unwrap();
        assert_eq!(build.id, 5);
        assert_eq!(value, "found");
        assert_eq!(probed, vec![1, 2, 3, 4, 5]);

        // A window can be walked again from the start.
        assert_eq!(window.iter().next().map(|build| build.id), Some(1));
    }

    #[test]
    fn find_first_propagates_errors() {
        let window = BuildWindow::new(vec![build(1, None), build(2, None)]);
        let result = window.find_first(|build| match build.id {
            1 => Err("boom"),
            _ => Ok(Some(())),
        });
        assert_eq!(result.unwrap_err(), "boom");
    }
}
