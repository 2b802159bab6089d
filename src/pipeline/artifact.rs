//! Build artifacts from Azure DevOps REST API.

use std::fmt::Display;

use serde::Deserialize;

/// Represents an artifact published by a build.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub resource: Option<ArtifactResource>,
}

/// Describes where the content of an [`Artifact`] lives.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactResource {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub data: Option<String>,
    #[serde(default)]
    pub download_url: String,
}

impl Artifact {
    /// Returns the download URL, if the service provided a usable one.
    pub fn download_url(&self) -> Option<&str> {
        self.resource
            .as_ref()
            .map(|resource| resource.download_url.as_str())
            .filter(|url| !url.is_empty())
    }
}

impl Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.download_url() {
            Some(url) => write!(f, "{} ({} at {url})", self.name, self.id),
            None => write!(f, "{} ({})", self.name, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const URL: &str = "https://dev.azure.com/org/proj/_apis/build/builds/5/artifacts?$format=zip";

    #[test]
    fn reads_download_url_from_resource() {
        let artifact: Artifact = serde_json::from_value(json!({
            "id": 12,
            "name": "drop",
            "resource": {
                "type": "Container",
                "data": "#/1234/drop",
                "downloadUrl": URL
            }
        }))
        .unwrap();

        assert_eq!(artifact.download_url(), Some(URL));
        assert_eq!(artifact.to_string(), format!("drop (12 at {URL})"));
        let kind = artifact.resource.and_then(|resource| resource.kind);
        assert_eq!(kind.as_deref(), Some("Container"));
    }

    #[test]
    fn missing_resource_means_no_url() {
        let artifact: Artifact = serde_json::from_value(json!({ "name": "drop" })).unwrap();
        assert_eq!(artifact.download_url(), None);
        assert_eq!(artifact.to_string(), "drop (0)");

        let artifact: Artifact =
            serde_json::from_value(json!({ "name": "drop", "resource": {} })).unwrap();
        assert_eq!(artifact.download_url(), None);
    }
}
