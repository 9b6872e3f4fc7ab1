//! PyPI registry client for fetching Python package metadata

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use reqwest::Client;
use semver::Version;
use serde::Deserialize;
use tracing::debug;

use crate::version::error::RegistryError;
use crate::version::registry::Registry;
use crate::version::semver::normalize_release;
use crate::version::types::PackageMetadata;

pub const DEFAULT_PYPI_REGISTRY: &str = "https://pypi.org";

/// Placeholder when a package has no usable release at all
const NO_RELEASE: &str = "0.0.0";

/// PyPI registry client
pub struct PypiRegistry {
    client: Client,
    base_url: String,
}

impl Default for PypiRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PYPI_REGISTRY.to_string())
    }
}

impl PypiRegistry {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// PyPI JSON API response structure
#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
    #[serde(default)]
    releases: HashMap<String, serde_json::Value>,
}

/// Package information from PyPI
#[derive(Debug, Deserialize)]
struct PypiInfo {
    name: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    home_page: Option<String>,
    #[serde(default)]
    docs_url: Option<String>,
    #[serde(default)]
    project_urls: Option<HashMap<String, String>>,
}

impl PypiInfo {
    fn project_url(&self, keys: &[&str]) -> Option<String> {
        let urls = self.project_urls.as_ref()?;
        keys.iter().find_map(|key| urls.get(*key).cloned())
    }
}

/// Normalize release keys into semver, drop what cannot be read, newest first
fn normalize_releases<'a>(releases: impl IntoIterator<Item = &'a String>) -> Vec<Version> {
    let mut versions: Vec<Version> = releases
        .into_iter()
        .filter_map(|release| {
            normalize_release(release).or_else(|| {
                debug!("Skipping unreadable release '{}'", release);
                None
            })
        })
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    versions.sort_by(|a, b| b.cmp(a));
    versions
}

fn into_metadata(response: PypiResponse) -> PackageMetadata {
    let versions = normalize_releases(response.releases.keys());

    let latest_stable = versions
        .iter()
        .find(|v| v.pre.is_empty())
        .or_else(|| versions.first())
        .map_or_else(|| NO_RELEASE.to_string(), |v| v.to_string());
    let latest_prerelease = versions
        .iter()
        .find(|v| !v.pre.is_empty())
        .map(|v| v.to_string());

    let info = response.info;
    let documentation_url = info
        .project_url(&["Documentation"])
        .or_else(|| info.docs_url.clone())
        .filter(|url| !url.is_empty());
    let changelog_url = info.project_url(&["Changelog", "Release notes"]);

    PackageMetadata {
        summary: info.summary.clone().unwrap_or_default(),
        home_page: info.home_page.clone().filter(|url| !url.is_empty()),
        documentation_url,
        changelog_url,
        latest_stable,
        latest_prerelease,
        all_versions: versions.iter().map(|v| v.to_string()).collect(),
        name: info.name,
    }
}

#[async_trait]
impl Registry for PypiRegistry {
    async fn fetch_metadata(&self, package_name: &str) -> Result<PackageMetadata, RegistryError> {
        let url = format!("{}/pypi/{}/json", self.base_url, package_name);
        debug!("Fetching PyPI package: {}", url);

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(package_name.to_string()));
        }

        if !response.status().is_success() {
            return Err(RegistryError::InvalidResponse(format!(
                "PyPI API returned status {}",
                response.status()
            )));
        }

        let pypi_response: PypiResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;

        let metadata = into_metadata(pypi_response);

        debug!(
            "Found {} versions for package {}",
            metadata.all_versions.len(),
            package_name
        );

        Ok(metadata)
    }
}
