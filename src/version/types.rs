//! Common types for version checking

use serde::Serialize;

/// Everything the registry knows about a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageMetadata {
    pub name: String,
    pub summary: String,
    /// Newest non-prerelease version (newest of any kind if there is no stable one)
    pub latest_stable: String,
    pub latest_prerelease: Option<String>,
    /// Semver-normalized versions, deduplicated, newest first
    pub all_versions: Vec<String>,
    pub home_page: Option<String>,
    pub documentation_url: Option<String>,
    pub changelog_url: Option<String>,
}

/// Kind of update between a declared version and the compared-to version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    /// Nothing newer to report
    Latest,
    Patch,
    Minor,
    Major,
    /// The compared-to version is itself a prerelease
    Prerelease,
}

impl UpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::Latest => "latest",
            UpdateType::Patch => "patch",
            UpdateType::Minor => "minor",
            UpdateType::Major => "major",
            UpdateType::Prerelease => "prerelease",
        }
    }
}

impl std::fmt::Display for UpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
