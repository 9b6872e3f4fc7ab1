//! Registry test utilities

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use pyproject_deps::version::cache::MetadataCache;
use pyproject_deps::version::error::RegistryError;
use pyproject_deps::version::provider::MetadataProvider;
use pyproject_deps::version::registry::Registry;
use pyproject_deps::version::semver::is_prerelease;
use pyproject_deps::version::types::PackageMetadata;

/// Mock registry serving fixed version lists, newest first
pub struct MockRegistry {
    packages: HashMap<String, Vec<String>>,
    calls: AtomicUsize,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            packages: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_versions(mut self, package: &str, versions: Vec<&str>) -> Self {
        self.packages.insert(
            package.to_string(),
            versions.into_iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn fetch_metadata(&self, package_name: &str) -> Result<PackageMetadata, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let versions = self
            .packages
            .get(package_name)
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))?;

        Ok(PackageMetadata {
            name: package_name.to_string(),
            summary: format!("{package_name} summary"),
            latest_stable: versions
                .iter()
                .find(|v| !is_prerelease(v))
                .or(versions.first())
                .cloned()
                .unwrap_or_else(|| "0.0.0".to_string()),
            latest_prerelease: versions.iter().find(|v| is_prerelease(v)).cloned(),
            all_versions: versions.clone(),
            home_page: None,
            documentation_url: None,
            changelog_url: None,
        })
    }
}

/// Create a provider over the mock registry with a fresh cache
pub fn create_test_provider(registry: Arc<MockRegistry>) -> MetadataProvider {
    MetadataProvider::with_cache(registry, Arc::new(MetadataCache::new(60_000)), 5_000)
}

/// Write a pyproject.toml into a temporary directory
pub fn write_manifest(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pyproject.toml");
    std::fs::write(&path, content).unwrap();
    (temp_dir, path)
}
