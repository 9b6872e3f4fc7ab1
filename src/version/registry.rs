//! Registry trait for fetching package metadata from a remote index

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::PackageMetadata;

/// Trait for fetching package metadata from a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches metadata and all known versions for a package
    ///
    /// # Arguments
    /// * `package_name` - The name of the package as declared (e.g., "requests")
    ///
    /// # Returns
    /// * `Ok(PackageMetadata)` - Versions ordered from newest to oldest
    /// * `Err(RegistryError)` - If the fetch fails
    async fn fetch_metadata(&self, package_name: &str) -> Result<PackageMetadata, RegistryError>;
}
