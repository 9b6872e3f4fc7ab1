//! Cached metadata lookups with a per-request timeout

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::config::{DEFAULT_CACHE_TTL_MS, FETCH_TIMEOUT_MS};
use crate::version::cache::{Clock, MetadataCache, SystemClock};
use crate::version::error::RegistryError;
use crate::version::registry::Registry;
use crate::version::types::PackageMetadata;

/// Looks up package metadata through the cache, falling back to the registry
pub struct MetadataProvider<C: Clock = SystemClock> {
    registry: Arc<dyn Registry>,
    cache: Arc<MetadataCache<C>>,
    timeout: Duration,
}

impl MetadataProvider<SystemClock> {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self::with_cache(
            registry,
            Arc::new(MetadataCache::new(DEFAULT_CACHE_TTL_MS)),
            FETCH_TIMEOUT_MS,
        )
    }
}

impl<C: Clock> MetadataProvider<C> {
    pub fn with_cache(
        registry: Arc<dyn Registry>,
        cache: Arc<MetadataCache<C>>,
        timeout_ms: u64,
    ) -> Self {
        Self {
            registry,
            cache,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn cache(&self) -> &MetadataCache<C> {
        &self.cache
    }

    /// Fetch metadata for a package
    ///
    /// Returns `None` when the registry lookup fails or times out. Failures are
    /// logged and never cached, so the next call retries.
    pub async fn fetch_metadata(&self, package_name: &str) -> Option<PackageMetadata> {
        if let Some(metadata) = self
            .cache
            .get(package_name)
            .inspect_err(|e| error!("Failed to read cache for {}: {}", package_name, e))
            .ok()
            .flatten()
        {
            debug!("Cache hit for {}", package_name);
            return Some(metadata);
        }

        let result = timeout(self.timeout, self.registry.fetch_metadata(package_name))
            .await
            .unwrap_or_else(|_| Err(RegistryError::Timeout(self.timeout.as_millis() as u64)));

        match result {
            Ok(metadata) => {
                info!(
                    "Fetched {} versions for {}",
                    metadata.all_versions.len(),
                    package_name
                );
                let _ = self
                    .cache
                    .insert(package_name, metadata.clone())
                    .inspect_err(|e| error!("Failed to cache {}: {}", package_name, e));
                Some(metadata)
            }
            Err(RegistryError::NotFound(_)) => {
                info!("Package not found: {}", package_name);
                None
            }
            Err(e) => {
                error!("Failed to fetch metadata for {}: {}", package_name, e);
                None
            }
        }
    }
}
