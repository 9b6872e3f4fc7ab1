//! In-memory metadata cache with a time-to-live
//!
//! The cache reads time from an injected [`Clock`] so expiry can be driven
//! deterministically in tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::version::error::CacheError;
use crate::version::types::PackageMetadata;

/// Source of the current time
#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CacheEntry {
    metadata: PackageMetadata,
    stored_at: DateTime<Utc>,
}

/// Package metadata keyed by normalized package name
pub struct MetadataCache<C: Clock = SystemClock> {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: C,
}

impl MetadataCache<SystemClock> {
    /// Create a cache on the wall clock; `ttl_ms` is the entry lifetime in milliseconds
    pub fn new(ttl_ms: i64) -> Self {
        Self::with_clock(ttl_ms, SystemClock)
    }
}

impl<C: Clock> MetadataCache<C> {
    pub fn with_clock(ttl_ms: i64, clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::milliseconds(ttl_ms),
            clock,
        }
    }

    fn lock_entries(&self) -> Result<MutexGuard<'_, HashMap<String, CacheEntry>>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::LockPoisoned)
    }

    /// Get fresh metadata for a package, evicting it if it has expired
    pub fn get(&self, package_name: &str) -> Result<Option<PackageMetadata>, CacheError> {
        let key = normalize_package_name(package_name);
        let now = self.clock.now();
        let mut entries = self.lock_entries()?;

        match entries.get(&key) {
            Some(entry) if now - entry.stored_at < self.ttl => Ok(Some(entry.metadata.clone())),
            Some(_) => {
                debug!("Cache entry for {} expired", key);
                entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Store metadata for a package, replacing any previous entry
    pub fn insert(&self, package_name: &str, metadata: PackageMetadata) -> Result<(), CacheError> {
        let key = normalize_package_name(package_name);
        let stored_at = self.clock.now();
        self.lock_entries()?
            .insert(key, CacheEntry { metadata, stored_at });
        Ok(())
    }

    pub fn invalidate(&self, package_name: &str) -> Result<(), CacheError> {
        self.lock_entries()?
            .remove(&normalize_package_name(package_name));
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        self.lock_entries()?.clear();
        Ok(())
    }

    /// Number of stored entries, fresh or not
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock_entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

/// PEP 503 normalization: lowercase, runs of `-`, `_`, `.` become a single `-`
pub fn normalize_package_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
            }
            in_separator = true;
        } else {
            normalized.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    normalized
}
