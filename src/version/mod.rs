//! Version layer: registry metadata, caching and classification
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Registry  │────▶│  Provider   │◀───▶│    Cache    │
//! │   (PyPI)    │     │  (timeout)  │     │    (TTL)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │   Checker   │
//!                     │ (classify)  │
//!                     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: In-memory TTL cache with an injected clock
//! - [`checker`]: Update classification of a declared specifier
//! - [`provider`]: Cache-first metadata lookups with timeouts
//! - [`registry`]: Registry trait for fetching metadata from remote sources
//! - [`registries`]: Concrete registry implementations
//! - [`error`]: Error types for cache and registry operations
//! - [`semver`]: Coercion, PEP 440 normalization and version queries
//! - [`types`]: `PackageMetadata` and `UpdateType`

pub mod cache;
pub mod checker;
pub mod error;
pub mod provider;
pub mod registries;
pub mod registry;
pub mod semver;
pub mod types;
