//! Registry implementations for fetching package metadata

pub mod pypi;

pub use pypi::PypiRegistry;
