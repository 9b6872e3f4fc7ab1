//! Version classification for declared dependencies

use serde::Serialize;
use tracing::debug;

use crate::version::semver::{coerce, parse_version};
use crate::version::types::UpdateType;

/// Result of classifying a declared specifier against a newer version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionStatus {
    /// Version coerced from the specifier, or the raw specifier if coercion failed
    pub current: String,
    /// Version the specifier was compared to
    pub latest: String,
    pub update_type: UpdateType,
}

/// Classify the update from the declared specifier to `latest_stable`
///
/// The specifier is coerced to a bare version (`^2.31.0` -> `2.31.0`) and
/// stands in for the installed version. A prerelease `latest_stable` is always
/// reported as `Prerelease`; otherwise the first of major, minor and patch
/// that increased decides the type. Unparseable input reports `Latest`.
pub fn classify(current_spec: &str, latest_stable: &str) -> VersionStatus {
    let Some(current) = coerce(current_spec) else {
        debug!("Cannot coerce '{}' to a version", current_spec);
        return VersionStatus {
            current: current_spec.to_string(),
            latest: latest_stable.to_string(),
            update_type: UpdateType::Latest,
        };
    };

    let status = |update_type| VersionStatus {
        current: current.to_string(),
        latest: latest_stable.to_string(),
        update_type,
    };

    let Some(latest) = parse_version(latest_stable).or_else(|| coerce(latest_stable)) else {
        debug!("Cannot parse latest version '{}'", latest_stable);
        return status(UpdateType::Latest);
    };

    let update_type = if !latest.pre.is_empty() {
        UpdateType::Prerelease
    } else if latest.major > current.major {
        UpdateType::Major
    } else if latest.minor > current.minor {
        UpdateType::Minor
    } else if latest.patch > current.patch {
        UpdateType::Patch
    } else {
        UpdateType::Latest
    };

    status(update_type)
}
