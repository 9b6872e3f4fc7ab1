use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use semver::{Prerelease, Version};

use crate::version::types::UpdateType;

/// First run of up to three numeric components not glued to other digits
static COERCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\d])(\d{1,16})(?:\.(\d{1,16}))?(?:\.(\d{1,16}))?(?:$|[^\d])").unwrap()
});

/// PEP 440 release with an optional pre/dev segment: `5.0a1`, `2.1.0rc2`, `1.0.dev3`
static PEP440_PRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?[-_.]?(a|alpha|b|beta|c|rc|pre|preview|dev)[-_.]?(\d*)$",
    )
    .unwrap()
});

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2.3" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Option<Version> {
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Extract a bare version from a specifier, ignoring any constraint operators.
///
/// Missing minor and patch components become 0 and prerelease tags are dropped.
///
/// Examples:
/// - "^2.31.0" -> 2.31.0
/// - ">=2.0" -> 2.0.0
/// - "==1.2.3.4" -> 1.2.3
/// - "*" -> None
pub fn coerce(spec: &str) -> Option<Version> {
    let caps = COERCE_RE.captures(spec)?;
    let component = |i: usize| -> Option<u64> {
        caps.get(i)
            .map_or(Some(0), |m| m.as_str().parse::<u64>().ok())
    };
    Some(Version::new(component(1)?, component(2)?, component(3)?))
}

/// Normalize a release identifier published on PyPI into a semver version.
///
/// Valid semver is kept as is, PEP 440 pre-releases become semver prereleases
/// (`5.0a1` -> `5.0.0-a.1`), and anything else is coerced.
pub fn normalize_release(release: &str) -> Option<Version> {
    if let Ok(version) = Version::parse(release) {
        return Some(version);
    }

    if let Some(caps) = PEP440_PRE_RE.captures(release) {
        let component =
            |i: usize| caps.get(i).map_or(Some(0), |m| m.as_str().parse::<u64>().ok());
        let tag = match caps[4].to_ascii_lowercase().as_str() {
            "a" | "alpha" => "a",
            "b" | "beta" => "b",
            "dev" => "dev",
            _ => "rc",
        };
        let number = caps.get(5).map(|m| m.as_str()).filter(|n| !n.is_empty());
        let pre = Prerelease::new(&format!("{tag}.{}", number.unwrap_or("0"))).ok()?;

        let mut version = Version::new(component(1)?, component(2)?, component(3)?);
        version.pre = pre;
        return Some(version);
    }

    coerce(release)
}

/// Whether a version string carries a prerelease tag
pub fn is_prerelease(version: &str) -> bool {
    parse_version(version).is_some_and(|v| !v.pre.is_empty())
}

/// Classify the difference between two concrete versions.
///
/// Pre-release variants collapse into their base category (premajor is
/// `Major`, preminor is `Minor`, everything else is `Patch`). Equal or
/// unparseable inputs are reported as `Patch`.
pub fn generic_diff(a: &str, b: &str) -> UpdateType {
    let (Some(a), Some(b)) = (parse_version(a), parse_version(b)) else {
        return UpdateType::Patch;
    };

    let (high, low) = match a.cmp(&b) {
        Ordering::Equal => return UpdateType::Patch,
        Ordering::Greater => (&a, &b),
        Ordering::Less => (&b, &a),
    };

    // 1.0.0-rc.1 -> 1.0.0 is a major release, 1.1.0-rc.1 -> 1.1.0 a minor one
    if !low.pre.is_empty() && high.pre.is_empty() {
        if low.minor == 0 && low.patch == 0 {
            return UpdateType::Major;
        }
        if (low.major, low.minor, low.patch) == (high.major, high.minor, high.patch) {
            return if low.patch == 0 {
                UpdateType::Minor
            } else {
                UpdateType::Patch
            };
        }
    }

    if a.major != b.major {
        UpdateType::Major
    } else if a.minor != b.minor {
        UpdateType::Minor
    } else {
        UpdateType::Patch
    }
}

/// Newest stable version sharing the current major, strictly newer than current
///
/// Returns None if the specifier cannot be coerced or nothing newer exists in
/// the same major.
pub fn latest_in_same_major(all_versions: &[String], current_spec: &str) -> Option<String> {
    let current = coerce(current_spec)?;

    all_versions
        .iter()
        .filter_map(|v| parse_version(v))
        .filter(|v| v.major == current.major && *v > current && v.pre.is_empty())
        .max()
        .map(|v| v.to_string())
}

/// Whether the coerced specifier is one of the known versions
///
/// Permissive: returns true when there is nothing to check against or the
/// specifier cannot be coerced.
pub fn is_known_version(all_versions: &[String], current_spec: &str) -> bool {
    if all_versions.is_empty() || current_spec.is_empty() {
        return true;
    }

    let Some(current) = coerce(current_spec) else {
        return true;
    };

    let current = current.to_string();
    all_versions.iter().any(|v| *v == current)
}
