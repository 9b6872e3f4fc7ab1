//! End-of-line annotations describing how far behind a declaration is

use serde::Serialize;

use crate::parser::types::LocatedDeclaration;
use crate::version::checker::{VersionStatus, classify};
use crate::version::semver::{coerce, generic_diff, is_known_version, latest_in_same_major};
use crate::version::types::{PackageMetadata, UpdateType};

/// Color class of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationColor {
    Major,
    Minor,
    Patch,
    Prerelease,
    Warning,
}

impl AnnotationColor {
    /// Hex color used when rendering the annotation
    pub fn hex(&self) -> &'static str {
        match self {
            AnnotationColor::Major => "#ff4d4f",
            AnnotationColor::Minor => "#faad14",
            AnnotationColor::Patch => "#52c41a",
            AnnotationColor::Prerelease => "#eb2f96",
            AnnotationColor::Warning => "#e6a23c",
        }
    }

    fn for_update(update_type: UpdateType) -> Option<Self> {
        match update_type {
            UpdateType::Latest => None,
            UpdateType::Patch => Some(AnnotationColor::Patch),
            UpdateType::Minor => Some(AnnotationColor::Minor),
            UpdateType::Major => Some(AnnotationColor::Major),
            UpdateType::Prerelease => Some(AnnotationColor::Prerelease),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnnotationKind {
    /// A newer version is available
    Update { status: VersionStatus },
    /// The declared version is not among the published releases
    VersionNotFound,
}

/// Annotation attached to the end of a declaration's line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub line: usize,
    #[serde(flatten)]
    pub kind: AnnotationKind,
    pub color: AnnotationColor,
    pub text: String,
}

/// Build the annotation for a declaration, or None when it is up to date
pub fn annotate(declaration: &LocatedDeclaration, metadata: &PackageMetadata) -> Option<Annotation> {
    let status = classify(&declaration.version_spec, &metadata.latest_stable);
    let color = AnnotationColor::for_update(status.update_type)?;

    if !is_known_version(&metadata.all_versions, &declaration.version_spec) {
        return Some(Annotation {
            line: declaration.line,
            kind: AnnotationKind::VersionNotFound,
            color: AnnotationColor::Warning,
            text: "⚠ Version not found".to_string(),
        });
    }

    let mut text = format!("→ {}", status.latest);
    if status.update_type == UpdateType::Major
        && let Some(same_major) =
            latest_in_same_major(&metadata.all_versions, &declaration.version_spec)
    {
        let current = coerce(&declaration.version_spec)
            .map_or_else(|| declaration.version_spec.clone(), |v| v.to_string());
        let label = match generic_diff(&current, &same_major) {
            UpdateType::Patch => "Latest Patch",
            _ => "Latest Minor",
        };
        text = format!("→ {} ({}: {})", status.latest, label, same_major);
    }

    Some(Annotation {
        line: declaration.line,
        kind: AnnotationKind::Update { status },
        color,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::Dialect;
    use rstest::rstest;

    fn declaration(version_spec: &str) -> LocatedDeclaration {
        LocatedDeclaration {
            name: "requests".to_string(),
            version_spec: version_spec.to_string(),
            line: 3,
            name_start_col: 5,
            name_end_col: 13,
            spec_start_col: 13,
            spec_end_col: 13 + version_spec.chars().count(),
            dialect: Dialect::ProjectList,
        }
    }

    fn metadata(latest_stable: &str, versions: &[&str]) -> PackageMetadata {
        PackageMetadata {
            name: "requests".to_string(),
            summary: String::new(),
            latest_stable: latest_stable.to_string(),
            latest_prerelease: None,
            all_versions: versions.iter().map(|v| v.to_string()).collect(),
            home_page: None,
            documentation_url: None,
            changelog_url: None,
        }
    }

    #[test]
    fn annotate_returns_none_when_up_to_date() {
        let result = annotate(
            &declaration("==2.32.0"),
            &metadata("2.32.0", &["2.32.0", "2.31.0"]),
        );

        assert_eq!(result, None);
    }

    #[rstest]
    #[case("==2.31.0", "2.31.1", AnnotationColor::Patch, "→ 2.31.1")]
    #[case(">=2.31.0", "2.32.0", AnnotationColor::Minor, "→ 2.32.0")]
    #[case("1.2.0", "1.3.0-rc.1", AnnotationColor::Prerelease, "→ 1.3.0-rc.1")]
    fn annotate_colors_by_update_type(
        #[case] spec: &str,
        #[case] latest: &str,
        #[case] color: AnnotationColor,
        #[case] text: &str,
    ) {
        let result = annotate(
            &declaration(spec),
            &metadata(latest, &[latest, "2.31.0", "1.2.0"]),
        )
        .unwrap();

        assert_eq!(result.color, color);
        assert_eq!(result.text, text);
        assert_eq!(result.line, 3);
    }

    #[test]
    fn annotate_warns_when_declared_version_is_unknown() {
        let result = annotate(
            &declaration("==2.30.7"),
            &metadata("2.32.0", &["2.32.0", "2.31.0"]),
        )
        .unwrap();

        assert_eq!(result.kind, AnnotationKind::VersionNotFound);
        assert_eq!(result.color, AnnotationColor::Warning);
        assert_eq!(result.color.hex(), "#e6a23c");
        assert_eq!(result.text, "⚠ Version not found");
    }

    #[test]
    fn annotate_major_update_mentions_latest_minor_in_same_major() {
        let result = annotate(
            &declaration("^1.0.0"),
            &metadata("2.1.0", &["2.1.0", "2.0.0", "1.2.0", "1.1.0", "1.0.0"]),
        )
        .unwrap();

        assert_eq!(result.color, AnnotationColor::Major);
        assert_eq!(result.text, "→ 2.1.0 (Latest Minor: 1.2.0)");
        assert_eq!(
            result.kind,
            AnnotationKind::Update {
                status: VersionStatus {
                    current: "1.0.0".to_string(),
                    latest: "2.1.0".to_string(),
                    update_type: UpdateType::Major,
                }
            }
        );
    }

    #[test]
    fn annotate_major_update_mentions_latest_patch_in_same_major() {
        let result = annotate(
            &declaration("==1.2.0"),
            &metadata("2.0.0", &["2.0.0", "1.2.3", "1.2.0"]),
        )
        .unwrap();

        assert_eq!(result.text, "→ 2.0.0 (Latest Patch: 1.2.3)");
    }

    #[test]
    fn annotate_major_update_without_same_major_alternative() {
        let result = annotate(
            &declaration("==1.2.3"),
            &metadata("2.0.0", &["2.0.0", "1.2.3"]),
        )
        .unwrap();

        assert_eq!(result.text, "→ 2.0.0");
    }

    #[test]
    fn annotation_serializes_kind_inline() {
        let result = annotate(
            &declaration("==2.30.7"),
            &metadata("2.32.0", &["2.32.0"]),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({
                "line": 3,
                "kind": "version-not-found",
                "color": "warning",
                "text": "⚠ Version not found"
            })
        );
    }
}
