//! Manifest check pipeline: locate declarations, look up metadata, annotate

use std::collections::HashMap;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::FETCH_STAGGER_DELAY_MS;
use crate::parser::pyproject_toml::PyprojectTomlParser;
use crate::parser::types::LocatedDeclaration;
use crate::report::annotation::{Annotation, annotate};
use crate::report::edit::{EditSuggestion, suggest_edits};
use crate::version::cache::Clock;
use crate::version::checker::{VersionStatus, classify};
use crate::version::provider::MetadataProvider;
use crate::version::types::PackageMetadata;

/// A located declaration together with everything known about its package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedDeclaration {
    pub declaration: LocatedDeclaration,
    /// None when the package metadata could not be fetched
    pub status: Option<VersionStatus>,
    pub annotation: Option<Annotation>,
    pub suggestions: Vec<EditSuggestion>,
}

impl CheckedDeclaration {
    fn new(declaration: LocatedDeclaration, metadata: Option<&PackageMetadata>) -> Self {
        let Some(metadata) = metadata else {
            return Self {
                declaration,
                status: None,
                annotation: None,
                suggestions: Vec::new(),
            };
        };

        Self {
            status: Some(classify(&declaration.version_spec, &metadata.latest_stable)),
            annotation: annotate(&declaration, metadata),
            suggestions: suggest_edits(&declaration, metadata),
            declaration,
        }
    }
}

/// Fetch metadata for each distinct package name
///
/// Fetches run in parallel with staggered start times to avoid rate limiting.
pub async fn fetch_all<C: Clock>(
    provider: &MetadataProvider<C>,
    names: Vec<String>,
) -> HashMap<String, PackageMetadata> {
    let futures = names.into_iter().enumerate().map(|(i, name)| {
        let delay = Duration::from_millis(FETCH_STAGGER_DELAY_MS * i as u64);
        async move {
            sleep(delay).await;
            let metadata = provider.fetch_metadata(&name).await;
            (name, metadata)
        }
    });

    join_all(futures)
        .await
        .into_iter()
        .filter_map(|(name, metadata)| Some((name, metadata?)))
        .collect()
}

/// Check every declaration in a manifest against its registry metadata
///
/// Results keep the order in which declarations appear in the text. A package
/// whose metadata is unavailable yields a result without status.
pub async fn check_manifest<C: Clock>(
    parser: &PyprojectTomlParser,
    provider: &MetadataProvider<C>,
    content: &str,
) -> Vec<CheckedDeclaration> {
    let declarations = parser.parse(content);

    let mut names: Vec<String> = Vec::new();
    for declaration in &declarations {
        if !names.contains(&declaration.name) {
            names.push(declaration.name.clone());
        }
    }
    debug!(
        "Checking {} declarations ({} packages)",
        declarations.len(),
        names.len()
    );

    let metadata = fetch_all(provider, names).await;

    let checked: Vec<CheckedDeclaration> = declarations
        .into_iter()
        .map(|declaration| {
            let found = metadata.get(&declaration.name);
            CheckedDeclaration::new(declaration, found)
        })
        .collect();

    info!(
        "Checked {} declarations, {} with updates",
        checked.len(),
        checked.iter().filter(|c| c.annotation.is_some()).count()
    );

    checked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::annotation::AnnotationColor;
    use crate::version::cache::MetadataCache;
    use crate::version::cache::tests::{ManualClock, make_metadata};
    use crate::version::error::RegistryError;
    use crate::version::registry::MockRegistry;
    use crate::version::types::UpdateType;
    use std::sync::Arc;

    fn provider_with(registry: MockRegistry) -> MetadataProvider<ManualClock> {
        MetadataProvider::with_cache(
            Arc::new(registry),
            Arc::new(MetadataCache::with_clock(60_000, ManualClock::new())),
            5_000,
        )
    }

    #[tokio::test]
    async fn check_manifest_classifies_each_declaration_in_order() {
        let content = r#"[project]
dependencies = ["requests==2.31.0", "flask>=2.0"]
"#;
        let mut registry = MockRegistry::new();
        registry.expect_fetch_metadata().returning(|name| match name {
            "requests" => Ok(make_metadata("requests", &["2.32.0", "2.31.0"])),
            "flask" => Ok(make_metadata("flask", &["3.0.1", "3.0.0", "2.0.0"])),
            other => Err(RegistryError::NotFound(other.to_string())),
        });
        let provider = provider_with(registry);

        let results = check_manifest(&PyprojectTomlParser::new(), &provider, content).await;

        let summary: Vec<_> = results
            .iter()
            .map(|r| {
                (
                    r.declaration.name.as_str(),
                    r.status.as_ref().map(|s| s.update_type),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("requests", Some(UpdateType::Minor)),
                ("flask", Some(UpdateType::Major)),
            ]
        );
        assert_eq!(
            results[1].annotation.as_ref().map(|a| a.color),
            Some(AnnotationColor::Major)
        );
        assert_eq!(results[0].suggestions[0].edit.replacement, "==2.32.0");
    }

    #[tokio::test]
    async fn check_manifest_fetches_each_package_once() {
        let content = r#"[project]
dependencies = ["httpx>=0.27"]

[project.optional-dependencies]
http2 = ["httpx>=0.27"]
"#;
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_metadata()
            .times(1)
            .returning(|_| Ok(make_metadata("httpx", &["0.28.1", "0.27.0"])));
        let provider = provider_with(registry);

        let results = check_manifest(&PyprojectTomlParser::new(), &provider, content).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.status.is_some()));
    }

    #[tokio::test]
    async fn check_manifest_keeps_declarations_without_metadata() {
        let content = r#"[tool.poetry.dependencies]
python = "^3.11"
internal-lib = "1.0.0"
rich = "^13.0.0"
"#;
        let mut registry = MockRegistry::new();
        registry.expect_fetch_metadata().returning(|name| match name {
            "rich" => Ok(make_metadata("rich", &["13.7.1", "13.0.0"])),
            other => Err(RegistryError::NotFound(other.to_string())),
        });
        let provider = provider_with(registry);

        let results = check_manifest(&PyprojectTomlParser::new(), &provider, content).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].declaration.name, "internal-lib");
        assert_eq!(results[0].status, None);
        assert!(results[0].suggestions.is_empty());
        assert_eq!(
            results[1].status.as_ref().map(|s| s.update_type),
            Some(UpdateType::Minor)
        );
    }

    #[tokio::test]
    async fn check_manifest_returns_nothing_for_malformed_toml() {
        let provider = provider_with(MockRegistry::new());

        let results =
            check_manifest(&PyprojectTomlParser::new(), &provider, "[project\ndependencies = [").await;

        assert!(results.is_empty());
    }
}
