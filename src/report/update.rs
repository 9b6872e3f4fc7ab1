//! Rewrite a package's declared version in manifest text

use thiserror::Error;
use tracing::{debug, info};

use crate::parser::pyproject_toml::PyprojectTomlParser;
use crate::parser::types::LocatedDeclaration;
use crate::report::edit::{EditError, apply_edit, suggest_edits};
use crate::version::cache::{Clock, normalize_package_name};
use crate::version::provider::MetadataProvider;
use crate::version::semver::latest_in_same_major;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("{0} is not declared")]
    NotDeclared(String),

    #[error("No metadata available for {0}")]
    MetadataUnavailable(String),

    #[error("{0} is already up to date")]
    UpToDate(String),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Update every declaration of `package` to its latest stable version
///
/// With `same_major`, the newest version within each declaration's current
/// major is used instead. Operators in the specifier are kept.
pub async fn update_manifest<C: Clock>(
    parser: &PyprojectTomlParser,
    provider: &MetadataProvider<C>,
    content: &str,
    package: &str,
    same_major: bool,
) -> Result<String, UpdateError> {
    let wanted = normalize_package_name(package);
    let mut declarations: Vec<LocatedDeclaration> = parser
        .parse(content)
        .into_iter()
        .filter(|d| normalize_package_name(&d.name) == wanted)
        .collect();
    if declarations.is_empty() {
        return Err(UpdateError::NotDeclared(package.to_string()));
    }

    let metadata = provider
        .fetch_metadata(package)
        .await
        .ok_or_else(|| UpdateError::MetadataUnavailable(package.to_string()))?;

    // Later spans first so earlier columns stay valid
    declarations.sort_by(|a, b| (b.line, b.spec_start_col).cmp(&(a.line, a.spec_start_col)));

    let mut updated = content.to_string();
    let mut applied = 0;
    for declaration in &declarations {
        let target = if same_major {
            latest_in_same_major(&metadata.all_versions, &declaration.version_spec)
        } else {
            Some(metadata.latest_stable.clone())
        };
        let Some(suggestion) = suggest_edits(declaration, &metadata)
            .into_iter()
            .find(|s| Some(&s.version) == target.as_ref())
        else {
            debug!(
                "No update for {} {} on line {}",
                declaration.name,
                declaration.version_spec,
                declaration.line + 1
            );
            continue;
        };

        updated = apply_edit(&updated, &suggestion.edit)?;
        applied += 1;
    }

    if applied == 0 {
        return Err(UpdateError::UpToDate(package.to_string()));
    }
    info!("Updated {} declaration(s) of {}", applied, package);
    Ok(updated)
}
