//! Structural pass over pyproject.toml
//!
//! Decodes the manifest as TOML and collects every dependency declared under
//! a supported section as a [`Target`]. Positions are recovered separately by
//! [`crate::parser::locator`].
//!
//! Supported sections:
//! - `[project].dependencies` - PEP 621 requirement strings
//! - `[project.optional-dependencies]` - PEP 621 groups of requirement strings
//! - `[tool.poetry.dependencies]` - Poetry key/value table
//! - `[tool.poetry.group.<name>.dependencies]` - Poetry dependency groups

use toml::{Table, Value};
use tracing::{debug, warn};

use crate::parser::error::ParseError;
use crate::parser::types::{Dialect, Target};

/// Poetry's interpreter constraint, which is not a package
const PYTHON_PSEUDO_DEPENDENCY: &str = "python";

/// Extract dependency targets from the manifest text
///
/// A document that fails to parse yields no targets.
pub fn extract_targets(content: &str) -> Vec<Target> {
    let Ok(document) = parse_document(content)
        .inspect_err(|e| warn!("Failed to parse pyproject.toml: {}", e))
    else {
        return Vec::new();
    };

    let mut targets = Vec::new();

    if let Some(project) = document.get("project").and_then(Value::as_table) {
        extract_project(project, &mut targets);
    }

    if let Some(poetry) = document
        .get("tool")
        .and_then(Value::as_table)
        .and_then(|tool| tool.get("poetry"))
        .and_then(Value::as_table)
    {
        extract_poetry(poetry, &mut targets);
    }

    debug!("Extracted {} dependency targets", targets.len());
    targets
}

fn parse_document(content: &str) -> Result<Table, ParseError> {
    Ok(toml::from_str::<Table>(content)?)
}

fn extract_project(project: &Table, targets: &mut Vec<Target>) {
    if let Some(dependencies) = project.get("dependencies").and_then(Value::as_array) {
        extract_requirements(dependencies, Dialect::ProjectList, targets);
    }

    if let Some(groups) = project
        .get("optional-dependencies")
        .and_then(Value::as_table)
    {
        for requirements in groups.values().filter_map(Value::as_array) {
            extract_requirements(requirements, Dialect::ProjectOptionalGroup, targets);
        }
    }
}

fn extract_poetry(poetry: &Table, targets: &mut Vec<Target>) {
    if let Some(dependencies) = poetry.get("dependencies").and_then(Value::as_table) {
        extract_keyed(dependencies, Dialect::PoetryDependency, targets);
    }

    if let Some(groups) = poetry.get("group").and_then(Value::as_table) {
        for dependencies in groups.values().filter_map(|group| {
            group
                .as_table()
                .and_then(|g| g.get("dependencies"))
                .and_then(Value::as_table)
        }) {
            extract_keyed(dependencies, Dialect::PoetryGroup, targets);
        }
    }
}

/// Each string element is a full PEP 508 requirement
fn extract_requirements(requirements: &[Value], dialect: Dialect, targets: &mut Vec<Target>) {
    targets.extend(
        requirements
            .iter()
            .filter_map(Value::as_str)
            .map(|requirement| Target::requirement(requirement, dialect)),
    );
}

/// `name = "spec"` or `name = { version = "spec", ... }`
fn extract_keyed(dependencies: &Table, dialect: Dialect, targets: &mut Vec<Target>) {
    for (name, value) in dependencies {
        if name == PYTHON_PSEUDO_DEPENDENCY {
            continue;
        }

        let version = match value {
            Value::String(version) => Some(version.as_str()),
            Value::Table(table) => table.get("version").and_then(Value::as_str),
            _ => None,
        };

        match version {
            Some(version) if !version.is_empty() => {
                targets.push(Target::new(name.as_str(), version, dialect));
            }
            _ => debug!("Skipping {} without a version", name),
        }
    }
}
