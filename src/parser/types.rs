//! Common types for the pyproject.toml parser

use serde::Serialize;

/// Manifest sub-schema a dependency was declared under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// PEP 621 `[project].dependencies = ["requests==2.31.0"]`
    ProjectList,
    /// PEP 621 `[project.optional-dependencies]` groups of requirement strings
    ProjectOptionalGroup,
    /// Poetry `[tool.poetry.dependencies]` key/value table
    PoetryDependency,
    /// Poetry `[tool.poetry.group.<name>.dependencies]` key/value tables
    PoetryGroup,
}

impl Dialect {
    /// Returns the string representation of the dialect
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::ProjectList => "project",
            Dialect::ProjectOptionalGroup => "project-optional",
            Dialect::PoetryDependency => "poetry",
            Dialect::PoetryGroup => "poetry-group",
        }
    }

    /// List dialects declare full requirement strings inside arrays
    pub fn is_list(&self) -> bool {
        matches!(self, Dialect::ProjectList | Dialect::ProjectOptionalGroup)
    }

    /// Table path this dialect is declared under
    pub fn section_prefix(&self) -> &'static str {
        match self {
            Dialect::ProjectList => "project",
            Dialect::ProjectOptionalGroup => "project.optional-dependencies",
            Dialect::PoetryDependency => "tool.poetry.dependencies",
            Dialect::PoetryGroup => "tool.poetry.group",
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(Dialect::ProjectList),
            "project-optional" => Ok(Dialect::ProjectOptionalGroup),
            "poetry" => Ok(Dialect::PoetryDependency),
            "poetry-group" => Ok(Dialect::PoetryGroup),
            _ => Err(()),
        }
    }
}

/// Returns true when the path or URI points at a pyproject.toml manifest
pub fn is_pyproject(uri: &str) -> bool {
    uri == "pyproject.toml" || uri.ends_with("/pyproject.toml") || uri.ends_with("\\pyproject.toml")
}

/// A dependency found by the structural pass, not yet positioned in the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Package name, or the full requirement string for list dialects
    pub name: String,
    /// Raw specifier, or the full requirement string for list dialects
    pub version_spec: String,
    pub dialect: Dialect,
}

impl Target {
    pub fn new(name: impl Into<String>, version_spec: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            name: name.into(),
            version_spec: version_spec.into(),
            dialect,
        }
    }

    /// Target for a list dialect, where name and spec are the whole requirement string
    pub fn requirement(requirement: &str, dialect: Dialect) -> Self {
        Self::new(requirement, requirement, dialect)
    }
}

/// A dependency declaration resolved to its position in the manifest text
///
/// Columns are character offsets into the physical line and spans are half-open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatedDeclaration {
    /// Package name (e.g., "requests")
    pub name: String,
    /// Version specifier as written (e.g., "==2.31.0", "^2.31.0", ">=2.0")
    pub version_spec: String,
    /// Line number (0-indexed)
    pub line: usize,
    pub name_start_col: usize,
    pub name_end_col: usize,
    pub spec_start_col: usize,
    pub spec_end_col: usize,
    pub dialect: Dialect,
}

impl LocatedDeclaration {
    /// Whether the given position falls anywhere between the name start and the spec end
    pub fn contains(&self, line: usize, column: usize) -> bool {
        self.line == line && column >= self.name_start_col && column <= self.spec_end_col
    }
}
