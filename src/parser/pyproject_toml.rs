//! pyproject.toml parser for Python dependencies
//!
//! Runs the structural pass ([`extract_targets`]) and then the positional pass
//! ([`PositionResolver`]) over the same text.

use crate::parser::extractor::extract_targets;
use crate::parser::locator::PositionResolver;
use crate::parser::types::{LocatedDeclaration, is_pyproject};

/// Parser for pyproject.toml files
pub struct PyprojectTomlParser {
    resolver: PositionResolver,
}

impl PyprojectTomlParser {
    pub fn new() -> Self {
        Self {
            resolver: PositionResolver::new(),
        }
    }

    /// Check if this parser can handle the given URI
    pub fn can_parse(&self, uri: &str) -> bool {
        is_pyproject(uri)
    }

    /// Locate every supported dependency declaration in the manifest
    ///
    /// Malformed documents and unlocatable entries produce fewer declarations,
    /// never an error.
    pub fn parse(&self, content: &str) -> Vec<LocatedDeclaration> {
        let targets = extract_targets(content);
        if targets.is_empty() {
            return Vec::new();
        }
        self.resolver.resolve(content, &targets)
    }
}

impl Default for PyprojectTomlParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::Dialect;

    #[test]
    fn parse_extracts_project_dependencies() {
        let parser = PyprojectTomlParser::new();
        let content = r#"
[project]
name = "demo"
dependencies = [
    "requests==2.31.0",
    "flask>=2.0"
]
"#;
        let result = parser.parse(content);
        assert_eq!(result.len(), 2);

        let requests = result.iter().find(|d| d.name == "requests").unwrap();
        assert_eq!(requests.version_spec, "==2.31.0");
        assert_eq!(requests.name_start_col, 5);
        assert_eq!(requests.spec_start_col, 13);
        assert_eq!(requests.dialect, Dialect::ProjectList);

        let flask = result.iter().find(|d| d.name == "flask").unwrap();
        assert_eq!(flask.version_spec, ">=2.0");
    }

    #[test]
    fn parse_extracts_poetry_dependencies_without_python() {
        let parser = PyprojectTomlParser::new();
        let content = r#"
[tool.poetry.dependencies]
python = "^3.10"
requests = "^2.31.0"
flask = { version = "3.0.0" }
"#;
        let result = parser.parse(content);
        assert_eq!(result.len(), 2);

        assert_eq!(result[0].name, "requests");
        assert_eq!(result[0].version_spec, "^2.31.0");
        assert_eq!(result[0].line, 3);
        assert_eq!(result[1].name, "flask");
        assert_eq!(result[1].version_spec, "3.0.0");
        assert!(result.iter().all(|d| d.name != "python"));
    }

    #[test]
    fn parse_extracts_poetry_groups() {
        let parser = PyprojectTomlParser::new();
        let content = r#"
[tool.poetry.group.dev.dependencies]
pytest = "^7.0"
black = "23.1.0"
"#;
        let result = parser.parse(content);
        assert_eq!(result.len(), 2);

        let pytest = result.iter().find(|d| d.name == "pytest").unwrap();
        assert_eq!(pytest.version_spec, "^7.0");
        assert_eq!(pytest.dialect, Dialect::PoetryGroup);
    }

    #[test]
    fn parse_extracts_optional_dependencies() {
        let parser = PyprojectTomlParser::new();
        let content = r#"
[project.optional-dependencies]

dev = [
  "pytest==7.4.3",
  "pytest-cov>=4.1.0"
]

docs = [
  "mkdocs==1.5.3"
]
"#;
        let result = parser.parse(content);
        assert_eq!(result.len(), 3);

        let pytest = result.iter().find(|d| d.name == "pytest").unwrap();
        assert_eq!(pytest.version_spec, "==7.4.3");
        assert_eq!(pytest.dialect, Dialect::ProjectOptionalGroup);

        let mkdocs = result.iter().find(|d| d.name == "mkdocs").unwrap();
        assert_eq!(mkdocs.version_spec, "==1.5.3");
        assert_eq!(mkdocs.line, 9);
    }

    #[test]
    fn parse_returns_empty_for_malformed_document() {
        let parser = PyprojectTomlParser::new();
        let content = "[project]\ndependencies = [\"requests==2.31.0\"\n";

        assert!(parser.parse(content).is_empty());
    }

    #[test]
    fn parse_returns_empty_for_no_dependencies() {
        let parser = PyprojectTomlParser::new();
        let content = r#"[project]
name = "my-app"
version = "0.1.0"
"#;
        assert!(parser.parse(content).is_empty());
    }

    #[test]
    fn can_parse_accepts_only_pyproject() {
        let parser = PyprojectTomlParser::new();
        assert!(parser.can_parse("file:///work/app/pyproject.toml"));
        assert!(!parser.can_parse("file:///work/app/Cargo.toml"));
    }
}
