//! Positional pass over pyproject.toml
//!
//! Re-scans the raw text line by line and maps each [`Target`] from the
//! structural pass onto the line and columns where it is written. This is a
//! line-oriented scan, not a TOML parser: a requirement string that cannot be
//! found is dropped, while a Poetry key whose spec text is missing keeps an
//! empty span at column 0.
//!
//! Positions are recovered with first-occurrence substring search. When a
//! version string also appears inside the package name (`lib2 = "2"`), or a
//! name appears twice on a line, the first occurrence wins.

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use crate::parser::types::{Dialect, LocatedDeclaration, Target};

/// Resolves structural targets to text positions
pub struct PositionResolver {
    /// Regex for table headers: `[tool.poetry.dependencies]`
    section_re: Regex,
    /// Regex splitting a requirement string into name and the rest
    requirement_re: Regex,
}

impl PositionResolver {
    pub fn new() -> Self {
        Self {
            section_re: Regex::new(r"^\[(.+)\]$").unwrap(),
            requirement_re: Regex::new(r"^([a-zA-Z0-9_.-]+)(.*)$").unwrap(),
        }
    }
}

impl Default for PositionResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Section families the scanner dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Project,
    OptionalDependencies,
    PoetryDependencies,
    PoetryGroup,
    Other,
}

impl SectionKind {
    fn of(section: &str) -> Self {
        if section == Dialect::ProjectList.section_prefix() {
            SectionKind::Project
        } else if section.starts_with(Dialect::ProjectOptionalGroup.section_prefix()) {
            SectionKind::OptionalDependencies
        } else if section == Dialect::PoetryDependency.section_prefix() {
            SectionKind::PoetryDependencies
        } else if section.starts_with(Dialect::PoetryGroup.section_prefix()) {
            SectionKind::PoetryGroup
        } else {
            SectionKind::Other
        }
    }

    /// Dialect whose table this section is, used to prefer one of several equal targets
    fn native_dialect(&self) -> Option<Dialect> {
        match self {
            SectionKind::Project => Some(Dialect::ProjectList),
            SectionKind::OptionalDependencies => Some(Dialect::ProjectOptionalGroup),
            SectionKind::PoetryDependencies => Some(Dialect::PoetryDependency),
            SectionKind::PoetryGroup => Some(Dialect::PoetryGroup),
            SectionKind::Other => None,
        }
    }
}

impl PositionResolver {
    /// Resolve every target against the text, in line order
    pub fn resolve(&self, content: &str, targets: &[Target]) -> Vec<LocatedDeclaration> {
        let mut results = Vec::new();
        let mut current_section = String::new();

        for (line_num, line) in content.lines().enumerate() {
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some(caps) = self.section_re.captures(trimmed) {
                current_section = caps[1].to_string();
                continue;
            }

            match SectionKind::of(&current_section) {
                kind @ (SectionKind::Project | SectionKind::OptionalDependencies) => {
                    self.resolve_list_line(line_num, line, trimmed, kind, targets, &mut results);
                }
                kind @ (SectionKind::PoetryDependencies | SectionKind::PoetryGroup) => {
                    Self::resolve_keyed_line(line_num, line, trimmed, kind, targets, &mut results);
                }
                SectionKind::Other => {}
            }
        }

        debug!(
            "Located {} declarations for {} targets",
            results.len(),
            targets.len()
        );
        results
    }

    /// Match quoted requirement strings on a line inside `[project]` or
    /// `[project.optional-dependencies]`
    fn resolve_list_line(
        &self,
        line_num: usize,
        line: &str,
        trimmed: &str,
        kind: SectionKind,
        targets: &[Target],
        results: &mut Vec<LocatedDeclaration>,
    ) {
        let mut seen: HashSet<&str> = HashSet::new();

        for target in prefer_native(targets, kind) {
            let full = target.name.as_str();
            if seen.contains(full) || !contains_quoted(trimmed, full) {
                continue;
            }

            let Some((name, spec)) = self.split_requirement(full) else {
                continue;
            };
            let Some(occurrence) = char_find(line, full) else {
                continue;
            };
            seen.insert(full);

            let name_len = name.chars().count();
            results.push(LocatedDeclaration {
                name: name.to_string(),
                version_spec: spec.to_string(),
                line: line_num,
                name_start_col: occurrence,
                name_end_col: occurrence + name_len,
                spec_start_col: occurrence + name_len,
                spec_end_col: occurrence + full.chars().count(),
                dialect: target.dialect,
            });
        }
    }

    /// Match `name = ...` assignments on a line inside a Poetry dependency table
    fn resolve_keyed_line(
        line_num: usize,
        line: &str,
        trimmed: &str,
        kind: SectionKind,
        targets: &[Target],
        results: &mut Vec<LocatedDeclaration>,
    ) {
        let Some(dialect) = kind.native_dialect() else {
            return;
        };

        let candidates: Vec<&Target> = targets
            .iter()
            .filter(|t| t.dialect == dialect && key_matches(trimmed, &t.name))
            .collect();

        let mut seen: HashSet<&str> = HashSet::new();
        for target in &candidates {
            if seen.contains(target.name.as_str()) {
                continue;
            }

            // Equal names from different groups: take the one whose spec is on this line
            let target = candidates
                .iter()
                .find(|t| t.name == target.name && line.contains(t.version_spec.as_str()))
                .unwrap_or(target);
            seen.insert(target.name.as_str());

            let name_len = target.name.chars().count();
            let spec_len = target.version_spec.chars().count();
            let (name_start_col, name_end_col) = char_find(line, &target.name)
                .map_or((0, 0), |start| (start, start + name_len));
            let (spec_start_col, spec_end_col) = char_find(line, &target.version_spec)
                .map_or((0, 0), |start| (start, start + spec_len));

            results.push(LocatedDeclaration {
                name: target.name.clone(),
                version_spec: target.version_spec.clone(),
                line: line_num,
                name_start_col,
                name_end_col,
                spec_start_col,
                spec_end_col,
                dialect: target.dialect,
            });
        }
    }

    /// Split `requests[socks]>=2.31` into `("requests", "[socks]>=2.31")`
    fn split_requirement<'a>(&self, requirement: &'a str) -> Option<(&'a str, &'a str)> {
        let caps = self.requirement_re.captures(requirement)?;
        Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    }
}

/// List targets, those declared natively under this section first
fn prefer_native(targets: &[Target], kind: SectionKind) -> impl Iterator<Item = &Target> {
    let native = kind.native_dialect();
    let (first, rest): (Vec<&Target>, Vec<&Target>) = targets
        .iter()
        .filter(|t| t.dialect.is_list())
        .partition(|t| Some(t.dialect) == native);
    first.into_iter().chain(rest)
}

fn contains_quoted(line: &str, value: &str) -> bool {
    line.contains(&format!("\"{value}\"")) || line.contains(&format!("'{value}'"))
}

/// Whether the line assigns the key `name`, as in `name = ...`
fn key_matches(line: &str, name: &str) -> bool {
    line.strip_prefix(name)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

/// Character column of the first occurrence of `needle` in `line`
fn char_find(line: &str, needle: &str) -> Option<usize> {
    line.find(needle).map(|byte| line[..byte].chars().count())
}
