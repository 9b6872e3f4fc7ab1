//! Version replacement edits for declared dependencies

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde::Serialize;
use thiserror::Error;

use crate::parser::types::LocatedDeclaration;
use crate::version::semver::{coerce, latest_in_same_major, parse_version};
use crate::version::types::PackageMetadata;

/// Leading run of constraint operator characters
static OPERATOR_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\^~>=<!]+)").unwrap());

/// Version number following the operator of a single constraint
static VERSION_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\w.*+!-]*").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("Line {line} is out of range ({line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("Columns {start}..{end} are out of range for line {line} ({length} characters)")]
    ColumnOutOfRange {
        line: usize,
        start: usize,
        end: usize,
        length: usize,
    },
}

/// Replacement of a character span on a single line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edit {
    pub line: usize,
    pub start_col: usize,
    pub end_col: usize,
    pub replacement: String,
}

/// A titled edit offered for a declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSuggestion {
    pub title: String,
    /// Bare version the declaration would move to
    pub version: String,
    pub edit: Edit,
}

/// Index of declarations grouped by line number for efficient lookup
pub struct DeclarationIndex<'a> {
    by_line: HashMap<usize, Vec<&'a LocatedDeclaration>>,
}

impl<'a> DeclarationIndex<'a> {
    pub fn new(declarations: &'a [LocatedDeclaration]) -> Self {
        let mut by_line: HashMap<usize, Vec<&'a LocatedDeclaration>> = HashMap::new();
        for declaration in declarations {
            by_line.entry(declaration.line).or_default().push(declaration);
        }
        Self { by_line }
    }

    /// Find the declaration whose name or specifier covers the cursor position
    pub fn find_at_position(&self, line: usize, column: usize) -> Option<&'a LocatedDeclaration> {
        self.by_line
            .get(&line)?
            .iter()
            .find(|declaration| declaration.contains(line, column))
            .copied()
    }
}

/// Extract the constraint operator (`==`, `>=`, `^`, `~=`, `!=`, ...) from a specifier
pub fn extract_operator_prefix(version_spec: &str) -> &str {
    OPERATOR_PREFIX_RE
        .find(version_spec)
        .map_or("", |m| m.as_str())
}

/// Byte range of the version number in a specifier carrying extras or markers
///
/// `[async]>=2.0` and `>=300; sys_platform == 'win32'` yield the range of
/// `2.0` and `300`. None when the constraint has several clauses or no number.
fn embedded_version_range(version_spec: &str) -> Option<Range<usize>> {
    let constraint = version_spec
        .split_once(';')
        .map_or(version_spec, |(constraint, _)| constraint);
    if constraint.contains(',') {
        return None;
    }

    let offset = if constraint.starts_with('[') {
        constraint.find(']')? + 1
    } else {
        0
    };
    VERSION_NUMBER_RE
        .find(&constraint[offset..])
        .map(|m| offset + m.start()..offset + m.end())
}

fn is_plain_spec(version_spec: &str) -> bool {
    !version_spec.starts_with('[') && !version_spec.contains([';', ','])
}

/// Edit moving the declaration's specifier to `version`
///
/// A plain specifier is replaced whole, keeping its operator. With extras or
/// markers only the version number is replaced. Multi-clause constraints get
/// no edit.
pub fn replacement_edit(declaration: &LocatedDeclaration, version: &str) -> Option<Edit> {
    let spec = &declaration.version_spec;
    if is_plain_spec(spec) {
        let prefix = extract_operator_prefix(spec);
        return Some(Edit {
            line: declaration.line,
            start_col: declaration.spec_start_col,
            end_col: declaration.spec_end_col,
            replacement: format!("{prefix}{version}"),
        });
    }

    let range = embedded_version_range(spec)?;
    let start_col = declaration.spec_start_col + spec[..range.start].chars().count();
    Some(Edit {
        line: declaration.line,
        start_col,
        end_col: start_col + spec[range].chars().count(),
        replacement: version.to_string(),
    })
}

/// Generate update suggestions for a declaration
///
/// Offers the latest stable version when it is newer than the declared one,
/// and the newest version in the declared major when that differs from it.
/// A declaration without a specifier span gets no suggestions, and neither
/// does one whose constraint cannot be rewritten in place.
pub fn suggest_edits(
    declaration: &LocatedDeclaration,
    metadata: &PackageMetadata,
) -> Vec<EditSuggestion> {
    if declaration.spec_start_col == declaration.spec_end_col {
        return Vec::new();
    }

    let spec = &declaration.version_spec;
    let current_spec = if is_plain_spec(spec) {
        spec.as_str()
    } else {
        match embedded_version_range(spec) {
            Some(range) => &spec[range],
            None => return Vec::new(),
        }
    };

    let current = coerce(current_spec).unwrap_or_else(|| Version::new(0, 0, 0));
    let is_newer = |version: &str| {
        parse_version(version)
            .or_else(|| coerce(version))
            .is_some_and(|v| v > current)
    };

    let latest = &metadata.latest_stable;
    let same_major = latest_in_same_major(&metadata.all_versions, current_spec)
        .filter(|version| version != latest);

    [Some(latest.clone()), same_major]
        .into_iter()
        .flatten()
        .filter(|version| is_newer(version.as_str()))
        .filter_map(|version| {
            let edit = replacement_edit(declaration, &version)?;
            Some(EditSuggestion {
                title: format!("Update to {version}"),
                edit,
                version,
            })
        })
        .collect()
}

/// Apply an edit to the text, replacing exactly the edited character span
///
/// Line endings are left untouched.
pub fn apply_edit(text: &str, edit: &Edit) -> Result<String, EditError> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let Some(target) = lines.get(edit.line) else {
        return Err(EditError::LineOutOfRange {
            line: edit.line,
            line_count: lines.len(),
        });
    };

    let content = target
        .strip_suffix("\r\n")
        .or_else(|| target.strip_suffix('\n'))
        .unwrap_or(target);
    let length = content.chars().count();
    if edit.start_col > edit.end_col || edit.end_col > length {
        return Err(EditError::ColumnOutOfRange {
            line: edit.line,
            start: edit.start_col,
            end: edit.end_col,
            length,
        });
    }

    let byte_at = |col: usize| {
        content
            .char_indices()
            .nth(col)
            .map_or(content.len(), |(i, _)| i)
    };
    let (start, end) = (byte_at(edit.start_col), byte_at(edit.end_col));

    let mut result = String::with_capacity(text.len() + edit.replacement.len());
    for line in &lines[..edit.line] {
        result.push_str(line);
    }
    result.push_str(&target[..start]);
    result.push_str(&edit.replacement);
    result.push_str(&target[end..]);
    for line in &lines[edit.line + 1..] {
        result.push_str(line);
    }
    Ok(result)
}
