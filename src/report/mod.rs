//! Reporting layer built on top of located declarations and registry metadata
//!
//! - [`annotation`]: end-of-line annotations with a color class
//! - [`edit`]: update suggestions, span replacement and cursor lookup
//! - [`check`]: the concurrent check pipeline over a whole manifest
//! - [`update`]: rewriting a package's specifiers in manifest text

pub mod annotation;
pub mod check;
pub mod edit;
pub mod update;

pub use annotation::{Annotation, AnnotationColor, AnnotationKind, annotate};
pub use check::{CheckedDeclaration, check_manifest};
pub use edit::{
    DeclarationIndex, Edit, EditError, EditSuggestion, apply_edit, extract_operator_prefix,
    suggest_edits,
};
pub use update::{UpdateError, update_manifest};
