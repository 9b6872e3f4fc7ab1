//! Parser layer
//! - types.rs: Common types (Target, LocatedDeclaration, Dialect)
//! - error.rs: Structural parse error
//! - extractor.rs: Structural pass producing targets from the TOML tree
//! - locator.rs: Line scan mapping targets to line/column spans
//! - pyproject_toml.rs: Both passes combined

pub mod error;
pub mod extractor;
pub mod locator;
pub mod pyproject_toml;
pub mod types;

pub use error::ParseError;
pub use extractor::extract_targets;
pub use locator::PositionResolver;
pub use pyproject_toml::PyprojectTomlParser;
pub use types::{Dialect, LocatedDeclaration, Target, is_pyproject};
