use thiserror::Error;

/// Error type for the structural pass
#[derive(Debug, Error)]
pub enum ParseError {
    /// The manifest is not a valid TOML document
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}
