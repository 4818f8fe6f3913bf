//! CLI error type
//!
//! Wraps every pipeline stage's error unchanged; encoding and file
//! problems are surfaced here because they happen at the boundary,
//! before the core ever runs.

use thiserror::Error;

use crate::schema::SchemaError;
use crate::value::ValueError;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read at all
    #[error("cannot read '{path}': {reason}")]
    Io { path: String, reason: String },

    /// Input bytes are not decodable text
    #[error("encoding error in '{path}': {reason}")]
    Encoding { path: String, reason: String },

    /// The project manifest is unusable
    #[error("malformed manifest '{path}': {reason}")]
    Manifest { path: String, reason: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl CliError {
    /// Stable string code for logs and tooling.
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Io { .. } => "TABLEC_IO",
            CliError::Encoding { .. } => "TABLEC_ENCODING",
            CliError::Manifest { .. } => "TABLEC_MANIFEST",
            CliError::Schema(e) => e.code(),
            CliError::Value(e) => e.code(),
        }
    }
}
