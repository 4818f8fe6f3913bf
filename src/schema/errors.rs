//! Schema error types
//!
//! Raised while building and resolving the type graph. Every error names
//! the declaring type and, where applicable, the offending identifier,
//! so a bad declaration can be located without re-running the pipeline.

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised during type-graph construction and resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Declaration set could not be read at all
    #[error("malformed schema declarations: {detail}")]
    Malformed { detail: String },

    /// Two record/table declarations share a name
    #[error("duplicate type name '{name}'")]
    DuplicateType { name: String },

    /// Two fields of one record share a name
    #[error("duplicate field '{field}' on '{owner}'")]
    DuplicateField { owner: String, field: String },

    /// A field's type descriptor does not follow the descriptor grammar
    #[error("malformed type descriptor '{descriptor}' (field '{field}' of '{owner}')")]
    MalformedDescriptor {
        owner: String,
        field: String,
        descriptor: String,
    },

    /// A named type does not exist
    #[error("type '{type_name}' not found (field '{field}' of '{owner}')")]
    TypeNotFound {
        owner: String,
        field: String,
        type_name: String,
    },

    /// A reference names a table that does not exist
    #[error("reference target table '{table}' not found (declared on '{owner}')")]
    TargetNotFound { owner: String, table: String },

    /// A reference or key declaration names a column that does not exist
    #[error("key column '{column}' not found on '{table}'")]
    KeyNotFound { table: String, column: String },

    /// Reference target columns match neither the primary key nor a
    /// declared unique key of the target table
    #[error("columns [{columns}] are not a primary or unique key of '{table}'")]
    KeyMismatch { table: String, columns: String },

    /// An illegal constraint combination on a field
    #[error("invalid constraint on field '{field}' of '{owner}': {reason}")]
    InvalidConstraint {
        owner: String,
        field: String,
        reason: String,
    },

    /// An illegal table-level declaration
    #[error("invalid table '{table}': {reason}")]
    InvalidTable { table: String, reason: String },

    /// A record reaches itself through nested fields
    #[error("recursive record nesting through '{name}'")]
    RecursiveRecord { name: String },
}

impl SchemaError {
    /// Stable string code for logs and tooling.
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::Malformed { .. } => "TABLEC_SCHEMA_MALFORMED",
            SchemaError::DuplicateType { .. } => "TABLEC_DUPLICATE_TYPE",
            SchemaError::DuplicateField { .. } => "TABLEC_DUPLICATE_FIELD",
            SchemaError::MalformedDescriptor { .. } => "TABLEC_MALFORMED_DESCRIPTOR",
            SchemaError::TypeNotFound { .. } => "TABLEC_TYPE_NOT_FOUND",
            SchemaError::TargetNotFound { .. } => "TABLEC_TARGET_NOT_FOUND",
            SchemaError::KeyNotFound { .. } => "TABLEC_KEY_NOT_FOUND",
            SchemaError::KeyMismatch { .. } => "TABLEC_KEY_MISMATCH",
            SchemaError::InvalidConstraint { .. } => "TABLEC_INVALID_CONSTRAINT",
            SchemaError::InvalidTable { .. } => "TABLEC_INVALID_TABLE",
            SchemaError::RecursiveRecord { .. } => "TABLEC_RECURSIVE_RECORD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let err = SchemaError::TypeNotFound {
            owner: "item".into(),
            field: "kind".into(),
            type_name: "Kind".into(),
        };
        assert_eq!(err.code(), "TABLEC_TYPE_NOT_FOUND");
        assert!(err.to_string().contains("Kind"));
        assert!(err.to_string().contains("item"));
    }

    #[test]
    fn test_key_errors_name_the_column() {
        let err = SchemaError::KeyNotFound {
            table: "npc".into(),
            column: "npcId".into(),
        };
        assert!(err.to_string().contains("npcId"));
        assert_eq!(err.code(), "TABLEC_KEY_NOT_FOUND");
    }
}
