//! Value and constraint error types
//!
//! Raised while decoding raw cells into typed values (format errors) and
//! while validating the finished database (constraint violations). Every
//! variant carries table/row/column context so the offending source cell
//! can be located without re-running the pipeline.

use thiserror::Error;

/// Result type for value operations
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors raised during value construction and validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    // ==================
    // Format errors (value construction)
    // ==================
    /// A cell slice disagrees with its type's column span
    #[error("table '{table}' row {row}: expected {expected} cells, got {got}")]
    CellCountMismatch {
        table: String,
        row: usize,
        expected: usize,
        got: usize,
    },

    /// A packed cell decoded to the wrong number of sub-fields
    #[error("table '{table}' row {row} col {col}: malformed packed cell: {detail}")]
    MalformedPacked {
        table: String,
        row: usize,
        col: usize,
        detail: String,
    },

    /// A cell's text is not a valid scalar of the column's type
    #[error("table '{table}' row {row} col {col}: '{text}' is not a valid {expected}")]
    Scalar {
        table: String,
        row: usize,
        col: usize,
        expected: &'static str,
        text: String,
    },

    /// Two entries of one map value share a key
    #[error("table '{table}' row {row} col {col}: duplicate map key {key}")]
    DuplicateMapKey {
        table: String,
        row: usize,
        col: usize,
        key: String,
    },

    /// The column index set does not cover the table's declared width
    #[error("table '{table}': layout selects {got} columns, schema needs {expected}")]
    LayoutMismatch {
        table: String,
        expected: usize,
        got: usize,
    },

    // ==================
    // Constraint violations (validation)
    // ==================
    /// Two rows share a primary key
    #[error("table '{table}' row {row}: duplicate primary key {key}")]
    DuplicatePrimaryKey {
        table: String,
        row: usize,
        key: String,
    },

    /// Two rows share a unique key group value
    #[error("table '{table}' row {row}: duplicate unique key {key} (group [{group}])")]
    DuplicateUniqueKey {
        table: String,
        row: usize,
        group: String,
        key: String,
    },

    /// A non-nullable reference over an entirely blank value
    #[error("table '{table}' row {row} col {col}: blank value, reference to '{target}' is not nullable")]
    NullReference {
        table: String,
        row: usize,
        col: usize,
        target: String,
    },

    /// A reference value absent from the target table's key set
    #[error("table '{table}' row {row} col {col}: {value} not found in '{target}'")]
    DanglingReference {
        table: String,
        row: usize,
        col: usize,
        value: String,
        target: String,
    },

    /// An int/long value outside its declared range
    #[error("table '{table}' row {row} col {col}: {value} outside range [{lo}, {hi}]")]
    RangeViolation {
        table: String,
        row: usize,
        col: usize,
        value: i64,
        lo: i64,
        hi: i64,
    },

    /// An enum row without a name on a non-partial enum table
    #[error("table '{table}' row {row}: empty enum name on a full enum table")]
    EnumEmpty { table: String, row: usize },

    /// An enum name containing whitespace
    #[error("table '{table}' row {row}: enum name '{name}' contains whitespace")]
    EnumWhitespace {
        table: String,
        row: usize,
        name: String,
    },

    /// Two enum rows whose names collide case-insensitively
    #[error("table '{table}' row {row}: duplicate enum name '{name}'")]
    EnumDuplicate {
        table: String,
        row: usize,
        name: String,
    },

    /// A sequential enum table whose primary keys are not 1..N
    #[error("table '{table}': primary key {found} at position {expected} (sequential table needs 1,2,3,...)")]
    NonSequentialPrimaryKey {
        table: String,
        expected: usize,
        found: String,
    },

    // ==================
    // Source wiring
    // ==================
    /// A data source names a table the schema does not declare
    #[error("data source for unknown table '{table}'")]
    UnknownTable { table: String },

    /// A declared table has no data source
    #[error("no data source for table '{table}'")]
    MissingTable { table: String },

    /// Two data sources name the same table
    #[error("duplicate data source for table '{table}'")]
    DuplicateSource { table: String },

    /// A graph/value shape mismatch that resolution should have made
    /// impossible
    #[error("internal error: {detail}")]
    Internal { detail: String },
}

impl ValueError {
    /// Stable string code for logs and tooling.
    pub fn code(&self) -> &'static str {
        match self {
            ValueError::CellCountMismatch { .. } => "TABLEC_CELL_COUNT_MISMATCH",
            ValueError::MalformedPacked { .. } => "TABLEC_MALFORMED_PACKED",
            ValueError::Scalar { .. } => "TABLEC_INVALID_SCALAR",
            ValueError::DuplicateMapKey { .. } => "TABLEC_DUPLICATE_MAP_KEY",
            ValueError::LayoutMismatch { .. } => "TABLEC_LAYOUT_MISMATCH",
            ValueError::DuplicatePrimaryKey { .. } => "TABLEC_DUPLICATE_PRIMARY_KEY",
            ValueError::DuplicateUniqueKey { .. } => "TABLEC_DUPLICATE_UNIQUE_KEY",
            ValueError::NullReference { .. } => "TABLEC_NULL_REFERENCE",
            ValueError::DanglingReference { .. } => "TABLEC_DANGLING_REFERENCE",
            ValueError::RangeViolation { .. } => "TABLEC_RANGE_VIOLATION",
            ValueError::EnumEmpty { .. } => "TABLEC_ENUM_EMPTY",
            ValueError::EnumWhitespace { .. } => "TABLEC_ENUM_WHITESPACE",
            ValueError::EnumDuplicate { .. } => "TABLEC_ENUM_DUPLICATE",
            ValueError::NonSequentialPrimaryKey { .. } => "TABLEC_NON_SEQUENTIAL_KEY",
            ValueError::UnknownTable { .. } => "TABLEC_UNKNOWN_TABLE",
            ValueError::MissingTable { .. } => "TABLEC_MISSING_TABLE",
            ValueError::DuplicateSource { .. } => "TABLEC_DUPLICATE_SOURCE",
            ValueError::Internal { .. } => "TABLEC_INTERNAL",
        }
    }

    pub(crate) fn internal(detail: impl Into<String>) -> Self {
        ValueError::Internal {
            detail: detail.into(),
        }
    }
}
