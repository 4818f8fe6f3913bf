//! Schema declaration set
//!
//! The declarative input to the type graph, produced by whatever
//! ingested the authoring format (spreadsheet headers, XML, hand-written
//! JSON). tablec consumes it verbatim; nothing here is resolved yet.
//!
//! Type descriptor grammar (per field):
//! - `bool` | `int` | `long` | `float` | `string`
//! - `list,<elem>,<count>` — fixed repetition, `count * span(elem)` columns
//! - `list,<elem>` — packed into one delimited cell
//! - `map,<key>,<value>,<count>`
//! - any other identifier — a declared record's name

use serde::Deserialize;

use super::errors::{SchemaError, SchemaResult};

/// The whole declaration set for one compilation run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDecl {
    #[serde(default)]
    pub records: Vec<RecordDecl>,
    #[serde(default)]
    pub tables: Vec<TableDecl>,
}

impl SchemaDecl {
    /// Parse a declaration set from JSON text.
    pub fn from_json(text: &str) -> SchemaResult<SchemaDecl> {
        serde_json::from_str(text).map_err(|e| SchemaError::Malformed {
            detail: e.to_string(),
        })
    }
}

/// One column (or column group) of a record or table.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    /// Type descriptor string, see module docs.
    #[serde(rename = "type")]
    pub type_desc: String,
    /// Reference target: `"table"` (primary key) or `"table,column"`
    /// (a unique key column). For lists/maps the reference applies to
    /// each element / each entry value.
    #[serde(default)]
    pub reference: Option<String>,
    /// Map-only: reference target for each entry key.
    #[serde(default)]
    pub key_reference: Option<String>,
    /// Whether a blank value satisfies the reference.
    #[serde(default)]
    pub nullable: bool,
    /// Inclusive value range, int/long columns only.
    #[serde(default)]
    pub range: Option<(i64, i64)>,
    /// Separator override for a packed (single-cell) list.
    #[serde(default)]
    pub separator: Option<char>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, type_desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_desc: type_desc.into(),
            reference: None,
            key_reference: None,
            nullable: false,
            range: None,
            separator: None,
        }
    }

    pub fn with_reference(mut self, target: impl Into<String>) -> Self {
        self.reference = Some(target.into());
        self
    }

    pub fn with_key_reference(mut self, target: impl Into<String>) -> Self {
        self.key_reference = Some(target.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_range(mut self, lo: i64, hi: i64) -> Self {
        self.range = Some((lo, hi));
        self
    }

    pub fn with_separator(mut self, sep: char) -> Self {
        self.separator = Some(sep);
        self
    }
}

/// A multi-column reference: a named local column group pointing at a
/// target table's key column group.
#[derive(Debug, Clone, Deserialize)]
pub struct CompositeRefDecl {
    pub name: String,
    /// Local columns, in target-key order.
    pub keys: Vec<String>,
    /// Target table name.
    pub target: String,
    /// Target columns; empty means the target's primary key.
    #[serde(default)]
    pub target_keys: Vec<String>,
    #[serde(default)]
    pub nullable: bool,
}

/// A named record (column group) usable as a field type.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    /// Pack all fields into one delimited cell.
    #[serde(default)]
    pub compress: bool,
    /// Separator for the compressed encoding.
    #[serde(default)]
    pub separator: Option<char>,
    #[serde(default)]
    pub refs: Vec<CompositeRefDecl>,
}

impl RecordDecl {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            fields,
            compress: false,
            separator: None,
            refs: Vec::new(),
        }
    }

    pub fn compressed(mut self, separator: Option<char>) -> Self {
        self.compress = true;
        self.separator = separator;
        self
    }
}

/// A table: a record plus key and enum metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct TableDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub unique_keys: Vec<Vec<String>>,
    /// Discriminator column; rows double as named constants.
    #[serde(default)]
    pub enum_column: Option<String>,
    /// A partial enum may leave some rows unnamed.
    #[serde(default)]
    pub partial_enum: bool,
    /// Primary keys must equal 1..N in row order.
    #[serde(default)]
    pub sequential_primary_key: bool,
    #[serde(default)]
    pub refs: Vec<CompositeRefDecl>,
}

impl TableDecl {
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldDecl>,
        primary_key: Vec<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            fields,
            primary_key: primary_key.into_iter().map(String::from).collect(),
            unique_keys: Vec::new(),
            enum_column: None,
            partial_enum: false,
            sequential_primary_key: false,
            refs: Vec::new(),
        }
    }

    pub fn with_unique_key(mut self, columns: Vec<&str>) -> Self {
        self.unique_keys
            .push(columns.into_iter().map(String::from).collect());
        self
    }

    pub fn with_enum(mut self, column: impl Into<String>) -> Self {
        self.enum_column = Some(column.into());
        self
    }

    pub fn partial(mut self) -> Self {
        self.partial_enum = true;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.sequential_primary_key = true;
        self
    }

    pub fn with_ref(mut self, r: CompositeRefDecl) -> Self {
        self.refs.push(r);
        self
    }
}
