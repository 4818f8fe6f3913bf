//! Per-table value container
//!
//! Owns the ordered record values for one table plus the derived sets
//! computed once at construction: the primary-key set, one set per
//! unique-key group, and for enum tables the name set and name->ordinal
//! map. All duplicate detection happens here, at build time.

use std::collections::{HashMap, HashSet};

use crate::csv::{Cell, Row};
use crate::schema::{TableType, TypeGraph};

use super::errors::{ValueError, ValueResult};
use super::node::{Key, VRecord, Value};

/// Where a table's cells live in its source rows: a (possibly
/// non-contiguous) column index set, and the source row number of the
/// first data row (for diagnostics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub columns: Vec<usize>,
    pub first_row: usize,
}

impl TableLayout {
    /// The common case: the table owns columns `0..width`.
    pub fn contiguous(width: usize, first_row: usize) -> Self {
        Self {
            columns: (0..width).collect(),
            first_row,
        }
    }
}

/// A key set that remembers insertion (row) order; the order is what
/// the sequential-primary-key check walks.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    ordered: Vec<Key>,
    index: HashSet<Key>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// False when the key was already present.
    fn insert(&mut self, key: Key) -> bool {
        if !self.index.insert(key.clone()) {
            return false;
        }
        self.ordered.push(key);
        true
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.index.contains(key)
    }

    /// Keys in row order.
    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.ordered.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// The decoded rows and derived key sets of one table.
#[derive(Debug)]
pub struct TableValue {
    name: String,
    rows: Vec<VRecord>,
    primary_keys: KeySet,
    unique_keys: Vec<(String, KeySet)>,
    enum_names: Vec<String>,
    enum_ordinals: HashMap<String, i32>,
}

impl TableValue {
    /// Build one table's value tree from its parsed rows. Blank-row
    /// markers are skipped without consuming a data row. Key sets are
    /// populated here, failing on the first duplicate.
    pub fn build(
        graph: &TypeGraph,
        table: &TableType,
        rows: &[Row],
        layout: &TableLayout,
    ) -> ValueResult<TableValue> {
        let record = graph.record(table.record);
        let width = record.fields_span(graph);
        if layout.columns.len() != width {
            return Err(ValueError::LayoutMismatch {
                table: table.name.clone(),
                expected: width,
                got: layout.columns.len(),
            });
        }

        let mut decoded: Vec<VRecord> = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let fields = match row {
                Row::Blank => continue,
                Row::Data(fields) => fields,
            };
            let row_number = layout.first_row + i;
            // Rows shorter than the widest column index are padded with
            // blanks; the span check still applies.
            let cells: Vec<Cell> = layout
                .columns
                .iter()
                .map(|&col| {
                    Cell::new(
                        row_number,
                        col,
                        fields.get(col).map(String::as_str).unwrap_or(""),
                    )
                })
                .collect();
            decoded.push(Value::decode_record(graph, &table.name, table.record, &cells)?);
        }

        let mut primary_keys = KeySet::new();
        for vrec in &decoded {
            let key = extract_key(vrec, &table.primary_key)?;
            if !primary_keys.insert(key.clone()) {
                return Err(ValueError::DuplicatePrimaryKey {
                    table: table.name.clone(),
                    row: vrec.cell.row,
                    key: key.to_string(),
                });
            }
        }

        let mut unique_keys = Vec::with_capacity(table.unique_keys.len());
        for group in &table.unique_keys {
            let group_name = TableType::unique_key_name(group);
            let mut set = KeySet::new();
            for vrec in &decoded {
                let key = extract_key(vrec, group)?;
                if !set.insert(key.clone()) {
                    return Err(ValueError::DuplicateUniqueKey {
                        table: table.name.clone(),
                        row: vrec.cell.row,
                        group: group_name,
                        key: key.to_string(),
                    });
                }
            }
            unique_keys.push((group_name, set));
        }

        let mut enum_names = Vec::new();
        let mut enum_ordinals = HashMap::new();
        if let Some(meta) = &table.enum_meta {
            let keyed_by_name = table.keyed_by_enum_name();
            let mut upper: HashSet<String> = HashSet::new();
            for vrec in &decoded {
                let name = enum_name_of(&table.name, vrec, &meta.column)?;
                if name.is_empty() {
                    if !meta.partial {
                        return Err(ValueError::EnumEmpty {
                            table: table.name.clone(),
                            row: vrec.cell.row,
                        });
                    }
                    continue;
                }
                if name.contains(char::is_whitespace) {
                    return Err(ValueError::EnumWhitespace {
                        table: table.name.clone(),
                        row: vrec.cell.row,
                        name,
                    });
                }
                if !upper.insert(name.to_uppercase()) {
                    return Err(ValueError::EnumDuplicate {
                        table: table.name.clone(),
                        row: vrec.cell.row,
                        name,
                    });
                }
                enum_names.push(name.clone());
                let ordinal = if keyed_by_name {
                    enum_names.len() as i32
                } else {
                    row_ordinal(&table.name, vrec, &table.primary_key)?
                };
                enum_ordinals.insert(name, ordinal);
            }
        }

        Ok(TableValue {
            name: table.name.clone(),
            rows: decoded,
            primary_keys,
            unique_keys,
            enum_names,
            enum_ordinals,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record values in row order.
    pub fn rows(&self) -> &[VRecord] {
        &self.rows
    }

    pub fn primary_keys(&self) -> &KeySet {
        &self.primary_keys
    }

    /// The key set of a unique-key group, identified by its joined
    /// column list (e.g. `"group,slot"`).
    pub fn unique_key(&self, group_name: &str) -> Option<&KeySet> {
        self.unique_keys
            .iter()
            .find(|(name, _)| name == group_name)
            .map(|(_, set)| set)
    }

    /// Enum constant names in row order.
    pub fn enum_names(&self) -> &[String] {
        &self.enum_names
    }

    pub fn enum_ordinals(&self) -> &HashMap<String, i32> {
        &self.enum_ordinals
    }
}

/// Ordered key tuple of the named columns; a single column projects to
/// its plain key.
pub(crate) fn extract_key(vrec: &VRecord, columns: &[String]) -> ValueResult<Key> {
    let mut parts = Vec::with_capacity(columns.len());
    for column in columns {
        let value = vrec
            .field(column)
            .ok_or_else(|| ValueError::internal(format!("key column '{}' missing", column)))?;
        let key = value
            .key()
            .ok_or_else(|| ValueError::internal(format!("key column '{}' not keyable", column)))?;
        parts.push(key);
    }
    if parts.len() == 1 {
        Ok(parts.pop().unwrap_or(Key::Int(0)))
    } else {
        Ok(Key::Tuple(parts))
    }
}

fn enum_name_of(table: &str, vrec: &VRecord, column: &str) -> ValueResult<String> {
    match vrec.field(column) {
        Some(Value::Str(s)) => Ok(s.value.clone()),
        _ => Err(ValueError::internal(format!(
            "enum column '{}' of '{}' is not a string column",
            column, table
        ))),
    }
}

/// A non-name-keyed enum row's ordinal is its integer primary key.
fn row_ordinal(table: &str, vrec: &VRecord, primary_key: &[String]) -> ValueResult<i32> {
    let column = primary_key.first().ok_or_else(|| {
        ValueError::internal(format!("enum table '{}' has no primary key", table))
    })?;
    match vrec.field(column) {
        Some(Value::Int(v)) => Ok(v.value),
        _ => Err(ValueError::internal(format!(
            "enum table '{}' primary key '{}' is not an int column",
            table, column
        ))),
    }
}
