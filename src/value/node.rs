//! Typed value nodes
//!
//! A value node mirrors its type node's shape one-to-one and owns
//! exactly the cells its type's column span covers; container values own
//! children decoded from disjoint contiguous sub-slices. Cross-table
//! reference checks are lookups, never ownership edges.

use std::collections::HashSet;

use crate::csv::{self, Cell};
use crate::schema::{FieldType, RecordHandle, TypeGraph, TypeKind};

use super::errors::{ValueError, ValueResult};
use super::visit::ValueVisitor;

/// A decoded boolean cell.
#[derive(Debug, Clone, PartialEq)]
pub struct VBool {
    pub value: bool,
    pub cell: Cell,
}

/// A decoded 32-bit integer cell.
#[derive(Debug, Clone, PartialEq)]
pub struct VInt {
    pub value: i32,
    pub cell: Cell,
}

/// A decoded 64-bit integer cell.
#[derive(Debug, Clone, PartialEq)]
pub struct VLong {
    pub value: i64,
    pub cell: Cell,
}

/// A decoded float cell.
#[derive(Debug, Clone, PartialEq)]
pub struct VFloat {
    pub value: f32,
    pub cell: Cell,
}

/// A decoded string cell (kept verbatim, no trimming).
#[derive(Debug, Clone, PartialEq)]
pub struct VStr {
    pub value: String,
    pub cell: Cell,
}

/// A decoded list; entirely blank element slots are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct VList {
    pub values: Vec<Value>,
    /// First cell of the list's range, for diagnostics.
    pub cell: Cell,
}

/// A decoded map; blank-keyed entries are dropped, duplicate keys rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct VMap {
    pub entries: Vec<(Value, Value)>,
    pub cell: Cell,
}

/// A decoded record; fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct VRecord {
    pub record: RecordHandle,
    /// The record type's name, exposed to visitors as the value's
    /// discriminator.
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
    pub cell: Cell,
}

impl VRecord {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// The discriminator name exposed before the field values.
    pub fn discriminator(&self) -> &str {
        &self.type_name
    }
}

/// Hashable projection of a value, used for key sets and reference
/// membership. Floats have no projection; resolution keeps them out of
/// key and reference positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Bool(bool),
    Int(i32),
    Long(i64),
    Str(String),
    Tuple(Vec<Key>),
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Bool(v) => write!(f, "{}", v),
            Key::Int(v) => write!(f, "{}", v),
            Key::Long(v) => write!(f, "{}", v),
            Key::Str(v) => write!(f, "{}", v),
            Key::Tuple(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", part)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A typed value node; one variant per type variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(VBool),
    Int(VInt),
    Long(VLong),
    Float(VFloat),
    Str(VStr),
    List(VList),
    Map(VMap),
    Record(VRecord),
}

impl Value {
    /// Decode a flat cell slice into a value of the given type. The
    /// slice length must equal the type's column span.
    pub fn decode(
        ft: &FieldType,
        graph: &TypeGraph,
        table: &str,
        cells: &[Cell],
    ) -> ValueResult<Value> {
        let expected = ft.column_span(graph);
        if cells.len() != expected {
            return Err(ValueError::CellCountMismatch {
                table: table.to_string(),
                row: cells.first().map_or(0, |c| c.row),
                expected,
                got: cells.len(),
            });
        }

        match &ft.kind {
            TypeKind::Bool => {
                let cell = cells[0].clone();
                let value = csv::parse_bool(&cell.text)
                    .map_err(|e| scalar_error(table, &cell, e))?;
                Ok(Value::Bool(VBool { value, cell }))
            }
            TypeKind::Int => {
                let cell = cells[0].clone();
                let value = csv::parse_int(&cell.text)
                    .map_err(|e| scalar_error(table, &cell, e))?;
                Ok(Value::Int(VInt { value, cell }))
            }
            TypeKind::Long => {
                let cell = cells[0].clone();
                let value = csv::parse_long(&cell.text)
                    .map_err(|e| scalar_error(table, &cell, e))?;
                Ok(Value::Long(VLong { value, cell }))
            }
            TypeKind::Float => {
                let cell = cells[0].clone();
                let value = csv::parse_float(&cell.text)
                    .map_err(|e| scalar_error(table, &cell, e))?;
                Ok(Value::Float(VFloat { value, cell }))
            }
            TypeKind::Str => {
                let cell = cells[0].clone();
                Ok(Value::Str(VStr {
                    value: cell.text.clone(),
                    cell,
                }))
            }
            TypeKind::List {
                elem,
                count,
                separator,
            } => {
                if *count == 0 {
                    decode_packed_list(elem, *separator, graph, table, &cells[0])
                } else {
                    decode_fixed_list(elem, graph, table, cells)
                }
            }
            TypeKind::Map { key, value, count } => {
                decode_map(key, value, *count, graph, table, cells)
            }
            TypeKind::Record(handle) => {
                Ok(Value::Record(Self::decode_record(graph, table, *handle, cells)?))
            }
        }
    }

    /// Decode a record value. Handles the compressed single-cell
    /// encoding; a blank compressed cell decodes as all-blank fields.
    pub fn decode_record(
        graph: &TypeGraph,
        table: &str,
        handle: RecordHandle,
        cells: &[Cell],
    ) -> ValueResult<VRecord> {
        let record = graph.record(handle);
        let span = record.fields_span(graph);

        let owned;
        let flat: &[Cell] = if let Some(sep) = record.compress {
            if cells.len() != 1 {
                return Err(ValueError::CellCountMismatch {
                    table: table.to_string(),
                    row: cells.first().map_or(0, |c| c.row),
                    expected: 1,
                    got: cells.len(),
                });
            }
            let cell = &cells[0];
            let parts = if cell.is_blank() {
                vec![String::new(); span]
            } else {
                csv::parse_packed(&cell.text, sep)
            };
            if parts.len() != span {
                return Err(ValueError::MalformedPacked {
                    table: table.to_string(),
                    row: cell.row,
                    col: cell.col,
                    detail: format!("decoded {} sub-fields, expected {}", parts.len(), span),
                });
            }
            owned = parts
                .into_iter()
                .map(|text| Cell::new(cell.row, cell.col, text))
                .collect::<Vec<_>>();
            &owned
        } else {
            if cells.len() != span {
                return Err(ValueError::CellCountMismatch {
                    table: table.to_string(),
                    row: cells.first().map_or(0, |c| c.row),
                    expected: span,
                    got: cells.len(),
                });
            }
            cells
        };

        let mut fields = Vec::with_capacity(record.fields.len());
        let mut offset = 0;
        for (name, ft) in &record.fields {
            let width = ft.column_span(graph);
            let value = Value::decode(ft, graph, table, &flat[offset..offset + width])?;
            fields.push((name.clone(), value));
            offset += width;
        }

        Ok(VRecord {
            record: handle,
            type_name: record.name.clone(),
            fields,
            cell: cells[0].clone(),
        })
    }

    /// The value's representative cell, for diagnostics.
    pub fn cell(&self) -> &Cell {
        match self {
            Value::Bool(v) => &v.cell,
            Value::Int(v) => &v.cell,
            Value::Long(v) => &v.cell,
            Value::Float(v) => &v.cell,
            Value::Str(v) => &v.cell,
            Value::List(v) => &v.cell,
            Value::Map(v) => &v.cell,
            Value::Record(v) => &v.cell,
        }
    }

    /// True when every cell under this value is blank. A blank value
    /// satisfies a nullable reference.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Bool(v) => v.cell.is_blank(),
            Value::Int(v) => v.cell.is_blank(),
            Value::Long(v) => v.cell.is_blank(),
            Value::Float(v) => v.cell.is_blank(),
            Value::Str(v) => v.cell.is_blank(),
            Value::List(v) => v.values.iter().all(Value::is_blank),
            Value::Map(v) => v.entries.is_empty(),
            Value::Record(v) => v.fields.iter().all(|(_, f)| f.is_blank()),
        }
    }

    /// Hashable key projection; `None` for floats and containers.
    pub fn key(&self) -> Option<Key> {
        match self {
            Value::Bool(v) => Some(Key::Bool(v.value)),
            Value::Int(v) => Some(Key::Int(v.value)),
            Value::Long(v) => Some(Key::Long(v.value)),
            Value::Str(v) => Some(Key::Str(v.value.clone())),
            Value::Float(_) | Value::List(_) | Value::Map(_) | Value::Record(_) => None,
        }
    }

    /// Dispatch to the visitor method matching this variant. Visitors
    /// recurse into containers themselves.
    pub fn accept(&self, visitor: &mut dyn ValueVisitor) {
        match self {
            Value::Bool(v) => visitor.visit_bool(v),
            Value::Int(v) => visitor.visit_int(v),
            Value::Long(v) => visitor.visit_long(v),
            Value::Float(v) => visitor.visit_float(v),
            Value::Str(v) => visitor.visit_str(v),
            Value::List(v) => visitor.visit_list(v),
            Value::Map(v) => visitor.visit_map(v),
            Value::Record(v) => visitor.visit_record(v),
        }
    }
}

fn scalar_error(table: &str, cell: &Cell, e: csv::ScalarError) -> ValueError {
    ValueError::Scalar {
        table: table.to_string(),
        row: cell.row,
        col: cell.col,
        expected: e.expected,
        text: e.text,
    }
}

fn decode_packed_list(
    elem: &FieldType,
    separator: char,
    graph: &TypeGraph,
    table: &str,
    cell: &Cell,
) -> ValueResult<Value> {
    let elem_span = elem.column_span(graph);
    let parts = if cell.is_blank() {
        Vec::new()
    } else {
        csv::parse_packed(&cell.text, separator)
    };
    if parts.len() % elem_span != 0 {
        return Err(ValueError::MalformedPacked {
            table: table.to_string(),
            row: cell.row,
            col: cell.col,
            detail: format!(
                "decoded {} sub-fields, expected a multiple of {}",
                parts.len(),
                elem_span
            ),
        });
    }
    let sub_cells: Vec<Cell> = parts
        .into_iter()
        .map(|text| Cell::new(cell.row, cell.col, text))
        .collect();
    let mut values = Vec::new();
    for chunk in sub_cells.chunks(elem_span) {
        if chunk.iter().all(Cell::is_blank) {
            continue;
        }
        values.push(Value::decode(elem, graph, table, chunk)?);
    }
    Ok(Value::List(VList {
        values,
        cell: cell.clone(),
    }))
}

fn decode_fixed_list(
    elem: &FieldType,
    graph: &TypeGraph,
    table: &str,
    cells: &[Cell],
) -> ValueResult<Value> {
    let elem_span = elem.column_span(graph);
    let mut values = Vec::new();
    for chunk in cells.chunks(elem_span) {
        // Unused trailing slots are left blank in the sheet.
        if chunk.iter().all(Cell::is_blank) {
            continue;
        }
        values.push(Value::decode(elem, graph, table, chunk)?);
    }
    Ok(Value::List(VList {
        values,
        cell: cells[0].clone(),
    }))
}

fn decode_map(
    key: &FieldType,
    value: &FieldType,
    count: usize,
    graph: &TypeGraph,
    table: &str,
    cells: &[Cell],
) -> ValueResult<Value> {
    let key_span = key.column_span(graph);
    let entry_span = key_span + value.column_span(graph);
    debug_assert_eq!(cells.len(), entry_span * count);

    let mut entries = Vec::new();
    let mut seen: HashSet<Key> = HashSet::new();
    for chunk in cells.chunks(entry_span) {
        let key_cells = &chunk[..key_span];
        if key_cells.iter().all(Cell::is_blank) {
            continue;
        }
        let key_value = Value::decode(key, graph, table, key_cells)?;
        let entry_value = Value::decode(value, graph, table, &chunk[key_span..])?;
        let projected = key_value
            .key()
            .ok_or_else(|| ValueError::internal("map key is not keyable"))?;
        if !seen.insert(projected.clone()) {
            return Err(ValueError::DuplicateMapKey {
                table: table.to_string(),
                row: chunk[0].row,
                col: chunk[0].col,
                key: projected.to_string(),
            });
        }
        entries.push((key_value, entry_value));
    }
    Ok(Value::Map(VMap {
        entries,
        cell: cells[0].clone(),
    }))
}
