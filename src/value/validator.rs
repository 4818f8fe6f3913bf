//! Constraint validator
//!
//! Read-only walk over the finished database, in table then row order.
//! Per record: each field's direct reference constraint first, then
//! recursion into nested composites, then the record's composite-key
//! references. Sequential-primary-key enum tables are checked per
//! table. Runs only after every table's value tree exists; references
//! may be cross-table and forward-declared.

use crate::schema::{CompositeRef, FieldType, RecordType, RefDecl, TableType, TypeGraph, TypeKind};

use super::database::Database;
use super::errors::{ValueError, ValueResult};
use super::node::{Key, VRecord, Value};
use super::table::{KeySet, TableValue};

/// Verify every constraint of the database against the graph. Reports
/// the first violation with table/row/column context.
pub fn verify(graph: &TypeGraph, db: &Database) -> ValueResult<()> {
    for table_value in db.tables() {
        let table = graph
            .table_by_name(table_value.name())
            .ok_or_else(|| ValueError::internal("table value without a table type"))?;
        let record = graph.record(table.record);
        for vrec in table_value.rows() {
            verify_record(graph, db, &table.name, vrec, record)?;
        }
        if let Some(meta) = &table.enum_meta {
            if meta.sequential {
                verify_sequence(table_value)?;
            }
        }
    }
    Ok(())
}

fn verify_record(
    graph: &TypeGraph,
    db: &Database,
    table: &str,
    vrec: &VRecord,
    record: &RecordType,
) -> ValueResult<()> {
    for ((_, ft), (_, value)) in record.fields.iter().zip(vrec.fields.iter()) {
        verify_value(graph, db, table, value, ft)?;
    }
    for group in &record.composite_refs {
        verify_composite_ref(graph, db, table, vrec, group)?;
    }
    Ok(())
}

fn verify_value(
    graph: &TypeGraph,
    db: &Database,
    table: &str,
    value: &Value,
    ft: &FieldType,
) -> ValueResult<()> {
    for rd in &ft.constraint.refs {
        verify_ref(graph, db, table, value, rd)?;
    }
    if let Some((lo, hi)) = ft.constraint.range {
        verify_range(table, value, lo, hi)?;
    }
    match (&ft.kind, value) {
        (TypeKind::List { elem, .. }, Value::List(list)) => {
            for element in &list.values {
                verify_value(graph, db, table, element, elem)?;
            }
        }
        (TypeKind::Map { key, value: vt, .. }, Value::Map(map)) => {
            for (entry_key, entry_value) in &map.entries {
                verify_value(graph, db, table, entry_key, key)?;
                verify_value(graph, db, table, entry_value, vt)?;
            }
        }
        (TypeKind::Record(handle), Value::Record(nested)) => {
            verify_record(graph, db, table, nested, graph.record(*handle))?;
        }
        _ => {}
    }
    Ok(())
}

/// A blank value needs a nullable reference; a present value must be a
/// member of the target's selected key set.
fn verify_ref(
    graph: &TypeGraph,
    db: &Database,
    table: &str,
    value: &Value,
    rd: &RefDecl,
) -> ValueResult<()> {
    let cell = value.cell();
    if value.is_blank() {
        if !rd.nullable {
            return Err(ValueError::NullReference {
                table: table.to_string(),
                row: cell.row,
                col: cell.col,
                target: rd.table.clone(),
            });
        }
        return Ok(());
    }
    let key = value
        .key()
        .ok_or_else(|| ValueError::internal("reference on a non-keyable value"))?;
    let set = target_key_set(graph, db, &rd.table, rd.key.as_deref())?;
    if !set.contains(&key) {
        return Err(ValueError::DanglingReference {
            table: table.to_string(),
            row: cell.row,
            col: cell.col,
            value: key.to_string(),
            target: rd.table.clone(),
        });
    }
    Ok(())
}

fn verify_range(table: &str, value: &Value, lo: i64, hi: i64) -> ValueResult<()> {
    let (number, cell) = match value {
        Value::Int(v) => (i64::from(v.value), &v.cell),
        Value::Long(v) => (v.value, &v.cell),
        _ => return Ok(()),
    };
    // A blank optional cell parses to zero; only present values are
    // range-checked.
    if cell.is_blank() {
        return Ok(());
    }
    if number < lo || number > hi {
        return Err(ValueError::RangeViolation {
            table: table.to_string(),
            row: cell.row,
            col: cell.col,
            value: number,
            lo,
            hi,
        });
    }
    Ok(())
}

/// Evaluated after all per-field checks: build the ordered tuple from
/// the named local fields and look it up in the target's key set.
fn verify_composite_ref(
    graph: &TypeGraph,
    db: &Database,
    table: &str,
    vrec: &VRecord,
    group: &CompositeRef,
) -> ValueResult<()> {
    let mut values = Vec::with_capacity(group.keys.len());
    for column in &group.keys {
        let value = vrec.field(column).ok_or_else(|| {
            ValueError::internal(format!("composite reference column '{}' missing", column))
        })?;
        values.push(value);
    }

    if values.iter().all(|v| v.is_blank()) {
        if !group.nullable {
            return Err(ValueError::NullReference {
                table: table.to_string(),
                row: vrec.cell.row,
                col: vrec.cell.col,
                target: group.table.clone(),
            });
        }
        return Ok(());
    }

    let mut parts = Vec::with_capacity(values.len());
    for value in &values {
        parts.push(
            value
                .key()
                .ok_or_else(|| ValueError::internal("composite reference on non-keyable value"))?,
        );
    }
    let key = if parts.len() == 1 {
        parts.pop().unwrap_or(Key::Int(0))
    } else {
        Key::Tuple(parts)
    };

    let target = graph
        .table_by_name(&group.table)
        .ok_or_else(|| ValueError::internal("composite reference to unresolved table"))?;
    let target_value = db
        .table(&group.table)
        .ok_or_else(|| ValueError::internal("composite reference to unloaded table"))?;
    let set = if group.target_keys.is_empty() || group.target_keys == target.primary_key {
        target_value.primary_keys()
    } else {
        let group_name = TableType::unique_key_name(&group.target_keys);
        target_value
            .unique_key(&group_name)
            .ok_or_else(|| ValueError::internal("composite reference to unresolved key group"))?
    };
    if !set.contains(&key) {
        return Err(ValueError::DanglingReference {
            table: table.to_string(),
            row: vrec.cell.row,
            col: vrec.cell.col,
            value: key.to_string(),
            target: group.table.clone(),
        });
    }
    Ok(())
}

fn target_key_set<'a>(
    graph: &TypeGraph,
    db: &'a Database,
    target: &str,
    key_column: Option<&str>,
) -> ValueResult<&'a KeySet> {
    let table = graph
        .table_by_name(target)
        .ok_or_else(|| ValueError::internal("reference to unresolved table"))?;
    let value = db
        .table(target)
        .ok_or_else(|| ValueError::internal("reference to unloaded table"))?;
    match key_column {
        None => Ok(value.primary_keys()),
        Some(column) => {
            if table.primary_key.len() == 1 && table.primary_key[0] == column {
                Ok(value.primary_keys())
            } else {
                value
                    .unique_key(column)
                    .ok_or_else(|| ValueError::internal("reference to unresolved key group"))
            }
        }
    }
}

/// The ordered primary-key set of a sequential table must read 1,2,3,...
fn verify_sequence(table_value: &TableValue) -> ValueResult<()> {
    for (i, key) in table_value.primary_keys().iter().enumerate() {
        let expected = i + 1;
        let matches = matches!(key, Key::Int(v) if *v == expected as i32);
        if !matches {
            return Err(ValueError::NonSequentialPrimaryKey {
                table: table_value.name().to_string(),
                expected,
                found: key.to_string(),
            });
        }
    }
    Ok(())
}
