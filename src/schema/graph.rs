//! Type graph construction and two-phase resolution
//!
//! Phase 1 interns every declared record and table under its name,
//! assigning stable arena handles without resolving anything; this makes
//! declaration order irrelevant and lets tables reference each other
//! mutually. Phase 2 resolves every field descriptor, reference target
//! and key column against the phase-1 name table (consulted, never
//! mutated) and rejects illegal constraint combinations. The graph is
//! immutable afterwards.

use std::collections::HashMap;

use super::decl::{CompositeRefDecl, FieldDecl, RecordDecl, SchemaDecl, TableDecl};
use super::errors::{SchemaError, SchemaResult};
use super::types::{
    CompositeRef, Constraint, EnumMeta, FieldType, RecordHandle, RecordType, RefDecl, TableHandle,
    TableType, TypeKind, DEFAULT_LIST_SEPARATOR, DEFAULT_RECORD_SEPARATOR,
};

/// The resolved, immutable type graph for one compilation run.
#[derive(Debug)]
pub struct TypeGraph {
    records: Vec<RecordType>,
    tables: Vec<TableType>,
    record_names: HashMap<String, RecordHandle>,
    table_names: HashMap<String, TableHandle>,
}

impl TypeGraph {
    /// Build and resolve the graph from a declaration set.
    pub fn build(decls: &SchemaDecl) -> SchemaResult<TypeGraph> {
        // Phase 1: assign handles. A table's row record shares the
        // record arena, registered under the table's name.
        let mut record_names: HashMap<String, RecordHandle> = HashMap::new();
        let total = decls.records.len() + decls.tables.len();
        for (i, r) in decls.records.iter().enumerate() {
            if record_names.insert(r.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateType {
                    name: r.name.clone(),
                });
            }
        }
        let mut table_names: HashMap<String, TableHandle> = HashMap::new();
        for (j, t) in decls.tables.iter().enumerate() {
            let handle = decls.records.len() + j;
            if record_names.insert(t.name.clone(), handle).is_some() {
                return Err(SchemaError::DuplicateType {
                    name: t.name.clone(),
                });
            }
            table_names.insert(t.name.clone(), j);
        }

        let ctx = ResolveCtx {
            record_names: &record_names,
            table_decls: decls.tables.iter().map(|t| (t.name.as_str(), t)).collect(),
        };

        // Phase 2: resolve every declaration against the name table.
        // Resolution order matches phase-1 handle order, so pushes land
        // at their assigned handles.
        let mut records: Vec<RecordType> = Vec::with_capacity(total);
        for r in &decls.records {
            records.push(resolve_record(r, &ctx)?);
        }
        let mut tables = Vec::with_capacity(decls.tables.len());
        for (j, t) in decls.tables.iter().enumerate() {
            let handle = decls.records.len() + j;
            let record = resolve_table_record(t, &ctx)?;
            let table = resolve_table_meta(t, handle, &record)?;
            records.push(record);
            tables.push(table);
        }

        check_record_cycles(&records)?;

        Ok(TypeGraph {
            records,
            tables,
            record_names,
            table_names,
        })
    }

    pub fn record(&self, handle: RecordHandle) -> &RecordType {
        &self.records[handle]
    }

    pub fn table(&self, handle: TableHandle) -> &TableType {
        &self.tables[handle]
    }

    pub fn tables(&self) -> &[TableType] {
        &self.tables
    }

    pub fn record_by_name(&self, name: &str) -> Option<&RecordType> {
        self.record_names.get(name).map(|&h| &self.records[h])
    }

    pub fn table_by_name(&self, name: &str) -> Option<&TableType> {
        self.table_names.get(name).map(|&h| &self.tables[h])
    }
}

struct ResolveCtx<'a> {
    record_names: &'a HashMap<String, RecordHandle>,
    table_decls: HashMap<&'a str, &'a TableDecl>,
}

fn resolve_record(decl: &RecordDecl, ctx: &ResolveCtx<'_>) -> SchemaResult<RecordType> {
    let fields = resolve_fields(&decl.name, &decl.fields, ctx)?;
    let composite_refs = resolve_composite_refs(&decl.name, &fields, &decl.refs, ctx)?;
    Ok(RecordType {
        name: decl.name.clone(),
        fields,
        compress: decl
            .compress
            .then(|| decl.separator.unwrap_or(DEFAULT_RECORD_SEPARATOR)),
        composite_refs,
    })
}

fn resolve_table_record(decl: &TableDecl, ctx: &ResolveCtx<'_>) -> SchemaResult<RecordType> {
    let fields = resolve_fields(&decl.name, &decl.fields, ctx)?;
    let composite_refs = resolve_composite_refs(&decl.name, &fields, &decl.refs, ctx)?;
    Ok(RecordType {
        name: decl.name.clone(),
        fields,
        compress: None,
        composite_refs,
    })
}

fn resolve_fields(
    owner: &str,
    decls: &[FieldDecl],
    ctx: &ResolveCtx<'_>,
) -> SchemaResult<Vec<(String, FieldType)>> {
    if decls.is_empty() {
        return Err(SchemaError::InvalidTable {
            table: owner.to_string(),
            reason: "declares no fields".to_string(),
        });
    }
    let mut fields: Vec<(String, FieldType)> = Vec::with_capacity(decls.len());
    for fd in decls {
        if fields.iter().any(|(n, _)| n == &fd.name) {
            return Err(SchemaError::DuplicateField {
                owner: owner.to_string(),
                field: fd.name.clone(),
            });
        }
        let ft = resolve_field(owner, fd, ctx)?;
        fields.push((fd.name.clone(), ft));
    }
    Ok(fields)
}

fn resolve_field(owner: &str, fd: &FieldDecl, ctx: &ResolveCtx<'_>) -> SchemaResult<FieldType> {
    let invalid = |reason: &str| SchemaError::InvalidConstraint {
        owner: owner.to_string(),
        field: fd.name.clone(),
        reason: reason.to_string(),
    };

    let value_ref = match &fd.reference {
        Some(spec) => {
            let (table, key) = split_ref_spec(spec);
            let rd = RefDecl {
                table,
                key,
                nullable: fd.nullable,
            };
            validate_ref(owner, &fd.name, &rd, ctx)?;
            Some(rd)
        }
        None => None,
    };
    let key_ref = match &fd.key_reference {
        Some(spec) => {
            let (table, key) = split_ref_spec(spec);
            let rd = RefDecl {
                table,
                key,
                nullable: false,
            };
            validate_ref(owner, &fd.name, &rd, ctx)?;
            Some(rd)
        }
        None => None,
    };

    let parts: Vec<&str> = fd.type_desc.split(',').map(str::trim).collect();
    let malformed = || SchemaError::MalformedDescriptor {
        owner: owner.to_string(),
        field: fd.name.clone(),
        descriptor: fd.type_desc.clone(),
    };

    match parts[0] {
        "list" => {
            if fd.range.is_some() {
                return Err(invalid("list does not support a range constraint"));
            }
            if key_ref.is_some() {
                return Err(invalid("list does not support a key reference"));
            }
            if fd.nullable && value_ref.is_some() {
                return Err(invalid("list does not support a nullable reference"));
            }
            let (elem_name, count) = match parts.as_slice() {
                ["list", elem] => (*elem, 0usize),
                ["list", elem, count] => {
                    let n: usize = count.parse().map_err(|_| malformed())?;
                    if n == 0 {
                        return Err(malformed());
                    }
                    (*elem, n)
                }
                _ => return Err(malformed()),
            };
            // The reference applies to each element.
            let mut elem = resolve_named_type(owner, &fd.name, elem_name, ctx)?;
            if let Some(rd) = value_ref {
                attach_ref(owner, &fd.name, &mut elem, rd)?;
            }
            Ok(FieldType::plain(TypeKind::List {
                elem: Box::new(elem),
                count,
                separator: fd.separator.unwrap_or(DEFAULT_LIST_SEPARATOR),
            }))
        }
        "map" => {
            if fd.range.is_some() {
                return Err(invalid("map does not support a range constraint"));
            }
            if fd.nullable && (value_ref.is_some() || key_ref.is_some()) {
                return Err(invalid("map does not support a nullable reference"));
            }
            let (key_name, value_name, count) = match parts.as_slice() {
                ["map", k, v, count] => {
                    let n: usize = count.parse().map_err(|_| malformed())?;
                    if n == 0 {
                        return Err(malformed());
                    }
                    (*k, *v, n)
                }
                _ => return Err(malformed()),
            };
            // A combined key-ref/value-ref declaration splits into the
            // two synthesized sub-constraints.
            let mut key = resolve_named_type(owner, &fd.name, key_name, ctx)?;
            if !key.kind.is_keyable() {
                return Err(invalid("map key must be a keyable primitive type"));
            }
            if let Some(rd) = key_ref {
                attach_ref(owner, &fd.name, &mut key, rd)?;
            }
            let mut value = resolve_named_type(owner, &fd.name, value_name, ctx)?;
            if let Some(rd) = value_ref {
                attach_ref(owner, &fd.name, &mut value, rd)?;
            }
            Ok(FieldType::plain(TypeKind::Map {
                key: Box::new(key),
                value: Box::new(value),
                count,
            }))
        }
        _ => {
            if parts.len() != 1 {
                return Err(malformed());
            }
            if key_ref.is_some() {
                return Err(invalid("key reference is only valid on a map"));
            }
            let mut ft = resolve_named_type(owner, &fd.name, parts[0], ctx)?;
            if let Some(range) = fd.range {
                match ft.kind {
                    TypeKind::Int | TypeKind::Long => ft.constraint.range = Some(range),
                    _ => {
                        return Err(invalid("range is only valid on int and long columns"));
                    }
                }
            }
            if let Some(rd) = value_ref {
                attach_ref(owner, &fd.name, &mut ft, rd)?;
            }
            Ok(ft)
        }
    }
}

/// Resolve a bare type name: a primitive or a declared record.
fn resolve_named_type(
    owner: &str,
    field: &str,
    name: &str,
    ctx: &ResolveCtx<'_>,
) -> SchemaResult<FieldType> {
    let kind = match name {
        "bool" => TypeKind::Bool,
        "int" => TypeKind::Int,
        "long" => TypeKind::Long,
        "float" => TypeKind::Float,
        "string" => TypeKind::Str,
        _ => match ctx.record_names.get(name) {
            Some(&handle) => TypeKind::Record(handle),
            None => {
                return Err(SchemaError::TypeNotFound {
                    owner: owner.to_string(),
                    field: field.to_string(),
                    type_name: name.to_string(),
                })
            }
        },
    };
    Ok(FieldType::plain(kind))
}

/// Attach a direct reference to a node, enforcing that the carrier is a
/// keyable primitive (floats, records, lists and maps cannot be looked
/// up in a key set).
fn attach_ref(
    owner: &str,
    field: &str,
    ft: &mut FieldType,
    rd: RefDecl,
) -> SchemaResult<()> {
    if !ft.kind.is_keyable() {
        return Err(SchemaError::InvalidConstraint {
            owner: owner.to_string(),
            field: field.to_string(),
            reason: format!("reference not supported on {} column", ft.kind.type_name()),
        });
    }
    ft.constraint.refs.push(rd);
    Ok(())
}

/// `"table"` or `"table,column"`.
fn split_ref_spec(spec: &str) -> (String, Option<String>) {
    match spec.split_once(',') {
        Some((table, key)) => (table.trim().to_string(), Some(key.trim().to_string())),
        None => (spec.trim().to_string(), None),
    }
}

/// Validate a single-column reference against the declaration set: the
/// target table must exist, and the named key column (or the implied
/// primary key) must be a single-column primary or unique key.
fn validate_ref(
    owner: &str,
    field: &str,
    rd: &RefDecl,
    ctx: &ResolveCtx<'_>,
) -> SchemaResult<()> {
    let target = ctx.table_decls.get(rd.table.as_str()).ok_or_else(|| {
        SchemaError::TargetNotFound {
            owner: owner.to_string(),
            table: rd.table.clone(),
        }
    })?;
    match &rd.key {
        None => {
            if target.primary_key.len() != 1 {
                return Err(SchemaError::InvalidConstraint {
                    owner: owner.to_string(),
                    field: field.to_string(),
                    reason: format!(
                        "table '{}' has a composite primary key; use a composite reference",
                        rd.table
                    ),
                });
            }
        }
        Some(column) => {
            if !target.fields.iter().any(|f| &f.name == column) {
                return Err(SchemaError::KeyNotFound {
                    table: rd.table.clone(),
                    column: column.clone(),
                });
            }
            let as_group = std::slice::from_ref(column);
            let is_pk = target.primary_key.as_slice() == as_group;
            let is_unique = target.unique_keys.iter().any(|g| g.as_slice() == as_group);
            if !is_pk && !is_unique {
                return Err(SchemaError::KeyMismatch {
                    table: rd.table.clone(),
                    columns: column.clone(),
                });
            }
        }
    }
    Ok(())
}

fn resolve_composite_refs(
    owner: &str,
    fields: &[(String, FieldType)],
    decls: &[CompositeRefDecl],
    ctx: &ResolveCtx<'_>,
) -> SchemaResult<Vec<CompositeRef>> {
    let mut refs = Vec::with_capacity(decls.len());
    for decl in decls {
        let invalid = |reason: String| SchemaError::InvalidConstraint {
            owner: owner.to_string(),
            field: decl.name.clone(),
            reason,
        };
        if decl.keys.is_empty() {
            return Err(invalid("composite reference needs at least one local column".into()));
        }
        for key in &decl.keys {
            let ft = fields
                .iter()
                .find(|(n, _)| n == key)
                .map(|(_, ft)| ft)
                .ok_or_else(|| SchemaError::KeyNotFound {
                    table: owner.to_string(),
                    column: key.clone(),
                })?;
            if !ft.kind.is_keyable() {
                return Err(invalid(format!(
                    "composite reference column '{}' must be a keyable primitive",
                    key
                )));
            }
        }
        let target = ctx.table_decls.get(decl.target.as_str()).ok_or_else(|| {
            SchemaError::TargetNotFound {
                owner: owner.to_string(),
                table: decl.target.clone(),
            }
        })?;
        if decl.target_keys.is_empty() {
            if decl.keys.len() != target.primary_key.len() {
                return Err(invalid(format!(
                    "local columns count {} does not match '{}' primary key count {}",
                    decl.keys.len(),
                    decl.target,
                    target.primary_key.len()
                )));
            }
        } else {
            for column in &decl.target_keys {
                if !target.fields.iter().any(|f| &f.name == column) {
                    return Err(SchemaError::KeyNotFound {
                        table: decl.target.clone(),
                        column: column.clone(),
                    });
                }
            }
            let is_pk = target.primary_key == decl.target_keys;
            let is_unique = target.unique_keys.iter().any(|g| g == &decl.target_keys);
            if !is_pk && !is_unique {
                return Err(SchemaError::KeyMismatch {
                    table: decl.target.clone(),
                    columns: decl.target_keys.join(","),
                });
            }
            if decl.keys.len() != decl.target_keys.len() {
                return Err(invalid(
                    "local and target column counts do not match".into(),
                ));
            }
        }
        refs.push(CompositeRef {
            name: decl.name.clone(),
            keys: decl.keys.clone(),
            table: decl.target.clone(),
            target_keys: decl.target_keys.clone(),
            nullable: decl.nullable,
        });
    }
    Ok(refs)
}

fn resolve_table_meta(
    decl: &TableDecl,
    record_handle: RecordHandle,
    record: &RecordType,
) -> SchemaResult<TableType> {
    let invalid = |reason: String| SchemaError::InvalidTable {
        table: decl.name.clone(),
        reason,
    };

    if decl.primary_key.is_empty() {
        return Err(invalid("missing primary key".into()));
    }
    for group in std::iter::once(&decl.primary_key).chain(decl.unique_keys.iter()) {
        if group.is_empty() {
            return Err(invalid("empty unique key group".into()));
        }
        for column in group {
            let ft = record.field(column).ok_or_else(|| SchemaError::KeyNotFound {
                table: decl.name.clone(),
                column: column.clone(),
            })?;
            if !ft.kind.is_keyable() {
                return Err(invalid(format!(
                    "key column '{}' must be a keyable primitive",
                    column
                )));
            }
        }
    }

    let enum_meta = match &decl.enum_column {
        Some(column) => {
            let ft = record.field(column).ok_or_else(|| SchemaError::KeyNotFound {
                table: decl.name.clone(),
                column: column.clone(),
            })?;
            if ft.kind != TypeKind::Str {
                return Err(invalid(format!(
                    "enum column '{}' must be a string column",
                    column
                )));
            }
            let keyed_by_name = decl.primary_key.len() == 1 && &decl.primary_key[0] == column;
            if !keyed_by_name {
                // Ordinals come from the row's integer primary key.
                let pk_is_int = decl.primary_key.len() == 1
                    && record.field(&decl.primary_key[0]).map(|ft| &ft.kind) == Some(&TypeKind::Int);
                if !pk_is_int {
                    return Err(invalid(
                        "enum table must be keyed by its name column or a single int primary key"
                            .into(),
                    ));
                }
            }
            if decl.sequential_primary_key && keyed_by_name {
                return Err(invalid(
                    "sequential primary key requires an integer primary key".into(),
                ));
            }
            Some(EnumMeta {
                column: column.clone(),
                partial: decl.partial_enum,
                sequential: decl.sequential_primary_key,
            })
        }
        None => {
            if decl.sequential_primary_key {
                return Err(invalid(
                    "sequential primary key is only valid on an enum table".into(),
                ));
            }
            if decl.partial_enum {
                return Err(invalid("partial enum requires an enum column".into()));
            }
            None
        }
    };

    Ok(TableType {
        name: decl.name.clone(),
        record: record_handle,
        primary_key: decl.primary_key.clone(),
        unique_keys: decl.unique_keys.clone(),
        enum_meta,
    })
}

/// Reject records that reach themselves through nested fields; decoding
/// such a shape would never terminate.
fn check_record_cycles(records: &[RecordType]) -> SchemaResult<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        White,
        Grey,
        Black,
    }

    fn edges(ft: &FieldType, out: &mut Vec<RecordHandle>) {
        match &ft.kind {
            TypeKind::Record(h) => out.push(*h),
            TypeKind::List { elem, .. } => edges(elem, out),
            TypeKind::Map { key, value, .. } => {
                edges(key, out);
                edges(value, out);
            }
            _ => {}
        }
    }

    fn visit(
        h: RecordHandle,
        records: &[RecordType],
        marks: &mut [Mark],
    ) -> Result<(), RecordHandle> {
        match marks[h] {
            Mark::Grey => return Err(h),
            Mark::Black => return Ok(()),
            Mark::White => {}
        }
        marks[h] = Mark::Grey;
        let mut out = Vec::new();
        for (_, ft) in &records[h].fields {
            edges(ft, &mut out);
        }
        for next in out {
            visit(next, records, marks)?;
        }
        marks[h] = Mark::Black;
        Ok(())
    }

    let mut marks = vec![Mark::White; records.len()];
    for h in 0..records.len() {
        if let Err(cycle) = visit(h, records, &mut marks) {
            return Err(SchemaError::RecursiveRecord {
                name: records[cycle].name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::decl::{CompositeRefDecl, FieldDecl, RecordDecl, SchemaDecl, TableDecl};

    fn item_table() -> TableDecl {
        TableDecl::new(
            "item",
            vec![
                FieldDecl::new("id", "int"),
                FieldDecl::new("title", "string"),
            ],
            vec!["id"],
        )
    }

    #[test]
    fn test_register_then_resolve() {
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![item_table()],
        };
        let graph = TypeGraph::build(&decls).unwrap();
        let table = graph.table_by_name("item").unwrap();
        assert_eq!(graph.record(table.record).fields.len(), 2);
    }

    #[test]
    fn test_forward_reference_between_tables() {
        // npc references item, declared after it; order must not matter.
        let npc = TableDecl::new(
            "npc",
            vec![
                FieldDecl::new("id", "int"),
                FieldDecl::new("drop", "int").with_reference("item"),
            ],
            vec!["id"],
        );
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![npc, item_table()],
        };
        assert!(TypeGraph::build(&decls).is_ok());
    }

    #[test]
    fn test_mutual_references() {
        let a = TableDecl::new(
            "a",
            vec![
                FieldDecl::new("id", "int"),
                FieldDecl::new("other", "int").with_reference("b"),
            ],
            vec!["id"],
        );
        let b = TableDecl::new(
            "b",
            vec![
                FieldDecl::new("id", "int"),
                FieldDecl::new("other", "int").with_reference("a"),
            ],
            vec!["id"],
        );
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![a, b],
        };
        assert!(TypeGraph::build(&decls).is_ok());
    }

    #[test]
    fn test_duplicate_type_name_rejected() {
        let decls = SchemaDecl {
            records: vec![RecordDecl::new("item", vec![FieldDecl::new("x", "int")])],
            tables: vec![item_table()],
        };
        let err = TypeGraph::build(&decls).unwrap_err();
        assert_eq!(err.code(), "TABLEC_DUPLICATE_TYPE");
    }

    #[test]
    fn test_unknown_type_named_in_error() {
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![TableDecl::new(
                "item",
                vec![
                    FieldDecl::new("id", "int"),
                    FieldDecl::new("pos", "Position"),
                ],
                vec!["id"],
            )],
        };
        let err = TypeGraph::build(&decls).unwrap_err();
        assert!(matches!(err, SchemaError::TypeNotFound { ref type_name, .. } if type_name == "Position"));
    }

    #[test]
    fn test_unknown_ref_target_rejected() {
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![TableDecl::new(
                "npc",
                vec![
                    FieldDecl::new("id", "int"),
                    FieldDecl::new("drop", "int").with_reference("loot"),
                ],
                vec!["id"],
            )],
        };
        let err = TypeGraph::build(&decls).unwrap_err();
        assert_eq!(err.code(), "TABLEC_TARGET_NOT_FOUND");
    }

    #[test]
    fn test_ref_key_must_be_declared_key() {
        let target = TableDecl::new(
            "item",
            vec![
                FieldDecl::new("id", "int"),
                FieldDecl::new("title", "string"),
            ],
            vec!["id"],
        );
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![
                target,
                TableDecl::new(
                    "npc",
                    vec![
                        FieldDecl::new("id", "int"),
                        FieldDecl::new("drop", "string").with_reference("item,title"),
                    ],
                    vec!["id"],
                ),
            ],
        };
        let err = TypeGraph::build(&decls).unwrap_err();
        assert_eq!(err.code(), "TABLEC_KEY_MISMATCH");
    }

    #[test]
    fn test_float_reference_rejected() {
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![
                item_table(),
                TableDecl::new(
                    "npc",
                    vec![
                        FieldDecl::new("id", "int"),
                        FieldDecl::new("weight", "float").with_reference("item"),
                    ],
                    vec!["id"],
                ),
            ],
        };
        let err = TypeGraph::build(&decls).unwrap_err();
        assert_eq!(err.code(), "TABLEC_INVALID_CONSTRAINT");
    }

    #[test]
    fn test_list_range_rejected() {
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![TableDecl::new(
                "npc",
                vec![
                    FieldDecl::new("id", "int"),
                    FieldDecl::new("levels", "list,int,3").with_range(1, 10),
                ],
                vec!["id"],
            )],
        };
        let err = TypeGraph::build(&decls).unwrap_err();
        assert_eq!(err.code(), "TABLEC_INVALID_CONSTRAINT");
    }

    #[test]
    fn test_list_nullable_ref_rejected() {
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![
                item_table(),
                TableDecl::new(
                    "npc",
                    vec![
                        FieldDecl::new("id", "int"),
                        FieldDecl::new("drops", "list,int,3")
                            .with_reference("item")
                            .nullable(),
                    ],
                    vec!["id"],
                ),
            ],
        };
        let err = TypeGraph::build(&decls).unwrap_err();
        assert_eq!(err.code(), "TABLEC_INVALID_CONSTRAINT");
    }

    #[test]
    fn test_map_ref_splits_into_key_and_value() {
        let skill = TableDecl::new(
            "skill",
            vec![
                FieldDecl::new("id", "int"),
                FieldDecl::new("title", "string"),
            ],
            vec!["id"],
        );
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![
                skill,
                item_table(),
                TableDecl::new(
                    "npc",
                    vec![
                        FieldDecl::new("id", "int"),
                        FieldDecl::new("awards", "map,int,int,2")
                            .with_key_reference("skill")
                            .with_reference("item"),
                    ],
                    vec!["id"],
                ),
            ],
        };
        let graph = TypeGraph::build(&decls).unwrap();
        let npc = graph.table_by_name("npc").unwrap();
        let record = graph.record(npc.record);
        let awards = record.field("awards").unwrap();
        match &awards.kind {
            TypeKind::Map { key, value, .. } => {
                assert_eq!(key.constraint.refs[0].table, "skill");
                assert_eq!(value.constraint.refs[0].table, "item");
            }
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_span_composition() {
        let decls = SchemaDecl {
            records: vec![RecordDecl::new(
                "position",
                vec![FieldDecl::new("x", "int"), FieldDecl::new("y", "int")],
            )],
            tables: vec![TableDecl::new(
                "npc",
                vec![
                    FieldDecl::new("id", "int"),
                    FieldDecl::new("pos", "position"),
                    FieldDecl::new("waypoints", "list,position,3"),
                    FieldDecl::new("awards", "map,int,long,2"),
                    FieldDecl::new("tags", "list,string"),
                ],
                vec!["id"],
            )],
        };
        let graph = TypeGraph::build(&decls).unwrap();
        let npc = graph.table_by_name("npc").unwrap();
        let record = graph.record(npc.record);
        assert_eq!(record.field("id").unwrap().column_span(&graph), 1);
        assert_eq!(record.field("pos").unwrap().column_span(&graph), 2);
        assert_eq!(record.field("waypoints").unwrap().column_span(&graph), 6);
        assert_eq!(record.field("awards").unwrap().column_span(&graph), 4);
        assert_eq!(record.field("tags").unwrap().column_span(&graph), 1);
        // The record's span is the sum of its children's spans.
        assert_eq!(record.fields_span(&graph), 14);
    }

    #[test]
    fn test_compressed_record_span_is_one() {
        let decls = SchemaDecl {
            records: vec![RecordDecl::new(
                "position",
                vec![FieldDecl::new("x", "int"), FieldDecl::new("y", "int")],
            )
            .compressed(Some(';'))],
            tables: vec![TableDecl::new(
                "npc",
                vec![FieldDecl::new("id", "int"), FieldDecl::new("pos", "position")],
                vec!["id"],
            )],
        };
        let graph = TypeGraph::build(&decls).unwrap();
        let npc = graph.table_by_name("npc").unwrap();
        let record = graph.record(npc.record);
        assert_eq!(record.field("pos").unwrap().column_span(&graph), 1);
        let position = graph.record_by_name("position").unwrap();
        assert_eq!(position.fields_span(&graph), 2);
    }

    #[test]
    fn test_recursive_record_rejected() {
        let decls = SchemaDecl {
            records: vec![RecordDecl::new(
                "node",
                vec![FieldDecl::new("child", "node")],
            )],
            tables: vec![],
        };
        let err = TypeGraph::build(&decls).unwrap_err();
        assert_eq!(err.code(), "TABLEC_RECURSIVE_RECORD");
    }

    #[test]
    fn test_composite_ref_checks_both_sides() {
        let target = TableDecl::new(
            "loot",
            vec![
                FieldDecl::new("group", "int"),
                FieldDecl::new("slot", "int"),
                FieldDecl::new("title", "string"),
            ],
            vec!["group", "slot"],
        );
        let ok = TableDecl::new(
            "npc",
            vec![
                FieldDecl::new("id", "int"),
                FieldDecl::new("lootGroup", "int"),
                FieldDecl::new("lootSlot", "int"),
            ],
            vec!["id"],
        )
        .with_ref(CompositeRefDecl {
            name: "loot".into(),
            keys: vec!["lootGroup".into(), "lootSlot".into()],
            target: "loot".into(),
            target_keys: vec![],
            nullable: false,
        });
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![target.clone(), ok],
        };
        assert!(TypeGraph::build(&decls).is_ok());

        let bad = TableDecl::new(
            "npc",
            vec![FieldDecl::new("id", "int"), FieldDecl::new("lootGroup", "int")],
            vec!["id"],
        )
        .with_ref(CompositeRefDecl {
            name: "loot".into(),
            keys: vec!["lootGroup".into(), "missing".into()],
            target: "loot".into(),
            target_keys: vec![],
            nullable: false,
        });
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![target, bad],
        };
        let err = TypeGraph::build(&decls).unwrap_err();
        assert_eq!(err.code(), "TABLEC_KEY_NOT_FOUND");
    }

    #[test]
    fn test_enum_table_requires_string_column() {
        let decls = SchemaDecl {
            records: vec![],
            tables: vec![TableDecl::new(
                "quality",
                vec![FieldDecl::new("id", "int"), FieldDecl::new("name", "int")],
                vec!["id"],
            )
            .with_enum("name")],
        };
        let err = TypeGraph::build(&decls).unwrap_err();
        assert_eq!(err.code(), "TABLEC_INVALID_TABLE");
    }
}
