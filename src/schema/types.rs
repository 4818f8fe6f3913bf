//! Resolved type nodes
//!
//! A closed tagged union over the supported column kinds. Record and
//! table types live in the graph's arena and are addressed by stable
//! integer handles, so mutually recursive table references never form
//! ownership cycles. Every node knows how many flat CSV columns it
//! consumes (`column_span`).

use super::graph::TypeGraph;

/// Arena index of a record type.
pub type RecordHandle = usize;
/// Arena index of a table type.
pub type TableHandle = usize;

/// Separator used by packed lists unless the declaration overrides it.
pub const DEFAULT_LIST_SEPARATOR: char = ';';
/// Separator used by compressed records unless the declaration overrides it.
pub const DEFAULT_RECORD_SEPARATOR: char = ',';

/// The shape of one column or column group.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Bool,
    Int,
    Long,
    Float,
    Str,
    /// `count == 0` packs the list into one delimited cell.
    List {
        elem: Box<FieldType>,
        count: usize,
        separator: char,
    },
    Map {
        key: Box<FieldType>,
        value: Box<FieldType>,
        count: usize,
    },
    Record(RecordHandle),
}

impl TypeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeKind::Bool => "bool",
            TypeKind::Int => "int",
            TypeKind::Long => "long",
            TypeKind::Float => "float",
            TypeKind::Str => "string",
            TypeKind::List { .. } => "list",
            TypeKind::Map { .. } => "map",
            TypeKind::Record(_) => "record",
        }
    }

    /// Whether values of this kind can participate in key sets and
    /// reference lookups. Floats cannot (no usable equality).
    pub fn is_keyable(&self) -> bool {
        matches!(
            self,
            TypeKind::Bool | TypeKind::Int | TypeKind::Long | TypeKind::Str
        )
    }
}

/// A single-column reference declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefDecl {
    /// Target table name.
    pub table: String,
    /// Target key column; `None` means the target's primary key.
    pub key: Option<String>,
    /// A blank local value satisfies a nullable reference.
    pub nullable: bool,
}

/// Constraints attached to one type node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraint {
    pub refs: Vec<RefDecl>,
    /// Inclusive range, int/long only.
    pub range: Option<(i64, i64)>,
}

impl Constraint {
    pub fn with_refs(refs: Vec<RefDecl>) -> Self {
        Self { refs, range: None }
    }
}

/// A resolved column type: shape plus constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldType {
    pub kind: TypeKind,
    pub constraint: Constraint,
}

impl FieldType {
    pub fn plain(kind: TypeKind) -> Self {
        Self {
            kind,
            constraint: Constraint::default(),
        }
    }

    /// Number of flat CSV columns this type consumes.
    ///
    /// primitive = 1; fixed list = `count * span(elem)`; packed list = 1;
    /// map = `(span(key) + span(value)) * count`; record = sum of field
    /// spans, or 1 when compressed.
    pub fn column_span(&self, graph: &TypeGraph) -> usize {
        match &self.kind {
            TypeKind::Bool | TypeKind::Int | TypeKind::Long | TypeKind::Float | TypeKind::Str => 1,
            TypeKind::List { elem, count, .. } => {
                if *count == 0 {
                    1
                } else {
                    elem.column_span(graph) * count
                }
            }
            TypeKind::Map { key, value, count } => {
                (key.column_span(graph) + value.column_span(graph)) * count
            }
            TypeKind::Record(handle) => graph.record(*handle).column_span(graph),
        }
    }
}

/// A resolved multi-column reference group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeRef {
    pub name: String,
    /// Local columns, in target-key order.
    pub keys: Vec<String>,
    pub table: String,
    /// Target columns; empty means the target's primary key.
    pub target_keys: Vec<String>,
    pub nullable: bool,
}

/// A resolved record type: ordered fields, optional compressed encoding,
/// composite reference groups.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    /// Field order is column order and emit order.
    pub fields: Vec<(String, FieldType)>,
    /// Separator of the compressed single-cell encoding, if any.
    pub compress: Option<char>,
    pub composite_refs: Vec<CompositeRef>,
}

impl RecordType {
    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ft)| ft)
    }

    /// Sum of the field spans, ignoring compression. This is the length
    /// a compressed cell must decode to.
    pub fn fields_span(&self, graph: &TypeGraph) -> usize {
        self.fields.iter().map(|(_, ft)| ft.column_span(graph)).sum()
    }

    /// Columns this record consumes where it is embedded.
    pub fn column_span(&self, graph: &TypeGraph) -> usize {
        if self.compress.is_some() {
            1
        } else {
            self.fields_span(graph)
        }
    }
}

/// Enum metadata on a table whose rows double as named constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMeta {
    /// Discriminator column (a string column).
    pub column: String,
    /// A partial enum may leave some rows unnamed.
    pub partial: bool,
    /// Primary keys must equal 1..N in row order.
    pub sequential: bool,
}

/// A resolved table type.
#[derive(Debug, Clone, PartialEq)]
pub struct TableType {
    pub name: String,
    /// The row record, shared arena with nested records.
    pub record: RecordHandle,
    pub primary_key: Vec<String>,
    pub unique_keys: Vec<Vec<String>>,
    pub enum_meta: Option<EnumMeta>,
}

impl TableType {
    /// True when the enum discriminator column is itself the (single)
    /// primary key, i.e. the table is keyed by its constant names.
    pub fn keyed_by_enum_name(&self) -> bool {
        match &self.enum_meta {
            Some(meta) => self.primary_key.len() == 1 && self.primary_key[0] == meta.column,
            None => false,
        }
    }

    /// Joined column list identifying a unique-key group.
    pub fn unique_key_name(columns: &[String]) -> String {
        columns.join(",")
    }
}
