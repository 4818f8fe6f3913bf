//! Type graph subsystem for tablec
//!
//! Declarative model of primitive, composite and table types with
//! cross-table reference constraints, built once per run.
//!
//! # Design Principles
//!
//! - Two-phase resolution: names first, references second
//! - Declaration order independence; mutual table references allowed
//! - Arena of record types addressed by stable handles, no parent links
//! - Illegal constraint combinations rejected at build time, not deferred
//! - Immutable after resolve

mod decl;
mod errors;
mod graph;
mod types;

pub use decl::{CompositeRefDecl, FieldDecl, RecordDecl, SchemaDecl, TableDecl};
pub use errors::{SchemaError, SchemaResult};
pub use graph::TypeGraph;
pub use types::{
    CompositeRef, Constraint, EnumMeta, FieldType, RecordHandle, RecordType, RefDecl, TableHandle,
    TableType, TypeKind, DEFAULT_LIST_SEPARATOR, DEFAULT_RECORD_SEPARATOR,
};
