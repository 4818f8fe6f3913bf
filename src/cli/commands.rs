//! CLI command dispatch
//!
//! Drives the pipeline in its strict stage order: manifest -> schema
//! declarations -> type graph -> per-table parse -> database load ->
//! validation. One structured log event per stage; the first failing
//! stage aborts the run with nothing emitted.

use std::path::Path;

use crate::csv;
use crate::observability::{Logger, Severity};
use crate::schema::{SchemaDecl, TypeGraph};
use crate::value::{validator, Database, TableData, TableLayout, ValueError};

use super::args::{Cli, Command};
use super::errors::CliResult;
use super::io;
use super::manifest::Manifest;

/// Parse arguments and run the selected command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = match &cli.command {
        Command::Check { manifest } => check(manifest).map(|_| ()),
        Command::Compile { manifest } => compile(manifest),
    };
    if let Err(e) = &result {
        Logger::log_stderr(
            Severity::Error,
            "run_failed",
            &[("code", e.code()), ("error", &e.to_string())],
        );
    }
    result
}

/// Per-table outcome of a successful check.
#[derive(Debug)]
pub struct TableReport {
    pub name: String,
    pub rows: usize,
    pub enum_names: usize,
}

/// Outcome of a successful check: every table parsed, decoded and
/// validated.
#[derive(Debug)]
pub struct CheckReport {
    pub tables: Vec<TableReport>,
}

/// Run the whole pipeline for the given manifest.
pub fn check(manifest_path: &Path) -> CliResult<CheckReport> {
    let manifest = Manifest::load(manifest_path)?;
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let schema_text = io::read_text(&base.join(&manifest.schema))?;
    let decls = SchemaDecl::from_json(&schema_text)?;
    let graph = TypeGraph::build(&decls)?;
    Logger::log(
        Severity::Info,
        "schema_resolved",
        &[("tables", &graph.tables().len().to_string())],
    );

    let mut sources = Vec::with_capacity(manifest.tables.len());
    for entry in &manifest.tables {
        let table = graph
            .table_by_name(&entry.name)
            .ok_or_else(|| ValueError::UnknownTable {
                table: entry.name.clone(),
            })?;
        let text = io::read_text(&base.join(&entry.file))?;
        let mut rows = csv::parse(&text);
        let skip = entry.skip_rows.min(rows.len());
        let data_rows = rows.split_off(skip);
        Logger::log(
            Severity::Info,
            "table_parsed",
            &[
                ("rows", &data_rows.len().to_string()),
                ("table", &entry.name),
            ],
        );

        let layout = match &entry.columns {
            Some(columns) => TableLayout {
                columns: columns.clone(),
                first_row: skip + 1,
            },
            None => {
                let width = graph.record(table.record).fields_span(&graph);
                TableLayout::contiguous(width, skip + 1)
            }
        };
        sources.push(TableData {
            table: entry.name.clone(),
            rows: data_rows,
            layout,
        });
    }

    let db = Database::load(&graph, sources)?;
    validator::verify(&graph, &db)?;
    Logger::log(
        Severity::Info,
        "database_verified",
        &[("tables", &db.tables().len().to_string())],
    );

    Ok(CheckReport {
        tables: db
            .tables()
            .iter()
            .map(|t| TableReport {
                name: t.name().to_string(),
                rows: t.rows().len(),
                enum_names: t.enum_names().len(),
            })
            .collect(),
    })
}

/// Check, then report each table's shape for downstream emitters.
fn compile(manifest_path: &Path) -> CliResult<()> {
    let report = check(manifest_path)?;
    for table in &report.tables {
        Logger::log(
            Severity::Info,
            "table_summary",
            &[
                ("enum_names", &table.enum_names.to_string()),
                ("rows", &table.rows.to_string()),
                ("table", &table.name),
            ],
        );
    }
    Ok(())
}
