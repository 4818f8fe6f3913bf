//! Pipeline Integrity Tests
//!
//! End-to-end runs through the CLI entry points with on-disk fixtures:
//! - A valid project compiles and reports per-table shapes
//! - The first failing stage aborts the run with its own error code
//! - Encoding problems are caught before parsing begins

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use tablec::cli::{check, CliError};

// =============================================================================
// Helper Functions
// =============================================================================

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

const SCHEMA: &str = r#"{
    "records": [
        {
            "name": "reward",
            "fields": [
                {"name": "itemId", "type": "int", "reference": "item"},
                {"name": "amount", "type": "int", "range": [1, 999]}
            ],
            "compress": true,
            "separator": ";"
        }
    ],
    "tables": [
        {
            "name": "item",
            "fields": [
                {"name": "id", "type": "int"},
                {"name": "title", "type": "string"}
            ],
            "primary_key": ["id"]
        },
        {
            "name": "quest",
            "fields": [
                {"name": "id", "type": "int"},
                {"name": "reward", "type": "reward"},
                {"name": "next", "type": "int", "reference": "quest", "nullable": true}
            ],
            "primary_key": ["id"]
        }
    ]
}"#;

const MANIFEST: &str = r#"{
    "schema": "schema.json",
    "tables": [
        {"name": "item", "file": "item.csv"},
        {"name": "quest", "file": "quest.csv"}
    ]
}"#;

fn write_project(dir: &TempDir, item_csv: &str, quest_csv: &str) -> PathBuf {
    write_file(dir.path(), "schema.json", SCHEMA);
    write_file(dir.path(), "item.csv", item_csv);
    write_file(dir.path(), "quest.csv", quest_csv);
    write_file(dir.path(), "tablec.json", MANIFEST)
}

// =============================================================================
// Successful Run Tests
// =============================================================================

#[test]
fn test_valid_project_compiles() {
    let dir = TempDir::new().unwrap();
    let manifest = write_project(
        &dir,
        "id,title\r\n1,sword\r\n2,axe\r\n",
        "id,reward,next\r\n1,\"1;10\",2\r\n2,\"2;5\",\r\n",
    );
    let report = check(&manifest).unwrap();
    assert_eq!(report.tables.len(), 2);
    let quest = report.tables.iter().find(|t| t.name == "quest").unwrap();
    assert_eq!(quest.rows, 2);
}

#[test]
fn test_header_rows_are_skipped() {
    let dir = TempDir::new().unwrap();
    let manifest = write_project(
        &dir,
        // Header cells would not parse as ints if counted as data.
        "id,title\r\n1,sword\r\n",
        "id,reward,next\r\n1,\"1;10\",\r\n",
    );
    assert!(check(&manifest).is_ok());
}

#[test]
fn test_utf8_bom_tolerated() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "schema.json", SCHEMA);
    fs::write(
        dir.path().join("item.csv"),
        b"\xEF\xBB\xBFid,title\r\n1,sword\r\n",
    )
    .unwrap();
    write_file(dir.path(), "quest.csv", "id,reward,next\r\n1,\"1;10\",\r\n");
    let manifest = write_file(dir.path(), "tablec.json", MANIFEST);
    assert!(check(&manifest).is_ok());
}

// =============================================================================
// Failing Stage Tests
// =============================================================================

#[test]
fn test_dangling_reference_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let manifest = write_project(
        &dir,
        "id,title\r\n1,sword\r\n",
        "id,reward,next\r\n1,\"9;10\",\r\n",
    );
    let err = check(&manifest).unwrap_err();
    assert_eq!(err.code(), "TABLEC_DANGLING_REFERENCE");
}

#[test]
fn test_range_violation_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let manifest = write_project(
        &dir,
        "id,title\r\n1,sword\r\n",
        "id,reward,next\r\n1,\"1;1000\",\r\n",
    );
    let err = check(&manifest).unwrap_err();
    assert_eq!(err.code(), "TABLEC_RANGE_VIOLATION");
}

#[test]
fn test_unknown_manifest_table_rejected() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "schema.json", SCHEMA);
    write_file(dir.path(), "item.csv", "id,title\r\n1,sword\r\n");
    write_file(dir.path(), "ghost.csv", "id\r\n1\r\n");
    let manifest = write_file(
        dir.path(),
        "tablec.json",
        r#"{
            "schema": "schema.json",
            "tables": [{"name": "ghost", "file": "ghost.csv"}]
        }"#,
    );
    let err = check(&manifest).unwrap_err();
    assert_eq!(err.code(), "TABLEC_UNKNOWN_TABLE");
}

#[test]
fn test_missing_data_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "schema.json", SCHEMA);
    write_file(dir.path(), "quest.csv", "id,reward,next\r\n");
    let manifest = write_file(dir.path(), "tablec.json", MANIFEST);
    let err = check(&manifest).unwrap_err();
    assert!(matches!(err, CliError::Io { .. }));
}

#[test]
fn test_utf16_input_is_encoding_error() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "schema.json", SCHEMA);
    fs::write(dir.path().join("item.csv"), [0xFF, 0xFE, 0x41, 0x00]).unwrap();
    write_file(dir.path(), "quest.csv", "id,reward,next\r\n");
    let manifest = write_file(dir.path(), "tablec.json", MANIFEST);
    let err = check(&manifest).unwrap_err();
    assert_eq!(err.code(), "TABLEC_ENCODING");
}

#[test]
fn test_schema_error_surfaces_unchanged() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "schema.json",
        r#"{
            "tables": [{
                "name": "item",
                "fields": [{"name": "id", "type": "unknowntype"}],
                "primary_key": ["id"]
            }]
        }"#,
    );
    write_file(dir.path(), "item.csv", "id\r\n1\r\n");
    let manifest = write_file(
        dir.path(),
        "tablec.json",
        r#"{
            "schema": "schema.json",
            "tables": [{"name": "item", "file": "item.csv"}]
        }"#,
    );
    let err = check(&manifest).unwrap_err();
    assert_eq!(err.code(), "TABLEC_TYPE_NOT_FOUND");
}
