//! Project manifest
//!
//! One JSON file per project names the schema declaration file and the
//! CSV file backing each table. Relative paths resolve against the
//! manifest's own directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::errors::{CliError, CliResult};
use super::io;

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Schema declaration file (JSON).
    pub schema: PathBuf,
    pub tables: Vec<TableEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableEntry {
    /// Declared table name in the schema.
    pub name: String,
    /// CSV file holding this table's rows.
    pub file: PathBuf,
    /// Leading header/description rows to skip.
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
    /// Explicit column index set; defaults to the table's contiguous
    /// leading columns. Used when a wider sheet interleaves several
    /// tables' columns.
    #[serde(default)]
    pub columns: Option<Vec<usize>>,
}

fn default_skip_rows() -> usize {
    1
}

impl Manifest {
    pub fn load(path: &Path) -> CliResult<Manifest> {
        let text = io::read_text(path)?;
        serde_json::from_str(&text).map_err(|e| CliError::Manifest {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tablec.json");
        fs::write(
            &path,
            r#"{
                "schema": "schema.json",
                "tables": [{"name": "item", "file": "item.csv"}]
            }"#,
        )
        .unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.tables[0].skip_rows, 1);
        assert!(manifest.tables[0].columns.is_none());
    }

    #[test]
    fn test_malformed_manifest_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tablec.json");
        fs::write(&path, "{").unwrap();
        let err = Manifest::load(&path).unwrap_err();
        assert_eq!(err.code(), "TABLEC_MANIFEST");
    }
}
