//! Input reading and text decoding
//!
//! The core consumes already-decoded text; this boundary reads bytes,
//! strips a UTF-8 BOM, and rejects anything it cannot decode. Encoding
//! problems never reach the parser.

use std::fs;
use std::path::Path;

use super::errors::{CliError, CliResult};

/// Read a file as UTF-8 text, tolerating (and stripping) a UTF-8 BOM.
pub fn read_text(path: &Path) -> CliResult<String> {
    let bytes = fs::read(path).map_err(|e| CliError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(CliError::Encoding {
            path: path.display().to_string(),
            reason: "UTF-16 input is not supported; re-export as UTF-8".to_string(),
        });
    }

    let bytes = match bytes.strip_prefix(&[0xEF, 0xBB, 0xBF][..]) {
        Some(rest) => rest.to_vec(),
        None => bytes,
    };

    String::from_utf8(bytes).map_err(|e| CliError::Encoding {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn test_reads_plain_utf8() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.csv", b"id,title\r\n");
        assert_eq!(read_text(&path).unwrap(), "id,title\r\n");
    }

    #[test]
    fn test_strips_utf8_bom() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.csv", b"\xEF\xBB\xBFid\r\n");
        assert_eq!(read_text(&path).unwrap(), "id\r\n");
    }

    #[test]
    fn test_rejects_utf16_bom() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.csv", &[0xFF, 0xFE, 0x41, 0x00]);
        let err = read_text(&path).unwrap_err();
        assert_eq!(err.code(), "TABLEC_ENCODING");
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "a.csv", &[0x61, 0xC3, 0x28]);
        let err = read_text(&path).unwrap_err();
        assert_eq!(err.code(), "TABLEC_ENCODING");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_text(&dir.path().join("missing.csv")).unwrap_err();
        assert_eq!(err.code(), "TABLEC_IO");
    }
}
