//! Observability for tablec
//!
//! A compilation run emits one structured log line per pipeline stage.
//! Logs are synchronous, unbuffered, and deterministically ordered so
//! that two identical runs produce byte-identical output.

mod logger;

pub use logger::{Logger, Severity};
