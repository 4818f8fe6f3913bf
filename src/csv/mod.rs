//! CSV tokenizer for tablec
//!
//! Converts raw table text into rows of string fields via a character
//! state machine, independent of the type system. Policy points:
//!
//! - RFC4180 quoting; an embedded quote is escaped as `""`
//! - A row whose fields are all empty becomes a blank-row marker,
//!   distinguishable from a row of present-but-empty fields
//! - Rows terminate on CRLF only; a lone CR or LF is field content
//! - A stray quote after a closing quote is dropped and scanning
//!   continues unquoted
//!
//! The same grammar, parameterized by separator, splits packed cells
//! (compressed records, single-column lists) into sub-fields.

mod cell;
mod parser;
mod scalar;

pub use cell::Cell;
pub use parser::{parse, parse_packed, Row};
pub use scalar::{parse_bool, parse_float, parse_int, parse_long, ScalarError};
