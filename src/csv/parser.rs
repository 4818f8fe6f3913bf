//! Character-driven CSV state machine.

/// One parsed source row.
///
/// `Blank` marks a row whose fields were all empty (separator lines,
/// spacing rows). Table construction skips these without miscounting
/// real data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Blank,
    Data(Vec<String>),
}

impl Row {
    pub fn is_blank(&self) -> bool {
        matches!(self, Row::Blank)
    }

    /// Fields of a data row; a blank row has none.
    pub fn fields(&self) -> &[String] {
        match self {
            Row::Blank => &[],
            Row::Data(fields) => fields,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// At the start of a field
    Start,
    /// Inside an unquoted field
    Unquoted,
    /// Inside a quoted field
    Quoted,
    /// Just consumed a quote inside a quoted field (closing or escape)
    QuoteInQuoted,
    /// Just consumed a carriage return
    Cr,
}

const QUOTE: char = '"';
const CR: char = '\r';
const LF: char = '\n';

/// Parse raw table text into rows of comma-separated fields.
///
/// Rows terminate on CRLF only. A CR not followed by LF is literal
/// content, preserving round-trip fidelity for embedded CRs.
pub fn parse(source: &str) -> Vec<Row> {
    let sep = ',';
    let mut rows = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = State::Start;

    for c in source.chars() {
        match state {
            State::Start => {
                if c == sep {
                    fields.push(String::new());
                } else if c == QUOTE {
                    field.clear();
                    state = State::Quoted;
                } else if c == CR {
                    field.clear();
                    state = State::Cr;
                } else {
                    field.clear();
                    field.push(c);
                    state = State::Unquoted;
                }
            }
            State::Unquoted => {
                if c == sep {
                    push_field(&mut fields, &mut field);
                    state = State::Start;
                } else if c == CR {
                    state = State::Cr;
                } else {
                    field.push(c);
                }
            }
            State::Quoted => {
                if c == QUOTE {
                    state = State::QuoteInQuoted;
                } else {
                    field.push(c);
                }
            }
            State::QuoteInQuoted => {
                if c == sep {
                    push_field(&mut fields, &mut field);
                    state = State::Start;
                } else if c == QUOTE {
                    field.push(QUOTE);
                    state = State::Quoted;
                } else if c == CR {
                    state = State::Cr;
                } else {
                    // Stray quote after a closing quote: drop it and
                    // continue as unquoted content. Common in hand-edited
                    // exports; rejecting would refuse otherwise-usable data.
                    field.push(c);
                    state = State::Unquoted;
                }
            }
            State::Cr => {
                if c == sep {
                    field.push(CR);
                    push_field(&mut fields, &mut field);
                    state = State::Start;
                } else if c == LF {
                    push_field(&mut fields, &mut field);
                    push_row(&mut rows, &mut fields);
                    state = State::Start;
                } else {
                    field.push(CR);
                    field.push(c);
                    state = State::Unquoted;
                }
            }
        }
    }

    match state {
        State::Start => {
            if !fields.is_empty() {
                fields.push(String::new());
                push_row(&mut rows, &mut fields);
            }
        }
        State::Cr => {
            field.push(CR);
            push_field(&mut fields, &mut field);
            push_row(&mut rows, &mut fields);
        }
        _ => {
            push_field(&mut fields, &mut field);
            push_row(&mut rows, &mut fields);
        }
    }

    rows
}

/// Split a packed cell into sub-fields with the same quoting grammar.
///
/// Used for compressed records and single-column lists. There is no row
/// structure inside a cell, so CR and LF are ordinary content here.
pub fn parse_packed(source: &str, sep: char) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = State::Start;

    for c in source.chars() {
        match state {
            State::Start => {
                if c == sep {
                    fields.push(String::new());
                } else if c == QUOTE {
                    field.clear();
                    state = State::Quoted;
                } else {
                    field.clear();
                    field.push(c);
                    state = State::Unquoted;
                }
            }
            State::Unquoted => {
                if c == sep {
                    push_field(&mut fields, &mut field);
                    state = State::Start;
                } else {
                    field.push(c);
                }
            }
            State::Quoted => {
                if c == QUOTE {
                    state = State::QuoteInQuoted;
                } else {
                    field.push(c);
                }
            }
            State::QuoteInQuoted => {
                if c == sep {
                    push_field(&mut fields, &mut field);
                    state = State::Start;
                } else if c == QUOTE {
                    field.push(QUOTE);
                    state = State::Quoted;
                } else {
                    field.push(c);
                    state = State::Unquoted;
                }
            }
            State::Cr => unreachable!("packed grammar never enters Cr"),
        }
    }

    match state {
        State::Start => {
            if !fields.is_empty() {
                fields.push(String::new());
            }
        }
        _ => push_field(&mut fields, &mut field),
    }

    fields
}

fn push_field(fields: &mut Vec<String>, field: &mut String) {
    fields.push(std::mem::take(field));
}

fn push_row(rows: &mut Vec<Row>, fields: &mut Vec<String>) {
    let fields = std::mem::take(fields);
    if fields.iter().all(|f| f.is_empty()) {
        rows.push(Row::Blank);
    } else {
        rows.push(Row::Data(fields));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(row: &Row) -> &[String] {
        assert!(!row.is_blank(), "expected a data row");
        row.fields()
    }

    #[test]
    fn test_simple_row() {
        let rows = parse("a,b,\"c,d\"\r\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(data(&rows[0]), &["a", "b", "c,d"]);
    }

    #[test]
    fn test_empty_source_yields_no_rows() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_all_empty_fields_is_blank_marker() {
        let rows = parse(",,\r\n");
        assert_eq!(rows, vec![Row::Blank]);
    }

    #[test]
    fn test_blank_line_is_blank_marker() {
        let rows = parse("a,b\r\n\r\nc,d\r\n");
        assert_eq!(rows.len(), 3);
        assert!(!rows[0].is_blank());
        assert!(rows[1].is_blank());
        assert_eq!(data(&rows[2]), &["c", "d"]);
    }

    #[test]
    fn test_escaped_quote() {
        let rows = parse("\"he said \"\"hi\"\"\",x\r\n");
        assert_eq!(data(&rows[0]), &["he said \"hi\"", "x"]);
    }

    #[test]
    fn test_quoted_field_keeps_newlines() {
        let rows = parse("\"line1\r\nline2\",b\r\n");
        assert_eq!(data(&rows[0]), &["line1\r\nline2", "b"]);
    }

    #[test]
    fn test_stray_quote_recovery() {
        // "ab"c -> the stray context drops the quote pair's tail and
        // continues unquoted
        let rows = parse("\"ab\"c,d\r\n");
        assert_eq!(data(&rows[0]), &["abc", "d"]);
    }

    #[test]
    fn test_lone_cr_is_content() {
        let rows = parse("a\rb,c\r\n");
        assert_eq!(data(&rows[0]), &["a\rb", "c"]);
    }

    #[test]
    fn test_cr_before_separator_is_content() {
        let rows = parse("a\r,b\r\n");
        assert_eq!(data(&rows[0]), &["a\r", "b"]);
    }

    #[test]
    fn test_trailing_row_without_crlf() {
        let rows = parse("a,b");
        assert_eq!(rows.len(), 1);
        assert_eq!(data(&rows[0]), &["a", "b"]);
    }

    #[test]
    fn test_trailing_comma_materializes_empty_field() {
        let rows = parse("a,");
        assert_eq!(data(&rows[0]), &["a", ""]);
    }

    #[test]
    fn test_trailing_cr_is_literal() {
        let rows = parse("a\r");
        assert_eq!(data(&rows[0]), &["a\r"]);
    }

    #[test]
    fn test_lone_lf_is_content() {
        // Only CRLF terminates a row
        let rows = parse("a\nb,c\r\n");
        assert_eq!(data(&rows[0]), &["a\nb", "c"]);
    }

    #[test]
    fn test_packed_simple() {
        assert_eq!(parse_packed("1;2;3", ';'), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_packed_empty_is_no_fields() {
        assert!(parse_packed("", ';').is_empty());
    }

    #[test]
    fn test_packed_trailing_separator() {
        assert_eq!(parse_packed("1;", ';'), vec!["1", ""]);
    }

    #[test]
    fn test_packed_quoted_separator() {
        assert_eq!(parse_packed("\"a;b\";c", ';'), vec!["a;b", "c"]);
    }

    #[test]
    fn test_packed_newline_is_content() {
        assert_eq!(parse_packed("a\r\nb;c", ';'), vec!["a\r\nb", "c"]);
    }
}
