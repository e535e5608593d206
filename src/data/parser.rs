use std::collections::BTreeMap;
use std::io::Read;

use thiserror::Error;

use super::model::{CellValue, Row};

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// Header shape expected of one input file.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    /// Human-readable file label used in error messages.
    pub label: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

pub const METABOLITE_INFO: TableSchema = TableSchema {
    label: "metabolite info",
    required: &["metabolite_id", "name"],
    optional: &["subclass"],
};

pub const CORRELATIONS: TableSchema = TableSchema {
    label: "correlations",
    required: &["metabolite_1", "metabolite_2"],
    optional: &[],
};

pub const GWAS: TableSchema = TableSchema {
    label: "GWAS data",
    required: &["metabolite_id", "snp", "position", "lod"],
    optional: &[],
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structural failure of a whole file. No rows are returned alongside it.
#[derive(Debug, Error)]
pub enum MalformedInputError {
    #[error("{file}: malformed line(s) {}", join_lines(lines))]
    Rows { file: String, lines: Vec<u64> },

    #[error("{file}: missing required column(s) {}", columns.join(", "))]
    MissingColumns { file: String, columns: Vec<String> },

    #[error("{file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

fn join_lines(lines: &[u64]) -> String {
    lines
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// A parsed file: header plus one [`Row`] per non-blank data line.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// Parse comma-separated text with a header row against `schema`.
///
/// Every data line must have exactly as many fields as the header, and every
/// quoted field must be closed and followed by a delimiter or line end. All
/// offending lines are collected before failing so the error names each one.
pub fn parse_table<R: Read>(
    file: &str,
    schema: &TableSchema,
    mut input: R,
) -> Result<Table, MalformedInputError> {
    let mut content = Vec::new();
    input
        .read_to_end(&mut content)
        .map_err(|source| MalformedInputError::Io {
            file: file.to_string(),
            source,
        })?;
    let mut quote_errors = unbalanced_quote_lines(&content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_slice());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|h| h.to_string()).collect(),
        Err(e) => return Err(structural_error(file, e)),
    };

    let missing: Vec<String> = schema
        .required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(MalformedInputError::MissingColumns {
            file: file.to_string(),
            columns: missing,
        });
    }

    let mut rows = Vec::new();
    let mut bad_lines = Vec::new();
    let mut record = csv::StringRecord::new();

    loop {
        match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                let line = record.position().map_or(0, |p| p.line());
                if let Some(i) = quote_errors.iter().position(|l| *l == line) {
                    quote_errors.remove(i);
                    log::warn!("{file}: line {line} has an unbalanced quote");
                    bad_lines.push(line);
                    continue;
                }
                if is_blank(&record) {
                    continue;
                }
                if record.len() != headers.len() {
                    log::warn!(
                        "{file}: line {line} has {} field(s), header has {}",
                        record.len(),
                        headers.len()
                    );
                    bad_lines.push(line);
                    continue;
                }
                let fields: BTreeMap<String, CellValue> = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.clone(), CellValue::infer(v)))
                    .collect();
                rows.push(Row { line, fields });
            }
            Err(e) => {
                if let csv::ErrorKind::Io(_) = e.kind() {
                    return Err(structural_error(file, e));
                }
                let line = e.position().map_or(0, |p| p.line());
                log::warn!("{file}: line {line}: {e}");
                bad_lines.push(line);
            }
        }
    }

    // Quote errors the record loop never reached, e.g. in the header.
    for line in quote_errors {
        log::warn!("{file}: line {line} has an unbalanced quote");
        bad_lines.push(line);
    }

    if !bad_lines.is_empty() {
        bad_lines.sort_unstable();
        bad_lines.dedup();
        return Err(MalformedInputError::Rows {
            file: file.to_string(),
            lines: bad_lines,
        });
    }

    Ok(Table { headers, rows })
}

#[derive(Clone, Copy, PartialEq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    /// Just past a quote inside a quoted field: either a closing quote or
    /// the first half of an escaped `""`.
    Closed,
}

/// Start lines of records with a quoted field that is never closed, or that
/// is followed by anything other than a delimiter or line end.
///
/// A quote inside an unquoted field is literal text.
fn unbalanced_quote_lines(content: &[u8]) -> Vec<u64> {
    let mut bad = Vec::new();
    let mut state = QuoteState::FieldStart;
    let mut line: u64 = 1;
    let mut record_line: u64 = 1;
    let flag = |bad: &mut Vec<u64>, at: u64| {
        if bad.last() != Some(&at) {
            bad.push(at);
        }
    };

    for &byte in content {
        if byte == b'\n' {
            line += 1;
        }
        state = match (state, byte) {
            (QuoteState::Quoted, b'"') => QuoteState::Closed,
            (QuoteState::Quoted, _) => QuoteState::Quoted,
            (QuoteState::FieldStart, b'"') => QuoteState::Quoted,
            (QuoteState::Closed, b'"') => QuoteState::Quoted,
            (QuoteState::Closed, b'\r') => QuoteState::Closed,
            (_, b',') => QuoteState::FieldStart,
            (_, b'\n') => {
                record_line = line;
                QuoteState::FieldStart
            }
            (QuoteState::Closed, _) => {
                flag(&mut bad, record_line);
                QuoteState::Unquoted
            }
            (_, _) => QuoteState::Unquoted,
        };
    }
    if state == QuoteState::Quoted {
        flag(&mut bad, record_line);
    }
    bad
}

/// A line holding nothing but whitespace.
fn is_blank(record: &csv::StringRecord) -> bool {
    record.len() == 1 && record[0].trim().is_empty()
}

fn structural_error(file: &str, e: csv::Error) -> MalformedInputError {
    let line = e.position().map(|p| p.line());
    match e.into_kind() {
        csv::ErrorKind::Io(source) => MalformedInputError::Io {
            file: file.to_string(),
            source,
        },
        _ => MalformedInputError::Rows {
            file: file.to_string(),
            lines: vec![line.unwrap_or(1)],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(schema: &TableSchema, text: &str) -> Result<Table, MalformedInputError> {
        parse_table("test.csv", schema, text.as_bytes())
    }

    #[test]
    fn test_fields_addressed_by_header() {
        let table = parse(&GWAS, "lod,position,snp,metabolite_id\n4.5,5000,rs100,M1\n").unwrap();
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.text("metabolite_id").as_deref(), Some("M1"));
        assert_eq!(row.number("position"), Some(5000.0));
        assert_eq!(row.number("lod"), Some(4.5));
        assert_eq!(row.line, 2);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let text = "metabolite_1,metabolite_2\nM1,M2\n\n   \nM2,M3\n";
        let table = parse(&CORRELATIONS, text).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].line, 5);
    }

    #[test]
    fn test_column_count_mismatch_fails_file() {
        let text = "metabolite_id,name,subclass\nM1,Alpha,Lipid\nM2,Beta\nM3,Gamma,Amino,extra\n";
        match parse(&METABOLITE_INFO, text) {
            Err(MalformedInputError::Rows { lines, .. }) => assert_eq!(lines, vec![3, 4]),
            other => panic!("expected malformed rows, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_column() {
        let err = parse(&GWAS, "metabolite_id,snp,position\nM1,rs1,10\n").unwrap_err();
        match err {
            MalformedInputError::MissingColumns { columns, .. } => {
                assert_eq!(columns, vec!["lod".to_string()])
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn test_optional_column_may_be_absent() {
        let table = parse(&METABOLITE_INFO, "metabolite_id,name\nM1,Alpha\n").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert!(table.rows[0].get("subclass").is_none());
    }

    #[test]
    fn test_quoted_fields() {
        let text = "metabolite_id,name,subclass\nM1,\"Acid, alpha\",Lipid\n";
        let table = parse(&METABOLITE_INFO, text).unwrap();
        assert_eq!(table.rows[0].text("name").as_deref(), Some("Acid, alpha"));
    }

    #[test]
    fn test_escaped_quotes_and_crlf_accepted() {
        let text = "metabolite_id,name,subclass\r\nM1,\"the \"\"alpha\"\" acid\",\"Lipid\"\r\nM2,Beta\"s,Amino\r\n";
        let table = parse(&METABOLITE_INFO, text).unwrap();
        assert_eq!(table.rows[0].text("name").as_deref(), Some("the \"alpha\" acid"));
        assert_eq!(table.rows[0].text("subclass").as_deref(), Some("Lipid"));
        assert_eq!(table.rows[1].text("name").as_deref(), Some("Beta\"s"));
    }

    #[test]
    fn test_unterminated_quote_fails_file() {
        let text = "metabolite_1,metabolite_2\nM1,\"M2\nM3,M4\n";
        match parse(&CORRELATIONS, text) {
            Err(MalformedInputError::Rows { lines, .. }) => assert_eq!(lines, vec![2]),
            other => panic!("expected malformed rows, got {other:?}"),
        }
    }

    #[test]
    fn test_stray_quote_fails_file() {
        let text = "metabolite_1,metabolite_2\nM1,\"M2\"x\nM3,M4\nM5,\"M6\" \n";
        match parse(&CORRELATIONS, text) {
            Err(MalformedInputError::Rows { lines, .. }) => assert_eq!(lines, vec![2, 4]),
            other => panic!("expected malformed rows, got {other:?}"),
        }
    }

    #[test]
    fn test_quoted_newline_keeps_record_line() {
        let text = "metabolite_id,name,subclass\nM1,\"two\nlines\",Lipid\nM2,Beta,\"Amino\"x\n";
        match parse(&METABOLITE_INFO, text) {
            Err(MalformedInputError::Rows { lines, .. }) => assert_eq!(lines, vec![4]),
            other => panic!("expected malformed rows, got {other:?}"),
        }
    }

    #[test]
    fn test_error_message_names_lines() {
        let err = parse(&CORRELATIONS, "metabolite_1,metabolite_2\nM1\nM2\n").unwrap_err();
        assert_eq!(err.to_string(), "test.csv: malformed line(s) 2, 3");
    }
}
