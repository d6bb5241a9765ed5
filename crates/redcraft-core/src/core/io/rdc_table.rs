//! Reader for per-medium RDC tables.
//!
//! A table is a sequence of residue blocks. A block starts with a line whose
//! first token is the residue name. The six couplings, in
//! [`BondVectorKind`](crate::core::models::bond::BondVectorKind) column order,
//! either follow on that same line or on the next six non-empty lines as
//! `value [error]`:
//!
//! ```text
//! # N-H  CA-HA  CA-C  C-N  C-H  N-CA
//! MET  12.3  999  -1.2  0.4  3.1  999
//! ALA
//! -4.1 0.5
//! 999
//! nan
//! 0.2 0.1
//! -
//! 1.7
//! ```
//!
//! `999` (or anything larger in magnitude), `nan` and `-` mark a missing
//! coupling. `#` starts a comment.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of coupling columns per residue.
pub const COUPLINGS_PER_RESIDUE: usize = 6;

/// Values at or beyond this magnitude are the "not measured" sentinel.
pub const MISSING_SENTINEL: f64 = 999.0;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Cannot read data file '{}': {source}", .path.display())]
    MissingFile { path: PathBuf, source: io::Error },
    #[error("Parse error in '{}' on line {line}: {kind}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        kind: ParseErrorKind,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("expected a residue name, found '{0}'")]
    ExpectedResidueName(String),
    #[error("invalid number '{0}'")]
    InvalidFloat(String),
    #[error("residue line must carry 0 or 6 couplings, found {0}")]
    InvalidFieldCount(usize),
    #[error("coupling line must be 'value [error]', found {0} fields")]
    InvalidCouplingLine(usize),
    #[error("residue block ended after {found} of 6 couplings")]
    TruncatedBlock { found: usize },
}

/// A measured coupling in Hz with its optional experimental error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coupling {
    pub value: f64,
    pub error: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RdcRow {
    pub name: String,
    pub couplings: [Option<Coupling>; COUPLINGS_PER_RESIDUE],
}

impl RdcRow {
    pub fn usable_count(&self) -> usize {
        self.couplings.iter().flatten().count()
    }

    pub fn has_usable(&self) -> bool {
        self.couplings.iter().any(Option::is_some)
    }
}

/// All residue rows of one alignment medium, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RdcTable {
    pub rows: Vec<RdcRow>,
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(content, _)| content).trim()
}

fn parse_value(token: &str) -> Result<Option<f64>, ParseErrorKind> {
    if token == "-" || token.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value: f64 = token
        .parse()
        .map_err(|_| ParseErrorKind::InvalidFloat(token.to_string()))?;
    if value.is_nan() || value.abs() >= MISSING_SENTINEL {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

fn parse_error(token: &str) -> Result<f64, ParseErrorKind> {
    token
        .parse()
        .map_err(|_| ParseErrorKind::InvalidFloat(token.to_string()))
}

fn coupling(value: Option<f64>, error: Option<f64>) -> Option<Coupling> {
    value.map(|value| Coupling { value, error })
}

fn parse_coupling_line(line: &str) -> Result<Option<Coupling>, ParseErrorKind> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [value] => Ok(coupling(parse_value(value)?, None)),
        [value, error] => Ok(coupling(parse_value(value)?, Some(parse_error(error)?))),
        other => Err(ParseErrorKind::InvalidCouplingLine(other.len())),
    }
}

fn is_numeric_token(token: &str) -> bool {
    token == "-" || token.eq_ignore_ascii_case("nan") || token.parse::<f64>().is_ok()
}

impl RdcTable {
    /// Parses a table from `reader`; `path` is only used in error messages.
    pub fn read_from(reader: &mut impl BufRead, path: &Path) -> Result<Self, DataError> {
        let parse_err = |line: usize, kind: ParseErrorKind| DataError::Parse {
            path: path.to_path_buf(),
            line,
            kind,
        };

        let mut lines = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| DataError::MissingFile {
                path: path.to_path_buf(),
                source,
            })?;
            let content = strip_comment(&line);
            if !content.is_empty() {
                lines.push((index + 1, content.to_string()));
            }
        }

        let mut rows = Vec::new();
        let mut cursor = lines.iter();
        while let Some((line_num, header)) = cursor.next() {
            let mut tokens = header.split_whitespace();
            let name = tokens.next().unwrap_or_default();
            if is_numeric_token(name) {
                return Err(parse_err(
                    *line_num,
                    ParseErrorKind::ExpectedResidueName(name.to_string()),
                ));
            }
            let inline: Vec<&str> = tokens.collect();

            let mut couplings = [None; COUPLINGS_PER_RESIDUE];
            match inline.len() {
                COUPLINGS_PER_RESIDUE => {
                    for (slot, token) in couplings.iter_mut().zip(&inline) {
                        *slot = coupling(
                            parse_value(token).map_err(|kind| parse_err(*line_num, kind))?,
                            None,
                        );
                    }
                }
                0 => {
                    for (found, slot) in couplings.iter_mut().enumerate() {
                        let Some((value_line, content)) = cursor.next() else {
                            return Err(parse_err(
                                *line_num,
                                ParseErrorKind::TruncatedBlock { found },
                            ));
                        };
                        let first = content.split_whitespace().next().unwrap_or_default();
                        if !is_numeric_token(first) {
                            return Err(parse_err(
                                *value_line,
                                ParseErrorKind::TruncatedBlock { found },
                            ));
                        }
                        *slot = parse_coupling_line(content)
                            .map_err(|kind| parse_err(*value_line, kind))?;
                    }
                }
                n => return Err(parse_err(*line_num, ParseErrorKind::InvalidFieldCount(n))),
            }

            rows.push(RdcRow {
                name: name.to_ascii_uppercase(),
                couplings,
            });
        }

        Ok(Self { rows })
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataError::MissingFile {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, path)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&RdcRow> {
        self.rows.get(index)
    }

    pub fn residue_names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn parse(text: &str) -> Result<RdcTable, DataError> {
        RdcTable::read_from(&mut Cursor::new(text), Path::new("test.1"))
    }

    fn parse_kind(text: &str) -> (usize, ParseErrorKind) {
        match parse(text) {
            Err(DataError::Parse { line, kind, .. }) => (line, kind),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn parses_inline_rows() {
        let table = parse("MET 12.3 999 -1.2 0.4 3.1 999\n").unwrap();
        assert_eq!(table.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.name, "MET");
        assert_eq!(row.couplings[0], Some(Coupling { value: 12.3, error: None }));
        assert_eq!(row.couplings[1], None);
        assert_eq!(row.couplings[5], None);
        assert_eq!(row.usable_count(), 4);
    }

    #[test]
    fn parses_block_rows_with_errors_and_comments() {
        let text = "\
# header comment
ala
-4.1 0.5   # N-H
999

nan
0.2 0.1
-
1.7
GLY 1 2 3 4 5 6
";
        let table = parse(text).unwrap();
        assert_eq!(table.residue_names().collect::<Vec<_>>(), ["ALA", "GLY"]);
        let row = &table.rows[0];
        assert_eq!(row.couplings[0], Some(Coupling { value: -4.1, error: Some(0.5) }));
        assert_eq!(row.couplings[1], None);
        assert_eq!(row.couplings[2], None);
        assert_eq!(row.couplings[3], Some(Coupling { value: 0.2, error: Some(0.1) }));
        assert_eq!(row.couplings[4], None);
        assert_eq!(row.couplings[5], Some(Coupling { value: 1.7, error: None }));
        assert_eq!(table.rows[1].usable_count(), 6);
    }

    #[test]
    fn large_negative_values_are_missing_too() {
        let table = parse("ALA -999 -1000 1 1 1 1\n").unwrap();
        assert_eq!(table.rows[0].couplings[0], None);
        assert_eq!(table.rows[0].couplings[1], None);
    }

    #[test]
    fn row_with_all_couplings_missing_has_no_usable_data() {
        let table = parse("ALA 999 999 999 999 999 999\n").unwrap();
        assert!(!table.rows[0].has_usable());
    }

    #[test]
    fn rejects_number_where_residue_name_expected() {
        let (line, kind) = parse_kind("1.0 2.0\n");
        assert_eq!(line, 1);
        assert_eq!(kind, ParseErrorKind::ExpectedResidueName("1.0".to_string()));
    }

    #[test]
    fn rejects_partial_inline_row() {
        let (line, kind) = parse_kind("ALA 1 2 3 4 5 6\nGLY 1 2 3\n");
        assert_eq!(line, 2);
        assert_eq!(kind, ParseErrorKind::InvalidFieldCount(3));
    }

    #[test]
    fn rejects_truncated_block() {
        let (line, kind) = parse_kind("ALA\n1\n2\nGLY 1 2 3 4 5 6\n");
        assert_eq!(line, 4);
        assert_eq!(kind, ParseErrorKind::TruncatedBlock { found: 2 });

        let (_, kind) = parse_kind("ALA\n1\n2\n");
        assert_eq!(kind, ParseErrorKind::TruncatedBlock { found: 2 });
    }

    #[test]
    fn rejects_invalid_numbers() {
        let (line, kind) = parse_kind("ALA\n1\n2\n3\n4 x\n5\n6\n");
        assert_eq!(line, 5);
        assert_eq!(kind, ParseErrorKind::InvalidFloat("x".to_string()));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.1");
        match RdcTable::read_from_path(&path) {
            Err(DataError::MissingFile { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn read_from_path_parses_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.1");
        std::fs::write(&path, "ALA 1 2 3 4 5 6\nGLY 6 5 4 3 2 1\n").unwrap();
        let table = RdcTable::read_from_path(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.row(1).unwrap().couplings[0].unwrap().value, 6.0);
    }
}
