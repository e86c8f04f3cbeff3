//! Text format for precomputed kernel matrices
//!
//! The first data line holds the class counts, every following line one
//! matrix row:
//!
//! ```text
//! # n_pos n_neg
//! 2 1
//! 1.0 0.8 0.1
//! 0.8 1.0 0.2
//! 0.1 0.2 1.0
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use crate::core::{GkmError, Result};
use crate::kernel::KernelMatrix;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Load a kernel matrix from a text file
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<KernelMatrix> {
    let file = File::open(path)?;
    read_matrix_from(BufReader::new(file))
}

/// Load a kernel matrix from any buffered reader
pub fn read_matrix_from<R: BufRead>(reader: R) -> Result<KernelMatrix> {
    let mut counts: Option<(usize, usize)> = None;
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parsed = match counts {
            None => parse_header(line).map(|header| counts = Some(header)),
            Some((n_pos, n_neg)) => parse_row(line, n_pos + n_neg).map(|row| rows.push(row)),
        };
        parsed.map_err(|e| GkmError::ParseError(format!("line {}: {e}", line_num + 1)))?;
    }

    let (n_pos, n_neg) =
        counts.ok_or_else(|| GkmError::ParseError("missing `n_pos n_neg` header".to_string()))?;
    if rows.len() != n_pos + n_neg {
        return Err(GkmError::ParseError(format!(
            "expected {} matrix rows, found {}",
            n_pos + n_neg,
            rows.len()
        )));
    }

    KernelMatrix::from_rows(rows, n_pos, n_neg)
}

fn parse_header(line: &str) -> std::result::Result<(usize, usize), String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(format!("header must be `n_pos n_neg`, got `{line}`"));
    }
    let parse = |s: &str| {
        s.parse::<usize>()
            .map_err(|_| format!("invalid sequence count: {s}"))
    };
    Ok((parse(fields[0])?, parse(fields[1])?))
}

fn parse_row(line: &str, expected: usize) -> std::result::Result<Vec<f64>, String> {
    let row = line
        .split_whitespace()
        .map(|s| s.parse::<f64>().map_err(|_| format!("invalid kernel value: {s}")))
        .collect::<std::result::Result<Vec<f64>, String>>()?;
    if row.len() != expected {
        return Err(format!("expected {expected} values, found {}", row.len()));
    }
    Ok(row)
}

/// Write a kernel matrix in the text format
pub fn write_matrix<P: AsRef<Path>>(matrix: &KernelMatrix, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_matrix_to(matrix, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a kernel matrix to any writer
pub fn write_matrix_to<W: Write>(matrix: &KernelMatrix, writer: &mut W) -> Result<()> {
    writeln!(writer, "# n_pos n_neg")?;
    writeln!(writer, "{} {}", matrix.n_pos(), matrix.n_neg())?;
    for i in 0..matrix.n_seqs() {
        let row: Vec<String> = matrix
            .as_gram()
            .row(i)
            .iter()
            .map(|v| v.to_string())
            .collect();
        writeln!(writer, "{}", row.join(" "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "# toy\n2 1\n1.0 0.8 0.1\n0.8 1.0 0.2\n\n0.1 0.2 1.0\n";

    #[test]
    fn test_read_matrix() {
        let matrix = read_matrix_from(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(matrix.n_pos(), 2);
        assert_eq!(matrix.n_neg(), 1);
        assert_eq!(matrix.get(0, 1), 0.8);
        assert_eq!(matrix.get(2, 1), 0.2);
    }

    #[test]
    fn test_write_then_read_file() {
        let matrix = read_matrix_from(Cursor::new(SAMPLE)).unwrap();
        let file = NamedTempFile::new().unwrap();

        write_matrix(&matrix, file.path()).unwrap();
        let reloaded = read_matrix(file.path()).unwrap();
        assert_eq!(reloaded.as_gram(), matrix.as_gram());
        assert_eq!(reloaded.n_pos(), 2);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let text = "2 1\n1.0 0.8 0.1\n0.8 oops 0.2\n0.1 0.2 1.0\n";
        match read_matrix_from(Cursor::new(text)) {
            Err(GkmError::ParseError(msg)) => {
                assert!(msg.contains("line 3"), "{msg}");
                assert!(msg.contains("oops"), "{msg}");
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_short_row() {
        let text = "1 1\n1.0\n0.0 1.0\n";
        assert!(matches!(
            read_matrix_from(Cursor::new(text)),
            Err(GkmError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_rows_and_header() {
        assert!(matches!(
            read_matrix_from(Cursor::new("1 1\n1.0 0.0\n")),
            Err(GkmError::ParseError(_))
        ));
        assert!(matches!(
            read_matrix_from(Cursor::new("# nothing\n")),
            Err(GkmError::ParseError(_))
        ));
    }

    #[test]
    fn test_asymmetric_matrix_is_rejected() {
        let text = "1 1\n1.0 0.5\n0.0 1.0\n";
        assert!(matches!(
            read_matrix_from(Cursor::new(text)),
            Err(GkmError::Configuration(_))
        ));
    }

    #[test]
    fn test_negative_similarity_is_rejected() {
        let text = "1 1\n1.0 -0.2\n-0.2 1.0\n";
        assert!(matches!(
            read_matrix_from(Cursor::new(text)),
            Err(GkmError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_matrix("/nonexistent/kernel.txt"),
            Err(GkmError::IoError(_))
        ));
    }
}
