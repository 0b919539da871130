//! Tabular input loading.
//!
//! Reads spreadsheets (via calamine) and CSV files into a uniform [`Table`]
//! with whitespace-trimmed headers. The column schema is resolved once here:
//! the first column is the group key, the second the text to synthesize, and
//! the optional third/fourth columns carry the display word and its
//! explanation. A table with fewer than two columns fails fast.

use std::path::Path;

use calamine::{Reader, open_workbook_auto};
use tracing::debug;

use crate::error::{Error, Result};

/// One input line with its fields resolved by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Group key (first column).
    pub key: String,
    /// Text handed to the synthesizer (second column).
    pub text: String,
    /// Display word (third column), when present and non-empty.
    pub word: Option<String>,
    /// Explanation for the display word (fourth column), when present and non-empty.
    pub gloss: Option<String>,
}

impl Row {
    /// Whether the row carries the full four-column schema.
    pub fn has_gloss(&self) -> bool {
        self.word.is_some() && self.gloss.is_some()
    }
}

/// A loaded input table.
#[derive(Debug, Clone)]
pub struct Table {
    /// Trimmed column headers, in source order.
    pub headers: Vec<String>,
    /// Data rows, in source order.
    pub rows: Vec<Row>,
}

/// Load a tabular file, choosing the reader by extension.
///
/// # Errors
/// Returns `Error::Read` for a missing, malformed or unsupported file and
/// `Error::MissingColumn` when the table has fewer than two columns.
pub fn load_table(path: &Path) -> Result<Table> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("").to_lowercase();

    let (headers, cells) = match extension.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_spreadsheet(path)?,
        other => {
            return Err(Error::Read(format!("unsupported table format '.{}' for {}", other, path.display())));
        }
    };

    let headers: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    match headers.len() {
        0 => return Err(Error::MissingColumn { name: "group", found: 0 }),
        1 => return Err(Error::MissingColumn { name: "text", found: 1 }),
        _ => {}
    }

    let rows: Vec<Row> = cells.into_iter().filter_map(make_row).collect();
    debug!("Loaded {} rows x {} columns from {}", rows.len(), headers.len(), path.display());

    Ok(Table { headers, rows })
}

/// Build a row from trimmed cells; fully blank lines are dropped.
fn make_row(cells: Vec<String>) -> Option<Row> {
    let field = |idx: usize| cells.get(idx).map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

    let key = field(0);
    let text = field(1);
    if key.is_none() && text.is_none() {
        return None;
    }

    Some(Row {
        key: key.unwrap_or_default(),
        text: text.unwrap_or_default(),
        word: field(2),
        gloss: field(3),
    })
}

/// Read the first worksheet of a spreadsheet into header + cell strings.
fn read_spreadsheet(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut workbook = open_workbook_auto(path).map_err(|e| Error::Read(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Read(format!("{}: workbook has no sheets", path.display())))?
        .map_err(|e| Error::Read(format!("{}: {}", path.display(), e)))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(cells) => cells.iter().map(|c| c.to_string()).collect(),
        None => Vec::new(),
    };
    let cells = rows.map(|row| row.iter().map(|c| c.to_string()).collect()).collect();

    Ok((headers, cells))
}

/// Read a CSV file into header + cell strings.
fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::Read(format!("{}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::Read(format!("{}: {}", path.display(), e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Read(format!("{}: {}", path.display(), e)))?;
        cells.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok((headers, cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_csv_with_trimmed_headers() {
        let file = write_csv(" group , text ,word,explanation\nfruits,apple pie,apple,a fruit\nfruits,banana split,,\n");
        let table = load_table(file.path()).unwrap();

        assert_eq!(table.headers, vec!["group", "text", "word", "explanation"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].key, "fruits");
        assert_eq!(table.rows[0].word.as_deref(), Some("apple"));
        assert!(table.rows[0].has_gloss());
        assert!(!table.rows[1].has_gloss());
    }

    #[test]
    fn blank_lines_are_dropped() {
        let file = write_csv("group,text\nfruits,apple\n,\nanimals,cat\n");
        let table = load_table(file.path()).unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn single_column_table_fails_fast() {
        let file = write_csv("group\nfruits\n");
        match load_table(file.path()) {
            Err(Error::MissingColumn { name, found }) => {
                assert_eq!(name, "text");
                assert_eq!(found, 1);
            }
            other => panic!("expected MissingColumn, got {:?}", other.map(|t| t.headers)),
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_table(Path::new("does-not-exist.csv")).unwrap_err();
        assert!(matches!(err, Error::Read(_)));
    }

    #[test]
    fn unsupported_extension_is_a_read_error() {
        let err = load_table(Path::new("list.txt")).unwrap_err();
        assert!(matches!(err, Error::Read(_)));
    }
}
