// Spreadsheet sources
// Reads the first sheet of a workbook (or a CSV file) into header-keyed rows.
//
// Same shape as a parser registry: one small trait, one implementation per
// file format, and a detector that picks the implementation from the path.

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

// ============================================================================
// CELL MODEL
// ============================================================================

/// Value of a single cell, independent of the file format it came from
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Text rendering of the cell, trimmed. `None` for empty cells, blank
    /// text and non-finite numbers.
    pub fn to_text(&self) -> Option<String> {
        let text = match self {
            Cell::Empty => return None,
            Cell::Text(s) => s.trim().to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if !f.is_finite() => return None,
            // Integral floats print like integers: 12345.0 -> "12345"
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        };

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(Cell::DateTime)
                .unwrap_or(Cell::Float(dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        }
    }
}

/// One data row, keyed by header text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    cells: HashMap<String, Cell>,
}

impl SheetRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: add a cell under `header`
    pub fn with(mut self, header: impl Into<String>, cell: Cell) -> Self {
        self.cells.insert(header.into(), cell);
        self
    }

    /// Pair headers with cells. Blank headers are skipped; missing trailing
    /// cells are simply absent from the row. A repeated header keeps its
    /// first column.
    pub fn from_headers(headers: &[Option<String>], cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut row = SheetRow::new();
        for (header, cell) in headers.iter().zip(cells) {
            if let Some(header) = header {
                row.cells.entry(header.clone()).or_insert(cell);
            }
        }
        row
    }

    pub fn get(&self, header: &str) -> Option<&Cell> {
        self.cells.get(header)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn header_text(cell: &Cell) -> Option<String> {
    cell.to_text()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .filter(|h| !h.is_empty())
}

// ============================================================================
// SOURCES
// ============================================================================

/// Reads a tabular file into rows. The first row is the header.
pub trait SheetSource: Send + Sync {
    fn read_rows(&self, path: &Path) -> Result<Vec<SheetRow>>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Excel / OpenDocument workbooks via calamine (first worksheet only)
pub struct WorkbookSource;

impl SheetSource for WorkbookSource {
    fn read_rows(&self, path: &Path) -> Result<Vec<SheetRow>> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range
                .with_context(|| format!("Failed to read first worksheet of {}", path.display()))?,
            None => bail!("Workbook has no worksheets: {}", path.display()),
        };

        let mut rows = range.rows();
        let headers: Vec<Option<String>> = match rows.next() {
            Some(header_row) => header_row.iter().map(|d| header_text(&Cell::from(d))).collect(),
            None => return Ok(Vec::new()),
        };

        Ok(rows
            .map(|row| SheetRow::from_headers(&headers, row.iter().map(Cell::from)))
            .collect())
    }

    fn name(&self) -> &str {
        "workbook"
    }
}

/// Comma-separated exports. Every non-empty field is text.
pub struct CsvSource;

impl SheetSource for CsvSource {
    fn read_rows(&self, path: &Path) -> Result<Vec<SheetRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

        let headers: Vec<Option<String>> = reader
            .headers()
            .with_context(|| format!("Failed to read CSV header in {}", path.display()))?
            .iter()
            .map(|h| header_text(&Cell::Text(h.to_string())))
            .collect();

        let mut rows = Vec::new();
        for (line_num, result) in reader.records().enumerate() {
            let record = result.with_context(|| {
                format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
            })?;

            let cells = record.iter().map(|field| {
                if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            });
            rows.push(SheetRow::from_headers(&headers, cells));
        }

        Ok(rows)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Spreadsheet format, detected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Workbook,
    Csv,
}

/// Detect the format from the extension (case-insensitive)
pub fn detect_format(path: &Path) -> Option<SheetFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SheetFormat::Workbook),
        "csv" => Some(SheetFormat::Csv),
        _ => None,
    }
}

/// Picks `WorkbookSource` or `CsvSource` per file
pub struct AutoSource;

impl SheetSource for AutoSource {
    fn read_rows(&self, path: &Path) -> Result<Vec<SheetRow>> {
        match detect_format(path) {
            Some(SheetFormat::Workbook) => WorkbookSource.read_rows(path),
            Some(SheetFormat::Csv) => CsvSource.read_rows(path),
            None => bail!("Unsupported spreadsheet format: {}", path.display()),
        }
    }

    fn name(&self) -> &str {
        "auto"
    }
}

// ============================================================================
// FILE LOCK
// ============================================================================

/// Companion lock file: the data path with its extension replaced by `lock`
pub fn lock_path_for(path: &Path) -> PathBuf {
    path.with_extension("lock")
}

/// Run `f` while holding an exclusive lock on `lock_path` (created if
/// missing). Writers of the spreadsheet take the same lock.
pub fn with_exclusive_lock<T>(lock_path: &Path, f: impl FnOnce() -> T) -> std::io::Result<T> {
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)?;

    lock_file.lock_exclusive()?;
    let out = f();
    FileExt::unlock(&lock_file)?;

    Ok(out)
}
