// Graduate Analytics Reader
// Spreadsheet rows -> normalized GraduateRow, cached by file mtime.
//
// Cold: nothing cached, or the cached mtime no longer matches the file.
// Warm: cached mtime equals the file's current mtime.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use crate::error::{MetisError, Result};
use crate::spreadsheet::{lock_path_for, with_exclusive_lock, AutoSource, Cell, SheetRow, SheetSource};

// ============================================================================
// SOURCE COLUMNS
// ============================================================================

pub mod columns {
    pub const RUT: &str = "Identificación - RUT";
    pub const CAREER: &str = "Académico - Carrera_Pregrado";
    pub const GRADUATION_DATE: &str = "Académico - Fecha_Egreso";
    pub const WORK_CURRENT: &str = "Estado - Es_Trabajo_Actual";
    pub const COUNTRY: &str = "Estado - Pais_Residencia";
    pub const COMPANY: &str = "Laboral (Historial) - Empresa";
    pub const DEPARTMENT: &str = "Laboral (Historial) - Departamento";
    pub const ROLE: &str = "Laboral (Historial) - Cargo";
    pub const INDUSTRY: &str = "Laboral (Historial) - Rubro_Empresa";
    pub const JOB_START_DATE: &str = "Laboral (Historial) - Fecha_Inicio_Trabajo";
}

/// Substitute for missing or unreadable text cells
pub const MISSING_TEXT: &str = "Sin dato";

/// Substitute for a missing employment status
const MISSING_WORK_STATUS: &str = "No";

/// Employment values read as "currently working" (compared lowercased)
const AFFIRMATIVE: [&str; 4] = ["si", "sí", "true", "1"];

// ============================================================================
// GRADUATE ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraduateRow {
    pub rut: String,
    pub career: String,
    pub graduation_date: Option<NaiveDate>,
    pub work_current: bool,
    pub country: String,
    pub company: String,
    pub department: String,
    pub role: String,
    pub industry: String,
    pub job_start_date: Option<NaiveDate>,
}

impl GraduateRow {
    /// Normalize one spreadsheet row. Never fails: bad cells fall back.
    pub fn from_sheet_row(row: &SheetRow) -> Self {
        let work_status = normalize_text(row.get(columns::WORK_CURRENT), MISSING_WORK_STATUS);

        GraduateRow {
            rut: text_or_missing(row, columns::RUT),
            career: text_or_missing(row, columns::CAREER),
            graduation_date: row.get(columns::GRADUATION_DATE).and_then(parse_date),
            work_current: is_affirmative(&work_status),
            country: text_or_missing(row, columns::COUNTRY),
            company: text_or_missing(row, columns::COMPANY),
            department: text_or_missing(row, columns::DEPARTMENT),
            role: text_or_missing(row, columns::ROLE),
            industry: text_or_missing(row, columns::INDUSTRY),
            job_start_date: row.get(columns::JOB_START_DATE).and_then(parse_date),
        }
    }
}

fn text_or_missing(row: &SheetRow, column: &str) -> String {
    normalize_text(row.get(column), MISSING_TEXT)
}

/// Trimmed text of the cell, or `fallback` when it is absent, empty or
/// not representable as text.
pub fn normalize_text(cell: Option<&Cell>, fallback: &str) -> String {
    cell.and_then(Cell::to_text)
        .unwrap_or_else(|| fallback.to_string())
}

pub fn is_affirmative(value: &str) -> bool {
    let lower = value.to_lowercase();
    AFFIRMATIVE.contains(&lower.as_str())
}

/// Calendar date of the cell; `None` when it cannot be read as one.
///
/// Text is tried as ISO date / date-time first, then `YYYY/MM/DD`, then
/// month-first `MM/DD/YYYY`. Bare numbers are not dates.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime(dt) => Some(dt.date()),
        Cell::Text(text) => parse_date_text(text.trim()),
        _ => None,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

// ============================================================================
// READER + CACHE
// ============================================================================

/// Cache state relative to the file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Cold,
    Warm,
}

struct CacheEntry {
    modified: SystemTime,
    rows: Arc<Vec<GraduateRow>>,
}

/// Reads the graduates spreadsheet and caches normalized rows by mtime
///
/// The cache check and refresh run under one mutex, so concurrent callers
/// seeing a stale cache trigger a single reload.
pub struct GraduateReader<S: SheetSource = AutoSource> {
    path: PathBuf,
    lock_path: PathBuf,
    source: S,
    cache: Mutex<Option<CacheEntry>>,
}

impl GraduateReader<AutoSource> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_source(path, AutoSource)
    }
}

impl<S: SheetSource> GraduateReader<S> {
    pub fn with_source(path: impl Into<PathBuf>, source: S) -> Self {
        let path = path.into();
        GraduateReader {
            lock_path: lock_path_for(&path),
            path,
            source,
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Read and normalize every row, bypassing the cache
    pub fn load(&self) -> Result<Vec<GraduateRow>> {
        if !self.path.exists() {
            return Err(MetisError::SourceNotFound(self.path.clone()));
        }

        let sheet_rows = with_exclusive_lock(&self.lock_path, || self.source.read_rows(&self.path))?
            .map_err(|e| self.read_error(e))?;

        Ok(sheet_rows.iter().map(GraduateRow::from_sheet_row).collect())
    }

    /// A file removed between the existence check and the open is still a
    /// missing file, not a decode failure.
    fn read_error(&self, err: anyhow::Error) -> MetisError {
        let vanished = err.chain().any(|cause| {
            cause
                .downcast_ref::<std::io::Error>()
                .map_or(false, |io| io.kind() == std::io::ErrorKind::NotFound)
        });

        if vanished || !self.path.exists() {
            MetisError::SourceNotFound(self.path.clone())
        } else {
            MetisError::Source(err)
        }
    }

    /// Cached rows, reloaded when the file's mtime differs from the cached one
    pub fn rows(&self) -> Result<Arc<Vec<GraduateRow>>> {
        let modified = self.modified()?;
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = cache.as_ref() {
            if entry.modified == modified {
                tracing::debug!(path = %self.path.display(), "graduates cache hit");
                return Ok(Arc::clone(&entry.rows));
            }
        }

        let rows = Arc::new(self.load()?);
        tracing::info!(
            path = %self.path.display(),
            source = self.source.name(),
            rows = rows.len(),
            "graduates cache refreshed"
        );

        *cache = Some(CacheEntry {
            modified,
            rows: Arc::clone(&rows),
        });
        Ok(rows)
    }

    /// Warm only if a cache exists and matches the file's current mtime
    pub fn state(&self) -> CacheState {
        let Ok(modified) = self.modified() else {
            return CacheState::Cold;
        };

        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        match cache.as_ref() {
            Some(entry) if entry.modified == modified => CacheState::Warm,
            _ => CacheState::Cold,
        }
    }

    fn modified(&self) -> Result<SystemTime> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.modified()?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MetisError::SourceNotFound(self.path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    const HEADER: &str = "Identificación - RUT,Académico - Carrera_Pregrado,Académico - Fecha_Egreso,\
Estado - Es_Trabajo_Actual,Estado - Pais_Residencia,Laboral (Historial) - Empresa,\
Laboral (Historial) - Departamento,Laboral (Historial) - Cargo,\
Laboral (Historial) - Rubro_Empresa,Laboral (Historial) - Fecha_Inicio_Trabajo";

    /// Wraps a source and counts reads
    struct CountingSource {
        reads: AtomicUsize,
        delay: Duration,
    }

    impl CountingSource {
        fn new() -> Self {
            Self::slow(Duration::ZERO)
        }

        /// Each read sleeps first, widening the window for racing callers
        fn slow(delay: Duration) -> Self {
            CountingSource {
                reads: AtomicUsize::new(0),
                delay,
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl SheetSource for CountingSource {
        fn read_rows(&self, path: &Path) -> anyhow::Result<Vec<SheetRow>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            AutoSource.read_rows(path)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    /// Deletes the file right before reading it
    struct VanishingSource;

    impl SheetSource for VanishingSource {
        fn read_rows(&self, path: &Path) -> anyhow::Result<Vec<SheetRow>> {
            fs::remove_file(path)?;
            AutoSource.read_rows(path)
        }

        fn name(&self) -> &str {
            "vanishing"
        }
    }

    fn write_workbook(path: &Path) {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let sheet = workbook.add_worksheet();

        let headers = [
            columns::RUT,
            columns::CAREER,
            columns::GRADUATION_DATE,
            columns::WORK_CURRENT,
            columns::COUNTRY,
            columns::COMPANY,
            columns::DEPARTMENT,
            columns::ROLE,
            columns::INDUSTRY,
            columns::JOB_START_DATE,
        ];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }

        // Numeric RUT, date-typed cells, boolean employment
        sheet.write_number(1, 0, 12345678.0).unwrap();
        sheet.write_string(1, 1, "Ingeniería Civil").unwrap();
        sheet
            .write_datetime_with_format(1, 2, &ExcelDateTime::from_ymd(2019, 12, 20).unwrap(), &date_format)
            .unwrap();
        sheet.write_boolean(1, 3, true).unwrap();
        sheet.write_string(1, 4, "Chile").unwrap();
        sheet.write_string(1, 5, "Acme SpA").unwrap();
        sheet.write_string(1, 6, "Operaciones").unwrap();
        sheet.write_string(1, 7, "Analista").unwrap();
        sheet.write_string(1, 8, "Minería").unwrap();
        sheet
            .write_datetime_with_format(1, 9, &ExcelDateTime::from_ymd(2020, 3, 1).unwrap(), &date_format)
            .unwrap();

        // Text date, numeric employment flag, blank trailing cells
        sheet.write_string(2, 0, "9.876.543-2").unwrap();
        sheet.write_string(2, 1, "Derecho").unwrap();
        sheet.write_string(2, 2, "2018-05-04").unwrap();
        sheet.write_number(2, 3, 1.0).unwrap();

        // Unreadable date text, negative employment
        sheet.write_string(3, 0, "5.555.555-5").unwrap();
        sheet.write_string(3, 2, "pendiente").unwrap();
        sheet.write_string(3, 3, "No").unwrap();

        workbook.save(path).unwrap();
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clean_row() -> GraduateRow {
        GraduateRow {
            rut: "12.345.678-9".to_string(),
            career: "Ingeniería Civil".to_string(),
            graduation_date: Some(date(2019, 12, 20)),
            work_current: true,
            country: "Chile".to_string(),
            company: "Acme SpA".to_string(),
            department: "Operaciones".to_string(),
            role: "Analista".to_string(),
            industry: "Minería".to_string(),
            job_start_date: Some(date(2020, 3, 1)),
        }
    }

    fn sheet_row_for(row: &GraduateRow) -> SheetRow {
        let text = |s: &str| Cell::Text(s.to_string());
        let date_cell = |d: Option<NaiveDate>| match d {
            Some(d) => Cell::DateTime(d.and_hms_opt(0, 0, 0).unwrap()),
            None => Cell::Empty,
        };

        SheetRow::new()
            .with(columns::RUT, text(&row.rut))
            .with(columns::CAREER, text(&row.career))
            .with(columns::GRADUATION_DATE, date_cell(row.graduation_date))
            .with(columns::WORK_CURRENT, text(if row.work_current { "Sí" } else { "No" }))
            .with(columns::COUNTRY, text(&row.country))
            .with(columns::COMPANY, text(&row.company))
            .with(columns::DEPARTMENT, text(&row.department))
            .with(columns::ROLE, text(&row.role))
            .with(columns::INDUSTRY, text(&row.industry))
            .with(columns::JOB_START_DATE, date_cell(row.job_start_date))
    }

    fn write_csv(path: &Path, lines: &[&str]) {
        let mut content = String::from(HEADER);
        for line in lines {
            content.push('\n');
            content.push_str(line);
        }
        content.push('\n');
        fs::write(path, content).unwrap();
    }

    fn bump_mtime(path: &Path, seconds: u64) {
        let file = File::options().write(true).open(path).unwrap();
        let modified = file.metadata().unwrap().modified().unwrap();
        file.set_modified(modified + Duration::from_secs(seconds)).unwrap();
    }

    // ------------------------------------------------------------------------
    // Normalization
    // ------------------------------------------------------------------------

    #[test]
    fn test_normalize_clean_row_is_identity() {
        let expected = clean_row();
        let normalized = GraduateRow::from_sheet_row(&sheet_row_for(&expected));
        assert_eq!(normalized, expected);

        // Round two over its own output gives the same row
        let again = GraduateRow::from_sheet_row(&sheet_row_for(&normalized));
        assert_eq!(again, normalized);
    }

    #[test]
    fn test_missing_and_blank_cells_fall_back() {
        let row = SheetRow::new()
            .with(columns::RUT, Cell::Text("   ".into()))
            .with(columns::CAREER, Cell::Empty)
            .with(columns::COUNTRY, Cell::Float(f64::NAN));

        let graduate = GraduateRow::from_sheet_row(&row);

        assert_eq!(graduate.rut, MISSING_TEXT);
        assert_eq!(graduate.career, MISSING_TEXT);
        assert_eq!(graduate.country, MISSING_TEXT);
        assert_eq!(graduate.company, MISSING_TEXT);
        assert_eq!(graduate.graduation_date, None);
        assert_eq!(graduate.job_start_date, None);
        assert!(!graduate.work_current);
    }

    #[test]
    fn test_numeric_text_fields_render_without_fraction() {
        let row = SheetRow::new().with(columns::RUT, Cell::Float(12345678.0));
        assert_eq!(GraduateRow::from_sheet_row(&row).rut, "12345678");
    }

    #[test]
    fn test_work_current_flag() {
        let flag = |cell: Cell| {
            GraduateRow::from_sheet_row(&SheetRow::new().with(columns::WORK_CURRENT, cell)).work_current
        };

        assert!(flag(Cell::Text("Sí".into())));
        assert!(flag(Cell::Text("SI".into())));
        assert!(flag(Cell::Text(" si ".into())));
        assert!(flag(Cell::Text("True".into())));
        assert!(flag(Cell::Text("1".into())));
        assert!(flag(Cell::Int(1)));
        assert!(flag(Cell::Bool(true)));

        assert!(!flag(Cell::Text("No".into())));
        assert!(!flag(Cell::Text("yes".into())));
        assert!(!flag(Cell::Bool(false)));
        assert!(!flag(Cell::Int(0)));
        assert!(!flag(Cell::Empty));
        assert!(!GraduateRow::from_sheet_row(&SheetRow::new()).work_current);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = Some(date(2021, 7, 15));

        assert_eq!(parse_date(&Cell::Text("2021-07-15".into())), expected);
        assert_eq!(parse_date(&Cell::Text("2021-07-15 13:45:00".into())), expected);
        assert_eq!(parse_date(&Cell::Text("2021-07-15T13:45:00".into())), expected);
        assert_eq!(parse_date(&Cell::Text("2021-07-15T13:45:00Z".into())), expected);
        assert_eq!(parse_date(&Cell::Text("2021/07/15".into())), expected);
        assert_eq!(parse_date(&Cell::Text("07/15/2021".into())), expected);
        assert_eq!(
            parse_date(&Cell::DateTime(date(2021, 7, 15).and_hms_opt(8, 0, 0).unwrap())),
            expected
        );
    }

    #[test]
    fn test_parse_date_coerces_garbage_to_none() {
        assert_eq!(parse_date(&Cell::Text("not a date".into())), None);
        assert_eq!(parse_date(&Cell::Text("2021-13-40".into())), None);
        assert_eq!(parse_date(&Cell::Text("".into())), None);
        assert_eq!(parse_date(&Cell::Float(44000.0)), None);
        assert_eq!(parse_date(&Cell::Empty), None);
    }

    // ------------------------------------------------------------------------
    // Reader + cache
    // ------------------------------------------------------------------------

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let reader = GraduateReader::new(dir.path().join("missing.xlsx"));

        assert!(matches!(reader.rows(), Err(MetisError::SourceNotFound(_))));
        assert!(matches!(reader.load(), Err(MetisError::SourceNotFound(_))));
        assert_eq!(reader.state(), CacheState::Cold);
    }

    #[test]
    fn test_load_normalizes_csv_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grads.csv");
        write_csv(
            &path,
            &[
                "12.345.678-9,Ingeniería Civil,2019-12-20,Sí,Chile,Acme SpA,Operaciones,Analista,Minería,2020-03-01",
                "98.765.432-1,Derecho,fecha rara,No,,,,,,",
            ],
        );

        let reader = GraduateReader::new(&path);
        let rows = reader.load().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], clean_row());

        let second = &rows[1];
        assert_eq!(second.rut, "98.765.432-1");
        assert_eq!(second.career, "Derecho");
        assert_eq!(second.graduation_date, None);
        assert!(!second.work_current);
        assert_eq!(second.country, MISSING_TEXT);
        assert_eq!(second.industry, MISSING_TEXT);
        assert_eq!(second.job_start_date, None);

        // Lock file is created next to the data file and the source is untouched
        assert!(dir.path().join("grads.lock").exists());
    }

    #[test]
    fn test_rows_cached_until_mtime_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grads.csv");
        write_csv(&path, &["1-9,Derecho,2018-01-10,No,Chile,,,,,"]);

        let reader = GraduateReader::with_source(&path, CountingSource::new());
        assert_eq!(reader.state(), CacheState::Cold);

        let first = reader.rows().unwrap();
        let second = reader.rows().unwrap();

        assert_eq!(first, second);
        assert_eq!(reader.source().reads(), 1);
        assert_eq!(reader.state(), CacheState::Warm);
    }

    #[test]
    fn test_rows_reload_after_mtime_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grads.csv");
        write_csv(&path, &["1-9,Derecho,2018-01-10,No,Chile,,,,,"]);

        let reader = GraduateReader::with_source(&path, CountingSource::new());
        let before = reader.rows().unwrap();
        assert_eq!(before.len(), 1);

        write_csv(
            &path,
            &[
                "1-9,Derecho,2018-01-10,No,Chile,,,,,",
                "2-7,Medicina,2020-06-30,si,Perú,Clínica,Urgencias,Médico,Salud,2020-08-01",
            ],
        );
        bump_mtime(&path, 5);
        assert_eq!(reader.state(), CacheState::Cold);

        let after = reader.rows().unwrap();

        assert_eq!(after.len(), 2);
        assert_eq!(after[1].career, "Medicina");
        assert!(after[1].work_current);
        assert_eq!(reader.source().reads(), 2);
        assert_eq!(reader.state(), CacheState::Warm);
    }

    #[test]
    fn test_rows_not_found_after_file_removed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grads.csv");
        write_csv(&path, &["1-9,Derecho,2018-01-10,No,Chile,,,,,"]);

        let reader = GraduateReader::new(&path);
        reader.rows().unwrap();

        fs::remove_file(&path).unwrap();
        assert!(matches!(reader.rows(), Err(MetisError::SourceNotFound(_))));
    }

    #[test]
    fn test_concurrent_cold_reads_reload_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grads.csv");
        write_csv(&path, &["1-9,Derecho,2018-01-10,No,Chile,,,,,"]);

        let reader = GraduateReader::with_source(&path, CountingSource::slow(Duration::from_millis(50)));

        let results: Vec<Arc<Vec<GraduateRow>>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| reader.rows().unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(reader.source().reads(), 1);
        assert!(results.iter().all(|rows| Arc::ptr_eq(rows, &results[0])));
        assert_eq!(results[0].len(), 1);
        assert_eq!(reader.state(), CacheState::Warm);
    }

    #[test]
    fn test_file_removed_during_read_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grads.csv");
        write_csv(&path, &["1-9,Derecho,2018-01-10,No,Chile,,,,,"]);

        let reader = GraduateReader::with_source(&path, VanishingSource);

        assert!(matches!(reader.load(), Err(MetisError::SourceNotFound(_))));
    }

    #[test]
    fn test_load_normalizes_xlsx_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Base_Egresados.xlsx");
        write_workbook(&path);

        let rows = GraduateReader::new(&path).load().unwrap();
        assert_eq!(rows.len(), 3);

        let mut expected = clean_row();
        expected.rut = "12345678".to_string();
        assert_eq!(rows[0], expected);

        assert_eq!(rows[1].rut, "9.876.543-2");
        assert_eq!(rows[1].graduation_date, Some(date(2018, 5, 4)));
        assert!(rows[1].work_current);
        assert_eq!(rows[1].country, MISSING_TEXT);
        assert_eq!(rows[1].job_start_date, None);

        assert_eq!(rows[2].career, MISSING_TEXT);
        assert_eq!(rows[2].graduation_date, None);
        assert!(!rows[2].work_current);
    }

    #[test]
    fn test_corrupt_workbook_is_source_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grads.xlsx");
        fs::write(&path, b"garbage").unwrap();

        let reader = GraduateReader::new(&path);
        let err = reader.rows().unwrap_err();

        assert!(matches!(err, MetisError::Source(_)));
        assert_eq!(reader.state(), CacheState::Cold);
    }

    #[test]
    fn test_graduate_row_json_shape() {
        let json = serde_json::to_value(clean_row()).unwrap();
        assert_eq!(json["rut"], "12.345.678-9");
        assert_eq!(json["graduation_date"], "2019-12-20");
        assert_eq!(json["work_current"], true);
        assert_eq!(json["job_start_date"], "2020-03-01");

        let mut no_dates = clean_row();
        no_dates.graduation_date = None;
        let json = serde_json::to_value(no_dates).unwrap();
        assert!(json["graduation_date"].is_null());
    }
}
