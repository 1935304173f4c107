//! Spreadsheet export discovery and loading.
//!
//! The harvest sheet is exported (or mirrored by a sync job) as CSV or as a
//! JSON array of row objects. Readers turn those files into [`SheetRow`]s
//! keyed by trimmed header labels; they know nothing about harvest semantics.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use harvest_core::error::{HarvestError, Result};
use harvest_core::models::{CellValue, SheetRow};
use serde::Serialize;
use tracing::{debug, warn};

// ── RecordSource ──────────────────────────────────────────────────────────────

/// Lightweight description of a data source for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceMeta {
    /// Path or other human-readable location of the source.
    pub location: String,
    /// Header labels of the first readable export.
    pub headers: Vec<String>,
    /// Number of data rows across all exports.
    pub rows_count: usize,
    /// Number of export files backing the source.
    pub files: usize,
}

/// Anything that can hand over the raw rows of the harvest sheet.
pub trait RecordSource: Send + Sync {
    /// Read every row of the sheet.
    fn fetch_rows(&self) -> Result<Vec<SheetRow>>;

    /// Describe the source (headers, row count) for diagnostics.
    fn describe(&self) -> Result<SourceMeta>;
}

/// File format of a sheet export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" | "tsv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    /// Resolve a `--format` value (`auto`, `csv`, `json`) for `path`.
    pub fn resolve(name: &str, path: &Path) -> Result<Self> {
        match name {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "auto" => Self::from_path(path).ok_or_else(|| {
                HarvestError::UnsupportedFormat(
                    path.extension()
                        .map(|e| e.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string()),
                )
            }),
            other => Err(HarvestError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Open the source at `path`: a single export file or a directory of them.
pub fn open_source(path: &Path, format: &str) -> Result<Box<dyn RecordSource>> {
    if !path.exists() {
        return Err(HarvestError::SourceNotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        return Ok(Box::new(DirectorySource::new(path)));
    }
    let format = ExportFormat::resolve(format, path)?;
    Ok(Box::new(FileSource::new(path, format)))
}

// ── FileSource ────────────────────────────────────────────────────────────────

/// A single CSV or JSON export file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: ExportFormat,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

impl RecordSource for FileSource {
    fn fetch_rows(&self) -> Result<Vec<SheetRow>> {
        read_export(&self.path, self.format)
    }

    fn describe(&self) -> Result<SourceMeta> {
        let rows = self.fetch_rows()?;
        Ok(SourceMeta {
            location: self.path.display().to_string(),
            headers: read_headers(&self.path, self.format, &rows)?,
            rows_count: rows.len(),
            files: 1,
        })
    }
}

// ── DirectorySource ───────────────────────────────────────────────────────────

/// Every CSV/JSON export found recursively under a directory, read in path
/// order and concatenated.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl RecordSource for DirectorySource {
    fn fetch_rows(&self) -> Result<Vec<SheetRow>> {
        let files = find_export_files(&self.root);
        if files.is_empty() {
            warn!("No sheet exports found in {}", self.root.display());
            return Ok(Vec::new());
        }

        let mut all_rows = Vec::new();
        for file in &files {
            let Some(format) = ExportFormat::from_path(file) else {
                continue;
            };
            match read_export(file, format) {
                Ok(rows) => all_rows.extend(rows),
                Err(e) => warn!("Skipping unreadable export {}: {}", file.display(), e),
            }
        }

        debug!(
            "Read {} rows from {} exports under {}",
            all_rows.len(),
            files.len(),
            self.root.display()
        );
        Ok(all_rows)
    }

    fn describe(&self) -> Result<SourceMeta> {
        let files = find_export_files(&self.root);
        let mut meta = SourceMeta {
            location: self.root.display().to_string(),
            files: files.len(),
            ..Default::default()
        };

        for file in &files {
            let Some(format) = ExportFormat::from_path(file) else {
                continue;
            };
            let Ok(rows) = read_export(file, format) else {
                continue;
            };
            if meta.headers.is_empty() {
                meta.headers = read_headers(file, format, &rows)?;
            }
            meta.rows_count += rows.len();
        }

        Ok(meta)
    }
}

// ── MemorySource ──────────────────────────────────────────────────────────────

/// Rows held in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<SheetRow>,
}

impl MemorySource {
    pub fn new(rows: Vec<SheetRow>) -> Self {
        Self { rows }
    }
}

impl RecordSource for MemorySource {
    fn fetch_rows(&self) -> Result<Vec<SheetRow>> {
        Ok(self.rows.clone())
    }

    fn describe(&self) -> Result<SourceMeta> {
        let mut headers: Vec<String> = self
            .rows
            .iter()
            .flat_map(|r| r.keys().cloned())
            .collect();
        headers.sort();
        headers.dedup();
        Ok(SourceMeta {
            location: "memory".to_string(),
            headers,
            rows_count: self.rows.len(),
            files: 0,
        })
    }
}

// ── Readers ───────────────────────────────────────────────────────────────────

/// Find all CSV/JSON exports recursively under `dir`, sorted by path.
pub fn find_export_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Data path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file() && ExportFormat::from_path(entry.path()).is_some()
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Read one export file in the given format.
pub fn read_export(path: &Path, format: ExportFormat) -> Result<Vec<SheetRow>> {
    match format {
        ExportFormat::Csv => read_csv_rows(path),
        ExportFormat::Json => read_json_rows(path),
    }
}

/// Read a CSV export whose first row holds the headers.
///
/// Columns with a blank header and rows with no content are dropped. Short
/// rows are tolerated; missing trailing cells are simply absent. When two
/// columns share a header the rightmost one wins.
pub fn read_csv_rows(path: &Path) -> Result<Vec<SheetRow>> {
    let mut reader = csv_reader(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_key).collect();
    let duplicates = duplicate_headers(&headers);
    if !duplicates.is_empty() {
        warn!(
            "CSV {}: duplicate headers {:?}; the rightmost column wins",
            path.display(),
            duplicates
        );
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let row: SheetRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, value)| (header.clone(), CellValue::from_text(value.trim())))
            .collect();

        if row.values().all(CellValue::is_empty) {
            skipped += 1;
            continue;
        }
        rows.push(row);
    }

    debug!(
        "CSV {}: {} rows read, {} blank rows skipped",
        path.display(),
        rows.len(),
        skipped
    );
    Ok(rows)
}

/// Read a JSON export: an array of objects, one per sheet row.
pub fn read_json_rows(path: &Path) -> Result<Vec<SheetRow>> {
    let file = open_file(path)?;
    let raw: Vec<SheetRow> = serde_json::from_reader(BufReader::new(file))?;

    let rows: Vec<SheetRow> = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(k, v)| (normalize_key(&k), v))
                .filter(|(k, _)| !k.is_empty())
                .collect()
        })
        .collect();

    debug!("JSON {}: {} rows read", path.display(), rows.len());
    Ok(rows)
}

/// Field delimiter for a delimited export: tab for `.tsv`, comma otherwise.
fn delimiter_for(path: &Path) -> u8 {
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("tsv")) {
        b'\t'
    } else {
        b','
    }
}

fn csv_reader(path: &Path) -> Result<csv::Reader<File>> {
    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .delimiter(delimiter_for(path))
        .from_reader(open_file(path)?))
}

/// Non-blank header labels that occur more than once, in first-seen order.
fn duplicate_headers(headers: &[String]) -> Vec<String> {
    let mut duplicates: Vec<String> = Vec::new();
    for (i, header) in headers.iter().enumerate() {
        if !header.is_empty() && headers[..i].contains(header) && !duplicates.contains(header) {
            duplicates.push(header.clone());
        }
    }
    duplicates
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| HarvestError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Header labels in sheet order for CSV, sorted key union for JSON.
fn read_headers(path: &Path, format: ExportFormat, rows: &[SheetRow]) -> Result<Vec<String>> {
    match format {
        ExportFormat::Csv => {
            let mut reader = csv_reader(path)?;
            Ok(reader
                .headers()?
                .iter()
                .map(normalize_key)
                .filter(|h| !h.is_empty())
                .collect())
        }
        ExportFormat::Json => {
            let mut headers: Vec<String> = rows.iter().flat_map(|r| r.keys().cloned()).collect();
            headers.sort();
            headers.dedup();
            Ok(headers)
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().trim_start_matches('\u{FEFF}').trim().to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    const CSV: &str = "Tanggal , Seksi,Nama Pemanen,Jumlah Janjang\n\
                       10/08/2025,A III,Agus,12\n\
                       ,,,\n\
                       10/09/2025,C II,Sari,\"1,234\"\n";

    // ── CSV ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_read_csv_rows_trims_headers_and_skips_blank_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "panen.csv", CSV);

        let rows = read_csv_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Tanggal"), Some(&CellValue::Text("10/08/2025".into())));
        assert_eq!(rows[0].get("Seksi"), Some(&CellValue::Text("A III".into())));
        assert_eq!(rows[1].get("Jumlah Janjang"), Some(&CellValue::Text("1,234".into())));
    }

    #[test]
    fn test_read_csv_rows_short_row_tolerated() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "short.csv", "Tanggal,Seksi,Nama Pemanen\n2025-01-02,B III\n");

        let rows = read_csv_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].get("Nama Pemanen").is_none());
    }

    #[test]
    fn test_read_csv_rows_missing_file() {
        let err = read_csv_rows(Path::new("/tmp/does-not-exist-harvest.csv")).unwrap_err();
        assert!(matches!(err, HarvestError::FileRead { .. }));
    }

    // ── JSON ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_read_json_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            dir.path(),
            "panen.json",
            r#"[{" Tanggal ": "2025-10-08", "Seksi": "A III", "Nama Pemanen": "Agus", "Jumlah Janjang": 12},
                {"Tanggal": "2025-10-08", "Seksi": "A III", "Nama Pemanen": null, "Jumlah Janjang": ""}]"#,
        );

        let rows = read_json_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Tanggal"), Some(&CellValue::Text("2025-10-08".into())));
        assert_eq!(rows[0].get("Jumlah Janjang"), Some(&CellValue::Number(12.0)));
        assert_eq!(rows[1].get("Nama Pemanen"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_read_json_rows_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "bad.json", "{not json");
        let err = read_json_rows(&path).unwrap_err();
        assert!(matches!(err, HarvestError::JsonParse(_)));
    }

    // ── Formats / open_source ─────────────────────────────────────────────────

    #[test]
    fn test_export_format_resolution() {
        assert_eq!(ExportFormat::from_path(Path::new("a.CSV")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("a.json")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path(Path::new("a.xlsx")), None);
        assert_eq!(
            ExportFormat::resolve("json", Path::new("export.txt")).unwrap(),
            ExportFormat::Json
        );
        assert!(matches!(
            ExportFormat::resolve("auto", Path::new("export.xlsx")),
            Err(HarvestError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn test_open_source_missing_path() {
        let result = open_source(Path::new("/tmp/no-such-harvest-export"), "auto");
        assert!(matches!(result, Err(HarvestError::SourceNotFound(_))));
    }

    #[test]
    fn test_open_source_file_describe() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "panen.csv", CSV);

        let source = open_source(&path, "auto").unwrap();
        let meta = source.describe().unwrap();
        assert_eq!(
            meta.headers,
            vec!["Tanggal", "Seksi", "Nama Pemanen", "Jumlah Janjang"]
        );
        assert_eq!(meta.rows_count, 2);
        assert_eq!(meta.files, 1);
    }

    #[test]
    fn test_open_source_tsv_describe_splits_headers() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            dir.path(),
            "panen.tsv",
            "Tanggal\tSeksi\tNama Pemanen\tJumlah Janjang\n\
             10/08/2025\tA III\tAgus\t12\n",
        );

        let source = open_source(&path, "auto").unwrap();
        let meta = source.describe().unwrap();
        assert_eq!(
            meta.headers,
            vec!["Tanggal", "Seksi", "Nama Pemanen", "Jumlah Janjang"]
        );
        assert_eq!(meta.rows_count, 1);
    }

    #[test]
    fn test_delimiter_for_extension() {
        assert_eq!(delimiter_for(Path::new("panen.tsv")), b'\t');
        assert_eq!(delimiter_for(Path::new("PANEN.TSV")), b'\t');
        assert_eq!(delimiter_for(Path::new("panen.csv")), b',');
    }

    #[test]
    fn test_duplicate_headers_rightmost_column_wins() {
        let headers: Vec<String> = ["Seksi", "Tanggal", "", "Seksi ", "", "Seksi"]
            .iter()
            .map(|h| normalize_key(h))
            .collect();
        assert_eq!(duplicate_headers(&headers), vec!["Seksi"]);

        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "dup.csv", "Seksi,Tanggal,Seksi\nA III,10/08/2025,C II\n");
        let rows = read_csv_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Seksi"], CellValue::Text("C II".to_string()));
    }

    // ── Directory ─────────────────────────────────────────────────────────────

    #[test]
    fn test_find_export_files_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("2025");
        std::fs::create_dir_all(&sub).unwrap();
        write_file(dir.path(), "b.csv", CSV);
        write_file(dir.path(), "a.json", "[]");
        write_file(dir.path(), "notes.txt", "ignore me");
        write_file(&sub, "c.csv", CSV);

        let files = find_export_files(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "2025/c.csv");
        assert_eq!(names[1], "a.json");
        assert_eq!(names[2], "b.csv");
    }

    #[test]
    fn test_directory_source_concatenates_and_skips_bad_files() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.csv", CSV);
        write_file(dir.path(), "b.json", "{broken");
        write_file(
            dir.path(),
            "c.json",
            r#"[{"Tanggal": "2025-10-10", "Seksi": "D I", "Nama Pemanen": "Udin", "Jumlah Janjang": 4}]"#,
        );

        let source = DirectorySource::new(dir.path());
        let rows = source.fetch_rows().unwrap();
        assert_eq!(rows.len(), 3);

        let meta = source.describe().unwrap();
        assert_eq!(meta.files, 3);
        assert_eq!(meta.rows_count, 3);
    }

    #[test]
    fn test_directory_source_empty() {
        let dir = TempDir::new().unwrap();
        let rows = DirectorySource::new(dir.path()).fetch_rows().unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_memory_source() {
        let mut row = SheetRow::new();
        row.insert("Seksi".to_string(), CellValue::Text("A III".into()));
        let source = MemorySource::new(vec![row]);

        assert_eq!(source.fetch_rows().unwrap().len(), 1);
        let meta = source.describe().unwrap();
        assert_eq!(meta.headers, vec!["Seksi"]);
        assert_eq!(meta.location, "memory");
    }
}
