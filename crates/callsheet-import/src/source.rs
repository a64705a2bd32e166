use crate::error::{ImportError, Result};
use crate::sheet::Sheet;
use callsheet_core::domain::CellValue;
use csv::ReaderBuilder;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A tabular input that yields named sheets.
pub trait SheetSource {
    fn source_name(&self) -> String;
    fn load_sheets(&self) -> Result<Vec<Sheet>>;
}

/// Picks a source by path shape: directory, `.json` workbook, or CSV file.
pub fn open_source(path: &Path, max_bytes: u64) -> Result<Box<dyn SheetSource>> {
    if path.is_dir() {
        return Ok(Box::new(CsvDirSource::new(path, max_bytes)));
    }
    if !path.exists() {
        return Err(ImportError::Parse(format!(
            "input not found: {}",
            path.display()
        )));
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => Ok(Box::new(JsonWorkbookSource::new(path, max_bytes))),
        Some("csv") | Some("tsv") | Some("txt") => Ok(Box::new(CsvFileSource::new(path, max_bytes))),
        _ => Err(ImportError::Parse(format!(
            "unsupported input type: {} (expected .csv, .json, or a directory of .csv files)",
            path.display()
        ))),
    }
}

/// One CSV file; the sheet takes the file stem as its name.
pub struct CsvFileSource {
    path: PathBuf,
    max_bytes: u64,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            path: path.into(),
            max_bytes,
        }
    }
}

impl SheetSource for CsvFileSource {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn load_sheets(&self) -> Result<Vec<Sheet>> {
        let bytes = read_limited(&self.path, self.max_bytes)?;
        let delimiter = delimiter_for(&self.path);
        Ok(vec![parse_csv(&sheet_name_for(&self.path), &bytes, delimiter)?])
    }
}

/// Every `*.csv` file of a directory, in file-name order, one sheet each.
pub struct CsvDirSource {
    dir: PathBuf,
    max_bytes: u64,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    fn csv_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if path.is_file() && is_csv {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl SheetSource for CsvDirSource {
    fn source_name(&self) -> String {
        self.dir.display().to_string()
    }

    fn load_sheets(&self) -> Result<Vec<Sheet>> {
        let files = self.csv_files()?;
        if files.is_empty() {
            return Err(ImportError::Parse(format!(
                "no .csv files in {}",
                self.dir.display()
            )));
        }

        let mut remaining = self.max_bytes;
        let mut sheets = Vec::with_capacity(files.len());
        for path in files {
            let size = fs::metadata(&path)?.len();
            if size > remaining {
                return Err(ImportError::InputTooLarge {
                    path: self.dir.clone(),
                    size: self.max_bytes - remaining + size,
                    limit: self.max_bytes,
                });
            }
            remaining -= size;
            let bytes = fs::read(&path)?;
            sheets.push(parse_csv(&sheet_name_for(&path), &bytes, b',')?);
        }
        Ok(sheets)
    }
}

/// `{"sheets": [{"name": ..., "headers": [...]?, "rows": [...]}]}`. Rows are
/// objects keyed by header or arrays of cells.
pub struct JsonWorkbookSource {
    path: PathBuf,
    max_bytes: u64,
}

impl JsonWorkbookSource {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            path: path.into(),
            max_bytes,
        }
    }
}

impl SheetSource for JsonWorkbookSource {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn load_sheets(&self) -> Result<Vec<Sheet>> {
        let bytes = read_limited(&self.path, self.max_bytes)?;
        parse_json_workbook(strip_bom(&bytes))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkbookFile {
    sheets: Vec<SheetFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SheetFile {
    name: String,
    #[serde(default)]
    headers: Option<Vec<String>>,
    #[serde(default)]
    rows: Vec<Value>,
}

pub fn parse_json_workbook(bytes: &[u8]) -> Result<Vec<Sheet>> {
    let workbook: WorkbookFile = serde_json::from_slice(bytes)?;
    workbook.sheets.into_iter().map(sheet_from_json).collect()
}

fn sheet_from_json(file: SheetFile) -> Result<Sheet> {
    let mut headers = file.headers.unwrap_or_default();
    // Object rows contribute any header not seen yet, in first-seen order.
    for row in &file.rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !headers.iter().any(|header| header == key) {
                    headers.push(key.clone());
                }
            }
        }
    }

    let mut sheet = Sheet::new(file.name.trim(), headers);
    for (index, row) in file.rows.into_iter().enumerate() {
        let cells = match row {
            Value::Array(values) => values.into_iter().map(cell_from_json).collect(),
            Value::Object(mut map) => sheet
                .headers
                .iter()
                .map(|header| map.remove(header).map(cell_from_json).unwrap_or_default())
                .collect(),
            other => {
                return Err(ImportError::Parse(format!(
                    "sheet {}: row {} is {}, expected an object or an array",
                    sheet.name,
                    index + 1,
                    json_type_name(&other)
                )))
            }
        };
        sheet.rows.push(cells);
    }
    Ok(sheet)
}

fn cell_from_json(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Number(number) => number.as_f64().map(CellValue::Number).unwrap_or_default(),
        Value::String(text) => CellValue::from(text.as_str()),
        Value::Bool(flag) => CellValue::text(flag.to_string()),
        other => CellValue::text(other.to_string()),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn parse_csv(name: &str, bytes: &[u8], delimiter: u8) -> Result<Sheet> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(strip_bom(bytes));

    let headers = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();
    let mut sheet = Sheet::new(name, headers);
    for record in reader.records() {
        let record = record?;
        sheet.rows.push(record.iter().map(CellValue::from).collect());
    }
    Ok(sheet)
}

fn read_limited(path: &Path, limit: u64) -> Result<Vec<u8>> {
    let size = fs::metadata(path)?.len();
    if size > limit {
        return Err(ImportError::InputTooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }
    Ok(fs::read(path)?)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

fn sheet_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().trim().to_string())
        .unwrap_or_default()
}

fn delimiter_for(path: &Path) -> u8 {
    let is_tsv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("txt"));
    if is_tsv {
        b'\t'
    } else {
        b','
    }
}

#[cfg(test)]
mod tests {
    use super::{open_source, parse_csv, parse_json_workbook};
    use crate::error::ImportError;
    use callsheet_core::domain::CellValue;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn csv_rows_keep_headers_and_blank_cells() {
        let data = "\u{feff}שם,טלפון\nדוגמה אחת,050-1234567\n,050-9999999\n";
        let sheet = parse_csv("תלמידים", data.as_bytes(), b',').expect("parse");
        assert_eq!(sheet.name, "תלמידים");
        assert_eq!(sheet.headers, vec!["שם", "טלפון"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1][0], CellValue::Empty);
    }

    #[test]
    fn ragged_csv_rows_are_accepted() {
        let data = "name,phone\nAda\nGrace,0501234567,extra\n";
        let sheet = parse_csv("s", data.as_bytes(), b',').expect("parse");
        assert_eq!(sheet.rows[0].len(), 1);
        assert_eq!(sheet.rows[1].len(), 3);
    }

    #[test]
    fn json_workbook_supports_object_and_array_rows() {
        let data = r#"{
            "sheets": [
                {"name": "A", "rows": [{"name": "Ada", "phone": 502171103}, {"phone": "050", "group": "g"}]},
                {"name": "B", "headers": ["name", "phone"], "rows": [["Grace", null]]}
            ]
        }"#;
        let sheets = parse_json_workbook(data.as_bytes()).expect("parse");
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].headers, vec!["name", "phone", "group"]);
        assert_eq!(sheets[0].rows[0][1], CellValue::Number(502171103.0));
        assert_eq!(sheets[0].rows[1][0], CellValue::Empty);
        assert_eq!(sheets[1].rows[0], vec![CellValue::from("Grace"), CellValue::Empty]);
    }

    #[test]
    fn json_workbook_rejects_scalar_rows() {
        let data = r#"{"sheets": [{"name": "A", "rows": [5]}]}"#;
        let err = parse_json_workbook(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ImportError::Parse(_)));
    }

    #[test]
    fn oversized_input_is_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("big.csv");
        fs::write(&path, "name,phone\nAda,0501234567\n").expect("write");
        let source = open_source(&path, 8).expect("open");
        let err = source.load_sheets().unwrap_err();
        assert!(matches!(err, ImportError::InputTooLarge { limit: 8, .. }));
    }

    #[test]
    fn directory_sources_read_csv_files_in_name_order() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join("b.csv"), "name,phone\n").expect("write");
        fs::write(temp.path().join("a.csv"), "name,phone\n").expect("write");
        fs::write(temp.path().join("notes.md"), "ignored").expect("write");

        let source = open_source(temp.path(), 1024).expect("open");
        let names: Vec<String> = source
            .load_sheets()
            .expect("load")
            .into_iter()
            .map(|sheet| sheet.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn tsv_and_txt_files_split_on_tabs() {
        let temp = TempDir::new().expect("tempdir");
        for file in ["donors.txt", "donors.tsv"] {
            let path = temp.path().join(file);
            fs::write(&path, "name\tphone\nAda Lovelace\t0501234567\n").expect("write");
            let sheets = open_source(&path, 1024)
                .expect("open")
                .load_sheets()
                .expect("load");
            assert_eq!(sheets[0].name, "donors");
            assert_eq!(sheets[0].headers, vec!["name", "phone"]);
            assert_eq!(sheets[0].rows[0][1], CellValue::from("0501234567"));
        }
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("contacts.xlsx");
        fs::write(&path, "binary").expect("write");
        assert!(matches!(open_source(&path, 1024), Err(ImportError::Parse(_))));
    }
}
