#![cfg(not(tarpaulin_include))]

use crate::error::{DashboardError, Result};
use crate::schema::normalize_columns;
use crate::value::Value;
use log::info;
use std::path::Path;

/// Raw tabular content of one upload, before any schema is applied.
///
/// Column names are already whitespace-normalized and unique.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Builds a table from header names and rows, normalizing the header and
    /// padding or truncating each row to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let columns = normalize_columns(&columns);
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Empty);
                row
            })
            .collect();
        Table { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Upload formats the loader understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Csv,
    Xlsx,
}

impl Format {
    /// Detects the format from a file extension.
    ///
    /// # Examples
    /// ```
    /// use findings_dashboard::loader::Format;
    ///
    /// assert_eq!(Format::from_path("recap.XLSX").unwrap(), Format::Xlsx);
    /// assert!(Format::from_path("notes.txt").is_err());
    /// ```
    pub fn from_path(filepath: impl AsRef<Path>) -> Result<Self> {
        let extension = filepath
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(Format::Csv),
            Some("xlsx") | Some("xlsm") => Ok(Format::Xlsx),
            Some(ext) => Err(DashboardError::Load(format!(
                "Unsupported file extension: {}",
                ext
            ))),
            None => Err(DashboardError::Load("File has no extension".into())),
        }
    }
}

/// Load a table from CSV bytes
///
/// The first record is the header row. Rows shorter than the header are
/// padded with empty cells, longer rows are cut to the header width.
///
/// # Arguments
/// * `bytes` - UTF-8 comma-separated content
///
/// # Returns
/// * `Result<Table>` - The loaded table or a load failure
///
/// # Examples
/// ```
/// use findings_dashboard::loader::from_csv;
///
/// let table = from_csv(b" Area ,Finding Status\nWarehouse,Open\n").unwrap();
/// assert_eq!(table.columns, vec!["Area", "Finding Status"]);
/// assert_eq!(table.rows.len(), 1);
/// ```
pub fn from_csv(bytes: &[u8]) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    // Header row
    let headers: Vec<String> = reader
        .headers()
        .map_err(unreadable_csv)?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(DashboardError::Load("CSV file is empty".into()));
    }

    // Data rows, cells kept as typed
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(unreadable_csv)?;
        rows.push(record.iter().map(Value::from_text).collect());
    }

    Ok(Table::new(headers, rows))
}

fn unreadable_csv(err: csv::Error) -> DashboardError {
    DashboardError::Load(format!("unreadable CSV file: {}", err))
}

/// Load a table from Excel (XLSX) bytes
///
/// Reads the named sheet, or the first sheet when `sheet` is `None`. The
/// first row of the sheet's used range is the header row. Excel dates are
/// kept as dates; formulas contribute their cached value.
///
/// # Arguments
/// * `bytes` - Workbook content
/// * `sheet` - Optional sheet name
///
/// # Returns
/// * `Result<Table>` - The loaded table or a load failure
#[cfg(feature = "xlsx")]
pub fn from_excel(bytes: &[u8], sheet: Option<&str>) -> Result<Table> {
    use calamine::{Reader, Xlsx};
    use std::io::Cursor;

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let sheet_names = workbook.sheet_names();

    // Pick the requested sheet, or the first one
    let sheet_name = match sheet {
        Some(name) if sheet_names.iter().any(|n| n == name) => name.to_string(),
        Some(name) => {
            return Err(DashboardError::Load(format!(
                "Worksheet named '{}' not found",
                name
            )));
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| DashboardError::Load("No sheets found in Excel file".into()))?,
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    // First row of the used range is the header
    let header = rows
        .next()
        .ok_or_else(|| DashboardError::Load("Excel sheet is empty".into()))?;
    let columns: Vec<String> = header.iter().map(|c| excel_value(c).to_string()).collect();

    let data = rows
        .map(|row| row.iter().map(excel_value).collect())
        .collect();

    Ok(Table::new(columns, data))
}

#[cfg(feature = "xlsx")]
fn excel_value(cell: &calamine::Data) -> Value {
    use calamine::Data;

    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) if s.trim().is_empty() => Value::Empty,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => Value::Date(datetime.date()),
            None => Value::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match crate::dates::parse_date_text(s) {
            Some(date) => Value::Date(date),
            None => Value::Text(s.clone()),
        },
        Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(e) => Value::Text(format!("#{:?}", e)),
    }
}

/// Load a table from in-memory bytes of a known format
pub fn load_bytes(bytes: &[u8], format: Format, sheet: Option<&str>) -> Result<Table> {
    let table = match format {
        Format::Csv => from_csv(bytes)?,
        #[cfg(feature = "xlsx")]
        Format::Xlsx => from_excel(bytes, sheet)?,
        #[cfg(not(feature = "xlsx"))]
        Format::Xlsx => {
            let _ = sheet;
            return Err(DashboardError::Load(
                "Excel support requires the 'xlsx' feature".into(),
            ));
        }
    };

    info!(
        "loaded {} rows across {} columns",
        table.rows.len(),
        table.columns.len()
    );
    Ok(table)
}

/// Detect file type and load appropriate format
///
/// # Examples
/// ```no_run
/// use findings_dashboard::loader::load_table;
///
/// match load_table("findings.xlsx", None) {
///     Ok(table) => println!("Loaded {} rows", table.rows.len()),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn load_table(filepath: impl AsRef<Path>, sheet: Option<&str>) -> Result<Table> {
    let path = filepath.as_ref();
    let format = Format::from_path(path)?;
    let bytes = std::fs::read(path)
        .map_err(|e| DashboardError::Load(format!("cannot read {}: {}", path.display(), e)))?;
    load_bytes(&bytes, format, sheet)
}
