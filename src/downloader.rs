#![cfg(not(tarpaulin_include))]

#[cfg(feature = "xlsx")]
use crate::aggregate::Pivot;
use crate::error::{DashboardError, Result};
use crate::record::Dataset;
use log::info;

/// Convert a dataset to CSV format
///
/// Produces UTF-8, comma-separated bytes with a header row holding the
/// dataset's column names. Values are written in their display form (dates
/// as `YYYY-MM-DD`, integral numbers without decimals); quoting of commas,
/// quotes and newlines is handled by the writer.
///
/// # Arguments
/// * `dataset` - The filtered or edited records to export
///
/// # Returns
/// * `Result<Vec<u8>>` - CSV content as bytes or an error
///
/// # Examples
/// ```
/// use findings_dashboard::loader::from_csv;
/// use findings_dashboard::{config::PipelineConfig, dates, downloader::to_csv, schema};
///
/// let config = PipelineConfig::default();
/// let table = from_csv(b"Area,Finding category,Finding Status\nLab,NC,Open\n").unwrap();
/// let table = schema::validate(table, &config.required_columns).unwrap();
/// let (dataset, _) = dates::normalize(table, &config);
///
/// let csv = to_csv(&dataset).unwrap();
/// assert_eq!(String::from_utf8(csv).unwrap(), "Area,Finding category,Finding Status\nLab,NC,Open\n");
/// ```
pub fn to_csv(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    // Add header row
    writer.write_record(&dataset.columns).map_err(csv_write_error)?;

    // Add data rows; the writer quotes commas, quotes and newlines
    for record in &dataset.records {
        let cells: Vec<String> = dataset
            .row_values(record)
            .iter()
            .map(|v| v.to_string())
            .collect();
        writer.write_record(&cells).map_err(csv_write_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Export(e.to_string()))?;
    info!("exported {} records as CSV ({} bytes)", dataset.len(), bytes.len());
    Ok(bytes)
}

fn csv_write_error(err: csv::Error) -> DashboardError {
    DashboardError::Export(format!("CSV write error: {}", err))
}

/// Excel row and column limits.
#[cfg(feature = "xlsx")]
const MAX_XLSX_ROWS: usize = 1_048_576;
#[cfg(feature = "xlsx")]
const MAX_XLSX_COLS: usize = 16_384;

#[cfg(feature = "xlsx")]
fn check_bounds(rows: usize, cols: usize) -> Result<()> {
    if rows > MAX_XLSX_ROWS || cols > MAX_XLSX_COLS {
        return Err(DashboardError::Export(format!(
            "{} rows x {} columns does not fit in a worksheet",
            rows, cols
        )));
    }
    Ok(())
}

/// Convert a dataset to XLSX format
///
/// Writes the records to a `Data` sheet. When `summary` is given, a second
/// `Summary` sheet holds the pivot: categories down the rows, statuses
/// across, counts in the cells (zero where a combination never occurs) and
/// a row total at the end.
///
/// # Arguments
/// * `dataset` - The edited or filtered records to export
/// * `summary` - Optional category × status pivot
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content as bytes or an error
#[cfg(feature = "xlsx")]
pub fn to_xlsx(dataset: &Dataset, summary: Option<&Pivot>) -> Result<Vec<u8>> {
    use crate::value::Value;
    use rust_xlsxwriter::{Workbook, Worksheet};

    check_bounds(dataset.len() + 1, dataset.columns.len())?;

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name("Data")?;

    // Add header row
    for (c, column) in dataset.columns.iter().enumerate() {
        worksheet.write_string(0, c as u16, column.as_str())?;
    }

    // Write cell data, keeping numbers and booleans typed
    for (r, record) in dataset.records.iter().enumerate() {
        let row = (r + 1) as u32;
        for (c, value) in dataset.row_values(record).iter().enumerate() {
            let col = c as u16;
            match value {
                Value::Empty => {}
                Value::Number(n) => {
                    worksheet.write_number(row, col, *n)?;
                }
                Value::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                Value::Text(_) | Value::Date(_) => {
                    worksheet.write_string(row, col, value.to_string().as_str())?;
                }
            }
        }
    }
    workbook.push_worksheet(worksheet);

    if let Some(pivot) = summary {
        workbook.push_worksheet(summary_sheet(pivot)?);
    }

    let buffer = workbook.save_to_buffer()?;
    info!(
        "exported {} records as XLSX ({} bytes, summary sheet: {})",
        dataset.len(),
        buffer.len(),
        summary.is_some()
    );
    Ok(buffer)
}

#[cfg(feature = "xlsx")]
fn summary_sheet(pivot: &Pivot) -> Result<rust_xlsxwriter::Worksheet> {
    use rust_xlsxwriter::Worksheet;

    check_bounds(pivot.rows.len() + 1, pivot.columns.len() + 2)?;

    let mut worksheet = Worksheet::new();
    worksheet.set_name("Summary")?;

    worksheet.write_string(0, 0, "Category")?;
    for (c, status) in pivot.columns.iter().enumerate() {
        worksheet.write_string(0, (c + 1) as u16, status.as_str())?;
    }
    let total_col = (pivot.columns.len() + 1) as u16;
    worksheet.write_string(0, total_col, "Total")?;

    // One row per category, zero where a status never occurs
    for (r, category) in pivot.rows.iter().enumerate() {
        let row = (r + 1) as u32;
        worksheet.write_string(row, 0, category.as_str())?;
        for (c, count) in pivot.counts[r].iter().enumerate() {
            worksheet.write_number(row, (c + 1) as u16, *count as f64)?;
        }
        worksheet.write_number(row, total_col, pivot.row_total(r) as f64)?;
    }

    Ok(worksheet)
}
