use crate::config::PipelineConfig;
use crate::loader::Table;
use crate::record::{Dataset, Record};
use crate::value::Value;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

lazy_static! {
    static ref ISO_DATE_REGEX: Regex =
        Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ].*)?$").unwrap();
}

/// Day-first and long-form layouts seen in hand-typed audit sheets.
const TEXT_DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];

/// Largest serial Excel can display (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Parses a date typed as text. Returns `None` for anything unrecognized.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use findings_dashboard::dates::parse_date_text;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
/// assert_eq!(parse_date_text("2024-03-15"), expected);
/// assert_eq!(parse_date_text("2024-03-15 00:00:00"), expected);
/// assert_eq!(parse_date_text("15/03/2024"), expected);
/// assert_eq!(parse_date_text("not a date"), None);
/// ```
pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DATE_REGEX.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    TEXT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Converts an Excel serial day number (1900 date system) to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Interprets any cell as a date, tolerating failure.
pub fn to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        // Serials pasted into a CSV arrive as text
        Value::Text(s) => parse_date_text(s).or_else(|| {
            s.trim().parse::<f64>().ok().and_then(excel_serial_to_date)
        }),
        Value::Number(n) => excel_serial_to_date(*n),
        Value::Empty | Value::Bool(_) => None,
    }
}

/// What to do with a record's status once its closing date is known.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StatusPolicy {
    /// Keep whatever the sheet says.
    Stored,
    /// A record with a closing date is closed, whatever the sheet says.
    CloseWhenClosed { label: String },
}

/// Outcome of normalizing one upload.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NormalizeReport {
    /// Non-blank cells per column that could not be read as dates.
    pub unparsed: BTreeMap<String, usize>,
    /// Records whose stored status was replaced by the closed label.
    pub status_overrides: usize,
}

impl NormalizeReport {
    pub fn unparsed_total(&self) -> usize {
        self.unparsed.values().sum()
    }
}

/// Turns a validated table into typed records.
///
/// Mapped date columns and the configured extra date columns are parsed;
/// unreadable cells become "no value" and are counted in the report. The
/// status policy is applied last, so a closing date always wins over the
/// stored status when derivation is on.
pub fn normalize(table: Table, config: &PipelineConfig) -> (Dataset, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let policy = config.status_policy();
    let mapping = &config.mapping;

    let mut records = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let mut record = Record::default();

        for (column, cell) in table.columns.iter().zip(row.iter()) {
            match mapping.field_for(column) {
                Some(field) if field.is_date() => {
                    let parsed = to_date(cell);
                    if parsed.is_none() && !cell.is_empty() {
                        *report.unparsed.entry(column.clone()).or_insert(0) += 1;
                    }
                    record.set_date(field, parsed);
                }
                Some(field) => {
                    if !record.set_field(field, cell) {
                        record.extra.insert(column.clone(), cell.clone());
                    }
                }
                None if config.date_columns.contains(column) => {
                    let parsed = to_date(cell);
                    if parsed.is_none() && !cell.is_empty() {
                        *report.unparsed.entry(column.clone()).or_insert(0) += 1;
                    }
                    record.extra.insert(column.clone(), Value::from(parsed));
                }
                None => {
                    record.extra.insert(column.clone(), cell.clone());
                }
            }
        }

        if apply_status_policy(&mut record, &policy) {
            report.status_overrides += 1;
        }
        records.push(record);
    }

    for (column, count) in &report.unparsed {
        warn!("{} unreadable date cells in column '{}' treated as blank", count, column);
    }
    info!(
        "normalized {} records ({} statuses derived from closing dates)",
        records.len(),
        report.status_overrides
    );

    let dataset = Dataset::new(table.columns, mapping.clone(), records);
    (dataset, report)
}

/// Applies the status policy to one record. Returns `true` when the stored
/// status was changed.
pub fn apply_status_policy(record: &mut Record, policy: &StatusPolicy) -> bool {
    match policy {
        StatusPolicy::Stored => false,
        StatusPolicy::CloseWhenClosed { label } => {
            if record.closing_date.is_none() {
                return false;
            }
            let changed = record.status.as_deref() != Some(label.as_str());
            record.status = Some(label.clone());
            changed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_layouts() {
        assert_eq!(parse_date_text("2024-1-5"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text("2024-01-05T08:30:00"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text("05-01-2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text("5 January 2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date_text("05/01/2024 14:00"), Some(ymd(2024, 1, 5)));
    }

    #[test]
    fn rejects_impossible_dates() {
        assert_eq!(parse_date_text("2024-02-30"), None);
        assert_eq!(parse_date_text("31/31/2024"), None);
        assert_eq!(parse_date_text("TBD"), None);
    }

    #[test]
    fn converts_excel_serials() {
        assert_eq!(excel_serial_to_date(45292.0), Some(ymd(2024, 1, 1)));
        assert_eq!(excel_serial_to_date(45292.75), Some(ymd(2024, 1, 1)));
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(excel_serial_to_date(-3.0), None);
        assert_eq!(to_date(&Value::from_text("45292")), Some(ymd(2024, 1, 1)));
        assert_eq!(to_date(&Value::from_text("0")), None);
    }

    #[test]
    fn closing_date_forces_closed_status() {
        let policy = StatusPolicy::CloseWhenClosed { label: "Close".to_string() };

        let mut closed = Record {
            status: Some("Open".to_string()),
            closing_date: Some(ymd(2024, 2, 1)),
            ..Record::default()
        };
        assert!(apply_status_policy(&mut closed, &policy));
        assert_eq!(closed.status.as_deref(), Some("Close"));

        let mut open = Record {
            status: Some("Open".to_string()),
            ..Record::default()
        };
        assert!(!apply_status_policy(&mut open, &policy));
        assert_eq!(open.status.as_deref(), Some("Open"));

        let mut kept = Record {
            status: Some("Open".to_string()),
            closing_date: Some(ymd(2024, 2, 1)),
            ..Record::default()
        };
        assert!(!apply_status_policy(&mut kept, &StatusPolicy::Stored));
        assert_eq!(kept.status.as_deref(), Some("Open"));
    }
}
