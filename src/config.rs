use crate::dates::StatusPolicy;
use crate::error::{DashboardError, Result};
use crate::filter::MissingDatePolicy;
use crate::schema::{ColumnMapping, Field, normalize_column_name};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Dashboard variants that ship with a ready-made configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// DATE / AMOUNT cost sheet plotted as a line over time
    CostLedger,
    /// Finding recap with category, status and area, shown as a flow diagram
    FindingRecap,
    /// Full ISO follow-up sheet with due and closing dates
    IsoMonitoring,
}

impl FromStr for Variant {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cost-ledger" => Ok(Variant::CostLedger),
            "finding-recap" => Ok(Variant::FindingRecap),
            "iso-monitoring" => Ok(Variant::IsoMonitoring),
            other => Err(DashboardError::Config(format!("unknown variant '{}'", other))),
        }
    }
}

/// Which chart the dashboard draws next to the grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ChartKind {
    /// Area → category → status flow diagram
    Flow,
    /// Stacked horizontal bars per category, one series per status
    Tornado,
    /// Numeric column plotted against a date column
    Line { date: String, value: String },
}

/// Session-scoped settings for one dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mapping: ColumnMapping,
    pub required_columns: Vec<String>,
    /// Unmapped columns that should still be read as dates.
    pub date_columns: Vec<String>,
    /// Sheet to read from a workbook; the first sheet when unset.
    pub sheet: Option<String>,
    pub derive_closed_status: bool,
    pub closed_status: String,
    pub open_status: String,
    pub missing_dates: MissingDatePolicy,
    pub headline_categories: Vec<String>,
    pub chart: ChartKind,
    pub summary_sheet: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::preset(Variant::FindingRecap)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PipelineConfig {
    pub fn preset(variant: Variant) -> Self {
        let base = PipelineConfig {
            mapping: ColumnMapping::default(),
            required_columns: Vec::new(),
            date_columns: Vec::new(),
            sheet: None,
            derive_closed_status: false,
            closed_status: "Close".to_string(),
            open_status: "Open".to_string(),
            missing_dates: MissingDatePolicy::Include,
            headline_categories: strings(&["NC", "OB", "OFI"]),
            chart: ChartKind::Flow,
            summary_sheet: false,
        };

        match variant {
            Variant::CostLedger => PipelineConfig {
                required_columns: strings(&["DATE", "AMOUNT"]),
                date_columns: strings(&["DATE"]),
                headline_categories: Vec::new(),
                chart: ChartKind::Line {
                    date: "DATE".to_string(),
                    value: "AMOUNT".to_string(),
                },
                ..base
            },
            Variant::FindingRecap => PipelineConfig {
                mapping: ColumnMapping::new(&[
                    (Field::Category, "Finding category"),
                    (Field::Status, "Finding Status"),
                    (Field::Area, "Area"),
                ]),
                required_columns: strings(&["Finding category", "Finding Status", "Area"]),
                ..base
            },
            Variant::IsoMonitoring => PipelineConfig {
                mapping: ColumnMapping::new(&[
                    (Field::Id, "No"),
                    (Field::Area, "Area"),
                    (Field::Category, "Finding Category"),
                    (Field::Standard, "Standard"),
                    (Field::Description, "Finding"),
                    (Field::Evidence, "Evidence"),
                    (Field::Status, "Finding Status"),
                    (Field::DueDate, "Due Date"),
                    (Field::ClosingDate, "Tgl Closing"),
                ]),
                required_columns: strings(&[
                    "Area",
                    "Finding Category",
                    "Finding Status",
                    "Due Date",
                    "Tgl Closing",
                ]),
                derive_closed_status: true,
                chart: ChartKind::Tornado,
                summary_sheet: true,
                ..base
            },
        }
    }

    /// Reads a configuration from a JSON file. Missing keys fall back to the
    /// finding-recap defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let mut config: PipelineConfig = serde_json::from_str(text)?;
        config.normalize_names();
        config.check()?;
        Ok(config)
    }

    /// Trims configured column names the same way uploaded headers are.
    pub fn normalize_names(&mut self) {
        for column in self.mapping.0.values_mut() {
            *column = normalize_column_name(column);
        }
        for column in self.required_columns.iter_mut().chain(self.date_columns.iter_mut()) {
            *column = normalize_column_name(column);
        }
    }

    /// Rejects settings that cannot work together.
    pub fn check(&self) -> Result<()> {
        if self.derive_closed_status {
            if self.mapping.column(Field::ClosingDate).is_none() {
                return Err(DashboardError::Config(
                    "status derivation needs a closing date column".into(),
                ));
            }
            if self.closed_status.trim().is_empty() {
                return Err(DashboardError::Config("closed status label is empty".into()));
            }
        }
        if let ChartKind::Line { date, value } = &self.chart {
            if date.trim().is_empty() || value.trim().is_empty() {
                return Err(DashboardError::Config("line chart needs two column names".into()));
            }
        }
        Ok(())
    }

    pub fn status_policy(&self) -> StatusPolicy {
        if self.derive_closed_status {
            StatusPolicy::CloseWhenClosed {
                label: self.closed_status.clone(),
            }
        } else {
            StatusPolicy::Stored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = PipelineConfig::from_json_str(
            r#"{ "required_columns": ["Area"], "missing_dates": "exclude" }"#,
        )
        .unwrap();
        assert_eq!(config.required_columns, vec!["Area"]);
        assert_eq!(config.missing_dates, MissingDatePolicy::Exclude);
        assert_eq!(config.closed_status, "Close");
        assert_eq!(config.mapping.column(Field::Area), Some("Area"));
    }

    #[test]
    fn mapping_reads_field_keys() {
        let config = PipelineConfig::from_json_str(
            r#"{ "mapping": { "category": " category ", "closing_date": "Closed On" },
                 "derive_closed_status": true }"#,
        )
        .unwrap();
        assert_eq!(config.mapping.column(Field::Category), Some("category"));
        assert_eq!(config.mapping.column(Field::ClosingDate), Some("Closed On"));
    }

    #[test]
    fn derivation_without_closing_column_is_rejected() {
        let err = PipelineConfig::from_json_str(r#"{ "derive_closed_status": true }"#);
        assert!(matches!(err, Err(DashboardError::Config(_))));
    }

    #[test]
    fn variants_parse_from_names() {
        assert_eq!("iso-monitoring".parse::<Variant>().unwrap(), Variant::IsoMonitoring);
        assert!("dashboard".parse::<Variant>().is_err());
    }
}
