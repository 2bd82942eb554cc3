use crate::aggregate::{
    self, BarChart, BarLayout, FlowDiagram, GroupedCount, HeadlineTotals, HistogramBin,
    SeriesPoint,
};
use crate::config::{ChartKind, PipelineConfig};
use crate::dates::{self, NormalizeReport};
use crate::downloader;
use crate::error::Result;
use crate::filter::{self, FilterCriteria};
use crate::loader::{self, Format, Table};
use crate::record::{DateField, Dataset, Dimension};
use crate::schema::{self, Field};
use log::info;
use serde::Serialize;
use std::path::Path;

/// The configured chart, ready for the charting collaborator.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chart {
    Flow(FlowDiagram),
    Tornado(BarChart),
    Line { points: Vec<SeriesPoint> },
}

/// Everything the UI shell renders after one interaction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    pub records: Dataset,
    pub totals: HeadlineTotals,
    pub category_status: Vec<GroupedCount>,
    pub bars: BarChart,
    pub chart: Chart,
    /// Due dates per month; empty when the variant has no due date column.
    pub due_histogram: Vec<HistogramBin>,
}

/// Derives every chart input from an already filtered dataset.
pub fn build_view(filtered: Dataset, config: &PipelineConfig) -> DashboardView {
    let category_status =
        aggregate::count_by_pair(&filtered, Dimension::Category, Dimension::Status);
    let pivot = aggregate::Pivot::from_counts(&category_status);

    let chart = match &config.chart {
        ChartKind::Flow => Chart::Flow(aggregate::flow_diagram(
            &filtered,
            &config.open_status,
            &config.closed_status,
        )),
        ChartKind::Tornado => Chart::Tornado(aggregate::bar_chart(&pivot, BarLayout::Stacked)),
        ChartKind::Line { date, value } => Chart::Line {
            points: aggregate::time_series(&filtered, date, value),
        },
    };

    let due_histogram = if config.mapping.column(Field::DueDate).is_some() {
        aggregate::monthly_histogram(&filtered, DateField::Due)
    } else {
        Vec::new()
    };

    DashboardView {
        totals: aggregate::headline_totals(&filtered, &config.headline_categories),
        bars: aggregate::bar_chart(&pivot, BarLayout::Grouped),
        category_status,
        chart,
        due_histogram,
        records: filtered,
    }
}

/// State of one user's dashboard between interactions.
///
/// The uploaded dataset never changes after [`Session::open`]; every view is
/// recomputed from it, so changing filters back and forth is lossless.
#[derive(Clone, Debug)]
pub struct Session {
    config: PipelineConfig,
    original: Dataset,
    report: NormalizeReport,
    criteria: FilterCriteria,
    edited: Option<Dataset>,
}

impl Session {
    /// Validates and normalizes an uploaded table.
    pub fn open(table: Table, config: PipelineConfig) -> Result<Self> {
        config.check()?;
        let table = schema::validate(table, &config.required_columns)?;
        let (original, report) = dates::normalize(table, &config);
        info!("session opened with {} records", original.len());

        Ok(Session {
            config,
            original,
            report,
            criteria: FilterCriteria::default(),
            edited: None,
        })
    }

    pub fn from_bytes(bytes: &[u8], format: Format, config: PipelineConfig) -> Result<Self> {
        let table = loader::load_bytes(bytes, format, config.sheet.as_deref())?;
        Self::open(table, config)
    }

    pub fn from_path(path: impl AsRef<Path>, config: PipelineConfig) -> Result<Self> {
        let table = loader::load_table(path, config.sheet.as_deref())?;
        Self::open(table, config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn original(&self) -> &Dataset {
        &self.original
    }

    pub fn report(&self) -> &NormalizeReport {
        &self.report
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Replaces the filter state. Pending grid edits belonged to the
    /// previous view and are dropped.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.edited = None;
    }

    pub fn filtered(&self) -> Result<Dataset> {
        filter::apply(&self.original, &self.criteria, self.config.missing_dates)
    }

    pub fn view(&self) -> Result<DashboardView> {
        Ok(build_view(self.filtered()?, &self.config))
    }

    /// Installs the grid's edited copy as the dataset to export. It is
    /// trusted as is, since it was derived from a validated upload.
    pub fn accept_edits(&mut self, edited: Dataset) {
        info!("accepted edited grid with {} records", edited.len());
        self.edited = Some(edited);
    }

    pub fn edited(&self) -> Option<&Dataset> {
        self.edited.as_ref()
    }

    /// The edited copy when there is one, otherwise the filtered view.
    pub fn export_dataset(&self) -> Result<Dataset> {
        match &self.edited {
            Some(edited) => Ok(edited.clone()),
            None => self.filtered(),
        }
    }

    pub fn export_csv(&self) -> Result<Vec<u8>> {
        downloader::to_csv(&self.export_dataset()?)
    }

    /// Spreadsheet export, with the category × status summary sheet when
    /// the configuration asks for it.
    #[cfg(feature = "xlsx")]
    pub fn export_xlsx(&self) -> Result<Vec<u8>> {
        let dataset = self.export_dataset()?;
        let summary = self
            .config
            .summary_sheet
            .then(|| aggregate::category_status_pivot(&dataset));
        downloader::to_xlsx(&dataset, summary.as_ref())
    }
}
