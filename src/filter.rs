use crate::error::{DashboardError, Result};
use crate::record::{DateField, Dataset, Dimension, Record};
use chrono::NaiveDate;
use log::debug;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// How a date range treats records that have no date at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDatePolicy {
    /// Records without the date pass any range on it.
    #[default]
    Include,
    /// Records without the date fail any active range on it.
    Exclude,
}

/// Inclusive bounds; either side may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange::new(Some(start), Some(end))
    }

    pub fn is_unset(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }

    fn admits(&self, date: Option<NaiveDate>, policy: MissingDatePolicy) -> bool {
        if self.is_unset() {
            return true;
        }
        match date {
            Some(date) => self.contains(date),
            None => policy == MissingDatePolicy::Include,
        }
    }
}

/// Every filter widget's current value. An empty selection or unset range
/// places no restriction on its dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub due: DateRange,
    pub closing: DateRange,
    pub categories: Vec<String>,
    pub statuses: Vec<String>,
    pub areas: Vec<String>,
    pub search: String,
}

impl FilterCriteria {
    pub fn is_unrestricted(&self) -> bool {
        self.due.is_unset()
            && self.closing.is_unset()
            && self.categories.is_empty()
            && self.statuses.is_empty()
            && self.areas.is_empty()
            && self.search.is_empty()
    }

    fn selection(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Category => &self.categories,
            Dimension::Status => &self.statuses,
            Dimension::Area => &self.areas,
        }
    }

    fn range(&self, field: DateField) -> &DateRange {
        match field {
            DateField::Due => &self.due,
            DateField::Closing => &self.closing,
        }
    }
}

/// Builds the case-insensitive literal matcher for a search box value.
fn search_matcher(term: &str) -> Result<Option<Regex>> {
    if term.is_empty() {
        return Ok(None);
    }
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|e| DashboardError::Filter(format!("search term rejected: {}", e)))
}

fn selected(record: &Record, dimension: Dimension, selection: &[String]) -> bool {
    if selection.is_empty() {
        return true;
    }
    match record.label(dimension) {
        Some(label) => selection.iter().any(|s| s.trim() == label),
        None => false,
    }
}

/// Returns the records of `dataset` that satisfy every active predicate.
///
/// The source dataset is left untouched and record order is preserved, so
/// the UI can always re-filter from the original upload.
///
/// # Examples
/// ```
/// use findings_dashboard::filter::{apply, FilterCriteria, MissingDatePolicy};
/// use findings_dashboard::record::{Dataset, Record};
///
/// let records = ["A", "B", "C"]
///     .iter()
///     .map(|area| Record { area: Some(area.to_string()), ..Record::default() })
///     .collect();
/// let dataset = Dataset { records, ..Dataset::default() };
///
/// let criteria = FilterCriteria { areas: vec!["A".into()], ..FilterCriteria::default() };
/// let filtered = apply(&dataset, &criteria, MissingDatePolicy::Include).unwrap();
/// assert_eq!(filtered.len(), 1);
/// assert_eq!(dataset.len(), 3);
/// ```
pub fn apply(
    dataset: &Dataset,
    criteria: &FilterCriteria,
    missing_dates: MissingDatePolicy,
) -> Result<Dataset> {
    if criteria.is_unrestricted() {
        return Ok(dataset.clone());
    }

    let search = search_matcher(&criteria.search)?;

    let records: Vec<Record> = dataset
        .records
        .iter()
        .filter(|record| {
            [DateField::Due, DateField::Closing]
                .iter()
                .all(|&field| criteria.range(field).admits(record.date(field), missing_dates))
        })
        .filter(|record| {
            [Dimension::Category, Dimension::Status, Dimension::Area]
                .iter()
                .all(|&dim| selected(record, dim, criteria.selection(dim)))
        })
        .filter(|record| match &search {
            Some(re) => dataset
                .row_values(record)
                .iter()
                .any(|value| re.is_match(&value.to_string())),
            None => true,
        })
        .cloned()
        .collect();

    debug!("filters kept {} of {} records", records.len(), dataset.len());
    Ok(dataset.with_records(records))
}
