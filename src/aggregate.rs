//! Grouped counts and the chart shapes built from them.
//!
//! Every chart on the dashboard is fed from here: grouped counts for the
//! category × status bars, a zero-filled pivot for the stacked bars and the
//! export summary sheet, and a tiered flow diagram for the area → category →
//! status view.

use crate::dates::to_date;
use crate::record::{DateField, Dataset, Dimension, Record};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Label used for records that leave a grouped dimension blank, so that
/// group counts always add up to the number of records.
pub const BLANK_LABEL: &str = "(blank)";

/// Number of records sharing one combination of dimension values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupedCount {
    pub keys: Vec<String>,
    pub count: usize,
}

fn label_of(record: &Record, dimension: Dimension) -> String {
    record.label(dimension).unwrap_or(BLANK_LABEL).to_string()
}

/// Distinct labels of one dimension in order of first appearance.
pub fn distinct_labels(dataset: &Dataset, dimension: Dimension) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for record in &dataset.records {
        let label = label_of(record, dimension);
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

/// Counts records per distinct combination of `dimensions`.
///
/// Groups appear in order of first appearance and only combinations that
/// actually occur are returned.
pub fn count_groups(dataset: &Dataset, dimensions: &[Dimension]) -> Vec<GroupedCount> {
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<GroupedCount> = Vec::new();

    for record in &dataset.records {
        let keys: Vec<String> = dimensions.iter().map(|&d| label_of(record, d)).collect();
        match index.get(&keys) {
            Some(&i) => groups[i].count += 1,
            None => {
                index.insert(keys.clone(), groups.len());
                groups.push(GroupedCount { keys, count: 1 });
            }
        }
    }

    groups
}

pub fn count_by(dataset: &Dataset, dimension: Dimension) -> Vec<GroupedCount> {
    count_groups(dataset, &[dimension])
}

pub fn count_by_pair(dataset: &Dataset, first: Dimension, second: Dimension) -> Vec<GroupedCount> {
    count_groups(dataset, &[first, second])
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub count: usize,
}

/// The headline cards: one count per configured category, plus the total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HeadlineTotals {
    pub categories: Vec<CategoryTotal>,
    pub total: usize,
}

pub fn headline_totals(dataset: &Dataset, categories: &[String]) -> HeadlineTotals {
    let categories = categories
        .iter()
        .map(|category| CategoryTotal {
            category: category.clone(),
            count: dataset
                .records
                .iter()
                .filter(|r| r.category.as_deref() == Some(category.as_str()))
                .count(),
        })
        .collect();

    HeadlineTotals {
        categories,
        total: dataset.len(),
    }
}

/// Dense two-way table of counts; missing combinations are zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Pivot {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl Pivot {
    /// Spreads two-key grouped counts into a table: first key down the
    /// rows, second key across the columns.
    pub fn from_counts(groups: &[GroupedCount]) -> Self {
        let mut pivot = Pivot::default();

        for group in groups {
            let (Some(row), Some(column)) = (group.keys.first(), group.keys.get(1)) else {
                continue;
            };
            let r = match pivot.rows.iter().position(|x| x == row) {
                Some(r) => r,
                None => {
                    pivot.rows.push(row.clone());
                    pivot.counts.push(vec![0; pivot.columns.len()]);
                    pivot.rows.len() - 1
                }
            };
            let c = match pivot.columns.iter().position(|x| x == column) {
                Some(c) => c,
                None => {
                    pivot.columns.push(column.clone());
                    for counts in &mut pivot.counts {
                        counts.push(0);
                    }
                    pivot.columns.len() - 1
                }
            };
            pivot.counts[r][c] += group.count;
        }

        pivot
    }

    pub fn get(&self, row: &str, column: &str) -> usize {
        let r = self.rows.iter().position(|x| x == row);
        let c = self.columns.iter().position(|x| x == column);
        match (r, c) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn row_total(&self, row: usize) -> usize {
        self.counts.get(row).map_or(0, |counts| counts.iter().sum())
    }
}

/// Category × status pivot, the common source of the bar charts and the
/// export summary.
pub fn category_status_pivot(dataset: &Dataset) -> Pivot {
    Pivot::from_counts(&count_by_pair(dataset, Dimension::Category, Dimension::Status))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarLayout {
    /// Side-by-side vertical bars per category
    Grouped,
    /// Horizontal bars per category with one stacked segment per status
    Stacked,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BarChart {
    pub layout: BarLayout,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
}

/// One series per pivot column, one value per pivot row.
pub fn bar_chart(pivot: &Pivot, layout: BarLayout) -> BarChart {
    let series = pivot
        .columns
        .iter()
        .enumerate()
        .map(|(c, name)| BarSeries {
            name: name.clone(),
            values: pivot.counts.iter().map(|row| row[c]).collect(),
        })
        .collect();

    BarChart {
        layout,
        categories: pivot.rows.clone(),
        series,
    }
}

/// Colour hint for a flow link, taken from the status it flows into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTone {
    Open,
    Closed,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlowNode {
    pub label: String,
    pub tier: Dimension,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: usize,
    pub tone: LinkTone,
}

/// Nodes in three tiers (areas, then categories, then statuses) and the
/// weighted links between neighbouring tiers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FlowDiagram {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

/// Builds the area → category → status flow diagram.
///
/// Only links with a positive count are emitted. Node indices are unique
/// per tier, so a label that occurs in two tiers yields two nodes.
pub fn flow_diagram(dataset: &Dataset, open_label: &str, closed_label: &str) -> FlowDiagram {
    let tiers = [Dimension::Area, Dimension::Category, Dimension::Status];
    let mut diagram = FlowDiagram::default();
    let mut offsets = Vec::with_capacity(tiers.len());
    let mut labels = Vec::with_capacity(tiers.len());

    for tier in tiers {
        offsets.push(diagram.nodes.len());
        let tier_labels = distinct_labels(dataset, tier);
        diagram.nodes.extend(tier_labels.iter().map(|label| FlowNode {
            label: label.clone(),
            tier,
        }));
        labels.push(tier_labels);
    }

    for step in 0..tiers.len() - 1 {
        let counts: HashMap<Vec<String>, usize> =
            count_by_pair(dataset, tiers[step], tiers[step + 1])
                .into_iter()
                .map(|g| (g.keys, g.count))
                .collect();

        for (i, source) in labels[step].iter().enumerate() {
            for (j, target) in labels[step + 1].iter().enumerate() {
                let value = counts
                    .get(&vec![source.clone(), target.clone()])
                    .copied()
                    .unwrap_or(0);
                if value == 0 {
                    continue;
                }
                let tone = if target == open_label {
                    LinkTone::Open
                } else if target == closed_label {
                    LinkTone::Closed
                } else {
                    LinkTone::Other
                };
                diagram.links.push(FlowLink {
                    source: offsets[step] + i,
                    target: offsets[step + 1] + j,
                    value,
                    tone,
                });
            }
        }
    }

    diagram
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
}

/// Records per calendar month of a date field, oldest first. Records
/// without the date are left out.
pub fn monthly_histogram(dataset: &Dataset, field: DateField) -> Vec<HistogramBin> {
    let mut bins: BTreeMap<String, usize> = BTreeMap::new();
    for date in dataset.records.iter().filter_map(|r| r.date(field)) {
        *bins.entry(date.format("%Y-%m").to_string()).or_insert(0) += 1;
    }
    bins.into_iter()
        .map(|(month, count)| HistogramBin { month, count })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// `(date, value)` points read from two columns, in record order. Rows
/// missing either side are skipped.
pub fn time_series(dataset: &Dataset, date_column: &str, value_column: &str) -> Vec<SeriesPoint> {
    dataset
        .records
        .iter()
        .filter_map(|record| {
            let date = to_date(&record.column_value(&dataset.mapping, date_column))?;
            let value = record.column_value(&dataset.mapping, value_column).as_number()?;
            Some(SeriesPoint { date, value })
        })
        .collect()
}
