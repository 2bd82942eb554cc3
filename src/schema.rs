use crate::error::{DashboardError, Result};
use crate::loader::Table;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Logical record fields that a dashboard variant maps onto sheet columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Category,
    Status,
    Area,
    Standard,
    Description,
    Evidence,
    DueDate,
    ClosingDate,
}

impl Field {
    pub fn is_date(self) -> bool {
        matches!(self, Field::DueDate | Field::ClosingDate)
    }
}

/// Which column of the uploaded sheet feeds each logical field.
///
/// Fields without an entry stay `None` on every record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(pub BTreeMap<Field, String>);

impl ColumnMapping {
    pub fn new(pairs: &[(Field, &str)]) -> Self {
        ColumnMapping(
            pairs
                .iter()
                .map(|(field, column)| (*field, normalize_column_name(column)))
                .collect(),
        )
    }

    pub fn column(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Reverse lookup: the field a column feeds, if any.
    pub fn field_for(&self, column: &str) -> Option<Field> {
        self.0
            .iter()
            .find(|(_, c)| c.as_str() == column)
            .map(|(field, _)| *field)
    }
}

/// Strips surrounding whitespace (and a stray byte-order mark) from a header.
pub fn normalize_column_name(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_string()
}

/// Normalizes a header row and makes the names unique.
///
/// A repeated name keeps its first occurrence as is; later ones get `.1`,
/// `.2`, ... appended.
pub fn normalize_columns(columns: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::with_capacity(columns.len());

    for column in columns {
        let base = normalize_column_name(column);
        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(name.clone());
        result.push(name);
    }

    result
}

/// Checks that every required column is present.
///
/// Both sides are compared after whitespace normalization. On failure the
/// error names every missing column, in the order they were required.
///
/// # Examples
/// ```
/// use findings_dashboard::loader::from_csv;
/// use findings_dashboard::schema::validate;
/// use findings_dashboard::DashboardError;
///
/// let table = from_csv(b"Area,Finding Status\nPlant,Open\n").unwrap();
/// let required = vec!["Area".to_string(), "Finding category".to_string()];
/// match validate(table, &required) {
///     Err(DashboardError::SchemaMismatch { missing }) => {
///         assert_eq!(missing, vec!["Finding category"]);
///     }
///     _ => panic!("expected a schema mismatch"),
/// }
/// ```
pub fn validate(table: Table, required: &[String]) -> Result<Table> {
    let missing: Vec<String> = required
        .iter()
        .map(|c| normalize_column_name(c))
        .filter(|c| !table.columns.contains(c))
        .collect();

    if missing.is_empty() {
        Ok(table)
    } else {
        warn!("upload rejected, missing columns: {}", missing.join(", "));
        Err(DashboardError::SchemaMismatch { missing })
    }
}
