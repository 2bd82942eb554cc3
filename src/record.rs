use crate::dates::to_date;
use crate::error::{DashboardError, Result};
use crate::loader::Table;
use crate::schema::{ColumnMapping, Field};
use crate::value::Value;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One audit finding.
///
/// Columns that a dashboard variant does not map to a field are kept in
/// `extra`, keyed by column name.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Record {
    pub id: Option<i64>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub area: Option<String>,
    pub standard: Option<String>,
    pub description: Option<String>,
    pub evidence: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub closing_date: Option<NaiveDate>,
    pub extra: BTreeMap<String, Value>,
}

/// Categorical dimensions used for filtering and grouping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Category,
    Status,
    Area,
}

impl Dimension {
    pub fn field(self) -> Field {
        match self {
            Dimension::Category => Field::Category,
            Dimension::Status => Field::Status,
            Dimension::Area => Field::Area,
        }
    }
}

/// Date fields a range filter or histogram can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    Due,
    Closing,
}

impl Record {
    pub fn get(&self, field: Field) -> Value {
        match field {
            Field::Id => self.id.map_or(Value::Empty, |id| Value::Number(id as f64)),
            Field::Category => Value::from(self.category.clone()),
            Field::Status => Value::from(self.status.clone()),
            Field::Area => Value::from(self.area.clone()),
            Field::Standard => Value::from(self.standard.clone()),
            Field::Description => Value::from(self.description.clone()),
            Field::Evidence => Value::from(self.evidence.clone()),
            Field::DueDate => Value::from(self.due_date),
            Field::ClosingDate => Value::from(self.closing_date),
        }
    }

    /// Stores a cell into a non-date field. Returns `false` when the cell is
    /// not blank but cannot be represented by the field (a non-integer id).
    pub fn set_field(&mut self, field: Field, value: &Value) -> bool {
        let label = value.as_label();
        match field {
            Field::Id => {
                self.id = value.as_number().filter(|n| n.fract() == 0.0).map(|n| n as i64);
                self.id.is_some() || value.is_empty()
            }
            Field::Category => {
                self.category = label;
                true
            }
            Field::Status => {
                self.status = label;
                true
            }
            Field::Area => {
                self.area = label;
                true
            }
            Field::Standard => {
                self.standard = label;
                true
            }
            Field::Description => {
                self.description = label;
                true
            }
            Field::Evidence => {
                self.evidence = label;
                true
            }
            Field::DueDate | Field::ClosingDate => {
                let parsed = to_date(value);
                self.set_date(field, parsed);
                parsed.is_some() || value.is_empty()
            }
        }
    }

    pub fn set_date(&mut self, field: Field, date: Option<NaiveDate>) {
        match field {
            Field::DueDate => self.due_date = date,
            Field::ClosingDate => self.closing_date = date,
            _ => {}
        }
    }

    pub fn date(&self, field: DateField) -> Option<NaiveDate> {
        match field {
            DateField::Due => self.due_date,
            DateField::Closing => self.closing_date,
        }
    }

    pub fn label(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Category => self.category.as_deref(),
            Dimension::Status => self.status.as_deref(),
            Dimension::Area => self.area.as_deref(),
        }
    }

    /// The value shown for `column`, whether it feeds a field or lives in the
    /// side table.
    pub fn column_value(&self, mapping: &ColumnMapping, column: &str) -> Value {
        if let Some(field) = mapping.field_for(column) {
            let value = self.get(field);
            if !value.is_empty() {
                return value;
            }
        }
        self.extra.get(column).cloned().unwrap_or_default()
    }
}

/// An ordered set of records sharing one column layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    #[serde(skip)]
    pub mapping: ColumnMapping,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, mapping: ColumnMapping, records: Vec<Record>) -> Self {
        Dataset {
            columns,
            mapping,
            records,
        }
    }

    /// A dataset with this one's layout but different records.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Dataset {
            columns: self.columns.clone(),
            mapping: self.mapping.clone(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<Value> {
        if !self.columns.iter().any(|c| c == column) {
            return None;
        }
        self.records
            .get(row)
            .map(|record| record.column_value(&self.mapping, column))
    }

    /// All cells of one record, in column order.
    pub fn row_values(&self, record: &Record) -> Vec<Value> {
        self.columns
            .iter()
            .map(|column| record.column_value(&self.mapping, column))
            .collect()
    }

    /// Applies one cell edit from the grid.
    ///
    /// The value is converted with the same tolerant rules used at load time;
    /// a value that does not fit the field is kept verbatim in the side table
    /// so nothing typed by the user is lost.
    pub fn set_value(&mut self, row: usize, column: &str, value: Value) -> Result<()> {
        if !self.columns.iter().any(|c| c == column) {
            return Err(DashboardError::Edit(format!("unknown column '{}'", column)));
        }
        let len = self.records.len();
        let mapping = self.mapping.clone();
        let record = self.records.get_mut(row).ok_or_else(|| {
            DashboardError::Edit(format!("row {} out of range ({} rows)", row, len))
        })?;

        match mapping.field_for(column) {
            Some(field) => {
                if record.set_field(field, &value) {
                    record.extra.remove(column);
                } else {
                    record.extra.insert(column.to_string(), value);
                }
            }
            None => {
                record.extra.insert(column.to_string(), value);
            }
        }
        Ok(())
    }

    /// Flattens the records back into a table, in column order.
    pub fn to_table(&self) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.records.iter().map(|r| self.row_values(r)).collect(),
        }
    }
}
