use serde_json::{Map, Value};

use crate::error::QueryError;

/// A single row: column name to value, in column order
pub type Row = Map<String, Value>;

static NULL: Value = Value::Null;

/// In-memory tabular dataset backing one logical table
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub table_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(table_name: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            rows,
        }
    }

    /// Build a dataset from a JSON array of objects.
    ///
    /// Columns are ordered by first appearance across the records.
    pub fn from_records(table_name: impl Into<String>, records: Vec<Value>) -> Result<Self, QueryError> {
        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(records.len());

        for (idx, record) in records.into_iter().enumerate() {
            let Value::Object(row) = record else {
                return Err(QueryError::Dataset(format!(
                    "Record {} is not a JSON object",
                    idx
                )));
            };
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
            rows.push(row);
        }

        Ok(Self::new(table_name, columns, rows))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Values of one column in row order; missing cells read as null
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(column).unwrap_or(&NULL))
    }
}
