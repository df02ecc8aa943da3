// DataFusion CatalogManager
//
// Registers the loaded dataset as an in-memory Arrow table so the validated
// query can be executed against it.

use anyhow::{anyhow, Context, Result};
use chrono::Datelike;
use datafusion::arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::common::TableReference;
use datafusion::datasource::MemTable;
use datafusion::prelude::*;
use serde_json::Value;
use std::sync::Arc;

use crate::models::{ColumnDescriptor, Dataset, SemanticType, TableDescriptor};
use crate::services::schema_registry::parse_date;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

/// Manages table registration for DataFusion
///
/// # Architecture
/// ```text
/// CatalogManager
///   └── SessionContext (default catalog and schema)
///       └── Table (e.g., "campaigns") backed by a MemTable
/// ```
pub struct DataFusionCatalogManager {
    /// Session context for table registration
    ctx: SessionContext,
}

impl DataFusionCatalogManager {
    /// Create a new CatalogManager with a SessionContext
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    /// Register a dataset as a table typed by its schema descriptor
    ///
    /// The table name is registered verbatim (no case folding), matching the
    /// quoted canonical spelling the validator renders.
    pub fn register_dataset(&self, dataset: &Dataset, table: &TableDescriptor) -> Result<()> {
        let arrays = table
            .columns
            .iter()
            .map(|column| Self::column_to_array(dataset, column))
            .collect::<Result<Vec<_>>>()?;

        let fields: Vec<Field> = table
            .columns
            .iter()
            .zip(&arrays)
            .map(|(column, array)| Field::new(&column.name, array.data_type().clone(), true))
            .collect();
        let schema = Arc::new(Schema::new(fields));

        let partition = if table.columns.is_empty() || dataset.is_empty() {
            Vec::new()
        } else {
            vec![RecordBatch::try_new(schema.clone(), arrays)
                .context("Failed to build record batch for dataset")?]
        };

        let mem_table = MemTable::try_new(schema, vec![partition])?;
        self.ctx
            .register_table(TableReference::bare(table.name.as_str()), Arc::new(mem_table))
            .with_context(|| format!("Failed to register table {}", table.name))?;

        tracing::debug!(
            "Registered table {} ({} rows, {} columns)",
            table.name,
            dataset.row_count(),
            table.columns.len()
        );
        Ok(())
    }

    /// Build the Arrow array for one column
    ///
    /// A non-null value that does not fit the column's semantic type is an
    /// error; it is never stored as null.
    fn column_to_array(dataset: &Dataset, column: &ColumnDescriptor) -> Result<ArrayRef> {
        let values = || dataset.column_values(&column.name);
        let integral = values().all(|v| v.is_null() || as_i64(v).is_some());

        let array: ArrayRef = match Self::arrow_type(column.semantic_type, integral) {
            DataType::Int64 => Arc::new(Int64Array::from(convert_column(column, values(), as_i64)?)),
            DataType::Float64 => Arc::new(Float64Array::from(convert_column(column, values(), as_f64)?)),
            DataType::Date32 => Arc::new(Date32Array::from(convert_column(column, values(), as_date32)?)),
            _ => Arc::new(StringArray::from(convert_column(column, values(), as_text)?)),
        };
        Ok(array)
    }

    /// Map a semantic type to the Arrow type used for it
    pub fn arrow_type(semantic_type: SemanticType, integral: bool) -> DataType {
        match semantic_type {
            SemanticType::Numeric if integral => DataType::Int64,
            SemanticType::Numeric => DataType::Float64,
            SemanticType::Date => DataType::Date32,
            SemanticType::Text => DataType::Utf8,
        }
    }

    /// Get the session context
    pub fn session_context(&self) -> &SessionContext {
        &self.ctx
    }

    /// List all registered tables
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let catalog = self
            .ctx
            .catalog("datafusion")
            .ok_or_else(|| anyhow!("Default catalog 'datafusion' not found"))?;

        let schema = catalog
            .schema("public")
            .ok_or_else(|| anyhow!("Default schema 'public' not found"))?;

        Ok(schema.table_names())
    }
}

/// Convert every value of a column, failing on the first non-null misfit
fn convert_column<'a, T>(
    column: &ColumnDescriptor,
    values: impl Iterator<Item = &'a Value>,
    convert: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<Option<T>>> {
    values
        .enumerate()
        .map(|(row, value)| {
            if value.is_null() {
                return Ok(None);
            }
            convert(value).map(Some).ok_or_else(|| {
                anyhow!(
                    "Value {} in column {} (row {}) is not {}",
                    value,
                    column.name,
                    row + 1,
                    column.semantic_type.as_str()
                )
            })
        })
        .collect()
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_date32(value: &Value) -> Option<i32> {
    value
        .as_str()
        .and_then(parse_date)
        .map(|date| date.num_days_from_ce() - UNIX_EPOCH_CE_DAYS)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
