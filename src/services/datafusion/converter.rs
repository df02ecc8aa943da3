// DataFusion ResultConverter
//
// Converts DataFusion RecordBatch results to the JSON rows returned to
// callers, preserving column order.

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate};
use datafusion::arrow::array::*;
use datafusion::arrow::datatypes::{DataType, TimeUnit};
use datafusion::arrow::record_batch::RecordBatch;
use serde_json::{json, Value as JsonValue};

use crate::models::Row;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

/// Downcast an array to a concrete type or fail with the type name
macro_rules! downcast {
    ($array:expr, $ty:ty) => {
        $array
            .as_any()
            .downcast_ref::<$ty>()
            .ok_or_else(|| anyhow!(concat!("Failed to downcast to ", stringify!($ty))))?
    };
}

/// Converts DataFusion query results to JSON rows
pub struct DataFusionResultConverter;

impl DataFusionResultConverter {
    /// Convert all record batches into rows (column name → value)
    pub fn batches_to_rows(batches: &[RecordBatch]) -> Result<Vec<Row>> {
        let total: usize = batches.iter().map(|batch| batch.num_rows()).sum();
        let mut rows = Vec::with_capacity(total);
        for batch in batches {
            rows.extend(Self::batch_to_rows(batch)?);
        }
        Ok(rows)
    }

    /// Column names of a result set, taken from the first batch
    pub fn column_names(batches: &[RecordBatch]) -> Vec<String> {
        batches
            .first()
            .map(|batch| {
                batch
                    .schema()
                    .fields()
                    .iter()
                    .map(|field| field.name().clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn batch_to_rows(batch: &RecordBatch) -> Result<Vec<Row>> {
        let schema = batch.schema();
        let mut rows = Vec::with_capacity(batch.num_rows());

        for row_idx in 0..batch.num_rows() {
            let mut row = Row::new();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = Self::array_value_to_json(batch.column(col_idx), row_idx, field.data_type())?;
                row.insert(field.name().clone(), value);
            }
            rows.push(row);
        }

        Ok(rows)
    }

    /// Convert a single array value to JSON
    fn array_value_to_json(array: &ArrayRef, row_idx: usize, data_type: &DataType) -> Result<JsonValue> {
        if array.is_null(row_idx) {
            return Ok(JsonValue::Null);
        }

        let value = match data_type {
            DataType::Boolean => json!(downcast!(array, BooleanArray).value(row_idx)),

            DataType::Int8 => json!(downcast!(array, Int8Array).value(row_idx)),
            DataType::Int16 => json!(downcast!(array, Int16Array).value(row_idx)),
            DataType::Int32 => json!(downcast!(array, Int32Array).value(row_idx)),
            DataType::Int64 => json!(downcast!(array, Int64Array).value(row_idx)),
            DataType::UInt8 => json!(downcast!(array, UInt8Array).value(row_idx)),
            DataType::UInt16 => json!(downcast!(array, UInt16Array).value(row_idx)),
            DataType::UInt32 => json!(downcast!(array, UInt32Array).value(row_idx)),
            DataType::UInt64 => json!(downcast!(array, UInt64Array).value(row_idx)),

            // Non-finite floats have no JSON form and become null
            DataType::Float32 => json!(downcast!(array, Float32Array).value(row_idx)),
            DataType::Float64 => json!(downcast!(array, Float64Array).value(row_idx)),

            DataType::Decimal128(_, scale) => {
                let value = downcast!(array, Decimal128Array).value(row_idx);
                json!(value as f64 / 10f64.powi(*scale as i32))
            }

            DataType::Utf8 => json!(downcast!(array, StringArray).value(row_idx)),
            DataType::LargeUtf8 => json!(downcast!(array, LargeStringArray).value(row_idx)),
            DataType::Utf8View => json!(downcast!(array, StringViewArray).value(row_idx)),

            DataType::Date32 => {
                let days = downcast!(array, Date32Array).value(row_idx);
                let date = NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_CE_DAYS)
                    .ok_or_else(|| anyhow!("Invalid date value"))?;
                json!(date.format("%Y-%m-%d").to_string())
            }
            DataType::Date64 => {
                let millis = downcast!(array, Date64Array).value(row_idx);
                let datetime = DateTime::from_timestamp_millis(millis)
                    .ok_or_else(|| anyhow!("Invalid timestamp value"))?;
                json!(datetime.format("%Y-%m-%d").to_string())
            }

            DataType::Timestamp(unit, _) => {
                let timestamp = match unit {
                    TimeUnit::Second => {
                        DateTime::from_timestamp(downcast!(array, TimestampSecondArray).value(row_idx), 0)
                    }
                    TimeUnit::Millisecond => DateTime::from_timestamp_millis(
                        downcast!(array, TimestampMillisecondArray).value(row_idx),
                    ),
                    TimeUnit::Microsecond => DateTime::from_timestamp_micros(
                        downcast!(array, TimestampMicrosecondArray).value(row_idx),
                    ),
                    TimeUnit::Nanosecond => Some(DateTime::from_timestamp_nanos(
                        downcast!(array, TimestampNanosecondArray).value(row_idx),
                    )),
                };
                let dt = timestamp.ok_or_else(|| anyhow!("Invalid timestamp value"))?;
                json!(dt.to_rfc3339())
            }

            _ => {
                tracing::warn!("Unsupported Arrow data type: {:?}", data_type);
                json!(format!("UNSUPPORTED_TYPE_{:?}", data_type))
            }
        };

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_convert_simple_batch() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Platform", DataType::Utf8, true),
            Field::new("Spend", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("Google"), None])),
                Arc::new(Int64Array::from(vec![100, 50])),
            ],
        )
        .unwrap();

        let rows = DataFusionResultConverter::batches_to_rows(&[batch.clone()]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Platform"], json!("Google"));
        assert_eq!(rows[0]["Spend"], json!(100));
        assert_eq!(rows[1]["Platform"], JsonValue::Null);

        // Column order follows the result schema
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["Platform", "Spend"]);
        assert_eq!(
            DataFusionResultConverter::column_names(&[batch]),
            vec!["Platform", "Spend"]
        );
    }

    #[test]
    fn test_convert_dates_and_floats() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Date", DataType::Date32, false),
            Field::new("CTR", DataType::Float64, false),
            Field::new("Active", DataType::Boolean, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Date32Array::from(vec![19723])), // 2024-01-01
                Arc::new(Float64Array::from(vec![1.5])),
                Arc::new(BooleanArray::from(vec![true])),
            ],
        )
        .unwrap();

        let rows = DataFusionResultConverter::batches_to_rows(&[batch]).unwrap();
        assert_eq!(rows[0]["Date"], json!("2024-01-01"));
        assert_eq!(rows[0]["CTR"], json!(1.5));
        assert_eq!(rows[0]["Active"], json!(true));
    }

    #[test]
    fn test_empty_result() {
        let rows = DataFusionResultConverter::batches_to_rows(&[]).unwrap();
        assert!(rows.is_empty());
        assert!(DataFusionResultConverter::column_names(&[]).is_empty());
    }
}
