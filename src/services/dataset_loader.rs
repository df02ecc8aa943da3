// Dataset Loader
//
// Reads a campaign dataset from disk. CSV files go through DataFusion's CSV
// reader (header row plus schema inference); JSON files hold an array of
// records.

use anyhow::Context;
use datafusion::prelude::CsvReadOptions;
use serde_json::Value;
use std::path::Path;

use crate::error::QueryError;
use crate::models::Dataset;
use crate::services::datafusion::{DataFusionResultConverter, DataFusionSessionManager, SessionConfig};

pub struct DatasetLoader;

impl DatasetLoader {
    /// Load a dataset, choosing the reader by file extension
    pub async fn load(path: impl AsRef<Path>, table_name: &str) -> Result<Dataset, QueryError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let dataset = match extension.as_deref() {
            Some("csv") => Self::load_csv(path, table_name).await?,
            Some("json") => Self::load_json(path, table_name).await?,
            _ => {
                return Err(QueryError::Dataset(format!(
                    "Unsupported dataset format: {}",
                    path.display()
                )))
            }
        };

        tracing::info!(
            "Loaded dataset {} from {} ({} rows, {} columns)",
            dataset.table_name,
            path.display(),
            dataset.row_count(),
            dataset.columns.len()
        );
        Ok(dataset)
    }

    /// Read a CSV file with a header row
    pub async fn load_csv(path: &Path, table_name: &str) -> Result<Dataset, QueryError> {
        Self::read_csv(path, table_name)
            .await
            .map_err(|e| QueryError::Dataset(format!("{:#}", e)))
    }

    async fn read_csv(path: &Path, table_name: &str) -> anyhow::Result<Dataset> {
        let path_str = path
            .to_str()
            .with_context(|| format!("Dataset path is not valid UTF-8: {}", path.display()))?;

        // One partition keeps rows in file order
        let manager = DataFusionSessionManager::new(SessionConfig {
            target_partitions: 1,
            ..SessionConfig::default()
        });
        let ctx = manager.create_session()?;

        let df = ctx
            .read_csv(path_str, CsvReadOptions::new().has_header(true))
            .await
            .with_context(|| format!("Failed to read CSV file {}", path.display()))?;

        let columns: Vec<String> = df
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect();

        let batches = df.collect().await.context("Failed to scan CSV file")?;
        let rows = DataFusionResultConverter::batches_to_rows(&batches)?;

        Ok(Dataset::new(table_name, columns, rows))
    }

    /// Read a JSON array of objects
    pub async fn load_json(path: &Path, table_name: &str) -> Result<Dataset, QueryError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            QueryError::Dataset(format!("Failed to read JSON file {}: {}", path.display(), e))
        })?;

        let records = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(records)) => records,
            Ok(_) => {
                return Err(QueryError::Dataset(
                    "JSON dataset must be an array of records".to_string(),
                ))
            }
            Err(e) => return Err(QueryError::Dataset(format!("Invalid JSON dataset: {}", e))),
        };

        Dataset::from_records(table_name, records)
    }
}
