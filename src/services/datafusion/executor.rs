// DataFusion QueryExecutor
//
// Plans and executes validated queries against the registered dataset with
// timeout support.

use anyhow::{anyhow, Context, Result};
use datafusion::arrow::array::RecordBatch;
use datafusion::prelude::*;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use super::converter::DataFusionResultConverter;
use crate::models::Row;

/// Query execution result converted to rows
#[derive(Debug, Clone)]
pub struct QueryExecutionResult {
    /// Result column names in order
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Execution time in milliseconds
    pub execution_time_ms: u128,
}

impl QueryExecutionResult {
    /// Create a new result from record batches
    pub fn from_batches(batches: &[RecordBatch], execution_time_ms: u128) -> Result<Self> {
        Ok(Self {
            columns: DataFusionResultConverter::column_names(batches),
            rows: DataFusionResultConverter::batches_to_rows(batches)?,
            execution_time_ms,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Executes DataFusion queries with timeout and error handling
#[derive(Clone)]
pub struct DataFusionQueryExecutor {
    /// Session context holding the registered dataset
    ctx: SessionContext,
    /// Default timeout for queries
    default_timeout: Duration,
}

impl DataFusionQueryExecutor {
    pub fn new(ctx: SessionContext, default_timeout: Duration) -> Self {
        Self {
            ctx,
            default_timeout,
        }
    }

    /// Execute a SQL query with default timeout
    pub async fn execute_query(&self, sql: &str) -> Result<QueryExecutionResult> {
        self.execute_query_with_timeout(sql, self.default_timeout).await
    }

    /// Execute a SQL query with custom timeout
    ///
    /// # Errors
    /// Returns error if planning fails (unknown function, type mismatch),
    /// execution fails, or the timeout elapses
    pub async fn execute_query_with_timeout(
        &self,
        sql: &str,
        timeout_duration: Duration,
    ) -> Result<QueryExecutionResult> {
        let start_time = Instant::now();

        // Wrap planning and execution in one timeout
        let batches = timeout(timeout_duration, async {
            let df = self.plan_sql(sql).await?;
            self.collect(df).await
        })
        .await
        .map_err(|_| anyhow!("Query execution timeout after {:?}", timeout_duration))??;

        let execution_time = start_time.elapsed();
        tracing::debug!("Executed query in {:?}: {}", execution_time, sql);

        QueryExecutionResult::from_batches(&batches, execution_time.as_millis())
    }

    /// Parse and plan a SQL query
    async fn plan_sql(&self, sql: &str) -> Result<DataFrame> {
        self.ctx.sql(sql).await.context("Failed to plan SQL query")
    }

    /// Execute a planned query and collect results
    async fn collect(&self, df: DataFrame) -> Result<Vec<RecordBatch>> {
        df.collect().await.context("Failed to execute query plan")
    }

    /// Get the session context
    pub fn session_context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Get current default timeout
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_query_executor_creation() {
        let executor = DataFusionQueryExecutor::new(SessionContext::new(), Duration::from_secs(30));
        assert_eq!(executor.default_timeout(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_simple_query_execution() {
        let executor = DataFusionQueryExecutor::new(SessionContext::new(), Duration::from_secs(30));

        let result = executor
            .execute_query("SELECT 1 AS num, 'hello' AS text")
            .await
            .unwrap();

        assert_eq!(result.row_count(), 1);
        assert_eq!(result.columns, vec!["num", "text"]);
        assert_eq!(result.rows[0]["text"], serde_json::json!("hello"));
    }

    #[tokio::test]
    async fn test_unknown_function_is_an_error() {
        let executor = DataFusionQueryExecutor::new(SessionContext::new(), Duration::from_secs(30));
        let result = executor.execute_query("SELECT no_such_function(1)").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_query_timeout() {
        let executor = DataFusionQueryExecutor::new(SessionContext::new(), Duration::from_nanos(1));

        // May or may not time out depending on system speed, but must not panic
        match executor.execute_query("SELECT 1").await {
            Ok(result) => assert_eq!(result.row_count(), 1),
            Err(e) => assert!(format!("{:#}", e).contains("timeout")),
        }
    }
}
