use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::dataset::Row;
use crate::error::QueryError;

/// Outcome of a successful question: rows plus provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    /// The generated query that produced the rows
    pub query: String,
    pub from_cache: bool,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    /// Whether a default LIMIT was appended before execution
    pub limit_applied: bool,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Caller-facing response for `ask`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskResponse {
    pub success: bool,
    pub rows: Vec<Row>,
    pub generated_query: String,
    pub from_cache: bool,
    pub elapsed_seconds: f64,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl AskResponse {
    pub fn from_result(result: QueryResult) -> Self {
        Self {
            success: true,
            rows: result.rows,
            generated_query: result.query,
            from_cache: result.from_cache,
            elapsed_seconds: result.elapsed.as_secs_f64(),
            error: None,
            error_code: None,
        }
    }

    /// Failure never carries rows, even if some were computed
    pub fn from_error(error: &QueryError, generated_query: Option<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            rows: Vec::new(),
            generated_query: generated_query.unwrap_or_default(),
            from_cache: false,
            elapsed_seconds: elapsed.as_secs_f64(),
            error: Some(error.to_string()),
            error_code: Some(error.code().to_string()),
        }
    }
}

// ============================================================================
// Query History Models
// ============================================================================

/// QueryHistory - one recorded `ask` outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHistory {
    pub id: String,
    pub question: String,
    pub generated_query: String,
    pub row_count: usize,
    pub execution_time_ms: u64,
    pub status: QueryHistoryStatus,
    pub from_cache: bool,
    pub error_message: Option<String>,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum QueryHistoryStatus {
    Success,
    Failed,
}

impl QueryHistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryHistoryStatus::Success => "success",
            QueryHistoryStatus::Failed => "failed",
        }
    }
}

impl QueryHistory {
    pub fn from_response(question: &str, response: &AskResponse) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            question: question.to_string(),
            generated_query: response.generated_query.clone(),
            row_count: response.rows.len(),
            execution_time_ms: (response.elapsed_seconds * 1000.0) as u64,
            status: if response.success {
                QueryHistoryStatus::Success
            } else {
                QueryHistoryStatus::Failed
            },
            from_cache: response.from_cache,
            error_message: response.error.clone(),
            executed_at: Utc::now(),
        }
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
