use thiserror::Error;

use crate::validation::Rejection;

/// Error taxonomy for the natural-language query pipeline
#[derive(Debug, Error)]
pub enum QueryError {
    /// The text-generation collaborator failed, timed out, or returned unusable output
    #[error("Generation error: {0}")]
    Generation(String),

    /// The candidate query was rejected by the validator
    #[error("Validation error: {0}")]
    Validation(Rejection),

    /// The data engine rejected an already-validated query at runtime
    #[error("Execution error: {0}")]
    Execution(String),

    /// Cache failures degrade to a forced miss and never fail a request
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl QueryError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Generation(_) => "GENERATION_ERROR",
            QueryError::Validation(_) => "VALIDATION_ERROR",
            QueryError::Execution(_) => "EXECUTION_ERROR",
            QueryError::Cache(_) => "CACHE_ERROR",
            QueryError::Dataset(_) => "DATASET_ERROR",
            QueryError::Config(_) => "CONFIG_ERROR",
            QueryError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether the error ends the request (everything except cache trouble)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QueryError::Cache(_))
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(err: rusqlite::Error) -> Self {
        QueryError::Storage(err.to_string())
    }
}

impl From<config::ConfigError> for QueryError {
    fn from(err: config::ConfigError) -> Self {
        QueryError::Config(err.to_string())
    }
}

impl From<Rejection> for QueryError {
    fn from(rejection: Rejection) -> Self {
        QueryError::Validation(rejection)
    }
}
