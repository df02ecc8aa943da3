// DataFusion SessionManager
//
// Creates the DataFusion SessionContext instances that hold the loaded
// dataset and read CSV files.

use anyhow::Result;
use datafusion::prelude::*;

/// Configuration for DataFusion sessions
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Batch size for query execution
    pub batch_size: usize,
    /// Number of partitions for parallel execution
    pub target_partitions: usize,
    /// Normalize unquoted identifiers to lowercase
    pub normalize_identifiers: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            target_partitions: num_cpus::get(),
            normalize_identifiers: true,
        }
    }
}

/// Manages DataFusion SessionContext lifecycle
///
/// Every dataset load gets a fresh session, so a reload never observes the
/// tables registered by the previous one.
///
/// # Example
/// ```rust,ignore
/// let manager = DataFusionSessionManager::default_config();
/// let session = manager.create_session()?;
/// let df = session.sql("SELECT * FROM campaigns").await?;
/// ```
pub struct DataFusionSessionManager {
    config: SessionConfig,
}

impl DataFusionSessionManager {
    /// Create a new SessionManager with the given configuration
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Create a new SessionManager with default configuration
    pub fn default_config() -> Self {
        Self::new(SessionConfig::default())
    }

    /// Create a new DataFusion SessionContext
    pub fn create_session(&self) -> Result<SessionContext> {
        let mut config = ::datafusion::prelude::SessionConfig::new()
            .with_batch_size(self.config.batch_size)
            .with_target_partitions(self.config.target_partitions.max(1))
            .with_information_schema(false);
        config.options_mut().sql_parser.enable_ident_normalization = self.config.normalize_identifiers;

        Ok(SessionContext::new_with_config(config))
    }

    /// Get the current configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Default for DataFusionSessionManager {
    fn default() -> Self {
        Self::default_config()
    }
}
