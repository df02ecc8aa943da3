// DataFusion Execution Layer
//
// The loaded dataset lives in a DataFusion SessionContext as an Arrow
// MemTable. This module provides:
// 1. Session creation (session)
// 2. Dataset registration with Arrow types derived from the schema (catalog)
// 3. Timed query execution (executor)
// 4. RecordBatch to JSON row conversion (converter)

pub mod catalog; // DataFusionCatalogManager
pub mod converter; // DataFusionResultConverter
pub mod executor; // DataFusionQueryExecutor
pub mod session; // DataFusionSessionManager

// Re-exports for convenient access
pub use catalog::DataFusionCatalogManager;
pub use converter::DataFusionResultConverter;
pub use executor::{DataFusionQueryExecutor, QueryExecutionResult};
pub use session::{DataFusionSessionManager, SessionConfig};
