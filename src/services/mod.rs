pub mod dataset_loader;
pub mod llm_service;
pub mod query_cache; // Query result cache with LRU and TTL
pub mod query_service;
pub mod schema_registry;
pub mod datafusion; // DataFusion execution layer

pub use dataset_loader::*;
pub use llm_service::*;
pub use query_cache::*;
pub use query_service::*;
pub use schema_registry::*;
