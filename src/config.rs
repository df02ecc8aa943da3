use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub cache: CacheConfig,
    pub llm: LlmConfig,
    pub executor: ExecutorConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub path: String,
    pub table_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Empty means no hosted gateway; only the rule-based generator runs
    pub gateway_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    pub timeout_secs: u64,
    pub row_limit: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Try to load from .env file before reading overrides
        let _ = dotenv::dotenv();

        let mut builder = config::Config::builder()
            .set_default("dataset.path", "./data/campaigns.csv")?
            .set_default("dataset.table_name", "campaigns")?
            .set_default("cache.max_entries", 256)?
            .set_default("cache.ttl_secs", 300)?
            .set_default("llm.gateway_url", "")?
            .set_default("llm.timeout_secs", 3)?
            .set_default("executor.timeout_secs", 30)?
            .set_default("executor.row_limit", 1000)?
            .set_default("history.url", "./query_history.db")?
            .set_default("logging.level", "info")?;

        if let Ok(path) = env::var("DATASET_PATH") {
            builder = builder.set_override("dataset.path", path)?;
        }

        if let Ok(table) = env::var("DATASET_TABLE") {
            builder = builder.set_override("dataset.table_name", table)?;
        }

        if let Ok(max_entries) = env::var("CACHE_MAX_ENTRIES") {
            builder = builder.set_override(
                "cache.max_entries",
                max_entries.parse::<u64>().unwrap_or(256),
            )?;
        }

        if let Ok(ttl) = env::var("CACHE_TTL_SECS") {
            builder = builder.set_override("cache.ttl_secs", ttl.parse::<u64>().unwrap_or(300))?;
        }

        if let Ok(gateway_url) = env::var("LLM_GATEWAY_URL") {
            builder = builder.set_override("llm.gateway_url", gateway_url)?;
        }

        if let Ok(api_key) = env::var("LLM_API_KEY") {
            builder = builder.set_override("llm.api_key", Some(api_key))?;
        }

        if let Ok(timeout) = env::var("LLM_TIMEOUT_SECS") {
            builder = builder.set_override("llm.timeout_secs", timeout.parse::<u64>().unwrap_or(3))?;
        }

        if let Ok(timeout) = env::var("QUERY_TIMEOUT_SECS") {
            builder =
                builder.set_override("executor.timeout_secs", timeout.parse::<u64>().unwrap_or(30))?;
        }

        if let Ok(limit) = env::var("QUERY_ROW_LIMIT") {
            builder = builder.set_override("executor.row_limit", limit.parse::<u64>().unwrap_or(1000))?;
        }

        if let Ok(history_url) = env::var("HISTORY_DATABASE_URL") {
            builder = builder.set_override("history.url", history_url)?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.executor.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        // Clear environment variables for this test
        env::remove_var("DATASET_PATH");
        env::remove_var("DATASET_TABLE");
        env::remove_var("CACHE_MAX_ENTRIES");
        env::remove_var("LLM_TIMEOUT_SECS");

        let config = Config::from_env();
        assert!(config.is_ok());

        let config = config.unwrap();
        assert_eq!(config.dataset.table_name, "campaigns");
        assert_eq!(config.cache.max_entries, 256);
        assert_eq!(config.generation_timeout(), Duration::from_secs(3));
        assert!(config.llm.api_key.is_none() || env::var("LLM_API_KEY").is_ok());
    }
}
