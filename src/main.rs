use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use campaign_query::config::Config;
use campaign_query::services::{FallbackGenerator, QueryService, QueryServiceSettings};
use campaign_query::storage::SqliteStorage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Initialize SQLite history storage
    let storage = Arc::new(SqliteStorage::new(&config.history.url).await.map_err(|e| {
        error!("Failed to initialize history database: {}", e);
        e
    })?);

    let generator = Arc::new(FallbackGenerator::from_config(&config.llm)?);
    info!("Query generation chain has {} generator(s)", generator.len());

    let service = QueryService::new(generator, QueryServiceSettings::from(&config)).with_history(storage);

    let schema = service
        .load_dataset_from_path(&config.dataset.path, &config.dataset.table_name)
        .await
        .map_err(|e| {
            error!("Failed to load dataset {}: {}", config.dataset.path, e);
            e
        })?;
    info!("Ready to answer questions about:\n{}", schema.describe());

    // One question per line on stdin, one JSON response per line on stdout
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        let response = service.ask(question).await;
        println!("{}", serde_json::to_string(&response)?);
    }

    if let Ok(stats) = service.cache().stats() {
        info!("Cache stats at shutdown: {:?}", stats);
    }

    Ok(())
}
