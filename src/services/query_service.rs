use datafusion::prelude::SessionContext;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::config::Config;
use crate::error::QueryError;
use crate::models::{AskResponse, Dataset, QueryHistory, QueryResult, SchemaDescriptor};
use crate::services::datafusion::{DataFusionCatalogManager, DataFusionQueryExecutor, DataFusionSessionManager};
use crate::services::dataset_loader::DatasetLoader;
use crate::services::llm_service::{GenerationRequest, QueryGenerator};
use crate::services::query_cache::ResultCache;
use crate::services::schema_registry::SchemaRegistry;
use crate::storage::SqliteStorage;
use crate::validation::{SqlValidator, ValidatedQuery, ValidationVerdict};

/// Generation attempts per question: the first try plus one regeneration
const MAX_GENERATION_ATTEMPTS: u8 = 2;

/// Tunables for the orchestrator
#[derive(Debug, Clone)]
pub struct QueryServiceSettings {
    pub generation_timeout: Duration,
    pub execution_timeout: Duration,
    /// LIMIT appended to queries without one
    pub row_limit: u64,
    pub cache_max_entries: usize,
    pub cache_ttl: Duration,
}

impl Default for QueryServiceSettings {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(3),
            execution_timeout: Duration::from_secs(30),
            row_limit: 1000,
            cache_max_entries: 256,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

impl From<&Config> for QueryServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            generation_timeout: config.generation_timeout(),
            execution_timeout: config.execution_timeout(),
            row_limit: config.executor.row_limit,
            cache_max_entries: config.cache.max_entries,
            cache_ttl: config.cache_ttl(),
        }
    }
}

/// Schema and engine session for the active dataset
pub struct LoadedDataset {
    pub schema: Arc<SchemaDescriptor>,
    pub executor: DataFusionQueryExecutor,
    pub row_count: usize,
}

/// Phases of one `ask`; failure leaves the loop with an error
#[derive(Debug)]
enum AskPhase {
    Received,
    CacheCheck,
    GeneratingQuery { attempt: u8, feedback: Option<String> },
    Validating { attempt: u8, candidate: String },
    Executing { query: ValidatedQuery },
    CachePopulate { result: QueryResult },
    Done(QueryResult),
}

impl AskPhase {
    fn name(&self) -> &'static str {
        match self {
            AskPhase::Received => "received",
            AskPhase::CacheCheck => "cache_check",
            AskPhase::GeneratingQuery { .. } => "generating_query",
            AskPhase::Validating { .. } => "validating",
            AskPhase::Executing { .. } => "executing",
            AskPhase::CachePopulate { .. } => "cache_populate",
            AskPhase::Done(_) => "done",
        }
    }
}

/// A failed `ask`, with the last candidate query if one was generated
#[derive(Debug)]
pub struct AskFailure {
    pub error: QueryError,
    pub generated_query: Option<String>,
}

/// Orchestrates question → candidate query → validation → cache/execution
pub struct QueryService {
    generator: Arc<dyn QueryGenerator>,
    cache: ResultCache,
    dataset: RwLock<Arc<LoadedDataset>>,
    session_manager: DataFusionSessionManager,
    history: Option<Arc<SqliteStorage>>,
    settings: QueryServiceSettings,
}

impl QueryService {
    /// Create a service with no dataset loaded
    pub fn new(generator: Arc<dyn QueryGenerator>, settings: QueryServiceSettings) -> Self {
        let session_manager = DataFusionSessionManager::default_config();
        let empty = LoadedDataset {
            schema: Arc::new(SchemaDescriptor::empty()),
            executor: DataFusionQueryExecutor::new(SessionContext::new(), settings.execution_timeout),
            row_count: 0,
        };

        Self {
            generator,
            cache: ResultCache::new(settings.cache_max_entries, settings.cache_ttl),
            dataset: RwLock::new(Arc::new(empty)),
            session_manager,
            history: None,
            settings,
        }
    }

    /// Record every `ask` outcome in the given history store
    pub fn with_history(mut self, history: Arc<SqliteStorage>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn settings(&self) -> &QueryServiceSettings {
        &self.settings
    }

    /// Schema of the active dataset
    pub async fn schema(&self) -> Arc<SchemaDescriptor> {
        Arc::clone(&self.dataset.read().await.schema)
    }

    /// Read a dataset from disk and make it the active one
    pub async fn load_dataset_from_path(
        &self,
        path: impl AsRef<Path>,
        table_name: &str,
    ) -> Result<Arc<SchemaDescriptor>, QueryError> {
        let dataset = DatasetLoader::load(path, table_name).await?;
        self.load_dataset(dataset).await
    }

    /// Build the schema and engine session for a dataset, then swap them in.
    ///
    /// The swap takes the write lock, so it waits for in-flight questions to
    /// finish. Cached answers are dropped on every load.
    pub async fn load_dataset(&self, dataset: Dataset) -> Result<Arc<SchemaDescriptor>, QueryError> {
        let schema = Arc::new(SchemaRegistry::build(&dataset));

        let ctx = self
            .session_manager
            .create_session()
            .map_err(|e| QueryError::Dataset(format!("{:#}", e)))?;
        let catalog = DataFusionCatalogManager::new(ctx);
        for table in schema.tables() {
            catalog
                .register_dataset(&dataset, table)
                .map_err(|e| QueryError::Dataset(format!("{:#}", e)))?;
        }

        let loaded = Arc::new(LoadedDataset {
            schema: Arc::clone(&schema),
            executor: DataFusionQueryExecutor::new(
                catalog.session_context().clone(),
                self.settings.execution_timeout,
            ),
            row_count: dataset.row_count(),
        });

        let mut active = self.dataset.write().await;
        let fingerprint_changed = active.schema.fingerprint() != schema.fingerprint();
        *active = loaded;
        if let Err(e) = self.cache.invalidate_all() {
            tracing::warn!("Failed to clear cache after dataset load: {}", e);
        }
        drop(active);

        tracing::info!(
            "Activated dataset {} ({} rows, fingerprint {}, schema changed: {})",
            dataset.table_name,
            dataset.row_count(),
            schema.fingerprint(),
            fingerprint_changed
        );
        Ok(schema)
    }

    /// Answer a question, reporting failure inside the response
    pub async fn ask(&self, question: &str) -> AskResponse {
        let start_time = Instant::now();
        let response = match self.run(question).await {
            Ok(result) => AskResponse::from_result(result),
            Err(failure) => {
                tracing::warn!("Question failed ({}): {}", failure.error.code(), failure.error);
                AskResponse::from_error(&failure.error, failure.generated_query, start_time.elapsed())
            }
        };

        if let Some(history) = &self.history {
            let entry = QueryHistory::from_response(question, &response);
            if let Err(e) = history.add_query_history(&entry).await {
                tracing::warn!("Failed to record query history: {}", e);
            }
        }

        response
    }

    /// Answer a question, returning the typed error on failure
    pub async fn try_ask(&self, question: &str) -> Result<QueryResult, QueryError> {
        self.run(question).await.map_err(|failure| failure.error)
    }

    async fn run(&self, question: &str) -> Result<QueryResult, AskFailure> {
        let start_time = Instant::now();

        // Held for the whole request so a reload waits for it
        let active = self.dataset.read().await;
        let schema = Arc::clone(&active.schema);

        let mut last_candidate: Option<String> = None;
        let fail = |error: QueryError, candidate: &Option<String>| AskFailure {
            error,
            generated_query: candidate.clone(),
        };

        let mut phase = AskPhase::Received;
        loop {
            tracing::debug!("ask phase: {}", phase.name());
            phase = match phase {
                AskPhase::Received => {
                    tracing::info!("Received question: {}", question);
                    AskPhase::CacheCheck
                }

                AskPhase::CacheCheck => match self.cache.get(question, schema.fingerprint()) {
                    Ok(Some(entry)) => AskPhase::Done(QueryResult {
                        rows: entry.rows,
                        query: entry.generated_query,
                        from_cache: true,
                        elapsed: start_time.elapsed(),
                        limit_applied: entry.limit_applied,
                    }),
                    Ok(None) => AskPhase::GeneratingQuery {
                        attempt: 1,
                        feedback: None,
                    },
                    Err(e) => {
                        tracing::warn!("Cache unavailable, treating as miss: {}", e);
                        AskPhase::GeneratingQuery {
                            attempt: 1,
                            feedback: None,
                        }
                    }
                },

                AskPhase::GeneratingQuery { attempt, feedback } => {
                    let mut request = GenerationRequest::new(question, Arc::clone(&schema));
                    if let Some(reason) = feedback {
                        request = request.with_feedback(reason);
                    }

                    let candidate = timeout(self.settings.generation_timeout, self.generator.generate(&request))
                        .await
                        .map_err(|_| {
                            QueryError::Generation(format!(
                                "Query generation timed out after {:?}",
                                self.settings.generation_timeout
                            ))
                        })
                        .and_then(|generated| generated)
                        .map_err(|e| fail(e, &last_candidate))?;

                    let candidate = candidate.trim().to_string();
                    if candidate.is_empty() {
                        return Err(fail(
                            QueryError::Generation("Generator returned an empty query".to_string()),
                            &last_candidate,
                        ));
                    }

                    tracing::debug!("Generated candidate (attempt {}): {}", attempt, candidate);
                    last_candidate = Some(candidate.clone());
                    AskPhase::Validating { attempt, candidate }
                }

                AskPhase::Validating { attempt, candidate } => {
                    match SqlValidator::validate(&candidate, &schema) {
                        ValidationVerdict::Accepted(query) => AskPhase::Executing { query },
                        ValidationVerdict::Rejected(reason) if attempt < MAX_GENERATION_ATTEMPTS => {
                            tracing::info!("Candidate rejected ({}), regenerating", reason);
                            AskPhase::GeneratingQuery {
                                attempt: attempt + 1,
                                feedback: Some(reason.to_string()),
                            }
                        }
                        ValidationVerdict::Rejected(reason) => {
                            return Err(fail(QueryError::Validation(reason), &last_candidate));
                        }
                    }
                }

                AskPhase::Executing { query } => {
                    let (sql, limit_applied) = query.with_default_limit(self.settings.row_limit);
                    let executed = active
                        .executor
                        .execute_query(&sql)
                        .await
                        .map_err(|e| fail(QueryError::Execution(format!("{:#}", e)), &Some(sql.clone())))?;

                    AskPhase::CachePopulate {
                        result: QueryResult {
                            rows: executed.rows,
                            query: sql,
                            from_cache: false,
                            elapsed: start_time.elapsed(),
                            limit_applied,
                        },
                    }
                }

                AskPhase::CachePopulate { result } => {
                    if let Err(e) = self.cache.put(
                        question,
                        schema.fingerprint(),
                        result.rows.clone(),
                        result.query.clone(),
                        result.limit_applied,
                    ) {
                        tracing::warn!("Failed to populate cache: {}", e);
                    }
                    AskPhase::Done(result)
                }

                AskPhase::Done(result) => {
                    tracing::info!(
                        "Answered question with {} rows (from_cache: {}, {:?})",
                        result.row_count(),
                        result.from_cache,
                        result.elapsed
                    );
                    return Ok(result);
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryHistoryStatus;
    use crate::services::llm_service::RuleBasedGenerator;
    use crate::validation::Rejection;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned candidates and records every request it sees
    #[derive(Default)]
    struct ScriptedGenerator {
        script: Mutex<VecDeque<Result<String, QueryError>>>,
        feedback: Mutex<Vec<Option<String>>>,
        delay: Option<Duration>,
    }

    impl ScriptedGenerator {
        fn new(script: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into_iter().map(|s| Ok(s.to_string())).collect()),
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.feedback.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl QueryGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String, QueryError> {
            self.feedback.lock().unwrap().push(request.feedback.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(QueryError::Generation("script exhausted".to_string())))
        }
    }

    fn campaigns() -> Dataset {
        Dataset::from_records(
            "campaigns",
            vec![
                json!({"Date": "2024-01-01", "Platform": "Google", "Spend": 100, "Clicks": 40}),
                json!({"Date": "2024-01-02", "Platform": "Meta", "Spend": 80, "Clicks": 25}),
                json!({"Date": "2024-01-03", "Platform": "Google", "Spend": 50, "Clicks": 10}),
            ],
        )
        .unwrap()
    }

    async fn service(generator: Arc<dyn QueryGenerator>, settings: QueryServiceSettings) -> QueryService {
        let service = QueryService::new(generator, settings);
        service.load_dataset(campaigns()).await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_rule_based_end_to_end() {
        let service = service(Arc::new(RuleBasedGenerator::default()), QueryServiceSettings::default()).await;

        let result = service.try_ask("Total spend by platform").await.unwrap();
        assert!(!result.from_cache);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.rows[0]["Platform"], json!("Google"));
        assert_eq!(result.rows[0]["sum_spend"], json!(150));
        assert_eq!(result.rows[1]["sum_spend"], json!(80));
    }

    #[tokio::test]
    async fn test_repeated_question_is_served_from_cache() {
        let generator = ScriptedGenerator::new(vec!["SELECT COUNT(*) AS n FROM campaigns"]);
        let service = service(generator.clone(), QueryServiceSettings::default()).await;

        let first = service.try_ask("How many campaigns?").await.unwrap();
        let second = service.try_ask("  how MANY   campaigns? ").await.unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.rows, second.rows);
        assert_eq!(first.query, second.query);
        assert_eq!(first.rows[0]["n"], json!(3));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_new_dataset_invalidates_cache() {
        let generator = ScriptedGenerator::new(vec![
            "SELECT COUNT(*) AS n FROM campaigns",
            "SELECT COUNT(*) AS n FROM campaigns",
        ]);
        let service = service(generator.clone(), QueryServiceSettings::default()).await;

        let before = service.schema().await;
        service.try_ask("how many rows").await.unwrap();

        let reshaped = Dataset::from_records(
            "campaigns",
            vec![json!({"Platform": "Google", "Impressions": 1000})],
        )
        .unwrap();
        let after = service.load_dataset(reshaped).await.unwrap();
        assert_ne!(before.fingerprint(), after.fingerprint());

        let result = service.try_ask("how many rows").await.unwrap();
        assert!(!result.from_cache);
        assert_eq!(result.rows[0]["n"], json!(1));
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_is_not_served() {
        let generator = ScriptedGenerator::new(vec![
            "SELECT Platform FROM campaigns",
            "SELECT Platform FROM campaigns",
        ]);
        let settings = QueryServiceSettings {
            cache_ttl: Duration::from_millis(100),
            ..QueryServiceSettings::default()
        };
        let service = service(generator.clone(), settings).await;

        assert!(!service.try_ask("platforms").await.unwrap().from_cache);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!service.try_ask("platforms").await.unwrap().from_cache);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_rejection_triggers_one_regeneration() {
        let generator = ScriptedGenerator::new(vec![
            "SELECT Platform, SUM(Budget) FROM campaigns GROUP BY Platform",
            "SELECT Platform, SUM(Spend) AS spend FROM campaigns GROUP BY Platform ORDER BY spend DESC",
        ]);
        let service = service(generator.clone(), QueryServiceSettings::default()).await;

        let result = service.try_ask("budget by platform").await.unwrap();
        assert_eq!(result.rows[0]["spend"], json!(150));
        assert_eq!(generator.calls(), 2);

        let feedback = generator.feedback.lock().unwrap().clone();
        assert_eq!(
            feedback,
            vec![None, Some("unrecognized column: Budget".to_string())]
        );
    }

    #[tokio::test]
    async fn test_string_alias_does_not_hide_unknown_column() {
        let generator = ScriptedGenerator::new(vec![
            "SELECT Budget 'b' FROM campaigns",
            "SELECT Spend FROM campaigns",
        ]);
        let service = service(generator.clone(), QueryServiceSettings::default()).await;

        let result = service.try_ask("show budgets").await.unwrap();
        assert_eq!(result.row_count(), 3);
        assert_eq!(
            generator.feedback.lock().unwrap().clone(),
            vec![None, Some("unrecognized column: Budget".to_string())]
        );
    }

    #[tokio::test]
    async fn test_lru_eviction_through_ask() {
        let generator = ScriptedGenerator::new(vec![
            "SELECT COUNT(*) AS n FROM campaigns",
            "SELECT Platform FROM campaigns",
            "SELECT Spend FROM campaigns",
            "SELECT COUNT(*) AS n FROM campaigns",
        ]);
        let settings = QueryServiceSettings {
            cache_max_entries: 2,
            ..QueryServiceSettings::default()
        };
        let service = service(generator.clone(), settings).await;

        assert!(!service.try_ask("question a").await.unwrap().from_cache);
        assert!(!service.try_ask("question b").await.unwrap().from_cache);
        assert!(!service.try_ask("question c").await.unwrap().from_cache);
        assert_eq!(generator.calls(), 3);

        // c is still cached; a was evicted as least recently used
        assert!(service.try_ask("question c").await.unwrap().from_cache);
        assert_eq!(generator.calls(), 3);
        assert!(!service.try_ask("question a").await.unwrap().from_cache);
        assert_eq!(generator.calls(), 4);
    }

    #[tokio::test]
    async fn test_large_dataset_keeps_every_value() {
        let mut records: Vec<_> = (0..1000)
            .map(|i| json!({"Platform": "Google", "Spend": i}))
            .collect();
        records.push(json!({"Platform": "Meta", "Spend": "1,200"}));
        let dataset = Dataset::from_records("campaigns", records).unwrap();

        let generator = ScriptedGenerator::new(vec![
            "SELECT COUNT(Spend) AS n, COUNT(*) AS total FROM campaigns",
        ]);
        let service = QueryService::new(generator, QueryServiceSettings::default());
        service.load_dataset(dataset).await.unwrap();

        let result = service.try_ask("count spend").await.unwrap();
        assert_eq!(result.rows[0]["n"], json!(1001));
        assert_eq!(result.rows[0]["total"], json!(1001));
    }

    #[tokio::test]
    async fn test_second_rejection_fails() {
        let generator = ScriptedGenerator::new(vec![
            "DROP TABLE campaigns",
            "SELECT * FROM campaigns; DELETE FROM campaigns",
        ]);
        let service = service(generator.clone(), QueryServiceSettings::default()).await;

        let response = service.ask("drop all campaigns").await;
        assert!(!response.success);
        assert!(response.rows.is_empty());
        assert_eq!(response.error.as_deref(), Some("Validation error: multiple statements"));
        assert_eq!(response.error_code.as_deref(), Some("VALIDATION_ERROR"));
        assert_eq!(
            response.generated_query,
            "SELECT * FROM campaigns; DELETE FROM campaigns"
        );
        assert_eq!(generator.calls(), 2);
        assert_eq!(
            generator.feedback.lock().unwrap()[1].as_deref(),
            Some("forbidden keyword: DROP")
        );
    }

    #[tokio::test]
    async fn test_execution_error_is_terminal_and_not_cached() {
        let generator = ScriptedGenerator::new(vec![
            "SELECT no_such_function(Spend) FROM campaigns",
            "SELECT no_such_function(Spend) FROM campaigns",
        ]);
        let service = service(generator.clone(), QueryServiceSettings::default()).await;

        let error = service.try_ask("weird").await.unwrap_err();
        assert!(matches!(error, QueryError::Execution(_)));
        assert_eq!(generator.calls(), 1);

        // Nothing was cached, so the generator runs again
        assert!(service.try_ask("weird").await.is_err());
        assert_eq!(generator.calls(), 2);
        assert!(service.cache().is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let generator = Arc::new(ScriptedGenerator {
            script: Mutex::new(VecDeque::from(vec![Ok("SELECT 1".to_string())])),
            delay: Some(Duration::from_millis(200)),
            ..ScriptedGenerator::default()
        });
        let settings = QueryServiceSettings {
            generation_timeout: Duration::from_millis(50),
            ..QueryServiceSettings::default()
        };
        let service = service(generator, settings).await;

        let error = service.try_ask("slow").await.unwrap_err();
        assert!(matches!(error, QueryError::Generation(ref msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn test_generator_error_fails_request() {
        let generator = Arc::new(ScriptedGenerator {
            script: Mutex::new(VecDeque::from(vec![Err(QueryError::Generation("gateway down".to_string()))])),
            ..ScriptedGenerator::default()
        });
        let service = service(generator, QueryServiceSettings::default()).await;

        let response = service.ask("anything").await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Generation error: gateway down"));
        assert_eq!(response.generated_query, "");
    }

    #[tokio::test]
    async fn test_default_limit_and_case_insensitive_identifiers() {
        let generator = ScriptedGenerator::new(vec![
            "select platform, spend from CAMPAIGNS where platform = 'Google' order by spend",
        ]);
        let service = service(generator, QueryServiceSettings::default()).await;

        let result = service.try_ask("google rows").await.unwrap();
        assert!(result.limit_applied);
        assert!(result.query.ends_with("LIMIT 1000"));
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.rows[0]["Spend"], json!(50));
        let keys: Vec<&String> = result.rows[0].keys().collect();
        assert_eq!(keys, vec!["Platform", "Spend"]);
    }

    #[tokio::test]
    async fn test_date_column_and_typed_literal() {
        let generator = ScriptedGenerator::new(vec![
            "SELECT COUNT(*) AS n FROM campaigns WHERE Date >= DATE '2024-01-02'",
        ]);
        let service = service(generator, QueryServiceSettings::default()).await;

        let result = service.try_ask("recent campaigns").await.unwrap();
        assert_eq!(result.rows[0]["n"], json!(2));
        assert!(result.limit_applied);
    }

    #[tokio::test]
    async fn test_unknown_table_rejected_before_execution() {
        let generator = ScriptedGenerator::new(vec!["SELECT * FROM users", "SELECT * FROM users"]);
        let service = service(generator, QueryServiceSettings::default()).await;

        let error = service.try_ask("list users").await.unwrap_err();
        assert!(matches!(
            error,
            QueryError::Validation(Rejection::UnrecognizedTable(ref table)) if table == "users"
        ));
    }

    #[tokio::test]
    async fn test_history_records_outcomes() {
        let history = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let generator = ScriptedGenerator::new(vec!["SELECT COUNT(*) AS n FROM campaigns"]);
        let service = QueryService::new(generator, QueryServiceSettings::default())
            .with_history(Arc::clone(&history));
        service.load_dataset(campaigns()).await.unwrap();

        assert!(service.ask("how many").await.success);
        assert!(service.ask("how many").await.from_cache);
        assert!(!service.ask("something else").await.success);

        let entries = history.list_query_history(10).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries
                .iter()
                .filter(|e| e.status == QueryHistoryStatus::Failed)
                .count(),
            1
        );
        assert!(entries.iter().any(|e| e.from_cache));
    }

    #[tokio::test]
    async fn test_no_dataset_loaded() {
        let service = QueryService::new(
            Arc::new(RuleBasedGenerator::default()),
            QueryServiceSettings::default(),
        );
        let error = service.try_ask("how many campaigns").await.unwrap_err();
        assert!(matches!(error, QueryError::Generation(_)));
    }
}
