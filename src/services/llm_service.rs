use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::QueryError;
use crate::models::{SchemaDescriptor, SemanticType, TableDescriptor};

/// Input for one query generation attempt
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub question: String,
    pub schema: Arc<SchemaDescriptor>,
    /// Rejection reason from the previous attempt, if this is a regeneration
    pub feedback: Option<String>,
}

impl GenerationRequest {
    pub fn new(question: impl Into<String>, schema: Arc<SchemaDescriptor>) -> Self {
        Self {
            question: question.into(),
            schema,
            feedback: None,
        }
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}

/// Text-generation collaborator that turns a question into a candidate query
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, QueryError>;
}

/// Build the generation prompt for a request
pub fn build_prompt(request: &GenerationRequest) -> String {
    let schema_context = request.schema.describe();

    let feedback = match &request.feedback {
        Some(reason) => format!(
            "\nThe previous query was rejected ({reason}). Write a corrected query.\n"
        ),
        None => String::new(),
    };

    format!(
        r#"You are a SQL expert. Given a table schema and a natural language question about marketing campaigns, generate a single read-only SELECT query.

Database Schema:
{schema_context}
Question: {question}
{feedback}
Instructions:
1. Generate ONLY one SELECT (or WITH ... SELECT) query
2. Do not include any explanations, comments, or markdown formatting
3. Use only the table and column names from the schema above
4. Wrap column names in double quotes exactly as written in the schema
5. Do not end the query with a semicolon
6. If the question asks "how many" or for a count, use COUNT(*)

SQL Query:"#,
        schema_context = schema_context,
        question = request.question,
        feedback = feedback,
    )
}

/// Strip markdown code fences and surrounding whitespace
pub fn clean_generated_sql(text: &str) -> String {
    text.trim()
        .trim_start_matches("```sql")
        .trim_start_matches("```SQL")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
        .to_string()
}

/// Generator backed by an HTTP LLM gateway
pub struct HttpQueryGenerator {
    gateway_url: String,
    api_key: Option<String>,
    http_client: HttpClient,
}

impl HttpQueryGenerator {
    /// The request timeout is two thirds of the generation budget, leaving
    /// room for a fallback generator in the same budget.
    pub fn new(config: &LlmConfig) -> Result<Self, QueryError> {
        let request_timeout = Duration::from_millis(config.timeout_secs.saturating_mul(1000) * 2 / 3);
        let http_client = HttpClient::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| QueryError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            gateway_url: config.gateway_url.clone(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }

    /// Call LLM API to generate SQL
    async fn call_llm_api(&self, prompt: &str) -> Result<String, QueryError> {
        let mut request = self.http_client.post(&self.gateway_url).json(&json!({
            "prompt": prompt,
            "max_tokens": 500,
            "temperature": 0.1,
        }));

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| QueryError::Generation(format!("Failed to call LLM service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(QueryError::Generation(format!(
                "LLM service returned error {}: {}",
                status, error_text
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| QueryError::Generation(format!("Failed to parse LLM response: {}", e)))?;

        let sql = result["text"]
            .as_str()
            .or_else(|| result["content"].as_str())
            .or_else(|| result["response"].as_str())
            .ok_or_else(|| QueryError::Generation("LLM response does not contain SQL query".to_string()))?;

        Ok(clean_generated_sql(sql))
    }
}

#[async_trait]
impl QueryGenerator for HttpQueryGenerator {
    fn name(&self) -> &str {
        "llm-gateway"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, QueryError> {
        let sql = self.call_llm_api(&build_prompt(request)).await?;
        if sql.is_empty() {
            return Err(QueryError::Generation("LLM returned an empty query".to_string()));
        }
        Ok(sql)
    }
}

/// Offline generator using simple pattern matching over the question
///
/// - count questions produce `SELECT COUNT(*)`
/// - "<metric> by <column>" produces a grouped aggregate
/// - anything else selects a bounded sample of rows
pub struct RuleBasedGenerator {
    sample_limit: u64,
}

impl RuleBasedGenerator {
    pub fn new(sample_limit: u64) -> Self {
        Self { sample_limit }
    }

    fn generate_sql(&self, question: &str, table: &TableDescriptor) -> String {
        let question = question.to_lowercase();
        let table_name = quote_ident(&table.name);

        let is_count_query = ["how many", "count", "number of"]
            .iter()
            .any(|pattern| question.contains(pattern));

        if let Some((metric_part, group_part)) = question.split_once(" by ") {
            let metric = table
                .columns
                .iter()
                .filter(|c| c.semantic_type == SemanticType::Numeric)
                .find(|c| mentions(metric_part, &c.name));
            let group = table.columns.iter().find(|c| mentions(group_part, &c.name));

            match (metric, group) {
                (Some(metric), Some(group)) if metric.name != group.name => {
                    let function = aggregate_function(metric_part);
                    let alias = format!("{}_{}", function.to_lowercase(), alias_part(&metric.name));
                    return format!(
                        "SELECT {group}, {function}({metric}) AS {alias} FROM {table_name} GROUP BY {group} ORDER BY {alias} DESC",
                        group = quote_ident(&group.name),
                        metric = quote_ident(&metric.name),
                    );
                }
                (None, Some(group)) if is_count_query => {
                    return format!(
                        "SELECT {group}, COUNT(*) AS row_count FROM {table_name} GROUP BY {group} ORDER BY row_count DESC",
                        group = quote_ident(&group.name),
                    );
                }
                _ => {}
            }
        }

        if is_count_query {
            format!("SELECT COUNT(*) AS row_count FROM {}", table_name)
        } else {
            format!("SELECT * FROM {} LIMIT {}", table_name, self.sample_limit)
        }
    }
}

impl Default for RuleBasedGenerator {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl QueryGenerator for RuleBasedGenerator {
    fn name(&self) -> &str {
        "rule-based"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, QueryError> {
        let table = request
            .schema
            .tables()
            .first()
            .ok_or_else(|| QueryError::Generation("No dataset loaded".to_string()))?;

        let sql = self.generate_sql(&request.question, table);
        tracing::warn!(
            "Using fallback SQL generation. Configure LLM service for better results. Generated: {}",
            sql
        );
        Ok(sql)
    }
}

/// Tries an ordered list of generators; the first success wins
pub struct FallbackGenerator {
    generators: Vec<Arc<dyn QueryGenerator>>,
}

impl FallbackGenerator {
    pub fn new(generators: Vec<Arc<dyn QueryGenerator>>) -> Self {
        Self { generators }
    }

    /// Build the chain from configuration: the gateway when configured,
    /// then the rule-based generator
    pub fn from_config(config: &LlmConfig) -> Result<Self, QueryError> {
        let mut generators: Vec<Arc<dyn QueryGenerator>> = Vec::new();
        if !config.gateway_url.is_empty() {
            generators.push(Arc::new(HttpQueryGenerator::new(config)?));
        }
        generators.push(Arc::new(RuleBasedGenerator::default()));
        Ok(Self::new(generators))
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

#[async_trait]
impl QueryGenerator for FallbackGenerator {
    fn name(&self) -> &str {
        "fallback-chain"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, QueryError> {
        let mut last_error = None;
        for generator in &self.generators {
            match generator.generate(request).await {
                Ok(sql) => return Ok(sql),
                Err(e) => {
                    tracing::warn!("Generator {} failed: {}", generator.name(), e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| QueryError::Generation("No query generators configured".to_string())))
    }
}

/// Whether a question fragment mentions a column, allowing spaces for underscores
fn mentions(text: &str, column: &str) -> bool {
    let column = column.to_lowercase();
    text.contains(&column) || text.contains(&column.replace('_', " "))
}

fn aggregate_function(metric_part: &str) -> &'static str {
    if ["average", "avg", "mean"].iter().any(|w| metric_part.contains(w)) {
        "AVG"
    } else if ["max", "highest", "largest"].iter().any(|w| metric_part.contains(w)) {
        "MAX"
    } else if ["min", "lowest", "smallest"].iter().any(|w| metric_part.contains(w)) {
        "MIN"
    } else {
        "SUM"
    }
}

fn alias_part(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
