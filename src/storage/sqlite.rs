use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::{QueryHistory, QueryHistoryStatus};

/// SQLite storage for the question history
/// Uses tokio::Mutex for async-friendly locking
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new<P: AsRef<Path>>(db_path: P) -> SqliteResult<Self> {
        // Handle SQLite URL format (sqlite:./path or sqlite://path)
        let path_str = db_path.as_ref().to_string_lossy();
        let clean_path: &str = match path_str.strip_prefix("sqlite:") {
            Some(rest) => rest.trim_start_matches("//"),
            None => path_str.as_ref(),
        };

        let conn = Connection::open(clean_path)?;
        let storage = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Storage that lives only as long as the process
    pub async fn in_memory() -> SqliteResult<Self> {
        let storage = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS query_history (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL,
                generated_query TEXT NOT NULL,
                row_count INTEGER NOT NULL,
                execution_time_ms INTEGER NOT NULL,
                status TEXT NOT NULL,
                from_cache INTEGER NOT NULL DEFAULT 0,
                error_message TEXT,
                executed_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_query_history_executed ON query_history(executed_at DESC)",
            [],
        )?;

        Ok(())
    }

    // ============================================================================
    // Query History Operations
    // ============================================================================

    /// Add a question outcome to history
    pub async fn add_query_history(&self, history: &QueryHistory) -> SqliteResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO query_history
            (id, question, generated_query, row_count, execution_time_ms, status, from_cache, error_message, executed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            rusqlite::params![
                history.id,
                history.question,
                history.generated_query,
                history.row_count as i64,
                history.execution_time_ms as i64,
                history.status.as_str(),
                history.from_cache,
                history.error_message,
                history.executed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List query history, most recent first (with limit)
    pub async fn list_query_history(&self, limit: usize) -> SqliteResult<Vec<QueryHistory>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, question, generated_query, row_count, execution_time_ms, status, from_cache, error_message, executed_at
            FROM query_history
            ORDER BY executed_at DESC
            LIMIT ?1
            "#,
        )?;

        let histories = stmt.query_map(rusqlite::params![limit as i64], |row| {
            let status = match row.get::<_, String>(5)?.as_str() {
                "success" => QueryHistoryStatus::Success,
                _ => QueryHistoryStatus::Failed,
            };

            let executed_at = row.get::<_, String>(8)?;
            let executed_at = chrono::DateTime::parse_from_rfc3339(&executed_at)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
                })?
                .with_timezone(&chrono::Utc);

            Ok(QueryHistory {
                id: row.get(0)?,
                question: row.get(1)?,
                generated_query: row.get(2)?,
                row_count: row.get::<_, i64>(3)? as usize,
                execution_time_ms: row.get::<_, i64>(4)? as u64,
                status,
                from_cache: row.get(6)?,
                error_message: row.get(7)?,
                executed_at,
            })
        })?;

        histories.collect()
    }

    /// Number of recorded questions
    pub async fn count_query_history(&self) -> SqliteResult<usize> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM query_history", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AskResponse;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    fn history(question: &str, success: bool) -> QueryHistory {
        let response = AskResponse {
            success,
            rows: Vec::new(),
            generated_query: "SELECT COUNT(*) FROM campaigns".to_string(),
            from_cache: false,
            elapsed_seconds: 0.25,
            error: (!success).then(|| "Execution error: boom".to_string()),
            error_code: None,
        };
        QueryHistory::from_response(question, &response)
    }

    #[test]
    fn test_sqlite_storage_creation() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("history.db");
        let rt = tokio::runtime::Runtime::new().unwrap();
        let storage = rt.block_on(async { SqliteStorage::new(&db_path).await });
        assert!(storage.is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn test_sqlite_url_prefix_is_stripped() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("prefixed.db");
        let url = format!("sqlite://{}", db_path.display());
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async { SqliteStorage::new(&url).await.unwrap() });
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_add_and_list_history() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(dir.path().join("history.db")).await.unwrap();

        let mut older = history("how many campaigns?", true);
        older.executed_at = Utc::now() - Duration::minutes(5);
        let newer = history("spend by platform", false);

        storage.add_query_history(&older).await.unwrap();
        storage.add_query_history(&newer).await.unwrap();

        let listed = storage.list_query_history(10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].question, "spend by platform");
        assert_eq!(listed[0].status, QueryHistoryStatus::Failed);
        assert_eq!(listed[0].error_message.as_deref(), Some("Execution error: boom"));
        assert_eq!(listed[1].status, QueryHistoryStatus::Success);
        assert_eq!(listed[1].execution_time_ms, 250);

        let limited = storage.list_query_history(1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(storage.count_query_history().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_storage() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        storage.add_query_history(&history("q", true)).await.unwrap();
        assert_eq!(storage.count_query_history().await.unwrap(), 1);
    }
}
