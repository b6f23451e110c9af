//! SQLite execution engine.
//!
//! Compiles each statement before handing it to SQLite through sqlx, so
//! callers can feed generic or AI-written SQL straight in.

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::str::FromStr;
use tracing::{debug, info};

use crate::compiler::{Outcome, compile_detailed};
use crate::error::{CompileError, CompileResult};
use crate::normalizer::is_word_char;

/// Statements that produce a result set.
const ROW_KEYWORDS: &[&str] = &["SELECT", "WITH", "PRAGMA", "VALUES", "EXPLAIN"];

/// A pooled SQLite database that runs compiled statements.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

/// What a statement produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutput {
    Rows(ResultSet),
    Affected(u64),
}

/// Rows in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// One row of `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

impl Database {
    /// Open a database.
    ///
    /// Supported URL formats:
    /// - `sqlite::memory:`
    /// - `sqlite://path/to/file.db` (created when missing)
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let db = Database::connect("sqlite::memory:").await?;
    /// ```
    pub async fn connect(url: &str) -> CompileResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| CompileError::Connection(e.to_string()))?
            .create_if_missing(true);

        // Every in-memory connection is its own database.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| CompileError::Connection(e.to_string()))?;

        info!(url, "connected");
        Ok(Self { pool })
    }

    /// Compile and execute one statement.
    pub async fn run(&self, text: &str) -> CompileResult<QueryOutput> {
        let compiled = compile_detailed(text)?;
        if compiled.sql.trim().is_empty() {
            return Err(CompileError::EmptyStatement);
        }
        if compiled.outcome == Outcome::Fallback {
            debug!("executing CREATE TABLE that could not be rewritten");
        }
        debug!(original = %text.trim(), compiled = %compiled.sql, "executing");

        if returns_rows(&compiled.sql) {
            let rows = sqlx::query(&compiled.sql)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| CompileError::Execution(e.to_string()))?;
            Ok(QueryOutput::Rows(result_set(&rows)))
        } else {
            let result = sqlx::query(&compiled.sql)
                .execute(&self.pool)
                .await
                .map_err(|e| CompileError::Execution(e.to_string()))?;
            Ok(QueryOutput::Affected(result.rows_affected()))
        }
    }

    /// Names of user tables, sorted.
    pub async fn tables(&self) -> CompileResult<Vec<String>> {
        sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CompileError::Execution(e.to_string()))
    }

    /// Column layout of a table. Empty when the table does not exist.
    pub async fn table_schema(&self, table: &str) -> CompileResult<Vec<ColumnInfo>> {
        let rows = sqlx::query(
            "SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?)",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CompileError::Execution(e.to_string()))?;

        rows.iter()
            .map(|row| -> Result<ColumnInfo, sqlx::Error> {
                Ok(ColumnInfo {
                    cid: row.try_get("cid")?,
                    name: row.try_get("name")?,
                    data_type: row.try_get("type")?,
                    not_null: row.try_get::<i64, _>("notnull")? != 0,
                    default: row.try_get("dflt_value")?,
                    primary_key: row.try_get::<i64, _>("pk")? > 0,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CompileError::Execution(e.to_string()))
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Whether a statement's first keyword produces rows.
fn returns_rows(sql: &str) -> bool {
    let first = sql
        .trim_start()
        .split(|c: char| !is_word_char(c))
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    ROW_KEYWORDS.contains(&first.as_str())
}

fn result_set(rows: &[SqliteRow]) -> ResultSet {
    let Some(first) = rows.first() else {
        return ResultSet::default();
    };

    ResultSet {
        columns: first.columns().iter().map(|c| c.name().to_string()).collect(),
        rows: rows.iter().map(row_values).collect(),
    }
}

/// Convert a row by the storage class of each value.
fn row_values(row: &SqliteRow) -> Vec<serde_json::Value> {
    (0..row.columns().len())
        .map(|i| {
            let type_name = match row.try_get_raw(i) {
                Ok(raw) if raw.is_null() => return serde_json::Value::Null,
                Ok(raw) => raw.type_info().name().to_string(),
                Err(_) => return serde_json::Value::Null,
            };

            match type_name.as_str() {
                "INTEGER" | "BOOLEAN" => row
                    .try_get::<i64, _>(i)
                    .map(|v| serde_json::Value::Number(v.into()))
                    .unwrap_or(serde_json::Value::Null),
                "REAL" | "NUMERIC" => row
                    .try_get::<f64, _>(i)
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
                "BLOB" => row
                    .try_get::<Vec<u8>, _>(i)
                    .map(serde_json::Value::from)
                    .unwrap_or(serde_json::Value::Null),
                _ => row
                    .try_get::<String, _>(i)
                    .map(serde_json::Value::String)
                    .unwrap_or(serde_json::Value::Null),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn memory_db() -> Database {
        Database::connect("sqlite::memory:").await.unwrap()
    }

    #[test]
    fn test_returns_rows() {
        assert!(returns_rows("SELECT 1"));
        assert!(returns_rows("  with x as (select 1) select * from x"));
        assert!(returns_rows("PRAGMA table_info(t)"));
        assert!(!returns_rows("INSERT INTO t VALUES (1)"));
        assert!(!returns_rows("CREATE TABLE t (\n    a TEXT\n)"));
    }

    #[tokio::test]
    async fn test_create_insert_select() {
        let db = memory_db().await;

        let out = db
            .run("CREATE TABLE users (id INT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(50) NOT NULL, score DECIMAL(5,2))")
            .await
            .unwrap();
        assert_eq!(out, QueryOutput::Affected(0));

        let out = db
            .run("INSERT INTO users (name, score) VALUES ('ada', 9.5)")
            .await
            .unwrap();
        assert_eq!(out, QueryOutput::Affected(1));

        let out = db.run("SELECT id, name, score FROM users").await.unwrap();
        assert_eq!(
            out,
            QueryOutput::Rows(ResultSet {
                columns: vec!["id".into(), "name".into(), "score".into()],
                rows: vec![vec![json!(1), json!("ada"), json!(9.5)]],
            })
        );
    }

    #[tokio::test]
    async fn test_date_functions_are_rewritten_before_execution() {
        let db = memory_db().await;
        let out = db.run("SELECT CURRENT_DATE AS today, NOW() AS ts").await.unwrap();
        let QueryOutput::Rows(set) = out else {
            panic!("expected rows");
        };
        assert_eq!(set.columns, vec!["today", "ts"]);
        let today = set.rows[0][0].as_str().unwrap();
        assert_eq!(today.len(), 10);
        assert!(set.rows[0][1].as_str().unwrap().starts_with(today));
    }

    #[tokio::test]
    async fn test_tables_and_schema() {
        let db = memory_db().await;
        db.run("CREATE TABLE b (x INT)").await.unwrap();
        db.run("CREATE TABLE a (id BIGINT PRIMARY KEY, label VARCHAR(10) NOT NULL)")
            .await
            .unwrap();

        assert_eq!(db.tables().await.unwrap(), vec!["a", "b"]);

        let schema = db.table_schema("a").await.unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0].name, "id");
        assert_eq!(schema[0].data_type, "INTEGER");
        assert!(schema[0].primary_key);
        assert_eq!(schema[1].data_type, "TEXT");
        assert!(schema[1].not_null);

        assert!(db.table_schema("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_statement_is_rejected() {
        let db = memory_db().await;
        assert!(matches!(db.run("  ").await, Err(CompileError::EmptyStatement)));
    }

    #[tokio::test]
    async fn test_engine_errors_are_execution_errors() {
        let db = memory_db().await;
        let err = db.run("SELECT * FROM nowhere").await.unwrap_err();
        assert!(matches!(err, CompileError::Execution(_)));
    }

    #[tokio::test]
    async fn test_select_without_rows() {
        let db = memory_db().await;
        db.run("CREATE TABLE t (a INT)").await.unwrap();
        let out = db.run("SELECT a FROM t").await.unwrap();
        assert_eq!(out, QueryOutput::Rows(ResultSet::default()));
    }
}
