use liteql::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_generic_schema_runs_on_sqlite() {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    let schema = r#"
        -- accounts
        CREATE TABLE IF NOT EXISTS accounts (
            id BIGINT PRIMARY KEY,
            email VARCHAR(255) NOT NULL UNIQUE,
            balance DECIMAL(12, 2),
            avatar VARBINARY(1024),
            created_at TIMESTAMP,
            CONSTRAINT chk_balance CHECK (balance >= 0)
        )
    "#;
    db.run(schema).await.expect("Failed to create table");

    db.run("INSERT INTO accounts (id, email, balance) VALUES (1, 'a@example.com', 10.5)")
        .await
        .unwrap();
    db.run("UPDATE accounts SET created_at = NOW() WHERE id = 1")
        .await
        .unwrap();

    let out = db
        .run("SELECT email, balance, created_at IS NOT NULL AS stamped FROM accounts")
        .await
        .unwrap();
    assert_eq!(
        out,
        QueryOutput::Rows(ResultSet {
            columns: vec!["email".into(), "balance".into(), "stamped".into()],
            rows: vec![vec![json!("a@example.com"), json!(10.5), json!(1)]],
        })
    );

    let columns = db.table_schema("accounts").await.unwrap();
    let types: Vec<&str> = columns.iter().map(|c| c.data_type.as_str()).collect();
    assert_eq!(types, vec!["INTEGER", "TEXT", "REAL", "BLOB", "TEXT"]);

    // Second run is a no-op thanks to IF NOT EXISTS.
    db.run(schema).await.expect("IF NOT EXISTS should be kept");
}

#[tokio::test]
async fn test_unique_constraint_is_enforced() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.run("CREATE TABLE t (code CHAR(3) UNIQUE)").await.unwrap();
    db.run("INSERT INTO t VALUES ('abc')").await.unwrap();

    let err = db.run("INSERT INTO t VALUES ('abc')").await.unwrap_err();
    assert!(matches!(err, CompileError::Execution(_)));
}
