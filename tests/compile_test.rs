use liteql::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn test_create_table_with_constraints() {
    let sql = compile(
        "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(50) NOT NULL, email VARCHAR(100) UNIQUE)",
    )
    .expect("Failed to compile CREATE TABLE");

    assert_eq!(
        sql,
        "CREATE TABLE users (\n    id INTEGER PRIMARY KEY,\n    name TEXT NOT NULL,\n    email TEXT UNIQUE\n)"
    );
}

#[test]
fn test_now_rewrite_leaves_other_tokens_alone() {
    let sql = compile("SELECT * FROM events WHERE created_at = NOW()").unwrap();
    assert_eq!(sql, "SELECT * FROM events WHERE created_at = datetime('now')");
}

#[test]
fn test_comment_inside_column_list() {
    let sql = compile("CREATE TABLE t (/* pk */ id INT PRIMARY KEY)").unwrap();
    assert_eq!(sql, "CREATE TABLE t (\n    id INTEGER PRIMARY KEY\n)");
}

#[test]
fn test_empty_input() {
    for input in ["", "   ", "\n\t", "-- only a comment"] {
        assert_eq!(compile(input).unwrap(), "");
        let err = validate(input).unwrap_err();
        assert!(matches!(err, CompileError::EmptyStatement));
        assert!(err.to_string().to_lowercase().contains("empty"));
    }
}

#[test]
fn test_precision_type_keeps_column_list() {
    let sql = compile("CREATE TABLE t (a DECIMAL(10,2), b INT)").unwrap();
    assert_eq!(sql, "CREATE TABLE t (\n    a REAL,\n    b INTEGER\n)");
}

#[test]
fn test_multiline_create_table() {
    let query = r#"
        CREATE TABLE orders (
            id BIGINT PRIMARY KEY,   -- surrogate key
            total NUMERIC(12, 2) NOT NULL,
            note TEXT,
            placed_at TIMESTAMP
        )
    "#;

    let sql = compile(query).expect("Failed to compile multiline CREATE TABLE");
    assert_eq!(
        sql,
        "CREATE TABLE orders (\n    id INTEGER PRIMARY KEY,\n    total REAL NOT NULL,\n    note TEXT,\n    placed_at TEXT\n)"
    );
}

#[test]
fn test_compile_is_idempotent() {
    let inputs = [
        "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(50) NOT NULL)",
        "SELECT * FROM events WHERE created_at = NOW() AND day = CURRENT_DATE",
        "INSERT INTO t (a) VALUES (1)",
        "/* header */ SELECT CURRENT_TIME",
    ];
    for input in inputs {
        let once = compile(input).unwrap();
        let twice = compile(&once).unwrap();
        assert_eq!(once, twice, "not idempotent for {input:?}");
    }
}

#[test]
fn test_column_order_is_preserved() {
    let sql = compile("CREATE TABLE t (z INT, a TEXT, m BLOB, b FLOAT)").unwrap();
    let names: Vec<&str> = sql
        .lines()
        .skip(1)
        .filter_map(|l| l.split_whitespace().next())
        .filter(|w| *w != ")")
        .collect();
    assert_eq!(names, vec!["z", "a", "m", "b"]);
}

#[test]
fn test_constraint_order_is_canonical() {
    let sql = compile("CREATE TABLE t (id INT UNIQUE NOT NULL PRIMARY KEY)").unwrap();
    assert_eq!(
        sql,
        "CREATE TABLE t (\n    id INTEGER PRIMARY KEY NOT NULL UNIQUE\n)"
    );
}

#[test]
fn test_rewrite_matches_whole_words_only() {
    let sql = compile("SELECT current_date_col, NOW_x, CURRENT_TIMESTAMP FROM t").unwrap();
    assert_eq!(sql, "SELECT current_date_col, NOW_x, CURRENT_TIMESTAMP FROM t");
}

#[test]
fn test_rewrite_is_case_insensitive() {
    let sql = compile("select now(), current_date, Current_Time").unwrap();
    assert_eq!(sql, "select datetime('now'), date('now'), time('now')");
}

#[test]
fn test_comments_never_change_the_result() {
    let plain = compile("SELECT a FROM t WHERE b = NOW()").unwrap();
    let commented = compile("SELECT a /* cols */ FROM t -- source\nWHERE b = NOW()").unwrap();
    assert_eq!(
        plain.split_whitespace().collect::<Vec<_>>(),
        commented.split_whitespace().collect::<Vec<_>>()
    );
}

#[test]
fn test_insert_passes_through() {
    let input = "INSERT INTO logs (at) VALUES (NOW())";
    let compiled = compile_detailed(input).unwrap();
    assert_eq!(compiled.sql, input);
    assert_eq!(compiled.kind, StatementKind::Insert);
    assert_eq!(compiled.outcome, Outcome::Passthrough);
}

#[test]
fn test_missing_column_list_falls_back() {
    let compiled = compile_detailed("CREATE TABLE t AS SELECT 1").unwrap();
    assert_eq!(compiled.sql, "CREATE TABLE t AS SELECT 1");
    assert_eq!(compiled.outcome, Outcome::Fallback);
}

#[test]
fn test_every_declared_type_maps_to_a_storage_class() {
    let targets = [
        TargetType::Text,
        TargetType::Real,
        TargetType::Integer,
        TargetType::Blob,
    ];
    for (declared, target) in supported_types() {
        assert!(targets.contains(&target), "{declared} maps outside the table");
        let sql = compile(&format!("CREATE TABLE t (c {declared})")).unwrap();
        assert!(sql.contains(&format!("c {target}")), "{declared}: {sql}");
    }

    let sql = compile("CREATE TABLE t (c GEOMETRY)").unwrap();
    assert!(sql.contains("c TEXT"));
}

#[test]
fn test_check_reports_flag_and_message() {
    let ok = check("SELECT 1");
    assert!(ok.valid);
    assert_eq!(ok.message, None);

    let bad = check("   ");
    assert!(!bad.valid);
    assert!(bad.message.is_some());
}

#[test]
fn test_catalog() {
    let functions = supported_functions();
    for f in ["COUNT", "SUBSTR", "datetime", "date", "time"] {
        assert!(functions.contains(&f));
    }
    assert_eq!(supported_types().get("VARCHAR"), Some(&TargetType::Text));
    assert_eq!(supported_types().get("DECIMAL"), Some(&TargetType::Real));
}
