//! The compile pipeline and its read-only catalog.
//!
//! ```text
//! raw text ─► normalize ─┬─ CREATE TABLE ─► parse columns ─► map types ─► emit
//!                        ├─ INSERT ───────► passthrough
//!                        └─ other ────────► date/time function rewrite
//! ```
//!
//! Every call is a pure function of its input; nothing is shared between
//! calls except the immutable type table, so calls may run on any number of
//! threads at once.

use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace, warn};

use crate::error::{CompileError, CompileResult};
use crate::normalizer::{StatementKind, normalize};
use crate::transpiler::{CreateTable, ToSql, rewrite_functions, rewrite_insert};
use crate::types::{self, TargetType};

/// How the statement text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The statement-specific rewrite ran.
    Rewritten,
    /// INSERT text returned as-is.
    Passthrough,
    /// A `CREATE TABLE` whose column list could not be located, returned
    /// without comments but otherwise unmodified. Treat as needing review.
    Fallback,
}

/// The result of one compile call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compilation {
    pub sql: String,
    pub kind: StatementKind,
    pub outcome: Outcome,
}

/// Validation result as a flag plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub message: Option<String>,
}

/// Functions SQLite supports that callers may advertise.
pub const SUPPORTED_FUNCTIONS: &[&str] = &[
    "COUNT", "SUM", "AVG", "MIN", "MAX", "UPPER", "LOWER", "LENGTH", "SUBSTR", "datetime", "date",
    "time",
];

/// Compile SQL text into a statement SQLite accepts.
///
/// Empty input compiles to an empty string.
///
/// # Example
///
/// ```
/// let sql = liteql::compile("CREATE TABLE t (id INT PRIMARY KEY)").unwrap();
/// assert_eq!(sql, "CREATE TABLE t (\n    id INTEGER PRIMARY KEY\n)");
/// ```
pub fn compile(text: &str) -> CompileResult<String> {
    compile_detailed(text).map(|c| c.sql)
}

/// Compile and report the statement kind and which path produced the text.
pub fn compile_detailed(text: &str) -> CompileResult<Compilation> {
    guarded(|| run_pipeline(text))
}

/// Check that the input compiles to a non-empty statement.
///
/// Purely syntactic: no database is consulted.
pub fn validate(text: &str) -> CompileResult<()> {
    let compiled = compile_detailed(text)?;
    if compiled.sql.trim().is_empty() {
        return Err(CompileError::EmptyStatement);
    }
    Ok(())
}

/// [`validate`] as a `(valid, message)` pair.
pub fn check(text: &str) -> Validation {
    match validate(text) {
        Ok(()) => Validation {
            valid: true,
            message: None,
        },
        Err(e) => Validation {
            valid: false,
            message: Some(e.to_string()),
        },
    }
}

/// The functions callers may advertise, in display order.
pub fn supported_functions() -> Vec<&'static str> {
    SUPPORTED_FUNCTIONS.to_vec()
}

/// A copy of the generic-to-SQLite type table.
pub fn supported_types() -> BTreeMap<&'static str, TargetType> {
    types::supported_types()
}

fn run_pipeline(text: &str) -> Compilation {
    let (stripped, kind) = normalize(text);
    debug!(%kind, "compiling statement");
    trace!(sql = %stripped, "comments stripped");

    let (sql, outcome) = match kind {
        StatementKind::CreateTable => match CreateTable::parse(&stripped) {
            Some(table) => {
                debug!(table = %table.name, columns = table.columns.len(), "rebuilt CREATE TABLE");
                (table.to_sql(), Outcome::Rewritten)
            }
            None => {
                warn!("CREATE TABLE column list not found, returning statement unmodified");
                (stripped, Outcome::Fallback)
            }
        },
        StatementKind::Insert => (rewrite_insert(&stripped), Outcome::Passthrough),
        StatementKind::Other => (rewrite_functions(&stripped), Outcome::Rewritten),
    };

    trace!(%sql, ?outcome, "compiled");
    Compilation { sql, kind, outcome }
}

/// Run `f`, turning a panic into [`CompileError::Internal`].
fn guarded<T>(f: impl FnOnce() -> T) -> CompileResult<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let err = CompileError::from_panic(payload);
        warn!(error = %err, "compiler fault caught");
        err
    })
}
