//! # liteql
//!
//! > **Write generic SQL. Run it on SQLite.**
//!
//! liteql rewrites SQL written against a generic grammar (by a person or a
//! language model) into statements SQLite accepts as-is.
//!
//! ## Quick Example
//!
//! ```
//! let sql = liteql::compile(
//!     "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(50) NOT NULL)",
//! ).unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "CREATE TABLE users (\n    id INTEGER PRIMARY KEY,\n    name TEXT NOT NULL\n)"
//! );
//! ```
//!
//! ## Rewrite Rules
//!
//! | Statement      | Rewrite                                                |
//! |----------------|--------------------------------------------------------|
//! | `CREATE TABLE` | Types mapped to TEXT/REAL/INTEGER/BLOB, constraints canonicalized |
//! | `INSERT`       | None (passthrough)                                     |
//! | anything else  | `NOW()`, `CURRENT_DATE`, `CURRENT_TIME` → SQLite date functions |
//!
//! Comments are removed from every statement first.

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod lint;
pub mod normalizer;
pub mod parser;
pub mod transpiler;
pub mod types;

pub mod prelude {
    pub use crate::compiler::{Compilation, Outcome, Validation, compile_detailed};
    pub use crate::engine::{ColumnInfo, Database, QueryOutput, ResultSet};
    pub use crate::error::*;
    pub use crate::lint::{LintIssue, LintLevel, lint};
    pub use crate::normalizer::StatementKind;
    pub use crate::parser::{ColumnDefinition, ConstraintToken};
    pub use crate::transpiler::ToSql;
    pub use crate::types::TargetType;
    pub use crate::{check, compile, supported_functions, supported_types, validate};
}

pub use compiler::{check, compile, supported_functions, supported_types, validate};
