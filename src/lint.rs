//! Non-fatal diagnostics for statements about to be compiled.
//!
//! Lint never changes what [`compile`](crate::compile) produces; it points
//! at the places where compiled output differs from what was written.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::normalizer::{StatementKind, has_unterminated_comment, normalize};
use crate::parser::{ConstraintToken, Segment, parse_segments, split_create_table};

/// Lint severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintLevel {
    Error,
    Warning,
    Info,
}

impl fmt::Display for LintLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintLevel::Error => write!(f, "error"),
            LintLevel::Warning => write!(f, "warning"),
            LintLevel::Info => write!(f, "info"),
        }
    }
}

/// A lint issue found in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub level: LintLevel,
    pub column: Option<String>,
    pub message: String,
}

impl LintIssue {
    fn new(level: LintLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            column: None,
            message: message.into(),
        }
    }

    fn on_column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }
}

/// Lint one statement.
pub fn lint(text: &str) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    let (stripped, kind) = normalize(text);

    if stripped.is_empty() {
        issues.push(LintIssue::new(LintLevel::Error, "Empty SQL statement"));
        return issues;
    }

    if has_unterminated_comment(text) {
        issues.push(LintIssue::new(
            LintLevel::Warning,
            "Unterminated block comment left in statement",
        ));
    }

    if stripped.matches('(').count() != stripped.matches(')').count() {
        issues.push(LintIssue::new(LintLevel::Warning, "Unbalanced parentheses"));
    }

    match kind {
        StatementKind::CreateTable => lint_create_table(&stripped, &mut issues),
        StatementKind::Insert => lint_insert(&stripped, &mut issues),
        StatementKind::Other => {}
    }

    issues
}

fn lint_create_table(sql: &str, issues: &mut Vec<LintIssue>) {
    let Some(source) = split_create_table(sql) else {
        issues.push(LintIssue::new(
            LintLevel::Warning,
            "CREATE TABLE statement missing column definitions; returned unmodified",
        ));
        return;
    };

    let segments = parse_segments(source.body);
    if !segments.iter().any(|s| matches!(s, Segment::Column(_))) {
        issues.push(LintIssue::new(
            LintLevel::Warning,
            "CREATE TABLE statement has no columns; returned unmodified",
        ));
        return;
    }

    for segment in &segments {
        match segment {
            Segment::Dropped(clause) => issues.push(LintIssue::new(
                LintLevel::Info,
                format!("Table-level clause dropped: {}", clause),
            )),
            Segment::Column(col) => {
                if col.has(ConstraintToken::AutoIncrement) {
                    let message = if col.is_primary_key() {
                        "AUTO_INCREMENT dropped; INTEGER PRIMARY KEY already auto-assigns"
                    } else {
                        "AUTO_INCREMENT dropped; only INTEGER PRIMARY KEY columns auto-assign"
                    };
                    issues.push(LintIssue::new(LintLevel::Info, message).on_column(&col.name));
                }
                if col.has(ConstraintToken::Primary) && !col.has(ConstraintToken::Key) {
                    issues.push(
                        LintIssue::new(LintLevel::Warning, "PRIMARY without KEY is ignored")
                            .on_column(&col.name),
                    );
                }
            }
        }
    }
}

fn lint_insert(sql: &str, issues: &mut Vec<LintIssue>) {
    for literal in iso_date_literals(sql) {
        if NaiveDate::parse_from_str(literal, "%Y-%m-%d").is_err() {
            issues.push(LintIssue::new(
                LintLevel::Warning,
                format!("'{}' is not a valid calendar date", literal),
            ));
        }
    }
}

/// Contents of every `'DDDD-DD-DD'` literal.
fn iso_date_literals(sql: &str) -> Vec<&str> {
    sql.split('\'')
        .skip(1)
        .step_by(2)
        .filter(|s| is_iso_date_shape(s))
        .collect()
}

fn is_iso_date_shape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}
