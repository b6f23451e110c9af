//! Dialect normalizer.
//!
//! Strips comments from raw SQL text and classifies the statement so the
//! compiler can pick a rewrite rule.
//!
//! Comment removal is a textual scan: `--` and `/*` inside string literals
//! are treated as comment openers too.

use nom::{
    IResult,
    bytes::complete::tag_no_case,
    character::complete::{multispace0, multispace1, satisfy},
    combinator::{not, value},
    sequence::{preceded, terminated, tuple},
};
use serde::Serialize;
use std::fmt;

/// Coarse classification of a statement, decided by its first keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementKind {
    CreateTable,
    Insert,
    Other,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::CreateTable => write!(f, "CREATE_TABLE"),
            StatementKind::Insert => write!(f, "INSERT"),
            StatementKind::Other => write!(f, "OTHER"),
        }
    }
}

/// Strip comments, trim, and classify.
///
/// Never fails. Empty or whitespace-only input yields an empty string
/// classified as [`StatementKind::Other`].
pub fn normalize(raw: &str) -> (String, StatementKind) {
    let stripped = strip_comments(raw);
    let text = stripped.trim().to_string();
    let kind = classify(&text);
    (text, kind)
}

/// Classify a comment-free statement by its leading keyword(s).
pub fn classify(sql: &str) -> StatementKind {
    if create_table_prefix(sql).is_ok() {
        StatementKind::CreateTable
    } else if preceded(multispace0, keyword("INSERT"))(sql).is_ok() {
        StatementKind::Insert
    } else {
        StatementKind::Other
    }
}

/// Remove `-- ...` line comments and `/* ... */` block comments.
///
/// Line comments end before the newline, which is kept. A block comment
/// runs to the nearest `*/`; an unterminated `/*` is left in place.
pub fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;

    loop {
        let line = rest.find("--");
        let block = rest.find("/*");

        let (at, is_block) = match (line, block) {
            (None, None) => {
                out.push_str(rest);
                break;
            }
            (Some(l), Some(b)) if b < l => (b, true),
            (Some(l), _) => (l, false),
            (None, Some(b)) => (b, true),
        };

        if !is_block {
            out.push_str(&rest[..at]);
            match rest[at..].find('\n') {
                Some(nl) => rest = &rest[at + nl..],
                None => break,
            }
            continue;
        }

        let body = &rest[at + 2..];
        match body.find("*/") {
            Some(end) => {
                out.push_str(&rest[..at]);
                let after = &body[end + 2..];
                // Keep neighbouring tokens apart: `SELECT/**/1`.
                let glued = out.chars().last().is_some_and(|c| !c.is_whitespace())
                    && after.chars().next().is_some_and(|c| !c.is_whitespace());
                if glued {
                    out.push(' ');
                }
                rest = after;
            }
            None => {
                out.push_str(&rest[..at + 2]);
                rest = body;
            }
        }
    }

    out
}

/// True when the text still holds a `/*` with no closing `*/`.
pub fn has_unterminated_comment(sql: &str) -> bool {
    strip_comments(sql).contains("/*")
}

/// Characters that may continue a bare SQL word.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Case-insensitive keyword that must end at a word boundary.
pub(crate) fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input| terminated(tag_no_case(word), not(satisfy(is_word_char)))(input)
}

/// `CREATE TABLE` at the start of the statement.
pub(crate) fn create_table_prefix(input: &str) -> IResult<&str, ()> {
    value(
        (),
        tuple((multispace0, keyword("CREATE"), multispace1, keyword("TABLE"))),
    )(input)
}
