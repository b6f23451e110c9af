//! SQLite transpiler.
//!
//! Renders parsed `CREATE TABLE` statements in SQLite column syntax and
//! rewrites date/time functions in every other statement.

use nom::{
    IResult,
    character::complete::{char, multispace0},
    combinator::recognize,
    sequence::tuple,
};

use crate::normalizer::is_word_char;
use crate::parser::{ColumnDefinition, parse_columns, split_create_table};
use crate::types::map_type;

/// Trait for rendering nodes as SQLite statement text.
pub trait ToSql {
    /// Convert this node to a SQL string.
    fn to_sql(&self) -> String;
}

impl ToSql for ColumnDefinition {
    /// `<name> <TYPE>` then `PRIMARY KEY`, `NOT NULL`, `UNIQUE` in that order.
    ///
    /// `AUTO_INCREMENT` is not emitted: `INTEGER PRIMARY KEY` already
    /// aliases the rowid in SQLite.
    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, map_type(&self.declared_type));

        if self.is_primary_key() {
            sql.push_str(" PRIMARY KEY");
        }
        if self.is_not_null() {
            sql.push_str(" NOT NULL");
        }
        if self.is_unique() {
            sql.push_str(" UNIQUE");
        }

        sql
    }
}

/// A `CREATE TABLE` statement reduced to what SQLite needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub name: String,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDefinition>,
}

impl CreateTable {
    /// Parse a comment-free `CREATE TABLE` statement.
    ///
    /// `None` when the column list cannot be located or holds no columns.
    pub fn parse(sql: &str) -> Option<Self> {
        let source = split_create_table(sql)?;
        let columns = parse_columns(source.body);
        if columns.is_empty() {
            return None;
        }

        Some(Self {
            name: source.name.to_string(),
            if_not_exists: source.if_not_exists,
            columns,
        })
    }
}

impl ToSql for CreateTable {
    fn to_sql(&self) -> String {
        let mut sql = String::from("CREATE TABLE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.name);
        sql.push_str(" (\n    ");

        let cols: Vec<String> = self.columns.iter().map(|c| c.to_sql()).collect();
        sql.push_str(&cols.join(",\n    "));

        sql.push_str("\n)");
        sql
    }
}

/// INSERT statements pass through unchanged.
///
/// ISO date literals (`'YYYY-MM-DD'`) are already what SQLite stores in
/// TEXT date columns, so nothing needs rewriting.
pub fn rewrite_insert(sql: &str) -> String {
    sql.to_string()
}

/// Date/time keywords and their SQLite replacements.
///
/// `true` marks a function call that requires an empty `()` after the name.
const TIME_REWRITES: &[(&str, bool, &str)] = &[
    ("NOW", true, "datetime('now')"),
    ("CURRENT_DATE", false, "date('now')"),
    ("CURRENT_TIME", false, "time('now')"),
];

/// Replace `NOW()`, `CURRENT_DATE` and `CURRENT_TIME` with SQLite expressions.
///
/// Only whole words outside quoted text are replaced, case-insensitively;
/// `NOWADAYS` or `my_current_date` stay as they are.
///
/// # Example
///
/// ```
/// use liteql::transpiler::rewrite_functions;
///
/// assert_eq!(
///     rewrite_functions("SELECT * FROM events WHERE created_at = NOW()"),
///     "SELECT * FROM events WHERE created_at = datetime('now')"
/// );
/// ```
pub fn rewrite_functions(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;

    while let Some(c) = rest.chars().next() {
        if matches!(c, '\'' | '"' | '`') {
            let len = quoted_len(rest, c);
            out.push_str(&rest[..len]);
            rest = &rest[len..];
            continue;
        }

        if is_word_char(c) {
            // Words are consumed whole, so this is always a word start.
            let end = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
            let (word, after) = rest.split_at(end);
            match time_rewrite(word, after) {
                Some((replacement, consumed)) => {
                    out.push_str(replacement);
                    rest = &after[consumed..];
                }
                None => {
                    out.push_str(word);
                    rest = after;
                }
            }
            continue;
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// Replacement text and how many bytes of `after` it swallows.
fn time_rewrite(word: &str, after: &str) -> Option<(&'static str, usize)> {
    let upper = word.to_ascii_uppercase();
    let &(_, is_call, replacement) = TIME_REWRITES.iter().find(|(name, _, _)| *name == upper)?;

    match empty_call(after) {
        Ok((_, parens)) => Some((replacement, parens.len())),
        Err(_) if is_call => None,
        Err(_) => Some((replacement, 0)),
    }
}

/// `()` with optional whitespace, directly after a name.
fn empty_call(input: &str) -> IResult<&str, &str> {
    recognize(tuple((multispace0, char('('), multispace0, char(')'))))(input)
}

/// Byte length of a quoted run starting at `s`, closing quote included.
///
/// Doubled quotes (`'it''s'`) read as two adjacent runs, which is equivalent.
fn quoted_len(s: &str, quote: char) -> usize {
    match s[1..].find(quote) {
        Some(close) => close + 2,
        None => s.len(),
    }
}
