//! `CREATE TABLE` parser using nom.
//!
//! Extracts the table name and the column list of a `CREATE TABLE`
//! statement and parses each column declaration into a [`ColumnDefinition`].
//!
//! ```text
//! CREATE TABLE users (id INT PRIMARY KEY, price DECIMAL(10,2) NOT NULL)
//!              ──┬──  ──────────────────────────┬─────────────────────
//!                │                              └── body: split on top-level commas
//!                └── table name (verbatim)
//! ```
//!
//! Parentheses are matched by depth, so precision arguments never close the
//! column list early. Quoted text is skipped while matching.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{opt, recognize},
    sequence::{delimited, tuple},
};
use serde::Serialize;
use std::fmt;

use crate::normalizer::{create_table_prefix, is_word_char, keyword};

/// A constraint keyword recognized in a column declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintToken {
    Primary,
    Key,
    Not,
    Null,
    Unique,
    AutoIncrement,
}

impl ConstraintToken {
    /// Recognize a single (uppercase) token.
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "PRIMARY" => Some(Self::Primary),
            "KEY" => Some(Self::Key),
            "NOT" => Some(Self::Not),
            "NULL" => Some(Self::Null),
            "UNIQUE" => Some(Self::Unique),
            "AUTO_INCREMENT" | "AUTOINCREMENT" => Some(Self::AutoIncrement),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Primary => "PRIMARY",
            Self::Key => "KEY",
            Self::Not => "NOT",
            Self::Null => "NULL",
            Self::Unique => "UNIQUE",
            Self::AutoIncrement => "AUTO_INCREMENT",
        };
        f.write_str(s)
    }
}

/// One parsed column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDefinition {
    /// Column name as written (quotes included).
    pub name: String,
    /// Type keyword as written, without its precision arguments. Empty when absent.
    pub declared_type: String,
    /// Constraint tokens in the order first seen.
    pub constraints: Vec<ConstraintToken>,
}

impl ColumnDefinition {
    pub fn has(&self, token: ConstraintToken) -> bool {
        self.constraints.contains(&token)
    }

    /// Both `PRIMARY` and `KEY` are present.
    pub fn is_primary_key(&self) -> bool {
        self.has(ConstraintToken::Primary) && self.has(ConstraintToken::Key)
    }

    /// Both `NOT` and `NULL` are present.
    pub fn is_not_null(&self) -> bool {
        self.has(ConstraintToken::Not) && self.has(ConstraintToken::Null)
    }

    pub fn is_unique(&self) -> bool {
        self.has(ConstraintToken::Unique)
    }
}

/// One top-level comma-separated entry of a column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Column(ColumnDefinition),
    /// A table-level clause (`PRIMARY KEY (...)`, `FOREIGN KEY ...`) or
    /// text that does not start with a name. Not re-emitted.
    Dropped(&'a str),
}

/// The pieces of a `CREATE TABLE` statement the compiler rebuilds from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource<'a> {
    pub name: &'a str,
    pub if_not_exists: bool,
    /// Text between the outer parentheses.
    pub body: &'a str,
}

/// Locate table name and column list of a `CREATE TABLE` statement.
///
/// Returns `None` when the statement has no name or no balanced outer
/// parenthesis pair after the name.
pub fn split_create_table(sql: &str) -> Option<TableSource<'_>> {
    let (rest, (if_not_exists, name)) = table_header(sql).ok()?;
    let rest = rest.trim_start();
    if !rest.starts_with('(') {
        return None;
    }
    let close = matching_close(rest)?;

    Some(TableSource {
        name,
        if_not_exists,
        body: &rest[1..close],
    })
}

/// Parse a column list into column definitions, in declaration order.
///
/// Table-level clauses are left out.
pub fn parse_columns(body: &str) -> Vec<ColumnDefinition> {
    parse_segments(body)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Column(col) => Some(col),
            Segment::Dropped(_) => None,
        })
        .collect()
}

/// Parse a column list into segments, keeping dropped clauses for diagnostics.
pub fn parse_segments(body: &str) -> Vec<Segment<'_>> {
    split_top_level(body)
        .into_iter()
        .map(|text| {
            if is_table_constraint(text) {
                return Segment::Dropped(text);
            }
            match parse_column(text) {
                Some(col) => Segment::Column(col),
                None => Segment::Dropped(text),
            }
        })
        .collect()
}

/// Parse `CREATE TABLE [IF NOT EXISTS] <name>`.
fn table_header(input: &str) -> IResult<&str, (bool, &str)> {
    let (input, _) = create_table_prefix(input)?;
    let (input, _) = multispace1(input)?;
    let (input, if_not_exists) = opt(tuple((
        keyword("IF"),
        multispace1,
        keyword("NOT"),
        multispace1,
        keyword("EXISTS"),
        multispace1,
    )))(input)?;
    let (input, name) = identifier(input)?;

    Ok((input, (if_not_exists.is_some(), name)))
}

/// Parse a table or column name: bare, `"quoted"`, `` `quoted` `` or `[bracketed]`.
fn identifier(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(delimited(char('"'), take_while(|c: char| c != '"'), char('"'))),
        recognize(delimited(char('`'), take_while(|c: char| c != '`'), char('`'))),
        recognize(delimited(char('['), take_while(|c: char| c != ']'), char(']'))),
        take_while1(|c: char| is_word_char(c) || c == '.'),
    ))(input)
}

/// Words that start a constraint, so they cannot be a column's type.
const CONSTRAINT_WORDS: &[&str] = &[
    "PRIMARY",
    "NOT",
    "NULL",
    "UNIQUE",
    "AUTO_INCREMENT",
    "AUTOINCREMENT",
    "DEFAULT",
    "REFERENCES",
    "CHECK",
    "CONSTRAINT",
    "COLLATE",
];

/// Parse one column declaration.
fn parse_column(segment: &str) -> Option<ColumnDefinition> {
    let (rest, name) = identifier(segment).ok()?;
    let (rest, _) = multispace0::<_, nom::error::Error<&str>>(rest).ok()?;

    let (rest, declared_type) = match type_word(rest) {
        Ok((after, word)) if !CONSTRAINT_WORDS.contains(&word.to_ascii_uppercase().as_str()) => {
            (skip_type_arguments(after), word)
        }
        _ => (rest, ""),
    };

    Some(ColumnDefinition {
        name: name.to_string(),
        declared_type: declared_type.to_string(),
        constraints: scan_constraints(rest),
    })
}

fn type_word(input: &str) -> IResult<&str, &str> {
    take_while1(is_word_char)(input)
}

/// Skip a parenthesized argument list directly after a type word.
fn skip_type_arguments(input: &str) -> &str {
    let trimmed = input.trim_start();
    if trimmed.starts_with('(') {
        if let Some(close) = matching_close(trimmed) {
            return &trimmed[close + 1..];
        }
    }
    input
}

/// Collect constraint tokens left to right. `PRIMARY KEY` is taken as a unit.
fn scan_constraints(rest: &str) -> Vec<ConstraintToken> {
    let tokens: Vec<String> = rest
        .split_whitespace()
        .map(|t| t.to_ascii_uppercase())
        .collect();

    let mut constraints = Vec::new();
    let mut push = |token: ConstraintToken| {
        if !constraints.contains(&token) {
            constraints.push(token);
        }
    };

    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == "PRIMARY" && tokens.get(i + 1).is_some_and(|t| t == "KEY") {
            push(ConstraintToken::Primary);
            push(ConstraintToken::Key);
            i += 2;
            continue;
        }
        if let Some(token) = ConstraintToken::from_token(&tokens[i]) {
            push(token);
        }
        i += 1;
    }

    constraints
}

/// Table-level clauses are not column declarations.
fn is_table_constraint(segment: &str) -> bool {
    let word_end = segment
        .find(|c: char| !is_word_char(c))
        .unwrap_or(segment.len());
    let first = segment[..word_end].to_ascii_uppercase();
    let after = segment[word_end..].trim_start();

    match first.as_str() {
        "PRIMARY" | "FOREIGN" | "CONSTRAINT" | "CHECK" => true,
        "UNIQUE" => {
            let next = after
                .split(|c: char| !is_word_char(c))
                .next()
                .unwrap_or_default()
                .to_ascii_uppercase();
            after.starts_with('(') || next == "KEY" || next == "INDEX"
        }
        _ => false,
    }
}

/// Positions of parentheses and commas outside quoted text, with nesting depth.
///
/// For `(` the depth is counted after opening, for `)` before closing, so a
/// matching pair reports the same depth.
fn structural_chars(s: &str) -> impl Iterator<Item = (usize, char, usize)> + '_ {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    s.char_indices().filter_map(move |(i, c)| {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            return None;
        }
        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                None
            }
            '(' => {
                depth += 1;
                Some((i, c, depth))
            }
            ')' => {
                let at = depth;
                depth = depth.saturating_sub(1);
                Some((i, c, at))
            }
            ',' => Some((i, c, depth)),
            _ => None,
        }
    })
}

/// Byte offset of the `)` closing the `(` that starts `s`.
fn matching_close(s: &str) -> Option<usize> {
    structural_chars(s)
        .find(|&(_, c, depth)| c == ')' && depth == 1)
        .map(|(i, _, _)| i)
}

/// Split on commas at depth zero. Empty pieces are skipped.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for (i, c, depth) in structural_chars(body) {
        if c == ',' && depth == 0 {
            pieces.push(&body[start..i]);
            start = i + 1;
        }
    }
    pieces.push(&body[start..]);

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConstraintToken::*;

    fn col(name: &str, ty: &str, constraints: &[ConstraintToken]) -> ColumnDefinition {
        ColumnDefinition {
            name: name.to_string(),
            declared_type: ty.to_string(),
            constraints: constraints.to_vec(),
        }
    }

    #[test]
    fn test_split_create_table() {
        let src = split_create_table("CREATE TABLE users (id INT, name TEXT)").unwrap();
        assert_eq!(src.name, "users");
        assert!(!src.if_not_exists);
        assert_eq!(src.body, "id INT, name TEXT");
    }

    #[test]
    fn test_split_create_table_nested_parens() {
        let src = split_create_table("CREATE TABLE t (a DECIMAL(10,2), b VARCHAR(5));").unwrap();
        assert_eq!(src.body, "a DECIMAL(10,2), b VARCHAR(5)");
    }

    #[test]
    fn test_split_create_table_variants() {
        let src = split_create_table("create table if not exists logs(id int)").unwrap();
        assert_eq!(src.name, "logs");
        assert!(src.if_not_exists);
        assert_eq!(src.body, "id int");

        let src = split_create_table("CREATE TABLE \"order items\" (id INT)").unwrap();
        assert_eq!(src.name, "\"order items\"");

        let src = split_create_table("CREATE TABLE main.t (id INT) ENGINE=InnoDB").unwrap();
        assert_eq!(src.name, "main.t");
        assert_eq!(src.body, "id INT");
    }

    #[test]
    fn test_split_create_table_without_column_list() {
        assert_eq!(split_create_table("CREATE TABLE t"), None);
        assert_eq!(split_create_table("CREATE TABLE t AS SELECT 1"), None);
        assert_eq!(split_create_table("CREATE TABLE t (a INT"), None);
        assert_eq!(split_create_table("CREATE TABLE (a INT)"), None);
    }

    #[test]
    fn test_quoted_parens_do_not_close_the_list() {
        let src = split_create_table("CREATE TABLE t (a TEXT DEFAULT ')', b INT)").unwrap();
        assert_eq!(src.body, "a TEXT DEFAULT ')', b INT");
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("a DECIMAL(10, 2), b INT , , c TEXT"),
            vec!["a DECIMAL(10, 2)", "b INT", "c TEXT"]
        );
        assert!(split_top_level("   ").is_empty());
    }

    #[test]
    fn test_parse_columns_basic() {
        let cols = parse_columns(
            "id INT PRIMARY KEY, name VARCHAR(50) NOT NULL, email VARCHAR(100) UNIQUE",
        );
        assert_eq!(
            cols,
            vec![
                col("id", "INT", &[Primary, Key]),
                col("name", "VARCHAR", &[Not, Null]),
                col("email", "VARCHAR", &[Unique]),
            ]
        );
    }

    #[test]
    fn test_parse_columns_across_lines() {
        let cols = parse_columns("\n    id INTEGER,\n    price DECIMAL(10,\n 2) NOT NULL\n");
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[1], col("price", "DECIMAL", &[Not, Null]));
    }

    #[test]
    fn test_table_level_constraints_are_dropped() {
        let segments = parse_segments("a INT, b INT, PRIMARY KEY (a, b), FOREIGN KEY (b) REFERENCES x(id)");
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[2], Segment::Dropped("PRIMARY KEY (a, b)"));
        assert_eq!(segments[3], Segment::Dropped("FOREIGN KEY (b) REFERENCES x(id)"));
        assert_eq!(parse_columns("a INT, CONSTRAINT pk PRIMARY KEY (a), UNIQUE (a)").len(), 1);
        assert_eq!(parse_columns("a INT, UNIQUE KEY uq (a), CHECK (a > 0)").len(), 1);
    }

    #[test]
    fn test_column_named_like_a_keyword_is_kept() {
        let cols = parse_columns("unique_code TEXT, key TEXT");
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[1].name, "key");
    }

    #[test]
    fn test_constraint_scan() {
        assert_eq!(
            scan_constraints("AUTO_INCREMENT PRIMARY KEY"),
            vec![AutoIncrement, Primary, Key]
        );
        assert_eq!(scan_constraints("primary"), vec![Primary]);
        assert_eq!(scan_constraints("NOT NULL DEFAULT 0 UNIQUE"), vec![Not, Null, Unique]);
        assert_eq!(scan_constraints("DEFAULT NULL NOT NULL"), vec![Null, Not]);
        assert_eq!(scan_constraints("AUTOINCREMENT"), vec![AutoIncrement]);
        assert!(scan_constraints("DEFAULT 'x'").is_empty());
    }

    #[test]
    fn test_standalone_primary_is_not_a_primary_key() {
        let cols = parse_columns("id INT PRIMARY");
        assert!(!cols[0].is_primary_key());
        assert!(cols[0].has(Primary));
    }

    #[test]
    fn test_column_without_type() {
        assert_eq!(parse_columns("note"), vec![col("note", "", &[])]);
        assert_eq!(
            parse_columns("id PRIMARY KEY"),
            vec![col("id", "", &[Primary, Key])]
        );
    }

    #[test]
    fn test_space_before_type_arguments() {
        let cols = parse_columns("code CHAR (3) NOT NULL");
        assert_eq!(cols[0], col("code", "CHAR", &[Not, Null]));
    }

    #[test]
    fn test_unparseable_segment_is_dropped() {
        let segments = parse_segments("(oops), a INT");
        assert_eq!(segments[0], Segment::Dropped("(oops)"));
        assert_eq!(parse_columns("(oops), a INT").len(), 1);
    }
}
