//! Type mapping from generic SQL type names to SQLite storage types.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// The storage types SQLite accepts for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetType {
    Text,
    Real,
    Integer,
    Blob,
}

impl TargetType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Real => "REAL",
            Self::Integer => "INTEGER",
            Self::Blob => "BLOB",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generic type name (uppercase, no precision) to target type.
///
/// The target names map to themselves so compiled output recompiles unchanged.
const TYPE_TABLE: &[(&str, TargetType)] = &[
    // Character data
    ("VARCHAR", TargetType::Text),
    ("CHAR", TargetType::Text),
    ("NVARCHAR", TargetType::Text),
    ("NCHAR", TargetType::Text),
    ("TEXT", TargetType::Text),
    ("LONGTEXT", TargetType::Text),
    ("MEDIUMTEXT", TargetType::Text),
    ("TINYTEXT", TargetType::Text),
    // Integers
    ("INT", TargetType::Integer),
    ("INTEGER", TargetType::Integer),
    ("BIGINT", TargetType::Integer),
    ("SMALLINT", TargetType::Integer),
    ("TINYINT", TargetType::Integer),
    ("MEDIUMINT", TargetType::Integer),
    ("YEAR", TargetType::Integer),
    ("BOOLEAN", TargetType::Integer),
    ("BOOL", TargetType::Integer),
    // Floating point and fixed precision
    ("DECIMAL", TargetType::Real),
    ("NUMERIC", TargetType::Real),
    ("FLOAT", TargetType::Real),
    ("DOUBLE", TargetType::Real),
    ("REAL", TargetType::Real),
    // Temporal values are stored as ISO-8601 text
    ("DATE", TargetType::Text),
    ("DATETIME", TargetType::Text),
    ("TIMESTAMP", TargetType::Text),
    ("TIME", TargetType::Text),
    // Binary
    ("BLOB", TargetType::Blob),
    ("LONGBLOB", TargetType::Blob),
    ("MEDIUMBLOB", TargetType::Blob),
    ("TINYBLOB", TargetType::Blob),
    ("BINARY", TargetType::Blob),
    ("VARBINARY", TargetType::Blob),
];

/// Map a declared column type to its SQLite storage type.
///
/// Case-insensitive; a precision suffix such as `(10,2)` is ignored.
/// Unknown names map to [`TargetType::Text`].
///
/// # Example
///
/// ```
/// use liteql::types::{map_type, TargetType};
///
/// assert_eq!(map_type("varchar(50)"), TargetType::Text);
/// assert_eq!(map_type("DECIMAL(10,2)"), TargetType::Real);
/// assert_eq!(map_type("GEOMETRY"), TargetType::Text);
/// ```
pub fn map_type(declared: &str) -> TargetType {
    let base = declared.split('(').next().unwrap_or_default();
    let base = base.split_whitespace().next().unwrap_or_default();
    let base = base.to_ascii_uppercase();

    TYPE_TABLE
        .iter()
        .find(|(name, _)| *name == base)
        .map(|(_, target)| *target)
        .unwrap_or(TargetType::Text)
}

/// A copy of the type table, for display.
pub fn supported_types() -> BTreeMap<&'static str, TargetType> {
    TYPE_TABLE.iter().copied().collect()
}
