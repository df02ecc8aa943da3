//! Fixed word lists used by the query validator.

/// Words a read-only query may start with
pub const ENTRY_KEYWORDS: &[&str] = &["SELECT", "WITH"];

/// Whole-word deny-list: schema mutation, data mutation, privilege changes,
/// procedural execution, and engine side effects
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    // schema mutation
    "CREATE", "DROP", "ALTER", "TRUNCATE", "RENAME",
    // data mutation
    "INSERT", "UPDATE", "DELETE", "MERGE", "UPSERT", "INTO", "COPY", "LOAD",
    // privilege changes
    "GRANT", "REVOKE",
    // procedural execution
    "EXEC", "EXECUTE", "CALL", "PREPARE", "DEALLOCATE", "DECLARE",
    // engine side effects
    "ATTACH", "DETACH", "PRAGMA", "VACUUM", "INSTALL", "SET", "RESET", "SHUTDOWN",
];

/// Comment delimiters can hide or truncate a statement tail
pub const COMMENT_DELIMITERS: &[&str] = &["--", "/*", "*/"];

/// Unquoted words that drive query structure and are never identifiers
pub const STRUCTURAL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "GROUP", "BY", "HAVING", "ORDER", "LIMIT", "OFFSET", "WITH",
    "RECURSIVE", "AS", "ON", "USING", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER",
    "CROSS", "NATURAL", "UNION", "INTERSECT", "EXCEPT", "ALL", "DISTINCT", "AND", "OR", "NOT",
    "IS", "NULL", "IN", "BETWEEN", "LIKE", "ILIKE", "SIMILAR", "ESCAPE", "CASE", "WHEN",
    "THEN", "ELSE", "END", "ASC", "DESC", "NULLS", "FIRST", "LAST", "OVER", "PARTITION",
    "ROWS", "RANGE", "UNBOUNDED", "PRECEDING", "FOLLOWING", "CURRENT", "ROW", "FILTER",
    "WITHIN", "EXISTS", "ANY", "SOME", "TRUE", "FALSE", "INTERVAL", "FETCH", "NEXT", "ONLY",
    "LATERAL", "LEADING", "TRAILING", "BOTH", "FOR",
];

/// Words that may prefix a string literal: DATE '2024-01-01', INTERVAL '7 days'
pub const TYPED_LITERAL_PREFIXES: &[&str] = &[
    "DATE", "TIME", "TIMESTAMP", "INTERVAL", "INT", "INTEGER", "BIGINT", "SMALLINT", "DOUBLE",
    "FLOAT", "REAL", "DECIMAL", "NUMERIC", "VARCHAR", "CHAR", "TEXT", "STRING", "BOOLEAN",
];

/// Bare words accepted in expression position when they do not name a
/// schema column: niladic functions, date parts and type names.
///
/// Schema columns are matched first, so a column that collides with one of
/// these still resolves as a column.
pub const EXCLUDED_IDENTIFIERS: &[&str] = &[
    // niladic functions
    "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "LOCALTIME", "LOCALTIMESTAMP",
    // date parts
    "YEAR", "QUARTER", "MONTH", "WEEK", "DAY", "HOUR", "MINUTE", "SECOND", "MILLISECOND",
    "MICROSECOND", "DOW", "DOY", "EPOCH",
    // type names
    "DATE", "TIME", "TIMESTAMP", "INT", "INTEGER", "BIGINT", "SMALLINT", "DOUBLE", "FLOAT",
    "REAL", "DECIMAL", "NUMERIC", "VARCHAR", "CHAR", "TEXT", "STRING", "BOOLEAN", "PRECISION",
];

/// Functions whose `AS` introduces a type name rather than an alias
pub const CAST_FUNCTIONS: &[&str] = &["CAST", "TRY_CAST"];

/// Functions whose leading argument is a field keyword terminated by `FROM`
pub const FIELD_FUNCTIONS: &[&str] = &["EXTRACT"];

pub fn contains(list: &[&str], upper: &str) -> bool {
    list.iter().any(|word| *word == upper)
}
