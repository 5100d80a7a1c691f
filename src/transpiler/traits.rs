/// Words that must be quoted when used as a table or column name.
const RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CHECK", "COLUMN",
    "CONSTRAINT", "CREATE", "CROSS", "CURRENT", "DATE", "DEFAULT", "DELETE", "DESC", "DISTINCT",
    "DROP", "ELSE", "END", "EXISTS", "FETCH", "FOR", "FOREIGN", "FROM", "FULL", "GROUP",
    "HAVING", "IN", "INDEX", "INNER", "INSERT", "INTO", "IS", "JOIN", "KEY", "LEFT", "LIKE",
    "LIMIT", "NOT", "NULL", "OFFSET", "ON", "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES",
    "RIGHT", "ROWS", "SELECT", "SET", "TABLE", "THEN", "TIME", "TIMESTAMP", "TO", "TOP",
    "UNION", "UNIQUE", "UPDATE", "USER", "VALUES", "VALUE", "WHEN", "WHERE", "WITH",
];

/// True when `name` is an SQL reserved word (case-insensitive).
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.iter().any(|w| w.eq_ignore_ascii_case(name))
}

/// Per-dialect SQL syntax.
///
/// Defaults describe the DB2 flavour.
pub trait SqlGenerator {
    /// Quote an identifier unconditionally.
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Render a table or column name, quoting reserved words only.
    fn column_name(&self, name: &str) -> String {
        if is_reserved_word(name) {
            self.quote_identifier(name)
        } else {
            name.to_string()
        }
    }

    /// Driver placeholder for the 1-based parameter `index`.
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Upper-case function used for case-insensitive LIKE.
    fn upper_function(&self) -> &str {
        "UCASE"
    }

    /// Concatenate SQL string expressions.
    fn string_concat(&self, parts: &[&str]) -> String {
        parts.join(" || ")
    }

    /// Row limiting clause with the limit and offset as SQL expressions.
    fn limit_offset(&self, limit: &str, offset: &str) -> String {
        format!(" LIMIT {} OFFSET {}", limit, offset)
    }

    /// Whether `limit_offset` output is only valid after an ORDER BY.
    fn requires_order_for_offset(&self) -> bool {
        false
    }
}
