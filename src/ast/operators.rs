use serde::{Deserialize, Serialize};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
}

impl CompareOp {
    /// Returns the SQL symbol for this operator.
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }

    /// Returns the filter-DSL symbol for this operator.
    pub fn dsl_symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            other => other.sql_symbol(),
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql_symbol())
    }
}

/// Logical connective between two predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LogicalOp {
    #[default]
    And,
    Or,
}

impl LogicalOp {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// The string-membership methods the translator lowers to LIKE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringMethod {
    Contains,
    StartsWith,
    EndsWith,
}

impl StringMethod {
    /// Resolve a method name. Accepts both `EndsWith` and `ends_with` forms.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Contains" | "contains" => Some(StringMethod::Contains),
            "StartsWith" | "starts_with" => Some(StringMethod::StartsWith),
            "EndsWith" | "ends_with" => Some(StringMethod::EndsWith),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StringMethod::Contains => "Contains",
            StringMethod::StartsWith => "StartsWith",
            StringMethod::EndsWith => "EndsWith",
        }
    }

    /// Case-insensitive match of `haystack` against `needle`.
    pub fn matches(&self, haystack: &str, needle: &str) -> bool {
        let haystack = haystack.to_uppercase();
        let needle = needle.to_uppercase();
        match self {
            StringMethod::Contains => haystack.contains(&needle),
            StringMethod::StartsWith => haystack.starts_with(&needle),
            StringMethod::EndsWith => haystack.ends_with(&needle),
        }
    }
}

/// Sort order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(StringMethod::from_name("ends_with"), Some(StringMethod::EndsWith));
        assert_eq!(StringMethod::from_name("StartsWith"), Some(StringMethod::StartsWith));
        assert_eq!(StringMethod::from_name("Substring"), None);
    }

    #[test]
    fn test_case_insensitive_matching() {
        assert!(StringMethod::Contains.matches("Marc", "AR"));
        assert!(StringMethod::StartsWith.matches("pencil", "PEN"));
        assert!(!StringMethod::EndsWith.matches("User 12", "1"));
    }
}
