use serde::{Deserialize, Serialize};

use crate::ast::{CompareOp, LogicalOp, Value};

/// Arithmetic operators. Only evaluable over closed-over values; the
/// translator never lowers them into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl std::fmt::Display for ArithOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        };
        write!(f, "{}", symbol)
    }
}

/// A node of a filter predicate over a single row parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// The row being filtered (the lambda parameter).
    Row,
    /// A literal or an already-resolved captured value.
    Constant(Value),
    /// Member access. A column when `target` is [`Expr::Row`], otherwise a
    /// closed-over value to be evaluated.
    Member { target: Box<Expr>, name: String },
    /// Binary comparison.
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// AND / OR connective.
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Negation.
    Not(Box<Expr>),
    /// Method call, e.g. `Name.EndsWith("2")`.
    Call {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// Arithmetic over closed values, e.g. `$prefix + "%"`.
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// True for `Member { target: Row, .. }`.
    pub fn is_row_member(&self) -> bool {
        matches!(self, Expr::Member { target, .. } if **target == Expr::Row)
    }

    /// True when the expression never reads from the row, so it can be
    /// evaluated to a concrete value before translation.
    pub fn is_closed(&self) -> bool {
        match self {
            Expr::Row => false,
            Expr::Constant(_) => true,
            Expr::Member { target, .. } => target.is_closed(),
            Expr::Compare { left, right, .. }
            | Expr::Logical { left, right, .. }
            | Expr::Arith { left, right, .. } => left.is_closed() && right.is_closed(),
            Expr::Not(inner) => inner.is_closed(),
            Expr::Call { target, args, .. } => target.is_closed() && args.iter().all(Expr::is_closed),
        }
    }

    /// True for nodes whose SQL form needs parentheses when nested under a
    /// logical connective.
    pub fn is_compound(&self) -> bool {
        matches!(self, Expr::Logical { .. } | Expr::Not(_))
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Row => write!(f, "x"),
            Expr::Constant(Value::String(s)) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Expr::Constant(v) => write!(f, "{}", v),
            Expr::Member { target, name } => write!(f, "{}.{}", target, name),
            Expr::Compare { op, left, right } => write!(f, "{} {} {}", left, op.dsl_symbol(), right),
            Expr::Logical { op, left, right } => {
                let symbol = match op {
                    LogicalOp::And => "&&",
                    LogicalOp::Or => "||",
                };
                write!(f, "({} {} {})", left, symbol, right)
            }
            Expr::Not(inner) => write!(f, "!({})", inner),
            Expr::Call {
                target,
                method,
                args,
            } => {
                write!(f, "{}.{}(", target, method)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Arith { op, left, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::*;

    #[test]
    fn test_closed_detection() {
        assert!(!col("Name").is_closed());
        assert!(val(5).is_closed());
        assert!(captured(Value::Null).field("Name").is_closed());
        assert!(!col("Name").ends_with("2").is_closed());
        assert!(col("Name").is_row_member());
        assert!(!val("x").is_row_member());
    }

    #[test]
    fn test_display_as_lambda_body() {
        let e = col("Name").ends_with("2").and(col("Id").gt(3));
        assert_eq!(e.to_string(), "(x.Name.EndsWith(\"2\") && x.Id > 3)");
    }
}
