//! Ergonomic builder functions for predicate expressions.
//!
//! These construct [`Expr`] trees directly, standing in for a host-language
//! lambda. The row parameter is implicit: [`col`] always refers to it.
//!
//! # Example
//! ```
//! use minorm::ast::builders::*;
//!
//! // x => x.Name.EndsWith("2") && x.Id > 3
//! let filter = col("Name").ends_with("2").and(col("Id").gt(3));
//! assert_eq!(filter.to_string(), "(x.Name.EndsWith(\"2\") && x.Id > 3)");
//! ```

use crate::ast::{ArithOp, CompareOp, Expr, LogicalOp, Value};

/// A property of the row being filtered (`x.name`).
pub fn col(name: &str) -> Expr {
    Expr::Member {
        target: Box::new(Expr::Row),
        name: name.to_string(),
    }
}

/// A literal value.
pub fn val(value: impl Into<Value>) -> Expr {
    Expr::Constant(value.into())
}

/// A captured outer value; use [`Expr::field`] to reach its members.
pub fn captured(value: impl Into<Value>) -> Expr {
    Expr::Constant(value.into())
}

fn compare(op: CompareOp, left: Expr, right: Expr) -> Expr {
    Expr::Compare {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn call(target: Expr, method: &str, arg: Expr) -> Expr {
    Expr::Call {
        target: Box::new(target),
        method: method.to_string(),
        args: vec![arg],
    }
}

/// Operand of a comparison or method argument: either a value or an
/// existing expression.
pub trait IntoOperand {
    fn into_operand(self) -> Expr;
}

impl IntoOperand for Expr {
    fn into_operand(self) -> Expr {
        self
    }
}

macro_rules! operand_from_value {
    ($($ty:ty),*) => {
        $(impl IntoOperand for $ty {
            fn into_operand(self) -> Expr {
                Expr::Constant(self.into())
            }
        })*
    };
}

operand_from_value!(bool, i32, i64, u32, f64, &str, String, Value);

impl Expr {
    /// Member access on this expression (`self.name`).
    pub fn field(self, name: &str) -> Expr {
        Expr::Member {
            target: Box::new(self),
            name: name.to_string(),
        }
    }

    pub fn eq(self, other: impl IntoOperand) -> Expr {
        compare(CompareOp::Eq, self, other.into_operand())
    }

    pub fn ne(self, other: impl IntoOperand) -> Expr {
        compare(CompareOp::Ne, self, other.into_operand())
    }

    pub fn gt(self, other: impl IntoOperand) -> Expr {
        compare(CompareOp::Gt, self, other.into_operand())
    }

    pub fn gte(self, other: impl IntoOperand) -> Expr {
        compare(CompareOp::Gte, self, other.into_operand())
    }

    pub fn lt(self, other: impl IntoOperand) -> Expr {
        compare(CompareOp::Lt, self, other.into_operand())
    }

    pub fn lte(self, other: impl IntoOperand) -> Expr {
        compare(CompareOp::Lte, self, other.into_operand())
    }

    pub fn and(self, other: Expr) -> Expr {
        Expr::Logical {
            op: LogicalOp::And,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::Logical {
            op: LogicalOp::Or,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// `self.Contains(arg)`
    pub fn contains(self, arg: impl IntoOperand) -> Expr {
        call(self, "Contains", arg.into_operand())
    }

    /// `self.StartsWith(arg)`
    pub fn starts_with(self, arg: impl IntoOperand) -> Expr {
        call(self, "StartsWith", arg.into_operand())
    }

    /// `self.EndsWith(arg)`
    pub fn ends_with(self, arg: impl IntoOperand) -> Expr {
        call(self, "EndsWith", arg.into_operand())
    }

    /// An arbitrary method call; unknown names are rejected at translation.
    pub fn method(self, name: &str, args: Vec<Expr>) -> Expr {
        Expr::Call {
            target: Box::new(self),
            method: name.to_string(),
            args,
        }
    }

    pub fn plus(self, other: impl IntoOperand) -> Expr {
        Expr::Arith {
            op: ArithOp::Add,
            left: Box::new(self),
            right: Box::new(other.into_operand()),
        }
    }

    pub fn minus(self, other: impl IntoOperand) -> Expr {
        Expr::Arith {
            op: ArithOp::Sub,
            left: Box::new(self),
            right: Box::new(other.into_operand()),
        }
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

/// Fold a list of predicates with AND. Returns `None` for an empty list.
pub fn all_of(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(Expr::and)
}

/// Fold a list of predicates with OR. Returns `None` for an empty list.
pub fn any_of(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(Expr::or)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_builders() {
        let e = col("Age").gte(18);
        assert_eq!(
            e,
            Expr::Compare {
                op: CompareOp::Gte,
                left: Box::new(col("Age")),
                right: Box::new(Expr::Constant(Value::Int(18))),
            }
        );
    }

    #[test]
    fn test_not_operator() {
        let e = !col("Name").contains("x");
        assert!(matches!(e, Expr::Not(_)));
    }

    #[test]
    fn test_fold_helpers() {
        assert!(all_of(Vec::new()).is_none());
        let e = any_of([col("A").eq(1), col("B").eq(2), col("C").eq(3)]).unwrap();
        assert_eq!(e.to_string(), "((x.A == 1 || x.B == 2) || x.C == 3)");
    }
}
