//! Predicate AST: the tree a filter is built as before translation.

pub mod builders;
pub mod eval;
pub mod expr;
pub mod operators;
pub mod values;

pub use expr::{ArithOp, Expr};
pub use operators::{CompareOp, LogicalOp, SortOrder, StringMethod};
pub use values::{FromValue, Record, Value};
