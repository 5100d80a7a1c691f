//! SQL generation: predicate translation, statement building, pagination.

pub mod dialect;
pub mod pagination;
pub mod params;
pub mod predicate;
pub mod sql;
pub mod statement;
pub mod traits;

#[cfg(test)]
mod tests;

pub use dialect::Dialect;
pub use pagination::append_pagination;
pub use params::ParamBag;
pub use predicate::{QueryFragment, translate, translate_with};
pub use statement::{InsertStatement, KeyValues, OrderBy, Params, Query, Statement, StatementBuilder};
pub use traits::{SqlGenerator, is_reserved_word};
