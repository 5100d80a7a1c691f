//! # minorm: typed entities in, parameterized SQL out
//!
//! A micro object-relational mapper. Entities describe their table once;
//! filters are written as predicate trees (or a small text DSL) and lowered
//! into SQL conditions whose values are always bound parameters.
//!
//! ## Quick Example
//!
//! ```
//! use minorm::prelude::*;
//!
//! let registry = Registry::new();
//! let article = EntityDescriptor::new("Article")
//!     .property("Id")
//!     .property("Name")
//!     .property("Description");
//! let meta = registry.resolve(&article).unwrap();
//!
//! let filter = minorm::parse("a => a.Name.EndsWith(\"2\")").unwrap();
//! let stmt = StatementBuilder::new(&meta, Dialect::Db2)
//!     .select_all(Some(&filter))
//!     .unwrap();
//! assert_eq!(
//!     stmt.sql,
//!     "select ID,NAME,DESCRIPTION from ARTICLE WHERE UCASE(NAME) LIKE '%' || UCASE(@NAME_0)"
//! );
//! ```
//!
//! ## Layers
//!
//! | Module       | Role                                        |
//! |--------------|---------------------------------------------|
//! | `schema`     | Entity descriptors and the metadata registry |
//! | `ast`        | Predicate tree, values, in-memory evaluation |
//! | `parser`     | Text filter DSL                             |
//! | `transpiler` | Predicate and statement SQL per dialect     |
//! | `adapter`    | Generated key retrieval per dialect         |
//! | `engine`     | Execution through sqlx                      |

pub mod adapter;
pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod parser;
pub mod schema;
pub mod tracking;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::builders::*;
    pub use crate::ast::*;
    pub use crate::config::Config;
    pub use crate::engine::{CommandOptions, Db, Executor, Row, SqlxExecutor};
    pub use crate::error::*;
    pub use crate::parser::{parse_filter, Captures};
    pub use crate::schema::{AliasMap, Entity, EntityDescriptor, EntityMeta, NameCase, Registry};
    pub use crate::tracking::Tracked;
    pub use crate::transpiler::{Dialect, KeyValues, OrderBy, Query, Statement, StatementBuilder};
}

/// Parse a filter expression into a predicate tree.
///
/// # Example
///
/// ```
/// use minorm::parse;
///
/// let expr = parse("x => x.Id > 3 && x.Name != null").unwrap();
/// assert_eq!(expr.to_string(), "(x.Id > 3 && x.Name != NULL)");
/// ```
pub fn parse(input: &str) -> Result<ast::Expr, error::OrmError> {
    parser::parse(input)
}
