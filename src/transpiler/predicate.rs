//! Predicate translation: lowers an [`Expr`] filter into a parameterized
//! SQL condition.
//!
//! Values never appear in the SQL text. Each bound value gets a parameter
//! named `<column>_<n>`, where `n` counts bindings within one translation
//! call, and is referenced as `@<column>_<n>`.

use serde::Serialize;

use crate::ast::{CompareOp, Expr, LogicalOp, StringMethod, Value};
use crate::error::{OrmError, OrmResult};
use crate::schema::EntityMeta;
use crate::transpiler::dialect::Dialect;
use crate::transpiler::params::ParamBag;
use crate::transpiler::traits::SqlGenerator;

/// SQL condition text plus the parameters it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFragment {
    pub sql: String,
    pub params: ParamBag,
}

/// Translate a filter over `meta`'s properties for `dialect`.
pub fn translate(expr: &Expr, meta: &EntityMeta, dialect: Dialect) -> OrmResult<QueryFragment> {
    let generator = dialect.generator();
    let resolve = |property: &str| meta.column(property).map(str::to_string);
    translate_with(expr, &resolve, generator.as_ref())
}

/// Translate with an explicit `property -> column` resolver.
pub fn translate_with(
    expr: &Expr,
    resolve: &dyn Fn(&str) -> OrmResult<String>,
    generator: &dyn SqlGenerator,
) -> OrmResult<QueryFragment> {
    let mut translator = Translator {
        generator,
        resolve,
        params: ParamBag::new(),
        seq: 0,
    };
    let sql = translator.condition(expr)?;
    Ok(QueryFragment {
        sql,
        params: translator.params,
    })
}

/// One side of a comparison.
enum Operand {
    Column { sql: String, raw: String },
    Value(Value),
}

struct Translator<'a> {
    generator: &'a dyn SqlGenerator,
    resolve: &'a dyn Fn(&str) -> OrmResult<String>,
    params: ParamBag,
    seq: usize,
}

impl Translator<'_> {
    /// Lower an expression in boolean position.
    fn condition(&mut self, expr: &Expr) -> OrmResult<String> {
        match expr {
            Expr::Compare { op, left, right } => self.comparison(*op, left, right),
            Expr::Logical { op, left, right } => self.logical(*op, left, right),
            Expr::Not(inner) => Ok(format!("NOT ({})", self.condition(inner)?)),
            Expr::Call {
                target,
                method,
                args,
            } => self.string_predicate(target, method, args),
            Expr::Member { name, .. } if expr.is_row_member() => self.column(name).map(|(sql, _)| sql),
            e if e.is_closed() => match e.evaluate()? {
                Value::Bool(true) => Ok("1 = 1".to_string()),
                Value::Bool(false) => Ok("1 = 0".to_string()),
                other => Err(OrmError::unsupported(format!(
                    "{} value used as a condition",
                    other.kind()
                ))),
            },
            other => Err(OrmError::unsupported(format!("condition '{}'", other))),
        }
    }

    fn logical(&mut self, op: LogicalOp, left: &Expr, right: &Expr) -> OrmResult<String> {
        let l = self.condition(left)?;
        let r = self.condition(right)?;
        Ok(format!(
            "{} {} {}",
            nested(left, l),
            op.sql_keyword(),
            nested(right, r)
        ))
    }

    fn comparison(&mut self, op: CompareOp, left: &Expr, right: &Expr) -> OrmResult<String> {
        let l = self.operand(left)?;
        let r = self.operand(right)?;
        match (l, r) {
            // The column is always emitted first; the operator is not mirrored.
            (Operand::Column { sql, raw }, Operand::Value(value))
            | (Operand::Value(value), Operand::Column { sql, raw }) => {
                self.bind_comparison(&sql, &raw, op, value)
            }
            (Operand::Column { sql: a, .. }, Operand::Column { sql: b, .. }) => {
                Ok(format!("{} {} {}", a, op.sql_symbol(), b))
            }
            (Operand::Value(_), Operand::Value(_)) => Err(OrmError::unsupported(format!(
                "comparison without a column: {} {} {}",
                left,
                op.dsl_symbol(),
                right
            ))),
        }
    }

    fn bind_comparison(&mut self, column: &str, raw: &str, op: CompareOp, value: Value) -> OrmResult<String> {
        match (&value, op) {
            (Value::Null, CompareOp::Eq) => Ok(format!("{} IS NULL", column)),
            (Value::Null, CompareOp::Ne) => Ok(format!("{} IS NOT NULL", column)),
            (Value::Null, _) => Ok(format!("{} {} NULL", column, op.sql_symbol())),
            (Value::Record(_), _) => Err(OrmError::unsupported(format!(
                "record value compared with {}",
                raw
            ))),
            _ => {
                let param = self.bind(raw, value);
                Ok(format!("{} {} {}", column, op.sql_symbol(), param))
            }
        }
    }

    fn string_predicate(&mut self, target: &Expr, method: &str, args: &[Expr]) -> OrmResult<String> {
        let kind = StringMethod::from_name(method).ok_or_else(|| OrmError::unsupported(method))?;
        let name = match target {
            Expr::Member { name, .. } if target.is_row_member() => name,
            _ => {
                return Err(OrmError::unsupported(format!(
                    "{} on '{}', expected a column of the row",
                    kind.name(),
                    target
                )));
            }
        };
        let [arg] = args else {
            return Err(OrmError::unsupported(format!(
                "{} with {} arguments",
                kind.name(),
                args.len()
            )));
        };
        if !arg.is_closed() {
            return Err(OrmError::unsupported(format!(
                "{} argument '{}' depends on the row",
                kind.name(),
                arg
            )));
        }

        let value = arg.evaluate()?;
        let (column, raw) = self.column(name)?;
        let param = self.bind(&raw, value);

        let upper = self.generator.upper_function();
        let lhs = format!("{}({})", upper, column);
        let rhs = format!("{}({})", upper, param);
        let pattern = match kind {
            StringMethod::Contains => self.generator.string_concat(&["'%'", rhs.as_str(), "'%'"]),
            StringMethod::StartsWith => self.generator.string_concat(&[rhs.as_str(), "'%'"]),
            StringMethod::EndsWith => self.generator.string_concat(&["'%'", rhs.as_str()]),
        };
        Ok(format!("{} LIKE {}", lhs, pattern))
    }

    fn operand(&self, expr: &Expr) -> OrmResult<Operand> {
        match expr {
            Expr::Member { name, .. } if expr.is_row_member() => {
                let (sql, raw) = self.column(name)?;
                Ok(Operand::Column { sql, raw })
            }
            e if e.is_closed() => Ok(Operand::Value(e.evaluate()?)),
            other => Err(OrmError::unsupported(format!(
                "'{}' is neither a column nor a closed value",
                other
            ))),
        }
    }

    /// Resolve a property to (rendered column, raw column name).
    fn column(&self, property: &str) -> OrmResult<(String, String)> {
        let raw = (self.resolve)(property)?;
        Ok((self.generator.column_name(&raw), raw))
    }

    /// Bind a value under a fresh name and return its `@name` marker.
    fn bind(&mut self, column: &str, value: Value) -> String {
        let base: String = column
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        let name = format!("{}_{}", base, self.seq);
        self.seq += 1;
        self.params.insert(name.clone(), value);
        format!("@{}", name)
    }
}

/// Parenthesize logical and negated children of a connective.
fn nested(expr: &Expr, sql: String) -> String {
    if expr.is_compound() {
        format!("({})", sql)
    } else {
        sql
    }
}
