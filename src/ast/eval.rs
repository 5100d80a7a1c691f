//! In-memory interpretation of predicate expressions.
//!
//! Closed sub-expressions (captured values, method results, arithmetic) are
//! evaluated here before translation. The same interpreter evaluates a whole
//! predicate against a row, with SQL three-valued logic, which makes it a
//! reference for what the generated SQL must select.

use crate::ast::{ArithOp, CompareOp, Expr, LogicalOp, Record, StringMethod, Value};
use crate::error::{OrmError, OrmResult};

impl Expr {
    /// Evaluate an expression that does not read from the row.
    pub fn evaluate(&self) -> OrmResult<Value> {
        self.eval(None)
    }

    /// Evaluate against a row whose fields are keyed by property name.
    pub fn evaluate_on(&self, row: &Record) -> OrmResult<Value> {
        self.eval(Some(row))
    }

    /// True only when the predicate evaluates to `true` (NULL filters out).
    pub fn matches(&self, row: &Record) -> OrmResult<bool> {
        match self.evaluate_on(row)? {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(OrmError::unsupported(format!(
                "predicate evaluated to a {} value",
                other.kind()
            ))),
        }
    }

    fn eval(&self, row: Option<&Record>) -> OrmResult<Value> {
        match self {
            Expr::Row => Err(OrmError::unsupported("the row itself used as a value")),
            Expr::Constant(v) => Ok(v.clone()),
            Expr::Member { target, name } if **target == Expr::Row => match row {
                Some(fields) => fields
                    .get(name)
                    .cloned()
                    .ok_or_else(|| OrmError::schema(format!("unknown property '{}'", name))),
                None => Err(OrmError::unsupported(format!(
                    "x.{} cannot be evaluated outside a row",
                    name
                ))),
            },
            Expr::Member { target, name } => target.eval(row)?.member(name),
            Expr::Compare { op, left, right } => {
                let lv = left.eval(row)?;
                let rv = right.eval(row)?;
                let null_literal = (left.is_closed() && lv.is_null()) || (right.is_closed() && rv.is_null());
                Ok(compare_values(*op, &lv, &rv, null_literal))
            }
            Expr::Logical { op, left, right } => {
                let lv = truth(left.eval(row)?)?;
                let rv = truth(right.eval(row)?)?;
                let result = match op {
                    LogicalOp::And => match (lv, rv) {
                        (Some(false), _) | (_, Some(false)) => Some(false),
                        (Some(true), Some(true)) => Some(true),
                        _ => None,
                    },
                    LogicalOp::Or => match (lv, rv) {
                        (Some(true), _) | (_, Some(true)) => Some(true),
                        (Some(false), Some(false)) => Some(false),
                        _ => None,
                    },
                };
                Ok(result.map(Value::Bool).unwrap_or(Value::Null))
            }
            Expr::Not(inner) => Ok(match truth(inner.eval(row)?)? {
                Some(b) => Value::Bool(!b),
                None => Value::Null,
            }),
            Expr::Call {
                target,
                method,
                args,
            } => {
                let receiver = target.eval(row)?;
                let args = args
                    .iter()
                    .map(|a| a.eval(row))
                    .collect::<OrmResult<Vec<_>>>()?;
                call_method(&receiver, method, &args)
            }
            Expr::Arith { op, left, right } => arith(*op, left.eval(row)?, right.eval(row)?),
        }
    }
}

fn truth(value: Value) -> OrmResult<Option<bool>> {
    match value {
        Value::Bool(b) => Ok(Some(b)),
        Value::Null => Ok(None),
        other => Err(OrmError::unsupported(format!(
            "{} value used as a condition",
            other.kind()
        ))),
    }
}

fn compare_values(op: CompareOp, lv: &Value, rv: &Value, null_literal: bool) -> Value {
    if lv.is_null() || rv.is_null() {
        // A NULL constant lowers to IS NULL / IS NOT NULL.
        return match op {
            CompareOp::Eq if null_literal => Value::Bool(lv.is_null() && rv.is_null()),
            CompareOp::Ne if null_literal => Value::Bool(!(lv.is_null() && rv.is_null())),
            _ => Value::Null,
        };
    }
    match lv.compare(rv) {
        Some(ord) => Value::Bool(match op {
            CompareOp::Eq => ord.is_eq(),
            CompareOp::Ne => ord.is_ne(),
            CompareOp::Gt => ord.is_gt(),
            CompareOp::Gte => ord.is_ge(),
            CompareOp::Lt => ord.is_lt(),
            CompareOp::Lte => ord.is_le(),
        }),
        None => Value::Null,
    }
}

fn call_method(receiver: &Value, method: &str, args: &[Value]) -> OrmResult<Value> {
    if let Some(kind) = StringMethod::from_name(method) {
        let [arg] = args else {
            return Err(OrmError::unsupported(format!(
                "{} expects 1 argument, got {}",
                method,
                args.len()
            )));
        };
        return Ok(match (receiver.as_text(), arg.as_text()) {
            (Some(haystack), Some(needle)) => Value::Bool(kind.matches(&haystack, &needle)),
            _ => Value::Null,
        });
    }

    let text = |f: fn(&str) -> String| -> OrmResult<Value> {
        if !args.is_empty() {
            return Err(OrmError::unsupported(format!("{} takes no arguments", method)));
        }
        Ok(match receiver {
            Value::Null => Value::Null,
            Value::String(s) => Value::String(f(s)),
            other => {
                return Err(OrmError::unsupported(format!(
                    "{} on a {} value",
                    method,
                    other.kind()
                )));
            }
        })
    };

    match method {
        "ToUpper" | "to_upper" | "to_uppercase" => text(|s| s.to_uppercase()),
        "ToLower" | "to_lower" | "to_lowercase" => text(|s| s.to_lowercase()),
        "Trim" | "trim" => text(|s| s.trim().to_string()),
        other => Err(OrmError::unsupported(other.to_string())),
    }
}

fn arith(op: ArithOp, lv: Value, rv: Value) -> OrmResult<Value> {
    if lv.is_null() || rv.is_null() {
        return Ok(Value::Null);
    }
    match (op, &lv, &rv) {
        (ArithOp::Add, Value::String(_), _) | (ArithOp::Add, _, Value::String(_)) => Ok(Value::String(
            format!("{}{}", lv.as_text().unwrap_or_default(), rv.as_text().unwrap_or_default()),
        )),
        (_, Value::Int(a), Value::Int(b)) => {
            let result = match op {
                ArithOp::Add => a.checked_add(*b),
                ArithOp::Sub => a.checked_sub(*b),
                ArithOp::Mul => a.checked_mul(*b),
                ArithOp::Div if *b == 0 => return Err(OrmError::validation("division by zero")),
                ArithOp::Div => a.checked_div(*b),
            };
            result
                .map(Value::Int)
                .ok_or_else(|| OrmError::validation(format!("integer overflow in {} {} {}", a, op, b)))
        }
        (_, Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let a = as_f64(&lv);
            let b = as_f64(&rv);
            Ok(Value::Float(match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div => a / b,
            }))
        }
        _ => Err(OrmError::unsupported(format!(
            "{} {} {}",
            lv.kind(),
            op,
            rv.kind()
        ))),
    }
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(n) => *n as f64,
        Value::Float(f) => *f,
        _ => 0.0,
    }
}
