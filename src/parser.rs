//! Filter DSL parser using nom.
//!
//! Parses a textual lambda into a predicate [`Expr`].
//!
//! # Syntax Overview
//!
//! ```text
//! x => x.Name.EndsWith("2") && (x.Id > $min || !x.Code.contains('a'))
//! ─┬─  ──────────┬────────── ──    ──┬─ ─┬─     ─┬─
//!  │             │                   │   │       └── Negation
//!  │             │                   │   └── Captured variable
//!  │             │                   └── Comparison
//!  │             └── String predicate on a column
//!  └── Optional lambda header naming the row
//! ```
//!
//! Without a header the row is called `x`. A bare identifier other than the
//! row name is shorthand for a column: `Name == 'a'` means `x.Name == 'a'`.
//! `&&`, `||` and `!` may also be written `and`, `or` and `not`.

use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, cut, map, not, opt, recognize, value},
    error::{ErrorKind, ParseError},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::ast::builders::col;
use crate::ast::{ArithOp, CompareOp, Expr, Value};
use crate::error::{OrmError, OrmResult};

/// Values referenced as `$name` in a filter.
#[derive(Debug, Clone, Default)]
pub struct Captures {
    values: HashMap<String, Value>,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Parse a filter with no captured variables.
///
/// # Example
///
/// ```
/// use minorm::parser::parse;
///
/// let expr = parse("x => x.Name.EndsWith(\"2\")").unwrap();
/// assert_eq!(expr.to_string(), "x.Name.EndsWith(\"2\")");
/// ```
pub fn parse(input: &str) -> OrmResult<Expr> {
    parse_filter(input, &Captures::new())
}

/// Parse a filter, resolving `$name` against `captures`.
pub fn parse_filter(input: &str, captures: &Captures) -> OrmResult<Expr> {
    let (body, param) = match header(input) {
        Ok((rest, name)) => (rest, name.to_string()),
        Err(_) => (input, "x".to_string()),
    };
    let parser = FilterParser { param, captures };

    match all_consuming(delimited(ws, |i| parser.or_expr(i), ws))(body) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(OrmError::parse(input.len() - e.input.len(), e.message))
        }
        Err(nom::Err::Incomplete(_)) => Err(OrmError::parse(input.len(), "incomplete input")),
    }
}

/// Parse error carrying the remaining input, so the caller can compute a
/// position.
#[derive(Debug, PartialEq)]
struct FilterError<'a> {
    input: &'a str,
    message: String,
}

impl<'a> FilterError<'a> {
    fn new(input: &'a str, message: impl Into<String>) -> Self {
        Self {
            input,
            message: message.into(),
        }
    }
}

impl<'a> ParseError<&'a str> for FilterError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        let message = match input.split_whitespace().next() {
            Some(token) => format!("unexpected '{}'", token),
            None => "unexpected end of input".to_string(),
        };
        Self::new(input, message)
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    // Report the branch that got furthest.
    fn or(self, other: Self) -> Self {
        if other.input.len() <= self.input.len() { other } else { self }
    }
}

type PResult<'a, O> = IResult<&'a str, O, FilterError<'a>>;

fn ws<'a>(input: &'a str) -> PResult<'a, &'a str> {
    multispace0(input)
}

fn sym<'a>(s: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |i| tag(s)(i)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A word that is not the prefix of a longer identifier.
fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |i| terminated(tag(kw), not(satisfy(is_ident_char)))(i)
}

fn ident<'a>(input: &'a str) -> PResult<'a, &'a str> {
    recognize(pair(
        satisfy(|c: char| c.is_alphabetic() || c == '_'),
        take_while(is_ident_char),
    ))(input)
}

/// `x =>`
fn header<'a>(input: &'a str) -> PResult<'a, &'a str> {
    delimited(ws, ident, tuple((ws, sym("=>"))))(input)
}

fn compare_op<'a>(input: &'a str) -> PResult<'a, CompareOp> {
    alt((
        value(CompareOp::Eq, sym("==")),
        value(CompareOp::Ne, sym("!=")),
        value(CompareOp::Ne, sym("<>")),
        value(CompareOp::Gte, sym(">=")),
        value(CompareOp::Lte, sym("<=")),
        value(CompareOp::Eq, sym("=")),
        value(CompareOp::Gt, sym(">")),
        value(CompareOp::Lt, sym("<")),
    ))(input)
}

fn number<'a>(input: &'a str) -> PResult<'a, Value> {
    let (rest, text) = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;
    let parsed = if text.contains('.') {
        text.parse::<f64>().ok().map(Value::Float)
    } else {
        text.parse::<i64>().ok().map(Value::Int)
    };
    match parsed {
        Some(v) => Ok((rest, v)),
        None => Err(nom::Err::Failure(FilterError::new(
            input,
            format!("invalid number '{}'", text),
        ))),
    }
}

/// `"..."` or `'...'` with backslash escapes.
fn string_literal<'a>(input: &'a str) -> PResult<'a, String> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('"' | '\''))) => q,
        _ => return Err(nom::Err::Error(FilterError::new(input, "expected a string"))),
    };
    let mut out = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, other)) => out.push(other),
                None => break,
            },
            c if c == quote => return Ok((&input[i + c.len_utf8()..], out)),
            c => out.push(c),
        }
    }
    Err(nom::Err::Failure(FilterError::new(input, "unterminated string")))
}

struct FilterParser<'c> {
    /// Name of the row in this filter.
    param: String,
    captures: &'c Captures,
}

impl FilterParser<'_> {
    fn or_expr<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (mut input, mut left) = self.and_expr(input)?;
        loop {
            match preceded(ws, alt((sym("||"), keyword("or"))))(input) {
                Ok((rest, _)) => {
                    let (rest, right) = cut(preceded(ws, |i| self.and_expr(i)))(rest)?;
                    left = left.or(right);
                    input = rest;
                }
                Err(nom::Err::Error(_)) => return Ok((input, left)),
                Err(e) => return Err(e),
            }
        }
    }

    fn and_expr<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (mut input, mut left) = self.unary(input)?;
        loop {
            match preceded(ws, alt((sym("&&"), keyword("and"))))(input) {
                Ok((rest, _)) => {
                    let (rest, right) = cut(preceded(ws, |i| self.unary(i)))(rest)?;
                    left = left.and(right);
                    input = rest;
                }
                Err(nom::Err::Error(_)) => return Ok((input, left)),
                Err(e) => return Err(e),
            }
        }
    }

    fn unary<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        if let Ok((rest, _)) = alt((sym("!"), keyword("not")))(input) {
            let (rest, inner) = cut(preceded(ws, |i| self.unary(i)))(rest)?;
            return Ok((rest, !inner));
        }
        self.comparison(input)
    }

    fn comparison<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (input, left) = self.additive(input)?;
        match preceded(ws, compare_op)(input) {
            Ok((rest, op)) => {
                let (rest, right) = cut(preceded(ws, |i| self.additive(i)))(rest)?;
                Ok((
                    rest,
                    Expr::Compare {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                ))
            }
            Err(nom::Err::Error(_)) => Ok((input, left)),
            Err(e) => Err(e),
        }
    }

    fn additive<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (mut input, mut left) = self.postfix(input)?;
        loop {
            let op = alt((value(ArithOp::Add, sym("+")), value(ArithOp::Sub, sym("-"))));
            match preceded(ws, op)(input) {
                Ok((rest, op)) => {
                    let (rest, right) = cut(preceded(ws, |i| self.postfix(i)))(rest)?;
                    left = Expr::Arith {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    input = rest;
                }
                Err(nom::Err::Error(_)) => return Ok((input, left)),
                Err(e) => return Err(e),
            }
        }
    }

    /// Member access and method calls: `a.b.C(args)`.
    fn postfix<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (mut input, mut expr) = self.primary(input)?;
        while let Ok((rest, name)) = preceded(sym("."), ident)(input) {
            match preceded(ws, sym("("))(rest) {
                Ok((rest, _)) => {
                    let (rest, args) = self.arguments(rest)?;
                    expr = expr.method(name, args);
                    input = rest;
                }
                Err(_) => {
                    expr = expr.field(name);
                    input = rest;
                }
            }
        }
        Ok((input, expr))
    }

    /// Arguments after the opening parenthesis, through the closing one.
    fn arguments<'a>(&self, input: &'a str) -> PResult<'a, Vec<Expr>> {
        terminated(
            separated_list0(preceded(ws, sym(",")), preceded(ws, |i| self.or_expr(i))),
            preceded(ws, cut(sym(")"))),
        )(input)
    }

    fn primary<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        alt((
            |i| self.parenthesized(i),
            map(string_literal, |s| Expr::Constant(Value::String(s))),
            map(number, Expr::Constant),
            value(Expr::Constant(Value::Bool(true)), keyword("true")),
            value(Expr::Constant(Value::Bool(false)), keyword("false")),
            value(Expr::Constant(Value::Null), keyword("null")),
            |i| self.capture(i),
            map(ident, |name| {
                if name == self.param {
                    Expr::Row
                } else {
                    col(name)
                }
            }),
        ))(input)
    }

    fn parenthesized<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        delimited(
            sym("("),
            preceded(ws, |i| self.or_expr(i)),
            preceded(ws, cut(sym(")"))),
        )(input)
    }

    /// `$name`, replaced by its captured value.
    fn capture<'a>(&self, input: &'a str) -> PResult<'a, Expr> {
        let (rest, name) = preceded(char('$'), cut(ident))(input)?;
        match self.captures.get(name) {
            Some(v) => Ok((rest, Expr::Constant(v.clone()))),
            None => Err(nom::Err::Failure(FilterError::new(
                input,
                format!("unbound variable '${}'", name),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Record;
    use crate::ast::builders::*;

    #[test]
    fn test_lambda_header() {
        let expr = parse("a => a.Name.EndsWith(\"2\")").unwrap();
        assert_eq!(expr, col("Name").ends_with("2"));
    }

    #[test]
    fn test_shorthand_columns() {
        assert_eq!(parse("Id > 3").unwrap(), col("Id").gt(3));
        assert_eq!(parse("x.Id > 3").unwrap(), col("Id").gt(3));
    }

    #[test]
    fn test_precedence() {
        let expr = parse("x.A == 1 || x.B == 2 && !x.C.Contains('z')").unwrap();
        let expected = col("A").eq(1).or(col("B").eq(2).and(!col("C").contains("z")));
        assert_eq!(expr, expected);

        let grouped = parse("(A = 1 or B <> 2) and not C").unwrap();
        assert_eq!(grouped, col("A").eq(1).or(col("B").ne(2)).and(!col("C")));
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("X == -4").unwrap(), col("X").eq(-4));
        assert_eq!(parse("X >= 1.5").unwrap(), col("X").gte(1.5));
        assert_eq!(parse("X != null").unwrap(), col("X").ne(Value::Null));
        assert_eq!(parse("X == true").unwrap(), col("X").eq(true));
        assert_eq!(parse(r#"X == "a \"q\"""#).unwrap(), col("X").eq("a \"q\""));
        assert_eq!(parse("X == 'it\\'s'").unwrap(), col("X").eq("it's"));
        // Keywords only match whole words.
        assert_eq!(parse("trueish").unwrap(), col("trueish"));
    }

    #[test]
    fn test_captures() {
        let mut user = Record::new();
        user.insert("Name".into(), Value::from("John"));
        let captures = Captures::new().with("min", 3).with("user", user.clone());
        let expr = parse_filter("x => x.Id > $min && x.Name == $user.Name", &captures).unwrap();
        assert_eq!(
            expr,
            col("Id").gt(3).and(col("Name").eq(captured(user).field("Name")))
        );
    }

    #[test]
    fn test_arithmetic_and_methods() {
        let unbound = parse("x.Name.StartsWith($p + 'b')").unwrap_err();
        assert!(matches!(unbound, OrmError::Parse { position: 18, .. }));

        let expr = parse_filter("x.Name.StartsWith($p + 'b')", &Captures::new().with("p", "a")).unwrap();
        assert_eq!(expr, col("Name").starts_with(val("a").plus("b")));
        let trimmed = parse("Name == ' a '.Trim()").unwrap();
        assert_eq!(trimmed, col("Name").eq(val(" a ").method("Trim", vec![])));
    }

    #[test]
    fn test_errors_have_positions() {
        match parse("x.Id > ").unwrap_err() {
            OrmError::Parse { position, message } => {
                assert_eq!(position, 7);
                assert_eq!(message, "unexpected end of input");
            }
            other => panic!("unexpected error: {other}"),
        }
        match parse("x.Id > 3 )").unwrap_err() {
            OrmError::Parse { position, .. } => assert_eq!(position, 9),
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse("x.Name == 'open").is_err());
        assert!(parse("").is_err());
        assert!(parse("x.Name.Contains('a'").is_err());
    }
}
