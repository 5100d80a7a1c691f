//! SELECT / INSERT / UPDATE / DELETE text from entity metadata.

use serde::Serialize;

use crate::ast::{Expr, Record, SortOrder, Value};
use crate::error::{OrmError, OrmResult};
use crate::schema::{EntityMeta, ResolvedProperty};
use crate::transpiler::dialect::Dialect;
use crate::transpiler::pagination::append_pagination;
use crate::transpiler::params::ParamBag;
use crate::transpiler::predicate::translate;
use crate::transpiler::traits::SqlGenerator;

/// Parameters of a statement: one bag, or one bag per row for batches.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Params {
    Single(ParamBag),
    Batch(Vec<ParamBag>),
}

impl Params {
    /// Every bag the statement is executed with.
    pub fn bags(&self) -> &[ParamBag] {
        match self {
            Params::Single(bag) => std::slice::from_ref(bag),
            Params::Batch(bags) => bags,
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Params::Batch(_))
    }
}

impl Default for Params {
    fn default() -> Self {
        Params::Single(ParamBag::new())
    }
}

/// SQL text ready for the executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub params: Params,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: ParamBag) -> Self {
        Self {
            sql: sql.into(),
            params: Params::Single(params),
        }
    }

    pub fn batch(sql: impl Into<String>, params: Vec<ParamBag>) -> Self {
        Self {
            sql: sql.into(),
            params: Params::Batch(params),
        }
    }
}

/// An INSERT, plus the pieces a dialect adapter needs to rebuild it with
/// identity retrieval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertStatement {
    pub sql: String,
    pub params: Params,
    pub table: String,
    pub column_list: String,
    pub param_list: String,
    /// Generated key properties, in declaration order.
    pub key_properties: Vec<String>,
    /// Generated key columns, parallel to `key_properties`.
    pub key_columns: Vec<String>,
}

impl InsertStatement {
    pub fn statement(&self) -> Statement {
        Statement {
            sql: self.sql.clone(),
            params: self.params.clone(),
        }
    }
}

/// Key lookup for `select_by_id`.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValues {
    Single(Value),
    /// Values keyed by key property name.
    Composite(Record),
}

impl From<i64> for KeyValues {
    fn from(v: i64) -> Self {
        KeyValues::Single(Value::Int(v))
    }
}

impl From<i32> for KeyValues {
    fn from(v: i32) -> Self {
        KeyValues::Single(Value::Int(v as i64))
    }
}

impl From<&str> for KeyValues {
    fn from(v: &str) -> Self {
        KeyValues::Single(Value::from(v))
    }
}

impl From<String> for KeyValues {
    fn from(v: String) -> Self {
        KeyValues::Single(Value::String(v))
    }
}

impl From<Value> for KeyValues {
    fn from(v: Value) -> Self {
        match v {
            Value::Record(r) => KeyValues::Composite(r),
            other => KeyValues::Single(other),
        }
    }
}

impl From<Record> for KeyValues {
    fn from(r: Record) -> Self {
        KeyValues::Composite(r)
    }
}

/// ORDER BY terms over property names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBy {
    terms: Vec<(String, SortOrder)>,
}

impl OrderBy {
    pub fn asc(property: &str) -> Self {
        Self::default().then_asc(property)
    }

    pub fn desc(property: &str) -> Self {
        Self::default().then_desc(property)
    }

    pub fn then_asc(mut self, property: &str) -> Self {
        self.terms.push((property.to_string(), SortOrder::Asc));
        self
    }

    pub fn then_desc(mut self, property: &str) -> Self {
        self.terms.push((property.to_string(), SortOrder::Desc));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[(String, SortOrder)] {
        &self.terms
    }
}

/// A filtered, ordered, optionally paged read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Expr>,
    pub order: OrderBy,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order = order;
        self
    }

    /// Page `page` (1-based) of `page_size` rows.
    pub fn page(mut self, page: i64, page_size: i64) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    pub fn page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Builds statements for one entity in one dialect.
pub struct StatementBuilder<'a> {
    meta: &'a EntityMeta,
    dialect: Dialect,
    generator: Box<dyn SqlGenerator>,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(meta: &'a EntityMeta, dialect: Dialect) -> Self {
        Self {
            meta,
            dialect,
            generator: dialect.generator(),
        }
    }

    pub fn meta(&self) -> &EntityMeta {
        self.meta
    }

    fn table(&self) -> String {
        self.generator.column_name(self.meta.table())
    }

    fn column(&self, p: &ResolvedProperty) -> String {
        self.generator.column_name(&p.column)
    }

    fn column_list(&self, props: &[&ResolvedProperty], sep: &str) -> String {
        props.iter().map(|p| self.column(p)).collect::<Vec<_>>().join(sep)
    }

    /// `C1 = @P1<sep>C2 = @P2`
    fn assignments(&self, props: &[&ResolvedProperty], sep: &str) -> String {
        props
            .iter()
            .map(|p| format!("{} = @{}", self.column(p), p.name))
            .collect::<Vec<_>>()
            .join(sep)
    }

    fn where_clause(&self, sql: &mut String, filter: Option<&Expr>) -> OrmResult<ParamBag> {
        match filter {
            Some(expr) => {
                let fragment = translate(expr, self.meta, self.dialect)?;
                sql.push_str(" WHERE ");
                sql.push_str(&fragment.sql);
                Ok(fragment.params)
            }
            None => Ok(ParamBag::new()),
        }
    }

    /// `select C1,C2 from T [WHERE ...]`
    pub fn select_all(&self, filter: Option<&Expr>) -> OrmResult<Statement> {
        let mut sql = format!(
            "select {} from {}",
            self.column_list(&self.meta.select_properties(), ","),
            self.table()
        );
        let params = self.where_clause(&mut sql, filter)?;
        Ok(Statement::new(sql, params))
    }

    /// Filter, order and page in one statement.
    pub fn select(&self, query: &Query) -> OrmResult<Statement> {
        let Statement { mut sql, params } = self.select_all(query.filter.as_ref())?;
        let mut params = match params {
            Params::Single(bag) => bag,
            Params::Batch(_) => ParamBag::new(),
        };
        sql.push_str(&self.order_by(&query.order)?);
        if let Some(page_size) = query.page_size {
            let (paged, extra) = append_pagination(&sql, query.page, page_size, self.dialect)?;
            sql = paged;
            params.extend(extra);
        }
        Ok(Statement::new(sql, params))
    }

    /// `select count(*) from T [WHERE ...]`
    pub fn count(&self, filter: Option<&Expr>) -> OrmResult<Statement> {
        let mut sql = format!("select count(*) from {}", self.table());
        let params = self.where_clause(&mut sql, filter)?;
        Ok(Statement::new(sql, params))
    }

    /// `SELECT C1,C2 FROM T WHERE K = @K [AND ...]`
    pub fn select_by_id(&self, key: &KeyValues) -> OrmResult<Statement> {
        let keys = self.meta.key_properties()?;
        let mut params = ParamBag::new();
        match key {
            KeyValues::Single(value) => {
                if keys.len() != 1 {
                    return Err(OrmError::validation(format!(
                        "{} has {} key properties, got a single key value",
                        self.meta.name(),
                        keys.len()
                    )));
                }
                params.insert(keys[0].name.clone(), value.clone());
            }
            KeyValues::Composite(values) => {
                for k in &keys {
                    params.insert(k.name.clone(), key_value(values, &k.name)?);
                }
            }
        }
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            self.column_list(&self.meta.select_properties(), ","),
            self.table(),
            self.assignments(&keys, " AND ")
        );
        Ok(Statement::new(sql, params))
    }

    fn insert_parts(&self) -> (Vec<&'a ResolvedProperty>, String, String, Vec<String>, Vec<String>) {
        let props = self.meta.insert_properties();
        let column_list = self.column_list(&props, ", ");
        let param_list = props
            .iter()
            .map(|p| format!("@{}", p.name))
            .collect::<Vec<_>>()
            .join(", ");
        let generated: Vec<&ResolvedProperty> = self.meta.properties().iter().filter(|p| p.key).collect();
        let key_properties = generated.iter().map(|p| p.name.clone()).collect();
        let key_columns = generated.iter().map(|p| self.column(p)).collect();
        (props, column_list, param_list, key_properties, key_columns)
    }

    fn insert_sql(&self, column_list: &str, param_list: &str, values_keyword: &str) -> String {
        if column_list.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", self.table())
        } else {
            format!(
                "INSERT INTO {} ({}) {} ({})",
                self.table(),
                column_list,
                values_keyword,
                param_list
            )
        }
    }

    /// Single-row INSERT. Generated keys and computed properties are left
    /// out; explicit keys are written.
    pub fn insert(&self, entity: &Record) -> OrmResult<InsertStatement> {
        let (props, column_list, param_list, key_properties, key_columns) = self.insert_parts();
        let params = bag_of(entity, &props);
        Ok(InsertStatement {
            sql: self.insert_sql(&column_list, &param_list, "VALUES"),
            params: Params::Single(params),
            table: self.table(),
            column_list,
            param_list,
            key_properties,
            key_columns,
        })
    }

    /// One INSERT executed once per row.
    pub fn insert_batch(&self, entities: &[Record]) -> OrmResult<InsertStatement> {
        let (props, column_list, param_list, key_properties, key_columns) = self.insert_parts();
        let bags = entities.iter().map(|e| bag_of(e, &props)).collect();
        Ok(InsertStatement {
            sql: self.insert_sql(&column_list, &param_list, "values"),
            params: Params::Batch(bags),
            table: self.table(),
            column_list,
            param_list,
            key_properties,
            key_columns,
        })
    }

    fn update_sql(&self) -> OrmResult<(String, Vec<&'a ResolvedProperty>, Vec<&'a ResolvedProperty>)> {
        let keys = self.meta.key_properties()?;
        let sets = self.meta.update_properties();
        if sets.is_empty() {
            return Err(OrmError::validation(format!(
                "{} has no updatable properties",
                self.meta.name()
            )));
        }
        let sql = format!(
            "update {} set {} where {}",
            self.table(),
            self.assignments(&sets, ", "),
            self.assignments(&keys, " and ")
        );
        Ok((sql, sets, keys))
    }

    /// `update T set C = @P, ... where K = @K and ...`
    pub fn update(&self, entity: &Record) -> OrmResult<Statement> {
        let (sql, sets, keys) = self.update_sql()?;
        Ok(Statement::new(sql, update_bag(entity, &sets, &keys)?))
    }

    pub fn update_batch(&self, entities: &[Record]) -> OrmResult<Statement> {
        let (sql, sets, keys) = self.update_sql()?;
        let bags = entities
            .iter()
            .map(|e| update_bag(e, &sets, &keys))
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(Statement::batch(sql, bags))
    }

    fn delete_sql(&self) -> OrmResult<(String, Vec<&'a ResolvedProperty>)> {
        let keys = self.meta.key_properties()?;
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.table(),
            self.assignments(&keys, " AND ")
        );
        Ok((sql, keys))
    }

    /// `DELETE FROM T WHERE K = @K AND ...`
    pub fn delete(&self, entity: &Record) -> OrmResult<Statement> {
        let (sql, keys) = self.delete_sql()?;
        Ok(Statement::new(sql, key_bag(entity, &keys)?))
    }

    pub fn delete_batch(&self, entities: &[Record]) -> OrmResult<Statement> {
        let (sql, keys) = self.delete_sql()?;
        let bags = entities
            .iter()
            .map(|e| key_bag(e, &keys))
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(Statement::batch(sql, bags))
    }

    /// Unconditional delete.
    pub fn delete_all(&self) -> String {
        format!("DELETE FROM {}", self.table())
    }

    /// ` ORDER BY C1 ASC, C2 DESC`, or empty.
    pub fn order_by(&self, order: &OrderBy) -> OrmResult<String> {
        if order.is_empty() {
            return Ok(String::new());
        }
        let terms = order
            .terms()
            .iter()
            .map(|(property, dir)| -> OrmResult<String> {
                let column = self.generator.column_name(self.meta.column(property)?);
                let dir = match dir {
                    SortOrder::Asc => "ASC",
                    SortOrder::Desc => "DESC",
                };
                Ok(format!("{} {}", column, dir))
            })
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(format!(" ORDER BY {}", terms.join(", ")))
    }
}

fn key_value(record: &Record, name: &str) -> OrmResult<Value> {
    record
        .get(name)
        .or_else(|| {
            record
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
        .cloned()
        .ok_or_else(|| OrmError::validation(format!("missing value for key '{}'", name)))
}

fn bag_of(entity: &Record, props: &[&ResolvedProperty]) -> ParamBag {
    props
        .iter()
        .map(|p| (p.name.clone(), entity.get(&p.name).cloned().unwrap_or(Value::Null)))
        .collect()
}

fn key_bag(entity: &Record, keys: &[&ResolvedProperty]) -> OrmResult<ParamBag> {
    keys.iter()
        .map(|k| -> OrmResult<(String, Value)> { Ok((k.name.clone(), key_value(entity, &k.name)?)) })
        .collect()
}

fn update_bag(entity: &Record, sets: &[&ResolvedProperty], keys: &[&ResolvedProperty]) -> OrmResult<ParamBag> {
    let mut bag = bag_of(entity, sets);
    bag.extend(key_bag(entity, keys)?);
    Ok(bag)
}
