use crate::error::{OrmError, OrmResult};
use crate::transpiler::dialect::Dialect;
use crate::transpiler::params::ParamBag;

/// Append a row-limiting clause to `sql`.
///
/// The limit and offset are bound as `@top` and `@skip`; the returned bag
/// holds them. `page` is 1-based and defaults to 1.
pub fn append_pagination(
    sql: &str,
    page: Option<i64>,
    page_size: i64,
    dialect: Dialect,
) -> OrmResult<(String, ParamBag)> {
    if page_size < 0 {
        return Err(OrmError::validation("pageSize must be a number >= 0"));
    }
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(OrmError::validation("page must be a number >= 1"));
    }
    let skip = (page - 1)
        .checked_mul(page_size)
        .ok_or_else(|| OrmError::validation("page offset out of range"))?;

    let generator = dialect.generator();
    let mut out = sql.to_string();
    if generator.requires_order_for_offset() && !has_order_by(sql) {
        out.push_str(" ORDER BY (SELECT NULL)");
    }
    out.push_str(&generator.limit_offset("@top", "@skip"));

    let params = ParamBag::new().with("top", page_size).with("skip", skip);
    Ok((out, params))
}

fn has_order_by(sql: &str) -> bool {
    sql.to_ascii_uppercase().contains(" ORDER BY ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;

    #[test]
    fn test_offset_from_page() {
        let (sql, params) = append_pagination("select ID from T", Some(3), 10, Dialect::Db2).unwrap();
        assert_eq!(sql, "select ID from T LIMIT @top OFFSET @skip");
        assert_eq!(params.get("skip"), Some(&Value::Int(20)));
        assert_eq!(params.get("top"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_default_page_is_first() {
        let (_, params) = append_pagination("select ID from T", None, 10, Dialect::Postgres).unwrap();
        assert_eq!(params.get("skip"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_invalid_arguments() {
        let err = append_pagination("select ID from T", Some(1), -1, Dialect::Db2).unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
        assert!(append_pagination("select ID from T", Some(0), 10, Dialect::Db2).is_err());
        assert!(append_pagination("select ID from T", Some(i64::MAX), 10, Dialect::Db2).is_err());
    }

    #[test]
    fn test_zero_page_size() {
        let (_, params) = append_pagination("select ID from T", Some(4), 0, Dialect::Db2).unwrap();
        assert_eq!(params.get("top"), Some(&Value::Int(0)));
        assert_eq!(params.get("skip"), Some(&Value::Int(0)));
    }

    #[test]
    fn test_fetch_dialects() {
        let (sql, _) = append_pagination("select ID from T", Some(2), 5, Dialect::SqlServer).unwrap();
        assert_eq!(
            sql,
            "select ID from T ORDER BY (SELECT NULL) OFFSET @skip ROWS FETCH NEXT @top ROWS ONLY"
        );
        let (sql, _) = append_pagination("select ID from T ORDER BY ID ASC", Some(2), 5, Dialect::SqlServer).unwrap();
        assert_eq!(sql, "select ID from T ORDER BY ID ASC OFFSET @skip ROWS FETCH NEXT @top ROWS ONLY");
        let (sql, _) = append_pagination("select ID from T", None, 5, Dialect::Firebird).unwrap();
        assert_eq!(sql, "select ID from T OFFSET @skip ROWS FETCH NEXT @top ROWS ONLY");
    }
}
