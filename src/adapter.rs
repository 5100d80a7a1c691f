//! Per-dialect insert strategies.
//!
//! Each dialect reads a database-generated key back differently. An adapter
//! turns an [`InsertStatement`] into an [`InsertPlan`] that the executor runs
//! on a single connection.

use serde::Serialize;

use crate::transpiler::{Dialect, InsertStatement, Statement};

/// How the generated key of a new row is obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Identity {
    /// No generated key; the insert is executed as is.
    None,
    /// The insert itself returns the key columns.
    Returning,
    /// A follow-up query on the same connection returning one row.
    Query(String),
}

/// An INSERT plus the way to read back its generated key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertPlan {
    pub insert: Statement,
    pub identity: Identity,
}

impl InsertPlan {
    /// The plan as one SQL batch, for display.
    pub fn to_sql(&self) -> String {
        match &self.identity {
            Identity::None | Identity::Returning => self.insert.sql.clone(),
            Identity::Query(q) => format!("{}; {}", self.insert.sql, q),
        }
    }
}

pub trait InsertAdapter {
    /// Follow-up query returning the last generated identity, if the
    /// dialect reads it back with a separate statement.
    fn identity_query(&self, insert: &InsertStatement) -> String;

    fn plan(&self, insert: &InsertStatement) -> InsertPlan {
        let identity = if insert.key_properties.is_empty() {
            Identity::None
        } else {
            Identity::Query(self.identity_query(insert))
        };
        InsertPlan {
            insert: insert.statement(),
            identity,
        }
    }
}

pub struct SqlServerAdapter;

impl InsertAdapter for SqlServerAdapter {
    fn identity_query(&self, _insert: &InsertStatement) -> String {
        "SELECT SCOPE_IDENTITY() id".to_string()
    }
}

pub struct SqlCeAdapter;

impl InsertAdapter for SqlCeAdapter {
    fn identity_query(&self, _insert: &InsertStatement) -> String {
        "SELECT @@IDENTITY id".to_string()
    }
}

pub struct MysqlAdapter;

impl InsertAdapter for MysqlAdapter {
    fn identity_query(&self, _insert: &InsertStatement) -> String {
        "SELECT LAST_INSERT_ID() id".to_string()
    }
}

pub struct SqliteAdapter;

impl InsertAdapter for SqliteAdapter {
    fn identity_query(&self, _insert: &InsertStatement) -> String {
        "SELECT last_insert_rowid() id".to_string()
    }
}

pub struct Db2Adapter;

impl InsertAdapter for Db2Adapter {
    fn identity_query(&self, _insert: &InsertStatement) -> String {
        "SELECT IDENTITY_VAL_LOCAL() ID FROM SYSIBM.SYSDUMMY1".to_string()
    }
}

/// Firebird has no session identity function; the newest key is read back.
pub struct FirebirdAdapter;

impl InsertAdapter for FirebirdAdapter {
    fn identity_query(&self, insert: &InsertStatement) -> String {
        let key = insert.key_columns.first().map(String::as_str).unwrap_or("ID");
        format!(
            "SELECT FIRST 1 {} ID FROM {} ORDER BY {} DESC",
            key, insert.table, key
        )
    }
}

pub struct PostgresAdapter;

impl InsertAdapter for PostgresAdapter {
    fn identity_query(&self, insert: &InsertStatement) -> String {
        format!("RETURNING {}", insert.key_columns.join(", "))
    }

    // Every generated key comes back from the INSERT itself.
    fn plan(&self, insert: &InsertStatement) -> InsertPlan {
        let mut statement = insert.statement();
        if insert.key_properties.is_empty() {
            return InsertPlan {
                insert: statement,
                identity: Identity::None,
            };
        }
        statement.sql = format!("{} {}", statement.sql, self.identity_query(insert));
        InsertPlan {
            insert: statement,
            identity: Identity::Returning,
        }
    }
}

/// The insert strategy for `dialect`.
pub fn adapter_for(dialect: Dialect) -> Box<dyn InsertAdapter + Send + Sync> {
    match dialect {
        Dialect::Db2 => Box::new(Db2Adapter),
        Dialect::Postgres => Box::new(PostgresAdapter),
        Dialect::MySql => Box::new(MysqlAdapter),
        Dialect::Sqlite => Box::new(SqliteAdapter),
        Dialect::SqlServer => Box::new(SqlServerAdapter),
        Dialect::SqlCe => Box::new(SqlCeAdapter),
        Dialect::Firebird => Box::new(FirebirdAdapter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Record, Value};
    use crate::schema::{EntityDescriptor, Registry};
    use crate::transpiler::StatementBuilder;

    fn article_insert(dialect: Dialect) -> InsertStatement {
        let registry = Registry::new();
        let meta = registry
            .resolve(&EntityDescriptor::new("Article").property("Id").property("Name"))
            .unwrap();
        let mut record = Record::new();
        record.insert("Id".into(), Value::Int(0));
        record.insert("Name".into(), Value::from("a"));
        StatementBuilder::new(&meta, dialect).insert(&record).unwrap()
    }

    #[test]
    fn test_follow_up_queries() {
        let plan = adapter_for(Dialect::SqlServer).plan(&article_insert(Dialect::SqlServer));
        assert_eq!(
            plan.to_sql(),
            "INSERT INTO ARTICLE (NAME) VALUES (@Name); SELECT SCOPE_IDENTITY() id"
        );
        let plan = adapter_for(Dialect::Sqlite).plan(&article_insert(Dialect::Sqlite));
        assert_eq!(plan.identity, Identity::Query("SELECT last_insert_rowid() id".into()));
        let plan = adapter_for(Dialect::MySql).plan(&article_insert(Dialect::MySql));
        assert_eq!(plan.identity, Identity::Query("SELECT LAST_INSERT_ID() id".into()));
        let plan = adapter_for(Dialect::SqlCe).plan(&article_insert(Dialect::SqlCe));
        assert_eq!(plan.identity, Identity::Query("SELECT @@IDENTITY id".into()));
    }

    #[test]
    fn test_firebird_reads_newest_key() {
        let plan = adapter_for(Dialect::Firebird).plan(&article_insert(Dialect::Firebird));
        assert_eq!(
            plan.identity,
            Identity::Query("SELECT FIRST 1 ID ID FROM ARTICLE ORDER BY ID DESC".into())
        );
    }

    #[test]
    fn test_postgres_returning() {
        let plan = adapter_for(Dialect::Postgres).plan(&article_insert(Dialect::Postgres));
        assert_eq!(plan.identity, Identity::Returning);
        assert_eq!(plan.insert.sql, "INSERT INTO ARTICLE (NAME) VALUES (@Name) RETURNING ID");
    }

    #[test]
    fn test_no_generated_key() {
        let registry = Registry::new();
        let meta = registry
            .resolve(&EntityDescriptor::new("Tag").explicit_key("Code").property("Label"))
            .unwrap();
        let mut record = Record::new();
        record.insert("Code".into(), Value::from("rs"));
        record.insert("Label".into(), Value::from("Rust"));
        let insert = StatementBuilder::new(&meta, Dialect::Postgres).insert(&record).unwrap();
        for dialect in Dialect::ALL {
            let plan = adapter_for(dialect).plan(&insert);
            assert_eq!(plan.identity, Identity::None);
            assert_eq!(plan.to_sql(), "INSERT INTO TAG (CODE, LABEL) VALUES (@Code, @Label)");
        }
    }
}
