use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrmError;
use crate::transpiler::sql::db2::Db2Generator;
use crate::transpiler::sql::firebird::FirebirdGenerator;
use crate::transpiler::sql::mysql::MysqlGenerator;
use crate::transpiler::sql::postgres::PostgresGenerator;
use crate::transpiler::sql::sqlce::SqlCeGenerator;
use crate::transpiler::sql::sqlite::SqliteGenerator;
use crate::transpiler::sql::sqlserver::SqlServerGenerator;
use crate::transpiler::traits::SqlGenerator;

/// Supported SQL Dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Db2,
    Postgres,
    MySql,
    Sqlite,
    SqlServer,
    SqlCe,
    Firebird,
}

impl Dialect {
    pub const ALL: [Dialect; 7] = [
        Dialect::Db2,
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::SqlServer,
        Dialect::SqlCe,
        Dialect::Firebird,
    ];

    pub fn generator(&self) -> Box<dyn SqlGenerator> {
        match self {
            Dialect::Db2 => Box::new(Db2Generator),
            Dialect::Postgres => Box::new(PostgresGenerator),
            Dialect::MySql => Box::new(MysqlGenerator),
            Dialect::Sqlite => Box::new(SqliteGenerator),
            Dialect::SqlServer => Box::new(SqlServerGenerator),
            Dialect::SqlCe => Box::new(SqlCeGenerator),
            Dialect::Firebird => Box::new(FirebirdGenerator),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Db2 => "db2",
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::SqlServer => "sqlserver",
            Dialect::SqlCe => "sqlce",
            Dialect::Firebird => "firebird",
        }
    }

    /// Identify the dialect of a connection URL by its scheme.
    pub fn from_url(url: &str) -> Option<Dialect> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Some(Dialect::Postgres),
            "mysql" | "mariadb" => Some(Dialect::MySql),
            "sqlite" => Some(Dialect::Sqlite),
            "mssql" | "sqlserver" => Some(Dialect::SqlServer),
            "sqlce" => Some(Dialect::SqlCe),
            "db2" => Some(Dialect::Db2),
            "firebird" => Some(Dialect::Firebird),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dialect {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "postgresql" | "pg" => return Ok(Dialect::Postgres),
            "mssql" => return Ok(Dialect::SqlServer),
            "mariadb" => return Ok(Dialect::MySql),
            _ => {}
        }
        Dialect::ALL
            .into_iter()
            .find(|d| d.name() == lower)
            .ok_or_else(|| OrmError::Config(format!("unknown dialect '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        assert_eq!(Dialect::from_url("postgres://localhost/db"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_url("sqlite::memory:"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("MySQL://u@h/db"), Some(Dialect::MySql));
        assert_eq!(Dialect::from_url("oracle://h"), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("SqlServer".parse::<Dialect>().unwrap(), Dialect::SqlServer);
        assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert!("oracle".parse::<Dialect>().is_err());
        for d in Dialect::ALL {
            assert_eq!(d.name().parse::<Dialect>().unwrap(), d);
        }
    }

    #[test]
    fn test_default_is_db2() {
        assert_eq!(Dialect::default(), Dialect::Db2);
        assert_eq!(Dialect::default().generator().upper_function(), "UCASE");
    }
}
