//! Runtime configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::engine::CommandOptions;
use crate::error::{OrmError, OrmResult};
use crate::schema::NameCase;
use crate::transpiler::Dialect;

/// minorm configuration, read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database connection URL
    pub database_url: Option<String>,

    /// SQL dialect; derived from `database_url` when unset
    pub dialect: Option<Dialect>,

    /// Path to an entity schema file
    pub schema_path: Option<PathBuf>,

    /// Per-command timeout in seconds; no timeout when unset
    pub command_timeout_secs: Option<u64>,

    pub default_page_size: i64,

    /// Case of default table and column names
    pub name_case: NameCase,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            dialect: None,
            schema_path: None,
            command_timeout_secs: Some(30),
            default_page_size: 50,
            name_case: NameCase::Upper,
        }
    }
}

impl Config {
    /// Create a new configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load from `path`, else `<config dir>/minorm/config.toml`, else
    /// defaults.
    pub fn load(path: Option<&Path>) -> OrmResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("minorm").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> OrmResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> OrmResult<Self> {
        let config: Config = toml::from_str(text).map_err(|e| OrmError::Config(e.to_string()))?;
        if config.default_page_size < 0 {
            return Err(OrmError::Config("default_page_size must be >= 0".to_string()));
        }
        Ok(config)
    }

    /// The configured dialect, or the one named by the URL scheme.
    pub fn effective_dialect(&self) -> Dialect {
        self.dialect
            .or_else(|| self.database_url.as_deref().and_then(Dialect::from_url))
            .unwrap_or_default()
    }

    pub fn command_options(&self) -> CommandOptions {
        CommandOptions {
            timeout: self.command_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn database(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.config.dialect = Some(dialect);
        self
    }

    pub fn schema(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.schema_path = Some(path.into());
        self
    }

    /// Set the command timeout; `None` disables it
    pub fn timeout(mut self, secs: Option<u64>) -> Self {
        self.config.command_timeout_secs = secs;
        self
    }

    pub fn page_size(mut self, size: i64) -> Self {
        self.config.default_page_size = size;
        self
    }

    pub fn name_case(mut self, case: NameCase) -> Self {
        self.config.name_case = case;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        self.config
    }
}
