//! Database connection settings.

use crate::error::{OrmError, OrmResult};
use crate::ident::validate_ident;
use std::fmt;
use std::path::Path;

pub const DEFAULT_PORT: u16 = 5432;

/// Connection parameters for [`PgExecutor`](crate::PgExecutor).
///
/// Usually read from the environment:
///
/// | variable            | field      |
/// |---------------------|------------|
/// | `DATABASE_HOST`     | `host`     |
/// | `DATABASE_USER`     | `user`     |
/// | `DATABASE_PASSWORD` | `password` |
/// | `DATABASE_NAME`     | `dbname`   |
/// | `DATABASE_PORT`     | `port` (optional, default 5432) |
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub port: u16,
}

impl DbConfig {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            dbname: dbname.into(),
            port: DEFAULT_PORT,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Read settings from the process environment, after loading `.env` from
    /// the current directory (or a parent) when one exists.
    ///
    /// Variables already set in the process take precedence over the file.
    pub fn from_env() -> OrmResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), with an explicit env file.
    ///
    /// A missing or unreadable file is a configuration error.
    pub fn from_env_file(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        dotenvy::from_path(path)
            .map_err(|e| OrmError::Config(format!("failed to load {}: {e}", path.display())))?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> OrmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| OrmError::Config(format!("{key} is not set")))
        };

        let port = match lookup("DATABASE_PORT").filter(|v| !v.trim().is_empty()) {
            None => DEFAULT_PORT,
            Some(raw) => raw.trim().parse().map_err(|_| {
                OrmError::Config(format!("DATABASE_PORT must be a port number, got {raw:?}"))
            })?,
        };

        Ok(Self {
            host: required("DATABASE_HOST")?,
            user: required("DATABASE_USER")?,
            // An empty password is valid (trust/peer auth).
            password: lookup("DATABASE_PASSWORD").unwrap_or_default(),
            dbname: required("DATABASE_NAME")?,
            port,
        })
    }

    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(&self.dbname);
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        config
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("port", &self.port)
            .finish()
    }
}

/// Behaviour knobs for [`PgExecutor`](crate::PgExecutor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgExecutorConfig {
    /// Column returned by INSERT to report `last_id`. Tables without this
    /// column are inserted into without `RETURNING` and report no id.
    /// `None` never asks for an id.
    pub id_column: Option<String>,
}

impl Default for PgExecutorConfig {
    fn default() -> Self {
        Self {
            id_column: Some("id".to_string()),
        }
    }
}

impl PgExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the id column reported by INSERT.
    pub fn id_column(mut self, column: impl Into<String>) -> OrmResult<Self> {
        let column = column.into();
        validate_ident(&column)?;
        self.id_column = Some(column);
        Ok(self)
    }

    /// Do not ask the server for generated ids.
    pub fn without_id_column(mut self) -> Self {
        self.id_column = None;
        self
    }
}
