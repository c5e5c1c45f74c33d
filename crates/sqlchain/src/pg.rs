//! A blocking PostgreSQL [`Executor`].

use crate::builder::QueryBuilder;
use crate::config::{DbConfig, PgExecutorConfig};
use crate::error::{OrmError, OrmResult};
use crate::executor::{Executor, MutationSummary, Row};
use crate::row::decode_row;
use crate::statement::{Statement, Verb};
use crate::value::Value;
use std::fmt;
use tokio::runtime::Runtime;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls};

/// Runs statements over one `tokio_postgres` connection, blocking the caller
/// until each statement completes.
///
/// The executor drives the connection on a private single-worker runtime, so
/// it must not be used from inside another tokio runtime's async context.
/// Statements from several builders sharing one `&PgExecutor` are
/// serialized on the connection.
///
/// # Example
/// ```ignore
/// let db = PgExecutor::connect(&DbConfig::from_env()?)?;
/// let mut qb = db.query_builder();
/// qb.table("users");
/// let json = qb.select("*")?.execute_json()?;
/// ```
pub struct PgExecutor {
    client: Client,
    config: PgExecutorConfig,
    // Dropped last: the connection task lives on it.
    runtime: Runtime,
}

impl PgExecutor {
    /// Connect with the default [`PgExecutorConfig`].
    pub fn connect(db: &DbConfig) -> OrmResult<Self> {
        Self::connect_with_config(db, PgExecutorConfig::default())
    }

    /// Connect with a custom [`PgExecutorConfig`].
    pub fn connect_with_config(db: &DbConfig, config: PgExecutorConfig) -> OrmResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("sqlchain-pg")
            .enable_all()
            .build()
            .map_err(|e| OrmError::Connection(format!("failed to start runtime: {e}")))?;

        let pg_config = db.to_pg_config();
        let (client, connection) = runtime
            .block_on(pg_config.connect(NoTls))
            .map_err(|e| OrmError::Connection(e.to_string()))?;

        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "sqlchain.pg", error = %e, "connection error");
            }
        });

        tracing::info!(
            target: "sqlchain.pg",
            host = %db.host,
            port = db.port,
            dbname = %db.dbname,
            "connected",
        );

        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Shortcut for [`DbConfig::from_env`] followed by [`connect`](Self::connect).
    pub fn from_env() -> OrmResult<Self> {
        Self::connect(&DbConfig::from_env()?)
    }

    pub fn config(&self) -> &PgExecutorConfig {
        &self.config
    }

    /// A fresh, idle builder borrowing this executor.
    pub fn query_builder(&self) -> QueryBuilder<&Self> {
        QueryBuilder::new(self)
    }

    /// Run one or more raw SQL statements without parameters, e.g. schema
    /// setup. Nothing is logged or returned.
    pub fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        self.runtime
            .block_on(self.client.batch_execute(sql))
            .map_err(OrmError::from_db_error)
    }

    /// Whether the underlying connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }

    fn wire_sql(&self, stmt: &Statement) -> String {
        wire_sql(stmt, self.config.id_column.as_deref())
    }

    fn returns_id(&self, stmt: &Statement) -> bool {
        stmt.verb() == Verb::Insert && self.config.id_column.is_some()
    }

    async fn insert_returning_id(
        &self,
        stmt: &Statement,
        params: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<MutationSummary> {
        let prepared = match self.client.prepare(&self.wire_sql(stmt)).await {
            Ok(prepared) => prepared,
            // The table has no such id column: run the plain INSERT instead.
            Err(e) if e.code() == Some(&SqlState::UNDEFINED_COLUMN) => {
                tracing::debug!(
                    target: "sqlchain.pg",
                    error = %e,
                    "insert without RETURNING id",
                );
                return self.execute_plain(&wire_sql(stmt, None), params).await;
            }
            Err(e) => return Err(OrmError::from_prepare_error(e)),
        };
        let rows = self
            .client
            .query(&prepared, params)
            .await
            .map_err(OrmError::from_db_error)?;
        let last_id = match rows.first() {
            Some(row) => read_id(row)?,
            None => None,
        };
        Ok(MutationSummary {
            affected_rows: rows.len() as u64,
            last_id,
        })
    }

    async fn execute_plain(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<MutationSummary> {
        let prepared = self
            .client
            .prepare(sql)
            .await
            .map_err(OrmError::from_prepare_error)?;
        let affected_rows = self
            .client
            .execute(&prepared, params)
            .await
            .map_err(OrmError::from_db_error)?;
        Ok(MutationSummary {
            affected_rows,
            last_id: None,
        })
    }
}

/// The SQL actually sent for `stmt`: numbered placeholders, plus a
/// `RETURNING` clause for INSERT when an id column is configured.
///
/// Float parameters are cast to `float8` so the server compares them as
/// floats instead of inferring the column's (possibly integer) type.
fn wire_sql(stmt: &Statement, id_column: Option<&str>) -> String {
    let mut sql = stmt.to_numbered_sql_with_casts(|value| match value {
        Value::Float(_) => Some("float8"),
        _ => None,
    });
    if stmt.verb() == Verb::Insert
        && let Some(id_column) = id_column
    {
        sql.push_str(" RETURNING ");
        sql.push_str(id_column);
    }
    sql
}

fn bind_params(stmt: &Statement) -> Vec<&(dyn ToSql + Sync)> {
    stmt.params()
        .iter()
        .map(|v| v as &(dyn ToSql + Sync))
        .collect()
}

fn read_id(row: &tokio_postgres::Row) -> OrmResult<Option<i64>> {
    let Some(column) = row.columns().first() else {
        return Ok(None);
    };
    let ty = column.type_();
    let id = if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(0)
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(0).map(|v| v.map(i64::from))
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(0).map(|v| v.map(i64::from))
    } else {
        // Non-integer keys (uuid, text, ...) have no numeric id to report.
        return Ok(None);
    };
    id.map_err(|e| OrmError::decode(column.name(), e.to_string()))
}

impl Executor for PgExecutor {
    fn fetch_rows(&self, stmt: &Statement) -> OrmResult<Vec<Row>> {
        let sql = self.wire_sql(stmt);
        let params = bind_params(stmt);
        let rows = self.runtime.block_on(async {
            let prepared = self
                .client
                .prepare(&sql)
                .await
                .map_err(OrmError::from_prepare_error)?;
            self.client
                .query(&prepared, &params)
                .await
                .map_err(OrmError::from_db_error)
        })?;
        rows.iter().map(decode_row).collect()
    }

    fn execute_mutation(&self, stmt: &Statement) -> OrmResult<MutationSummary> {
        let params = bind_params(stmt);
        if self.returns_id(stmt) {
            self.runtime
                .block_on(self.insert_returning_id(stmt, &params))
        } else {
            self.runtime
                .block_on(self.execute_plain(&self.wire_sql(stmt), &params))
        }
    }
}

impl fmt::Debug for PgExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgExecutor")
            .field("config", &self.config)
            .field("closed", &self.client.is_closed())
            .finish_non_exhaustive()
    }
}
