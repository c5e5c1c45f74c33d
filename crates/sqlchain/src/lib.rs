//! # sqlchain
//!
//! A small fluent SQL builder with positional parameters, plus a blocking
//! PostgreSQL executor.
//!
//! ## Features
//!
//! - **One verb per chain**: `select`, `insert`, `update` or `delete`, then
//!   any number of `filter` calls, then `execute`
//! - **Always parameterized**: every value is bound to a `?` placeholder and
//!   tagged `i`, `d`, `s` or `b`
//! - **Combinable conditions**: [`or`] folds triples into one fragment that
//!   can be mixed with plain triples
//! - **Normalized results**: rows as JSON objects, or affected rows plus the
//!   generated id, available natively or as JSON text
//! - **Query monitoring**: SQL is logged through `tracing` and can be
//!   intercepted with a [`QueryHook`](monitor::QueryHook)
//!
//! ## Example
//!
//! ```ignore
//! use sqlchain::{or, DbConfig, FieldMap, PgExecutor};
//!
//! let db = PgExecutor::connect(&DbConfig::from_env()?)?;
//! let mut qb = db.query_builder();
//! qb.table("users");
//!
//! // SELECT * FROM users WHERE username = ? AND active = ?
//! let rows = qb
//!     .select("*")?
//!     .filter([("username", "=", "johnwick123")])?
//!     .filter([("active", "=", 1)])?
//!     .execute()?;
//!
//! // SELECT * FROM users WHERE (username = ? OR username = ?)
//! let json = qb
//!     .select("*")?
//!     .filter([or([("username", "=", "johnwick123"), ("username", "=", "johndoe")])?])?
//!     .execute_json()?;
//!
//! // INSERT INTO users (username, age) VALUES (?, ?)
//! let summary = qb
//!     .insert(FieldMap::new().set("username", "lw123").set("age", 19))?
//!     .execute()?;
//! ```

pub mod builder;
pub mod condition;
pub mod config;
pub mod error;
pub mod executor;
pub mod ident;
pub mod monitor;
pub mod pg;
pub mod row;
pub mod statement;
pub mod value;

pub use builder::{BuilderState, Columns, FieldMap, QueryBuilder};
pub use condition::{
    Condition, ConditionFragment, ConditionTriple, IntoCondition, IntoTriple, Op, or,
};
pub use config::{DbConfig, PgExecutorConfig};
pub use error::{OrmError, OrmResult};
pub use executor::{ExecResult, Executor, MutationSummary, Row};
pub use monitor::{CompositeHook, HookAction, NoopHook, QueryHook, QueryOutcome, TracingSqlHook};
pub use pg::PgExecutor;
pub use statement::{Statement, Verb};
pub use value::{Value, ValueType};
