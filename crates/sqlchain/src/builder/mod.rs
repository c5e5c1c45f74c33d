//! The fluent query builder.
//!
//! A [`QueryBuilder`] is a small state machine. From `Idle`, exactly one verb
//! (`select`, `insert`, `update`, `delete`) moves it into that verb's state;
//! `filter` may then be called any number of times (except after `insert`);
//! `execute` compiles and runs the statement and returns the builder to
//! `Idle`, ready for the next chain.
//!
//! ```text
//!            select/insert/update/delete          execute
//!   Idle ─────────────────────────────────▶ Verb ─────────▶ Idle
//!                                            │ ▲
//!                                            └─┘ filter (not after insert)
//! ```
//!
//! Any failed call aborts the chain: nothing is executed and the builder is
//! reset to `Idle`.
//!
//! # Example
//! ```ignore
//! let mut qb = db.query_builder();
//! qb.table("users");
//!
//! let rows = qb.select("*")?.filter([("username", "=", "johnwick123")])?.execute()?;
//! let summary = qb
//!     .update(FieldMap::new().set("active", 1))?
//!     .filter([("id", "=", "3")])?
//!     .execute()?;
//! ```

mod fields;


pub use fields::{Columns, FieldMap};

use crate::condition::{Condition, IntoCondition};
use crate::error::{OrmError, OrmResult};
use crate::executor::{ExecResult, Executor};
use crate::ident::{validate_column, validate_ident};
use crate::monitor::{HookAction, QueryHook, QueryOutcome, TracingSqlHook};
use crate::statement::{Statement, Verb};
use crate::value::Value;
use std::sync::Arc;
use std::time::Instant;

/// Which verb, if any, the current chain has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuilderState {
    #[default]
    Idle,
    Select,
    Insert,
    Update,
    Delete,
}

impl From<Verb> for BuilderState {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Select => BuilderState::Select,
            Verb::Insert => BuilderState::Insert,
            Verb::Update => BuilderState::Update,
            Verb::Delete => BuilderState::Delete,
        }
    }
}

/// A per-chain SQL builder bound to an [`Executor`].
///
/// Every method takes `&mut self`, so one builder can only ever have one
/// chain in flight. Builders sharing an executor (e.g. several
/// `QueryBuilder<&PgExecutor>`) keep fully separate state.
#[must_use]
pub struct QueryBuilder<E> {
    executor: E,
    hook: Arc<dyn QueryHook>,
    table: String,
    stmt: Option<Statement>,
    has_where: bool,
}

impl<E: Executor> QueryBuilder<E> {
    /// Create an idle builder that logs SQL through [`TracingSqlHook`].
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            hook: Arc::new(TracingSqlHook::default()),
            table: String::new(),
            stmt: None,
            has_where: false,
        }
    }

    /// Replace the execution hook.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Arc::new(hook);
        self
    }

    /// Set the table the next statements operate on. Callable at any time.
    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.table = name.into();
        self
    }

    /// The table name last set with [`table`](Self::table).
    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn state(&self) -> BuilderState {
        self.stmt
            .as_ref()
            .map_or(BuilderState::Idle, |s| s.verb().into())
    }

    pub fn has_where(&self) -> bool {
        self.has_where
    }

    /// The SQL accumulated so far (empty when idle).
    pub fn to_sql(&self) -> &str {
        self.stmt.as_ref().map_or("", Statement::sql)
    }

    /// Values bound so far, in placeholder order.
    pub fn params(&self) -> &[Value] {
        self.stmt.as_ref().map(Statement::params).unwrap_or(&[])
    }

    /// Type tags of the values bound so far, e.g. `"is"`.
    pub fn type_tags(&self) -> String {
        self.stmt
            .as_ref()
            .map(Statement::type_tags)
            .unwrap_or_default()
    }

    /// Abandon the current chain and return to `Idle`.
    pub fn reset(&mut self) {
        self.stmt = None;
        self.has_where = false;
    }

    /// Start a `SELECT <columns> FROM <table>` statement.
    ///
    /// Pass `"*"` (or [`Columns::All`]) to select every column.
    pub fn select(&mut self, columns: impl Into<Columns>) -> OrmResult<&mut Self> {
        let columns = columns.into();
        self.guarded(|qb| {
            let table = qb.begin(Verb::Select)?;
            if matches!(&columns, Columns::Spec(s) if s.trim().is_empty())
                || matches!(&columns, Columns::List(names) if names.is_empty())
            {
                return Err(OrmError::invalid_argument("select() needs at least one column"));
            }
            // A raw spec is used as written; listed names are identifiers.
            if let Columns::List(names) = &columns {
                for name in names {
                    validate_column(name)?;
                }
            }

            let mut stmt = Statement::new(Verb::Select);
            stmt.push("SELECT ")
                .push(&columns.render())
                .push(" FROM ")
                .push(&table)
                .push(" ");
            qb.stmt = Some(stmt);
            Ok(())
        })
    }

    /// Start an `INSERT INTO <table> (<cols>) VALUES (?, ...)` statement.
    ///
    /// Values are bound in map order; any [`Value`](crate::Value) variant is
    /// accepted, including binary data.
    pub fn insert(&mut self, fields: impl Into<FieldMap>) -> OrmResult<&mut Self> {
        let fields = fields.into();
        self.guarded(|qb| {
            let table = qb.begin(Verb::Insert)?;
            if fields.is_empty() {
                return Err(OrmError::invalid_argument("insert() needs at least one field"));
            }
            let columns = fields
                .iter()
                .map(|(column, _)| validate_column(column))
                .collect::<OrmResult<Vec<_>>>()?
                .join(", ");

            let mut stmt = Statement::new(Verb::Insert);
            stmt.push("INSERT INTO ")
                .push(&table)
                .push(" (")
                .push(&columns)
                .push(") VALUES (");
            for (i, (_, value)) in fields.into_iter().enumerate() {
                if i > 0 {
                    stmt.push(", ");
                }
                stmt.push_bind(value);
            }
            stmt.push(")");
            qb.stmt = Some(stmt);
            Ok(())
        })
    }

    /// Start an `UPDATE <table> SET c1 = ?, c2 = ? ` statement.
    ///
    /// Values must be numbers or strings.
    pub fn update(&mut self, fields: impl Into<FieldMap>) -> OrmResult<&mut Self> {
        let fields = fields.into();
        self.guarded(|qb| {
            let table = qb.begin(Verb::Update)?;
            if fields.is_empty() {
                return Err(OrmError::invalid_argument("update() needs at least one field"));
            }
            for (column, value) in fields.iter() {
                validate_column(column)?;
                if !value.is_scalar() {
                    return Err(OrmError::invalid_argument(format!(
                        "update value for {column:?} must be a number or string"
                    )));
                }
            }

            let mut stmt = Statement::new(Verb::Update);
            stmt.push("UPDATE ").push(&table).push(" SET ");
            for (i, (column, value)) in fields.into_iter().enumerate() {
                if i > 0 {
                    stmt.push(", ");
                }
                stmt.push(&column).push(" = ").push_bind(value);
            }
            stmt.push(" ");
            qb.stmt = Some(stmt);
            Ok(())
        })
    }

    /// Start a `DELETE FROM <table>` statement.
    pub fn delete(&mut self) -> OrmResult<&mut Self> {
        self.guarded(|qb| {
            let table = qb.begin(Verb::Delete)?;
            let mut stmt = Statement::new(Verb::Delete);
            stmt.push("DELETE FROM ").push(&table).push(" ");
            qb.stmt = Some(stmt);
            Ok(())
        })
    }

    /// Add WHERE conditions (the `where` operation).
    ///
    /// The first condition of a chain is prefixed with `WHERE`, every later
    /// one (in this or a following call) with `AND`. Raw triples render as
    /// `col op ? `; combined fragments from [`or`](crate::or) render
    /// parenthesized. Values are bound left to right.
    ///
    /// Fails with a state conflict when no verb is active or the active verb
    /// is INSERT, and with an invalid argument when `conditions` is empty.
    pub fn filter<I>(&mut self, conditions: I) -> OrmResult<&mut Self>
    where
        I: IntoIterator,
        I::Item: IntoCondition,
    {
        let conditions = conditions
            .into_iter()
            .map(IntoCondition::into_condition)
            .collect::<OrmResult<Vec<_>>>();

        self.guarded(|qb| {
            let conditions = conditions?;
            let has_where = qb.has_where;
            let stmt = match qb.stmt.as_mut() {
                None => {
                    return Err(OrmError::state_conflict(
                        "filter() must follow a SELECT, UPDATE or DELETE operation",
                    ));
                }
                Some(stmt) if stmt.verb() == Verb::Insert => {
                    return Err(OrmError::state_conflict(
                        "filter() cannot be applied to an INSERT operation",
                    ));
                }
                Some(stmt) => stmt,
            };
            if conditions.is_empty() {
                return Err(OrmError::invalid_argument("filter() needs at least one condition"));
            }

            for (i, condition) in conditions.into_iter().enumerate() {
                stmt.push(if has_where || i > 0 { "AND " } else { "WHERE " });
                match condition {
                    Condition::Triple(triple) => stmt.push_triple(triple),
                    Condition::Fragment(fragment) => stmt.push_fragment(fragment),
                };
                stmt.push(" ");
            }
            qb.has_where = true;
            Ok(())
        })
    }

    /// Compile and run the statement, then return to `Idle`.
    ///
    /// SELECT yields [`ExecResult::Rows`]; INSERT, UPDATE and DELETE yield
    /// [`ExecResult::Mutation`]. Fails with a state conflict when no verb is
    /// active.
    pub fn execute(&mut self) -> OrmResult<ExecResult> {
        self.has_where = false;
        let stmt = self.stmt.take().ok_or_else(|| {
            OrmError::state_conflict("execute() must follow a SQL operation")
        })?;
        stmt.validate()?;

        if let HookAction::Abort(reason) = self.hook.before_query(&stmt) {
            return Err(OrmError::Execution(format!("aborted by hook: {reason}")));
        }

        let start = Instant::now();
        let result = if stmt.verb().returns_rows() {
            self.executor.fetch_rows(&stmt).map(ExecResult::Rows)
        } else {
            self.executor
                .execute_mutation(&stmt)
                .map(ExecResult::Mutation)
        };

        let outcome = match &result {
            Ok(ExecResult::Rows(rows)) => QueryOutcome::Rows(rows.len()),
            Ok(ExecResult::Mutation(summary)) => QueryOutcome::Affected(summary.affected_rows),
            Err(e) => QueryOutcome::error(e.to_string()),
        };
        self.hook.after_query(&stmt, start.elapsed(), &outcome);

        result
    }

    /// Like [`execute`](Self::execute), but returns the result serialized as
    /// JSON text.
    pub fn execute_json(&mut self) -> OrmResult<String> {
        self.execute()?.to_json()
    }

    /// Check that a verb may start and return the validated table name.
    fn begin(&self, verb: Verb) -> OrmResult<String> {
        if let Some(active) = self.stmt.as_ref().map(Statement::verb) {
            return Err(OrmError::state_conflict(format!(
                "{verb} cannot start while a {active} operation is pending"
            )));
        }
        if self.table.is_empty() {
            return Err(OrmError::invalid_argument(
                "no table selected: call table() first",
            ));
        }
        Ok(validate_ident(&self.table)?.to_string())
    }

    /// Run a state transition; on error the chain is abandoned.
    fn guarded<F>(&mut self, f: F) -> OrmResult<&mut Self>
    where
        F: FnOnce(&mut Self) -> OrmResult<()>,
    {
        match f(self) {
            Ok(()) => Ok(self),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }
}

impl<E: std::fmt::Debug> std::fmt::Debug for QueryBuilder<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("executor", &self.executor)
            .field("table", &self.table)
            .field("stmt", &self.stmt)
            .field("has_where", &self.has_where)
            .finish_non_exhaustive()
    }
}
