//! Hooks around statement execution.
//!
//! Every [`QueryBuilder::execute`](crate::QueryBuilder::execute) call passes
//! the compiled [`Statement`] to a [`QueryHook`] before it reaches the
//! executor, and reports the outcome afterwards. The default hook is
//! [`TracingSqlHook`], which logs the compiled SQL through `tracing`.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlchain::monitor::{CompositeHook, HookAction, QueryHook, TracingSqlHook};
//! use sqlchain::{Statement, Verb};
//!
//! struct NoDeletes;
//!
//! impl QueryHook for NoDeletes {
//!     fn before_query(&self, stmt: &Statement) -> HookAction {
//!         if stmt.verb() == Verb::Delete {
//!             return HookAction::Abort("deletes are disabled".into());
//!         }
//!         HookAction::Continue
//!     }
//! }
//!
//! let hook = CompositeHook::new().add(TracingSqlHook::new()).add(NoDeletes);
//! let mut qb = db.query_builder().with_hook(hook);
//! ```

mod tracing_hook;


pub use tracing_hook::TracingSqlHook;

use crate::statement::Statement;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Maximum length for error messages in `QueryOutcome::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Action to take after a hook inspects a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Hand the statement to the executor.
    Continue,
    /// Abort the chain with an error; nothing is executed.
    Abort(String),
}

/// Result of a statement execution as seen by hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// A read returned this many rows.
    Rows(usize),
    /// A mutation affected this many rows.
    Affected(u64),
    /// Execution failed (message truncated to 512 bytes).
    Error(String),
}

impl QueryOutcome {
    /// Create an error outcome, truncating long messages.
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.len() > MAX_ERROR_LEN {
            Self::Error(format!("{}...", truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
        } else {
            Self::Error(msg)
        }
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Rows(n) => write!(f, "{n} rows"),
            QueryOutcome::Affected(n) => write!(f, "{n} affected"),
            QueryOutcome::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Trait for hooking into the statement execution lifecycle.
pub trait QueryHook: Send + Sync {
    /// Called with the compiled statement before it is executed.
    fn before_query(&self, stmt: &Statement) -> HookAction {
        let _ = stmt;
        HookAction::Continue
    }

    /// Called after the executor returns, successfully or not.
    fn after_query(&self, _stmt: &Statement, _duration: Duration, _outcome: &QueryOutcome) {}
}

impl<H: QueryHook + ?Sized> QueryHook for Arc<H> {
    fn before_query(&self, stmt: &Statement) -> HookAction {
        (**self).before_query(stmt)
    }

    fn after_query(&self, stmt: &Statement, duration: Duration, outcome: &QueryOutcome) {
        (**self).after_query(stmt, duration, outcome)
    }
}

/// A hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl QueryHook for NoopHook {}

/// Runs several hooks in order; the first `Abort` wins.
#[derive(Clone, Default)]
pub struct CompositeHook {
    hooks: Vec<Arc<dyn QueryHook>>,
}

impl CompositeHook {
    /// Create an empty composite hook.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook.
    #[allow(clippy::should_implement_trait)]
    pub fn add<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Add an Arc-wrapped hook.
    pub fn add_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for CompositeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeHook")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl QueryHook for CompositeHook {
    fn before_query(&self, stmt: &Statement) -> HookAction {
        for hook in &self.hooks {
            if let action @ HookAction::Abort(_) = hook.before_query(stmt) {
                return action;
            }
        }
        HookAction::Continue
    }

    fn after_query(&self, stmt: &Statement, duration: Duration, outcome: &QueryOutcome) {
        for hook in &self.hooks {
            hook.after_query(stmt, duration, outcome);
        }
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
