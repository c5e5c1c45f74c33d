use super::truncate_sql_bytes;
use super::{HookAction, QueryHook, QueryOutcome};
use crate::statement::Statement;
use std::time::Duration;
use tracing::Level;

/// A `tracing`-based hook that emits the compiled SQL before it is executed
/// and the outcome once the executor returns.
///
/// Events use the `sqlchain.sql` target, so they can be enabled with
/// `RUST_LOG=sqlchain.sql=debug`.
#[derive(Debug, Clone)]
pub struct TracingSqlHook {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingSqlHook {
    /// Create a new hook with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl QueryHook for TracingSqlHook {
    fn before_query(&self, stmt: &Statement) -> HookAction {
        let sql = self.truncate_sql(stmt.sql());
        let types = stmt.type_tags();
        emit_at_level!(
            self.level,
            target: "sqlchain.sql",
            verb = %stmt.verb(),
            param_count = stmt.params().len(),
            types = %types,
            sql = %sql,
        );
        HookAction::Continue
    }

    fn after_query(&self, stmt: &Statement, duration: Duration, outcome: &QueryOutcome) {
        let elapsed_ms = duration.as_secs_f64() * 1000.0;
        match outcome {
            QueryOutcome::Error(error) => tracing::warn!(
                target: "sqlchain.sql",
                verb = %stmt.verb(),
                elapsed_ms,
                error = %error,
                "statement failed",
            ),
            _ => emit_at_level!(
                self.level,
                target: "sqlchain.sql",
                verb = %stmt.verb(),
                elapsed_ms,
                outcome = %outcome,
                "statement finished",
            ),
        }
    }
}
