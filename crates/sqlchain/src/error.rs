//! Error types for sqlchain

use thiserror::Error;

/// Result type alias for sqlchain operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for building and executing statements
#[derive(Debug, Error)]
pub enum OrmError {
    /// A builder call is not valid in the builder's current state
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Malformed column, operator, value or field map
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement preparation error
    #[error("Prepare error: {0}")]
    Prepare(String),

    /// Statement execution error
    #[error("Execution error: {0}")]
    Execution(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl OrmError {
    /// Create a state conflict error
    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::StateConflict(message.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a state conflict error
    pub fn is_state_conflict(&self) -> bool {
        matches!(self, Self::StateConflict(_))
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Map a failure raised while preparing a statement.
    pub fn from_prepare_error(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return Self::Connection(err.to_string());
        }
        Self::Prepare(describe(&err))
    }

    /// Parse a tokio_postgres execution error into a more specific OrmError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return Self::Connection(err.to_string());
        }
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                _ => {}
            }
        }
        Self::Execution(describe(&err))
    }
}

// `tokio_postgres::Error`'s Display hides the server message behind "db error"
// and the cause of parameter failures behind "error serializing parameter N".
fn describe(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db_err) => format!("{} ({})", db_err.message(), db_err.code().code()),
        None => with_sources(err),
    }
}

/// `err` followed by each error in its `source()` chain, joined by `": "`.
fn with_sources(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !out.ends_with(&cause_text) {
            out.push_str(": ");
            out.push_str(&cause_text);
        }
        source = cause.source();
    }
    out
}

impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
