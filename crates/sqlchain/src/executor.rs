//! Executor trait and normalized execution results.

use crate::error::OrmResult;
use crate::statement::Statement;
use serde::Serialize;
use std::sync::Arc;

/// One result row: column name → value, in the order the columns were returned.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Outcome of an INSERT, UPDATE or DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationSummary {
    /// Number of rows the statement affected.
    pub affected_rows: u64,
    /// Id generated by an INSERT; `None` for other statements or when the
    /// executor cannot report one.
    pub last_id: Option<i64>,
}

/// Normalized result of [`QueryBuilder::execute`](crate::QueryBuilder::execute).
///
/// Serializes to a JSON array of row objects, or to
/// `{"affectedRows": n, "lastId": id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExecResult {
    Rows(Vec<Row>),
    Mutation(MutationSummary),
}

impl ExecResult {
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            ExecResult::Rows(rows) => Some(rows),
            ExecResult::Mutation(_) => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            ExecResult::Rows(rows) => Some(rows),
            ExecResult::Mutation(_) => None,
        }
    }

    pub fn mutation(&self) -> Option<MutationSummary> {
        match self {
            ExecResult::Rows(_) => None,
            ExecResult::Mutation(summary) => Some(*summary),
        }
    }

    /// Serialize into a single JSON text blob.
    pub fn to_json(&self) -> OrmResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Runs compiled statements against a database.
///
/// Implementations block the caller until the statement completes and report
/// connection, preparation and execution failures as distinct
/// [`OrmError`](crate::OrmError) variants.
pub trait Executor {
    /// Run a row-returning statement.
    fn fetch_rows(&self, stmt: &Statement) -> OrmResult<Vec<Row>>;

    /// Run an INSERT, UPDATE or DELETE.
    fn execute_mutation(&self, stmt: &Statement) -> OrmResult<MutationSummary>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn fetch_rows(&self, stmt: &Statement) -> OrmResult<Vec<Row>> {
        (**self).fetch_rows(stmt)
    }

    fn execute_mutation(&self, stmt: &Statement) -> OrmResult<MutationSummary> {
        (**self).execute_mutation(stmt)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn fetch_rows(&self, stmt: &Statement) -> OrmResult<Vec<Row>> {
        (**self).fetch_rows(stmt)
    }

    fn execute_mutation(&self, stmt: &Statement) -> OrmResult<MutationSummary> {
        (**self).execute_mutation(stmt)
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn fetch_rows(&self, stmt: &Statement) -> OrmResult<Vec<Row>> {
        (**self).fetch_rows(stmt)
    }

    fn execute_mutation(&self, stmt: &Statement) -> OrmResult<MutationSummary> {
        (**self).execute_mutation(stmt)
    }
}
