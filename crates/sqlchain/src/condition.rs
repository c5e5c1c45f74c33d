//! Query condition types for WHERE clauses.
//!
//! A [`ConditionTriple`] is one `column op ?` comparison. Two or more triples
//! can be OR-combined with [`or`] into a [`ConditionFragment`], which
//! [`QueryBuilder::filter`](crate::QueryBuilder::filter) accepts as a single
//! parenthesized unit next to plain triples.
//!
//! # Example
//! ```ignore
//! use sqlchain::{or, Condition};
//!
//! let either = or([("username", "=", "johnwick123"), ("username", "=", "johndoe")])?;
//! assert_eq!(either.sql(), "username = ? OR username = ? ");
//!
//! db.query_builder()
//!     .table("users")
//!     .select("*")?
//!     .filter([Condition::from(either), ("active", "=", 1).into_condition()?])?
//!     .execute()?;
//! ```

use crate::error::{OrmError, OrmResult};
use crate::ident::validate_column;
use crate::value::Value;
use std::fmt;

/// Comparison operator of a condition triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Equal: column = value
    Eq,
    /// Not equal: column != value
    Ne,
    /// Less than: column < value
    Lt,
    /// Less than or equal: column <= value
    Lte,
    /// Greater than: column > value
    Gt,
    /// Greater than or equal: column >= value
    Gte,
}

impl Op {
    pub const ALL: [Op; 6] = [Op::Eq, Op::Ne, Op::Lt, Op::Lte, Op::Gt, Op::Gte];

    /// Parse an operator token. Only the exact tokens are recognized.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == token)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Gt => ">",
            Op::Gte => ">=",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated `column op value` comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionTriple {
    column: String,
    op: Op,
    value: Value,
}

impl ConditionTriple {
    /// Validate and build a triple.
    ///
    /// Fails with [`OrmError::InvalidArgument`] when the column is an operator
    /// token or numeric-looking, the operator is unknown, or the value is
    /// binary.
    pub fn new(column: &str, op: &str, value: impl Into<Value>) -> OrmResult<Self> {
        let column = validate_column(column)?;
        let op = Op::parse(op).ok_or_else(|| {
            OrmError::invalid_argument(format!(
                "{op:?} is not a valid operator (expected one of '=', '!=', '<', '<=', '>', '>=')"
            ))
        })?;
        let value = value.into();
        if !value.is_scalar() {
            return Err(OrmError::invalid_argument(format!(
                "condition value for {column:?} must be a number or string"
            )));
        }
        Ok(Self {
            column: column.to_string(),
            op,
            value,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The `column op ?` text, without surrounding whitespace.
    pub(crate) fn template(&self) -> String {
        format!("{} {} ?", self.column, self.op)
    }

    pub(crate) fn into_value(self) -> Value {
        self.value
    }
}

/// Build a triple from dynamically shaped input such as parsed CLI arguments.
///
/// The parts must be exactly `[column, operator, value]` with column and
/// operator given as text.
impl TryFrom<Vec<Value>> for ConditionTriple {
    type Error = OrmError;

    fn try_from(parts: Vec<Value>) -> OrmResult<Self> {
        let arity = parts.len();
        let Ok([column, op, value]) = <[Value; 3]>::try_from(parts) else {
            return Err(OrmError::invalid_argument(format!(
                "a condition needs exactly 3 parts (column, operator, value), got {arity}"
            )));
        };
        match (column, op) {
            (Value::Text(column), Value::Text(op)) => Self::new(&column, &op, value),
            _ => Err(OrmError::invalid_argument(
                "condition column and operator must be strings",
            )),
        }
    }
}

/// A pre-built SQL fragment with its own ordered values.
///
/// Fragments can only be produced by [`or`], which keeps the number of `?`
/// placeholders in [`sql`](Self::sql) equal to the number of values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionFragment {
    sql: String,
    values: Vec<Value>,
}

impl ConditionFragment {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub(crate) fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// A single WHERE unit: a raw triple or a combined fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Triple(ConditionTriple),
    Fragment(ConditionFragment),
}

impl Condition {
    /// Validate and build a triple condition.
    ///
    /// Array literals fix one value type, so conditions with differently
    /// typed values in a single `filter` call are built with this (or with
    /// [`Value::from`] in each tuple).
    pub fn triple(column: &str, op: &str, value: impl Into<Value>) -> OrmResult<Self> {
        ConditionTriple::new(column, op, value).map(Condition::Triple)
    }
}

impl From<ConditionTriple> for Condition {
    fn from(triple: ConditionTriple) -> Self {
        Condition::Triple(triple)
    }
}

impl From<ConditionFragment> for Condition {
    fn from(fragment: ConditionFragment) -> Self {
        Condition::Fragment(fragment)
    }
}

/// Conversion into a validated [`ConditionTriple`].
pub trait IntoTriple {
    fn into_triple(self) -> OrmResult<ConditionTriple>;
}

impl IntoTriple for ConditionTriple {
    fn into_triple(self) -> OrmResult<ConditionTriple> {
        Ok(self)
    }
}

impl<V: Into<Value>> IntoTriple for (&str, &str, V) {
    fn into_triple(self) -> OrmResult<ConditionTriple> {
        ConditionTriple::new(self.0, self.1, self.2)
    }
}

impl<V: Into<Value>> IntoTriple for (String, String, V) {
    fn into_triple(self) -> OrmResult<ConditionTriple> {
        ConditionTriple::new(&self.0, &self.1, self.2)
    }
}

impl IntoTriple for Vec<Value> {
    fn into_triple(self) -> OrmResult<ConditionTriple> {
        ConditionTriple::try_from(self)
    }
}

/// Conversion into a [`Condition`] accepted by `filter()`.
pub trait IntoCondition {
    fn into_condition(self) -> OrmResult<Condition>;
}

impl IntoCondition for Condition {
    fn into_condition(self) -> OrmResult<Condition> {
        Ok(self)
    }
}

impl IntoCondition for ConditionTriple {
    fn into_condition(self) -> OrmResult<Condition> {
        Ok(Condition::Triple(self))
    }
}

impl IntoCondition for ConditionFragment {
    fn into_condition(self) -> OrmResult<Condition> {
        Ok(Condition::Fragment(self))
    }
}

impl<V: Into<Value>> IntoCondition for (&str, &str, V) {
    fn into_condition(self) -> OrmResult<Condition> {
        self.into_triple().map(Condition::Triple)
    }
}

impl<V: Into<Value>> IntoCondition for (String, String, V) {
    fn into_condition(self) -> OrmResult<Condition> {
        self.into_triple().map(Condition::Triple)
    }
}

impl IntoCondition for Vec<Value> {
    fn into_condition(self) -> OrmResult<Condition> {
        self.into_triple().map(Condition::Triple)
    }
}

/// OR-combine two or more triples into one fragment.
///
/// Produces `col1 op1 ? OR col2 op2 ? ...` (every term followed by one space)
/// with the values in argument order.
pub fn or<I>(triples: I) -> OrmResult<ConditionFragment>
where
    I: IntoIterator,
    I::Item: IntoTriple,
{
    let triples = triples
        .into_iter()
        .map(IntoTriple::into_triple)
        .collect::<OrmResult<Vec<_>>>()?;

    match triples.len() {
        0 => return Err(OrmError::invalid_argument("no conditions given to or()")),
        1 => {
            return Err(OrmError::invalid_argument(
                "or() needs at least two conditions",
            ));
        }
        _ => {}
    }

    let mut sql = String::new();
    let mut values = Vec::with_capacity(triples.len());
    for (i, triple) in triples.into_iter().enumerate() {
        if i > 0 {
            sql.push_str("OR ");
        }
        sql.push_str(&triple.template());
        sql.push(' ');
        values.push(triple.into_value());
    }

    Ok(ConditionFragment { sql, values })
}
