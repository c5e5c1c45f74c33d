//! Compiled statements: SQL text and bound values kept in lockstep.
//!
//! [`Statement`] is the single accumulator the builder writes into. Text and
//! values only grow together (`push_bind` appends a `?` and its value in one
//! step), so the template and the parameter list cannot drift apart.

use crate::condition::{ConditionFragment, ConditionTriple};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::fmt;

/// The SQL operation kind of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Select,
    Insert,
    Update,
    Delete,
}

impl Verb {
    /// Read statements return rows, the others return a mutation summary.
    pub fn returns_rows(self) -> bool {
        matches!(self, Verb::Select)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Select => "SELECT",
            Verb::Insert => "INSERT",
            Verb::Update => "UPDATE",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A SQL template with positional `?` placeholders and its ordered values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    verb: Verb,
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    pub(crate) fn new(verb: Verb) -> Self {
        Self {
            verb,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// The template with `?` placeholders.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// One tag character per bound value, e.g. `"isd"`.
    pub fn type_tags(&self) -> String {
        self.params.iter().map(|p| p.value_type().tag()).collect()
    }

    /// Number of `?` placeholders in the template.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }

    /// Append raw SQL (no parameters).
    pub(crate) fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Append a `?` placeholder and bind its value.
    pub(crate) fn push_bind(&mut self, value: Value) -> &mut Self {
        self.sql.push('?');
        self.params.push(value);
        self
    }

    /// Append `column op ?` and bind the triple's value.
    pub(crate) fn push_triple(&mut self, triple: ConditionTriple) -> &mut Self {
        self.push(triple.column())
            .push(" ")
            .push(triple.op().as_str())
            .push(" ")
            .push_bind(triple.into_value())
    }

    /// Append a fragment wrapped in parentheses, followed by its values.
    pub(crate) fn push_fragment(&mut self, fragment: ConditionFragment) -> &mut Self {
        self.sql.push('(');
        self.sql.push_str(fragment.sql().trim_end());
        self.sql.push(')');
        self.params.extend(fragment.into_values());
        self
    }

    /// Check that every placeholder has exactly one bound value.
    pub fn validate(&self) -> OrmResult<()> {
        let placeholder_count = self.placeholder_count();
        if placeholder_count != self.params.len() {
            let params_len = self.params.len();
            return Err(OrmError::invalid_argument(format!(
                "statement: placeholders({placeholder_count}) != params({params_len})"
            )));
        }
        Ok(())
    }

    /// Render the template with PostgreSQL-style `$1, $2, ...` placeholders.
    pub fn to_numbered_sql(&self) -> String {
        self.to_numbered_sql_with_casts(|_| None)
    }

    /// Like [`to_numbered_sql`](Self::to_numbered_sql), appending `::<type>`
    /// to every placeholder whose bound value `cast` maps to a type name.
    pub fn to_numbered_sql_with_casts<F>(&self, cast: F) -> String
    where
        F: Fn(&Value) -> Option<&'static str>,
    {
        let mut out = String::with_capacity(self.sql.len() + self.params.len() * 2);
        let mut idx = 0;
        for ch in self.sql.chars() {
            if ch == '?' {
                idx += 1;
                out.push('$');
                out.push_str(&idx.to_string());
                if let Some(ty) = self.params.get(idx - 1).and_then(&cast) {
                    out.push_str("::");
                    out.push_str(ty);
                }
            } else {
                out.push(ch);
            }
        }
        out
    }
}
