//! Bound parameter values.
//!
//! Every value bound into a statement is a [`Value`], a closed set of four
//! variants whose binding tag is decided when the value is constructed:
//!
//! | Variant   | Tag |
//! |-----------|-----|
//! | `Integer` | `i` |
//! | `Float`   | `d` |
//! | `Text`    | `s` |
//! | `Binary`  | `b` |
//!
//! When bound to PostgreSQL, a value is coerced to the parameter type the
//! server inferred for its placeholder, so `Text("3")` binds to an `int4`
//! column and `Integer(1)` binds to a `bool` or `numeric` column.

use bytes::BytesMut;
use rust_decimal::Decimal;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use tokio_postgres::types::{IsNull, ToSql, Type};

/// The binding tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Float,
    Text,
    Binary,
}

impl ValueType {
    /// Single-character tag used in type tag strings (`"isd"`).
    pub fn tag(self) -> char {
        match self {
            ValueType::Integer => 'i',
            ValueType::Float => 'd',
            ValueType::Text => 's',
            ValueType::Binary => 'b',
        }
    }
}

/// A value bound to a `?` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Binary(Vec<u8>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Text(_) => ValueType::Text,
            Value::Binary(_) => ValueType::Binary,
        }
    }

    /// Numeric or text values may be compared and assigned; binary values may
    /// only be inserted.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Binary(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Binary(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Binary(v.to_vec())
    }
}

type BoxError = Box<dyn Error + Sync + Send>;

fn is_text_type(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

fn parse_bool(s: &str) -> Result<bool, BoxError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "n" | "no" | "off" => Ok(false),
        other => Err(format!("cannot interpret {other:?} as boolean").into()),
    }
}

fn integer_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::INT8 => v.to_sql(ty, out),
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => (v as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(v).to_sql(ty, out),
        Type::BOOL => (v != 0).to_sql(ty, out),
        _ if is_text_type(ty) => v.to_string().to_sql(ty, out),
        _ => Err(format!("cannot bind an integer to a parameter of type {ty}").into()),
    }
}

fn float_to_sql(v: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => v.to_sql(ty, out),
        Type::NUMERIC => Decimal::try_from(v)?.to_sql(ty, out),
        Type::INT2 | Type::INT4 | Type::INT8 if v.fract() == 0.0 => {
            // `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
            if v < i64::MIN as f64 || v >= i64::MAX as f64 {
                return Err(format!("float {v} is out of range for {ty}").into());
            }
            integer_to_sql(v as i64, ty, out)
        }
        _ if is_text_type(ty) => v.to_string().to_sql(ty, out),
        _ => Err(format!("cannot bind a float to a parameter of type {ty}").into()),
    }
}

fn text_to_sql(v: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => v.trim().parse::<i16>()?.to_sql(ty, out),
        Type::INT4 => v.trim().parse::<i32>()?.to_sql(ty, out),
        Type::INT8 => v.trim().parse::<i64>()?.to_sql(ty, out),
        Type::FLOAT4 => v.trim().parse::<f32>()?.to_sql(ty, out),
        Type::FLOAT8 => v.trim().parse::<f64>()?.to_sql(ty, out),
        Type::NUMERIC => Decimal::from_str(v.trim())?.to_sql(ty, out),
        Type::BOOL => parse_bool(v)?.to_sql(ty, out),
        Type::UUID => uuid::Uuid::parse_str(v.trim())?.to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(v)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => chrono::DateTime::parse_from_rfc3339(v.trim())?
            .with_timezone(&chrono::Utc)
            .to_sql(ty, out),
        Type::TIMESTAMP => v
            .trim()
            .parse::<chrono::NaiveDateTime>()?
            .to_sql(ty, out),
        Type::DATE => v.trim().parse::<chrono::NaiveDate>()?.to_sql(ty, out),
        Type::BYTEA => v.as_bytes().to_sql(ty, out),
        _ if is_text_type(ty) => v.to_sql(ty, out),
        _ => Err(format!("cannot bind text to a parameter of type {ty}").into()),
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Integer(v) => integer_to_sql(*v, ty, out),
            Value::Float(v) => float_to_sql(*v, ty, out),
            Value::Text(v) => text_to_sql(v, ty, out),
            Value::Binary(v) if *ty == Type::BYTEA => v.as_slice().to_sql(ty, out),
            Value::Binary(_) => {
                Err(format!("cannot bind binary data to a parameter of type {ty}").into())
            }
        }
    }

    // Coercion is decided per parameter type in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}
