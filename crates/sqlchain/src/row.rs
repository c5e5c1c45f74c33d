//! Decoding `tokio_postgres` rows into JSON-shaped [`Row`]s.

use crate::error::{OrmError, OrmResult};
use crate::executor::Row;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as Json;
use std::fmt::Write as _;
use tokio_postgres::types::{FromSql, Type};

/// Convert one result row, keeping the server's column order.
///
/// SQL `NULL` becomes JSON `null`. Columns of a type without a JSON mapping
/// fail with [`OrmError::Decode`].
pub fn decode_row(row: &tokio_postgres::Row) -> OrmResult<Row> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_())
            .map_err(|message| OrmError::decode(column.name(), message))?;
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn decode_column(row: &tokio_postgres::Row, idx: usize, ty: &Type) -> Result<Json, String> {
    if *ty == Type::BOOL {
        get::<bool>(row, idx, Json::Bool)
    } else if *ty == Type::INT2 {
        get::<i16>(row, idx, Json::from)
    } else if *ty == Type::INT4 {
        get::<i32>(row, idx, Json::from)
    } else if *ty == Type::INT8 {
        get::<i64>(row, idx, Json::from)
    } else if *ty == Type::FLOAT4 {
        get::<f32>(row, idx, |v| Json::from(f64::from(v)))
    } else if *ty == Type::FLOAT8 {
        get::<f64>(row, idx, Json::from)
    } else if *ty == Type::NUMERIC {
        // Rendered as text to avoid losing precision.
        get::<Decimal>(row, idx, |v| Json::String(v.to_string()))
    } else if is_text(ty) {
        get::<String>(row, idx, Json::String)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        get::<Json>(row, idx, |v| v)
    } else if *ty == Type::UUID {
        get::<uuid::Uuid>(row, idx, |v| Json::String(v.to_string()))
    } else if *ty == Type::TIMESTAMP {
        get::<NaiveDateTime>(row, idx, |v| Json::String(v.to_string()))
    } else if *ty == Type::TIMESTAMPTZ {
        get::<DateTime<Utc>>(row, idx, |v| Json::String(v.to_rfc3339()))
    } else if *ty == Type::DATE {
        get::<NaiveDate>(row, idx, |v| Json::String(v.to_string()))
    } else if *ty == Type::BYTEA {
        get::<Vec<u8>>(row, idx, |v| Json::String(bytea_to_hex(&v)))
    } else {
        Err(format!("unsupported column type `{ty}`"))
    }
}

fn get<'a, T>(
    row: &'a tokio_postgres::Row,
    idx: usize,
    to_json: impl FnOnce(T) -> Json,
) -> Result<Json, String>
where
    T: FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
        .map(|v| v.map_or(Json::Null, to_json))
        .map_err(|e| e.to_string())
}

fn is_text(ty: &Type) -> bool {
    *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME
}

/// PostgreSQL's hex output format for `bytea`: `\x` followed by lowercase hex.
pub(crate) fn bytea_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytea_hex_format() {
        assert_eq!(bytea_to_hex(&[]), "\\x");
        assert_eq!(bytea_to_hex(&[0x00, 0xab, 0x10]), "\\x00ab10");
    }

    #[test]
    fn text_types() {
        assert!(is_text(&Type::VARCHAR));
        assert!(is_text(&Type::NAME));
        assert!(!is_text(&Type::BYTEA));
    }
}
