//! Column and table name validation.
//!
//! Identifiers are interpolated into SQL text (they cannot be bound as
//! parameters), so every column name passing through a builder is checked
//! here first:
//!
//! - it must not be one of the comparison operator tokens (`=`, `!=`, ...),
//!   which catches arguments passed in the wrong position;
//! - it must not look like a number;
//! - each dot-separated part must match `[A-Za-z_][A-Za-z0-9_$]*`.

use crate::condition::Op;
use crate::error::{OrmError, OrmResult};

/// Returns `true` for strings a loose numeric parser would accept: optional
/// surrounding whitespace, an optional sign, digits with at most one decimal
/// point, and an optional exponent (`" 12"`, `"-3.5"`, `"1e3"`, `".5"`).
pub fn looks_numeric(s: &str) -> bool {
    let s = s.trim();
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let mut digits = 0;
    let mut seen_dot = false;
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        i += 1;
    }
    if digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

fn check_part(part: &str, whole: &str) -> OrmResult<()> {
    let mut chars = part.chars();
    match chars.next() {
        None => Err(OrmError::invalid_argument(format!(
            "empty identifier segment in {whole:?}"
        ))),
        Some(c) if c != '_' && !c.is_ascii_alphabetic() => Err(OrmError::invalid_argument(
            format!("invalid identifier start character '{c}' in {whole:?}"),
        )),
        Some(_) => match chars.find(|c| *c != '_' && *c != '$' && !c.is_ascii_alphanumeric()) {
            Some(c) => Err(OrmError::invalid_argument(format!(
                "invalid character '{c}' in identifier {whole:?}"
            ))),
            None => Ok(()),
        },
    }
}

/// Validate a column name used in a field map or condition.
pub fn validate_column(name: &str) -> OrmResult<&str> {
    if Op::parse(name).is_some() || looks_numeric(name) {
        return Err(OrmError::invalid_argument(format!(
            "{name:?} is not a valid column: expected a column name, found an operator or number"
        )));
    }
    validate_ident(name)
}

/// Validate a (possibly schema-qualified) table or column identifier.
pub fn validate_ident(name: &str) -> OrmResult<&str> {
    if name.is_empty() {
        return Err(OrmError::invalid_argument("identifier cannot be empty"));
    }
    for part in name.split('.') {
        check_part(part, name)?;
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_detection() {
        for s in ["1", "-3", "+7", "3.25", ".5", "5.", "1e3", "2E-4", " 12", "12 "] {
            assert!(looks_numeric(s), "{s:?} should look numeric");
        }
        for s in ["", "abc", "1a", "e3", "1e", "1.2.3", "-", ".", "id1"] {
            assert!(!looks_numeric(s), "{s:?} should not look numeric");
        }
    }

    #[test]
    fn rejects_operator_tokens() {
        for op in ["=", "!=", "<", "<=", ">", ">="] {
            let err = validate_column(op).unwrap_err();
            assert!(err.is_invalid_argument());
        }
    }

    #[test]
    fn rejects_numbers_and_unsafe_names() {
        assert!(validate_column("42").is_err());
        assert!(validate_column("1users").is_err());
        assert!(validate_column("users; drop table users").is_err());
        assert!(validate_column("users..name").is_err());
        assert!(validate_column("first name").is_err());
    }

    #[test]
    fn accepts_plain_and_dotted_names() {
        assert_eq!(validate_column("username").unwrap(), "username");
        assert_eq!(validate_column("u.first_name").unwrap(), "u.first_name");
        assert_eq!(validate_ident("public.users").unwrap(), "public.users");
    }
}
