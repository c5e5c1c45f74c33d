use sqlchain::{Condition, DbConfig, FieldMap, OrmResult, PgExecutor, Value, or};
use std::time::{SystemTime, UNIX_EPOCH};

fn connect() -> OrmResult<Option<PgExecutor>> {
    if std::env::var("DATABASE_HOST").is_err() {
        eprintln!("DATABASE_HOST is not set; skipping postgres roundtrip");
        return Ok(None);
    }
    let config = DbConfig::from_lookup(|key| std::env::var(key).ok())?;
    PgExecutor::connect(&config).map(Some)
}

fn unique_table(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    format!("{prefix}_{}_{}", std::process::id(), nanos)
}

/// A table created for one test and dropped when it goes out of scope, even
/// if an assertion failed first.
struct Scratch<'a> {
    db: &'a PgExecutor,
    table: String,
}

impl<'a> Scratch<'a> {
    fn create(db: &'a PgExecutor, prefix: &str, columns: &str) -> OrmResult<Self> {
        let table = unique_table(prefix);
        db.batch_execute(&format!("CREATE TABLE {table} ({columns})"))?;
        Ok(Self { db, table })
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        if let Err(e) = self
            .db
            .batch_execute(&format!("DROP TABLE IF EXISTS {}", self.table))
        {
            eprintln!("failed to drop {}: {e}", self.table);
        }
    }
}

const USERS_COLUMNS: &str = "
    id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    age INT4,
    active BOOLEAN NOT NULL DEFAULT false,
    avatar BYTEA";

#[test]
fn crud_roundtrip() -> OrmResult<()> {
    let Some(db) = connect()? else {
        return Ok(());
    };
    let scratch = Scratch::create(&db, "sqlchain_test", USERS_COLUMNS)?;

    let mut qb = db.query_builder();
    qb.table(&scratch.table);

    let created = qb
        .insert(
            FieldMap::new()
                .set("username", "lw123")
                .set("age", 19)
                .set("avatar", vec![0xde_u8, 0xad]),
        )?
        .execute()?;
    let summary = created.mutation().expect("insert returns a summary");
    assert_eq!(summary.affected_rows, 1);
    let id = summary.last_id.expect("serial id is reported");

    qb.insert([("username", "johndoe"), ("age", "42")])?.execute()?;

    // Text "3"-style values coerce to the integer column.
    let updated = qb
        .update([("active", 1)])?
        .filter([("id", "=", Value::from(id.to_string()))])?
        .execute()?;
    assert_eq!(updated.mutation().map(|m| m.affected_rows), Some(1));

    let rows = qb
        .select("id, username, active, avatar")?
        .filter([or([("username", "=", "lw123"), ("username", "=", "nobody")])?])?
        .execute()?
        .into_rows()
        .expect("select returns rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], serde_json::json!(id));
    assert_eq!(rows[0]["active"], serde_json::json!(true));
    assert_eq!(rows[0]["avatar"], serde_json::json!("\\xdead"));

    let json = qb
        .select("username")?
        .filter([("age", ">", 20)])?
        .execute_json()?;
    assert_eq!(json, r#"[{"username":"johndoe"}]"#);

    let deleted = qb.delete()?.filter([("age", "<", 100)])?.execute()?;
    assert_eq!(deleted.mutation().map(|m| m.affected_rows), Some(2));
    Ok(())
}

#[test]
fn insert_into_table_without_id_column() -> OrmResult<()> {
    let Some(db) = connect()? else {
        return Ok(());
    };
    let scratch = Scratch::create(&db, "sqlchain_noid", "username TEXT")?;

    let mut qb = db.query_builder();
    qb.table(&scratch.table);
    let created = qb
        .insert(FieldMap::new().set("username", "x"))?
        .execute()?;
    let summary = created.mutation().expect("insert returns a summary");
    assert_eq!(summary.affected_rows, 1);
    assert_eq!(summary.last_id, None);

    let json = qb.select("*")?.execute_json()?;
    assert_eq!(json, r#"[{"username":"x"}]"#);
    Ok(())
}

#[test]
fn float_conditions_compare_against_integer_columns() -> OrmResult<()> {
    let Some(db) = connect()? else {
        return Ok(());
    };
    let scratch = Scratch::create(&db, "sqlchain_float", USERS_COLUMNS)?;

    let mut qb = db.query_builder();
    qb.table(&scratch.table);
    qb.insert([("username", Value::from("a")), ("age", Value::from(2))])?
        .execute()?;
    qb.insert([("username", Value::from("b")), ("age", Value::from(3))])?
        .execute()?;

    let rows = qb
        .select("username")?
        .filter([
            Condition::triple("age", ">", 2.5)?,
            Condition::triple("username", "!=", "zzz")?,
        ])?
        .execute_json()?;
    assert_eq!(rows, r#"[{"username":"b"}]"#);
    Ok(())
}

#[test]
fn unique_violation_is_reported() -> OrmResult<()> {
    let Some(db) = connect()? else {
        return Ok(());
    };
    let scratch = Scratch::create(&db, "sqlchain_uniq", USERS_COLUMNS)?;

    let mut qb = db.query_builder();
    qb.table(&scratch.table);
    qb.insert([("username", "same")])?.execute()?;
    let err = qb.insert([("username", "same")])?.execute().unwrap_err();
    assert!(err.is_unique_violation(), "unexpected error: {err}");
    Ok(())
}
