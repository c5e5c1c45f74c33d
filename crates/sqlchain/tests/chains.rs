use serde_json::json;
use sqlchain::{
    BuilderState, Executor, FieldMap, MutationSummary, OrmResult, QueryBuilder, Row, Statement,
    Value, Verb, or,
};
use std::sync::Mutex;

/// In-memory executor: records statements, returns a fixed row set and
/// counts INSERTs to hand out ids.
#[derive(Debug, Default)]
struct FakeDb {
    log: Mutex<Vec<(String, String)>>,
    next_id: Mutex<i64>,
}

impl FakeDb {
    fn log(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, stmt: &Statement) {
        self.log
            .lock()
            .unwrap()
            .push((stmt.sql().to_string(), stmt.type_tags()));
    }
}

impl Executor for FakeDb {
    fn fetch_rows(&self, stmt: &Statement) -> OrmResult<Vec<Row>> {
        self.record(stmt);
        let row = json!({"id": 1, "username": "johnwick123", "active": true});
        let serde_json::Value::Object(row) = row else {
            unreachable!()
        };
        Ok(vec![row])
    }

    fn execute_mutation(&self, stmt: &Statement) -> OrmResult<MutationSummary> {
        self.record(stmt);
        let last_id = if stmt.verb() == Verb::Insert {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            Some(*next)
        } else {
            None
        };
        Ok(MutationSummary {
            affected_rows: 1,
            last_id,
        })
    }
}

#[test]
fn demo_flow_against_shared_executor() -> OrmResult<()> {
    let db = FakeDb::default();
    let mut qb = QueryBuilder::new(&db);
    qb.table("users");

    let rows = qb
        .select("*")?
        .filter([("username", "=", "johnwick123")])?
        .filter([("active", "=", 1)])?
        .execute()?;
    assert_eq!(rows.rows().map(<[Row]>::len), Some(1));

    let created = qb
        .insert(
            FieldMap::new()
                .set("first_name", "Luke")
                .set("last_name", "Wheeler")
                .set("username", "lw123")
                .set("age", 19),
        )?
        .execute()?;
    assert_eq!(created.mutation().and_then(|m| m.last_id), Some(1));

    qb.update([("active", 1)])?
        .filter([("id", "=", "3")])?
        .execute()?;

    qb.delete()?
        .filter([or([
            ("username", "=", Value::from("lw123")),
            ("age", "<", Value::from(18)),
        ])?])?
        .execute()?;

    assert_eq!(
        db.log(),
        vec![
            (
                "SELECT * FROM users WHERE username = ? AND active = ? ".to_string(),
                "si".to_string()
            ),
            (
                "INSERT INTO users (first_name, last_name, username, age) VALUES (?, ?, ?, ?)"
                    .to_string(),
                "sssi".to_string()
            ),
            (
                "UPDATE users SET active = ? WHERE id = ? ".to_string(),
                "is".to_string()
            ),
            (
                "DELETE FROM users WHERE (username = ? OR age < ?) ".to_string(),
                "si".to_string()
            ),
        ]
    );
    Ok(())
}

#[test]
fn builders_sharing_an_executor_are_isolated() -> OrmResult<()> {
    let db = FakeDb::default();
    let mut users = QueryBuilder::new(&db);
    let mut posts = QueryBuilder::new(&db);
    users.table("users");
    posts.table("posts");

    users.select("id")?;
    posts.delete()?.filter([("author_id", "=", 9)])?;
    users.filter([("id", ">", 10)])?;

    assert_eq!(users.to_sql(), "SELECT id FROM users WHERE id > ? ");
    assert_eq!(posts.to_sql(), "DELETE FROM posts WHERE author_id = ? ");

    posts.execute()?;
    assert_eq!(posts.state(), BuilderState::Idle);
    assert_eq!(users.state(), BuilderState::Select);
    assert_eq!(users.params(), &[Value::from(10)]);
    Ok(())
}

#[test]
fn json_output_shapes() -> OrmResult<()> {
    let db = FakeDb::default();
    let mut qb = QueryBuilder::new(&db);
    qb.table("users");

    let rows = qb.select(["id", "username"])?.execute_json()?;
    assert_eq!(
        rows,
        r#"[{"id":1,"username":"johnwick123","active":true}]"#
    );

    let inserted = qb.insert([("username", "lw123")])?.execute_json()?;
    assert_eq!(inserted, r#"{"affectedRows":1,"lastId":1}"#);

    let deleted = qb.delete()?.execute_json()?;
    assert_eq!(deleted, r#"{"affectedRows":1,"lastId":null}"#);
    Ok(())
}

#[test]
fn errors_abort_the_chain_without_executing() {
    let db = FakeDb::default();
    let mut qb = QueryBuilder::new(&db);
    qb.table("users");

    let err = qb
        .insert([("username", "x")])
        .and_then(|qb| qb.filter([("id", "=", 1)]))
        .unwrap_err();
    assert!(err.is_state_conflict());

    let err = qb.execute().unwrap_err();
    assert!(err.is_state_conflict());
    assert!(db.log().is_empty());
}
