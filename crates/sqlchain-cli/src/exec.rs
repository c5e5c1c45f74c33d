use crate::cli::{CliVerb, CondArg, RunArgs};
use anyhow::Context as _;
use sqlchain::{
    Condition, ConditionTriple, DbConfig, ExecResult, Executor, FieldMap, PgExecutor,
    QueryBuilder, or,
};

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = match &args.env_file {
        Some(path) => DbConfig::from_env_file(path)?,
        None => DbConfig::from_env()?,
    };
    let db = PgExecutor::connect(&config)
        .with_context(|| format!("failed to connect to {}:{}", config.host, config.port))?;

    let mut qb = db.query_builder();
    let output = execute(&mut qb, &args)?;
    println!("{output}");
    Ok(())
}

/// Drive one builder chain from parsed arguments and render its result.
pub(crate) fn execute<E: Executor>(qb: &mut QueryBuilder<E>, args: &RunArgs) -> anyhow::Result<String> {
    qb.table(args.table.as_str());

    let fields: FieldMap = args.fields.iter().cloned().collect();
    match args.verb {
        CliVerb::Select => match &args.columns {
            Some(columns) => qb.select(columns.clone())?,
            None => qb.select("*")?,
        },
        CliVerb::Insert => qb.insert(fields)?,
        CliVerb::Update => qb.update(fields)?,
        CliVerb::Delete => qb.delete()?,
    };

    let conditions = conditions(args)?;
    if !conditions.is_empty() {
        qb.filter(conditions)?;
    }

    if args.json {
        return Ok(qb.execute_json()?);
    }
    Ok(render(&qb.execute()?))
}

fn conditions(args: &RunArgs) -> anyhow::Result<Vec<Condition>> {
    let mut out: Vec<Condition> = args
        .wheres
        .iter()
        .map(|c| triple(c).map(Condition::from))
        .collect::<anyhow::Result<_>>()?;

    if !args.ors.is_empty() {
        let triples = args.ors.iter().map(triple).collect::<anyhow::Result<Vec<_>>>()?;
        out.push(or(triples)?.into());
    }
    Ok(out)
}

fn triple(c: &CondArg) -> anyhow::Result<ConditionTriple> {
    ConditionTriple::new(&c.column, &c.op, c.value.clone())
        .with_context(|| format!("invalid condition `{} {} {}`", c.column, c.op, c.value))
}

fn render(result: &ExecResult) -> String {
    match result {
        ExecResult::Rows(rows) if rows.is_empty() => "(no rows)".to_string(),
        ExecResult::Rows(rows) => rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ExecResult::Mutation(summary) => match summary.last_id {
            Some(id) => format!("{} row(s) affected, last id {id}", summary.affected_rows),
            None => format!("{} row(s) affected", summary.affected_rows),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Command, parse_args};
    use sqlchain::{MutationSummary, OrmResult, Row, Statement};
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct Capture {
        sql: RefCell<Vec<String>>,
    }

    impl Executor for Capture {
        fn fetch_rows(&self, stmt: &Statement) -> OrmResult<Vec<Row>> {
            self.sql.borrow_mut().push(stmt.sql().to_string());
            let mut row = Row::new();
            row.insert("id".to_string(), serde_json::json!(1));
            row.insert("username".to_string(), serde_json::json!("johndoe"));
            Ok(vec![row])
        }

        fn execute_mutation(&self, stmt: &Statement) -> OrmResult<MutationSummary> {
            self.sql.borrow_mut().push(stmt.sql().to_string());
            Ok(MutationSummary {
                affected_rows: 2,
                last_id: None,
            })
        }
    }

    fn run_with(list: &[&str]) -> (String, Vec<String>) {
        let argv: Vec<String> = std::iter::once("sqlchain")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect();
        let Command::Run(args) = parse_args(&argv).unwrap() else {
            panic!("expected run command");
        };
        let mut qb = QueryBuilder::new(Capture::default());
        let out = execute(&mut qb, &args).unwrap();
        let sql = qb.executor().sql.borrow().clone();
        (out, sql)
    }

    #[test]
    fn select_with_where_and_or_group() {
        let (out, sql) = run_with(&[
            "select", "users", "--where", "active", "=", "1", "--or", "username", "=", "a",
            "--or", "username", "=", "b",
        ]);
        assert_eq!(
            sql,
            vec!["SELECT * FROM users WHERE active = ? AND (username = ? OR username = ?) "]
        );
        assert_eq!(out, r#"id=1  username="johndoe""#);
    }

    #[test]
    fn update_renders_summary() {
        let (out, sql) = run_with(&["update", "users", "active=0", "--where", "id", ">", "10"]);
        assert_eq!(sql, vec!["UPDATE users SET active = ? WHERE id > ? "]);
        assert_eq!(out, "2 row(s) affected");
    }

    #[test]
    fn json_output() {
        let (out, _) = run_with(&["delete", "users", "--json"]);
        assert_eq!(out, r#"{"affectedRows":2,"lastId":null}"#);
    }

    #[test]
    fn bad_operator_is_reported() {
        let argv: Vec<String> = ["sqlchain", "delete", "users", "--where", "id", "LIKE", "1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let Command::Run(args) = parse_args(&argv).unwrap() else {
            panic!("expected run command");
        };
        let mut qb = QueryBuilder::new(Capture::default());
        let err = execute(&mut qb, &args).unwrap_err();
        assert!(format!("{err:#}").contains("invalid condition"));
        assert!(qb.executor().sql.borrow().is_empty());
    }
}
