use sqlchain::Value;
use sqlchain::ident::looks_numeric;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Run(RunArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Select,
    Insert,
    Update,
    Delete,
}

/// One `COL OP VALUE` triple from `--where` / `--or`.
#[derive(Debug, Clone, PartialEq)]
pub struct CondArg {
    pub column: String,
    pub op: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunArgs {
    pub verb: CliVerb,
    pub table: String,
    pub columns: Option<Vec<String>>,
    pub wheres: Vec<CondArg>,
    pub ors: Vec<CondArg>,
    pub fields: Vec<(String, Value)>,
    pub json: bool,
    pub env_file: Option<PathBuf>,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1).map(|s| s.as_str());
    let Some(first) = it.next() else {
        return Ok(Command::Help);
    };

    let verb = match first {
        "-h" | "--help" | "help" => return Ok(Command::Help),
        "select" => CliVerb::Select,
        "insert" => CliVerb::Insert,
        "update" => CliVerb::Update,
        "delete" => CliVerb::Delete,
        _ => anyhow::bail!("unknown command: {first}"),
    };
    parse_run(verb, it)
}

fn parse_run<'a>(verb: CliVerb, mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut table: Option<String> = None;
    let mut columns: Option<Vec<String>> = None;
    let mut wheres = Vec::new();
    let mut ors = Vec::new();
    let mut fields = Vec::new();
    let mut json = false;
    let mut env_file: Option<PathBuf> = None;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help),
            "--json" => json = true,
            "--env" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--env requires a value");
                };
                env_file = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--env=") => {
                env_file = Some(PathBuf::from(token.trim_start_matches("--env=")));
            }
            "--columns" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--columns requires a value");
                };
                columns = Some(split_csv(v));
            }
            _ if token.starts_with("--columns=") => {
                columns = Some(split_csv(token.trim_start_matches("--columns=")));
            }
            "--where" => wheres.push(parse_cond("--where", &mut it)?),
            "--or" => ors.push(parse_cond("--or", &mut it)?),
            _ if token.starts_with('-') => anyhow::bail!("unknown flag: {token}"),
            _ if table.is_none() => table = Some(token.to_string()),
            _ => {
                let Some((column, value)) = token.split_once('=') else {
                    anyhow::bail!("unexpected argument: {token} (expected COLUMN=VALUE)");
                };
                if column.is_empty() {
                    anyhow::bail!("missing column name in {token}");
                }
                fields.push((column.to_string(), parse_value(value)));
            }
        }
    }

    let Some(table) = table else {
        anyhow::bail!("missing table name");
    };

    match verb {
        CliVerb::Insert | CliVerb::Update if fields.is_empty() => {
            anyhow::bail!("{} requires at least one COLUMN=VALUE assignment", verb_name(verb));
        }
        CliVerb::Select | CliVerb::Delete if !fields.is_empty() => {
            anyhow::bail!("{} does not take COLUMN=VALUE assignments", verb_name(verb));
        }
        CliVerb::Insert if !wheres.is_empty() || !ors.is_empty() => {
            anyhow::bail!("insert does not take --where or --or");
        }
        _ => {}
    }
    if columns.is_some() && verb != CliVerb::Select {
        anyhow::bail!("--columns is only valid for select");
    }
    if ors.len() == 1 {
        anyhow::bail!("--or needs at least two conditions");
    }

    Ok(Command::Run(RunArgs {
        verb,
        table,
        columns,
        wheres,
        ors,
        fields,
        json,
        env_file,
    }))
}

fn parse_cond<'a>(
    flag: &str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<CondArg> {
    let (Some(column), Some(op), Some(value)) = (it.next(), it.next(), it.next()) else {
        anyhow::bail!("{flag} requires COLUMN OP VALUE");
    };
    Ok(CondArg {
        column: column.to_string(),
        op: op.to_string(),
        value: parse_value(value),
    })
}

/// Integers and numeric-looking strings bind as numbers; everything else as
/// text.
pub fn parse_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Integer(i);
    }
    if looks_numeric(trimmed)
        && let Ok(f) = trimmed.parse::<f64>()
    {
        return Value::Float(f);
    }
    Value::from(raw)
}

fn verb_name(verb: CliVerb) -> &'static str {
    match verb {
        CliVerb::Select => "select",
        CliVerb::Insert => "insert",
        CliVerb::Update => "update",
        CliVerb::Delete => "delete",
    }
}

fn split_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn print_help() {
    println!(
        "\
sqlchain - run simple parameterized statements against PostgreSQL

USAGE:
  sqlchain select <TABLE> [--columns a,b] [--where COL OP VALUE]... [--or COL OP VALUE]...
  sqlchain insert <TABLE> COL=VALUE...
  sqlchain update <TABLE> COL=VALUE... [--where COL OP VALUE]... [--or COL OP VALUE]...
  sqlchain delete <TABLE> [--where COL OP VALUE]... [--or COL OP VALUE]...

OPTIONS:
  --columns a,b         Columns to select (default: *)
  --where COL OP VALUE  AND-combined condition; OP is one of = != < <= > >=
  --or COL OP VALUE     OR-combined condition (all --or triples form one group)
  --json                Print the result as JSON
  --env FILE            Load DATABASE_* variables from FILE instead of .env
  -h, --help            Print help

ENVIRONMENT:
  DATABASE_HOST, DATABASE_USER, DATABASE_PASSWORD, DATABASE_NAME, DATABASE_PORT
  RUST_LOG=sqlchain.sql=debug logs every statement"
    );
}
