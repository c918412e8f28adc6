use crate::render::OutputFormat;
use pgshelf::LoadStrategy;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Run(RunArgs),
}

/// Flags as given on the command line; `None` means "not given, fall back".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub database_url: Option<String>,
    pub ids: Vec<String>,
    pub strategy: Option<LoadStrategy>,
    pub format: Option<OutputFormat>,
    pub debug: bool,
    pub timeout_secs: Option<u64>,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1).map(|s| s.as_str());
    let mut out = RunArgs::default();

    while let Some(token) = it.next() {
        let (flag, inline) = match token.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value)),
            _ => (token, None),
        };

        let mut value = |name: &str| -> anyhow::Result<String> {
            match inline {
                Some(v) => Ok(v.to_string()),
                None => it
                    .next()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow::anyhow!("{name} requires a value")),
            }
        };

        match flag {
            "-h" | "--help" => return Ok(Command::Help),
            "--config" => out.config = Some(PathBuf::from(value("--config")?)),
            "--database-url" => out.database_url = Some(value("--database-url")?),
            "--id" => {
                let parsed = split_csv(&value("--id")?);
                if parsed.is_empty() {
                    anyhow::bail!("--id must not be empty");
                }
                out.ids.extend(parsed);
            }
            "--strategy" => out.strategy = Some(value("--strategy")?.parse()?),
            "--format" => out.format = Some(value("--format")?.parse()?),
            "--timeout-secs" => {
                let raw = value("--timeout-secs")?;
                let secs: u64 = raw
                    .parse()
                    .map_err(|_| anyhow::anyhow!("--timeout-secs expects a whole number, got {raw}"))?;
                if secs == 0 {
                    anyhow::bail!("--timeout-secs must be greater than 0");
                }
                out.timeout_secs = Some(secs);
            }
            "--debug" if inline.is_none() => out.debug = true,
            _ => anyhow::bail!("unknown argument: {token}"),
        }
    }

    Ok(Command::Run(out))
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
        r#"bookshelf

Find books by id and print them with their authors.

USAGE:
  bookshelf [OPTIONS]

OPTIONS:
  --config <path>           TOML config file (default: ./bookshelf.toml if present)
  --database-url <url>      Postgres connection string (overrides DATABASE_URL)
  --id <uuid>[,<uuid>...]   Book id to find; repeatable (default: the two demo books)
  --strategy <name>         selectin | joined (default: selectin)
  --format <name>           pretty | json | plain (default: pretty)
  --debug                   Echo every SQL statement and its timing to stderr
  --timeout-secs <n>        Cancel statements that run longer than n seconds
  -h, --help                Print help

ENVIRONMENT:
  DATABASE_URL              Connection string; also read from .env
  RUST_LOG                  Log filter (default: warn, or info with --debug)
"#
    );
}
