//! minorm: render and run entity statements from a schema file.
//!
//! # Usage
//!
//! ```bash
//! # Show the SELECT for a filter
//! minorm sql select --schema shop.toml --entity Article --filter 'a => a.Name.EndsWith("2")'
//!
//! # Explain how a filter lowers to SQL
//! minorm explain 'x => x.Id > $min' --var min=3
//!
//! # Run a filtered select
//! minorm query --schema shop.toml --entity Article --filter 'x.Id > 3' --database-url sqlite://shop.db
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use minorm::adapter::adapter_for;
use minorm::prelude::*;
use minorm::schema::load_schema;
use minorm::transpiler::{translate_with, ParamBag};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minorm")]
#[command(version)]
#[command(about = "Typed entities in, parameterized SQL out", long_about = None)]
#[command(after_help = "EXAMPLES:
    minorm sql select --schema shop.toml --entity Article --filter 'x.Name.Contains(\"a\")'
    minorm sql delete --schema shop.toml --entity Article --set Id=5 --dialect sqlserver
    minorm explain 'x => x.Id > $min && !x.Code.StartsWith(\"z\")' --var min=3")]
struct Cli {
    /// Config file (default: <config dir>/minorm/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatementKind {
    Select,
    Count,
    ById,
    Insert,
    Update,
    Delete,
    DeleteAll,
}

/// Options shared by commands that work on one entity.
#[derive(clap::Args)]
struct EntityArgs {
    /// Entity schema file
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Entity name within the schema
    #[arg(short, long)]
    entity: String,

    /// SQL dialect (default: from config or the database URL)
    #[arg(short, long)]
    dialect: Option<Dialect>,

    /// Filter expression
    #[arg(short, long)]
    filter: Option<String>,

    /// Captured variables for the filter: name=value
    #[arg(long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// Sort by property; suffix with :desc for descending
    #[arg(long = "order", value_name = "PROPERTY[:desc]")]
    order: Vec<String>,

    /// 1-based page number
    #[arg(long)]
    page: Option<i64>,

    #[arg(long)]
    page_size: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a statement for an entity
    Sql {
        #[arg(value_enum)]
        kind: StatementKind,

        #[command(flatten)]
        entity: EntityArgs,

        /// Entity values: Property=value
        #[arg(long = "set", value_name = "PROPERTY=VALUE")]
        values: Vec<String>,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Parse a filter and show its tree and SQL
    Explain {
        filter: String,

        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        #[arg(short, long, default_value = "db2")]
        dialect: Dialect,
    },
    /// Run a filtered select
    Query {
        #[command(flatten)]
        entity: EntityArgs,

        /// Database connection URL
        #[arg(long, env = "MINORM_DATABASE_URL")]
        database_url: Option<String>,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List supported dialects
    Dialects,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "minorm=debug" } else { "minorm=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Sql {
            kind,
            entity,
            values,
            format,
        } => render_statement(&config, kind, &entity, &values, format),
        Commands::Explain {
            filter,
            vars,
            dialect,
        } => explain_filter(&filter, &vars, dialect),
        Commands::Query {
            entity,
            database_url,
            format,
        } => run_query(&config, &entity, database_url, format).await,
        Commands::Dialects => {
            show_dialects();
            Ok(())
        }
    }
}

/// Parse a command-line literal: integer, float, bool, null, else text.
fn parse_literal(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        Value::Int(n)
    } else if let Ok(f) = text.parse::<f64>() {
        Value::Float(f)
    } else if text == "true" {
        Value::Bool(true)
    } else if text == "false" {
        Value::Bool(false)
    } else if text == "null" {
        Value::Null
    } else {
        Value::String(text.to_string())
    }
}

fn parse_pairs(pairs: &[String]) -> anyhow::Result<BTreeMap<String, Value>> {
    pairs
        .iter()
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{}'", pair))?;
            Ok((name.trim().to_string(), parse_literal(value)))
        })
        .collect()
}

fn captures(vars: &[String]) -> anyhow::Result<Captures> {
    let mut captures = Captures::new();
    for (name, value) in parse_pairs(vars)? {
        captures.insert(&name, value);
    }
    Ok(captures)
}

fn order_by(terms: &[String]) -> OrderBy {
    terms.iter().fold(OrderBy::default(), |order, term| {
        match term.rsplit_once(':') {
            Some((prop, dir)) if dir.eq_ignore_ascii_case("desc") => order.then_desc(prop),
            Some((prop, _)) => order.then_asc(prop),
            None => order.then_asc(term),
        }
    })
}

/// Resolve the named entity from the schema file.
fn entity_meta(config: &Config, args: &EntityArgs) -> anyhow::Result<Arc<EntityMeta>> {
    let path: &Path = args
        .schema
        .as_deref()
        .or(config.schema_path.as_deref())
        .ok_or_else(|| anyhow!("no schema file; use --schema or set schema_path in the config"))?;
    let entities = load_schema(path).with_context(|| format!("loading schema {}", path.display()))?;
    let desc = entities
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(&args.entity))
        .ok_or_else(|| anyhow!("entity '{}' not found in {}", args.entity, path.display()))?;
    let registry = Registry::with_name_case(config.name_case);
    Ok(registry.resolve(desc)?)
}

fn build_query(config: &Config, args: &EntityArgs) -> anyhow::Result<Query> {
    let mut query = Query::new().order(order_by(&args.order));
    if let Some(text) = &args.filter {
        query = query.filter(parse_filter(text, &captures(&args.vars)?)?);
    }
    match (args.page, args.page_size) {
        (page, Some(size)) => query = query.page(page.unwrap_or(1), size),
        (Some(page), None) => query = query.page(page, config.default_page_size),
        (None, None) => {}
    }
    Ok(query)
}

fn render_statement(
    config: &Config,
    kind: StatementKind,
    args: &EntityArgs,
    values: &[String],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let meta = entity_meta(config, args)?;
    let dialect = args.dialect.unwrap_or_else(|| config.effective_dialect());
    let builder = StatementBuilder::new(&meta, dialect);
    let record: Record = parse_pairs(values)?;

    let (sql, params) = match kind {
        StatementKind::Select => {
            let stmt = builder.select(&build_query(config, args)?)?;
            (stmt.sql, stmt.params)
        }
        StatementKind::Count => {
            let query = build_query(config, args)?;
            let stmt = builder.count(query.filter.as_ref())?;
            (stmt.sql, stmt.params)
        }
        StatementKind::ById => {
            let stmt = builder.select_by_id(&KeyValues::Composite(record))?;
            (stmt.sql, stmt.params)
        }
        StatementKind::Insert => {
            let plan = adapter_for(dialect).plan(&builder.insert(&record)?);
            (plan.to_sql(), plan.insert.params)
        }
        StatementKind::Update => {
            let stmt = builder.update(&record)?;
            (stmt.sql, stmt.params)
        }
        StatementKind::Delete => {
            let stmt = builder.delete(&record)?;
            (stmt.sql, stmt.params)
        }
        StatementKind::DeleteAll => (builder.delete_all(), Default::default()),
    };

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({ "dialect": dialect, "sql": sql, "params": params });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Table => {
            println!("{} {}", "Dialect:".dimmed(), dialect.to_string().cyan());
            println!("{}", "Generated SQL:".green().bold());
            println!("  {}", sql.white());
            for bag in params.bags() {
                print_params(bag);
            }
        }
    }
    Ok(())
}

fn print_params(params: &ParamBag) {
    if params.is_empty() {
        return;
    }
    println!("{}", "Parameters:".cyan());
    for (name, value) in params.iter() {
        println!("  @{} = {}", name, value.to_string().yellow());
    }
}

fn explain_filter(filter: &str, vars: &[String], dialect: Dialect) -> anyhow::Result<()> {
    println!("{} {}", "Filter:".dimmed(), filter.yellow());
    println!();

    let expr = parse_filter(filter, &captures(vars)?)?;
    println!("{}", "Parsed Tree:".green().bold());
    println!("  {}", expr.to_string().white());

    // Without a schema, properties map to themselves.
    let resolve = |property: &str| -> OrmResult<String> { Ok(property.to_string()) };
    let fragment = translate_with(&expr, &resolve, dialect.generator().as_ref())?;
    println!();
    println!("{} ({})", "Generated SQL:".green().bold(), dialect.to_string().cyan());
    println!("  {}", fragment.sql.white());
    print_params(&fragment.params);
    Ok(())
}

async fn run_query(
    config: &Config,
    args: &EntityArgs,
    database_url: Option<String>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let url = database_url
        .or_else(|| config.database_url.clone())
        .ok_or_else(|| anyhow!("no database URL; use --database-url or set MINORM_DATABASE_URL"))?;
    let meta = entity_meta(config, args)?;
    let executor = SqlxExecutor::connect(&url)
        .await
        .with_context(|| format!("connecting to {}", url))?;
    let dialect = args.dialect.unwrap_or(executor.dialect());
    if dialect != executor.dialect() {
        bail!("--dialect {} does not match the database ({})", dialect, executor.dialect());
    }

    let query = build_query(config, args)?;
    let stmt = StatementBuilder::new(&meta, dialect).select(&query)?;
    let rows = executor.query(&stmt, config.command_options()).await?;
    let records: Vec<Record> = rows.iter().map(|r| meta.row_to_record(&r.to_record())).collect();
    let columns: Vec<&str> = meta.select_properties().iter().map(|p| p.name.as_str()).collect();
    format_output(&columns, &records, format)
}

fn format_output(columns: &[&str], records: &[Record], format: OutputFormat) -> anyhow::Result<()> {
    if records.is_empty() {
        println!("{}", "(no results)".dimmed());
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Table => {
            let cell = |record: &Record, col: &str| record.get(col).map(Value::to_string).unwrap_or_default();
            let widths: Vec<usize> = columns
                .iter()
                .map(|c| records.iter().map(|r| cell(r, c).len()).fold(c.len(), usize::max))
                .collect();

            let header: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:width$}", c, width = w))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for record in records {
                let cells: Vec<String> = columns
                    .iter()
                    .zip(&widths)
                    .map(|(c, w)| format!("{:width$}", cell(record, c), width = w))
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", records.len().to_string().cyan());
        }
    }
    Ok(())
}

fn show_dialects() {
    println!(
        "{:10} {:8} {:10} {:12} {}",
        "Dialect".white().bold(),
        "Upper".white().bold(),
        "Param".white().bold(),
        "Concat".white().bold(),
        "Paging".white().bold()
    );
    println!("{}", "─".repeat(80).dimmed());

    for dialect in Dialect::ALL {
        let g = dialect.generator();
        println!(
            "{:10} {:8} {:10} {:12} {}",
            dialect.name().cyan().bold(),
            g.upper_function().yellow(),
            g.placeholder(1),
            g.string_concat(&["a", "b"]),
            g.limit_offset("@top", "@skip").trim().dimmed()
        );
    }
}
