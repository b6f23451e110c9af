//! liteql: compile generic SQL for SQLite
//!
//! # Usage
//!
//! ```bash
//! # Compile a statement
//! liteql "CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(50))"
//!
//! # Compile a file (or stdin with -)
//! liteql compile --file schema.sql
//!
//! # Compile and run against a database
//! liteql exec "SELECT NOW()" --database-url sqlite::memory:
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use liteql::config::{Config, ConfigBuilder, OutputFormat};
use liteql::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "liteql")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile generic SQL into statements SQLite accepts", long_about = None)]
#[command(after_help = "EXAMPLES:
    liteql 'CREATE TABLE t (id INT PRIMARY KEY, price DECIMAL(10,2))'
    liteql lint 'CREATE TABLE t (a INT, b INT, PRIMARY KEY (a, b))'
    liteql exec 'SELECT CURRENT_DATE' --database-url sqlite::memory:")]
struct Cli {
    /// The SQL statement to compile
    sql: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Database connection URL
    #[arg(long, env = "LITEQL_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Config file (defaults to ./liteql.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a statement and print the result
    Compile {
        /// SQL text, or `-` for stdin
        sql: Option<String>,
        /// Read the statement from a file (`-` for stdin)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Check that a statement compiles to something non-empty
    Validate {
        sql: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Report where compiled output differs from what was written
    Lint {
        sql: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show the type mapping table
    Types,
    /// Show the functions SQLite supports
    Functions,
    /// Compile and execute a statement
    Exec {
        sql: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List tables in the database
    Tables,
    /// Show the columns of a table
    Schema {
        table: String,
    },
    /// Interactive mode
    Repl,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let file_config = Config::load(cli.config.as_deref()).context("loading config")?;
    let config = ConfigBuilder::from(file_config)
        .database(cli.database_url.clone())
        .format(cli.format)
        .verbose(cli.verbose)
        .build();

    init_tracing(config.verbose);

    match &cli.command {
        Some(Commands::Compile { sql, file }) => {
            let text = read_input(sql.as_deref(), file.as_deref())?;
            compile_cmd(&text, &config)
        }
        Some(Commands::Validate { sql, file }) => {
            let text = read_input(sql.as_deref(), file.as_deref())?;
            validate_cmd(&text, &config)
        }
        Some(Commands::Lint { sql, file }) => {
            let text = read_input(sql.as_deref(), file.as_deref())?;
            lint_cmd(&text, &config)
        }
        Some(Commands::Types) => show_types(&config),
        Some(Commands::Functions) => show_functions(&config),
        Some(Commands::Exec { sql, file }) => {
            let text = read_input(sql.as_deref(), file.as_deref())?;
            let db = open_database(&config).await?;
            exec_cmd(&db, &text, &config).await
        }
        Some(Commands::Tables) => {
            let db = open_database(&config).await?;
            for table in db.tables().await? {
                println!("{}", table);
            }
            Ok(())
        }
        Some(Commands::Schema { table }) => {
            let db = open_database(&config).await?;
            show_schema(&db, table, &config).await
        }
        Some(Commands::Repl) => run_repl(&config).await,
        None => match &cli.sql {
            Some(sql) => {
                let text = read_input(Some(sql), None)?;
                compile_cmd(&text, &config)
            }
            None => {
                println!("{}", "liteql: generic SQL in, SQLite out".cyan().bold());
                println!();
                println!("Usage: liteql <SQL> [OPTIONS]");
                println!();
                println!("Try: liteql --help");
                Ok(())
            }
        },
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "liteql=debug" } else { "liteql=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Statement text from a file, stdin (`-`), or the argument itself.
fn read_input(sql: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (sql, file) {
        (_, Some(path)) if path == Path::new("-") => read_stdin(),
        (_, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        (Some("-"), None) => read_stdin(),
        (Some(sql), None) => Ok(sql.to_string()),
        (None, None) => bail!("No SQL given. Pass it as an argument, with --file, or `-` for stdin"),
    }
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("reading stdin")?;
    Ok(buf)
}

async fn open_database(config: &Config) -> Result<Database> {
    let Some(url) = &config.database_url else {
        bail!("No database URL. Use --database-url, set LITEQL_DATABASE_URL, or add database_url to liteql.toml");
    };
    if config.verbose {
        eprintln!("{} {}", "Connecting to:".dimmed(), url);
    }
    Ok(Database::connect(url).await?)
}

fn compile_cmd(text: &str, config: &Config) -> Result<()> {
    let compiled = compile_detailed(text)?;

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&compiled)?),
        OutputFormat::Text => {
            if config.verbose {
                eprintln!("{} {}", "Kind:".dimmed(), compiled.kind.to_string().cyan());
            }
            if compiled.outcome == Outcome::Fallback {
                eprintln!(
                    "{}",
                    "⚠ Column list not found; statement returned unmodified. Review it by hand."
                        .yellow()
                );
            }
            println!("{}", compiled.sql);
        }
    }
    Ok(())
}

fn validate_cmd(text: &str, config: &Config) -> Result<()> {
    let validation = check(text);

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&validation)?),
        OutputFormat::Text => {
            if validation.valid {
                println!("{} valid", "✓".green());
            } else {
                println!(
                    "{} {}",
                    "✗".red(),
                    validation.message.as_deref().unwrap_or_default().red()
                );
            }
        }
    }

    if !validation.valid {
        std::process::exit(1);
    }
    Ok(())
}

fn lint_cmd(text: &str, config: &Config) -> Result<()> {
    let issues = lint(text);

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&issues)?),
        OutputFormat::Text => {
            if issues.is_empty() {
                println!("{} No issues", "✓".green());
            }
            for issue in &issues {
                let level = match issue.level {
                    LintLevel::Error => "error".red().bold(),
                    LintLevel::Warning => "warning".yellow().bold(),
                    LintLevel::Info => "info".cyan(),
                };
                match &issue.column {
                    Some(col) => println!("{}: {} {}", level, format!("[{}]", col).white(), issue.message),
                    None => println!("{}: {}", level, issue.message),
                }
            }
        }
    }

    if issues.iter().any(|i| i.level == LintLevel::Error) {
        std::process::exit(1);
    }
    Ok(())
}

fn show_types(config: &Config) -> Result<()> {
    let types = supported_types();

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&types)?),
        OutputFormat::Text => {
            println!("{:12} {}", "Declared".white().bold(), "SQLite".white().bold());
            println!("{}", "─".repeat(24).dimmed());
            for (name, target) in types {
                println!("{:12} {}", name.yellow(), target.to_string().cyan());
            }
        }
    }
    Ok(())
}

fn show_functions(config: &Config) -> Result<()> {
    let functions = supported_functions();

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&functions)?),
        OutputFormat::Text => {
            for f in functions {
                println!("{}", f);
            }
        }
    }
    Ok(())
}

async fn exec_cmd(db: &Database, text: &str, config: &Config) -> Result<()> {
    if config.verbose {
        eprintln!("{} {}", "Compiled:".dimmed(), compile(text)?.yellow());
    }
    let output = db.run(text).await?;
    print_output(&output, config.format)
}

async fn show_schema(db: &Database, table: &str, config: &Config) -> Result<()> {
    let columns = db.table_schema(table).await?;
    if columns.is_empty() {
        bail!("Table '{}' not found", table);
    }

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&columns)?),
        OutputFormat::Text => {
            for col in &columns {
                let mut flags = Vec::new();
                if col.primary_key {
                    flags.push("PRIMARY KEY");
                }
                if col.not_null {
                    flags.push("NOT NULL");
                }
                println!(
                    "{:3} {:20} {:8} {}",
                    col.cid.to_string().dimmed(),
                    col.name.white(),
                    col.data_type.cyan(),
                    flags.join(" ").yellow()
                );
            }
        }
    }
    Ok(())
}

fn print_output(output: &QueryOutput, format: OutputFormat) -> Result<()> {
    match (output, format) {
        (_, OutputFormat::Json) => println!("{}", serde_json::to_string_pretty(output)?),
        (QueryOutput::Affected(n), OutputFormat::Text) => {
            println!("{} {} rows affected", "✓".green(), n);
        }
        (QueryOutput::Rows(set), OutputFormat::Text) => print_table(set),
    }
    Ok(())
}

fn print_table(set: &ResultSet) {
    if set.rows.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    let cells: Vec<Vec<String>> = set
        .rows
        .iter()
        .map(|row| row.iter().map(val_to_string).collect())
        .collect();

    let mut widths: Vec<usize> = set.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let header: Vec<String> = set
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:width$}", c, width = *w))
        .collect();
    println!("{}", header.join(" │ ").white().bold());

    let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    println!("{}", sep.join("─┼─").dimmed());

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:width$}", v, width = *w))
            .collect();
        println!("{}", line.join(" │ "));
    }

    println!();
    println!("{} row(s) returned", set.rows.len().to_string().cyan());
}

fn val_to_string(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}

/// Compile (and, with a database configured, execute) one line at a time.
async fn run_repl(config: &Config) -> Result<()> {
    use rustyline::DefaultEditor;
    use rustyline::error::ReadlineError;

    let db = match &config.database_url {
        Some(_) => Some(open_database(config).await?),
        None => None,
    };

    println!("{}", "liteql interactive shell".cyan().bold());
    match db {
        Some(_) => println!("{}", "Statements are compiled and executed.".dimmed()),
        None => println!("{}", "No database configured; statements are compiled only.".dimmed()),
    }
    println!("  {}  - Exit the REPL", ".exit".yellow());
    println!("  {} - Show supported types", ".types".yellow());
    println!();

    let mut rl = DefaultEditor::new().context("initializing line editor")?;
    let history_path = dirs::home_dir()
        .map(|p| p.join(".liteql_history"))
        .unwrap_or_default();
    let _ = rl.load_history(&history_path);

    loop {
        let prompt = "liteql> ".cyan().bold().to_string();
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match line {
                    ".exit" | ".quit" | "exit" | "quit" => break,
                    ".types" => {
                        show_types(config)?;
                        continue;
                    }
                    _ => {}
                }

                let result = match &db {
                    Some(db) => match db.run(line).await {
                        Ok(output) => print_output(&output, config.format),
                        Err(e) => Err(e.into()),
                    },
                    None => compile(line)
                        .map(|sql| println!("{} {}", "→".green(), sql.white().bold()))
                        .map_err(Into::into),
                };
                if let Err(e) = result {
                    eprintln!("{} {}", "✗".red(), e.to_string().red());
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} {}", "Error:".red(), e);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}
