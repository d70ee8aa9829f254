use clap::Parser;
use comfy_table::{Cell, Table as ComfyTable, presets::UTF8_FULL};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use flatql::{Connection, ConnectionConfig, DatabaseError, Driver, FetchStyle, Fetched, Row};

/// flatql interactive shell
#[derive(Parser, Debug)]
#[command(name = "flatql_shell")]
#[command(about = "SQL-like shell over CSV, JSON and YAML table files", long_about = None)]
struct Args {
    /// Table file format: csv, json or yaml
    #[arg(short = 'D', long)]
    driver: Option<Driver>,

    /// Database directory (or `memory` with the json driver)
    #[arg(short = 'd', long)]
    database: Option<String>,

    /// Config file (defaults to ./flatql.toml when present)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Write tables back after every INSERT, UPDATE or DELETE
    #[arg(short = 'a', long)]
    auto_save: bool,
}

/// Priority: CLI args > FLATQL_* environment > config file > defaults
fn load_config(args: &Args) -> Result<ConnectionConfig, DatabaseError> {
    let mut config = ConnectionConfig::load(args.config.as_deref())?;
    if let Some(driver) = args.driver {
        config = config.with_driver(driver);
    }
    if let Some(database) = &args.database {
        config = config.with_database(database.clone());
    }
    if args.auto_save {
        config = config.with_auto_save(true);
    }
    Ok(config)
}

fn render_rows(columns: &[String], rows: &[Row]) -> String {
    if rows.is_empty() {
        return "(0 rows)".to_string();
    }

    let mut table = ComfyTable::new();
    table.load_preset(UTF8_FULL);
    table.set_header(columns.iter().map(Cell::new));
    for row in rows {
        table.add_row(columns.iter().map(|c| Cell::new(row.get_or_null(c))));
    }

    format!("{table}\n({} rows)", rows.len())
}

fn run_statement(conn: &mut Connection, sql: &str) -> Result<String, DatabaseError> {
    conn.query(sql)?;
    if let Some(affected) = conn.affected_rows() {
        return Ok(format!("OK, {affected} row(s) affected"));
    }
    let columns = conn.columns().to_vec();
    let rows: Vec<Row> = conn
        .fetch_all(FetchStyle::Assoc)?
        .into_iter()
        .filter_map(Fetched::into_assoc)
        .collect();
    Ok(render_rows(&columns, &rows))
}

/// Dot-commands; `None` means quit.
fn run_command(conn: &mut Connection, line: &str) -> Option<Result<String, DatabaseError>> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let argument = parts.next();

    match command {
        ".quit" | ".exit" => None,
        ".tables" => Some(conn.tables().map(|names| {
            if names.is_empty() {
                "(no tables)".to_string()
            } else {
                names.join("\n")
            }
        })),
        ".save" => Some(conn.save(argument).map(|_| "saved".to_string())),
        ".load" => Some(match argument {
            Some(table) => conn.load(table).map(|rows| format!("loaded {} row(s)", rows.len())),
            None => Ok("usage: .load <table>".to_string()),
        }),
        ".help" => Some(Ok([
            ".tables          list tables",
            ".load <table>    re-read a table from disk",
            ".save [table]    write a table (default: current)",
            ".quit            leave the shell",
            "",
            "Statements: SELECT, INSERT, UPDATE, DELETE",
        ]
        .join("\n"))),
        other => Some(Ok(format!("Unknown command: {other}. Use .help for help."))),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    println!("flatql shell v{}", env!("CARGO_PKG_VERSION"));
    println!("Driver: {}, Database: {}", config.driver(), config.database());

    let mut conn = match Connection::open(config) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Connection failed: {e}");
            return Err(e.into());
        }
    };

    let mut rl = DefaultEditor::new()?;
    let history_file = dirs::home_dir().map(|mut p| {
        p.push(".flatql_history");
        p
    });
    if let Some(ref path) = history_file {
        let _ = rl.load_history(path); // first run has no history yet
    }

    println!("Type .help for help, .quit to quit.\n");

    loop {
        match rl.readline("flatql> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                let outcome = if line.starts_with('.') {
                    match run_command(&mut conn, line) {
                        Some(outcome) => outcome,
                        None => break,
                    }
                } else {
                    run_statement(&mut conn, line)
                };

                match outcome {
                    Ok(text) => println!("{text}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }

    if let Some(ref path) = history_file {
        let _ = rl.save_history(path);
    }
    conn.disconnect();
    Ok(())
}
