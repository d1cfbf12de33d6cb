use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use csv_sql_agent::server::transport_line::LineTransport;
use csv_sql_agent::server::LineServer;
use csv_sql_agent::session::InsertMode;
use csv_sql_agent::{Config, Session};

#[derive(Debug, Parser)]
#[command(name = "csv-sql-agent", version, about)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Override the managed table name
    #[arg(long, global = true)]
    table: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve line-delimited JSON requests on stdin/stdout (default)
    Serve,
    /// Upload a CSV and insert it with the given column types
    Ingest {
        csv: PathBuf,
        /// Comma separated types, e.g. "String, Integer, Float"
        #[arg(long)]
        types: String,
        /// `new` drops the existing table first, `append` keeps it
        #[arg(long, default_value = "append")]
        mode: String,
    },
    /// Run SQL against the database and print the result
    Query { sql: String },
    /// Print the managed table's columns
    Describe,
    /// Print whether the managed table exists
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore errors to avoid leaking secrets)
    let _ = dotenvy::dotenv();

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    if let Some(table) = cli.table {
        config.table_name = table;
    }
    config.validate()?;

    let mut session = Session::open(config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            info!(
                "Serving table {} from {}",
                session.table_name(),
                session.store().location()
            );
            let mut server = LineServer::new(LineTransport::stdio(), session);
            server.run().await?;
        }
        Command::Ingest { csv, types, mode } => {
            let mode: InsertMode = mode.parse().map_err(anyhow::Error::msg)?;
            // Stop on a bad file before anything is dropped or inserted
            let uploaded = session.upload(Path::new(&csv))?;
            println!("{}", uploaded);
            if mode == InsertMode::New {
                println!("{}", session.change_insert_mode(mode));
            }
            println!("{}", session.submit_column_types(&types));
        }
        Command::Query { sql } => print!("{}", ensure_newline(session.query(&sql))),
        Command::Describe => println!("{}", session.describe_table()),
        Command::Status => println!("{}", session.table_status()),
    }

    Ok(())
}

fn ensure_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
