//! Framestore CLI (framectl)
//!
//! Command-line tool for storing and inspecting framestore files.
//!
//! ## Quick Start
//!
//! ```bash
//! # Store a JSON table document
//! framectl store data.fsf --table table.json --compression 50
//!
//! # Inspect the header without touching column data
//! framectl meta data.fsf
//!
//! # Read two columns of a row range, in the order given
//! framectl read data.fsf --columns d,a --from 100 --to 200
//! ```
//!
//! ## Exit Codes
//!
//! - 0: success
//! - 1: I/O error
//! - 2: format error (bad magic, version, corrupt data)
//! - 3: argument error (bad level, unknown column, bad row range,
//!      malformed table document)
//!
//! ## Architecture
//!
//! The CLI uses:
//! - **clap**: argument parsing and help generation
//! - **anyhow**: ergonomic error handling
//! - **serde_json**: the table document format and metadata output
//!
//! Set `RUST_LOG=framestore_storage=debug` to watch per-column progress on
//! stderr.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use framestore_storage::ReadRequest;
use tracing_subscriber::EnvFilter;

mod document;

use document::TableDocument;

#[derive(Parser)]
#[command(name = "framectl")]
#[command(about = "Framestore command-line tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a JSON table document as a framestore file
    Store {
        /// Destination file
        path: PathBuf,

        /// Table document: a JSON file, or - for stdin
        #[arg(short, long)]
        table: PathBuf,

        /// Compression level (0..=100)
        #[arg(short, long, default_value_t = 50)]
        compression: u32,
    },

    /// Print a file's table metadata as JSON
    Meta {
        /// Framestore file
        path: PathBuf,
    },

    /// Read rows and columns back as a JSON table document
    Read {
        /// Framestore file
        path: PathBuf,

        /// Comma-separated column names, in result order (default: all)
        #[arg(short, long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// First row, 0-based
        #[arg(long, default_value_t = 0)]
        from: usize,

        /// Exclusive end row (default: all remaining rows)
        #[arg(long)]
        to: Option<usize>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Store {
            path,
            table,
            compression,
        } => {
            let doc = load_document(&table)?;
            let data = doc.into_table()?;
            framestore_storage::write_table(&path, &data, compression)?;
        }
        Command::Meta { path } => {
            let meta = framestore_storage::read_meta(&path)?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
        }
        Command::Read {
            path,
            columns,
            from,
            to,
        } => {
            let request = ReadRequest {
                columns,
                from_row: from,
                to_row: to,
            };
            let result = framestore_storage::read_table(&path, &request)?;
            let doc = TableDocument::from_result(&result);
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }
    Ok(())
}

fn load_document(path: &PathBuf) -> Result<TableDocument> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading table document from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading table document {}", path.display()))?
    };
    serde_json::from_str(&text).context("parsing table document")
}

/// Map a failure onto the documented exit codes.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<framestore_storage::Error>() {
        return e.kind().exit_code();
    }
    if err.downcast_ref::<std::io::Error>().is_some() {
        return 1;
    }
    3
}
