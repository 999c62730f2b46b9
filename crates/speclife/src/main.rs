//! speclife - document lifecycle CLI
//!
//! ```text
//! speclife                       list documents by state
//! speclife <path> <state>        transition a document
//! speclife <path>                move a document to the directory its envelope names
//! speclife add <path>            onboard a new document
//! speclife update-index          resynchronize the aggregate index
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use speclife_logging::{init_logging, LogConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "speclife",
    version,
    about = "Move specification documents through lifecycle states and keep their index in sync"
)]
struct Cli {
    /// Enable verbose logging (info to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Path to speclife.toml (default: ./speclife.toml if present)
    #[arg(long, global = true, env = "SPECLIFE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every document grouped by state (the default)
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported states and their directories
    States {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add an existing document to the index
    Index {
        /// Document to index
        path: PathBuf,
    },

    /// Synthesize or repair a document's metadata envelope
    AddHeaders {
        /// Document to update
        path: PathBuf,
    },

    /// Number, file, register and index a new document
    Add {
        /// File to onboard
        path: PathBuf,
    },

    /// Resynchronize the index with the documents on disk
    UpdateIndex {
        /// Report whether changes are needed without writing (exit 1 if so)
        #[arg(long)]
        check: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration
    Config(cli::config::ConfigArgs),

    /// `<path>` syncs to the envelope state; `<path> <state>` transitions
    #[command(external_subcommand)]
    Document(Vec<String>),
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();
    match cli.command {
        None => cli::list::run(config, false),
        Some(Commands::List { json }) => cli::list::run(config, json),
        Some(Commands::States { json }) => cli::states::run(config, json),
        Some(Commands::Index { path }) => cli::document::index(config, &path),
        Some(Commands::AddHeaders { path }) => cli::document::add_headers(config, &path),
        Some(Commands::Add { path }) => cli::document::add(config, &path),
        Some(Commands::UpdateIndex { check, json }) => cli::update_index::run(config, check, json),
        Some(Commands::Config(args)) => cli::config::run(config, args),
        Some(Commands::Document(args)) => match args.as_slice() {
            [path] => cli::transition::sync_to_header(config, Path::new(path)),
            [path, state] => cli::transition::transition(config, Path::new(path), state),
            _ => Err(cli::error::HelpfulError::usage(&args).into()),
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = init_logging(LogConfig {
        app_name: "speclife",
        verbose: cli.verbose,
    });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}
