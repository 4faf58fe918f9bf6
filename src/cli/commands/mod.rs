//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod db;
mod helpers;
mod import;
mod serve;
mod users;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::models::SourceFormat;

/// Source format override for roster files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FormatArg {
    /// Comma-separated values with a header row
    Csv,
    /// XML document with one element per user
    Xml,
}

impl From<FormatArg> for SourceFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => SourceFormat::Csv,
            FormatArg::Xml => SourceFormat::Xml,
        }
    }
}

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Batch user import engine for CSV and XML roster files")]
#[command(version)]
pub struct Cli {
    /// Data directory or database file (overrides config file).
    /// Can be a directory containing rosterload.db or a .db file directly.
    #[arg(long, short = 'd', global = true)]
    data: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Run and inspect import jobs
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },

    /// Inspect imported user accounts
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Start the import API server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: 127.0.0.1:3030)
        #[arg(default_value = "127.0.0.1:3030", env = "ROSTERLOAD_BIND")]
        bind: String,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Run database migrations
    Migrate {
        /// Only check migration status, don't run migrations
        #[arg(long)]
        check: bool,
    },

    /// List tables in the database
    Tables,
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import users from a roster file, batch by batch, until completion
    Run {
        /// CSV or XML roster file
        file: PathBuf,
        /// Source format (detected from the file extension if not given)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
        /// Rows per batch (overrides config)
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Show progress for an import job
    Status {
        /// Import job ID
        id: i32,
    },

    /// List recent import jobs
    History {
        /// Limit number of jobs shown
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List imported user accounts
    List {
        /// Limit number of users shown
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        data: cli.data,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Db { command } => match command {
            DbCommands::Migrate { check } => db::cmd_migrate(&settings, check).await,
            DbCommands::Tables => db::cmd_tables(&settings).await,
        },
        Commands::Import { command } => match command {
            ImportCommands::Run {
                file,
                format,
                batch_size,
            } => import::cmd_import_run(&settings, &file, format.map(Into::into), batch_size).await,
            ImportCommands::Status { id } => import::cmd_import_status(&settings, id).await,
            ImportCommands::History { limit } => import::cmd_import_history(&settings, limit).await,
        },
        Commands::Users { command } => match command {
            UserCommands::List { limit } => users::cmd_users_list(&settings, limit).await,
        },
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
    }
}
