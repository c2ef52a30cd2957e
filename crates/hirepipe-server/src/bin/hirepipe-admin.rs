//! hirepipe admin CLI - backup, restore and CSV migration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hirepipe_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use serde::Serialize;
use std::process;
use tracing::error;

use hirepipe_server::{
    backup,
    config::Config,
    db, migration,
    storage::{config::StorageConfig, Storage},
};

#[derive(Parser, Debug)]
#[command(name = "hirepipe-admin")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Back up every table to the backup bucket
    Backup,

    /// Restore one table from its backup
    Restore {
        /// departments, jobs or hired_employees
        table: String,
    },

    /// Load the CSV exports from the migration bucket
    Migrate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("hirepipe-admin")
        .build();
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI still works without logging
    let _log_guard = init_logging(&log_config).ok().flatten();

    match execute(&cli.command).await {
        Ok(true) => {},
        Ok(false) => process::exit(1),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            process::exit(1);
        },
    }
}

/// Returns `false` when the command completed with partial failures
async fn execute(command: &Command) -> Result<bool> {
    let config = Config::load()?;
    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to the database")?;

    match command {
        Command::Backup => {
            let storage = Storage::new(StorageConfig::from_env()?).await?;
            let summary = backup::backup_all(&pool, &storage).await;
            print_json(&summary)?;
            Ok(summary.is_success())
        },
        Command::Restore { table } => {
            let storage = Storage::new(StorageConfig::from_env()?).await?;
            let report = backup::restore_table(&pool, &storage, table).await?;
            print_json(&report)?;
            Ok(true)
        },
        Command::Migrate => {
            let storage = Storage::new(StorageConfig::migration_from_env()?).await?;
            let summary = migration::migrate(&pool, &storage).await?;
            print_json(&summary)?;
            Ok(true)
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
