//! fdsync CLI
//!
//! Operator entry point, invoked by an external scheduler

use clap::{Parser, Subcommand};
use fdsync_core::logging_facility;
use fdsync_engine::PipelineConfig;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "fdsync")]
#[command(about = "fdsync - Disclosure feed synchronizer", long_about = None)]
struct Cli {
    /// Database path (overrides FDSYNC_DATABASE_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the pipeline once
    Run(commands::run::RunArgs),
    /// Apply pending schema migrations
    Migrate,
    /// Inspect or reset the baseline snapshot
    Cache(commands::cache::CacheArgs),
    /// List recent pipeline runs
    Runs(commands::runs::RunsArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = PipelineConfig::load()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|mut config| {
            if let Some(db) = cli.db {
                config.database_path = db;
            }
            logging_facility::init(config.log_profile);

            match cli.command {
                Commands::Run(args) => commands::run::execute(args, &config),
                Commands::Migrate => commands::migrate::execute(&config),
                Commands::Cache(args) => commands::cache::execute(args, &config),
                Commands::Runs(args) => commands::runs::execute(args, &config),
            }
        });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
