//! Baseline cache commands

use clap::{Args, Subcommand};
use fdsync_engine::PipelineConfig;

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show the stored baseline
    Show,
    /// Delete the stored baseline; the next run treats the whole feed as new
    Clear,
}

pub fn execute(args: CacheArgs, config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cache = config.open_cache()?;

    match args.command {
        CacheCommand::Show => match cache.read()? {
            Some(snapshot) => {
                println!("Baseline {}:", cache.key());
                println!("  bytes: {}", snapshot.len());
                println!("  lines: {}", snapshot.line_count());
                println!("  digest: {}", snapshot.digest());
            }
            None => println!("No baseline stored under {}", cache.key()),
        },
        CacheCommand::Clear => {
            cache.clear()?;
            println!("Baseline {} cleared", cache.key());
        }
    }

    Ok(())
}
