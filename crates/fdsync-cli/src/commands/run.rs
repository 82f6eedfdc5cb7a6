//! Pipeline run command

use clap::Args;
use fdsync_core::Period;
use fdsync_core_types::RunContext;
use fdsync_engine::{
    HttpArchiveFetcher, HttpTransactionExtractor, PipelineConfig, PipelineRunner, RunOptions,
};
use fdsync_store::db;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Feed period (four-digit year); defaults to the configured or current year
    #[arg(long, value_parser = parse_period)]
    pub period: Option<Period>,
}

fn parse_period(value: &str) -> Result<Period, String> {
    value.parse::<Period>().map_err(|e| e.message().to_string())
}

pub fn execute(args: RunArgs, config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = RunOptions::from_config(config);
    if let Some(period) = args.period {
        options.period = period;
    }

    let mut conn = db::open_migrated(&config.database_path)?;
    let cache = config.open_cache()?;
    let fetcher = HttpArchiveFetcher::new(config.feed_base_url.clone(), config.http_timeout)?;
    let extractor =
        HttpTransactionExtractor::new(config.extractor_url.clone(), config.http_timeout)?;

    let ctx = RunContext::new();
    let report =
        PipelineRunner::new(&mut conn, &fetcher, cache.as_ref(), &extractor).run(&ctx, &options)?;

    println!("Run completed:");
    println!("  run_id: {}", report.run_id);
    println!("  period: {}", report.period);
    if report.unchanged {
        println!("  (feed unchanged since last run)");
    }
    println!("  added_lines: {}", report.added_lines);
    println!("  filings: {}", report.rows_extracted);
    println!("  linked: {}", report.rows_linked);
    println!("  persons_created: {}", report.persons_created);
    println!("  already_linked: {}", report.links_skipped);
    println!("  records_appended: {}", report.ingest.appended);
    println!("  baseline_digest: {}", report.snapshot_digest);

    Ok(())
}
