//! Run ledger listing

use clap::Args;
use fdsync_engine::PipelineConfig;
use fdsync_store::{db, run_ledger};

#[derive(Debug, Args)]
pub struct RunsArgs {
    /// Maximum number of runs to show
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

pub fn execute(args: RunsArgs, config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let conn = db::open_migrated(&config.database_path)?;
    let runs = run_ledger::recent_runs(&conn, args.limit)?;

    if runs.is_empty() {
        println!("No runs recorded");
        return Ok(());
    }

    for run in runs {
        let started = chrono::DateTime::from_timestamp_millis(run.started_at)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| run.started_at.to_string());
        println!(
            "{} {} period={} state={} filings={} linked={} skipped={} records={}{}",
            started,
            run.outcome,
            run.period,
            run.final_state.as_deref().unwrap_or("-"),
            run.counts.rows_extracted,
            run.counts.rows_linked,
            run.counts.rows_skipped,
            run.counts.records_appended,
            run.error_code
                .map(|code| format!(" error={}", code))
                .unwrap_or_default(),
        );
    }

    Ok(())
}
