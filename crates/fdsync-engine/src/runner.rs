//! Pipeline run orchestration.
//!
//! ## Run sequence (in order):
//! 1. Acquire the run lock for the cache key (`RunLocked` if held)
//! 2. Fetching: download the current feed snapshot
//! 3. Diffing: read the baseline (absent = empty) and extract filing rows
//! 4. Linking: resolve and link each row in its own transaction
//! 5. Ingesting: one extraction call and one bulk append for the batch
//! 6. Committing: advance the baseline to the fetched snapshot
//!
//! The lease is re-checked inside the bulk append transaction and again
//! before the commit; a run that lost its lock fails with `RunLocked`.
//! The deadline is checked before every step. The lock is always released
//! and the run ledger always finalized, whatever the outcome. The baseline
//! only moves in step 6, so any earlier failure leaves the next run to
//! re-derive the same rows.

#![allow(clippy::result_large_err)]

use crate::config::PipelineConfig;
use crate::extractor::TransactionExtractor;
use crate::fetcher::SnapshotFetcher;
use crate::ingest::{IngestOutcome, TransactionIngestor};
use crate::resolver::PersonResolver;
use fdsync_core::diff::{extract_filings_with_budget, DiffStrategy, DEFAULT_MAX_EDITS};
use fdsync_core::errors::{ExError, ExErrorKind, Result};
use fdsync_core::schema::{EVENT_SKIP, EVENT_TRANSITION};
use fdsync_core::{log_op_end, log_op_error, log_op_start, FilingKey, FilingRow, Period, Snapshot};
use fdsync_core_types::{RunContext, RunId};
use fdsync_store::cache::SnapshotCache;
use fdsync_store::run_ledger::{self, RunCounts};
use fdsync_store::run_lock::{self, RunLease};
use rusqlite::Connection;
use std::fmt;
use std::time::{Duration, Instant};

/// Pipeline state; a run walks these in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Diffing,
    Linking,
    Ingesting,
    Committing,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "Idle",
            RunState::Fetching => "Fetching",
            RunState::Diffing => "Diffing",
            RunState::Linking => "Linking",
            RunState::Ingesting => "Ingesting",
            RunState::Committing => "Committing",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub period: Period,
    pub document_base_url: String,
    /// Wall-clock budget for the whole run, checked between steps
    pub run_timeout: Duration,
    pub lock_ttl: Duration,
    /// Diff edit budget before the multiset fallback
    pub max_edits: usize,
}

impl RunOptions {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            document_base_url: fdsync_core::diff::DEFAULT_DOCUMENT_BASE_URL.to_string(),
            run_timeout: Duration::from_secs(1800),
            lock_ttl: Duration::from_secs(3600),
            max_edits: DEFAULT_MAX_EDITS,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            period: config.effective_period(),
            document_base_url: config.document_base_url.clone(),
            run_timeout: config.run_timeout,
            lock_ttl: config.lock_ttl,
            max_edits: DEFAULT_MAX_EDITS,
        }
    }
}

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: RunId,
    pub period: Period,
    /// Every state entered, starting and ending with `Idle`
    pub states: Vec<RunState>,
    /// Fetched snapshot was byte-identical to the baseline
    pub unchanged: bool,
    /// Digest of the committed baseline
    pub snapshot_digest: String,
    pub diff_strategy: Option<DiffStrategy>,
    pub added_lines: usize,
    /// Added lines that were not filing records
    pub lines_skipped: usize,
    /// Rows dropped for repeating a doc_id within this diff
    pub duplicate_rows: usize,
    pub rows_extracted: usize,
    pub rows_linked: usize,
    pub persons_created: usize,
    /// Rows whose document an earlier run had already linked
    pub links_skipped: usize,
    pub ingest: IngestOutcome,
}

impl RunReport {
    fn new(run_id: RunId, period: Period) -> Self {
        Self {
            run_id,
            period,
            states: vec![RunState::Idle],
            unchanged: false,
            snapshot_digest: String::new(),
            diff_strategy: None,
            added_lines: 0,
            lines_skipped: 0,
            duplicate_rows: 0,
            rows_extracted: 0,
            rows_linked: 0,
            persons_created: 0,
            links_skipped: 0,
            ingest: IngestOutcome::default(),
        }
    }

    pub fn counts(&self) -> RunCounts {
        RunCounts {
            rows_extracted: self.rows_extracted as u64,
            rows_linked: self.rows_linked as u64,
            rows_skipped: self.links_skipped as u64,
            records_appended: self.ingest.appended as u64,
        }
    }
}

/// Drives one run of the pipeline against its collaborators
pub struct PipelineRunner<'a> {
    conn: &'a mut Connection,
    fetcher: &'a dyn SnapshotFetcher,
    cache: &'a dyn SnapshotCache,
    extractor: &'a dyn TransactionExtractor,
}

impl<'a> PipelineRunner<'a> {
    /// `conn` must be migrated; it holds persons, links, records, the run
    /// lock and the ledger.
    pub fn new(
        conn: &'a mut Connection,
        fetcher: &'a dyn SnapshotFetcher,
        cache: &'a dyn SnapshotCache,
        extractor: &'a dyn TransactionExtractor,
    ) -> Self {
        Self {
            conn,
            fetcher,
            cache,
            extractor,
        }
    }

    /// Execute one run.
    ///
    /// # Errors
    ///
    /// `RunLocked` if another run holds the lock, `Timeout` if the deadline
    /// expires between steps, otherwise the first fatal error of the step
    /// that failed. The baseline is advanced only on `Ok`.
    pub fn run(&mut self, ctx: &RunContext, options: &RunOptions) -> Result<RunReport> {
        let start = Instant::now();
        let deadline = start + options.run_timeout;
        let run_id = ctx.run_id.as_str().to_string();
        let period = options.period.to_string();
        let cache_key = self.cache.key().to_string();

        log_op_start!(
            "pipeline_run",
            run_id = %run_id,
            trace_id = ctx.trace_id.as_ref().map(|t| t.as_str()),
            period = %period,
            cache_key = %cache_key
        );

        let lease = match run_lock::acquire(self.conn, &cache_key, &run_id, options.lock_ttl) {
            Ok(lease) => lease,
            Err(err) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                log_op_error!("pipeline_run", err, duration_ms = duration_ms, run_id = %run_id);
                return Err(err);
            }
        };

        let mut report = RunReport::new(ctx.run_id.clone(), options.period);
        let result = run_ledger::record_start(self.conn, &run_id, &period, &cache_key)
            .and_then(|()| self.execute(&mut report, options, &lease, deadline));

        let final_state = report.states.last().copied().unwrap_or(RunState::Idle);

        if let Err(err) = run_lock::release(self.conn, lease) {
            log_op_error!("run_lock_release", err, duration_ms = 0u64, run_id = %run_id);
        }
        if let Err(err) = run_ledger::record_finish(
            self.conn,
            &run_id,
            final_state.as_str(),
            report.counts(),
            result.as_ref().err(),
        ) {
            log_op_error!("ledger_finish", err, duration_ms = 0u64, run_id = %run_id);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(()) => {
                log_op_end!(
                    "pipeline_run",
                    duration_ms = duration_ms,
                    run_id = %run_id,
                    rows = report.rows_extracted,
                    skipped = report.links_skipped,
                    records = report.ingest.appended,
                    unchanged = report.unchanged
                );
                Ok(report)
            }
            Err(err) => {
                log_op_error!(
                    "pipeline_run",
                    err,
                    duration_ms = duration_ms,
                    run_id = %run_id,
                    state = final_state.as_str()
                );
                Err(err)
            }
        }
    }

    fn execute(
        &mut self,
        report: &mut RunReport,
        options: &RunOptions,
        lease: &RunLease,
        deadline: Instant,
    ) -> Result<()> {
        enter(report, RunState::Fetching, deadline)?;
        let new = self.fetcher.fetch(options.period)?;
        report.snapshot_digest = new.digest();

        enter(report, RunState::Diffing, deadline)?;
        let old = match self.cache.read()? {
            Some(baseline) => baseline,
            None => {
                tracing::info!(
                    cache_key = self.cache.key(),
                    "No baseline cached, every feed line counts as added"
                );
                Snapshot::empty()
            }
        };
        report.unchanged = old == new;

        let extraction = extract_filings_with_budget(
            &old,
            &new,
            &options.document_base_url,
            options.max_edits,
        );
        report.diff_strategy = Some(extraction.strategy);
        report.added_lines = extraction.added_lines;
        report.lines_skipped = extraction.skipped.len();
        report.duplicate_rows = extraction.duplicates;
        report.rows_extracted = extraction.rows.len();
        tracing::info!(
            run_id = %report.run_id,
            added_lines = extraction.added_lines,
            rows = extraction.rows.len(),
            skipped = extraction.skipped.len(),
            duplicates = extraction.duplicates,
            strategy = ?extraction.strategy,
            "Extracted filing rows"
        );

        if !report.unchanged {
            enter(report, RunState::Linking, deadline)?;
            self.link_rows(report, &extraction.rows)?;

            enter(report, RunState::Ingesting, deadline)?;
            let keys: Vec<FilingKey> = extraction.rows.iter().map(FilingRow::key).collect();
            report.ingest = TransactionIngestor::new(self.extractor)
                .with_lease(lease)
                .ingest(self.conn, &keys)?;
            tracing::info!(
                run_id = %report.run_id,
                requested = report.ingest.requested,
                already_ingested = report.ingest.already_ingested,
                records = report.ingest.appended,
                "Ingested transactions"
            );
        }

        enter(report, RunState::Committing, deadline)?;
        run_lock::ensure_held(self.conn, lease)?;
        self.commit_baseline(&new)?;

        report.states.push(RunState::Idle);
        Ok(())
    }

    fn link_rows(&mut self, report: &mut RunReport, rows: &[FilingRow]) -> Result<()> {
        for row in rows {
            match PersonResolver::resolve_and_link(self.conn, row) {
                Ok(resolution) => {
                    report.rows_linked += 1;
                    if resolution.created {
                        report.persons_created += 1;
                    }
                    tracing::debug!(
                        doc_id = %row.doc_id,
                        person_id = %resolution.person_id,
                        created = resolution.created,
                        "Linked filing to person"
                    );
                }
                Err(err) if err.is_row_recoverable() => {
                    report.links_skipped += 1;
                    tracing::warn!(
                        event = EVENT_SKIP,
                        doc_id = %row.doc_id,
                        err.kind = ?err.kind(),
                        err.code = err.code(),
                        err.class = err.class().as_str(),
                        "Document already linked, row skipped"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn commit_baseline(&self, new: &Snapshot) -> Result<()> {
        let start = Instant::now();
        self.cache.commit(new).map_err(|err| {
            let err = if err.kind() == ExErrorKind::CommitFailed {
                err
            } else {
                ExError::new(ExErrorKind::CommitFailed)
                    .with_op("cache_commit")
                    .with_entity_id(self.cache.key())
                    .with_source(err)
            };
            log_op_error!(
                "cache_commit",
                err,
                duration_ms = start.elapsed().as_millis() as u64,
                cache_key = self.cache.key(),
                digest = %new.digest()
            );
            err
        })
    }
}

/// Check the deadline, then record and log the transition into `state`
fn enter(report: &mut RunReport, state: RunState, deadline: Instant) -> Result<()> {
    if Instant::now() >= deadline {
        return Err(ExError::new(ExErrorKind::Timeout)
            .with_op("pipeline_run")
            .with_entity_id(report.run_id.as_str())
            .with_message(format!("run deadline expired before {}", state)));
    }

    report.states.push(state);
    tracing::info!(
        event = EVENT_TRANSITION,
        run_id = %report.run_id,
        state = state.as_str(),
        "Pipeline state transition"
    );
    Ok(())
}
