//! fdsync Engine - Orchestration layer
//!
//! Coordinates the feed fetcher, the diff extractor, person resolution,
//! transaction ingestion and the baseline commit into one pipeline run.

pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod ingest;
pub mod resolver;
pub mod runner;

pub use config::{CacheBackend, ConfigError, PipelineConfig};
pub use extractor::{HttpTransactionExtractor, TransactionExtractor};
pub use fetcher::{HttpArchiveFetcher, SnapshotFetcher};
pub use ingest::{IngestOutcome, TransactionIngestor};
pub use resolver::{PersonResolver, Resolution};
pub use runner::{PipelineRunner, RunOptions, RunReport, RunState};
