//! Pipeline configuration
//!
//! Built-in defaults overlaid by `FDSYNC_*` environment variables. A `.env`
//! file in the working directory, if present, is loaded into the process
//! environment first.

#![allow(clippy::result_large_err)]

use config::{Config, Environment};
use fdsync_core::errors::{ExError, ExErrorKind};
use fdsync_core::logging_facility::Profile;
use fdsync_core::Period;
use fdsync_core_types::Sensitive;
use fdsync_store::cache::{
    RedisSnapshotCache, SnapshotCache, SqliteSnapshotCache, DEFAULT_CACHE_KEY,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_PREFIX: &str = "FDSYNC";
pub const DEFAULT_FEED_BASE_URL: &str =
    "https://disclosures-clerk.house.gov/public_disc/financial-pdfs";
pub const DEFAULT_EXTRACTOR_URL: &str = "http://127.0.0.1:8000/extract";

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("{key} is required when {condition}")]
    Missing {
        key: &'static str,
        condition: &'static str,
    },
}

impl From<ConfigError> for ExError {
    fn from(err: ConfigError) -> Self {
        let entity = match &err {
            ConfigError::Invalid { key, .. } | ConfigError::Missing { key, .. } => Some(*key),
            _ => None,
        };
        let ex = ExError::new(ExErrorKind::Config)
            .with_op("load_config")
            .with_message(err.to_string());
        match entity {
            Some(key) => ex.with_entity_id(key),
            None => ex,
        }
    }
}

/// Where the baseline snapshot lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// The `snapshot_cache` table of the pipeline database
    Sqlite,
    Redis,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database_path: PathBuf,
    pub cache_backend: CacheBackend,
    pub redis_url: Option<Sensitive<String>>,
    pub cache_key: String,
    pub feed_base_url: String,
    pub document_base_url: String,
    pub extractor_url: String,
    pub http_timeout: Duration,
    pub run_timeout: Duration,
    /// Must cover a whole run including one overrunning step
    pub lock_ttl: Duration,
    /// Overrides the current calendar year
    pub period: Option<Period>,
    pub log_profile: Profile,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    database_path: String,
    cache_backend: String,
    redis_url: Option<Sensitive<String>>,
    cache_key: String,
    feed_base_url: String,
    document_base_url: String,
    extractor_url: String,
    http_timeout_secs: u64,
    run_timeout_secs: u64,
    lock_ttl_secs: u64,
    period: Option<String>,
    log_profile: String,
}

impl PipelineConfig {
    /// Load `.env` (if any) and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err.into()),
        }
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an explicit variable map instead of the process environment
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_environment(Environment::with_prefix(ENV_PREFIX).source(Some(map)))
    }

    fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        let raw: RawConfig = Config::builder()
            .set_default("database_path", "fdsync.db")?
            .set_default("cache_backend", "sqlite")?
            .set_default("cache_key", DEFAULT_CACHE_KEY)?
            .set_default("feed_base_url", DEFAULT_FEED_BASE_URL)?
            .set_default(
                "document_base_url",
                fdsync_core::diff::DEFAULT_DOCUMENT_BASE_URL,
            )?
            .set_default("extractor_url", DEFAULT_EXTRACTOR_URL)?
            .set_default("http_timeout_secs", 60)?
            .set_default("run_timeout_secs", 1800)?
            .set_default("lock_ttl_secs", 3600)?
            .set_default("log_profile", "production")?
            .add_source(env)
            .build()?
            .try_deserialize()?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let cache_backend = match raw.cache_backend.trim().to_ascii_lowercase().as_str() {
            "sqlite" => CacheBackend::Sqlite,
            "redis" => CacheBackend::Redis,
            other => {
                return Err(ConfigError::Invalid {
                    key: "cache_backend",
                    reason: format!("expected sqlite or redis, got {:?}", other),
                })
            }
        };

        let redis_url = raw.redis_url.filter(|url| !url.expose().trim().is_empty());
        if cache_backend == CacheBackend::Redis && redis_url.is_none() {
            return Err(ConfigError::Missing {
                key: "redis_url",
                condition: "cache_backend is redis",
            });
        }

        if raw.cache_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "cache_key",
                reason: "must not be empty".to_string(),
            });
        }

        for (key, value) in [
            ("http_timeout_secs", raw.http_timeout_secs),
            ("run_timeout_secs", raw.run_timeout_secs),
            ("lock_ttl_secs", raw.lock_ttl_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        // The deadline is only checked between steps, and a step can block on
        // one fetch and one extractor call past it.
        let min_lock_ttl = raw
            .run_timeout_secs
            .saturating_add(raw.http_timeout_secs.saturating_mul(2));
        if raw.lock_ttl_secs < min_lock_ttl {
            return Err(ConfigError::Invalid {
                key: "lock_ttl_secs",
                reason: format!(
                    "must be at least run_timeout_secs + 2 * http_timeout_secs ({})",
                    min_lock_ttl
                ),
            });
        }

        let period = match raw.period.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(value.parse::<Period>().map_err(|e| ConfigError::Invalid {
                key: "period",
                reason: e.message().to_string(),
            })?),
        };

        Ok(Self {
            database_path: PathBuf::from(raw.database_path),
            cache_backend,
            redis_url,
            cache_key: raw.cache_key,
            feed_base_url: raw.feed_base_url,
            document_base_url: raw.document_base_url,
            extractor_url: raw.extractor_url,
            http_timeout: Duration::from_secs(raw.http_timeout_secs),
            run_timeout: Duration::from_secs(raw.run_timeout_secs),
            lock_ttl: Duration::from_secs(raw.lock_ttl_secs),
            period,
            log_profile: Profile::parse(&raw.log_profile),
        })
    }

    /// The configured period, or the current year
    pub fn effective_period(&self) -> Period {
        self.period.unwrap_or_else(Period::current)
    }

    /// Open the configured baseline cache
    pub fn open_cache(&self) -> fdsync_core::Result<Box<dyn SnapshotCache>> {
        match self.cache_backend {
            CacheBackend::Sqlite => Ok(Box::new(SqliteSnapshotCache::open(
                &self.database_path,
                self.cache_key.clone(),
            )?)),
            CacheBackend::Redis => {
                let url = self.redis_url.as_ref().ok_or_else(|| {
                    ExError::from(ConfigError::Missing {
                        key: "redis_url",
                        condition: "cache_backend is redis",
                    })
                })?;
                Ok(Box::new(RedisSnapshotCache::open(
                    url.expose(),
                    self.cache_key.clone(),
                    self.http_timeout,
                )?))
            }
        }
    }
}
