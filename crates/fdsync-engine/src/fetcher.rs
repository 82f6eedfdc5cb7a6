//! Feed snapshot fetcher
//!
//! The feed is published as `{base}/{YYYY}FD.ZIP`, an archive holding the
//! tab-separated listing `{YYYY}FD.txt` alongside an XML rendition that the
//! pipeline does not use.

#![allow(clippy::result_large_err)]

use fdsync_core::errors::{ExError, ExErrorKind, Result};
use fdsync_core::{Period, Snapshot};
use std::io::{Cursor, Read};
use std::time::Duration;

/// Source of the current full feed snapshot for a period
pub trait SnapshotFetcher {
    /// Fetch the current snapshot. Mutates no pipeline state.
    ///
    /// # Errors
    ///
    /// `FetchFailed`, `ArchiveLayout` or `MissingMember`.
    fn fetch(&self, period: Period) -> Result<Snapshot>;
}

/// Blocking HTTP fetcher for the zipped feed
pub struct HttpArchiveFetcher {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpArchiveFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ExError::new(ExErrorKind::FetchFailed)
                    .with_op("fetcher_new")
                    .with_message(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn archive_url(&self, period: Period) -> String {
        format!("{}/{}FD.ZIP", self.base_url.trim_end_matches('/'), period)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_failed = |reason: String| {
            ExError::new(ExErrorKind::FetchFailed)
                .with_op("fetch_snapshot")
                .with_entity_id(url)
                .with_message(reason)
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_failed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_failed(format!("unexpected HTTP status {}", status)));
        }

        let body = response
            .bytes()
            .map_err(|e| fetch_failed(format!("failed reading response body: {}", e)))?;
        Ok(body.to_vec())
    }
}

impl SnapshotFetcher for HttpArchiveFetcher {
    fn fetch(&self, period: Period) -> Result<Snapshot> {
        let url = self.archive_url(period);
        tracing::debug!(url = %url, period = %period, "Downloading feed archive");

        let archive = self.download(&url)?;
        let content = extract_member(&archive, &listing_member(period))?;

        tracing::info!(
            period = %period,
            archive_bytes = archive.len(),
            snapshot_bytes = content.len(),
            "Fetched feed snapshot"
        );
        Ok(Snapshot::from_bytes(content))
    }
}

/// Name of the text listing inside the archive for `period`
pub fn listing_member(period: Period) -> String {
    format!("{}FD.txt", period)
}

/// Read one member out of a zip archive held in memory.
///
/// # Errors
///
/// `ArchiveLayout` when the bytes are not a readable archive, `MissingMember`
/// when the archive has no member called `member`.
pub fn extract_member(archive: &[u8], member: &str) -> Result<Vec<u8>> {
    let layout = |reason: String| {
        ExError::new(ExErrorKind::ArchiveLayout)
            .with_op("extract_member")
            .with_entity_id(member)
            .with_message(reason)
    };

    let mut zip = zip::ZipArchive::new(Cursor::new(archive))
        .map_err(|e| layout(format!("not a readable archive: {}", e)))?;

    let mut file = match zip.by_name(member) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ExError::new(ExErrorKind::MissingMember)
                .with_op("extract_member")
                .with_entity_id(member)
                .with_message("archive does not contain the expected listing"))
        }
        Err(e) => return Err(layout(e.to_string())),
    };

    let mut content = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut content)
        .map_err(|e| layout(format!("failed to decompress member: {}", e)))?;
    Ok(content)
}
