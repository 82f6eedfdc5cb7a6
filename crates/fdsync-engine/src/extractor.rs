//! Transaction extraction seam
//!
//! Parsing the filing PDFs into transaction rows is done by an external
//! service. The pipeline only hands it `(date, doc_id)` keys and appends
//! whatever rows come back.

#![allow(clippy::result_large_err)]

use fdsync_core::errors::{ExError, ExErrorKind, Result};
use fdsync_core::{FilingKey, TransactionRecord};
use std::time::Duration;

/// External producer of transaction rows for a batch of filings
pub trait TransactionExtractor {
    /// Extract transaction rows for `keys`. Called at most once per run.
    ///
    /// # Errors
    ///
    /// `ExternalService` when the collaborator fails; the run aborts.
    fn extract(&self, keys: &[FilingKey]) -> Result<Vec<TransactionRecord>>;
}

/// Extraction service reached over HTTP: POST a JSON array of keys, receive
/// a JSON array of records.
pub struct HttpTransactionExtractor {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTransactionExtractor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ExError::new(ExErrorKind::ExternalService)
                    .with_op("extractor_new")
                    .with_message(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl TransactionExtractor for HttpTransactionExtractor {
    fn extract(&self, keys: &[FilingKey]) -> Result<Vec<TransactionRecord>> {
        let service_error = |reason: String| {
            ExError::new(ExErrorKind::ExternalService)
                .with_op("extract_transactions")
                .with_entity_id(self.endpoint.clone())
                .with_message(reason)
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(keys)
            .send()
            .map_err(|e| service_error(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(service_error(format!("unexpected HTTP status {}", status)));
        }

        response
            .json::<Vec<TransactionRecord>>()
            .map_err(|e| service_error(format!("malformed response body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let keys = vec![FilingKey {
            date: "01/02/2024".to_string(),
            doc_id: "20240001234".to_string(),
        }];
        let body = serde_json::to_value(&keys).unwrap();
        assert_eq!(
            body,
            serde_json::json!([{"date": "01/02/2024", "doc_id": "20240001234"}])
        );
    }

    #[test]
    fn test_unreachable_service_is_external_service_error() {
        let extractor =
            HttpTransactionExtractor::new("http://127.0.0.1:1/extract", Duration::from_millis(500))
                .unwrap();
        let keys = vec![FilingKey {
            date: "01/02/2024".to_string(),
            doc_id: "20240001234".to_string(),
        }];

        let err = extractor.extract(&keys).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::ExternalService);
        assert_eq!(err.class().as_str(), "ingest");
    }
}
