use serde::{Deserialize, Serialize};

/// One transaction row produced by the external extraction service
///
/// Only `date` and `doc_id` are meaningful to the pipeline; everything else
/// is passed through to the `record` table as returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub doc_id: String,
    pub date: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
}

impl TransactionRecord {
    /// A record carrying only the two input keys
    pub fn new(doc_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            date: date.into(),
            owner: None,
            transaction_date: None,
            ticker: None,
            company: None,
            transaction_type: None,
            amount: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_record() {
        let record: TransactionRecord =
            serde_json::from_str(r#"{"doc_id":"20240001234","date":"01/02/2024"}"#).unwrap();
        assert_eq!(record, TransactionRecord::new("20240001234", "01/02/2024"));
    }

    #[test]
    fn test_deserialize_full_record() {
        let record: TransactionRecord = serde_json::from_str(
            r#"{"doc_id":"20240001234","date":"01/02/2024","owner":"SP",
                "transaction_date":"12/20/2023","ticker":"BABA",
                "company":"ALIBABA GROUP","transaction_type":"P",
                "amount":"$1,001 - $15,000"}"#,
        )
        .unwrap();
        assert_eq!(record.ticker.as_deref(), Some("BABA"));
        assert_eq!(record.amount.as_deref(), Some("$1,001 - $15,000"));
    }
}
