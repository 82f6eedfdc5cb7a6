use serde::{Deserialize, Serialize};

/// One structured filing entry extracted from a line added to the feed
///
/// `doc_id` is the natural key. `url` is derived from `date` and `doc_id`
/// and points at the filing's PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRow {
    pub first_name: String,
    pub last_name: String,
    /// Filing date as printed in the feed (`MM/DD/YYYY`)
    pub date: String,
    pub doc_id: String,
    pub url: String,
}

impl FilingRow {
    /// The `(date, doc_id)` pair handed to the transaction extractor
    pub fn key(&self) -> FilingKey {
        FilingKey {
            date: self.date.clone(),
            doc_id: self.doc_id.clone(),
        }
    }
}

/// Input key for transaction extraction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilingKey {
    pub date: String,
    pub doc_id: String,
}
