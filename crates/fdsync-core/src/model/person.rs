use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned person identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub i64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A filer identity in the relational store
///
/// Identity is fuzzy: a filing row resolves to this person when the stored
/// `first_name` contains the row's first name and `last_name` is equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: PersonId,
    pub first_name: String,
    pub last_name: String,
}

/// Association between a filing document, its filer and the document URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonLink {
    pub doc_id: String,
    pub person_id: PersonId,
    pub url: String,
}
