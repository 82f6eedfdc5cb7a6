use sha2::{Digest, Sha256};
use std::borrow::Cow;

/// One period's full filer listing, exactly as published by the feed
///
/// The raw bytes are kept so the cached baseline is byte-identical to what
/// was fetched. Diffing works on a lossy UTF-8 view of the content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    content: Vec<u8>,
}

impl Snapshot {
    /// Wrap raw snapshot bytes
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// The empty snapshot, used as the baseline before the first commit
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// Text view of the content; invalid UTF-8 sequences are replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Number of lines, terminators excluded
    pub fn line_count(&self) -> usize {
        self.text().lines().count()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// SHA-256 of the raw content, hex-encoded (64 chars)
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.content);
        hex::encode(hasher.finalize())
    }
}

impl From<&str> for Snapshot {
    fn from(value: &str) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}

impl From<String> for Snapshot {
    fn from(value: String) -> Self {
        Self::from_bytes(value.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable_and_content_addressed() {
        let a = Snapshot::from("Smith John 01/02/2024 20240001234\n");
        let b = Snapshot::from("Smith John 01/02/2024 20240001234\n");
        let c = Snapshot::from("Smith John 01/02/2024 20240001235\n");

        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_lossy_text_view() {
        let snapshot = Snapshot::from_bytes(vec![b'O', 0xff, b'K']);
        assert_eq!(snapshot.text(), "O\u{fffd}K");
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_empty() {
        assert!(Snapshot::empty().is_empty());
        assert_eq!(Snapshot::empty(), Snapshot::from(""));
    }
}
