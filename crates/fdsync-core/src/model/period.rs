use crate::errors::{ExError, ExErrorKind, Result};
use chrono::Datelike;
use std::fmt;
use std::str::FromStr;

/// Four-digit period identifier (the filing year) that selects the feed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(u16);

impl Period {
    /// Create a period, rejecting anything that is not four digits
    pub fn new(year: u16) -> Result<Self> {
        if !(1000..=9999).contains(&year) {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("period_new")
                .with_entity_id(year.to_string())
                .with_message("period must be a four-digit year"));
        }
        Ok(Self(year))
    }

    /// The current UTC calendar year
    pub fn current() -> Self {
        let year = chrono::Utc::now().year();
        Self(year.clamp(1000, 9999) as u16)
    }

    pub fn year(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl FromStr for Period {
    type Err = ExError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.len() != 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ExError::new(ExErrorKind::InvalidInput)
                .with_op("period_parse")
                .with_entity_id(trimmed)
                .with_message("period must be a four-digit year"));
        }
        let year: u16 = trimmed.parse().map_err(|_| {
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("period_parse")
                .with_entity_id(trimmed)
        })?;
        Self::new(year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_period() {
        let period: Period = "2024".parse().unwrap();
        assert_eq!(period.year(), 2024);
        assert_eq!(period.to_string(), "2024");
    }

    #[test]
    fn test_parse_rejects_non_four_digit() {
        for bad in ["24", "20245", "20a4", "", "0999"] {
            let err = bad.parse::<Period>().unwrap_err();
            assert_eq!(err.kind(), ExErrorKind::InvalidInput, "input {:?}", bad);
        }
    }

    #[test]
    fn test_current_is_four_digits() {
        assert_eq!(Period::current().to_string().len(), 4);
    }
}
