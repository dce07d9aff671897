use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^SP-(\d{4})-(\d{6})$").expect("id pattern is valid"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid requisition id {0:?}, expected SP-<year>-<6-digit-sequence>")]
pub struct InvalidRequisitionId(pub String);

/// Identifier of a requisition, formatted `SP-<year>-<6-digit-sequence>`.
///
/// Ids are assigned once at creation and never reused, even after a
/// requisition is deleted. The numeric part restarts at 1 each calendar
/// year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequisitionId(String);

impl RequisitionId {
    pub const PREFIX: &'static str = "SP";
    pub const SEQUENCE_WIDTH: usize = 6;

    /// Builds the id for a (year, sequence) pair.
    pub fn new(year: i32, sequence: u32) -> Self {
        Self(format!(
            "{}-{}-{:0width$}",
            Self::PREFIX,
            year,
            sequence,
            width = Self::SEQUENCE_WIDTH
        ))
    }

    /// Parses and validates an id in its canonical form.
    pub fn parse(value: &str) -> Result<Self, InvalidRequisitionId> {
        if ID_PATTERN.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidRequisitionId(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar year embedded in the id.
    pub fn year(&self) -> i32 {
        let caps = ID_PATTERN.captures(&self.0).expect("id is canonical");
        caps[1].parse().expect("year digits")
    }

    /// Sequence number embedded in the id.
    pub fn sequence(&self) -> u32 {
        let caps = ID_PATTERN.captures(&self.0).expect("id is canonical");
        caps[2].parse().expect("sequence digits")
    }
}

impl fmt::Display for RequisitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RequisitionId {
    type Err = InvalidRequisitionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RequisitionId {
    type Error = InvalidRequisitionId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RequisitionId> for String {
    fn from(id: RequisitionId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_zero_padded() {
        let id = RequisitionId::new(2025, 1);
        assert_eq!(id.as_str(), "SP-2025-000001");
        assert_eq!(id.year(), 2025);
        assert_eq!(id.sequence(), 1);
    }

    #[test]
    fn test_parse_round_trip() {
        let id: RequisitionId = "SP-2026-004217".parse().unwrap();
        assert_eq!(id, RequisitionId::new(2026, 4217));
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        for input in [
            "",
            "SP-2025-1",
            "SP-2025-0000001",
            "XX-2025-000001",
            "SP-25-000001",
            "sp-2025-000001",
            "SP-2025-000001 ",
        ] {
            assert!(RequisitionId::parse(input).is_err(), "{:?}", input);
        }
    }

    #[test]
    fn test_serde_uses_plain_string() {
        let id = RequisitionId::new(2025, 42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"SP-2025-000042\"");
        let back: RequisitionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let bad: Result<RequisitionId, _> = serde_json::from_str("\"SP-2025-42\"");
        assert!(bad.is_err());
    }
}
