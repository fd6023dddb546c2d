//! Schema version tags recorded on a world after data migrations.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Version of the persisted data schema.
///
/// Versions are date-like numbers (`230417.2`, `230501`); a fractional part
/// orders same-day revisions. Always finite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SchemaVersion(f64);

impl SchemaVersion {
    /// The version of a world that has never been migrated.
    pub const UNSET: SchemaVersion = SchemaVersion(0.0);

    pub fn new(value: f64) -> Result<Self, DomainError> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(DomainError::validation(format!(
                "schema version must be a finite, non-negative number, got {}",
                value
            )))
        }
    }

    /// Build a version from a compile-time constant such as `230501.0`.
    pub const fn from_const(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_unset(&self) -> bool {
        self.0 == 0.0
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::UNSET
    }
}

impl PartialEq for SchemaVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SchemaVersion {}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl TryFrom<f64> for SchemaVersion {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SchemaVersion> for f64 {
    fn from(value: SchemaVersion) -> Self {
        value.0
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SchemaVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<f64>()
            .map_err(|e| DomainError::parse(format!("Invalid schema version '{}': {}", s, e)))?;
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_fractional_revisions() {
        let a = SchemaVersion::from_const(230417.0);
        let b = SchemaVersion::from_const(230417.2);
        let c = SchemaVersion::from_const(230500.0);
        assert!(a < b && b < c);
        let mut versions = vec![c, a, b];
        versions.sort();
        assert_eq!(versions, vec![a, b, c]);
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(SchemaVersion::new(f64::NAN).is_err());
        assert!(SchemaVersion::new(f64::INFINITY).is_err());
        assert!(SchemaVersion::new(-1.0).is_err());
        assert!(serde_json::from_str::<SchemaVersion>("-3").is_err());
    }

    #[test]
    fn parses_and_serializes_as_number() {
        let version: SchemaVersion = "230417.2".parse().expect("valid version");
        assert_eq!(serde_json::to_string(&version).expect("serialize"), "230417.2");
        assert!(SchemaVersion::default().is_unset());
    }
}
