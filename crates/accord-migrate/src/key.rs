//! Migration keys.
//!
//! Every migration is identified by a key of the form
//! `YYYYMMDDHHMMSS_slug`: a 14-digit UTC timestamp prefix and a snake_case
//! slug. Keys order lexicographically, and because the timestamp is
//! fixed-width, lexicographic order is chronological order. That single
//! property is what the whole ledger leans on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MigrationError;

/// Identifier of a single migration.
///
/// Construct via [`FromStr`] or [`MigrationKey::new`]; both enforce the
/// `YYYYMMDDHHMMSS_slug` shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MigrationKey(String);

const TIMESTAMP_LEN: usize = 14;

impl MigrationKey {
    /// Parses a key, validating its shape.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::InvalidKey`] when the value is not a
    /// 14-digit timestamp, an underscore, and a non-empty
    /// `[a-z0-9_]` slug.
    pub fn new(value: impl Into<String>) -> Result<Self, MigrationError> {
        let value = value.into();
        Self::check(&value)?;
        Ok(Self(value))
    }

    fn check(value: &str) -> Result<(), MigrationError> {
        let invalid = |reason: &'static str| MigrationError::InvalidKey {
            value: value.to_string(),
            reason,
        };

        if value.len() < TIMESTAMP_LEN + 2 {
            return Err(invalid("expected `YYYYMMDDHHMMSS_slug`"));
        }
        let (timestamp, rest) = value.split_at(TIMESTAMP_LEN);
        if !timestamp.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("timestamp prefix must be 14 digits"));
        }
        let Some(slug) = rest.strip_prefix('_') else {
            return Err(invalid("expected `_` after the timestamp"));
        };
        if slug.is_empty() {
            return Err(invalid("slug must not be empty"));
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(invalid("slug may only contain `a-z`, `0-9`, and `_`"));
        }
        Ok(())
    }

    /// Returns the full key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the 14-digit timestamp prefix.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.0[..TIMESTAMP_LEN]
    }

    /// Returns the slug after the timestamp.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.0[TIMESTAMP_LEN + 1..]
    }
}

impl fmt::Display for MigrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MigrationKey {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for MigrationKey {
    type Error = MigrationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MigrationKey> for String {
    fn from(key: MigrationKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_key_parses() {
        let key: MigrationKey = "20240101120000_create_notes".parse().unwrap();
        assert_eq!(key.timestamp(), "20240101120000");
        assert_eq!(key.slug(), "create_notes");
        assert_eq!(key.to_string(), "20240101120000_create_notes");
    }

    #[test]
    fn test_rejects_short_timestamp() {
        assert!("2024_create".parse::<MigrationKey>().is_err());
    }

    #[test]
    fn test_rejects_non_digit_timestamp() {
        assert!("2024010112000x_create".parse::<MigrationKey>().is_err());
    }

    #[test]
    fn test_rejects_missing_separator() {
        assert!("20240101120000create".parse::<MigrationKey>().is_err());
    }

    #[test]
    fn test_rejects_empty_slug() {
        assert!("20240101120000_".parse::<MigrationKey>().is_err());
    }

    #[test]
    fn test_rejects_uppercase_slug() {
        assert!("20240101120000_CreateNotes".parse::<MigrationKey>().is_err());
    }

    #[test]
    fn test_keys_order_chronologically() {
        let earlier: MigrationKey = "20240101120000_b".parse().unwrap();
        let later: MigrationKey = "20240102000000_a".parse().unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn test_same_timestamp_orders_by_slug() {
        let a: MigrationKey = "20240101120000_alpha".parse().unwrap();
        let b: MigrationKey = "20240101120000_beta".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_serde_round_trip_as_string() {
        let key: MigrationKey = "20240101120000_create_notes".parse().unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"20240101120000_create_notes\"");
        let back: MigrationKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_serde_rejects_malformed_string() {
        assert!(serde_json::from_str::<MigrationKey>("\"not-a-key\"").is_err());
    }
}
