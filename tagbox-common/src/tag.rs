//! Tag identifier parsing and validation
//!
//! Jukebox tags are MIFARE cards provisioned with a 16-digit numeric
//! identifier. [`TagId`] is the validated form; raw reader output stays a
//! plain string until it crosses this boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Number of digits in a provisioned tag identifier
pub const TAG_ID_LEN: usize = 16;

/// A validated 16-digit numeric tag identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagId(String);

impl TagId {
    /// Parse a raw reader string into a validated identifier.
    ///
    /// The raw value must be exactly 16 ASCII digits; leading zeros are
    /// significant and preserved.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() != TAG_ID_LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidTagId(format!(
                "must be numerical and exactly {TAG_ID_LEN} characters in length, got {raw:?}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// The identifier as the bare digit string written on the card
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TagId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for TagId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TagId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TagId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(TagId::parse("0000000000000000").is_ok());
        assert!(TagId::parse("1111111111111111").is_ok());
        assert!(TagId::parse("0123456789012345").is_ok());
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let id = TagId::parse("0000000000000042").unwrap();
        assert_eq!(id.as_str(), "0000000000000042");
        assert_eq!(id.to_string(), "0000000000000042");
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(TagId::parse("").is_err());
        assert!(TagId::parse("123456789012345").is_err()); // 15 digits
        assert!(TagId::parse("12345678901234567").is_err()); // 17 digits
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert!(TagId::parse("123456789012345a").is_err());
        assert!(TagId::parse("12345678 0123456").is_err());
        assert!(TagId::parse("-123456789012345").is_err());
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        // Sixteen characters, all numeric per char::is_numeric, but not ASCII
        assert!(TagId::parse("١٢٣٤٥٦٧٨٩٠١٢٣٤٥٦").is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let id = TagId::parse("1111111111111111").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"1111111111111111\"");
        let back: TagId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        assert!(serde_json::from_str::<TagId>("\"not-a-tag\"").is_err());
    }
}
