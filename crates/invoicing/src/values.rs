//! Invoice value objects.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use ledger_core::{DomainError, DomainResult, ValueObject};

/// Upper bound on description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 256;

/// Upper bound on settlement reference length, in bytes.
pub const MAX_SETTLEMENT_REFERENCE_LEN: usize = 128;

/// Bounded, informational invoice text. No other semantic constraints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    pub fn new(text: impl Into<String>) -> DomainResult<Self> {
        let text = text.into();
        let len = text.chars().count();
        if len > MAX_DESCRIPTION_CHARS {
            return Err(DomainError::validation(format!(
                "description is {len} characters, max is {MAX_DESCRIPTION_CHARS}"
            )));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl ValueObject for Description {}

impl TryFrom<String> for Description {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Description> for String {
    fn from(value: Description) -> Self {
        value.0
    }
}

impl core::fmt::Display for Description {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque proof-of-payment token (e.g. an external transaction id).
///
/// Non-empty and at most [`MAX_SETTLEMENT_REFERENCE_LEN`] bytes. Serialized as
/// a `0x`-prefixed lowercase hex string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SettlementReference(Vec<u8>);

impl SettlementReference {
    pub fn new(bytes: impl Into<Vec<u8>>) -> DomainResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(DomainError::validation("settlement reference must not be empty"));
        }
        if bytes.len() > MAX_SETTLEMENT_REFERENCE_LEN {
            return Err(DomainError::validation(format!(
                "settlement reference is {} bytes, max is {MAX_SETTLEMENT_REFERENCE_LEN}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> DomainResult<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| DomainError::validation(format!("settlement reference: {e}")))?;
        Self::new(bytes)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl ValueObject for SettlementReference {}

impl core::fmt::Debug for SettlementReference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("SettlementReference").field(&self.to_hex()).finish()
    }
}

impl core::fmt::Display for SettlementReference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for SettlementReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SettlementReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
