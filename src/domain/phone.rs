use crate::error::ValidationError;
use serde::{Serialize, Serializer};
use std::fmt;

/// A customer identifier decoded from a QR code.
///
/// The normalized form always starts with `+` and is what every gateway
/// receives. The raw payload is kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber {
    normalized: String,
    raw: String,
}

impl PhoneNumber {
    pub fn from_scan(payload: &str) -> Result<Self, ValidationError> {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyPayload);
        }
        let normalized = if trimmed.starts_with('+') {
            trimmed.to_string()
        } else {
            format!("+{trimmed}")
        };
        Ok(Self {
            normalized,
            raw: payload.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The payload looks like a web link rather than a phone number.
    pub fn is_link(&self) -> bool {
        let raw = self.raw.trim();
        raw.starts_with("http://") || raw.starts_with("https://")
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.normalized)
    }
}
