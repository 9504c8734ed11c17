//! `RecordId` newtype shared by every share of one credential

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VaultError};

/// Globally unique credential identifier (random 128-bit UUIDv4)
///
/// Identifiers are generated optimistically: no uniqueness check against
/// existing records is made, the collision probability being negligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generates a fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier from its hyphenated string form
    ///
    /// # Errors
    /// Returns a validation error if `s` is not a UUID
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sharevault::domain::RecordId;
    ///
    /// let id = RecordId::parse("0b1e7a4c-6f0e-4a53-9d55-7d3c1b0f9a21").unwrap();
    /// assert_eq!(id.to_string(), "0b1e7a4c-6f0e-4a53-9d55-7d3c1b0f9a21");
    ///
    /// assert!(RecordId::parse("not-a-uuid").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| VaultError::Validation(format!("Invalid record id '{s}': {e}")))
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
