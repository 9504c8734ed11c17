//! Error taxonomy for vault operations
//!
//! Errors fall into two groups. Input, configuration and node transport
//! errors abort the operation that raised them. The codec errors
//! ([`VaultError::IncompleteShareSet`], [`VaultError::ShareMismatch`],
//! [`VaultError::Combine`]) concern a single record and are turned into a
//! per-record skip by the read path.

use thiserror::Error;

/// All errors that can occur in the vault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Missing or empty required input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Node count, key or settings inconsistent with the secret-sharing parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single node failed or timed out
    #[error("Node {node} ({name}) unavailable: {reason}")]
    NodeUnavailable {
        node: u8,
        name: String,
        reason: String,
    },

    /// Fewer shares than the node count were supplied to `combine`
    #[error("Incomplete share set: need {expected} shares, got {got}")]
    IncompleteShareSet { expected: usize, got: usize },

    /// Shares disagree on node index, key, record or fail integrity checks
    #[error("Share mismatch: {0}")]
    ShareMismatch(String),

    /// Any other reconstruction failure
    #[error("Failed to combine shares: {0}")]
    Combine(String),
}

impl VaultError {
    /// Whether the error concerns a single record rather than the whole operation
    ///
    /// ```rust
    /// use sharevault::error::VaultError;
    ///
    /// assert!(VaultError::Combine("bad fragment".into()).is_record_local());
    /// assert!(!VaultError::Validation("empty password".into()).is_record_local());
    /// ```
    #[must_use]
    pub fn is_record_local(&self) -> bool {
        matches!(
            self,
            Self::IncompleteShareSet { .. } | Self::ShareMismatch(_) | Self::Combine(_)
        )
    }
}

/// Convenience type alias for vault results.
pub type Result<T> = std::result::Result<T, VaultError>;
