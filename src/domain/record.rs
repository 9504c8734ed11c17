//! Records exchanged with storage nodes and the values rebuilt from them

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{NodeIndex, RecordId};

/// One share in its storage form (base64 envelope)
///
/// Safe to embed in the `password` field of a node record. Meaningless alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedShare(String);

impl EncodedShare {
    /// Wraps an already-encoded share string
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Gets the encoded share as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A share together with the record and node it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub record_id: RecordId,
    pub node_index: NodeIndex,
    pub value: EncodedShare,
}

/// The record stored on each node
///
/// `username` and `service` are replicated in clear on every node; only the
/// `password` field is secret-shared and holds a different share per node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub username: String,
    pub service: String,
    #[serde(rename = "password")]
    pub share: EncodedShare,
}

/// Query filter understood by every storage node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
}

impl RecordFilter {
    /// Matches every record
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches records whose service equals `service` exactly
    pub fn service(service: impl Into<String>) -> Self {
        Self {
            service: Some(service.into()),
        }
    }

    /// Gets the service constraint, if any
    #[must_use]
    pub fn service_name(&self) -> Option<&str> {
        self.service.as_deref()
    }

    /// Whether `record` satisfies the filter
    #[must_use]
    pub fn matches(&self, record: &CredentialRecord) -> bool {
        self.service
            .as_deref()
            .is_none_or(|service| record.service == service)
    }
}

impl From<Option<&str>> for RecordFilter {
    fn from(service: Option<&str>) -> Self {
        service.map_or_else(Self::all, Self::service)
    }
}

/// A fully reconstructed credential
#[derive(Clone, PartialEq, Eq)]
pub struct RecoveredCredential {
    pub id: RecordId,
    pub service: String,
    pub username: String,
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for RecoveredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveredCredential")
            .field("id", &self.id)
            .field("service", &self.service)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
