//! Domain types for the credential vault
//!
//! This module contains validated newtypes, configuration and record shapes:
//! - [`NodeCount`] - Number of storage nodes, equal to the share threshold (2..=254)
//! - [`NodeIndex`] - Position of a node in the group (0..=253)
//! - [`RecordId`] - Identifier shared by all shares of one credential
//! - [`VaultConfig`] - Node count, per-node timeout and write mode
//! - [`CredentialRecord`] - The four-field record each node stores

mod config;
mod node_count;
mod node_index;
mod record;
mod record_id;

pub use config::{DEFAULT_NODE_TIMEOUT, VaultConfig, WriteMode};
pub use node_count::NodeCount;
pub use node_index::NodeIndex;
pub use record::{CredentialRecord, EncodedShare, RecordFilter, RecoveredCredential, Share};
pub use record_id::RecordId;
