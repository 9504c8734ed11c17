//! Storage node contract
//!
//! A storage node is an independently administered endpoint that stores
//! four-field [`CredentialRecord`]s per schema and answers filtered queries.
//! Nothing transactional is assumed across nodes; composing N independent
//! calls and interpreting partial results is the vault's job.
//!
//! Implementations:
//! - [`MemoryNode`]: in-process node, used by tests and local experiments
//! - [`HttpNode`]: REST node speaking the `/data/create` and `/data/read` API

mod http;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CredentialRecord, RecordFilter};

pub use http::HttpNode;
pub use memory::MemoryNode;

/// Errors reported by a single storage node
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Node is not reachable")]
    Unavailable,

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

pub type NodeResult<T> = Result<T, NodeError>;

/// One storage endpoint of the node group
#[async_trait]
pub trait StorageNode: Send + Sync {
    /// Human-readable node name used in logs and errors
    fn name(&self) -> &str;

    /// Stores `record` in `schema`
    async fn put(&self, schema: &str, record: &CredentialRecord) -> NodeResult<()>;

    /// Returns every record in `schema` matching `filter`
    async fn query(&self, schema: &str, filter: &RecordFilter) -> NodeResult<Vec<CredentialRecord>>;
}
