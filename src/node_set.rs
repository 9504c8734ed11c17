//! Fixed, ordered group of storage nodes
//!
//! Node `i` always receives share `i`. Every per-node call is bounded by the
//! configured timeout, and a timed-out call is treated exactly like a failed
//! one.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{join_all, try_join_all};
use tracing::{debug, warn};

use crate::domain::{CredentialRecord, NodeCount, NodeIndex, RecordFilter, VaultConfig, WriteMode};
use crate::error::{Result, VaultError};
use crate::node::{NodeResult, StorageNode};

/// Per-node outcome of a read fan-out, in node order
pub type NodeResponses = Vec<(NodeIndex, Result<Vec<CredentialRecord>>)>;

/// The trust group every password is split across
pub struct NodeSet {
    nodes: Vec<Arc<dyn StorageNode>>,
    node_count: NodeCount,
    timeout: Duration,
    write_mode: WriteMode,
}

impl NodeSet {
    /// Creates a node group matching `config`
    ///
    /// # Errors
    /// Returns a configuration error if the number of nodes differs from the
    /// configured node count
    pub fn new(nodes: Vec<Arc<dyn StorageNode>>, config: &VaultConfig) -> Result<Self> {
        let node_count = config.node_count();
        if nodes.len() != node_count.get() {
            return Err(VaultError::Configuration(format!(
                "Configured for {node_count} nodes but {} were supplied",
                nodes.len()
            )));
        }
        Ok(Self {
            nodes,
            node_count,
            timeout: config.node_timeout(),
            write_mode: config.write_mode(),
        })
    }

    /// Number of nodes in the group
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a group holds at least two nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Gets the name of the node at `index`
    #[must_use]
    pub fn node_name(&self, index: NodeIndex) -> &str {
        self.nodes.get(index.get()).map_or("<unknown>", |node| node.name())
    }

    /// Writes `records[i]` to node `i`
    ///
    /// Fails fast: the first failure aborts the write and is returned. Nodes
    /// already written keep their record; no compensating delete is issued,
    /// so those shares become orphaned.
    ///
    /// # Errors
    /// Returns a configuration error if `records` does not hold one record per
    /// node, and [`VaultError::NodeUnavailable`] for the first failing node
    pub async fn distribute(&self, schema: &str, records: &[CredentialRecord]) -> Result<()> {
        if records.len() != self.nodes.len() {
            return Err(VaultError::Configuration(format!(
                "Expected {} records, one per node, got {}",
                self.nodes.len(),
                records.len()
            )));
        }

        let written = Mutex::new(Vec::with_capacity(records.len()));
        let outcome = match self.write_mode {
            WriteMode::Sequential => self.distribute_sequential(schema, records, &written).await,
            WriteMode::Concurrent => self.distribute_concurrent(schema, records, &written).await,
        };

        if let Err(e) = &outcome {
            let written = written.into_inner().unwrap_or_else(PoisonError::into_inner);
            if !written.is_empty() {
                warn!(
                    record_id = %records[0].id,
                    orphaned_on = ?written,
                    error = %e,
                    "Partial write left orphaned shares"
                );
            }
        }
        outcome
    }

    async fn distribute_sequential(
        &self,
        schema: &str,
        records: &[CredentialRecord],
        written: &Mutex<Vec<u8>>,
    ) -> Result<()> {
        for ((index, node), record) in self.indexed().zip(records) {
            self.bounded(index, node.put(schema, record)).await?;
            written.lock().unwrap_or_else(PoisonError::into_inner).push(*index);
        }
        Ok(())
    }

    async fn distribute_concurrent(
        &self,
        schema: &str,
        records: &[CredentialRecord],
        written: &Mutex<Vec<u8>>,
    ) -> Result<()> {
        // try_join_all drops the remaining futures on the first error
        let writes = self.indexed().zip(records).map(|((index, node), record)| async move {
            self.bounded(index, node.put(schema, record)).await?;
            written.lock().unwrap_or_else(PoisonError::into_inner).push(*index);
            Ok::<_, VaultError>(())
        });
        try_join_all(writes).await.map(|_| ())
    }

    /// Queries every node concurrently
    ///
    /// Never fails as a whole: each node's outcome is reported separately.
    pub async fn collect_all(&self, schema: &str, filter: &RecordFilter) -> NodeResponses {
        let queries = self.indexed().map(|(index, node)| async move {
            let result = self.bounded(index, node.query(schema, filter)).await;
            (index, result)
        });
        join_all(queries).await
    }

    fn indexed(&self) -> impl Iterator<Item = (NodeIndex, &Arc<dyn StorageNode>)> {
        self.node_count.indices().zip(self.nodes.iter())
    }

    /// Runs one node call under the timeout, mapping failures to `NodeUnavailable`
    async fn bounded<T>(&self, index: NodeIndex, call: impl Future<Output = NodeResult<T>>) -> Result<T> {
        let name = self.node_name(index);
        debug!(node = %index, %name, "node call");

        let reason = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", self.timeout),
        };

        warn!(node = %index, %name, %reason, "node call failed");
        Err(VaultError::NodeUnavailable {
            node: *index,
            name: name.to_string(),
            reason,
        })
    }
}

impl std::fmt::Debug for NodeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.nodes.iter().map(|node| node.name()).collect();
        f.debug_struct("NodeSet")
            .field("nodes", &names)
            .field("timeout", &self.timeout)
            .field("write_mode", &self.write_mode)
            .finish()
    }
}
