//! Credential vault: write and read paths over the node group
//!
//! Writes split the password, then store share `i` on node `i` together with
//! the plaintext username and service. Reads query every node, group shares by
//! record id and rebuild only the records for which every node answered.

mod group;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::codec::ShareCodec;
use crate::domain::{CredentialRecord, RecordFilter, RecordId, RecoveredCredential, VaultConfig};
use crate::error::{Result, VaultError};
use crate::key::SharingKey;
use crate::node::StorageNode;
use crate::node_set::NodeSet;

pub use group::{ShareGroup, ShareGroups};

/// Everything learned by one read fan-out
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Fully recovered credentials, in the order their ids were first seen
    pub credentials: Vec<RecoveredCredential>,
    /// Records with fewer shares than nodes (still propagating or orphaned)
    pub incomplete: Vec<RecordId>,
    /// Complete records that could not be rebuilt
    pub rejected: Vec<(RecordId, VaultError)>,
    /// Nodes that failed or timed out
    pub unavailable: Vec<VaultError>,
}

/// Stores credentials so that no single node holds a whole password
#[derive(Debug)]
pub struct CredentialVault {
    config: VaultConfig,
    codec: ShareCodec,
    nodes: NodeSet,
    schema: String,
}

impl CredentialVault {
    /// Creates a vault over `nodes`, storing records in `schema`
    ///
    /// # Errors
    /// Returns a configuration error if the number of nodes differs from the
    /// configured node count
    pub fn new(
        config: VaultConfig,
        key: SharingKey,
        nodes: Vec<Arc<dyn StorageNode>>,
        schema: impl Into<String>,
    ) -> Result<Self> {
        let nodes = NodeSet::new(nodes, &config)?;
        Ok(Self {
            codec: ShareCodec::new(key, config.node_count()),
            config,
            nodes,
            schema: schema.into(),
        })
    }

    /// Gets the vault configuration
    #[must_use]
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Gets the schema records are stored in
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Splits `password` and stores one share on every node
    ///
    /// Returns the new record id on success. The write fails fast: if a node
    /// fails, the shares already written to earlier nodes are left in place as
    /// orphans and the record never becomes recoverable.
    ///
    /// # Errors
    /// - [`VaultError::Validation`] if any input is empty (before any node call)
    /// - [`VaultError::NodeUnavailable`] if a node fails or times out
    pub async fn create_credential(
        &self,
        username: &str,
        password: &str,
        service: &str,
    ) -> Result<RecordId> {
        for (field, value) in [("username", username), ("password", password), ("service", service)] {
            if value.is_empty() {
                return Err(VaultError::Validation(format!("{field} must not be empty")));
            }
        }

        let record_id = RecordId::generate();
        let shares = self.codec.split(password, self.nodes.len())?;

        let records: Vec<CredentialRecord> = shares
            .into_iter()
            .map(|share| CredentialRecord {
                id: record_id,
                username: username.to_string(),
                service: service.to_string(),
                share,
            })
            .collect();

        self.nodes.distribute(&self.schema, &records).await?;

        info!(%record_id, %service, nodes = self.nodes.len(), "Stored credential");
        Ok(record_id)
    }

    /// Fetches and rebuilds every recoverable credential
    ///
    /// Node failures and per-record failures are logged and omitted; this
    /// never fails as a whole.
    pub async fn fetch_credentials(&self, service: Option<&str>) -> Vec<RecoveredCredential> {
        self.fetch_report(&RecordFilter::from(service)).await.credentials
    }

    /// Runs the read path and reports what was recovered and what was not
    pub async fn fetch_report(&self, filter: &RecordFilter) -> FetchReport {
        let mut report = FetchReport::default();
        let mut groups = ShareGroups::default();

        for (index, response) in self.nodes.collect_all(&self.schema, filter).await {
            match response {
                Ok(records) => {
                    for record in records {
                        if !filter.matches(&record) {
                            debug!(node = %index, record_id = %record.id, "Ignoring record outside filter");
                            continue;
                        }
                        groups.insert(index, record);
                    }
                }
                Err(e) => report.unavailable.push(e),
            }
        }

        let expected = self.nodes.len();
        for group in groups {
            let record_id = group.record_id();
            let covered = group.node_coverage();
            if covered < expected {
                debug!(%record_id, shares = group.len(), nodes = covered, expected, "Skipping incomplete record");
                report.incomplete.push(record_id);
                continue;
            }

            match group.recover(&self.codec) {
                Ok(credential) => report.credentials.push(credential),
                Err(e) => {
                    warn!(%record_id, error = %e, "Could not decrypt credential");
                    report.rejected.push((record_id, e));
                }
            }
        }

        info!(
            recovered = report.credentials.len(),
            incomplete = report.incomplete.len(),
            rejected = report.rejected.len(),
            unavailable_nodes = report.unavailable.len(),
            "Fetched credentials"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeCount;
    use crate::node::MemoryNode;

    fn vault_over(nodes: &[Arc<MemoryNode>]) -> CredentialVault {
        let config = VaultConfig::new(NodeCount::from_len(nodes.len()).unwrap());
        let nodes = nodes
            .iter()
            .map(|node| Arc::clone(node) as Arc<dyn StorageNode>)
            .collect();
        CredentialVault::new(config, SharingKey::generate(1), nodes, "credentials").unwrap()
    }

    fn memory_nodes(n: usize) -> Vec<Arc<MemoryNode>> {
        (0..n)
            .map(|i| Arc::new(MemoryNode::new(format!("node_{i}"))))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_inputs_rejected_before_node_calls() {
        let nodes = memory_nodes(3);
        for node in &nodes {
            node.set_available(false);
        }
        let vault = vault_over(&nodes);

        for (username, password, service) in
            [("", "pw", "Netflix"), ("alice", "", "Netflix"), ("alice", "pw", "")]
        {
            let err = vault
                .create_credential(username, password, service)
                .await
                .unwrap_err();
            assert!(matches!(err, VaultError::Validation(_)), "{err}");
        }
    }

    #[tokio::test]
    async fn test_metadata_replicated_share_distinct() {
        let nodes = memory_nodes(3);
        let vault = vault_over(&nodes);

        let id = vault
            .create_credential("alice", "p@ssw0rd!", "Netflix")
            .await
            .unwrap();

        let stored: Vec<CredentialRecord> = nodes
            .iter()
            .map(|node| node.record("credentials", id).unwrap())
            .collect();
        for record in &stored {
            assert_eq!(record.username, "alice");
            assert_eq!(record.service, "Netflix");
            assert_ne!(record.share.as_str(), "p@ssw0rd!");
        }
        assert_ne!(stored[0].share, stored[1].share);
        assert_ne!(stored[1].share, stored[2].share);
    }

    #[tokio::test]
    async fn test_report_separates_incomplete_and_rejected() {
        let nodes = memory_nodes(2);
        let vault = vault_over(&nodes);
        let good = vault.create_credential("alice", "pw1", "Netflix").await.unwrap();

        // Share lands on node 0 only
        nodes[1].set_available(false);
        assert!(vault.create_credential("bob", "pw2", "Github").await.is_err());
        nodes[1].set_available(true);

        // Complete record written under a different key
        let foreign = vault_over(&nodes)
            .create_credential("carol", "pw3", "Netflix")
            .await
            .unwrap();

        let report = vault.fetch_report(&RecordFilter::all()).await;

        let recovered: Vec<RecordId> = report.credentials.iter().map(|c| c.id).collect();
        assert_eq!(recovered, vec![good]);
        assert_eq!(report.incomplete.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, foreign);
        assert!(report.rejected[0].1.is_record_local());
        assert!(report.unavailable.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_share_from_one_node_is_still_incomplete() {
        let nodes = memory_nodes(3);
        let vault = vault_over(&nodes);

        // Shares land on nodes 0 and 1 only
        nodes[2].set_available(false);
        assert!(vault.create_credential("alice", "pw", "Netflix").await.is_err());
        nodes[2].set_available(true);

        // Node 0 now answers with the same record twice
        let stored = nodes[0]
            .query("credentials", &RecordFilter::all())
            .await
            .unwrap();
        let id = stored[0].id;
        nodes[0].insert_raw("credentials", stored[0].clone());

        let report = vault.fetch_report(&RecordFilter::all()).await;

        assert!(report.credentials.is_empty());
        assert_eq!(report.incomplete, vec![id]);
        assert!(report.rejected.is_empty());
    }

    #[tokio::test]
    async fn test_report_lists_unavailable_nodes() {
        let nodes = memory_nodes(3);
        let vault = vault_over(&nodes);
        vault.create_credential("alice", "pw", "Netflix").await.unwrap();
        nodes[2].set_available(false);

        let report = vault.fetch_report(&RecordFilter::all()).await;

        assert!(report.credentials.is_empty());
        assert_eq!(report.incomplete.len(), 1);
        assert!(matches!(
            report.unavailable.as_slice(),
            [VaultError::NodeUnavailable { node: 2, .. }]
        ));
    }
}
