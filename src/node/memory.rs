//! In-memory storage node

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use super::{NodeError, NodeResult, StorageNode};
use crate::domain::{CredentialRecord, RecordFilter, RecordId};

/// In-memory storage node
///
/// Records are kept per schema in insertion order and lost when the node is
/// dropped. Availability and latency can be changed at runtime to simulate an
/// unreachable or slow node.
///
/// # Example
///
/// ```
/// use sharevault::node::{MemoryNode, StorageNode};
///
/// let node = MemoryNode::new("node_a");
/// assert_eq!(node.name(), "node_a");
/// assert!(node.is_empty("credentials"));
/// ```
#[derive(Debug)]
pub struct MemoryNode {
    name: String,
    records: RwLock<HashMap<String, Vec<CredentialRecord>>>,
    available: AtomicBool,
    latency: RwLock<Option<Duration>>,
}

impl MemoryNode {
    /// Create a new empty, available node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            latency: RwLock::new(None),
        }
    }

    /// Make the node fail (or stop failing) every call
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Get a stored record by id
    pub fn record(&self, schema: &str, id: RecordId) -> Option<CredentialRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(schema)
            .and_then(|stored| stored.iter().find(|r| r.id == id).cloned())
    }

    /// Number of records in `schema`
    pub fn len(&self, schema: &str) -> usize {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.get(schema).map_or(0, Vec::len)
    }

    /// Check whether `schema` holds no records
    pub fn is_empty(&self, schema: &str) -> bool {
        self.len(schema) == 0
    }

    /// Store a record directly, bypassing availability and id checks
    pub fn insert_raw(&self, schema: &str, record: CredentialRecord) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.entry(schema.to_string()).or_default().push(record);
    }

    async fn simulate_call(&self) -> NodeResult<()> {
        let latency = *self.latency.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(NodeError::Unavailable)
        }
    }
}

#[async_trait]
impl StorageNode for MemoryNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, schema: &str, record: &CredentialRecord) -> NodeResult<()> {
        self.simulate_call().await?;

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let stored = records.entry(schema.to_string()).or_default();
        if stored.iter().any(|r| r.id == record.id) {
            return Err(NodeError::Rejected(format!(
                "duplicate _id {} in schema {schema}",
                record.id
            )));
        }
        stored.push(record.clone());
        Ok(())
    }

    async fn query(&self, schema: &str, filter: &RecordFilter) -> NodeResult<Vec<CredentialRecord>> {
        self.simulate_call().await?;

        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .get(schema)
            .map(|stored| stored.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EncodedShare;

    fn record(service: &str) -> CredentialRecord {
        CredentialRecord {
            id: RecordId::generate(),
            username: "alice".to_string(),
            service: service.to_string(),
            share: EncodedShare::new("c2hhcmU="),
        }
    }

    #[tokio::test]
    async fn test_put_and_query() {
        let node = MemoryNode::new("node_a");
        let netflix = record("Netflix");
        node.put("credentials", &netflix).await.unwrap();
        node.put("credentials", &record("Github")).await.unwrap();

        assert_eq!(node.len("credentials"), 2);
        assert!(node.is_empty("other"));
        assert_eq!(node.record("credentials", netflix.id), Some(netflix.clone()));

        let all = node.query("credentials", &RecordFilter::all()).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = node
            .query("credentials", &RecordFilter::service("Netflix"))
            .await
            .unwrap();
        assert_eq!(filtered, vec![netflix]);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let node = MemoryNode::new("node_a");
        let rec = record("Netflix");
        node.put("credentials", &rec).await.unwrap();

        let err = node.put("credentials", &rec).await.unwrap_err();
        assert!(matches!(err, NodeError::Rejected(_)));
        assert_eq!(node.len("credentials"), 1);
    }

    #[tokio::test]
    async fn test_unavailable_node_fails_calls() {
        let node = MemoryNode::new("node_a");
        node.set_available(false);

        assert!(matches!(
            node.put("credentials", &record("Netflix")).await,
            Err(NodeError::Unavailable)
        ));
        assert!(node.query("credentials", &RecordFilter::all()).await.is_err());
        assert!(node.is_empty("credentials"));

        node.set_available(true);
        assert!(node.query("credentials", &RecordFilter::all()).await.is_ok());
    }
}
