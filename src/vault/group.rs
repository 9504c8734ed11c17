//! Grouping of retrieved shares by record

use std::collections::{HashMap, HashSet};

use crate::codec::ShareCodec;
use crate::domain::{CredentialRecord, NodeIndex, RecordId, RecoveredCredential, Share};
use crate::error::{Result, VaultError};

/// Every share retrieved for one record id, across all nodes
#[derive(Debug)]
pub struct ShareGroup {
    record_id: RecordId,
    username: String,
    service: String,
    shares: Vec<Share>,
    metadata_conflict: bool,
}

impl ShareGroup {
    fn new(node_index: NodeIndex, record: CredentialRecord) -> Self {
        let mut group = Self {
            record_id: record.id,
            username: record.username.clone(),
            service: record.service.clone(),
            shares: Vec::new(),
            metadata_conflict: false,
        };
        group.push(node_index, record);
        group
    }

    fn push(&mut self, node_index: NodeIndex, record: CredentialRecord) {
        if record.username != self.username || record.service != self.service {
            self.metadata_conflict = true;
        }
        self.shares.push(Share {
            record_id: record.id,
            node_index,
            value: record.share,
        });
    }

    /// Gets the record id
    #[must_use]
    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    /// Number of shares retrieved, duplicates included
    #[must_use]
    pub fn len(&self) -> usize {
        self.shares.len()
    }

    /// Whether the group holds no shares
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// Number of distinct nodes that returned a share
    #[must_use]
    pub fn node_coverage(&self) -> usize {
        self.shares
            .iter()
            .map(|share| share.node_index)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Rebuilds the credential
    ///
    /// # Errors
    /// Returns [`VaultError::ShareMismatch`] if the replicated username or
    /// service differ between nodes, otherwise whatever `combine` reports
    pub fn recover(self, codec: &ShareCodec) -> Result<RecoveredCredential> {
        if self.metadata_conflict {
            return Err(VaultError::ShareMismatch(
                "Replicated username or service differs between nodes".to_string(),
            ));
        }

        let password = codec.combine(&self.shares)?;
        Ok(RecoveredCredential {
            id: self.record_id,
            service: self.service,
            username: self.username,
            password,
        })
    }
}

/// Share groups in the order their record ids were first seen
#[derive(Debug, Default)]
pub struct ShareGroups {
    positions: HashMap<RecordId, usize>,
    groups: Vec<ShareGroup>,
}

impl ShareGroups {
    /// Adds a record retrieved from node `node_index`
    pub fn insert(&mut self, node_index: NodeIndex, record: CredentialRecord) {
        match self.positions.get(&record.id) {
            Some(&position) => self.groups[position].push(node_index, record),
            None => {
                self.positions.insert(record.id, self.groups.len());
                self.groups.push(ShareGroup::new(node_index, record));
            }
        }
    }

    /// Number of distinct record ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no record was inserted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl IntoIterator for ShareGroups {
    type Item = ShareGroup;
    type IntoIter = std::vec::IntoIter<ShareGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}
