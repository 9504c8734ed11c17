//! Process-wide vault configuration

use std::time::Duration;

use serde::Deserialize;

use super::NodeCount;

/// Default bound on a single node call
pub const DEFAULT_NODE_TIMEOUT: Duration = Duration::from_secs(10);

/// How the write path dispatches shares to the node group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// One node after another, stopping at the first failure
    #[default]
    Sequential,
    /// All nodes at once; the first failure cancels in-flight siblings
    Concurrent,
}

/// Parameters shared by the codec, the node group and the vault
///
/// The node count is fixed for the lifetime of the process: it determines how
/// many shares each password is split into and how many nodes a `NodeSet`
/// must hold. Changing it requires re-splitting every stored secret.
#[derive(Debug, Clone, Copy)]
pub struct VaultConfig {
    node_count: NodeCount,
    node_timeout: Duration,
    write_mode: WriteMode,
}

impl VaultConfig {
    /// Creates a configuration with default timeout and sequential writes
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use sharevault::domain::{NodeCount, VaultConfig, WriteMode};
    ///
    /// let config = VaultConfig::new(NodeCount::new(3).unwrap())
    ///     .with_node_timeout(Duration::from_secs(2))
    ///     .with_write_mode(WriteMode::Concurrent);
    ///
    /// assert_eq!(*config.node_count(), 3);
    /// assert_eq!(config.node_timeout(), Duration::from_secs(2));
    /// assert_eq!(config.write_mode(), WriteMode::Concurrent);
    /// ```
    #[must_use]
    pub fn new(node_count: NodeCount) -> Self {
        Self {
            node_count,
            node_timeout: DEFAULT_NODE_TIMEOUT,
            write_mode: WriteMode::default(),
        }
    }

    /// Sets the bound on each per-node call
    #[must_use]
    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = timeout;
        self
    }

    /// Sets the write fan-out mode
    #[must_use]
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Gets the node count
    #[must_use]
    pub fn node_count(&self) -> NodeCount {
        self.node_count
    }

    /// Gets the per-node timeout
    #[must_use]
    pub fn node_timeout(&self) -> Duration {
        self.node_timeout
    }

    /// Gets the write fan-out mode
    #[must_use]
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }
}
