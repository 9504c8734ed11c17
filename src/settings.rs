use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::{NodeCount, VaultConfig, WriteMode};
use crate::error::{Result, VaultError};
use crate::key::SharingKey;
use crate::node::{HttpNode, StorageNode};

/// Vault settings, loaded from a TOML file such as `sharevault.toml`.
///
/// ```toml
/// schema = "credentials"
/// node_timeout_secs = 5
/// write_mode = "concurrent"
///
/// [key]
/// version = 1
/// mnemonic = "..."
///
/// [[nodes]]
/// name = "node_a"
/// url = "https://node-a.example.com/api/v1"
/// token_env = "NODE_A_TOKEN"
/// ```
///
/// The order of `[[nodes]]` entries is the node order: entry `i` always
/// receives share `i`, so it must never change once credentials are stored.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Schema (collection) id records are stored under.
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Bound on each per-node call, in seconds (default: 10).
    #[serde(default = "default_node_timeout_secs")]
    pub node_timeout_secs: u64,

    /// Write fan-out mode (default: sequential).
    #[serde(default)]
    pub write_mode: WriteMode,

    /// Secret-sharing key; absent until `keygen` output is pasted in.
    #[serde(default)]
    pub key: Option<KeySettings>,

    /// Storage nodes in share order.
    #[serde(default)]
    pub nodes: Vec<NodeSettings>,
}

/// Persisted secret-sharing key.
#[derive(Clone, Deserialize)]
pub struct KeySettings {
    #[serde(default = "default_key_version")]
    pub version: u32,
    pub mnemonic: String,
}

/// One storage node endpoint.
#[derive(Clone, Deserialize)]
pub struct NodeSettings {
    pub name: String,
    pub url: String,
    /// Bearer token given inline.
    #[serde(default)]
    pub token: Option<String>,
    /// Name of an environment variable holding the bearer token.
    #[serde(default)]
    pub token_env: Option<String>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_schema() -> String {
    "credentials".to_string()
}

fn default_node_timeout_secs() -> u64 {
    10
}

fn default_key_version() -> u32 {
    1
}

// ── Implementation ───────────────────────────────────────────────────

impl Settings {
    /// Load settings from `path`.
    ///
    /// A missing file is an error: the vault cannot run without its node list.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            VaultError::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;

        Self::parse(&contents)
            .map_err(|e| VaultError::Configuration(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parse settings from a TOML string.
    pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Derive the vault configuration; the node count is the number of nodes.
    pub fn vault_config(&self) -> Result<VaultConfig> {
        let node_count = NodeCount::from_len(self.nodes.len())?;
        if self.node_timeout_secs == 0 {
            return Err(VaultError::Configuration(
                "node_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(VaultConfig::new(node_count)
            .with_node_timeout(Duration::from_secs(self.node_timeout_secs))
            .with_write_mode(self.write_mode))
    }

    /// Load the configured sharing key.
    pub fn sharing_key(&self) -> Result<SharingKey> {
        let key = self.key.as_ref().ok_or_else(|| {
            VaultError::Configuration(
                "No [key] configured; generate one with `sharevault keygen`".to_string(),
            )
        })?;
        SharingKey::from_mnemonic(&key.mnemonic, key.version)
    }

    /// Build an HTTP client for every configured node, in order.
    pub fn http_nodes(&self) -> Result<Vec<Arc<dyn StorageNode>>> {
        self.nodes
            .iter()
            .map(|node| {
                let token = node.token()?;
                Ok(Arc::new(HttpNode::new(&node.name, &node.url, token)) as Arc<dyn StorageNode>)
            })
            .collect()
    }
}

impl NodeSettings {
    /// Resolve the bearer token, inline value first.
    pub fn token(&self) -> Result<Zeroizing<String>> {
        if let Some(token) = &self.token {
            return Ok(Zeroizing::new(token.clone()));
        }
        if let Some(var) = &self.token_env {
            return std::env::var(var).map(Zeroizing::new).map_err(|_| {
                VaultError::Configuration(format!(
                    "Token variable {var} for node {} is not set",
                    self.name
                ))
            });
        }
        Err(VaultError::Configuration(format!(
            "Node {} has neither `token` nor `token_env`",
            self.name
        )))
    }
}

impl std::fmt::Debug for KeySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySettings")
            .field("version", &self.version)
            .field("mnemonic", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for NodeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeSettings")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_env", &self.token_env)
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
