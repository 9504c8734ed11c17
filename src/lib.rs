//! Credential vault that secret-shares passwords across independent storage nodes
//!
//! No single node, and no subset smaller than the whole group, ever holds
//! enough to recover a password. See [`vault::CredentialVault`] for the entry
//! point and [`codec::ShareCodec`] for the sharing scheme.

#[cfg(feature = "cli")]
pub mod cli;
pub mod codec;
pub mod commands;
pub mod domain;
pub mod error;
pub mod key;
pub mod node;
pub mod node_set;
pub mod settings;
pub mod vault;

pub use error::{Result, VaultError};
pub use vault::{CredentialVault, FetchReport};
