use std::path::Path;

use anyhow::{Context, Result, bail};
use zeroize::Zeroizing;

use crate::domain::{RecordFilter, RecordId, RecoveredCredential};
use crate::key::SharingKey;
use crate::settings::Settings;
use crate::vault::{CredentialVault, FetchReport};

/// Open the vault described by the settings file at `path`
///
/// # Errors
/// Returns an error if the settings cannot be loaded, no key is configured, or
/// the node list does not form a valid group
pub fn open_vault(path: &Path) -> Result<CredentialVault> {
    let settings = Settings::load(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;

    let config = settings.vault_config().context("Invalid node configuration")?;
    let key = settings.sharing_key().context("Invalid sharing key")?;
    let nodes = settings.http_nodes().context("Invalid node configuration")?;

    CredentialVault::new(config, key, nodes, settings.schema).context("Failed to build vault")
}

/// Generate a new sharing key and return its BIP39 phrase
///
/// # Errors
/// Returns an error if the key version is 0
pub fn generate_key(version: u32) -> Result<Zeroizing<String>> {
    if version == 0 {
        bail!("Key version must be at least 1");
    }
    Ok(SharingKey::generate(version).to_mnemonic())
}

/// Split a password across the node group
///
/// # Errors
/// Returns an error if validation fails or any node rejects its share
pub async fn add_credential(
    vault: &CredentialVault,
    service: &str,
    username: &str,
    password: &str,
) -> Result<RecordId> {
    vault
        .create_credential(username, password, service)
        .await
        .with_context(|| format!("Failed to store credential for {service}"))
}

/// Fetch every recoverable credential, optionally for one service
pub async fn list_credentials(vault: &CredentialVault, service: Option<&str>) -> FetchReport {
    vault.fetch_report(&RecordFilter::from(service)).await
}

/// Format a recovered credential as a tab-separated line
#[must_use]
pub fn format_credential(credential: &RecoveredCredential) -> Zeroizing<String> {
    Zeroizing::new(format!(
        "{}\t{}\t{}",
        credential.service,
        credential.username,
        credential.password.as_str()
    ))
}

/// Human-readable warnings for everything a fetch could not recover
#[must_use]
pub fn report_warnings(report: &FetchReport) -> Vec<String> {
    let mut warnings: Vec<String> = report.unavailable.iter().map(ToString::to_string).collect();

    warnings.extend(
        report
            .rejected
            .iter()
            .map(|(id, e)| format!("Could not decrypt credential {id}: {e}")),
    );

    if !report.incomplete.is_empty() {
        warnings.push(format!(
            "{} record(s) are missing shares on some nodes and were skipped",
            report.incomplete.len()
        ));
    }

    warnings
}
