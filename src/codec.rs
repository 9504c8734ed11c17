//! N-of-N Shamir secret sharing with authenticated share envelopes
//!
//! # Overview
//!
//! [`ShareCodec::split`] turns a password into one share per storage node;
//! [`ShareCodec::combine`] rebuilds it only when every node's share is present.
//! The threshold equals the node count, so any strict subset of shares is
//! useless.
//!
//! Each raw Shamir share is wrapped in an envelope before it leaves the process:
//!
//! ```text
//! format (1) | key version (4) | key fingerprint (4) | node count (1) |
//! node index (1) | payload length (2) | payload | tag (16)
//! ```
//!
//! Integers are big-endian. The tag is a truncated HMAC-SHA256 over every
//! preceding byte, keyed with the [`SharingKey`]. The envelope is then base64
//! encoded so it can be stored in the record's `password` field.
//!
//! # Examples
//!
//! ```rust
//! use sharevault::codec::ShareCodec;
//! use sharevault::domain::{NodeCount, RecordId, Share};
//! use sharevault::key::SharingKey;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let node_count = NodeCount::new(3)?;
//! let codec = ShareCodec::new(SharingKey::generate(1), node_count);
//!
//! let encoded = codec.split("p@ssw0rd!", 3)?;
//! assert_eq!(encoded.len(), 3);
//!
//! let record_id = RecordId::generate();
//! let shares: Vec<Share> = node_count
//!     .indices()
//!     .zip(encoded)
//!     .map(|(node_index, value)| Share { record_id, node_index, value })
//!     .collect();
//!
//! assert_eq!(codec.combine(&shares)?.as_str(), "p@ssw0rd!");
//! assert!(codec.combine(&shares[..2]).is_err());
//! # Ok(())
//! # }
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use blahaj::Sharks;
use zeroize::Zeroizing;

use crate::domain::{EncodedShare, NodeCount, NodeIndex, Share};
use crate::error::{Result, VaultError};
use crate::key::{SharingKey, TAG_LEN};

/// Envelope format version
pub const FORMAT_VERSION: u8 = 1;

/// Version byte prefixed to the plaintext before splitting
///
/// Keeps the Shamir secret non-empty so the empty string still round-trips.
const PAYLOAD_VERSION: u8 = 1;

/// Bytes before the payload: format, key version, fingerprint, count, index, length
const HEADER_LEN: usize = 1 + 4 + 4 + 1 + 1 + 2;

/// Fields read back from an envelope header
struct EnvelopeHeader {
    format: u8,
    key_version: u32,
    fingerprint: u32,
    node_count: u8,
    node_index: u8,
    payload_len: usize,
}

impl EnvelopeHeader {
    fn parse(raw: &[u8]) -> Self {
        Self {
            format: raw[0],
            key_version: u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]),
            fingerprint: u32::from_be_bytes([raw[5], raw[6], raw[7], raw[8]]),
            node_count: raw[9],
            node_index: raw[10],
            payload_len: usize::from(u16::from_be_bytes([raw[11], raw[12]])),
        }
    }
}

/// Splits and combines secrets for a fixed node group under a fixed key
#[derive(Debug, Clone)]
pub struct ShareCodec {
    key: SharingKey,
    node_count: NodeCount,
}

impl ShareCodec {
    /// Creates a codec for `node_count` nodes
    #[must_use]
    pub fn new(key: SharingKey, node_count: NodeCount) -> Self {
        Self { key, node_count }
    }

    /// Gets the node count the codec splits for
    #[must_use]
    pub fn node_count(&self) -> NodeCount {
        self.node_count
    }

    /// Gets the sharing key
    #[must_use]
    pub fn key(&self) -> &SharingKey {
        &self.key
    }

    /// Splits `secret` into `n` encoded shares, ordered by node index
    ///
    /// # Errors
    /// Returns a configuration error if `n` differs from the configured node
    /// count, and a validation error if the secret is too large for an envelope
    pub fn split(&self, secret: &str, n: usize) -> Result<Vec<EncodedShare>> {
        if n != self.node_count.get() {
            return Err(VaultError::Configuration(format!(
                "Requested {n} shares but the node group has {} nodes",
                self.node_count
            )));
        }

        let mut payload = Zeroizing::new(Vec::with_capacity(1 + secret.len()));
        payload.push(PAYLOAD_VERSION);
        payload.extend_from_slice(secret.as_bytes());

        // Threshold equals node count: every share is required
        let sharks = Sharks(*self.node_count);
        let dealer = sharks.dealer(&payload);

        let mut encoded = Vec::with_capacity(n);
        for (index, share) in self.node_count.indices().zip(dealer.take(n)) {
            let share_bytes = Zeroizing::new(Vec::from(&share));
            encoded.push(self.seal(index, &share_bytes)?);
        }

        Ok(encoded)
    }

    /// Rebuilds the secret from one share per node
    ///
    /// Shares are validated before their count is considered, so a duplicate
    /// node index or a share from another key is reported as a mismatch even
    /// when too few shares are supplied.
    ///
    /// # Errors
    /// - [`VaultError::ShareMismatch`] if shares belong to different records,
    ///   repeat or exceed node indices, come from another key or node group,
    ///   or fail the integrity check
    /// - [`VaultError::IncompleteShareSet`] if fewer shares than nodes remain
    /// - [`VaultError::Combine`] for malformed envelopes and any other
    ///   reconstruction failure
    pub fn combine(&self, shares: &[Share]) -> Result<Zeroizing<String>> {
        let expected = self.node_count.get();
        let mut seen = vec![false; expected];
        let mut parsed = Vec::with_capacity(shares.len());

        for share in shares {
            if share.record_id != shares[0].record_id {
                return Err(VaultError::ShareMismatch(format!(
                    "Shares belong to different records ({} and {})",
                    shares[0].record_id, share.record_id
                )));
            }

            let slot = seen.get_mut(share.node_index.get()).ok_or_else(|| {
                VaultError::ShareMismatch(format!(
                    "Node index {} outside a group of {expected} nodes",
                    share.node_index
                ))
            })?;
            if *slot {
                return Err(VaultError::ShareMismatch(format!(
                    "Duplicate share for node {}",
                    share.node_index
                )));
            }
            *slot = true;

            let payload = self.open(share)?;
            let shamir_share = blahaj::Share::try_from(payload.as_slice()).map_err(|e| {
                VaultError::Combine(format!(
                    "Invalid share payload from node {}: {e:?}",
                    share.node_index
                ))
            })?;
            parsed.push(shamir_share);
        }

        if parsed.len() < expected {
            return Err(VaultError::IncompleteShareSet {
                expected,
                got: parsed.len(),
            });
        }

        let sharks = Sharks(*self.node_count);
        let recovered = Zeroizing::new(
            sharks
                .recover(&parsed)
                .map_err(|e| VaultError::Combine(format!("Failed to recover secret: {e:?}")))?,
        );

        let Some((&version, text)) = recovered.split_first() else {
            return Err(VaultError::Combine("Recovered payload is empty".to_string()));
        };
        if version != PAYLOAD_VERSION {
            return Err(VaultError::Combine(format!(
                "Unknown payload version {version}"
            )));
        }

        let secret = std::str::from_utf8(text)
            .map_err(|e| VaultError::Combine(format!("Recovered secret is not UTF-8: {e}")))?;
        Ok(Zeroizing::new(secret.to_string()))
    }

    /// Wraps a raw Shamir share in an authenticated envelope
    fn seal(&self, index: NodeIndex, share_data: &[u8]) -> Result<EncodedShare> {
        let payload_len = u16::try_from(share_data.len()).map_err(|_| {
            VaultError::Validation(format!(
                "Secret too large: share of {} bytes exceeds 65535",
                share_data.len()
            ))
        })?;

        let mut envelope = Zeroizing::new(Vec::with_capacity(
            HEADER_LEN + share_data.len() + TAG_LEN,
        ));
        envelope.push(FORMAT_VERSION);
        envelope.extend_from_slice(&self.key.version().to_be_bytes());
        envelope.extend_from_slice(&self.key.fingerprint().to_be_bytes());
        envelope.push(*self.node_count);
        envelope.push(*index);
        envelope.extend_from_slice(&payload_len.to_be_bytes());
        envelope.extend_from_slice(share_data);

        let tag = self.key.tag(&envelope)?;
        envelope.extend_from_slice(&tag);

        Ok(EncodedShare::new(BASE64.encode(&*envelope)))
    }

    /// Decodes and authenticates an envelope, returning the raw Shamir share
    fn open(&self, share: &Share) -> Result<Zeroizing<Vec<u8>>> {
        let node = share.node_index;
        let raw = Zeroizing::new(BASE64.decode(share.value.as_str()).map_err(|e| {
            VaultError::Combine(format!("Share from node {node} is not valid base64: {e}"))
        })?);

        if raw.len() < HEADER_LEN + TAG_LEN {
            return Err(VaultError::Combine(format!(
                "Share from node {node} too short: {} bytes",
                raw.len()
            )));
        }

        let header = EnvelopeHeader::parse(&raw);

        if header.format != FORMAT_VERSION {
            return Err(VaultError::Combine(format!(
                "Share from node {node} has unknown format {}",
                header.format
            )));
        }

        let expected_len = HEADER_LEN + header.payload_len + TAG_LEN;
        if raw.len() != expected_len {
            return Err(VaultError::Combine(format!(
                "Share from node {node} size mismatch: expected {expected_len} bytes, got {}",
                raw.len()
            )));
        }

        if header.key_version != self.key.version() {
            return Err(VaultError::ShareMismatch(format!(
                "Share from node {node} uses key version {}, expected {}",
                header.key_version,
                self.key.version()
            )));
        }

        if header.fingerprint != self.key.fingerprint() {
            return Err(VaultError::ShareMismatch(format!(
                "Share from node {node} was produced under a different key"
            )));
        }

        if header.node_count != *self.node_count {
            return Err(VaultError::ShareMismatch(format!(
                "Share from node {node} was split for {} nodes, expected {}",
                header.node_count, self.node_count
            )));
        }

        if header.node_index != *node {
            return Err(VaultError::ShareMismatch(format!(
                "Share retrieved from node {node} was issued to node {}",
                header.node_index
            )));
        }

        let tag_start = HEADER_LEN + header.payload_len;
        if !self.key.verify_tag(&raw[..tag_start], &raw[tag_start..])? {
            return Err(VaultError::ShareMismatch(format!(
                "Share from node {node} failed integrity check"
            )));
        }

        Ok(Zeroizing::new(raw[HEADER_LEN..tag_start].to_vec()))
    }
}
