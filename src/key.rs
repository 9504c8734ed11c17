//! Secret-sharing key held for the lifetime of the process
//!
//! The key never leaves the process and cannot be derived from shares. It
//! authenticates every share envelope, so shares produced under another key
//! (or tampered with on a node) are rejected before reconstruction.
//!
//! Keys are persisted as 24-word BIP39 phrases so they can sit in the settings
//! file next to the node list.

use bip39::{Language, Mnemonic};
use crc::{CRC_32_ISO_HDLC, Crc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Result, VaultError};

/// CRC32 algorithm for key fingerprints
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Length of the key material in bytes
pub const KEY_LEN: usize = 32;

/// Length of the truncated HMAC-SHA256 tag carried by each share
pub const TAG_LEN: usize = 16;

type HmacSha256 = Hmac<Sha256>;

/// Versioned secret-sharing key
#[derive(Clone)]
pub struct SharingKey {
    version: u32,
    material: Zeroizing<[u8; KEY_LEN]>,
}

impl SharingKey {
    /// Generates a new random key
    #[must_use]
    pub fn generate(version: u32) -> Self {
        let mut material = Zeroizing::new([0u8; KEY_LEN]);
        rand::rng().fill_bytes(&mut *material);
        Self { version, material }
    }

    /// Loads a key from its BIP39 phrase
    ///
    /// # Errors
    /// Returns a configuration error if the phrase is not a valid 24-word mnemonic
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sharevault::key::SharingKey;
    ///
    /// let key = SharingKey::generate(1);
    /// let phrase = key.to_mnemonic();
    ///
    /// let loaded = SharingKey::from_mnemonic(&phrase, 1).unwrap();
    /// assert_eq!(key.fingerprint(), loaded.fingerprint());
    ///
    /// assert!(SharingKey::from_mnemonic("not a mnemonic", 1).is_err());
    /// ```
    pub fn from_mnemonic(phrase: &str, version: u32) -> Result<Self> {
        let mnemonic = Mnemonic::parse_in(Language::English, phrase)
            .map_err(|e| VaultError::Configuration(format!("Invalid key mnemonic: {e}")))?;
        let entropy = Zeroizing::new(mnemonic.to_entropy());

        if entropy.len() != KEY_LEN {
            return Err(VaultError::Configuration(format!(
                "Key mnemonic must encode {KEY_LEN} bytes (24 words), got {} bytes",
                entropy.len()
            )));
        }

        let mut material = Zeroizing::new([0u8; KEY_LEN]);
        material.copy_from_slice(&entropy);
        Ok(Self { version, material })
    }

    /// Encodes the key material as a 24-word BIP39 phrase
    #[must_use]
    pub fn to_mnemonic(&self) -> Zeroizing<String> {
        let mnemonic = Mnemonic::from_entropy(&*self.material)
            .unwrap_or_else(|_| unreachable!("32 bytes is a valid BIP39 entropy length"));
        Zeroizing::new(mnemonic.to_string())
    }

    /// Gets the key version
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// CRC32 of the key material, used to tell keys of the same version apart
    #[must_use]
    pub fn fingerprint(&self) -> u32 {
        CRC32.checksum(&*self.material)
    }

    /// Computes the truncated authentication tag over `data`
    pub(crate) fn tag(&self, data: &[u8]) -> Result<[u8; TAG_LEN]> {
        let mut mac = self.mac()?;
        mac.update(data);
        let full = mac.finalize().into_bytes();

        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&full[..TAG_LEN]);
        Ok(tag)
    }

    /// Checks `tag` against `data` in constant time
    pub(crate) fn verify_tag(&self, data: &[u8], tag: &[u8]) -> Result<bool> {
        let mut mac = self.mac()?;
        mac.update(data);
        Ok(mac.verify_truncated_left(tag).is_ok())
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&*self.material)
            .map_err(|e| VaultError::Configuration(format!("Invalid sharing key: {e}")))
    }
}

impl std::fmt::Debug for SharingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharingKey")
            .field("version", &self.version)
            .field("fingerprint", &format_args!("{:08x}", self.fingerprint()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mnemonic_round_trip_preserves_material() {
        let key = SharingKey::generate(7);
        let phrase = key.to_mnemonic();
        assert_eq!(phrase.split_whitespace().count(), 24);

        let loaded = SharingKey::from_mnemonic(&phrase, 7).unwrap();
        assert_eq!(*key.material, *loaded.material);
        assert_eq!(loaded.version(), 7);
    }

    #[test]
    fn test_short_mnemonic_rejected() {
        // Valid 12-word phrase carries only 16 bytes of entropy
        let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let err = SharingKey::from_mnemonic(phrase, 1).unwrap_err();
        assert!(err.to_string().contains("24 words"));
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = SharingKey::generate(1);
        let b = SharingKey::generate(1);
        assert_ne!(*a.material, *b.material);
    }

    #[test]
    fn test_tag_verification() {
        let key = SharingKey::generate(1);
        let tag = key.tag(b"envelope").unwrap();

        assert!(key.verify_tag(b"envelope", &tag).unwrap());
        assert!(!key.verify_tag(b"envelopf", &tag).unwrap());

        let other = SharingKey::generate(1);
        assert!(!other.verify_tag(b"envelope", &tag).unwrap());
    }

    #[test]
    fn test_debug_hides_material() {
        let key = SharingKey::generate(3);
        let debug = format!("{key:?}");
        assert!(debug.contains("version: 3"));
        assert!(!debug.contains("material"));
    }
}
