//! On-disk representation of an encrypted credential file.
//!
//! A vault file is one base64 string over `salt ‖ iv ‖ tag ‖ ciphertext`.
//! The salt feeds the passphrase KDF, the IV and tag belong to the
//! AES-256-GCM seal. Lengths are fixed by the file format and checked on
//! decode.

use base64::Engine;

use crate::errors::{FingateError, Result};

/// KDF salt length in bytes.
pub const SALT_LEN: usize = 64;

/// AES-GCM initialization vector length in bytes. The file format predates
/// the 96-bit-nonce convention and pins 16 bytes.
pub const IV_LEN: usize = 16;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Decoded layout of a vault file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Encode as the single base64 string written to disk.
    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(SALT_LEN + IV_LEN + TAG_LEN + self.ciphertext.len());
        raw.extend_from_slice(&self.salt);
        raw.extend_from_slice(&self.iv);
        raw.extend_from_slice(&self.tag);
        raw.extend_from_slice(&self.ciphertext);
        base64::engine::general_purpose::STANDARD.encode(raw)
    }

    /// Decode a vault file body. Trailing whitespace is tolerated; anything
    /// shorter than the fixed header is rejected.
    pub fn decode(contents: &str) -> Result<Self> {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(contents.trim())
            .map_err(|e| FingateError::crypto(format!("Vault file is not valid base64: {}", e)))?;

        if raw.len() < SALT_LEN + IV_LEN + TAG_LEN {
            return Err(FingateError::crypto(format!(
                "Vault file too short: {} bytes, need at least {}",
                raw.len(),
                SALT_LEN + IV_LEN + TAG_LEN
            )));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&raw[..SALT_LEN]);
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&raw[SALT_LEN..SALT_LEN + IV_LEN]);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&raw[SALT_LEN + IV_LEN..SALT_LEN + IV_LEN + TAG_LEN]);
        let ciphertext = raw[SALT_LEN + IV_LEN + TAG_LEN..].to_vec();

        Ok(Self { salt, iv, tag, ciphertext })
    }
}
