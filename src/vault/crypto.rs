//! Passphrase-based sealing for vault files.
//!
//! A 32-byte key is derived from the master passphrase with
//! PBKDF2-HMAC-SHA512 over a fresh random salt, then the serialized
//! credential record is sealed with AES-256-GCM under a fresh random
//! 16-byte IV. Decryption fails closed: tampering, a wrong passphrase, or
//! a malformed file all collapse to the same typed error and never yield
//! partial plaintext.

use std::num::NonZeroU32;

use aes_gcm::aead::generic_array::typenum::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use crate::errors::{FingateError, Result};
use crate::secrets::SecretString;

use super::blob::{EncryptedBlob, IV_LEN, SALT_LEN, TAG_LEN};

/// AES-256-GCM with the 16-byte IV the vault file format requires.
type VaultCipher = AesGcm<Aes256, U16>;

/// Derived key length (AES-256).
const KEY_LEN: usize = 32;

/// Fixed PBKDF2 iteration count. Changing it would orphan every existing
/// vault file, so it is a constant rather than configuration.
const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => unreachable!(),
};

fn derive_key(passphrase: &SecretString, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA512,
        PBKDF2_ITERATIONS,
        salt,
        passphrase.expose_secret().as_bytes(),
        &mut *key,
    );
    key
}

/// Seal a serialized credential record under the master passphrase.
///
/// Every call draws a fresh salt and IV, so sealing the same plaintext
/// twice produces unrelated blobs.
pub fn seal(passphrase: &SecretString, plaintext: &[u8]) -> Result<EncryptedBlob> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| FingateError::crypto("Failed to generate random salt"))?;
    let mut iv = [0u8; IV_LEN];
    rng.fill(&mut iv)
        .map_err(|_| FingateError::crypto("Failed to generate random IV"))?;

    let key = derive_key(passphrase, &salt);
    let cipher = VaultCipher::new_from_slice(&*key)
        .map_err(|_| FingateError::crypto("Failed to initialize vault cipher"))?;

    // The AEAD appends the tag to the ciphertext; the file format stores it
    // between the IV and the ciphertext.
    let mut sealed = cipher
        .encrypt(Nonce::<U16>::from_slice(&iv), plaintext)
        .map_err(|_| FingateError::crypto("Vault encryption failed"))?;

    if sealed.len() < TAG_LEN {
        return Err(FingateError::crypto("Vault encryption produced a short buffer"));
    }
    let tag_vec = sealed.split_off(sealed.len() - TAG_LEN);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&tag_vec);

    Ok(EncryptedBlob { salt, iv, tag, ciphertext: sealed })
}

/// Open a sealed blob. Any failure (wrong passphrase, tampered tag or
/// ciphertext) maps to one opaque crypto error.
pub fn open(passphrase: &SecretString, blob: &EncryptedBlob) -> Result<Zeroizing<Vec<u8>>> {
    let key = derive_key(passphrase, &blob.salt);
    let cipher = VaultCipher::new_from_slice(&*key)
        .map_err(|_| FingateError::crypto("Failed to initialize vault cipher"))?;

    let mut sealed = Vec::with_capacity(blob.ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(&blob.ciphertext);
    sealed.extend_from_slice(&blob.tag);

    let plaintext = cipher
        .decrypt(Nonce::<U16>::from_slice(&blob.iv), sealed.as_slice())
        .map_err(|_| FingateError::crypto("Vault decryption failed (wrong passphrase or tampering)"))?;

    Ok(Zeroizing::new(plaintext))
}
