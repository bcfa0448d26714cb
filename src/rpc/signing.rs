//! Request signing strategies.
//!
//! JSON envelope signing is a pluggable [`RequestSigner`] strategy; the
//! deployment this core ships with authenticates envelope calls through the
//! signing-system and thumbprint headers and sends a fixed placeholder in
//! the signature header. Binary uploads are always really signed: an
//! RSA-SHA256 signature over the exact byte payload.

use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;

use crate::errors::{FingateError, Result};
use crate::vault::CredentialRecord;

/// Header carrying the request signature (placeholder for JSON envelopes,
/// RSA-SHA256 for binary payloads).
pub const HEADER_SIGNATURE: &str = "x-signature";
/// Header carrying the signing system id.
pub const HEADER_SIGNING_SYSTEM: &str = "x-signing-system";
/// Header carrying the signing key thumbprint.
pub const HEADER_THUMBPRINT: &str = "x-signing-thumbprint";

/// Strategy producing the signature header for a JSON envelope body.
pub trait RequestSigner: Send + Sync {
    fn sign_envelope(&self, credentials: &CredentialRecord, body: &[u8]) -> Result<String>;
}

/// The placeholder strategy: a fixed sentinel value in the signature
/// header. The backend authenticates envelope calls through the signing
/// metadata headers instead.
pub struct StaticEnvelopeSigner {
    value: String,
}

impl StaticEnvelopeSigner {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

impl Default for StaticEnvelopeSigner {
    fn default() -> Self {
        Self::new("UNSIGNED")
    }
}

impl RequestSigner for StaticEnvelopeSigner {
    fn sign_envelope(&self, _credentials: &CredentialRecord, _body: &[u8]) -> Result<String> {
        Ok(self.value.clone())
    }
}

fn parse_private_key(credentials: &CredentialRecord) -> Result<RsaPrivateKey> {
    let pem = credentials.private_key.expose_secret();
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|_| FingateError::crypto("Stored private key could not be parsed"))
}

/// RSA-SHA256 (PKCS#1 v1.5) signature over an exact byte payload, returned
/// as base64 with any line breaks stripped.
pub fn sign_bytes(credentials: &CredentialRecord, payload: &[u8]) -> Result<String> {
    let private_key = parse_private_key(credentials)?;
    let signing_key = SigningKey::<Sha256>::new(private_key);
    let signature = signing_key.sign(payload);

    let encoded = base64::engine::general_purpose::STANDARD.encode(signature.to_bytes());
    Ok(encoded.replace(['\r', '\n'], ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymat;
    use crate::secrets::SecretString;
    use rsa::pkcs1v15::VerifyingKey;
    use rsa::pkcs8::DecodePublicKey;
    use rsa::signature::Verifier;
    use rsa::RsaPublicKey;

    fn credentials() -> (CredentialRecord, String) {
        let pair = keymat::generate_key_pair().unwrap();
        let record = CredentialRecord {
            private_key: SecretString::new(pair.private_key_pem.expose_secret()),
            signing_system_id: "FINGATE-OPS-01".to_string(),
            signing_thumbprint: pair.thumbprint.clone(),
        };
        (record, pair.public_key_pem)
    }

    #[test]
    fn test_static_signer_ignores_body() {
        let (record, _) = credentials();
        let signer = StaticEnvelopeSigner::default();
        let a = signer.sign_envelope(&record, b"{\"method\":\"a\"}").unwrap();
        let b = signer.sign_envelope(&record, b"{\"method\":\"b\"}").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "UNSIGNED");
    }

    #[test]
    fn test_sign_bytes_verifies_against_public_key() {
        let (record, public_pem) = credentials();
        let payload = b"raw document bytes";

        let signature_b64 = sign_bytes(&record, payload).unwrap();
        let signature_bytes =
            base64::engine::general_purpose::STANDARD.decode(&signature_b64).unwrap();

        let public_key = RsaPublicKey::from_public_key_pem(&public_pem).unwrap();
        let verifying_key = VerifyingKey::<Sha256>::new(public_key);
        let signature = rsa::pkcs1v15::Signature::try_from(signature_bytes.as_slice()).unwrap();
        verifying_key.verify(payload, &signature).unwrap();
    }

    #[test]
    fn test_signature_has_no_line_breaks() {
        let (record, _) = credentials();
        let signature = sign_bytes(&record, &[0u8; 4096]).unwrap();
        assert!(!signature.contains('\n'));
        assert!(!signature.contains('\r'));
    }

    #[test]
    fn test_signature_depends_on_payload() {
        let (record, _) = credentials();
        let a = sign_bytes(&record, b"payload a").unwrap();
        let b = sign_bytes(&record, b"payload b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_unparseable_key_is_a_crypto_error() {
        let record = CredentialRecord {
            private_key: SecretString::new("not a pem"),
            signing_system_id: "FINGATE-OPS-01".to_string(),
            signing_thumbprint: "00".repeat(20),
        };
        let err = sign_bytes(&record, b"payload").unwrap_err();
        assert!(matches!(err, FingateError::Crypto(_)));
    }
}
