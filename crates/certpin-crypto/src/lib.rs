//! Default [`CryptoProvider`] for certpin.
//!
//! SHA-256 and randomness come from `ring`, ECDSA P-256 key import and
//! signature verification from `p256`. Public keys are accepted either as a
//! SEC1 point (compressed or uncompressed) or as a DER `SubjectPublicKeyInfo`;
//! signatures either as ASN.1 DER or as the fixed 64-byte `r || s` form.

#![doc(html_root_url = "https://docs.rs/certpin-crypto/1.0.0")]

use certpin_core::{CryptoProvider, EcPublicKey, PinningError, Result, SignedData};
use p256::ecdsa::{signature::Verifier, Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use ring::digest::{digest, SHA256};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::debug;

/// [`CryptoProvider`] backed by `ring` and `p256`
#[derive(Debug, Clone)]
pub struct RustCryptoProvider {
    rng: SystemRandom,
}

impl Default for RustCryptoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RustCryptoProvider {
    /// Create a provider using the system CSPRNG
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl CryptoProvider for RustCryptoProvider {
    fn sha256(&self, data: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(digest(&SHA256, data).as_ref());
        out
    }

    fn import_public_key(&self, encoded: &[u8]) -> Option<EcPublicKey> {
        let key = VerifyingKey::from_sec1_bytes(encoded)
            .or_else(|_| VerifyingKey::from_public_key_der(encoded))
            .map_err(|e| debug!(error = %e, "rejected EC public key"))
            .ok()?;
        Some(EcPublicKey::from_bytes(key.to_encoded_point(false).as_bytes()))
    }

    fn verify_ecdsa(&self, signed: &SignedData, key: &EcPublicKey) -> bool {
        let Ok(key) = VerifyingKey::from_sec1_bytes(key.as_bytes()) else {
            return false;
        };
        let Ok(signature) = Signature::from_der(&signed.signature)
            .or_else(|_| Signature::from_slice(&signed.signature))
        else {
            return false;
        };
        key.verify(&signed.data, &signature).is_ok()
    }

    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.rng
            .fill(&mut buf)
            .map_err(|_| PinningError::Config("system random generator is unavailable".into()))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use p256::ecdsa::{signature::Signer, SigningKey};
    use p256::pkcs8::EncodePublicKey;

    fn signing_key() -> SigningKey {
        SigningKey::from_slice(&[0x5a; 32]).unwrap()
    }

    fn sign(key: &SigningKey, data: &[u8]) -> Vec<u8> {
        let signature: Signature = key.sign(data);
        signature.to_der().as_bytes().to_vec()
    }

    fn public_key(provider: &RustCryptoProvider) -> EcPublicKey {
        let signing = signing_key();
        let point = signing.verifying_key().to_encoded_point(false);
        provider.import_public_key(point.as_bytes()).unwrap()
    }

    #[test]
    fn test_sha256() {
        let hash = RustCryptoProvider::new().sha256(b"hello world");
        assert_eq!(
            BASE64.encode(hash),
            "uU0nuZNNPgilLlLX2n2r+sSE7+N6U4DukIj3rOLvzek="
        );
    }

    #[test]
    fn test_import_sec1_and_spki_agree() {
        let provider = RustCryptoProvider::new();
        let signing = signing_key();
        let verifying = signing.verifying_key();

        let from_point = provider
            .import_public_key(verifying.to_encoded_point(false).as_bytes())
            .unwrap();
        let from_compressed = provider
            .import_public_key(verifying.to_encoded_point(true).as_bytes())
            .unwrap();
        let der = verifying.to_public_key_der().unwrap();
        let from_spki = provider.import_public_key(der.as_bytes()).unwrap();

        assert_eq!(from_point, from_spki);
        assert_eq!(from_point, from_compressed);
        assert_eq!(from_point.as_bytes().len(), 65);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let provider = RustCryptoProvider::new();
        assert!(provider.import_public_key(b"").is_none());
        assert!(provider.import_public_key(&[4; 65]).is_none());
        assert!(provider.import_public_key(b"definitely not a key").is_none());
    }

    #[test]
    fn test_verify_signature() {
        let provider = RustCryptoProvider::new();
        let key = public_key(&provider);
        let data = b"github.com&AQEB&1700000000".to_vec();
        let signature = sign(&signing_key(), &data);

        assert!(provider.verify_ecdsa(&SignedData { data: data.clone(), signature: signature.clone() }, &key));

        let mut tampered = data.clone();
        tampered[0] = b'G';
        assert!(!provider.verify_ecdsa(&SignedData { data: tampered, signature }, &key));
    }

    #[test]
    fn test_verify_accepts_fixed_size_signature() {
        let provider = RustCryptoProvider::new();
        let key = public_key(&provider);
        let signature: Signature = signing_key().sign(b"payload");
        let signed = SignedData {
            data: b"payload".to_vec(),
            signature: signature.to_bytes().to_vec(),
        };
        assert!(provider.verify_ecdsa(&signed, &key));
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let provider = RustCryptoProvider::new();
        let other = SigningKey::from_slice(&[0x33; 32]).unwrap();
        let signed = SignedData {
            data: b"payload".to_vec(),
            signature: sign(&other, b"payload"),
        };
        assert!(!provider.verify_ecdsa(&signed, &public_key(&provider)));
        assert!(!provider.verify_ecdsa(
            &SignedData { data: b"payload".to_vec(), signature: b"junk".to_vec() },
            &public_key(&provider)
        ));
    }

    #[test]
    fn test_random_bytes() {
        let provider = RustCryptoProvider::new();
        let a = provider.random_bytes(16).unwrap();
        let b = provider.random_bytes(16).unwrap();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
        assert!(provider.random_bytes(0).unwrap().is_empty());
    }
}
