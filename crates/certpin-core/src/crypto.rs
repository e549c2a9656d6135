//! Cryptographic capabilities consumed by the trust store.

use crate::error::{PinningError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// An imported EC public key.
///
/// The bytes are whatever the [`CryptoProvider`] that imported the key needs
/// to verify signatures later; the default provider stores an uncompressed
/// SEC1 point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcPublicKey {
    bytes: Vec<u8>,
}

impl EcPublicKey {
    /// Wrap provider-specific key bytes
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }

    /// Provider-specific key bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Data together with the signature calculated over it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedData {
    /// Signed bytes
    pub data: Vec<u8>,
    /// ECDSA signature of `data`
    pub signature: Vec<u8>,
}

/// Hashing, signature verification and randomness.
///
/// Implementations are stateless from the store's point of view and must be
/// safe to share between threads.
pub trait CryptoProvider: Send + Sync {
    /// Compute SHA-256 of `data`
    fn sha256(&self, data: &[u8]) -> [u8; 32];

    /// Import an EC public key from its encoded form. Returns `None` if the
    /// key cannot be used.
    fn import_public_key(&self, encoded: &[u8]) -> Option<EcPublicKey>;

    /// Returns true if `signed.signature` is a valid ECDSA signature of `signed.data`
    fn verify_ecdsa(&self, signed: &SignedData, key: &EcPublicKey) -> bool;

    /// Produce `len` bytes from a CSPRNG
    fn random_bytes(&self, len: usize) -> Result<Vec<u8>>;
}

/// Decode a base64 public key and import it, failing with a configuration error.
pub fn import_public_key_base64(crypto: &dyn CryptoProvider, public_key: &str) -> Result<EcPublicKey> {
    let encoded = BASE64
        .decode(public_key.trim())
        .map_err(|e| PinningError::Config(format!("public key is not valid base64: {e}")))?;
    crypto
        .import_public_key(&encoded)
        .ok_or_else(|| PinningError::Config("public key cannot be imported".into()))
}
