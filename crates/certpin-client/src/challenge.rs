//! Request challenge binding a signed response to one request.
//!
//! The client sends random bytes in [`CHALLENGE_HEADER`]; the server signs
//! `challenge & "&" & body` and returns the signature in
//! [`SIGNATURE_HEADER`]. A captured response cannot be replayed because the
//! next request carries a different challenge.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use certpin_core::{CryptoProvider, EcPublicKey, PinningError, Result, SignedData};
use tracing::error;

/// Request header carrying the challenge
pub const CHALLENGE_HEADER: &str = "X-Cert-Pinning-Challenge";

/// Response header carrying the signature
pub const SIGNATURE_HEADER: &str = "X-Cert-Pinning-Signature";

/// Default number of random bytes in a challenge
pub const DEFAULT_CHALLENGE_LENGTH: usize = 16;

/// A base64-encoded random challenge for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestChallenge {
    value: String,
}

impl RequestChallenge {
    /// Generate a challenge of `length` random bytes
    pub fn generate(crypto: &dyn CryptoProvider, length: usize) -> Result<Self> {
        Ok(Self {
            value: BASE64.encode(crypto.random_bytes(length)?),
        })
    }

    /// The encoded challenge
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Header name and value to attach to the request
    #[must_use]
    pub fn header(&self) -> (&'static str, &str) {
        (CHALLENGE_HEADER, &self.value)
    }

    /// Bytes the server is expected to sign for `body`
    #[must_use]
    pub fn signed_bytes(&self, body: &[u8]) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.value.len() + 1 + body.len());
        data.extend_from_slice(self.value.as_bytes());
        data.push(b'&');
        data.extend_from_slice(body);
        data
    }

    /// Verify the base64 `signature` of `body` against `key`
    pub fn verify(
        &self,
        crypto: &dyn CryptoProvider,
        body: &[u8],
        signature: Option<&str>,
        key: &EcPublicKey,
    ) -> Result<()> {
        let Some(signature) = signature else {
            error!("missing {SIGNATURE_HEADER} header in response");
            return Err(PinningError::InvalidSignature(format!(
                "missing {SIGNATURE_HEADER} header"
            )));
        };
        let signature = BASE64.decode(signature.trim()).map_err(|e| {
            PinningError::InvalidSignature(format!("{SIGNATURE_HEADER} is not valid base64: {e}"))
        })?;
        let signed = SignedData {
            data: self.signed_bytes(body),
            signature,
        };
        if crypto.verify_ecdsa(&signed, key) {
            Ok(())
        } else {
            error!("invalid signature in {SIGNATURE_HEADER} header");
            Err(PinningError::InvalidSignature(
                "response signature does not match the request challenge".into(),
            ))
        }
    }
}
