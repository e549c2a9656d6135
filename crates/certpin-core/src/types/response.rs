use crate::encoding;
use crate::error::{PinningError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The signed fingerprint feed, as received from the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerResponse {
    /// Fingerprint entries
    #[serde(default)]
    pub fingerprints: Vec<FingerprintEntry>,

    /// Server time, sent by servers that sign whole responses
    #[serde(
        default,
        with = "encoding::opt_epoch_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,

    /// Set by a provider after it verified a signature over the whole
    /// response body. Entries without their own signature are accepted
    /// only when this is true.
    #[serde(skip)]
    pub response_signature_verified: bool,
}

impl ServerResponse {
    /// Decode a response body
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| PinningError::InvalidData(e.to_string()))
    }
}

/// One fingerprint entry of the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintEntry {
    /// Common name
    pub name: String,

    /// SHA-256 fingerprint
    #[serde(with = "encoding::base64_bytes")]
    pub fingerprint: Vec<u8>,

    /// Expiration date
    #[serde(with = "encoding::epoch_seconds")]
    pub expires: DateTime<Utc>,

    /// ECDSA signature over [`FingerprintEntry::signed_bytes`]. Servers that
    /// sign the whole response may omit it.
    #[serde(
        default,
        with = "encoding::opt_base64_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub signature: Option<Vec<u8>>,
}

impl FingerprintEntry {
    /// Bytes covered by the entry signature: `name&base64(fingerprint)&expires`
    #[must_use]
    pub fn signed_bytes(&self) -> Vec<u8> {
        format!(
            "{}&{}&{}",
            self.name,
            BASE64.encode(&self.fingerprint),
            encoding::ceil_to_second(self.expires).timestamp()
        )
        .into_bytes()
    }
}
