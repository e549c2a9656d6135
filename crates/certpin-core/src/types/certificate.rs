use crate::encoding::{self, ceil_to_second};
use crate::error::{PinningError, Result};
use crate::types::FingerprintEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// SHA-256 digest of a DER-encoded certificate
pub type Fingerprint = [u8; 32];

/// A trusted fingerprint for a common name, with its expiration date.
///
/// Unlike the entry received from the server, this value carries no signature.
/// Equality is structural over all three fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificateInfo {
    #[serde(rename = "n")]
    common_name: String,

    #[serde(rename = "f", with = "encoding::fingerprint")]
    fingerprint: Fingerprint,

    #[serde(rename = "e", with = "encoding::epoch_seconds")]
    expires: DateTime<Utc>,
}

impl CertificateInfo {
    /// Create a new certificate info. The expiration is rounded up to a whole second.
    #[must_use]
    pub fn new(common_name: impl Into<String>, fingerprint: Fingerprint, expires: DateTime<Utc>) -> Self {
        Self {
            common_name: common_name.into(),
            fingerprint,
            expires: ceil_to_second(expires),
        }
    }

    /// Certificate's common name
    #[must_use]
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    /// SHA-256 fingerprint of the certificate
    #[must_use]
    pub const fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Certificate's expiration date
    #[must_use]
    pub const fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// Returns true if the certificate expired before `date`
    #[must_use]
    pub fn is_expired(&self, date: DateTime<Utc>) -> bool {
        self.expires < date
    }

    /// Canonical ordering: ascending common name, later expiration first,
    /// then fingerprint bytes.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.common_name
            .cmp(&other.common_name)
            .then_with(|| other.expires.cmp(&self.expires))
            .then_with(|| self.fingerprint.cmp(&other.fingerprint))
    }
}

impl TryFrom<&FingerprintEntry> for CertificateInfo {
    type Error = PinningError;

    fn try_from(entry: &FingerprintEntry) -> Result<Self> {
        let fingerprint = Fingerprint::try_from(entry.fingerprint.as_slice()).map_err(|_| {
            PinningError::InvalidData(format!(
                "fingerprint for '{}' has {} bytes, expected 32",
                entry.name,
                entry.fingerprint.len()
            ))
        })?;
        Ok(Self::new(entry.name.clone(), fingerprint, entry.expires))
    }
}

/// Sort certificates into canonical order.
pub fn sort_certificates(certificates: &mut [CertificateInfo]) {
    certificates.sort_by(CertificateInfo::canonical_cmp);
}
