use crate::encoding::{self, ceil_to_second};
use crate::error::Result;
use crate::types::{sort_certificates, CertificateInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the trust store persists: the certificate set and the date
/// of the next scheduled silent update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedData {
    #[serde(rename = "c")]
    certificates: Vec<CertificateInfo>,

    #[serde(rename = "u", with = "encoding::epoch_seconds")]
    next_update: DateTime<Utc>,
}

impl CachedData {
    /// Create cached data. Certificates are put into canonical order and
    /// `next_update` is rounded up to a whole second.
    #[must_use]
    pub fn new(mut certificates: Vec<CertificateInfo>, next_update: DateTime<Utc>) -> Self {
        sort_certificates(&mut certificates);
        Self {
            certificates,
            next_update: ceil_to_second(next_update),
        }
    }

    /// Certificates in canonical order
    #[must_use]
    pub fn certificates(&self) -> &[CertificateInfo] {
        &self.certificates
    }

    /// Date of the next scheduled silent update
    #[must_use]
    pub const fn next_update(&self) -> DateTime<Utc> {
        self.next_update
    }

    /// Number of certificates not yet expired at `date`
    #[must_use]
    pub fn number_of_valid_certificates(&self, date: DateTime<Utc>) -> usize {
        self.certificates.iter().filter(|c| !c.is_expired(date)).count()
    }

    /// Serialize to the persisted JSON format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from the persisted JSON format
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let mut cached: Self = serde_json::from_slice(data)?;
        sort_certificates(&mut cached.certificates);
        Ok(cached)
    }
}
