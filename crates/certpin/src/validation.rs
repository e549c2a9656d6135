//! Trust queries.

use crate::store::CertStore;
use certpin_core::CachedData;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Verdict for a certificate presented during a TLS handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationResult {
    /// The fingerprint is pinned for the common name
    Trusted,
    /// Pins exist for the common name but none matches, or the name is not expected
    Untrusted,
    /// Nothing is known about the common name; update and try again
    Empty,
}

impl CertStore {
    /// Validate a certificate fingerprint for `common_name`.
    ///
    /// Never touches the network. Expired entries of the cache are still
    /// matched; expired fallback certificates are not.
    #[must_use]
    pub fn validate(&self, common_name: &str, fingerprint: &[u8]) -> ValidationResult {
        if !self.inner.config.is_expected_common_name(common_name) {
            warn!(common_name, "common name is not expected");
            return ValidationResult::Untrusted;
        }

        let cached = self.cached_data();
        let now = Utc::now();
        let persisted = cached.as_deref().map_or(&[][..], CachedData::certificates);
        let fallback = self.inner.fallback.iter().filter(|info| !info.is_expired(now));

        let mut name_found = false;
        for info in persisted.iter().chain(fallback) {
            if info.common_name() != common_name {
                continue;
            }
            if info.fingerprint().as_slice() == fingerprint {
                return ValidationResult::Trusted;
            }
            name_found = true;
        }

        if name_found {
            ValidationResult::Untrusted
        } else {
            ValidationResult::Empty
        }
    }

    /// Validate a DER encoded certificate for `common_name`
    #[must_use]
    pub fn validate_certificate(&self, common_name: &str, der: &[u8]) -> ValidationResult {
        let fingerprint = self.inner.crypto.sha256(der);
        self.validate(common_name, &fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use crate::CertStoreConfig;
    use certpin_core::{CertificateInfo, CryptoProvider, MemoryDataStore};
    use chrono::TimeDelta;
    use std::sync::Arc;

    fn store(config: CertStoreConfig) -> CertStore {
        CertStore::with_remote_provider(
            config,
            Arc::new(TestingCryptoProvider::new()),
            Arc::new(MemoryDataStore::new()),
            Arc::new(TestingRemoteDataProvider::new()),
        )
        .unwrap()
    }

    fn install(store: &CertStore, certificates: Vec<CertificateInfo>) {
        let next = Utc::now() + TimeDelta::days(1);
        store
            .update_cached_data(|_| Ok(Some(CachedData::new(certificates, next))))
            .unwrap();
    }

    #[test]
    fn test_empty_store() {
        let store = store(test_config());
        assert_eq!(store.validate("x.example", &fingerprint(1)), ValidationResult::Empty);
    }

    #[test]
    fn test_trusted_untrusted_empty() {
        let store = store(test_config());
        let expires = Utc::now() + TimeDelta::seconds(60);
        install(&store, vec![CertificateInfo::new("a.com", fingerprint(1), expires)]);

        assert_eq!(store.validate("a.com", &fingerprint(1)), ValidationResult::Trusted);
        assert_eq!(store.validate("a.com", &fingerprint(2)), ValidationResult::Untrusted);
        assert_eq!(store.validate("b.com", &fingerprint(1)), ValidationResult::Empty);
    }

    #[test]
    fn test_any_matching_pin_is_trusted() {
        let store = store(test_config());
        let now = Utc::now();
        install(
            &store,
            vec![
                CertificateInfo::new("a.com", fingerprint(1), now + TimeDelta::days(10)),
                CertificateInfo::new("a.com", fingerprint(2), now + TimeDelta::days(40)),
            ],
        );
        assert_eq!(store.validate("a.com", &fingerprint(1)), ValidationResult::Trusted);
        assert_eq!(store.validate("a.com", &fingerprint(2)), ValidationResult::Trusted);
    }

    #[test]
    fn test_expired_cache_entries_still_match() {
        let store = store(test_config());
        let expired = Utc::now() - TimeDelta::days(1);
        install(&store, vec![CertificateInfo::new("a.com", fingerprint(1), expired)]);
        assert_eq!(store.validate("a.com", &fingerprint(1)), ValidationResult::Trusted);
    }

    #[test]
    fn test_fingerprint_of_wrong_length_never_matches() {
        let store = store(test_config());
        let expires = Utc::now() + TimeDelta::days(1);
        install(&store, vec![CertificateInfo::new("a.com", fingerprint(1), expires)]);
        assert_eq!(store.validate("a.com", &[1; 16]), ValidationResult::Untrusted);
    }

    #[test]
    fn test_unexpected_common_name_is_untrusted() {
        let store = store(test_config().expected_common_names(["a.com"]));
        let expires = Utc::now() + TimeDelta::days(1);
        install(
            &store,
            vec![
                CertificateInfo::new("a.com", fingerprint(1), expires),
                CertificateInfo::new("b.com", fingerprint(2), expires),
            ],
        );

        assert_eq!(store.validate("a.com", &fingerprint(1)), ValidationResult::Trusted);
        assert_eq!(store.validate("b.com", &fingerprint(2)), ValidationResult::Untrusted);
        assert_eq!(store.validate("c.com", &fingerprint(3)), ValidationResult::Untrusted);
    }

    #[test]
    fn test_fallback_certificates() {
        let config = test_config().fallback_certificates(
            r#"{"fingerprints":[
                {"name":"a.com","fingerprint":"AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=","expires":4102444800},
                {"name":"old.com","fingerprint":"AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=","expires":946684800}
            ]}"#,
        );
        let store = store(config);

        assert_eq!(store.validate("a.com", &fingerprint(1)), ValidationResult::Trusted);
        assert_eq!(store.validate("a.com", &fingerprint(2)), ValidationResult::Untrusted);
        assert_eq!(store.validate("old.com", &fingerprint(1)), ValidationResult::Empty);
        assert!(store.cached_data().is_none());
    }

    #[test]
    fn test_fallback_combines_with_cache() {
        let config = test_config().fallback_certificates(
            r#"{"fingerprints":[{"name":"a.com","fingerprint":"AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=","expires":4102444800}]}"#,
        );
        let store = store(config);
        install(
            &store,
            vec![CertificateInfo::new("a.com", fingerprint(2), Utc::now() + TimeDelta::days(1))],
        );

        assert_eq!(store.validate("a.com", &fingerprint(1)), ValidationResult::Trusted);
        assert_eq!(store.validate("a.com", &fingerprint(2)), ValidationResult::Trusted);
    }

    #[test]
    fn test_validate_certificate_hashes_der() {
        let store = store(test_config());
        let der = b"0\x82\x01\x0a certificate bytes";
        let digest = TestingCryptoProvider::new().sha256(der);
        install(
            &store,
            vec![CertificateInfo::new("a.com", digest, Utc::now() + TimeDelta::days(1))],
        );

        assert_eq!(store.validate_certificate("a.com", der), ValidationResult::Trusted);
        assert_eq!(store.validate_certificate("a.com", b"other"), ValidationResult::Untrusted);
    }
}
