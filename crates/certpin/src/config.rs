//! Trust store configuration.

use certpin_client::{NetworkConfig, SslValidationStrategy, DEFAULT_TIMEOUT};
use certpin_core::scheduler::{
    DEFAULT_EXPIRATION_UPDATE_THRESHOLD, DEFAULT_PERIODIC_UPDATE_INTERVAL,
    DEFAULT_THRESHOLD_MULTIPLIER,
};
use certpin_core::{
    import_public_key_base64, sort_certificates, CertificateInfo, CryptoProvider, EcPublicKey,
    PinningError, Result, ServerResponse, UpdateScheduler,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Identifier used when none is configured
pub const DEFAULT_INSTANCE_IDENTIFIER: &str = "default";

/// Configuration for [`CertStore`](crate::CertStore)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertStoreConfig {
    /// URL of the signed fingerprint feed
    pub service_url: Url,

    /// Base64 encoded ECDSA P-256 public key that signs the feed
    pub public_key: String,

    /// Key under which the cache is persisted. Defaults to `"default"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// If set, only these common names can ever be trusted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_common_names: Option<Vec<String>>,

    /// Unsigned JSON blob in the feed format, trusted in addition to downloaded data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_certificates: Option<String>,

    /// Upper bound for the time between two silent updates
    #[serde(default = "default_periodic_update_interval", with = "duration_secs")]
    pub periodic_update_interval: Duration,

    /// Window before an expiration in which updates become more frequent
    #[serde(default = "default_expiration_update_threshold", with = "duration_secs")]
    pub expiration_update_threshold: Duration,

    /// Factor in `(0, 1]` applied to the wait inside the expiration window
    #[serde(default = "default_threshold_multiplier")]
    pub threshold_multiplier: f64,

    /// Bind each response to its request with a random challenge
    #[serde(default)]
    pub use_challenge: bool,

    /// TLS validation for the feed request
    #[serde(default)]
    pub ssl_validation: SslValidationStrategy,

    /// Feed request timeout
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
}

const fn default_periodic_update_interval() -> Duration {
    DEFAULT_PERIODIC_UPDATE_INTERVAL
}

const fn default_expiration_update_threshold() -> Duration {
    DEFAULT_EXPIRATION_UPDATE_THRESHOLD
}

const fn default_threshold_multiplier() -> f64 {
    DEFAULT_THRESHOLD_MULTIPLIER
}

const fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl CertStoreConfig {
    /// Create a configuration with default settings
    #[must_use]
    pub fn new(service_url: Url, public_key: impl Into<String>) -> Self {
        Self {
            service_url,
            public_key: public_key.into(),
            identifier: None,
            expected_common_names: None,
            fallback_certificates: None,
            periodic_update_interval: DEFAULT_PERIODIC_UPDATE_INTERVAL,
            expiration_update_threshold: DEFAULT_EXPIRATION_UPDATE_THRESHOLD,
            threshold_multiplier: DEFAULT_THRESHOLD_MULTIPLIER,
            use_challenge: false,
            ssl_validation: SslValidationStrategy::Default,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the instance identifier
    #[must_use]
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Restrict trust to the given common names
    #[must_use]
    pub fn expected_common_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_common_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set the fallback certificates blob
    #[must_use]
    pub fn fallback_certificates(mut self, json: impl Into<String>) -> Self {
        self.fallback_certificates = Some(json.into());
        self
    }

    /// Set the periodic update interval
    #[must_use]
    pub const fn periodic_update_interval(mut self, interval: Duration) -> Self {
        self.periodic_update_interval = interval;
        self
    }

    /// Set the expiration update threshold
    #[must_use]
    pub const fn expiration_update_threshold(mut self, threshold: Duration) -> Self {
        self.expiration_update_threshold = threshold;
        self
    }

    /// Set the threshold multiplier
    #[must_use]
    pub const fn threshold_multiplier(mut self, multiplier: f64) -> Self {
        self.threshold_multiplier = multiplier;
        self
    }

    /// Enable or disable the request challenge
    #[must_use]
    pub const fn use_challenge(mut self, enabled: bool) -> Self {
        self.use_challenge = enabled;
        self
    }

    /// Set the TLS validation strategy for the feed request
    #[must_use]
    pub const fn ssl_validation(mut self, strategy: SslValidationStrategy) -> Self {
        self.ssl_validation = strategy;
        self
    }

    /// Set the feed request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured identifier, or [`DEFAULT_INSTANCE_IDENTIFIER`]
    #[must_use]
    pub fn instance_identifier(&self) -> &str {
        self.identifier.as_deref().unwrap_or(DEFAULT_INSTANCE_IDENTIFIER)
    }

    /// Whether `common_name` passes the expected common names check
    #[must_use]
    pub fn is_expected_common_name(&self, common_name: &str) -> bool {
        self.expected_common_names
            .as_ref()
            .map_or(true, |names| names.iter().any(|name| name == common_name))
    }

    /// Check the configuration and import the public key.
    pub fn validate(&self, crypto: &dyn CryptoProvider) -> Result<EcPublicKey> {
        if self.periodic_update_interval.is_zero() {
            return Err(PinningError::Config(
                "periodic update interval must be positive".into(),
            ));
        }
        if !(self.threshold_multiplier > 0.0 && self.threshold_multiplier <= 1.0) {
            return Err(PinningError::Config(format!(
                "threshold multiplier must be in (0, 1], got {}",
                self.threshold_multiplier
            )));
        }
        if self.identifier.as_deref().is_some_and(str::is_empty) {
            return Err(PinningError::Config("instance identifier must not be empty".into()));
        }
        import_public_key_base64(crypto, &self.public_key)
    }

    /// Parse the fallback certificates blob.
    ///
    /// Signatures in the blob are ignored. The result is in canonical order.
    pub fn parse_fallback_certificates(&self) -> Result<Vec<CertificateInfo>> {
        let Some(json) = &self.fallback_certificates else {
            return Ok(Vec::new());
        };
        let response = ServerResponse::from_slice(json.as_bytes())
            .map_err(|e| PinningError::Config(format!("invalid fallback certificates: {e}")))?;
        let mut certificates = response
            .fingerprints
            .iter()
            .map(CertificateInfo::try_from)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| PinningError::Config(format!("invalid fallback certificates: {e}")))?;
        sort_certificates(&mut certificates);
        Ok(certificates)
    }

    /// Scheduler configured from this configuration
    #[must_use]
    pub const fn scheduler(&self) -> UpdateScheduler {
        UpdateScheduler::new(
            self.periodic_update_interval,
            self.expiration_update_threshold,
            self.threshold_multiplier,
        )
    }

    /// Transport settings for the feed request
    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig::new(self.service_url.clone())
            .use_challenge(self.use_challenge)
            .ssl_validation(self.ssl_validation)
            .timeout(self.timeout)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
