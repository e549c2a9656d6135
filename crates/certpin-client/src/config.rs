//! Network configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// How HTTPS connections opened by the fetcher itself are validated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SslValidationStrategy {
    /// Regular certificate validation by the TLS stack
    #[default]
    Default,
    /// Accept any server certificate. Never ship this to production.
    NoValidation,
}

/// Configuration for [`RestApi`](crate::RestApi)
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// URL of the fingerprint feed
    pub service_url: Url,

    /// Send a random challenge and require a signed response
    pub use_challenge: bool,

    /// TLS validation for the feed request
    pub ssl_validation: SslValidationStrategy,

    /// Request timeout
    pub timeout: Duration,

    /// User-Agent header value
    pub user_agent: String,
}

impl NetworkConfig {
    /// Create a configuration with default settings
    #[must_use]
    pub fn new(service_url: Url) -> Self {
        Self {
            service_url,
            use_challenge: false,
            ssl_validation: SslValidationStrategy::Default,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("certpin-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Enable or disable the request challenge
    #[must_use]
    pub const fn use_challenge(mut self, enabled: bool) -> Self {
        self.use_challenge = enabled;
        self
    }

    /// Set the TLS validation strategy
    #[must_use]
    pub const fn ssl_validation(mut self, strategy: SslValidationStrategy) -> Self {
        self.ssl_validation = strategy;
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}
