//! HTTP implementation of [`RemoteDataProvider`].

use crate::challenge::{RequestChallenge, DEFAULT_CHALLENGE_LENGTH, SIGNATURE_HEADER};
use crate::config::{NetworkConfig, SslValidationStrategy};
use async_trait::async_trait;
use certpin_core::{
    CryptoProvider, EcPublicKey, PinningError, RemoteDataProvider, Result, ServerResponse,
};
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::Client as HttpClient;
use std::sync::Arc;
use tracing::{debug, warn};

/// Downloads the fingerprint feed from the configured service URL
#[derive(Clone)]
pub struct RestApi {
    inner: Arc<RestApiInner>,
}

struct RestApiInner {
    http: HttpClient,
    config: NetworkConfig,
    crypto: Arc<dyn CryptoProvider>,
    public_key: EcPublicKey,
}

impl std::fmt::Debug for RestApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestApi")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl RestApi {
    /// Create a fetcher. `public_key` verifies response signatures in challenge mode.
    pub fn new(
        config: NetworkConfig,
        crypto: Arc<dyn CryptoProvider>,
        public_key: EcPublicKey,
    ) -> Result<Self> {
        if config.service_url.scheme() == "http" {
            warn!(url = %config.service_url, "service URL should point to an https server");
        }

        let builder = HttpClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .gzip(true);
        let builder = apply_ssl_validation(builder, config.ssl_validation);
        let http = builder
            .build()
            .map_err(|e| PinningError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(RestApiInner {
                http,
                config,
                crypto,
                public_key,
            }),
        })
    }

    /// Network configuration in use
    #[must_use]
    pub fn config(&self) -> &NetworkConfig {
        &self.inner.config
    }

    /// Verify and decode a response body
    fn process_body(
        &self,
        body: &[u8],
        challenge: Option<&RequestChallenge>,
        signature: Option<&str>,
    ) -> Result<ServerResponse> {
        if let Some(challenge) = challenge {
            challenge.verify(&*self.inner.crypto, body, signature, &self.inner.public_key)?;
        }
        let mut response = ServerResponse::from_slice(body).map_err(|e| {
            warn!(error = %e, "failed to parse fingerprint feed");
            e
        })?;
        response.response_signature_verified = challenge.is_some();
        Ok(response)
    }
}

#[cfg(any(feature = "rustls", feature = "native-tls"))]
fn apply_ssl_validation(
    builder: reqwest::ClientBuilder,
    strategy: SslValidationStrategy,
) -> reqwest::ClientBuilder {
    match strategy {
        SslValidationStrategy::Default => builder,
        SslValidationStrategy::NoValidation => {
            warn!("TLS certificate validation is disabled for the fingerprint feed");
            builder.danger_accept_invalid_certs(true)
        }
    }
}

#[cfg(not(any(feature = "rustls", feature = "native-tls")))]
fn apply_ssl_validation(
    builder: reqwest::ClientBuilder,
    _strategy: SslValidationStrategy,
) -> reqwest::ClientBuilder {
    builder
}

#[async_trait]
impl RemoteDataProvider for RestApi {
    async fn get_fingerprints(&self, current_date: DateTime<Utc>) -> Result<ServerResponse> {
        let config = &self.inner.config;
        let challenge = if config.use_challenge {
            Some(RequestChallenge::generate(
                &*self.inner.crypto,
                DEFAULT_CHALLENGE_LENGTH,
            )?)
        } else {
            None
        };

        let mut request = self
            .inner
            .http
            .get(config.service_url.clone())
            .header(ACCEPT, "application/json");
        if let Some(challenge) = &challenge {
            let (name, value) = challenge.header();
            request = request.header(name, value);
        }
        debug!(url = %config.service_url, challenge = challenge.is_some(), "GET fingerprints");

        let response = request
            .send()
            .await
            .map_err(|e| PinningError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "fingerprint request failed");
            return Err(PinningError::HttpStatus {
                code: status.as_u16(),
            });
        }

        let signature = response
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response
            .bytes()
            .await
            .map_err(|e| PinningError::Network(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "fingerprints response");

        let decoded = self.process_body(&body, challenge.as_ref(), signature.as_deref())?;

        if let Some(timestamp) = decoded.timestamp {
            debug!(
                skew_secs = (timestamp - current_date).num_seconds(),
                "server timestamp received"
            );
        }
        Ok(decoded)
    }
}
