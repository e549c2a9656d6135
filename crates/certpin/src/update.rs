//! Refreshing the cache from the fingerprint feed.

use crate::store::CertStore;
use certpin_core::{
    CachedData, CertificateInfo, FingerprintEntry, PinningError, Result, ServerResponse,
    SignedData,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// How eagerly [`CertStore::update`] contacts the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Fetch only when the cache has no valid certificate or the next update is due
    #[default]
    Default,
    /// Always fetch and wait for the result
    Forced,
}

/// Outcome of an update, as reported to completion callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateResult {
    /// The cache is usable and current
    Ok,
    /// The feed was valid but left no usable certificate
    StoreIsEmpty,
    /// The feed could not be downloaded
    NetworkError,
    /// The feed could not be decoded
    InvalidData,
    /// A signature did not verify
    InvalidSignature,
    /// The new cache could not be persisted
    StorageError,
}

impl UpdateResult {
    /// Classify the outcome of [`CertStore::update`]
    #[must_use]
    pub fn from_outcome(outcome: &Result<()>) -> Self {
        match outcome {
            Ok(()) => Self::Ok,
            Err(PinningError::StoreIsEmpty) => Self::StoreIsEmpty,
            Err(PinningError::InvalidData(_) | PinningError::Json(_)) => Self::InvalidData,
            Err(PinningError::InvalidSignature(_)) => Self::InvalidSignature,
            Err(PinningError::Storage(_)) => Self::StorageError,
            // The request could not be prepared or sent.
            Err(
                PinningError::Network(_)
                | PinningError::HttpStatus { .. }
                | PinningError::Config(_),
            ) => Self::NetworkError,
        }
    }
}

impl CertStore {
    /// Bring the cache up to date.
    ///
    /// - With no valid certificate cached, or in [`UpdateMode::Forced`], the
    ///   feed is fetched and the result of that fetch is returned.
    /// - Otherwise, if the next scheduled update is due, a background fetch
    ///   is spawned and `Ok(())` is returned right away.
    /// - Otherwise nothing happens.
    pub async fn update(&self, mode: UpdateMode) -> Result<()> {
        let now = Utc::now();
        let cached = self.cached_data();
        let valid = cached
            .as_ref()
            .map_or(0, |cached| cached.number_of_valid_certificates(now));

        if mode == UpdateMode::Forced || valid == 0 {
            debug!(identifier = self.instance_identifier(), ?mode, valid, "direct update");
            return self.fetch_and_merge().await;
        }

        if cached.is_some_and(|cached| cached.next_update() <= now) {
            debug!(identifier = self.instance_identifier(), "silent update");
            self.spawn_silent_update();
        }
        Ok(())
    }

    /// Run [`update`](Self::update) on the current Tokio runtime and hand its
    /// outcome to `completion`.
    ///
    /// Fails with [`PinningError::Config`] when called outside a runtime.
    pub fn update_with_completion<F>(&self, mode: UpdateMode, completion: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(UpdateResult, Option<PinningError>) + Send + 'static,
    {
        let handle = Handle::try_current()
            .map_err(|e| PinningError::Config(format!("no Tokio runtime: {e}")))?;
        let store = self.clone();
        Ok(handle.spawn(async move {
            let outcome = store.update(mode).await;
            completion(UpdateResult::from_outcome(&outcome), outcome.err())
        }))
    }

    /// Start a background fetch. Outside a Tokio runtime the fetch is skipped
    /// and the next `update` call tries again.
    fn spawn_silent_update(&self) {
        let Ok(handle) = Handle::try_current() else {
            warn!(
                identifier = self.instance_identifier(),
                "no Tokio runtime, skipping silent update"
            );
            return;
        };
        let store = self.clone();
        handle.spawn(async move {
            if let Err(e) = store.fetch_and_merge().await {
                warn!(identifier = store.instance_identifier(), error = %e, "silent update failed");
            }
        });
    }

    async fn fetch_and_merge(&self) -> Result<()> {
        let response = self.inner.remote.get_fingerprints(Utc::now()).await?;
        self.update_cached_data(|current| {
            self.merge(current, &response, Utc::now()).map(Some)
        })?;
        info!(identifier = self.instance_identifier(), "trust store updated");
        Ok(())
    }

    /// Merge downloaded entries into the valid part of `current`.
    ///
    /// All or nothing: one bad entry rejects the whole batch.
    fn merge(
        &self,
        current: Option<&CachedData>,
        response: &ServerResponse,
        now: DateTime<Utc>,
    ) -> Result<CachedData> {
        let mut certificates: Vec<CertificateInfo> = current
            .map(|cached| {
                cached
                    .certificates()
                    .iter()
                    .filter(|info| !info.is_expired(now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        for entry in &response.fingerprints {
            let info = CertificateInfo::try_from(entry)?;
            if info.is_expired(now) || certificates.contains(&info) {
                continue;
            }
            self.verify_entry(entry, response.response_signature_verified)?;
            if !self.inner.config.is_expected_common_name(&entry.name) {
                warn!(common_name = %entry.name, "feed contains an unexpected common name");
            }
            certificates.push(info);
        }

        if certificates.is_empty() {
            warn!(identifier = self.instance_identifier(), "no valid certificate after update");
            return Err(PinningError::StoreIsEmpty);
        }

        let next_update = self.inner.scheduler.schedule_next_update(&certificates, now);
        debug!(
            certificates = certificates.len(),
            next_update = %next_update,
            "merged fingerprint feed"
        );
        Ok(CachedData::new(certificates, next_update))
    }

    /// Check the signature of one entry. An unsigned entry passes only when
    /// the provider verified a signature over the whole response.
    fn verify_entry(&self, entry: &FingerprintEntry, response_verified: bool) -> Result<()> {
        let Some(signature) = &entry.signature else {
            if response_verified {
                return Ok(());
            }
            error!(common_name = %entry.name, "missing signature for fingerprint");
            return Err(PinningError::InvalidSignature(format!(
                "missing signature for {}",
                entry.name
            )));
        };
        let signed = SignedData {
            data: entry.signed_bytes(),
            signature: signature.clone(),
        };
        if self.inner.crypto.verify_ecdsa(&signed, &self.inner.public_key) {
            Ok(())
        } else {
            error!(common_name = %entry.name, "invalid signature for fingerprint");
            Err(PinningError::InvalidSignature(format!(
                "invalid signature for {}",
                entry.name
            )))
        }
    }
}
