//! The trust store and its cache transaction.

use crate::config::CertStoreConfig;
use certpin_client::RestApi;
use certpin_core::{
    CachedData, CertificateInfo, CryptoProvider, EcPublicKey, PinningError, RemoteDataProvider,
    Result, SecureDataStore, UpdateScheduler,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, warn};

/// Dynamic certificate pinning trust store.
///
/// Cheap to clone; clones share the same cache. Trust queries
/// ([`validate`](Self::validate)) are synchronous and never touch the
/// network, updates ([`update`](Self::update)) run the fetch outside the
/// cache lock and install the result atomically.
#[derive(Clone)]
pub struct CertStore {
    pub(crate) inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    pub(crate) config: CertStoreConfig,
    pub(crate) crypto: Arc<dyn CryptoProvider>,
    pub(crate) data_store: Arc<dyn SecureDataStore>,
    pub(crate) remote: Arc<dyn RemoteDataProvider>,
    pub(crate) public_key: EcPublicKey,
    pub(crate) scheduler: UpdateScheduler,
    pub(crate) fallback: Vec<CertificateInfo>,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    loaded: bool,
    cached: Option<Arc<CachedData>>,
}

impl std::fmt::Debug for CertStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertStore")
            .field("identifier", &self.instance_identifier())
            .field("service_url", &self.inner.config.service_url.as_str())
            .field("fallback", &self.inner.fallback.len())
            .finish_non_exhaustive()
    }
}

impl CertStore {
    /// Create a store fetching from the configured service URL.
    ///
    /// Fails with [`PinningError::Config`] if the public key cannot be
    /// imported or the configuration is otherwise unusable.
    pub fn new(
        config: CertStoreConfig,
        crypto: Arc<dyn CryptoProvider>,
        data_store: Arc<dyn SecureDataStore>,
    ) -> Result<Self> {
        let public_key = config.validate(&*crypto)?;
        let remote = RestApi::new(config.network_config(), Arc::clone(&crypto), public_key.clone())?;
        Self::build(config, crypto, data_store, Arc::new(remote), public_key)
    }

    /// Create a store with a custom source of the fingerprint feed
    pub fn with_remote_provider(
        config: CertStoreConfig,
        crypto: Arc<dyn CryptoProvider>,
        data_store: Arc<dyn SecureDataStore>,
        remote: Arc<dyn RemoteDataProvider>,
    ) -> Result<Self> {
        let public_key = config.validate(&*crypto)?;
        Self::build(config, crypto, data_store, remote, public_key)
    }

    fn build(
        config: CertStoreConfig,
        crypto: Arc<dyn CryptoProvider>,
        data_store: Arc<dyn SecureDataStore>,
        remote: Arc<dyn RemoteDataProvider>,
        public_key: EcPublicKey,
    ) -> Result<Self> {
        let fallback = config.parse_fallback_certificates()?;
        let scheduler = config.scheduler();
        debug!(
            identifier = config.instance_identifier(),
            fallback = fallback.len(),
            "trust store created"
        );
        Ok(Self {
            inner: Arc::new(StoreInner {
                config,
                crypto,
                data_store,
                remote,
                public_key,
                scheduler,
                fallback,
                state: Mutex::new(CacheState::default()),
            }),
        })
    }

    /// Store configuration
    #[must_use]
    pub fn config(&self) -> &CertStoreConfig {
        &self.inner.config
    }

    /// Key under which the cache is persisted
    #[must_use]
    pub fn instance_identifier(&self) -> &str {
        self.inner.config.instance_identifier()
    }

    /// Fallback certificates parsed at construction
    #[must_use]
    pub fn fallback_certificates(&self) -> &[CertificateInfo] {
        &self.inner.fallback
    }

    /// Snapshot of the current cache, loading it from storage on first access
    #[must_use]
    pub fn cached_data(&self) -> Option<Arc<CachedData>> {
        self.state().cached.clone()
    }

    /// Run an atomic cache transaction.
    ///
    /// `transform` sees the current cache and returns the replacement,
    /// `Ok(None)` to leave the cache untouched, or an error to abort. A
    /// replacement is persisted before it becomes visible; if persisting
    /// fails the in-memory cache stays as it was.
    pub fn update_cached_data<F>(&self, transform: F) -> Result<()>
    where
        F: FnOnce(Option<&CachedData>) -> Result<Option<CachedData>>,
    {
        let mut state = self.state();
        let Some(replacement) = transform(state.cached.as_deref())? else {
            return Ok(());
        };
        let bytes = replacement
            .to_bytes()
            .map_err(|e| PinningError::Storage(format!("failed to encode cache: {e}")))?;
        if let Err(e) = self.inner.data_store.save(self.instance_identifier(), &bytes) {
            error!(identifier = self.instance_identifier(), error = %e, "failed to persist cache");
            return Err(e);
        }
        state.cached = Some(Arc::new(replacement));
        Ok(())
    }

    /// Drop all cached certificates, in memory and in storage.
    ///
    /// Meant for tests and debugging: until the next successful update every
    /// query that the fallback certificates cannot answer yields `Empty`.
    /// If the stored copy cannot be removed, the in-memory cache is kept.
    pub fn reset(&self) -> Result<()> {
        warn!(identifier = self.instance_identifier(), "resetting trust store");
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.data_store.remove(self.instance_identifier())?;
        state.cached = None;
        state.loaded = true;
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.loaded {
            state.loaded = true;
            state.cached = self.restore_cache().map(Arc::new);
        }
        state
    }

    fn restore_cache(&self) -> Option<CachedData> {
        let identifier = self.instance_identifier();
        match self.inner.data_store.load(identifier) {
            Ok(Some(bytes)) => match CachedData::from_slice(&bytes) {
                Ok(cached) => {
                    debug!(identifier, certificates = cached.certificates().len(), "cache restored");
                    Some(cached)
                }
                Err(e) => {
                    warn!(identifier, error = %e, "ignoring unreadable cache");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(identifier, error = %e, "failed to load cache");
                None
            }
        }
    }
}
