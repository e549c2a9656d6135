//! Test doubles for the store's capabilities.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use certpin_client::challenge::DEFAULT_CHALLENGE_LENGTH;
use certpin_client::RequestChallenge;
use certpin_core::{
    CryptoProvider, EcPublicKey, FingerprintEntry, MemoryDataStore, PinningError,
    RemoteDataProvider, Result, SecureDataStore, ServerResponse, SignedData,
};
use certpin_crypto::RustCryptoProvider;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use crate::CertStoreConfig;

/// Base64 of `[4, 0, 0]`, accepted by [`TestingCryptoProvider`]
pub const VALID_PUBLIC_KEY: &str = "BAAA";

/// Signature bytes the entries produced by [`entry`] carry
pub const TEST_SIGNATURE: &[u8] = b"signature";

pub fn test_config() -> CertStoreConfig {
    CertStoreConfig::new(
        Url::parse("https://pins.example.com/fingerprints").unwrap(),
        VALID_PUBLIC_KEY,
    )
}

pub fn fingerprint(byte: u8) -> [u8; 32] {
    [byte; 32]
}

/// Signed feed entry expiring `expires_in` from now
pub fn entry(name: &str, fp: u8, expires_in: TimeDelta) -> FingerprintEntry {
    entry_at(name, fp, Utc::now() + expires_in)
}

pub fn entry_at(name: &str, fp: u8, expires: DateTime<Utc>) -> FingerprintEntry {
    FingerprintEntry {
        name: name.to_string(),
        fingerprint: fingerprint(fp).to_vec(),
        expires,
        signature: Some(TEST_SIGNATURE.to_vec()),
    }
}

pub fn response(fingerprints: Vec<FingerprintEntry>) -> ServerResponse {
    ServerResponse {
        fingerprints,
        ..ServerResponse::default()
    }
}

/// Accepts [`TEST_SIGNATURE`] unless the signed common name was marked as forged
#[derive(Default)]
pub struct TestingCryptoProvider {
    forged_names: Mutex<HashSet<String>>,
    pub verify_calls: AtomicUsize,
}

impl TestingCryptoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forge(&self, common_name: &str) {
        self.forged_names.lock().unwrap().insert(common_name.to_string());
    }
}

impl CryptoProvider for TestingCryptoProvider {
    fn sha256(&self, data: &[u8]) -> [u8; 32] {
        RustCryptoProvider::new().sha256(data)
    }

    fn import_public_key(&self, encoded: &[u8]) -> Option<EcPublicKey> {
        (!encoded.is_empty()).then(|| EcPublicKey::from_bytes(encoded))
    }

    fn verify_ecdsa(&self, signed: &SignedData, _key: &EcPublicKey) -> bool {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let data = String::from_utf8_lossy(&signed.data);
        let name = data.split('&').next().unwrap_or_default();
        signed.signature == TEST_SIGNATURE && !self.forged_names.lock().unwrap().contains(name)
    }

    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        Ok(vec![7; len])
    }
}

type ErrorFactory = fn() -> PinningError;

/// Serves a canned response, counting requests
pub struct TestingRemoteDataProvider {
    outcome: Mutex<std::result::Result<ServerResponse, ErrorFactory>>,
    latency: Mutex<Duration>,
    sign_responses: AtomicBool,
    pub requests: AtomicUsize,
}

impl Default for TestingRemoteDataProvider {
    fn default() -> Self {
        Self {
            outcome: Mutex::new(Ok(ServerResponse::default())),
            latency: Mutex::new(Duration::ZERO),
            sign_responses: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
        }
    }
}

impl TestingRemoteDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, response: ServerResponse) {
        *self.outcome.lock().unwrap() = Ok(response);
    }

    pub fn set_error(&self, error: ErrorFactory) {
        *self.outcome.lock().unwrap() = Err(error);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Sign every response body over a request challenge and verify it
    /// before handing the response out
    pub fn sign_responses(&self, enabled: bool) {
        self.sign_responses.store(enabled, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn sign_and_verify(response: &ServerResponse) -> Result<ServerResponse> {
        let crypto = TestingCryptoProvider::new();
        let key = crypto.import_public_key(b"key").unwrap();
        let challenge = RequestChallenge::generate(&crypto, DEFAULT_CHALLENGE_LENGTH)?;
        let body = serde_json::to_vec(response)?;
        let signature = BASE64.encode(TEST_SIGNATURE);
        challenge.verify(&crypto, &body, Some(&signature), &key)?;

        let mut verified = ServerResponse::from_slice(&body)?;
        verified.response_signature_verified = true;
        Ok(verified)
    }
}

#[async_trait]
impl RemoteDataProvider for TestingRemoteDataProvider {
    async fn get_fingerprints(&self, _current_date: DateTime<Utc>) -> Result<ServerResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let outcome = self.outcome.lock().unwrap().clone();
        let response = outcome.map_err(|make| make())?;
        if self.sign_responses.load(Ordering::SeqCst) {
            Self::sign_and_verify(&response)
        } else {
            Ok(response)
        }
    }
}

/// [`MemoryDataStore`] that can be told to fail on save
#[derive(Default)]
pub struct TestingDataStore {
    store: MemoryDataStore,
    fail_saves: AtomicBool,
    fail_removes: AtomicBool,
    pub loads: AtomicUsize,
    pub saves: AtomicUsize,
}

impl TestingDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.store.load(key).unwrap()
    }
}

impl SecureDataStore for TestingDataStore {
    fn save(&self, key: &str, data: &[u8]) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PinningError::Storage("disk full".into()));
        }
        self.store.save(key, data)
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.store.load(key)
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(PinningError::Storage("read-only file system".into()));
        }
        self.store.remove(key)
    }
}
