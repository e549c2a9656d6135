//! Dynamic certificate pinning trust store.
//!
//! [`CertStore`] keeps a small, persisted set of trusted certificate
//! fingerprints per common name, refreshes it from a signed feed and answers
//! trust queries synchronously from the TLS handshake path.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use certpin::{CertStore, CertStoreConfig, FileDataStore, RustCryptoProvider, UpdateMode};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> certpin::Result<()> {
//!     let config = CertStoreConfig::new(
//!         "https://pins.example.com/fingerprints".parse().unwrap(),
//!         "BMne....base64 public key....",
//!     )
//!     .expected_common_names(["api.example.com"]);
//!
//!     let store = CertStore::new(
//!         config,
//!         Arc::new(RustCryptoProvider::new()),
//!         Arc::new(FileDataStore::new("/var/lib/myapp/pins")?),
//!     )?;
//!
//!     store.update(UpdateMode::Default).await?;
//!
//!     // Later, from the TLS verifier:
//!     let verdict = store.validate_certificate("api.example.com", &server_cert_der);
//!     println!("{verdict:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Uses rustls for the feed request
//! - `rustls` - Use rustls for TLS (recommended)
//! - `native-tls` - Use system native TLS

#![doc(html_root_url = "https://docs.rs/certpin/1.0.0")]

mod config;
mod store;
mod update;
mod validation;

#[cfg(test)]
mod testing;

pub use config::{CertStoreConfig, DEFAULT_INSTANCE_IDENTIFIER};
pub use store::CertStore;
pub use update::{UpdateMode, UpdateResult};
pub use validation::ValidationResult;

// Re-export the building blocks
pub use certpin_client::{NetworkConfig, RequestChallenge, RestApi, SslValidationStrategy};
pub use certpin_core::*;
pub use certpin_crypto::RustCryptoProvider;

// Re-export runtime for convenience
pub use tokio;
