//! Core types and traits for the certpin trust store.
//!
//! This crate provides the foundations shared by the other certpin crates:
//!
//! - **Types**: [`CertificateInfo`], the persisted [`CachedData`] and the wire
//!   model of the signed fingerprint feed ([`ServerResponse`])
//! - **Errors**: the [`PinningError`] taxonomy
//! - **Capabilities**: [`CryptoProvider`], [`SecureDataStore`] and
//!   [`RemoteDataProvider`], the narrow interfaces the store is built on
//! - **Scheduling**: [`UpdateScheduler`], which decides when to ask the
//!   server again
//!
//! # Example
//!
//! ```rust
//! use certpin_core::{CertificateInfo, UpdateScheduler};
//! use chrono::{TimeDelta, Utc};
//!
//! let now = Utc::now();
//! let certs = vec![CertificateInfo::new("example.com", [0; 32], now + TimeDelta::days(30))];
//! let next = UpdateScheduler::default().schedule_next_update(&certs, now);
//! assert!(next <= now + TimeDelta::days(7));
//! ```

#![doc(html_root_url = "https://docs.rs/certpin-core/1.0.0")]

pub mod crypto;
pub mod encoding;
mod error;
pub mod provider;
pub mod scheduler;
pub mod storage;
pub mod types;

pub use crypto::{import_public_key_base64, CryptoProvider, EcPublicKey, SignedData};
pub use error::{PinningError, Result};
pub use provider::RemoteDataProvider;
pub use scheduler::UpdateScheduler;
pub use storage::{FileDataStore, MemoryDataStore, SecureDataStore};
pub use types::*;
