//! HTTP fetcher for the certpin fingerprint feed.
//!
//! [`RestApi`] implements [`certpin_core::RemoteDataProvider`] on top of
//! `reqwest`. With the request challenge enabled, every request carries a
//! fresh random challenge and the response body must be signed over it
//! before it is even decoded.

pub mod challenge;
mod client;
mod config;

pub use challenge::RequestChallenge;
pub use client::RestApi;
pub use config::*;
pub use certpin_core::{PinningError, Result};
