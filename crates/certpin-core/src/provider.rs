//! Source of the signed fingerprint feed.

use crate::error::Result;
use crate::types::ServerResponse;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Fetches the fingerprint feed from a remote location.
///
/// Implementations verify any response-level signature before decoding, and
/// report failures as [`PinningError::Network`](crate::PinningError::Network),
/// [`PinningError::HttpStatus`](crate::PinningError::HttpStatus),
/// [`PinningError::InvalidData`](crate::PinningError::InvalidData) or
/// [`PinningError::InvalidSignature`](crate::PinningError::InvalidSignature).
///
/// A provider that verified a signature over the whole body sets
/// [`ServerResponse::response_signature_verified`]; otherwise every entry
/// must carry its own signature.
#[async_trait]
pub trait RemoteDataProvider: Send + Sync {
    /// Fetch and decode the feed. `current_date` is the local time the request was issued.
    async fn get_fingerprints(&self, current_date: DateTime<Utc>) -> Result<ServerResponse>;
}
