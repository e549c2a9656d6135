//! Adaptive scheduling of silent updates.
//!
//! The store asks the server at least once per periodic interval. When a
//! common name gets close to its earliest expiration, the wait shrinks
//! proportionally so a replacement certificate is picked up in time.

use crate::types::CertificateInfo;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Default periodic update interval (one week)
pub const DEFAULT_PERIODIC_UPDATE_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default expiration threshold (two weeks)
pub const DEFAULT_EXPIRATION_UPDATE_THRESHOLD: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Default multiplier applied to the wait inside the expiration threshold
pub const DEFAULT_THRESHOLD_MULTIPLIER: f64 = 0.125;

/// Stand-in for "no expiration" when the certificate set is empty (about ten years).
const FAR_FUTURE: TimeDelta = TimeDelta::days(10 * 365);

/// Computes the date of the next silent update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateScheduler {
    /// Upper bound for the time between two updates
    pub periodic_update_interval: Duration,

    /// Window before an expiration in which updates become more frequent
    pub expiration_update_threshold: Duration,

    /// Factor (0, 1] applied to the remaining time inside the threshold window
    pub threshold_multiplier: f64,
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new(
            DEFAULT_PERIODIC_UPDATE_INTERVAL,
            DEFAULT_EXPIRATION_UPDATE_THRESHOLD,
            DEFAULT_THRESHOLD_MULTIPLIER,
        )
    }
}

impl UpdateScheduler {
    /// Create a scheduler
    #[must_use]
    pub const fn new(
        periodic_update_interval: Duration,
        expiration_update_threshold: Duration,
        threshold_multiplier: f64,
    ) -> Self {
        Self {
            periodic_update_interval,
            expiration_update_threshold,
            threshold_multiplier,
        }
    }

    /// Compute the next update date for `certificates` as seen at `now`.
    ///
    /// The result always lies within `now ..= now + periodic_update_interval`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn schedule_next_update(
        &self,
        certificates: &[CertificateInfo],
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        // A common name is only as fresh as its soonest-expiring certificate.
        let mut earliest: HashMap<&str, DateTime<Utc>> = HashMap::new();
        for info in certificates {
            earliest
                .entry(info.common_name())
                .and_modify(|expires| *expires = (*expires).min(info.expires()))
                .or_insert_with(|| info.expires());
        }
        let next_expiry = earliest
            .into_values()
            .min()
            .unwrap_or_else(|| now + FAR_FUTURE);

        let mut delta = next_expiry - now;
        if delta <= TimeDelta::zero() {
            delta = TimeDelta::zero();
        } else if delta < to_delta(self.expiration_update_threshold) {
            let scaled = delta.num_milliseconds() as f64 * self.threshold_multiplier;
            delta = TimeDelta::milliseconds(scaled as i64);
        }
        now + delta.min(to_delta(self.periodic_update_interval))
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(FAR_FUTURE).min(FAR_FUTURE)
}
