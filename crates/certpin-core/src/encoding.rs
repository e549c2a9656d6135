//! Serde helpers for the wire and persisted JSON formats.
//!
//! Binary values travel as standard base64, timestamps as seconds since
//! the Unix epoch. Timestamps are kept at whole-second precision; a
//! fractional value is rounded up.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};

/// Round a timestamp up to the next whole second.
#[must_use]
pub fn ceil_to_second(date: DateTime<Utc>) -> DateTime<Utc> {
    let secs = date.timestamp();
    let secs = if date.timestamp_subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    };
    DateTime::from_timestamp(secs, 0).unwrap_or(date)
}

/// Convert (possibly fractional) epoch seconds to a timestamp.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn from_epoch_seconds(value: f64) -> Option<DateTime<Utc>> {
    // Beyond this chrono cannot represent the date anyway.
    const LIMIT: f64 = 8.0e12;
    let secs = value.ceil();
    if !secs.is_finite() || secs.abs() > LIMIT {
        return None;
    }
    DateTime::from_timestamp(secs as i64, 0)
}

pub(crate) mod base64_bytes {
    use super::BASE64;
    use base64::Engine;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded.as_bytes()).map_err(de::Error::custom)
    }
}

pub(crate) mod opt_base64_bytes {
    use super::BASE64;
    use base64::Engine;
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&BASE64.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| BASE64.decode(encoded.as_bytes()).map_err(de::Error::custom))
            .transpose()
    }
}

pub(crate) mod fingerprint {
    use super::BASE64;
    use crate::types::Fingerprint;
    use base64::Engine;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Fingerprint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fingerprint, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = BASE64.decode(encoded.as_bytes()).map_err(de::Error::custom)?;
        Fingerprint::try_from(bytes.as_slice())
            .map_err(|_| de::Error::invalid_length(bytes.len(), &"a 32 byte SHA-256 digest"))
    }
}

pub(crate) mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(super::ceil_to_second(*date).timestamp())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let value = f64::deserialize(deserializer)?;
        super::from_epoch_seconds(value)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {value}")))
    }
}

pub(crate) mod opt_epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        date: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_some(&super::ceil_to_second(*date).timestamp()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|value| {
                super::from_epoch_seconds(value)
                    .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {value}")))
            })
            .transpose()
    }
}
