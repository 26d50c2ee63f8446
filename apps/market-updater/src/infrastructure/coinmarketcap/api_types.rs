//! CoinMarketCap response envelope.
//!
//! Decoding happens in two phases so the status block is validated before
//! anything in `data` is trusted:
//!
//! 1. The body is decoded as a JSON object whose `status` and `data`
//!    members stay undecoded.
//! 2. `status` is decoded into [`StatusBlock`] and checked; only then is
//!    `data` decoded into listings.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::application::ports::FetchError;
use crate::domain::market::RawListing;

/// Error code the provider uses for success.
pub const SUCCESS_CODE: i64 = 0;

/// Top-level response members, left undecoded.
///
/// A map rather than a derived struct so that a JSON array is rejected
/// instead of being read positionally.
type RawEnvelope = BTreeMap<String, Box<RawValue>>;

/// The `status` block. Timing and credit fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusBlock {
    /// Zero on success.
    pub error_code: i64,
    /// Human-readable message accompanying a non-zero code.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl StatusBlock {
    /// Turn a non-zero code into a provider error.
    pub fn check(self) -> Result<(), FetchError> {
        if self.error_code == SUCCESS_CODE {
            return Ok(());
        }
        Err(FetchError::Provider {
            code: self.error_code,
            message: self.error_message.unwrap_or_default(),
        })
    }
}

/// Decode and validate a listings response body.
///
/// Checks run in a fixed order and the first failure wins:
///
/// 1. body is a JSON envelope, else `Decode`
/// 2. `status` is present with an integer `error_code`, else `MalformedEnvelope`
/// 3. `error_code` is zero, else `Provider`
/// 4. `data` is present and not null, else `MalformedEnvelope`
/// 5. `data` is a list of listings, else `Decode`
pub fn decode_listings(body: &[u8]) -> Result<Vec<RawListing>, FetchError> {
    let mut envelope: RawEnvelope =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode {
            message: e.to_string(),
        })?;

    let status = envelope.remove("status").ok_or_else(|| FetchError::MalformedEnvelope {
        message: "missing status block".to_string(),
    })?;
    let status: StatusBlock =
        serde_json::from_str(status.get()).map_err(|e| FetchError::MalformedEnvelope {
            message: format!("invalid status block: {e}"),
        })?;
    status.check()?;

    let data = envelope
        .remove("data")
        .filter(|raw| raw.get() != "null")
        .ok_or_else(|| FetchError::MalformedEnvelope {
            message: "missing data block".to_string(),
        })?;

    serde_json::from_str(data.get()).map_err(|e| FetchError::Decode {
        message: format!("invalid data block: {e}"),
    })
}
