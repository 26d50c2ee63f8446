//! Market Data Port (Driven Port)
//!
//! Interface for fetching the latest listings from a market data provider.

use async_trait::async_trait;

use crate::domain::market::RawListing;

/// Errors from a listings fetch.
///
/// All variants are recoverable: the tick that hit them is abandoned and the
/// next tick starts fresh.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Requested zero listings.
    #[error("listing limit must be positive")]
    InvalidLimit,

    /// The request never produced a readable response.
    #[error("listings request failed: {message}")]
    Transport {
        /// Error details.
        message: String,
    },

    /// The body, or its `data` payload, is not the expected JSON.
    #[error("listings response could not be decoded: {message}")]
    Decode {
        /// Error details.
        message: String,
    },

    /// The envelope lacks a usable `status` or `data` block.
    #[error("malformed listings envelope: {message}")]
    MalformedEnvelope {
        /// Error details.
        message: String,
    },

    /// The provider reported a non-zero error code.
    #[error("provider error {code}: {message}")]
    Provider {
        /// Provider error code.
        code: i64,
        /// Provider error message.
        message: String,
    },
}

impl FetchError {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidLimit => "invalid_limit",
            Self::Transport { .. } => "transport",
            Self::Decode { .. } => "decode",
            Self::MalformedEnvelope { .. } => "malformed_envelope",
            Self::Provider { .. } => "provider",
        }
    }
}

/// Port for fetching listings from a market data provider.
///
/// Implementations perform exactly one outbound request per call and do not
/// retry.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `limit` listings, ordered by rank.
    async fn fetch(&self, limit: u32) -> Result<Vec<RawListing>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_display_carries_message() {
        let err = FetchError::Provider {
            code: 1001,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "provider error 1001: boom");
        assert_eq!(err.kind(), "provider");
    }
}
