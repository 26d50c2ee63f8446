//! Raw listing shape as returned in the provider's `data` array.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::DecimalText;

/// One entry of the listings `data` array.
///
/// Only the fields the updater consumes are declared; everything else the
/// provider sends is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawListing {
    /// Provider-assigned coin identifier.
    pub id: i64,
    /// Display name (e.g., "Bitcoin").
    pub name: String,
    /// Ticker symbol (e.g., "BTC").
    pub symbol: String,
    /// Market-cap rank.
    #[serde(rename = "cmc_rank")]
    pub rank: i64,
    /// Last time the provider refreshed this listing.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Quotes keyed by currency code (e.g., "USD").
    #[serde(default)]
    pub quote: Option<BTreeMap<String, RawQuote>>,
}

impl RawListing {
    /// Find the quote for `currency`, ignoring ASCII case.
    #[must_use]
    pub fn quote_in(&self, currency: &str) -> Option<&RawQuote> {
        self.quote
            .as_ref()?
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(currency))
            .map(|(_, quote)| quote)
    }
}

/// Quote block for one currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawQuote {
    /// Spot price.
    #[serde(default)]
    pub price: Option<DecimalText>,
    /// Trailing 24h volume.
    #[serde(default)]
    pub volume_24h: Option<DecimalText>,
    /// Market capitalisation.
    #[serde(default)]
    pub market_cap: Option<DecimalText>,
    /// Percent change over 1h.
    #[serde(default)]
    pub percent_change_1h: Option<DecimalText>,
    /// Percent change over 24h.
    #[serde(default)]
    pub percent_change_24h: Option<DecimalText>,
    /// Percent change over 7d.
    #[serde(default)]
    pub percent_change_7d: Option<DecimalText>,
    /// Quote timestamp.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_listing() {
        let listing: RawListing =
            serde_json::from_str(r#"{"id":1,"name":"Bitcoin","symbol":"BTC","cmc_rank":1}"#)
                .unwrap();

        assert_eq!(listing.id, 1);
        assert_eq!(listing.rank, 1);
        assert!(listing.quote.is_none());
        assert!(listing.last_updated.is_none());
    }

    #[test]
    fn decodes_quote_with_nulls() {
        let listing: RawListing = serde_json::from_str(
            r#"{
                "id": 1027,
                "name": "Ethereum",
                "symbol": "ETH",
                "slug": "ethereum",
                "cmc_rank": 2,
                "last_updated": "2024-03-01T12:00:00.000Z",
                "quote": {
                    "USD": {
                        "price": 3401.123456789012,
                        "volume_24h": null,
                        "market_cap": 408000000000.5
                    }
                }
            }"#,
        )
        .unwrap();

        let quote = listing.quote_in("usd").unwrap();
        assert_eq!(quote.price.as_ref().unwrap().as_str(), "3401.123456789012");
        assert!(quote.volume_24h.is_none());
        assert!(quote.percent_change_7d.is_none());
        assert!(listing.last_updated.is_some());
    }

    #[test]
    fn missing_currency_has_no_quote() {
        let listing: RawListing = serde_json::from_str(
            r#"{"id":1,"name":"Bitcoin","symbol":"BTC","cmc_rank":1,"quote":{"EUR":{"price":1}}}"#,
        )
        .unwrap();

        assert!(listing.quote_in("USD").is_none());
        assert!(listing.quote_in("eur").is_some());
    }
}
