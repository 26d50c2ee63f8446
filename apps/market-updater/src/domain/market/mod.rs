//! Market Listings
//!
//! Raw provider listings and the normalized [`MarketRecord`] built from them.
//!
//! # Normalization
//!
//! [`normalize`] maps listings one-to-one, keeping input order. Quote fields
//! for the requested currency are copied as exact decimal text; a field the
//! provider omitted stays `None` and is never defaulted to zero.

mod decimal_text;
mod listing;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use decimal_text::{DecimalText, InvalidDecimalText};
pub use listing::{RawListing, RawQuote};

/// Quote currency used when none is configured.
pub const DEFAULT_QUOTE_CURRENCY: &str = "USD";

/// Fixed-shape market record for one coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketRecord {
    /// Provider-assigned coin identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Ticker symbol, used as the document key.
    pub symbol: String,
    /// Market-cap rank.
    pub rank: i64,
    /// Currency the quote fields are denominated in.
    pub quote_currency: String,
    /// Spot price.
    pub price: Option<DecimalText>,
    /// Trailing 24h volume.
    pub volume_24h: Option<DecimalText>,
    /// Market capitalisation.
    pub market_cap: Option<DecimalText>,
    /// Percent change over 1h.
    pub percent_change_1h: Option<DecimalText>,
    /// Percent change over 24h.
    pub percent_change_24h: Option<DecimalText>,
    /// Percent change over 7d.
    pub percent_change_7d: Option<DecimalText>,
    /// Last provider refresh of the listing.
    pub last_updated: Option<DateTime<Utc>>,
}

impl MarketRecord {
    /// Build a record from a raw listing, taking quote fields from `quote_currency`.
    #[must_use]
    pub fn from_listing(listing: RawListing, quote_currency: &str) -> Self {
        let quote = listing.quote_in(quote_currency).cloned().unwrap_or_default();

        Self {
            id: listing.id,
            name: listing.name,
            symbol: listing.symbol,
            rank: listing.rank,
            quote_currency: quote_currency.to_ascii_uppercase(),
            price: quote.price,
            volume_24h: quote.volume_24h,
            market_cap: quote.market_cap,
            percent_change_1h: quote.percent_change_1h,
            percent_change_24h: quote.percent_change_24h,
            percent_change_7d: quote.percent_change_7d,
            last_updated: listing.last_updated.or(quote.last_updated),
        }
    }
}

/// Map raw listings to market records.
///
/// Length- and order-preserving: `normalize(raw)[i]` comes from `raw[i]`.
#[must_use]
pub fn normalize(raw: Vec<RawListing>, quote_currency: &str) -> Vec<MarketRecord> {
    raw.into_iter()
        .map(|listing| MarketRecord::from_listing(listing, quote_currency))
        .collect()
}
