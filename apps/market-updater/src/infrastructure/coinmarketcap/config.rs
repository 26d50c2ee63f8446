//! CoinMarketCap adapter configuration.

/// Listings endpoint of the Pro API.
pub const DEFAULT_LISTINGS_URL: &str =
    "https://pro-api.coinmarketcap.com/v1/cryptocurrency/listings/latest";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// Configuration for the listings client.
#[derive(Clone)]
pub struct CoinMarketCapConfig {
    /// Pro API key.
    pub api_key: String,
    /// Full listings URL, without query string.
    pub listings_url: String,
    /// Currency the provider converts quotes into.
    pub convert: String,
}

impl CoinMarketCapConfig {
    /// Configuration for the production endpoint, quoting in USD.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            listings_url: DEFAULT_LISTINGS_URL.to_string(),
            convert: crate::domain::market::DEFAULT_QUOTE_CURRENCY.to_string(),
        }
    }

    /// Override the listings URL (sandbox or test server).
    #[must_use]
    pub fn with_listings_url(mut self, url: impl Into<String>) -> Self {
        self.listings_url = url.into();
        self
    }

    /// Override the quote currency.
    #[must_use]
    pub fn with_convert(mut self, convert: impl Into<String>) -> Self {
        self.convert = convert.into();
        self
    }
}

impl std::fmt::Debug for CoinMarketCapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinMarketCapConfig")
            .field("api_key", &"[REDACTED]")
            .field("listings_url", &self.listings_url)
            .field("convert", &self.convert)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_production_usd() {
        let config = CoinMarketCapConfig::new("key");
        assert_eq!(config.listings_url, DEFAULT_LISTINGS_URL);
        assert_eq!(config.convert, "USD");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = CoinMarketCapConfig::new("b54bcf4d-1bca-4e8e-9a24-22ff2c3d462c");
        let debug = format!("{config:?}");
        assert!(!debug.contains("b54bcf4d"));
        assert!(debug.contains("[REDACTED]"));
    }
}
