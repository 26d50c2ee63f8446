//! Listings client.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};

use super::api_types::decode_listings;
use super::config::{API_KEY_HEADER, CoinMarketCapConfig};
use crate::application::ports::{FetchError, MarketDataSource};
use crate::domain::market::RawListing;

/// `MarketDataSource` backed by the CoinMarketCap listings endpoint.
///
/// One GET per fetch; no retries and no timeout beyond reqwest's default.
#[derive(Clone)]
pub struct CoinMarketCapClient {
    client: Client,
    api_key: String,
    listings_url: Url,
    convert: String,
}

impl CoinMarketCapClient {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Transport` if the listings URL does not parse or
    /// the HTTP client cannot be built.
    pub fn new(config: &CoinMarketCapConfig) -> Result<Self, FetchError> {
        let listings_url = Url::parse(&config.listings_url).map_err(|e| FetchError::Transport {
            message: format!("invalid listings url {}: {e}", config.listings_url),
        })?;

        let client = Client::builder()
            .user_agent(concat!("market-updater/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            listings_url,
            convert: config.convert.clone(),
        })
    }
}

#[async_trait]
impl MarketDataSource for CoinMarketCapClient {
    async fn fetch(&self, limit: u32) -> Result<Vec<RawListing>, FetchError> {
        if limit == 0 {
            return Err(FetchError::InvalidLimit);
        }

        let response = self
            .client
            .get(self.listings_url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .query(&[("limit", limit)])
            .query(&[("convert", self.convert.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                message: e.to_string(),
            })?;

        // Error responses still carry a status block, so decoding decides.
        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "Listings response received");
        } else {
            tracing::warn!(status = status.as_u16(), "Listings request returned error status");
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            message: format!("failed to read listings body: {e}"),
        })?;

        decode_listings(&body)
    }
}

impl std::fmt::Debug for CoinMarketCapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinMarketCapClient")
            .field("listings_url", &self.listings_url.as_str())
            .field("convert", &self.convert)
            .finish_non_exhaustive()
    }
}
