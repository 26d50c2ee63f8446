//! CoinMarketCap Listings Adapter
//!
//! Implementation of `MarketDataSource` for the CoinMarketCap Pro API:
//! - One GET per fetch against `/v1/cryptocurrency/listings/latest`
//! - Two-phase envelope decode with status validation before data decode
//! - API key sent in the `X-CMC_PRO_API_KEY` header

mod api_types;
mod client;
mod config;

pub use api_types::{SUCCESS_CODE, StatusBlock, decode_listings};
pub use client::CoinMarketCapClient;
pub use config::{API_KEY_HEADER, CoinMarketCapConfig, DEFAULT_LISTINGS_URL};
