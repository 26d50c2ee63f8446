//! Port Interfaces
//!
//! Contracts that infrastructure adapters implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `MarketDataSource`: fetches listings from the market data provider
//! - `DocumentStore`: writes documents individually or in batches

mod document_store_port;
mod market_data_port;

pub use document_store_port::{
    Document, DocumentPath, DocumentStore, FieldValue, StoreError, UpsertBatch,
};
pub use market_data_port::{FetchError, MarketDataSource};
