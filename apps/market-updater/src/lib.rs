#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Market Updater - Periodic Listings Collector
//!
//! Polls the CoinMarketCap listings endpoint on fixed intervals and upserts
//! one document per coin into Firestore, either record by record or as a
//! single batch commit.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: listing shapes and normalization
//!   - `market`: raw listings, exact decimal text, `MarketRecord`
//!
//! - **Application**: use cases and port definitions
//!   - `ports`: market data source and document store interfaces
//!   - `services`: upsert sink, tick pipeline, poll scheduler
//!
//! - **Infrastructure**: adapters and external integrations
//!   - `coinmarketcap`: listings HTTP client and envelope decoding
//!   - `store`: Firestore REST and in-memory document stores
//!   - `config`: environment configuration
//!   - `health`: liveness endpoint
//!   - `metrics`, `telemetry`: observability
//!
//! # Data Flow
//!
//! ```text
//! timer tick ──► fetch ──► decode/validate ──► normalize ──► upsert ──► Firestore
//!  (per kind)    (CMC)     (status, data)      (records)    (each | batch)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Market types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::market::{DecimalText, MarketRecord, RawListing, RawQuote, normalize};

// Ports
pub use application::ports::{
    Document, DocumentPath, DocumentStore, FetchError, FieldValue, MarketDataSource, StoreError,
    UpsertBatch,
};

// Services
pub use application::services::{
    FetchSettings, Pipeline, PipelineKind, PollScheduler, Schedule, SinkCollections, SinkError,
    TickOutcome, UpsertReport, UpsertSink,
};

// Adapters
pub use infrastructure::coinmarketcap::{CoinMarketCapClient, CoinMarketCapConfig, decode_listings};
pub use infrastructure::store::{
    FirestoreConfig, FirestoreStore, InMemoryDocumentStore, StaticToken, TokenSource,
};

// Infrastructure config
pub use infrastructure::config::{ConfigError, UpdaterConfig};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
