//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// CoinMarketCap listings client.
pub mod coinmarketcap;

/// Configuration loading.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Document store adapters (Firestore REST, in-memory).
pub mod store;

/// Logging and OpenTelemetry tracing.
pub mod telemetry;
