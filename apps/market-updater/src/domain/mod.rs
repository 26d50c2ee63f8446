//! Domain Layer - Market listing types and normalization.
//!
//! This layer contains the record shapes for market listings and the pure
//! mapping from the provider's raw listings to fixed-shape records. Nothing
//! here performs I/O.

/// Market listings: raw provider shape, normalized records, decimal text.
pub mod market;
