//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the port interfaces the pipeline talks to and the
//! services that drive the fetch → normalize → upsert cycle.

/// Port interfaces for the listings provider and the document store.
pub mod ports;

/// Upsert sink, tick pipeline, and poll scheduler.
pub mod services;
