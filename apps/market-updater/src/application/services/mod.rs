//! Application Services
//!
//! - `sink`: per-record and batch upserts against the document store
//! - `pipeline`: one fetch → normalize → upsert tick
//! - `scheduler`: periodic ticks per pipeline kind

pub mod pipeline;
pub mod scheduler;
pub mod sink;

pub use pipeline::{FetchSettings, Pipeline, PipelineKind, TickOutcome};
pub use scheduler::{PollScheduler, Schedule};
pub use sink::{
    DEFAULT_BATCH_COLLECTION, DEFAULT_INDIVIDUAL_COLLECTION, SinkCollections, SinkError,
    UpsertReport, UpsertSink, project,
};
