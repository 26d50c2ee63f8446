//! Tick Pipeline
//!
//! One tick runs fetch → normalize → upsert for a single [`PipelineKind`].
//! Every failure is logged and folded into the returned [`TickOutcome`];
//! nothing propagates to the caller as an error.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use super::sink::{UpsertReport, UpsertSink};
use crate::application::ports::{FetchError, MarketDataSource};
use crate::domain::market::normalize;
use crate::infrastructure::metrics;

/// Which write path a tick uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// One document write per record.
    Individual,
    /// All records in one batch commit.
    Batch,
}

impl PipelineKind {
    /// Label for logs, spans and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Batch => "batch",
        }
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The fetch failed; nothing was normalized or written.
    FetchFailed(FetchError),
    /// Records were handed to the sink.
    Upserted(UpsertReport),
}

/// Fetch parameters for each tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Number of listings requested.
    pub limit: u32,
    /// Currency whose quote fields are kept.
    pub quote_currency: String,
}

/// The fetch → normalize → upsert pipeline.
pub struct Pipeline {
    source: Arc<dyn MarketDataSource>,
    sink: UpsertSink,
    fetch: FetchSettings,
}

impl Pipeline {
    /// Create a pipeline.
    #[must_use]
    pub fn new(source: Arc<dyn MarketDataSource>, sink: UpsertSink, fetch: FetchSettings) -> Self {
        Self {
            source,
            sink,
            fetch,
        }
    }

    /// Run one tick for `kind`.
    pub async fn run_tick(&self, kind: PipelineKind) -> TickOutcome {
        let span = tracing::info_span!("process_tick", kind = kind.as_str());
        self.run_tick_inner(kind).instrument(span).await
    }

    async fn run_tick_inner(&self, kind: PipelineKind) -> TickOutcome {
        let started = Instant::now();

        let listings = match self.source.fetch(self.fetch.limit).await {
            Ok(listings) => listings,
            Err(err) => {
                tracing::error!(error = %err, error_kind = err.kind(), "Listings fetch failed");
                metrics::record_fetch_failure(kind.as_str(), err.kind());
                metrics::record_tick(kind.as_str(), started.elapsed());
                return TickOutcome::FetchFailed(err);
            }
        };

        let records = normalize(listings, &self.fetch.quote_currency);

        let report = match kind {
            PipelineKind::Individual => self.sink.upsert_each(&records).await,
            PipelineKind::Batch => match self.sink.upsert_batch(&records).await {
                Ok(committed) => UpsertReport::all_written(committed),
                Err(err) => {
                    tracing::error!(error = %err, "Batch commit failed");
                    UpsertReport::all_failed(records.len())
                }
            },
        };

        metrics::record_documents_written(kind.as_str(), report.written);
        metrics::record_write_failures(kind.as_str(), report.failed);
        metrics::record_tick(kind.as_str(), started.elapsed());

        tracing::info!(
            records = records.len(),
            written = report.written,
            failed = report.failed,
            elapsed_ms = started.elapsed().as_millis(),
            "Market info updated"
        );

        TickOutcome::Upserted(report)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("sink", &self.sink)
            .field("fetch", &self.fetch)
            .finish_non_exhaustive()
    }
}
