//! Upsert Sink
//!
//! Writes market records to a [`DocumentStore`] in one of two modes:
//!
//! - **Per-record**: one `set_document` per record. Best effort; a failed
//!   write is logged and the remaining records are still attempted.
//! - **Batch**: every record staged into one [`UpsertBatch`], then a single
//!   commit. Atomicity is whatever the store provides.
//!
//! Both modes write the same projection of a record (see [`project`]).

use std::sync::Arc;

use crate::application::ports::{
    Document, DocumentPath, DocumentStore, FieldValue, StoreError, UpsertBatch,
};
use crate::domain::market::MarketRecord;

/// Collection used by per-record writes when none is configured.
pub const DEFAULT_INDIVIDUAL_COLLECTION: &str = "Market";

/// Collection used by batch writes when none is configured.
pub const DEFAULT_BATCH_COLLECTION: &str = "BatchMarket";

/// Target collections for the two write modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkCollections {
    /// Collection for per-record writes.
    pub individual: String,
    /// Collection for batch writes.
    pub batch: String,
}

impl Default for SinkCollections {
    fn default() -> Self {
        Self {
            individual: DEFAULT_INDIVIDUAL_COLLECTION.to_string(),
            batch: DEFAULT_BATCH_COLLECTION.to_string(),
        }
    }
}

/// Outcome of one sink invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Documents the sink tried to write.
    pub attempted: usize,
    /// Documents the store accepted.
    pub written: usize,
    /// Documents that were not written.
    pub failed: usize,
}

impl UpsertReport {
    /// Every attempted document was written.
    #[must_use]
    pub const fn all_written(count: usize) -> Self {
        Self {
            attempted: count,
            written: count,
            failed: 0,
        }
    }

    /// No attempted document was written.
    #[must_use]
    pub const fn all_failed(count: usize) -> Self {
        Self {
            attempted: count,
            written: 0,
            failed: count,
        }
    }
}

/// Sink write errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// A per-record write failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Document path, `<collection>/<id>`.
        path: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// A batch commit failed.
    #[error("failed to commit batch of {size} documents: {source}")]
    Batch {
        /// Number of staged writes.
        size: usize,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
}

/// Project a record onto the stored document shape.
///
/// Fields: `name`, `rank`, `symbol`, and `price` when the record has one.
#[must_use]
pub fn project(record: &MarketRecord) -> Document {
    let doc = Document::new()
        .with("name", FieldValue::String(record.name.clone()))
        .with("rank", FieldValue::Integer(record.rank))
        .with("symbol", FieldValue::String(record.symbol.clone()));

    match &record.price {
        Some(price) => doc.with("price", FieldValue::Decimal(price.clone())),
        None => doc,
    }
}

/// Writes market records to a document store.
#[derive(Clone)]
pub struct UpsertSink {
    store: Arc<dyn DocumentStore>,
    collections: SinkCollections,
}

impl UpsertSink {
    /// Create a sink over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, collections: SinkCollections) -> Self {
        Self { store, collections }
    }

    /// Write each record as its own document, in order.
    ///
    /// Never fails as a whole; failed writes are logged and counted.
    pub async fn upsert_each(&self, records: &[MarketRecord]) -> UpsertReport {
        let mut report = UpsertReport::default();

        for record in records {
            let path = DocumentPath::new(&self.collections.individual, &record.symbol);
            let document = project(record);
            report.attempted += 1;

            tracing::debug!(symbol = %record.symbol, path = %path, "Writing coin document");

            match self.store.set_document(&path, &document).await {
                Ok(()) => report.written += 1,
                Err(source) => {
                    report.failed += 1;
                    let err = SinkError::Write {
                        path: path.to_string(),
                        source,
                    };
                    tracing::error!(error = %err, symbol = %record.symbol, "Document write failed");
                }
            }
        }

        report
    }

    /// Stage all records into one batch and commit it.
    ///
    /// Returns the number of documents committed. An empty record set
    /// commits nothing.
    pub async fn upsert_batch(&self, records: &[MarketRecord]) -> Result<usize, SinkError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut batch = UpsertBatch::new();
        for record in records {
            tracing::debug!(symbol = %record.symbol, "Staging coin document");
            batch.set(
                DocumentPath::new(&self.collections.batch, &record.symbol),
                project(record),
            );
        }

        let size = batch.len();
        self.store
            .commit_batch(batch)
            .await
            .map_err(|source| SinkError::Batch { size, source })?;

        Ok(size)
    }
}

impl std::fmt::Debug for UpsertSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpsertSink")
            .field("collections", &self.collections)
            .finish_non_exhaustive()
    }
}
