//! In-memory document store.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{Document, DocumentPath, DocumentStore, StoreError, UpsertBatch};

/// In-memory implementation of `DocumentStore`.
///
/// Used by tests and for dry runs without cloud credentials. Batch commits
/// are all-or-nothing.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<DocumentPath, Document>>,
    failing_ids: RwLock<HashSet<String>>,
    commits: AtomicUsize,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a stored document.
    #[must_use]
    pub fn get(&self, path: &DocumentPath) -> Option<Document> {
        self.documents.read().get(path).cloned()
    }

    /// Copy of every stored document.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<DocumentPath, Document> {
        self.documents.read().clone()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Number of successful batch commits.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Reject every future write to a document with this id (for test setup).
    pub fn fail_writes_for(&self, id: impl Into<String>) {
        self.failing_ids.write().insert(id.into());
    }

    fn check_writable(&self, path: &DocumentPath) -> Result<(), StoreError> {
        if self.failing_ids.read().contains(path.id()) {
            return Err(StoreError::Rejected {
                status: 503,
                message: format!("write to {path} rejected"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn set_document(
        &self,
        path: &DocumentPath,
        document: &Document,
    ) -> Result<(), StoreError> {
        self.check_writable(path)?;
        self.documents.write().insert(path.clone(), document.clone());
        Ok(())
    }

    async fn commit_batch(&self, batch: UpsertBatch) -> Result<(), StoreError> {
        for (path, _) in batch.writes() {
            self.check_writable(path)?;
        }

        let mut documents = self.documents.write();
        for (path, document) in batch {
            documents.insert(path, document);
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
