//! Document Store Port (Driven Port)
//!
//! Interface for a key-value document store that supports single-document
//! sets and grouped batch commits. Both operations have set semantics: the
//! written document fully replaces whatever was stored at its path.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use crate::domain::market::DecimalText;

/// Location of a document: `<collection>/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    collection: String,
    id: String,
}

impl DocumentPath {
    /// Create a path from a collection name and document id.
    #[must_use]
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Document id within the collection.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A single document field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// UTF-8 string.
    String(String),
    /// 64-bit signed integer.
    Integer(i64),
    /// Exact decimal, stored as its text.
    Decimal(DecimalText),
}

/// Field name → value map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Iterate over fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Ordered document writes staged for one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertBatch {
    writes: Vec<(DocumentPath, Document)>,
}

impl UpsertBatch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a write.
    pub fn set(&mut self, path: DocumentPath, document: Document) {
        self.writes.push((path, document));
    }

    /// Staged writes in insertion order.
    #[must_use]
    pub fn writes(&self) -> &[(DocumentPath, Document)] {
        &self.writes
    }

    /// Number of staged writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl IntoIterator for UpsertBatch {
    type Item = (DocumentPath, Document);
    type IntoIter = std::vec::IntoIter<(DocumentPath, Document)>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

/// Document store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store client could not be built.
    #[error("store client construction failed: {0}")]
    Construction(String),

    /// The path cannot be addressed in the store.
    #[error("invalid document path: {0}")]
    InvalidPath(String),

    /// The request did not reach the store or the response was unreadable.
    #[error("store transport error: {0}")]
    Transport(String),

    /// The store answered with an error status.
    #[error("store rejected write ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the store.
        message: String,
    },
}

/// Port for writing documents.
///
/// Implementations must be safe to share between concurrently running
/// pipelines.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or overwrite the document at `path`.
    async fn set_document(&self, path: &DocumentPath, document: &Document)
    -> Result<(), StoreError>;

    /// Commit all staged writes as one request.
    ///
    /// Whether the commit is atomic is up to the store.
    async fn commit_batch(&self, batch: UpsertBatch) -> Result<(), StoreError>;
}
