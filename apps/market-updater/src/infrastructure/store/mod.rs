//! Document store adapters.

pub mod api_types;
pub mod firestore;
pub mod in_memory;

pub use firestore::{
    DATASTORE_SCOPE, DEFAULT_DATABASE, DEFAULT_FIRESTORE_BASE_URL, FirestoreConfig, FirestoreStore,
    StaticToken, TokenSource,
};
pub use in_memory::InMemoryDocumentStore;
