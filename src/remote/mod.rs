//! Remote document store interface.
//!
//! The sync engine only talks to the remote database through these traits.
//! Implementations:
//!
//! - [`MongoStore`] - MongoDB via the official driver
//! - [`MemoryStore`] - in-process store with failure injection, for tests
//!
//! Methods return `impl Future + Send` so implementations can be plain
//! `async fn`s.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::{MongoConnection, MongoStore};

use std::future::Future;

use crate::mirror::Document;

/// Remote store errors.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The store is unreachable or rejected the credential.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A single remote call failed.
    #[error("{operation} failed: {message}")]
    Operation {
        /// Name of the remote call (e.g. `insert_one`).
        operation: &'static str,
        /// Driver error message.
        message: String,
    },
}

impl RemoteError {
    pub(crate) fn operation(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Operation {
            operation,
            message: err.to_string(),
        }
    }
}

/// Result type for remote store calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// A remote store that can be connected to with a secret.
pub trait RemoteStore: Send + Sync {
    /// Connection type handed to the sync engine.
    type Connection: RemoteConnection;

    /// Open a connection.
    ///
    /// Fails with `RemoteError::Connection` if the store is unreachable or
    /// the secret is rejected.
    fn connect(&self, secret: &str) -> impl Future<Output = RemoteResult<Self::Connection>> + Send;
}

/// An open connection to the remote store.
pub trait RemoteConnection: Send + Sync {
    /// Collection names of a database, in the store's enumeration order.
    fn list_collections(&self, database: &str) -> impl Future<Output = RemoteResult<Vec<String>>> + Send;

    /// All documents of a collection. Identifiers are in relaxed extended JSON.
    fn list_documents(
        &self,
        database: &str,
        collection: &str,
    ) -> impl Future<Output = RemoteResult<Vec<Document>>> + Send;

    /// Create an empty collection.
    fn create_collection(&self, database: &str, collection: &str) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Delete every document of a collection. Returns the number deleted.
    fn delete_all(&self, database: &str, collection: &str) -> impl Future<Output = RemoteResult<u64>> + Send;

    /// Insert one document.
    fn insert_one(
        &self,
        database: &str,
        collection: &str,
        document: Document,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Release the connection.
    fn close(self) -> impl Future<Output = ()> + Send;
}
