//! In-process remote store.
//!
//! Behaves like a small document database: collections are created on
//! first insert, inserted documents without `_id` get a generated
//! `{"$oid": ...}` identifier, and enumeration is in name order.
//!
//! Faults can be injected to exercise the engine's failure handling:
//! a required secret, an unreachable store, failing document listings and
//! failing inserts.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::mirror::{Document, SOURCE_ID_FIELD};
use crate::remote::{RemoteConnection, RemoteError, RemoteResult, RemoteStore};
use crate::sync::CancelFlag;

#[derive(Debug, Default)]
struct State {
    databases: BTreeMap<String, BTreeMap<String, Vec<Document>>>,
    next_oid: u64,
    open_connections: usize,
    operations: Vec<String>,

    required_secret: Option<String>,
    unreachable: bool,
    failing_inserts: Vec<(String, Value)>,
    failing_listings: HashSet<(String, String)>,
    cancel_on_listing: Option<CancelFlag>,
}

/// Shared in-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store that accepts any secret.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Only accept connections presenting `secret`.
    #[must_use]
    pub fn with_secret(self, secret: &str) -> Self {
        self.state().required_secret = Some(secret.to_string());
        self
    }

    /// Refuse every connection.
    #[must_use]
    pub fn unreachable(self) -> Self {
        self.state().unreachable = true;
        self
    }

    /// Fail `insert_one` for documents whose `field` equals `value`.
    #[must_use]
    pub fn fail_inserts_where(self, field: &str, value: Value) -> Self {
        self.state().failing_inserts.push((field.to_string(), value));
        self
    }

    /// Fail `list_documents` for one collection.
    #[must_use]
    pub fn fail_listing(self, database: &str, collection: &str) -> Self {
        self.state()
            .failing_listings
            .insert((database.to_string(), collection.to_string()));
        self
    }

    /// Set `flag` the first time any collection's documents are listed.
    ///
    /// The listing itself still succeeds, so the collection in flight
    /// completes.
    #[must_use]
    pub fn cancel_on_listing(self, flag: CancelFlag) -> Self {
        self.state().cancel_on_listing = Some(flag);
        self
    }

    /// Replace a collection's documents, creating it if needed.
    pub fn put_collection(&self, database: &str, collection: &str, documents: Vec<Document>) {
        self.state()
            .databases
            .entry(database.to_string())
            .or_default()
            .insert(collection.to_string(), documents);
    }

    /// Documents of a collection, or `None` if it does not exist.
    #[must_use]
    pub fn documents(&self, database: &str, collection: &str) -> Option<Vec<Document>> {
        self.state()
            .databases
            .get(database)
            .and_then(|db| db.get(collection))
            .cloned()
    }

    /// Collection names of a database.
    #[must_use]
    pub fn collection_names(&self, database: &str) -> Vec<String> {
        self.state()
            .databases
            .get(database)
            .map(|db| db.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of connections opened and not yet closed.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.state().open_connections
    }

    /// Log of mutating calls, e.g. `create shop/users`, `delete shop/users`.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.state().operations.clone()
    }
}

impl RemoteStore for MemoryStore {
    type Connection = MemoryConnection;

    async fn connect(&self, secret: &str) -> RemoteResult<MemoryConnection> {
        let mut state = self.state();
        if state.unreachable {
            return Err(RemoteError::Connection("server selection timed out".into()));
        }
        if let Some(required) = &state.required_secret {
            if required != secret {
                return Err(RemoteError::Connection("authentication failed".into()));
            }
        }
        state.open_connections += 1;
        drop(state);

        Ok(MemoryConnection {
            store: self.clone(),
        })
    }
}

/// Connection to a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryConnection {
    store: MemoryStore,
}

impl RemoteConnection for MemoryConnection {
    async fn list_collections(&self, database: &str) -> RemoteResult<Vec<String>> {
        Ok(self.store.collection_names(database))
    }

    async fn list_documents(&self, database: &str, collection: &str) -> RemoteResult<Vec<Document>> {
        let mut state = self.store.state();
        if let Some(flag) = state.cancel_on_listing.take() {
            flag.cancel();
        }
        if state
            .failing_listings
            .contains(&(database.to_string(), collection.to_string()))
        {
            return Err(RemoteError::operation("find", "cursor killed"));
        }

        Ok(state
            .databases
            .get(database)
            .and_then(|db| db.get(collection))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_collection(&self, database: &str, collection: &str) -> RemoteResult<()> {
        let mut state = self.store.state();
        let db = state.databases.entry(database.to_string()).or_default();
        if db.contains_key(collection) {
            return Err(RemoteError::operation(
                "create_collection",
                format!("collection already exists: {database}.{collection}"),
            ));
        }
        db.insert(collection.to_string(), Vec::new());
        state.operations.push(format!("create {database}/{collection}"));
        Ok(())
    }

    async fn delete_all(&self, database: &str, collection: &str) -> RemoteResult<u64> {
        let mut state = self.store.state();
        let deleted = state
            .databases
            .get_mut(database)
            .and_then(|db| db.get_mut(collection))
            .map_or(0, |docs| {
                let count = docs.len() as u64;
                docs.clear();
                count
            });
        state.operations.push(format!("delete {database}/{collection}"));
        Ok(deleted)
    }

    async fn insert_one(&self, database: &str, collection: &str, mut document: Document) -> RemoteResult<()> {
        let mut state = self.store.state();

        let rejected = state
            .failing_inserts
            .iter()
            .any(|(field, value)| document.get(field) == Some(value));
        if rejected {
            return Err(RemoteError::operation("insert_one", "document failed validation"));
        }

        if !document.contains_key(SOURCE_ID_FIELD) {
            state.next_oid += 1;
            let oid = format!("{:024x}", state.next_oid);
            document.insert(SOURCE_ID_FIELD.to_string(), serde_json::json!({ "$oid": oid }));
        }

        state
            .databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .push(document);
        state.operations.push(format!("insert {database}/{collection}"));
        Ok(())
    }

    async fn close(self) {
        let mut state = self.store.state();
        state.open_connections = state.open_connections.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_connect_checks_secret() {
        let store = MemoryStore::new().with_secret("s3cret");

        assert!(matches!(
            store.connect("wrong").await,
            Err(RemoteError::Connection(_))
        ));

        let conn = store.connect("s3cret").await.unwrap();
        assert_eq!(store.open_connections(), 1);
        conn.close().await;
        assert_eq!(store.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_refuses_connections() {
        let store = MemoryStore::new().unreachable();

        assert!(matches!(store.connect("").await, Err(RemoteError::Connection(_))));
        assert_eq!(store.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_cancel_on_listing_sets_flag() {
        let flag = CancelFlag::new();
        let store = MemoryStore::new().cancel_on_listing(flag.clone());
        store.put_collection("shop", "users", vec![doc(json!({"id": "1"}))]);
        let conn = store.connect("").await.unwrap();

        assert_eq!(conn.list_documents("shop", "users").await.unwrap().len(), 1);
        assert!(flag.is_cancelled());
        conn.close().await;
    }

    #[tokio::test]
    async fn test_insert_assigns_source_id() {
        let store = MemoryStore::new();
        let conn = store.connect("").await.unwrap();

        conn.insert_one("shop", "users", doc(json!({"name": "Ada"}))).await.unwrap();

        let docs = store.documents("shop", "users").unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0]["_id"]["$oid"].is_string());
        conn.close().await;
    }

    #[tokio::test]
    async fn test_create_existing_collection_fails() {
        let store = MemoryStore::new();
        store.put_collection("shop", "users", Vec::new());
        let conn = store.connect("").await.unwrap();

        assert!(conn.create_collection("shop", "users").await.is_err());
        conn.create_collection("shop", "orders").await.unwrap();
        assert_eq!(store.collection_names("shop"), vec!["orders", "users"]);
        conn.close().await;
    }

    #[tokio::test]
    async fn test_injected_insert_failure() {
        let store = MemoryStore::new().fail_inserts_where("id", json!("bad"));
        let conn = store.connect("").await.unwrap();

        assert!(conn.insert_one("shop", "users", doc(json!({"id": "bad"}))).await.is_err());
        conn.insert_one("shop", "users", doc(json!({"id": "good"}))).await.unwrap();
        assert_eq!(store.documents("shop", "users").unwrap().len(), 1);
        conn.close().await;
    }

    #[tokio::test]
    async fn test_delete_all_counts() {
        let store = MemoryStore::new();
        store.put_collection("shop", "users", vec![doc(json!({"id": "1"})), doc(json!({"id": "2"}))]);
        let conn = store.connect("").await.unwrap();

        assert_eq!(conn.delete_all("shop", "users").await.unwrap(), 2);
        assert_eq!(conn.delete_all("shop", "missing").await.unwrap(), 0);
        assert!(store.documents("shop", "users").unwrap().is_empty());
        conn.close().await;
    }
}
