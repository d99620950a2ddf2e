//! MongoDB remote store.
//!
//! The secret is a MongoDB connection string. Documents cross the boundary
//! as relaxed extended JSON, so an `ObjectId` reads as `{"$oid": "<hex>"}`
//! and extended JSON values in mirror files are restored to BSON on insert.

use futures::TryStreamExt;
use mongodb::Client;
use mongodb::bson::{Bson, Document as BsonDocument, doc};
use tracing::debug;

use crate::mirror::Document;
use crate::remote::{RemoteConnection, RemoteError, RemoteResult, RemoteStore};

/// MongoDB store factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoStore;

impl RemoteStore for MongoStore {
    type Connection = MongoConnection;

    async fn connect(&self, secret: &str) -> RemoteResult<MongoConnection> {
        let client = Client::with_uri_str(secret)
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        // The driver connects lazily; ping so a bad secret fails here
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        debug!("Connected to MongoDB");
        Ok(MongoConnection { client })
    }
}

/// Open MongoDB client.
#[derive(Debug)]
pub struct MongoConnection {
    client: Client,
}

impl MongoConnection {
    fn collection(&self, database: &str, collection: &str) -> mongodb::Collection<BsonDocument> {
        self.client.database(database).collection(collection)
    }
}

fn to_json_document(document: BsonDocument) -> Document {
    document
        .into_iter()
        .map(|(key, value)| (key, value.into_relaxed_extjson()))
        .collect()
}

fn to_bson_document(document: Document) -> RemoteResult<BsonDocument> {
    match Bson::try_from(serde_json::Value::Object(document)) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(other) => Err(RemoteError::operation(
            "insert_one",
            format!("expected a document, got {:?}", other.element_type()),
        )),
        Err(e) => Err(RemoteError::operation("insert_one", e)),
    }
}

impl RemoteConnection for MongoConnection {
    async fn list_collections(&self, database: &str) -> RemoteResult<Vec<String>> {
        self.client
            .database(database)
            .list_collection_names()
            .await
            .map_err(|e| RemoteError::operation("list_collection_names", e))
    }

    async fn list_documents(&self, database: &str, collection: &str) -> RemoteResult<Vec<Document>> {
        let cursor = self
            .collection(database, collection)
            .find(doc! {})
            .await
            .map_err(|e| RemoteError::operation("find", e))?;

        let documents: Vec<BsonDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| RemoteError::operation("find", e))?;

        Ok(documents.into_iter().map(to_json_document).collect())
    }

    async fn create_collection(&self, database: &str, collection: &str) -> RemoteResult<()> {
        self.client
            .database(database)
            .create_collection(collection)
            .await
            .map_err(|e| RemoteError::operation("create_collection", e))
    }

    async fn delete_all(&self, database: &str, collection: &str) -> RemoteResult<u64> {
        let result = self
            .collection(database, collection)
            .delete_many(doc! {})
            .await
            .map_err(|e| RemoteError::operation("delete_many", e))?;
        Ok(result.deleted_count)
    }

    async fn insert_one(&self, database: &str, collection: &str, document: Document) -> RemoteResult<()> {
        let document = to_bson_document(document)?;
        self.collection(database, collection)
            .insert_one(document)
            .await
            .map_err(|e| RemoteError::operation("insert_one", e))?;
        Ok(())
    }

    async fn close(self) {
        self.client.shutdown().await;
        debug!("MongoDB connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    #[test]
    fn test_object_id_reads_as_oid() {
        let oid = ObjectId::new();
        let json = to_json_document(doc! { "_id": oid, "name": "Ada", "age": 36 });

        assert_eq!(json["_id"], json!({ "$oid": oid.to_hex() }));
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["age"], 36);
    }

    #[test]
    fn test_json_to_bson_document() {
        let map = json!({ "id": "u-1", "tags": ["a", "b"], "nested": { "n": 1 } })
            .as_object()
            .cloned()
            .unwrap();

        let doc = to_bson_document(map).unwrap();
        assert_eq!(doc.get_str("id").unwrap(), "u-1");
        assert_eq!(doc.get_array("tags").unwrap().len(), 2);
        assert!(doc.get_document("nested").is_ok());
    }

    #[test]
    fn test_extended_json_restored() {
        let hex = "65a1b2c3d4e5f60718293a4b";
        let map = json!({ "_id": { "$oid": hex } }).as_object().cloned().unwrap();

        let doc = to_bson_document(map).unwrap();
        assert_eq!(doc.get_object_id("_id").unwrap().to_hex(), hex);
    }
}
