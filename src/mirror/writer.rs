//! Collection file writer.
//!
//! Writes one collection's documents to `<root>/<database>/<collection>.json`
//! after normalizing identifiers, and keeps the advisory `schemas/` folder
//! next to it.
//!
//! # Identifier Normalization
//!
//! Every mirrored document carries exactly one identifier, named `id`:
//! - a document that already has `id` keeps it and loses `_id`
//! - otherwise `_id` is converted to its canonical string form and moved to `id`
//! - a document with neither is rejected

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::mirror::file::atomic_write;
use crate::mirror::hash::content_hash;
use crate::mirror::types::{Document, MirrorError, MirrorResult, WrittenCollection};

/// Canonical identifier field in mirrored documents.
pub const ID_FIELD: &str = "id";

/// Identifier field used by the remote store.
pub const SOURCE_ID_FIELD: &str = "_id";

/// Extension of collection files.
pub const MIRROR_EXTENSION: &str = "json";

/// Advisory schema placeholder folder inside each database folder.
pub const SCHEMAS_DIR: &str = "schemas";

/// Check that `name` is usable as one path segment of the mirror tree.
///
/// Database and collection names come from the remote store, which allows
/// characters such as `/`. A valid name is exactly one normal path
/// component: not empty, no `/` or `\`, not `.` or `..`.
///
/// # Errors
///
/// Returns `MirrorError::InvalidName` otherwise.
pub fn validate_segment(name: &str) -> MirrorResult<()> {
    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    );

    if single_normal && !name.contains(['/', '\\', '\0']) {
        Ok(())
    } else {
        Err(MirrorError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Path of a collection file.
///
/// Callers validate both names with [`validate_segment`] first.
#[must_use]
pub fn collection_path(root: &Path, database: &str, collection: &str) -> PathBuf {
    root.join(database)
        .join(format!("{collection}.{MIRROR_EXTENSION}"))
}

/// Path of a collection's schema placeholder.
#[must_use]
pub fn schema_path(root: &Path, database: &str, collection: &str) -> PathBuf {
    root.join(database)
        .join(SCHEMAS_DIR)
        .join(format!("{collection}.{MIRROR_EXTENSION}"))
}

/// Canonical string form of a source identifier.
///
/// Strings are kept, `{"$oid": "<hex>"}` becomes the hex string, numbers and
/// booleans use their JSON text, anything else its compact JSON encoding.
#[must_use]
pub fn canonical_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("$oid") {
            Some(Value::String(hex)) if map.len() == 1 => hex.clone(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// Normalize the identifier of one document.
///
/// `index` is the document's position, used in the error.
///
/// # Errors
///
/// Returns `MirrorError::MissingIdentifier` if the document has neither a
/// non-null `id` nor a non-null `_id`.
pub fn normalize_document(mut document: Document, index: usize) -> MirrorResult<Document> {
    let has_id = document.get(ID_FIELD).is_some_and(|v| !v.is_null());
    let source_id = document.remove(SOURCE_ID_FIELD);

    if has_id {
        return Ok(document);
    }

    match source_id {
        Some(value) if !value.is_null() => {
            document.insert(ID_FIELD.to_string(), Value::String(canonical_id(&value)));
            Ok(document)
        }
        _ => Err(MirrorError::MissingIdentifier { index }),
    }
}

/// Write one collection to the mirror tree.
///
/// All documents are normalized before anything touches the disk, so a
/// document without an identifier leaves the previous file in place.
///
/// # Errors
///
/// Returns a data error if a name is not a single path segment or a
/// document cannot be normalized or serialized, and an IO error if the folders or the file cannot be written.
pub fn write_collection(
    root: &Path,
    database: &str,
    collection: &str,
    documents: Vec<Document>,
) -> MirrorResult<WrittenCollection> {
    validate_segment(database)?;
    validate_segment(collection)?;

    let normalized = documents
        .into_iter()
        .enumerate()
        .map(|(index, doc)| normalize_document(doc, index))
        .collect::<MirrorResult<Vec<_>>>()?;

    let schemas_dir = root.join(database).join(SCHEMAS_DIR);
    fs::create_dir_all(&schemas_dir)?;

    if !schema_path(root, database, collection).exists() {
        warn!(database, collection, "No schema file found for collection");
    }

    let content = serde_json::to_string_pretty(&normalized)?;
    let path = collection_path(root, database, collection);

    let unchanged = fs::read(&path)
        .map(|previous| content_hash(&previous) == content_hash(content.as_bytes()))
        .unwrap_or(false);

    atomic_write(&path, &content)?;

    debug!(
        database,
        collection,
        documents = normalized.len(),
        unchanged,
        path = %path.display(),
        "Collection written"
    );

    Ok(WrittenCollection {
        path,
        documents: normalized.len(),
        unchanged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_normalize_moves_source_id() {
        let normalized =
            normalize_document(doc(json!({"_id": {"$oid": "65a1b2c3d4e5f60718293a4b"}, "name": "Ada"})), 0)
                .unwrap();

        assert_eq!(normalized["id"], "65a1b2c3d4e5f60718293a4b");
        assert!(!normalized.contains_key("_id"));
        assert_eq!(normalized["name"], "Ada");
    }

    #[test]
    fn test_normalize_keeps_existing_id() {
        let normalized =
            normalize_document(doc(json!({"id": "u-1", "_id": {"$oid": "aa"}, "n": 1})), 0).unwrap();

        assert_eq!(normalized["id"], "u-1");
        assert!(!normalized.contains_key("_id"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_document(doc(json!({"_id": 42, "n": 1})), 0).unwrap();
        let twice = normalize_document(once.clone(), 0).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once["id"], "42");
    }

    #[test]
    fn test_normalize_missing_identifier() {
        let result = normalize_document(doc(json!({"name": "nobody"})), 7);
        assert!(matches!(result, Err(MirrorError::MissingIdentifier { index: 7 })));

        let result = normalize_document(doc(json!({"id": null, "_id": null})), 0);
        assert!(matches!(result, Err(MirrorError::MissingIdentifier { .. })));
    }

    #[test]
    fn test_canonical_id_forms() {
        assert_eq!(canonical_id(&json!("abc")), "abc");
        assert_eq!(canonical_id(&json!({"$oid": "ff00"})), "ff00");
        assert_eq!(canonical_id(&json!(12)), "12");
        assert_eq!(canonical_id(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_write_collection_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let written = write_collection(
            root,
            "shop",
            "users",
            vec![doc(json!({"_id": "a", "name": "Ada"})), doc(json!({"id": "b"}))],
        )
        .unwrap();

        assert_eq!(written.path, root.join("shop").join("users.json"));
        assert_eq!(written.documents, 2);
        assert!(!written.unchanged);
        assert!(root.join("shop").join("schemas").is_dir());
        // Schema placeholders are never created
        assert!(!schema_path(root, "shop", "users").exists());

        let content = fs::read_to_string(&written.path).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["id"], "a");
        assert!(parsed[0].get("_id").is_none());
        assert!(content.contains("\n  "), "should be pretty-printed");
    }

    #[test]
    fn test_write_empty_collection() {
        let temp_dir = TempDir::new().unwrap();

        let written = write_collection(temp_dir.path(), "shop", "empty", Vec::new()).unwrap();

        assert_eq!(fs::read_to_string(&written.path).unwrap(), "[]");
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("users").is_ok());
        assert!(validate_segment("system.views").is_ok());
        assert!(validate_segment("..hidden").is_ok());

        for bad in ["", ".", "..", "../../escaped", "logs/2024", "a\\b", "/abs", "x\0y"] {
            assert!(
                matches!(validate_segment(bad), Err(MirrorError::InvalidName { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_write_rejects_path_like_names() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("mirror");
        let docs = || vec![doc(json!({"id": "1"}))];

        let result = write_collection(&root, "shop", "../../escaped", docs());
        assert!(matches!(result, Err(MirrorError::InvalidName { .. })));
        assert!(!temp_dir.path().join("escaped.json").exists());

        let result = write_collection(&root, "shop", "logs/2024", docs());
        assert!(matches!(result, Err(MirrorError::InvalidName { .. })));
        assert!(!root.join("shop").join("logs").exists());

        let result = write_collection(&root, "..", "users", docs());
        assert!(matches!(result, Err(MirrorError::InvalidName { .. })));
        assert!(!root.exists());
    }

    #[test]
    fn test_rewrite_reports_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let docs = || vec![doc(json!({"id": "1"}))];

        write_collection(temp_dir.path(), "shop", "users", docs()).unwrap();
        let second = write_collection(temp_dir.path(), "shop", "users", docs()).unwrap();

        assert!(second.unchanged);
    }

    #[test]
    fn test_missing_identifier_leaves_previous_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_collection(root, "shop", "users", vec![doc(json!({"id": "keep"}))]).unwrap();
        let before = fs::read_to_string(collection_path(root, "shop", "users")).unwrap();

        let result = write_collection(
            root,
            "shop",
            "users",
            vec![doc(json!({"id": "ok"})), doc(json!({"name": "no id"}))],
        );

        assert!(matches!(result, Err(MirrorError::MissingIdentifier { index: 1 })));
        let after = fs::read_to_string(collection_path(root, "shop", "users")).unwrap();
        assert_eq!(before, after);
    }
}
