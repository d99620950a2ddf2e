//! Collection file reader.
//!
//! Enumerates and parses the collection files of one database folder for push.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::mirror::types::{Document, MirrorError, MirrorResult};
use crate::mirror::writer::{MIRROR_EXTENSION, collection_path, validate_segment};

/// Canonical representation of an empty collection file.
pub const EMPTY_ARRAY: &str = "[]";

/// List the collections mirrored for `database`.
///
/// Returns file stems of `*.json` files directly inside
/// `<root>/<database>/`, in filesystem enumeration order. Directories
/// (including `schemas/`) and other files are ignored.
///
/// # Errors
///
/// Returns `MirrorError::InvalidName` if `database` is not a single path
/// segment and `MirrorError::NotFound` if the database folder does not exist.
pub fn list_collections(root: &Path, database: &str) -> MirrorResult<Vec<String>> {
    validate_segment(database)?;
    let dir = root.join(database);
    if !dir.is_dir() {
        return Err(MirrorError::NotFound(dir));
    }

    let mut collections = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(MIRROR_EXTENSION) {
            continue;
        }

        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            collections.push(stem.to_string());
        }
    }

    Ok(collections)
}

/// Parse collection file content into documents.
///
/// # Errors
///
/// Returns a data error if the content is not an array of JSON objects.
pub fn parse_collection(content: &str) -> MirrorResult<Vec<Document>> {
    if content.trim() == EMPTY_ARRAY {
        return Ok(Vec::new());
    }

    let values: Vec<Value> = serde_json::from_str(content)?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(map) => Ok(map),
            _ => Err(MirrorError::NotAnObject { index }),
        })
        .collect()
}

/// Read the documents of one mirrored collection.
///
/// # Errors
///
/// Returns an IO error if the file cannot be read and a data error if it
/// cannot be parsed.
pub fn read_collection(root: &Path, database: &str, collection: &str) -> MirrorResult<Vec<Document>> {
    validate_segment(database)?;
    validate_segment(collection)?;
    let content = fs::read_to_string(collection_path(root, database, collection))?;
    parse_collection(&content)
}
