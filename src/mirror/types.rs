//! Mirror tree types.

use std::path::PathBuf;

use serde::Serialize;

/// A document as it appears in the mirror: an arbitrary JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Result of writing one collection file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenCollection {
    /// Final path of the collection file.
    pub path: PathBuf,
    /// Number of documents written.
    pub documents: usize,
    /// True if the new content is byte-identical to the previous file.
    pub unchanged: bool,
}

/// Snapshot of a mirror tree on disk.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorStatus {
    /// Mirror root directory.
    pub root: PathBuf,
    /// One entry per database folder, sorted by name.
    pub databases: Vec<DatabaseStatus>,
}

impl MirrorStatus {
    /// Total number of collection files across all databases.
    #[must_use]
    pub fn total_collections(&self) -> usize {
        self.databases.iter().map(|d| d.collections.len()).sum()
    }
}

/// Collection files found in one database folder.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStatus {
    /// Database name (folder name).
    pub name: String,
    /// Collection files, sorted by name.
    pub collections: Vec<CollectionFileInfo>,
}

/// Information about a collection file.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionFileInfo {
    /// Collection name (file name without extension).
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    /// Number of documents, or `None` if the file is not a valid document array.
    pub documents: Option<usize>,
    /// First 12 hex characters of the SHA256 content hash.
    pub hash: String,
    /// Whether `schemas/<collection>.json` exists.
    pub has_schema: bool,
}

/// Mirror tree errors.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Mirror or database folder does not exist.
    #[error("Mirror directory not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Document carries neither `id` nor `_id`.
    #[error("Document {index} has no identifier (expected `id` or `_id`)")]
    MissingIdentifier {
        /// Position in the collection (0-indexed).
        index: usize,
    },

    /// Database or collection name cannot be used as a single path segment.
    #[error("Invalid name for a mirror path segment: {name:?}")]
    InvalidName {
        /// The rejected database or collection name.
        name: String,
    },

    /// Array entry in a collection file is not a JSON object.
    #[error("Document {index} is not a JSON object")]
    NotAnObject {
        /// Position in the collection (0-indexed).
        index: usize,
    },
}

impl MirrorError {
    /// True for errors caused by document content rather than the filesystem.
    #[must_use]
    pub const fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::Json(_)
                | Self::MissingIdentifier { .. }
                | Self::NotAnObject { .. }
                | Self::InvalidName { .. }
        )
    }
}

/// Result type for mirror operations.
pub type MirrorResult<T> = std::result::Result<T, MirrorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_classification() {
        assert!(MirrorError::MissingIdentifier { index: 0 }.is_data_error());
        assert!(MirrorError::NotAnObject { index: 1 }.is_data_error());
        assert!(!MirrorError::NotFound(PathBuf::from("/m")).is_data_error());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!MirrorError::Io(io).is_data_error());
    }
}
