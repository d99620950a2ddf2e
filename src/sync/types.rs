//! Sync summary and error types.

use chrono::Utc;
use serde::Serialize;

use crate::mirror::MirrorError;

/// Direction of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    /// Remote database → mirror tree.
    Pull,
    /// Mirror tree → remote database.
    Push,
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pull => write!(f, "pull"),
            Self::Push => write!(f, "push"),
        }
    }
}

/// A collection within a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionRef {
    pub database: String,
    pub collection: String,
}

impl CollectionRef {
    #[must_use]
    pub fn new(database: &str, collection: &str) -> Self {
        Self {
            database: database.to_string(),
            collection: collection.to_string(),
        }
    }
}

/// A collection that was fully transferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncedCollection {
    pub database: String,
    pub collection: String,
    /// Documents written to the mirror (pull) or inserted remotely (push).
    pub documents: usize,
    /// Pull only: the mirror file content did not change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unchanged: Option<bool>,
    /// Push only: the remote collection was created by this run.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub created: bool,
}

/// Category of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Mirror folder or file missing, unreadable or unwritable.
    Io,
    /// Document without identifier or unparseable mirror file.
    Data,
    /// A remote call other than a document insert failed.
    Remote,
    /// One or more document inserts failed.
    Insert,
}

impl FailureKind {
    /// Classify a mirror error.
    #[must_use]
    pub const fn of_mirror_error(err: &MirrorError) -> Self {
        if err.is_data_error() { Self::Data } else { Self::Io }
    }
}

/// A failure recorded without aborting the run.
///
/// `collection` is `None` when a whole database pass failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub database: String,
    pub collection: Option<String>,
    pub kind: FailureKind,
    pub message: String,
}

impl SyncFailure {
    /// Failure of one collection.
    #[must_use]
    pub fn collection(database: &str, collection: &str, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            database: database.to_string(),
            collection: Some(collection.to_string()),
            kind,
            message: message.into(),
        }
    }

    /// Failure of a whole database pass.
    #[must_use]
    pub fn database(database: &str, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            database: database.to_string(),
            collection: None,
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of one pull or push.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub operation: SyncOperation,
    /// Databases processed, in order.
    pub databases: Vec<String>,
    pub synced: Vec<SyncedCollection>,
    /// Collections left alone because they are excluded.
    pub skipped: Vec<CollectionRef>,
    pub failures: Vec<SyncFailure>,
    /// Documents written (pull) or inserted (push).
    pub documents_transferred: usize,
    /// Push only: document inserts that failed.
    pub documents_failed: usize,
    /// The run stopped early on user request.
    pub cancelled: bool,
    /// RFC3339 timestamp.
    pub started_at: String,
    /// RFC3339 timestamp.
    pub finished_at: String,
}

impl SyncSummary {
    /// Start an empty summary, stamped now.
    #[must_use]
    pub fn new(operation: SyncOperation) -> Self {
        Self {
            operation,
            databases: Vec::new(),
            synced: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            documents_transferred: 0,
            documents_failed: 0,
            cancelled: false,
            started_at: Utc::now().to_rfc3339(),
            finished_at: String::new(),
        }
    }

    /// Stamp the finish time.
    pub fn finish(&mut self) {
        self.finished_at = Utc::now().to_rfc3339();
    }

    #[must_use]
    pub fn synced_count(&self) -> usize {
        self.synced.len()
    }

    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if nothing failed and the run was not cancelled.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.documents_failed == 0 && !self.cancelled
    }
}

/// Fatal sync errors. Everything below connection level is recorded in the
/// summary instead.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The remote store could not be reached or rejected the secret.
    #[error("{0}")]
    Connection(String),
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = SyncSummary::new(SyncOperation::Pull);
        assert!(summary.is_clean());

        summary.skipped.push(CollectionRef::new("shop", "orders"));
        summary.failures.push(SyncFailure::database("crm", FailureKind::Remote, "down"));
        summary.finish();

        assert_eq!(summary.skipped_count(), 1);
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.synced_count(), 0);
        assert!(!summary.is_clean());
        assert!(!summary.finished_at.is_empty());
    }

    #[test]
    fn test_failure_kind_from_mirror_error() {
        let data = MirrorError::MissingIdentifier { index: 0 };
        assert_eq!(FailureKind::of_mirror_error(&data), FailureKind::Data);

        let io = MirrorError::NotFound(std::path::PathBuf::from("/m"));
        assert_eq!(FailureKind::of_mirror_error(&io), FailureKind::Io);
    }

    #[test]
    fn test_summary_serialization() {
        let mut summary = SyncSummary::new(SyncOperation::Push);
        summary.synced.push(SyncedCollection {
            database: "shop".into(),
            collection: "users".into(),
            documents: 3,
            unchanged: None,
            created: false,
        });

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["operation"], "push");
        assert!(json["synced"][0].get("unchanged").is_none());
        assert!(json["synced"][0].get("created").is_none());
    }
}
