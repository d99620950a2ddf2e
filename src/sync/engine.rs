//! Pull and push orchestration.
//!
//! Both operations walk the selected databases in order and their
//! collections one at a time. A collection's remote calls and file I/O are
//! fully awaited before the next collection starts, so the summary only
//! reports what actually landed.
//!
//! # Failure Handling
//!
//! - Connection failures end the run with [`SyncError::Connection`]
//! - Database-level failures (listing) are recorded; other databases continue
//! - Collection-level failures are recorded; other collections continue
//! - Push insert failures are counted per document; remaining inserts continue
//!
//! The connection is closed on every path once it has been opened.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::mirror::{self, Document, MirrorError, MirrorResult};
use crate::remote::{RemoteConnection, RemoteError, RemoteStore};
use crate::selection::DatabaseSelection;
use crate::sync::cancel::CancelFlag;
use crate::sync::types::{
    CollectionRef, FailureKind, SyncError, SyncFailure, SyncOperation, SyncResult, SyncSummary,
    SyncedCollection,
};

/// Drives pull and push against one remote store.
pub struct SyncEngine<S> {
    store: S,
    cancel: CancelFlag,
}

impl<S: RemoteStore> SyncEngine<S> {
    /// Create an engine for `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            cancel: CancelFlag::new(),
        }
    }

    /// Use `cancel` to stop runs early.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// The engine's cancellation flag.
    #[must_use]
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    async fn connect(&self, secret: &str) -> SyncResult<S::Connection> {
        self.store.connect(secret).await.map_err(|e| match e {
            RemoteError::Connection(message) => SyncError::Connection(message),
            other => SyncError::Connection(other.to_string()),
        })
    }

    /// Mirror the selected databases into `mirror_root`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Connection` if the remote store cannot be reached.
    pub async fn pull(&self, selection: &DatabaseSelection, mirror_root: &Path) -> SyncResult<SyncSummary> {
        let mut summary = SyncSummary::new(SyncOperation::Pull);
        if self.cancel.is_cancelled() {
            summary.cancelled = true;
            summary.finish();
            return Ok(summary);
        }

        let conn = self.connect(&selection.secret).await?;
        info!(databases = selection.databases.len(), root = %mirror_root.display(), "Pull started");

        for database in &selection.databases {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            summary.databases.push(database.clone());
            self.pull_database(&conn, database, selection, mirror_root, &mut summary)
                .await;
        }

        conn.close().await;
        summary.finish();
        log_summary(&summary);
        Ok(summary)
    }

    async fn pull_database(
        &self,
        conn: &S::Connection,
        database: &str,
        selection: &DatabaseSelection,
        mirror_root: &Path,
        summary: &mut SyncSummary,
    ) {
        let collections = match conn.list_collections(database).await {
            Ok(collections) => collections,
            Err(e) => {
                warn!(database, error = %e, "Failed to list remote collections");
                summary
                    .failures
                    .push(SyncFailure::database(database, FailureKind::Remote, e.to_string()));
                return;
            }
        };

        for collection in collections {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                return;
            }

            if selection.is_excluded(&collection) {
                debug!(database, collection = %collection, "Skipping excluded collection");
                summary.skipped.push(CollectionRef::new(database, &collection));
                continue;
            }

            let documents = match conn.list_documents(database, &collection).await {
                Ok(documents) => documents,
                Err(e) => {
                    warn!(database, collection = %collection, error = %e, "Failed to fetch documents");
                    summary.failures.push(SyncFailure::collection(
                        database,
                        &collection,
                        FailureKind::Remote,
                        e.to_string(),
                    ));
                    continue;
                }
            };

            let written = {
                let (root, db, name) = owned_names(mirror_root, database, &collection);
                run_blocking(move || mirror::write_collection(&root, &db, &name, documents)).await
            };

            match written {
                Ok(written) => {
                    info!(database, collection = %collection, documents = written.documents, "Pulled collection");
                    summary.documents_transferred += written.documents;
                    summary.synced.push(SyncedCollection {
                        database: database.to_string(),
                        collection,
                        documents: written.documents,
                        unchanged: Some(written.unchanged),
                        created: false,
                    });
                }
                Err(e) => {
                    warn!(database, collection = %collection, error = %e, "Failed to write mirror file");
                    summary.failures.push(SyncFailure::collection(
                        database,
                        &collection,
                        FailureKind::of_mirror_error(&e),
                        e.to_string(),
                    ));
                }
            }
        }
    }

    /// Replace the selected remote databases' collections with the contents
    /// of `mirror_root`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Connection` if the remote store cannot be reached.
    pub async fn push(&self, selection: &DatabaseSelection, mirror_root: &Path) -> SyncResult<SyncSummary> {
        let mut summary = SyncSummary::new(SyncOperation::Push);
        if self.cancel.is_cancelled() {
            summary.cancelled = true;
            summary.finish();
            return Ok(summary);
        }

        let conn = self.connect(&selection.secret).await?;
        info!(databases = selection.databases.len(), root = %mirror_root.display(), "Push started");

        for database in &selection.databases {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            summary.databases.push(database.clone());
            self.push_database(&conn, database, selection, mirror_root, &mut summary)
                .await;
        }

        conn.close().await;
        summary.finish();
        log_summary(&summary);
        Ok(summary)
    }

    async fn push_database(
        &self,
        conn: &S::Connection,
        database: &str,
        selection: &DatabaseSelection,
        mirror_root: &Path,
        summary: &mut SyncSummary,
    ) {
        let listed = {
            let (root, db, _) = owned_names(mirror_root, database, "");
            run_blocking(move || mirror::list_collections(&root, &db)).await
        };

        let candidates = match listed {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(database, error = %e, "Cannot read mirror database folder");
                summary.failures.push(SyncFailure::database(
                    database,
                    FailureKind::of_mirror_error(&e),
                    e.to_string(),
                ));
                return;
            }
        };

        let remote = match conn.list_collections(database).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(database, error = %e, "Failed to list remote collections");
                summary
                    .failures
                    .push(SyncFailure::database(database, FailureKind::Remote, e.to_string()));
                return;
            }
        };

        for collection in candidates {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                return;
            }

            if selection.is_excluded(&collection) {
                debug!(database, collection = %collection, "Skipping excluded collection");
                summary.skipped.push(CollectionRef::new(database, &collection));
                continue;
            }

            let exists = remote.iter().any(|name| *name == collection);
            push_collection(conn, database, &collection, exists, mirror_root, summary).await;
        }
    }
}

/// Push one collection: read the mirror file, create the remote collection
/// if needed, clear it, then insert every document in order.
async fn push_collection<C: RemoteConnection>(
    conn: &C,
    database: &str,
    collection: &str,
    exists: bool,
    mirror_root: &Path,
    summary: &mut SyncSummary,
) {
    // Parse before touching the remote so a bad file leaves it intact
    let read = {
        let (root, db, name) = owned_names(mirror_root, database, collection);
        run_blocking(move || mirror::read_collection(&root, &db, &name)).await
    };

    let documents = match read {
        Ok(documents) => documents,
        Err(e) => {
            warn!(database, collection, error = %e, "Cannot read mirror file");
            summary.failures.push(SyncFailure::collection(
                database,
                collection,
                FailureKind::of_mirror_error(&e),
                e.to_string(),
            ));
            return;
        }
    };

    if !exists {
        if let Err(e) = conn.create_collection(database, collection).await {
            warn!(database, collection, error = %e, "Failed to create remote collection");
            summary.failures.push(SyncFailure::collection(
                database,
                collection,
                FailureKind::Remote,
                e.to_string(),
            ));
            return;
        }
        debug!(database, collection, "Created remote collection");
    }

    match conn.delete_all(database, collection).await {
        Ok(deleted) => debug!(database, collection, deleted, "Cleared remote collection"),
        Err(e) => {
            warn!(database, collection, error = %e, "Failed to clear remote collection");
            summary.failures.push(SyncFailure::collection(
                database,
                collection,
                FailureKind::Remote,
                e.to_string(),
            ));
            return;
        }
    }

    let (inserted, failed) = insert_all(conn, database, collection, documents).await;
    summary.documents_transferred += inserted;
    summary.documents_failed += failed;

    if failed > 0 {
        summary.failures.push(SyncFailure::collection(
            database,
            collection,
            FailureKind::Insert,
            format!("{failed} of {} documents failed to insert", inserted + failed),
        ));
    } else {
        info!(database, collection, documents = inserted, "Pushed collection");
        summary.synced.push(SyncedCollection {
            database: database.to_string(),
            collection: collection.to_string(),
            documents: inserted,
            unchanged: None,
            created: !exists,
        });
    }
}

/// Insert documents one by one. Returns `(inserted, failed)`.
async fn insert_all<C: RemoteConnection>(
    conn: &C,
    database: &str,
    collection: &str,
    documents: Vec<Document>,
) -> (usize, usize) {
    let mut inserted = 0;
    let mut failed = 0;

    for (index, document) in documents.into_iter().enumerate() {
        let id = document
            .get(mirror::ID_FIELD)
            .map(mirror::canonical_id)
            .unwrap_or_default();

        match conn.insert_one(database, collection, document).await {
            Ok(()) => inserted += 1,
            Err(e) => {
                warn!(database, collection, index, id = %id, error = %e, "Failed to insert document");
                failed += 1;
            }
        }
    }

    (inserted, failed)
}

/// Run mirror file I/O on the blocking pool.
async fn run_blocking<T, F>(work: F) -> MirrorResult<T>
where
    F: FnOnce() -> MirrorResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .unwrap_or_else(|e| Err(MirrorError::Io(std::io::Error::other(e))))
}

fn owned_names(root: &Path, database: &str, collection: &str) -> (PathBuf, String, String) {
    (root.to_path_buf(), database.to_string(), collection.to_string())
}

fn log_summary(summary: &SyncSummary) {
    info!(
        operation = %summary.operation,
        synced = summary.synced_count(),
        skipped = summary.skipped_count(),
        failed = summary.failed_count(),
        documents = summary.documents_transferred,
        documents_failed = summary.documents_failed,
        cancelled = summary.cancelled,
        "Sync finished"
    );
}
