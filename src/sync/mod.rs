//! Pull and push between a remote document store and the mirror tree.
//!
//! - **Pull**: remote collections → `<root>/<database>/<collection>.json`
//! - **Push**: mirror files → remote collections (clear, then insert)
//! - **Cancellation**: cooperative, checked between collections
//!
//! # Example
//!
//! ```ignore
//! use rage::remote::MongoStore;
//! use rage::sync::SyncEngine;
//!
//! let engine = SyncEngine::new(MongoStore);
//! let summary = engine.pull(&selection, &mirror_root).await?;
//! println!("{} collections synced", summary.synced_count());
//! ```

mod cancel;
mod engine;
mod types;

pub use cancel::CancelFlag;
pub use engine::SyncEngine;
pub use types::{
    CollectionRef, FailureKind, SyncError, SyncFailure, SyncOperation, SyncResult, SyncSummary,
    SyncedCollection,
};
