//! Local JSON mirror of the remote database.
//!
//! # Layout
//!
//! ```text
//! <root>/<database>/<collection>.json          ordered array of documents
//! <root>/<database>/schemas/<collection>.json  advisory, never auto-created
//! ```
//!
//! - **Writer**: normalizes identifiers and replaces collection files atomically
//! - **Reader**: enumerates and parses collection files for push
//! - **Status**: inspects the tree for display

mod file;
mod hash;
mod reader;
mod status;
mod types;
mod writer;

pub use file::{atomic_write, file_size, temp_path};
pub use hash::{content_hash, short_hash};
pub use reader::{EMPTY_ARRAY, list_collections, parse_collection, read_collection};
pub use status::{get_mirror_status, print_status};
pub use types::{
    CollectionFileInfo, DatabaseStatus, Document, MirrorError, MirrorResult, MirrorStatus,
    WrittenCollection,
};
pub use writer::{
    ID_FIELD, MIRROR_EXTENSION, SCHEMAS_DIR, SOURCE_ID_FIELD, canonical_id, collection_path,
    normalize_document, schema_path, validate_segment, write_collection,
};
