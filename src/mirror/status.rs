//! Mirror status display.
//!
//! Inspects a mirror tree without contacting the remote store: which
//! databases and collections exist, how large they are, and whether each
//! collection has a schema placeholder.

use std::fs;
use std::path::Path;

use colored::Colorize;

use crate::mirror::file::file_size;
use crate::mirror::hash::{content_hash, short_hash};
use crate::mirror::reader::{list_collections, parse_collection};
use crate::mirror::types::{
    CollectionFileInfo, DatabaseStatus, MirrorError, MirrorResult, MirrorStatus,
};
use crate::mirror::writer::{collection_path, schema_path};

/// Get the current status of a mirror tree.
///
/// Files that cannot be parsed are reported with `documents: None`.
///
/// # Errors
///
/// Returns `MirrorError::NotFound` if `root` does not exist, or an IO error
/// if a folder cannot be listed.
pub fn get_mirror_status(root: &Path) -> MirrorResult<MirrorStatus> {
    if !root.is_dir() {
        return Err(MirrorError::NotFound(root.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    let mut databases = Vec::with_capacity(names.len());
    for name in names {
        let mut collection_names = list_collections(root, &name)?;
        collection_names.sort();

        let collections = collection_names
            .into_iter()
            .map(|collection| inspect_collection(root, &name, collection))
            .collect();

        databases.push(DatabaseStatus { name, collections });
    }

    Ok(MirrorStatus {
        root: root.to_path_buf(),
        databases,
    })
}

fn inspect_collection(root: &Path, database: &str, collection: String) -> CollectionFileInfo {
    let path = collection_path(root, database, &collection);
    let content = fs::read(&path).unwrap_or_default();
    let documents = std::str::from_utf8(&content)
        .ok()
        .and_then(|text| parse_collection(text).ok())
        .map(|docs| docs.len());

    CollectionFileInfo {
        size: file_size(&path),
        documents,
        hash: short_hash(&content_hash(&content)).to_string(),
        has_schema: schema_path(root, database, &collection).exists(),
        name: collection,
    }
}

/// Print mirror status to stdout in a human-readable format.
pub fn print_status(status: &MirrorStatus) {
    println!("{}", "Mirror Status".bold().underline());
    println!("Root: {}", status.root.display());
    println!();

    if status.databases.is_empty() {
        println!("{}", "No databases mirrored yet.".dimmed());
        println!("{}", "Run 'rage pull' to create the mirror.".dimmed());
        return;
    }

    for database in &status.databases {
        println!("{}", format!("{}:", database.name).blue().bold());
        if database.collections.is_empty() {
            println!("  {}", "(no collection files)".dimmed());
        }
        for file in &database.collections {
            let docs = match file.documents {
                Some(n) => format!("{n} documents"),
                None => "invalid JSON".red().to_string(),
            };
            let schema = if file.has_schema {
                "schema".green()
            } else {
                "no schema".yellow()
            };
            println!(
                "  {} ({}, {}, {}) {}",
                file.name,
                format_size(file.size),
                docs,
                schema,
                file.hash.dimmed()
            );
        }
        println!();
    }

    println!(
        "  {}: {} collections in {} databases",
        "Total".bold(),
        status.total_collections(),
        status.databases.len()
    );
}

/// Format a byte size as a human-readable string.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }

    #[test]
    fn test_status_missing_root() {
        let result = get_mirror_status(Path::new("/nonexistent/mirror"));
        assert!(matches!(result, Err(MirrorError::NotFound(_))));
    }

    #[test]
    fn test_status_empty_root() {
        let temp_dir = TempDir::new().unwrap();
        let status = get_mirror_status(temp_dir.path()).unwrap();
        assert!(status.databases.is_empty());
        assert_eq!(status.total_collections(), 0);
    }

    #[test]
    fn test_status_reports_collections() {
        let temp_dir = TempDir::new().unwrap();
        let shop = temp_dir.path().join("shop");
        fs::create_dir_all(shop.join("schemas")).unwrap();
        fs::write(shop.join("users.json"), r#"[{"id":"1"},{"id":"2"}]"#).unwrap();
        fs::write(shop.join("broken.json"), "[{").unwrap();
        fs::write(shop.join("schemas").join("users.json"), "{}").unwrap();

        let status = get_mirror_status(temp_dir.path()).unwrap();
        assert_eq!(status.databases.len(), 1);

        let shop = &status.databases[0];
        assert_eq!(shop.name, "shop");
        assert_eq!(shop.collections.len(), 2);

        let broken = &shop.collections[0];
        assert_eq!(broken.name, "broken");
        assert_eq!(broken.documents, None);
        assert!(!broken.has_schema);

        let users = &shop.collections[1];
        assert_eq!(users.documents, Some(2));
        assert!(users.has_schema);
        assert_eq!(users.hash.len(), 12);
    }
}
