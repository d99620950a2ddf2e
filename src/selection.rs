//! Database selection resolution.
//!
//! A [`DatabaseSelection`] is the credential, database allow-list and
//! collection exclusion list used for one pull or push. It is built from the
//! persisted configuration, optionally overridden field by field with values
//! collected from the command line. No I/O happens here.

use serde::Serialize;
use tracing::warn;

/// Resolved credential, allow-list and exclusions for one run.
///
/// Invariants (enforced by [`DatabaseSelection::new`]):
/// - `databases` entries are trimmed, non-empty and unique, in first-seen order
/// - `excluded_collections` entries are trimmed, non-empty and unique
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseSelection {
    /// Connection secret for the remote store.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Databases to synchronize, in processing order.
    pub databases: Vec<String>,
    /// Collection names that are never synchronized.
    pub excluded_collections: Vec<String>,
}

impl DatabaseSelection {
    /// Build a selection, normalizing both lists.
    pub fn new<D, E>(secret: impl Into<String>, databases: D, excluded_collections: E) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let excluded_collections = normalize_tokens(excluded_collections);
        for token in excluded_collections.iter().filter(|t| t.contains('/')) {
            warn!(
                token = %token,
                "Exclusion tokens match bare collection names; scoped 'database/collection' tokens are not supported"
            );
        }

        Self {
            secret: secret.into(),
            databases: normalize_tokens(databases),
            excluded_collections,
        }
    }

    /// Whether `collection` is excluded.
    ///
    /// Tokens match the bare collection name exactly.
    #[must_use]
    pub fn is_excluded(&self, collection: &str) -> bool {
        self.excluded_collections.iter().any(|c| c == collection)
    }
}

/// Raw values collected interactively or from command-line flags.
///
/// Empty fields fall back to the persisted value. List fields are
/// comma-separated free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionOverride {
    pub secret: String,
    pub databases: String,
    pub excluded_collections: String,
}

impl SelectionOverride {
    /// Returns true if no field carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secret.trim().is_empty()
            && self.databases.trim().is_empty()
            && self.excluded_collections.trim().is_empty()
    }
}

/// Merge a persisted selection with an optional override.
///
/// `None` means the persisted configuration was accepted as-is. Otherwise
/// each field is taken from the override unless it is blank.
#[must_use]
pub fn resolve(persisted: &DatabaseSelection, over: Option<&SelectionOverride>) -> DatabaseSelection {
    let Some(over) = over else {
        return persisted.clone();
    };

    let secret = if over.secret.trim().is_empty() {
        persisted.secret.clone()
    } else {
        over.secret.trim().to_string()
    };

    let databases = if over.databases.trim().is_empty() {
        persisted.databases.clone()
    } else {
        split_list(&over.databases)
    };

    let excluded = if over.excluded_collections.trim().is_empty() {
        persisted.excluded_collections.clone()
    } else {
        split_list(&over.excluded_collections)
    };

    DatabaseSelection::new(secret, databases, excluded)
}

/// Split comma-separated input into trimmed, non-empty tokens.
#[must_use]
pub fn split_list(input: &str) -> Vec<String> {
    normalize_tokens(input.split(','))
}

fn normalize_tokens<I>(tokens: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        let token = token.as_ref().trim();
        if token.is_empty() || out.iter().any(|t| t == token) {
            continue;
        }
        out.push(token.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persisted() -> DatabaseSelection {
        DatabaseSelection::new("mongodb://saved", ["shop", "crm"], ["sessions"])
    }

    #[test]
    fn test_no_override_returns_persisted() {
        let base = persisted();
        assert_eq!(resolve(&base, None), base);
    }

    #[test]
    fn test_blank_fields_fall_back() {
        let base = persisted();
        let over = SelectionOverride {
            secret: "   ".into(),
            databases: String::new(),
            excluded_collections: "logs".into(),
        };

        let resolved = resolve(&base, Some(&over));
        assert_eq!(resolved.secret, "mongodb://saved");
        assert_eq!(resolved.databases, vec!["shop", "crm"]);
        assert_eq!(resolved.excluded_collections, vec!["logs"]);
    }

    #[test]
    fn test_override_lists_are_trimmed_and_empty_tokens_dropped() {
        let over = SelectionOverride {
            secret: "mongodb://other".into(),
            databases: " a , b,, ,c ,a".into(),
            excluded_collections: " orders ,".into(),
        };

        let resolved = resolve(&persisted(), Some(&over));
        assert_eq!(resolved.secret, "mongodb://other");
        assert_eq!(resolved.databases, vec!["a", "b", "c"]);
        assert_eq!(resolved.excluded_collections, vec!["orders"]);
    }

    #[test]
    fn test_exclusion_is_exact_membership() {
        let selection = DatabaseSelection::new("", ["shop"], ["orders"]);

        assert!(selection.is_excluded("orders"));
        assert!(!selection.is_excluded("users"));
        assert!(!selection.is_excluded("order"));
        // Position in the list must not be mistaken for membership
        assert!(!selection.is_excluded("0"));
    }

    #[test]
    fn test_scoped_token_matches_nothing_else() {
        let selection = DatabaseSelection::new("", ["shop"], ["shop/orders"]);
        assert!(!selection.is_excluded("orders"));
    }

    #[test]
    fn test_override_is_empty() {
        assert!(SelectionOverride::default().is_empty());
        assert!(
            !SelectionOverride {
                databases: "x".into(),
                ..Default::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn test_secret_is_not_serialized() {
        let json = serde_json::to_value(persisted()).unwrap();
        assert!(json.get("secret").is_none());
        assert_eq!(json["databases"][0], "shop");
    }
}
