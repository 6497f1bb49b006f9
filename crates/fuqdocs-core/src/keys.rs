//! Storage key layout
//!
//! Every key this application writes lives under one namespace prefix so
//! the medium can be shared with unrelated data:
//!
//! | Key | Value |
//! |---|---|
//! | `fuqdocs.manifest` | JSON array of document keys, most recent first |
//! | `fuqdocs.docs/<id>` | encoded document record |
//! | `fuqdocs.theme` | `dark` or `light` |

use crate::models::Document;

/// Namespace prefix for all keys
pub const NAMESPACE: &str = "fuqdocs";

/// Key holding the manifest
pub const MANIFEST_KEY: &str = "fuqdocs.manifest";

/// Key holding the presentation theme
pub const THEME_KEY: &str = "fuqdocs.theme";

/// Prefix of every document record key
pub const DOC_PREFIX: &str = "fuqdocs.docs";

/// Derive the storage key for a document id
pub fn document_key(id: &str) -> String {
    format!("{}/{}", DOC_PREFIX, id)
}

/// Derive the storage key for a document
pub fn key_for(doc: &Document) -> String {
    document_key(&doc.id)
}

/// Extract the document id from a document key
pub fn document_id(key: &str) -> Option<&str> {
    key.strip_prefix(DOC_PREFIX)?.strip_prefix('/')
}

/// What a storage key refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Manifest,
    Document,
    Theme,
    /// In our namespace, but not a key we act on
    OtherInNamespace,
    /// Belongs to something else sharing the medium
    Foreign,
}

impl KeyKind {
    /// Classify a storage key
    pub fn classify(key: &str) -> Self {
        if !key.starts_with(NAMESPACE) {
            KeyKind::Foreign
        } else if key == MANIFEST_KEY {
            KeyKind::Manifest
        } else if key == THEME_KEY {
            KeyKind::Theme
        } else if document_id(key).is_some() {
            KeyKind::Document
        } else {
            KeyKind::OtherInNamespace
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_key_round_trip() {
        let key = document_key("abc");
        assert_eq!(key, "fuqdocs.docs/abc");
        assert_eq!(document_id(&key), Some("abc"));
        assert_eq!(document_id(MANIFEST_KEY), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(KeyKind::classify("fuqdocs.manifest"), KeyKind::Manifest);
        assert_eq!(KeyKind::classify("fuqdocs.theme"), KeyKind::Theme);
        assert_eq!(KeyKind::classify("fuqdocs.docs/x"), KeyKind::Document);
        assert_eq!(
            KeyKind::classify("fuqdocs.lastSaved"),
            KeyKind::OtherInNamespace
        );
        assert_eq!(KeyKind::classify("scratchmark.manifest"), KeyKind::Foreign);
        assert_eq!(KeyKind::classify("other-app"), KeyKind::Foreign);
    }
}
