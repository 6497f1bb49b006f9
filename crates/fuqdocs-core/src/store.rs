//! Document store
//!
//! The `DocumentStore` owns the manifest (the ordered list of document keys,
//! most recently saved first) and every persisted document record.
//!
//! ## Write ordering
//!
//! The manifest and the records are separate keys, so each mutation is two
//! writes. They are ordered so that an interrupted operation never leaves
//! the manifest pointing at a record that was never written:
//!
//! - **save**: record first, then manifest.
//! - **delete**: manifest first, then record. The worst case is an orphaned
//!   record that no manifest entry references.
//!
//! ## Usage
//!
//! ```ignore
//! let medium: Rc<dyn Medium> = Rc::new(MemoryMedium::new());
//! let mut store = DocumentStore::open(medium)?;
//!
//! let mut doc = store.new_document();
//! doc.title = "Alpha".into();
//! store.save_document(&mut doc)?;
//!
//! assert_eq!(store.manifest()[0], keys::key_for(&doc));
//! ```

use std::rc::Rc;

use chrono::Utc;

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::events::{Notifier, StoreEvent, Subscription};
use crate::keys::{self, MANIFEST_KEY};
use crate::models::Document;
use crate::storage::Medium;

/// Source of the current time in milliseconds since the epoch (UTC)
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manifest and CRUD over documents in a medium
pub struct DocumentStore {
    medium: Rc<dyn Medium>,
    manifest: Vec<String>,
    events: Notifier<StoreEvent>,
    clock: Box<dyn Clock>,
}

impl DocumentStore {
    /// Open a store over `medium` and load its manifest
    pub fn open(medium: Rc<dyn Medium>) -> StoreResult<Self> {
        Self::with_clock(medium, Notifier::new(), Box::new(SystemClock))
    }

    /// Open a store with an explicit notifier and clock
    pub fn with_clock(
        medium: Rc<dyn Medium>,
        events: Notifier<StoreEvent>,
        clock: Box<dyn Clock>,
    ) -> StoreResult<Self> {
        let mut store = Self {
            medium,
            manifest: Vec::new(),
            events,
            clock,
        };
        store.load_manifest()?;
        Ok(store)
    }

    /// Document keys, most recently saved first
    pub fn manifest(&self) -> &[String] {
        &self.manifest
    }

    /// Subscribe to save/delete notifications
    pub fn subscribe(&self) -> Subscription<StoreEvent> {
        self.events.subscribe()
    }

    /// The notifier this store publishes on
    pub fn notifier(&self) -> &Notifier<StoreEvent> {
        &self.events
    }

    /// The medium this store reads and writes
    pub fn medium(&self) -> &Rc<dyn Medium> {
        &self.medium
    }

    /// Allocate a new, unsaved document
    pub fn new_document(&self) -> Document {
        Document::new(self.clock.now_millis())
    }

    /// Re-read the manifest from the medium, replacing the in-memory copy
    pub fn load_manifest(&mut self) -> StoreResult<()> {
        self.manifest = match self.medium.get(MANIFEST_KEY)? {
            Some(text) if !text.is_empty() => serde_json::from_str(&text)
                .map_err(|e| StoreError::CorruptManifest(e.to_string()))?,
            _ => Vec::new(),
        };
        Ok(())
    }

    fn save_manifest(&self) -> StoreResult<()> {
        let text = serde_json::to_string(&self.manifest)
            .map_err(|e| StoreError::CorruptManifest(e.to_string()))?;
        self.medium.set(MANIFEST_KEY, &text)?;
        Ok(())
    }

    /// Load a document by key
    ///
    /// Returns `Ok(None)` if nothing is stored under `key`. A stored record
    /// that fails to decode is an error, not `None`.
    pub fn load_document(&self, key: &str) -> StoreResult<Option<Document>> {
        match self.medium.get(key)? {
            Some(text) if !text.is_empty() => Ok(Some(codec::decode(&text)?)),
            _ => Ok(None),
        }
    }

    /// Load the most recently saved document
    pub fn last_saved_document(&self) -> StoreResult<Option<Document>> {
        match self.manifest.first() {
            Some(key) => self.load_document(key),
            None => Ok(None),
        }
    }

    /// Persist a document and move it to the front of the manifest
    ///
    /// Bumps `updated_at`. Saving unchanged content is harmless: the only
    /// effects are the timestamp and the notification.
    pub fn save_document(&mut self, doc: &mut Document) -> StoreResult<()> {
        let key = Self::checked_key(doc)?;

        doc.updated_at = self.clock.now_millis().max(doc.created_at);
        let record = codec::encode(doc)?;
        self.medium.set(&key, &record)?;

        self.manifest.retain(|k| k != &key);
        self.manifest.insert(0, key.clone());
        self.save_manifest()?;

        tracing::debug!("Saved document {}", key);
        self.events.publish(StoreEvent::DocumentSaved {
            key,
            doc: doc.clone(),
        });
        Ok(())
    }

    /// Remove a document and its manifest entry
    pub fn delete_document(&mut self, doc: &Document) -> StoreResult<()> {
        let key = Self::checked_key(doc)?;

        self.manifest.retain(|k| k != &key);
        self.save_manifest()?;

        self.medium.remove(&key)?;

        tracing::debug!("Deleted document {}", key);
        self.events.publish(StoreEvent::DocumentDeleted { key });
        Ok(())
    }

    fn checked_key(doc: &Document) -> StoreResult<String> {
        if doc.id.is_empty() {
            return Err(StoreError::InvalidArgument(
                "document has no id".to_string(),
            ));
        }
        Ok(keys::key_for(doc))
    }
}
