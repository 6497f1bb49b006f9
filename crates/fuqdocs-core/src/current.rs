//! The currently open document
//!
//! `CurrentDocument` is a stable handle to whichever document the user is
//! looking at. The document behind it can be swapped, and its title and
//! content edited in place, without consumers holding a new object; they
//! subscribe once and are told what changed.
//!
//! Edits here are not persisted until the document is saved through the
//! store.

use crate::events::{DocumentEvent, Notifier, Subscription};
use crate::keys;
use crate::models::Document;

#[derive(Debug, Default)]
pub struct CurrentDocument {
    doc: Option<Document>,
    events: Notifier<DocumentEvent>,
}

impl CurrentDocument {
    /// Create an empty reference
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> Subscription<DocumentEvent> {
        self.events.subscribe()
    }

    /// Replace the open document
    pub fn open(&mut self, doc: Document) {
        self.doc = Some(doc);
        self.events.publish(DocumentEvent::DocumentChanged);
    }

    pub fn is_open(&self) -> bool {
        self.doc.is_some()
    }

    pub fn document(&self) -> Option<&Document> {
        self.doc.as_ref()
    }

    /// Mutable access for committing a save through the store
    ///
    /// Does not publish anything; use `set_title`/`set_content` for edits.
    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.doc.as_mut()
    }

    /// Storage key of the open document
    pub fn key(&self) -> Option<String> {
        self.doc.as_ref().map(keys::key_for)
    }

    pub fn id(&self) -> Option<&str> {
        self.doc.as_ref().map(|d| d.id.as_str())
    }

    pub fn title(&self) -> &str {
        self.doc.as_ref().map_or("", |d| d.title.as_str())
    }

    pub fn content(&self) -> &str {
        self.doc.as_ref().map_or("", |d| d.content.as_str())
    }

    pub fn created_at(&self) -> i64 {
        self.doc.as_ref().map_or(0, |d| d.created_at)
    }

    pub fn updated_at(&self) -> i64 {
        self.doc.as_ref().map_or(0, |d| d.updated_at)
    }

    /// Edit the title; no-op when nothing is open
    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Some(doc) = self.doc.as_mut() {
            doc.title = title.into();
            self.events.publish(DocumentEvent::TitleChanged);
        }
    }

    /// Edit the content; no-op when nothing is open
    pub fn set_content(&mut self, content: impl Into<String>) {
        if let Some(doc) = self.doc.as_mut() {
            doc.content = content.into();
            self.events.publish(DocumentEvent::ContentChanged);
        }
    }

    /// True when the content is blank
    pub fn is_empty(&self) -> bool {
        self.content().trim().is_empty()
    }
}
