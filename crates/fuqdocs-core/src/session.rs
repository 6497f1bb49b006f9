//! Application session
//!
//! A `Session` wires the store, the current document, presentation state
//! and the storage observer together and carries the application's flow:
//! what is open at startup, when a save is refused, and what to open after
//! the current document disappears.
//!
//! # Example
//!
//! ```ignore
//! let mut session = Session::open_storage(&config)?;
//! session.current_mut().set_content("# Notes");
//! match session.save()? {
//!     SaveOutcome::Saved => {}
//!     SaveOutcome::TitleRequired => eprintln!("Set a title first"),
//! }
//! ```

use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::current::CurrentDocument;
use crate::error::{StoreError, StoreResult};
use crate::events::{drain, Notifier, StoreEvent, Subscription};
use crate::keys::{self, THEME_KEY};
use crate::migrations::{MigrationReport, MigrationRunner};
use crate::models::{millis_to_datetime, Document, Theme};
use crate::observer::{Observed, Presentation, StorageObserver};
use crate::storage::{Medium, SqliteMedium};
use crate::store::{Clock, DocumentStore, SystemClock};
use crate::welcome::{WELCOME_CONTENT, WELCOME_TITLE};

/// Filters shorter than this many characters match every document
pub const MIN_FILTER_CHARS: usize = 2;

/// Result of asking the session to save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The open document has no title; nothing was written
    TitleRequired,
}

/// One row of a document listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub key: String,
    pub id: String,
    pub title: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_current: bool,
}

impl DocumentSummary {
    fn from_document(key: &str, doc: &Document, current_key: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            id: doc.id.clone(),
            title: doc.title.clone(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            is_current: current_key == Some(key),
        }
    }

    /// Last save time as a `DateTime`
    pub fn updated(&self) -> DateTime<Utc> {
        millis_to_datetime(self.updated_at)
    }
}

pub struct Session {
    store: DocumentStore,
    current: CurrentDocument,
    presentation: Presentation,
    observer: StorageObserver,
    store_events: Subscription<StoreEvent>,
    migrations: MigrationReport,
}

impl Session {
    /// Open the on-disk storage named by `config`
    pub fn open_storage(config: &Config) -> StoreResult<Self> {
        let medium = SqliteMedium::open(&config.storage_path(), config.change_retention)?;
        Self::open(Rc::new(medium))
    }

    /// Start a session over `medium` with the built-in migrations
    pub fn open(medium: Rc<dyn Medium>) -> StoreResult<Self> {
        Self::open_with(medium, &MigrationRunner::default(), Box::new(SystemClock))
    }

    /// Start a session with explicit migrations and clock
    ///
    /// Migrations run first. A failed migration is logged and recorded in
    /// [`Session::migrations`] but does not prevent the session from opening.
    pub fn open_with(
        medium: Rc<dyn Medium>,
        runner: &MigrationRunner,
        clock: Box<dyn Clock>,
    ) -> StoreResult<Self> {
        let migrations = runner.run(medium.as_ref());
        let presentation = Presentation::load(medium.as_ref())?;
        let store = DocumentStore::with_clock(medium, Notifier::new(), clock)?;
        let store_events = store.subscribe();
        let observer = StorageObserver::new(&store);

        let mut session = Self {
            store,
            current: CurrentDocument::new(),
            presentation,
            observer,
            store_events,
            migrations,
        };
        session.open_initial_document()?;
        Ok(session)
    }

    fn open_initial_document(&mut self) -> StoreResult<()> {
        if !self.store.manifest().is_empty() {
            match self.first_readable_document()? {
                Some(doc) => {
                    tracing::info!("Opening last saved document {}", doc.id);
                    self.current.open(doc);
                }
                None => {
                    tracing::warn!("No listed document is readable, starting a blank one");
                    let doc = self.store.new_document();
                    self.current.open(doc);
                }
            }
            return Ok(());
        }

        tracing::info!("No saved documents, creating the welcome document");
        let mut doc = self.store.new_document();
        doc.title = WELCOME_TITLE.to_string();
        doc.content = WELCOME_CONTENT.to_string();
        self.store.save_document(&mut doc)?;
        self.current.open(doc);
        drain(&mut self.store_events);
        Ok(())
    }

    /// The most recently saved document that can be read
    ///
    /// Listed keys without a record and corrupt records are skipped and
    /// left as they are.
    fn first_readable_document(&self) -> StoreResult<Option<Document>> {
        for key in self.store.manifest() {
            match self.store.load_document(key) {
                Ok(Some(doc)) => return Ok(Some(doc)),
                Ok(None) => tracing::warn!("Manifest lists {} but it has no record", key),
                Err(e) if e.is_corrupt_data() => {
                    tracing::warn!("Skipping unreadable document {}: {}", key, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn current(&self) -> &CurrentDocument {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut CurrentDocument {
        &mut self.current
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn theme(&self) -> Theme {
        self.presentation.theme()
    }

    /// What the startup migrations did
    pub fn migrations(&self) -> &MigrationReport {
        &self.migrations
    }

    /// Save the open document
    ///
    /// Documents without a title are never written.
    pub fn save(&mut self) -> StoreResult<SaveOutcome> {
        let doc = self
            .current
            .document_mut()
            .ok_or_else(|| StoreError::InvalidArgument("no document is open".to_string()))?;

        if doc.title.is_empty() {
            tracing::debug!("Refusing to save untitled document {}", doc.id);
            return Ok(SaveOutcome::TitleRequired);
        }

        self.store.save_document(doc)?;
        Ok(SaveOutcome::Saved)
    }

    /// Whether the open document differs from its stored record
    ///
    /// A document that has never been saved always counts as changed.
    pub fn has_unsaved_changes(&self) -> StoreResult<bool> {
        let Some(doc) = self.current.document() else {
            return Ok(false);
        };
        match self.store.load_document(&keys::key_for(doc))? {
            Some(stored) => Ok(stored.title != doc.title || stored.content != doc.content),
            None => Ok(true),
        }
    }

    /// Save only if there is something new to write
    ///
    /// Returns `None` when the stored record is already up to date.
    pub fn autosave(&mut self) -> StoreResult<Option<SaveOutcome>> {
        if !self.has_unsaved_changes()? {
            return Ok(None);
        }
        self.save().map(Some)
    }

    /// Open a fresh, unsaved document
    pub fn new_document(&mut self, title: impl Into<String>) {
        let mut doc = self.store.new_document();
        doc.title = title.into();
        tracing::info!("Started new document {}", doc.id);
        self.current.open(doc);
    }

    /// Open the document stored under `key`
    pub fn open_document(&mut self, key: &str) -> StoreResult<()> {
        let doc = self
            .store
            .load_document(key)?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        tracing::info!("Opened document {}", doc.id);
        self.current.open(doc);
        Ok(())
    }

    /// Find the manifest key whose document id starts with `prefix`
    ///
    /// A full id or a full key always resolves to itself if it is listed.
    pub fn resolve(&self, prefix: &str) -> StoreResult<String> {
        if prefix.is_empty() {
            return Err(StoreError::InvalidArgument(
                "an id or id prefix is required".to_string(),
            ));
        }

        let manifest = self.store.manifest();
        if manifest.iter().any(|k| k == prefix) {
            return Ok(prefix.to_string());
        }

        let matches: Vec<&String> = manifest
            .iter()
            .filter(|k| keys::document_id(k).is_some_and(|id| id.starts_with(prefix)))
            .collect();

        match matches.as_slice() {
            [key] => Ok((*key).clone()),
            [] => Err(StoreError::NotFound(prefix.to_string())),
            _ => {
                let exact = matches
                    .iter()
                    .find(|k| keys::document_id(k) == Some(prefix));
                match exact {
                    Some(key) => Ok((*key).clone()),
                    None => Err(StoreError::AmbiguousId {
                        prefix: prefix.to_string(),
                        count: matches.len(),
                    }),
                }
            }
        }
    }

    /// Delete the open document and move on to another one
    ///
    /// Deleting a document that was never saved just discards it.
    pub fn delete_current(&mut self) -> StoreResult<()> {
        let Some(doc) = self.current.document().cloned() else {
            return Ok(());
        };
        tracing::info!("Deleting document {}", doc.id);
        self.store.delete_document(&doc)?;
        self.process_store_events()?;
        Ok(())
    }

    /// React to queued store events
    ///
    /// When the open document has been deleted (here or elsewhere), the most
    /// recently saved document is opened instead, or a blank one if none are
    /// left. Returns the events that were handled.
    pub fn process_store_events(&mut self) -> StoreResult<Vec<StoreEvent>> {
        let events = drain(&mut self.store_events);
        for event in &events {
            if let StoreEvent::DocumentDeleted { key } = event {
                if self.current.key().as_deref() == Some(key.as_str()) {
                    self.reopen_after_delete()?;
                }
            }
        }
        Ok(events)
    }

    fn reopen_after_delete(&mut self) -> StoreResult<()> {
        match self.first_readable_document()? {
            Some(doc) => {
                tracing::info!("Open document was deleted, switching to {}", doc.id);
                self.current.open(doc);
            }
            None => {
                tracing::info!("Last document was deleted, starting a blank one");
                let doc = self.store.new_document();
                self.current.open(doc);
            }
        }
        Ok(())
    }

    /// Apply changes other instances have made, then handle the resulting events
    pub fn sync(&mut self) -> StoreResult<Vec<Observed>> {
        let observed =
            self.observer
                .poll(&mut self.store, &mut self.current, &mut self.presentation)?;
        self.process_store_events()?;
        Ok(observed)
    }

    /// List documents, most recently saved first
    ///
    /// With a filter of at least [`MIN_FILTER_CHARS`] characters only
    /// documents whose title contains it (ignoring case) are listed.
    /// Unreadable records are skipped.
    pub fn browse(&self, filter: &str) -> StoreResult<Vec<DocumentSummary>> {
        let needle = filter.to_lowercase();
        let filtering = needle.chars().count() >= MIN_FILTER_CHARS;
        let current_key = self.current.key();

        let mut listing = Vec::new();
        for key in self.store.manifest() {
            let doc = match self.store.load_document(key) {
                Ok(Some(doc)) => doc,
                Ok(None) => {
                    tracing::warn!("Manifest lists {} but it has no record", key);
                    continue;
                }
                Err(e) if e.is_corrupt_data() => {
                    tracing::warn!("Skipping unreadable document {}: {}", key, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if filtering && !doc.title.to_lowercase().contains(&needle) {
                continue;
            }
            listing.push(DocumentSummary::from_document(
                key,
                &doc,
                current_key.as_deref(),
            ));
        }
        Ok(listing)
    }

    /// Persist a theme and apply it here
    pub fn set_theme(&mut self, theme: Theme) -> StoreResult<()> {
        self.store.medium().set(THEME_KEY, theme.as_str())?;
        self.presentation.apply(theme);
        Ok(())
    }

    /// Switch between dark and light, returning the new theme
    pub fn toggle_theme(&mut self) -> StoreResult<Theme> {
        let theme = self.presentation.theme().toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }
}
