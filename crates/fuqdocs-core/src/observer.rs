//! Storage observer
//!
//! Watches for changes other instances make to the shared medium and
//! brings this instance's in-memory state back in line:
//!
//! - manifest changed → reload the store's manifest
//! - a document record removed → publish `DocumentDeleted` on the store's
//!   notifier, as if it had been deleted here
//! - the open document's record changed → reopen it (the other instance's
//!   write wins; unsaved local edits are dropped)
//! - any other document changed → nothing, it is read fresh when opened
//! - theme changed → apply it to `Presentation`

use std::rc::Rc;

use crate::current::CurrentDocument;
use crate::error::StoreResult;
use crate::events::{Notifier, PresentationEvent, StoreEvent, Subscription};
use crate::keys::{KeyKind, THEME_KEY};
use crate::models::Theme;
use crate::storage::{Medium, StorageEvent};
use crate::store::DocumentStore;

/// Process-wide presentation state (currently the theme)
#[derive(Debug, Default)]
pub struct Presentation {
    theme: Theme,
    events: Notifier<PresentationEvent>,
}

impl Presentation {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            events: Notifier::new(),
        }
    }

    /// Read the stored theme, falling back to the default
    pub fn load(medium: &dyn Medium) -> StoreResult<Self> {
        let theme = match medium.get(THEME_KEY)? {
            Some(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored theme: {}", e);
                Theme::default()
            }),
            None => Theme::default(),
        };
        Ok(Self::new(theme))
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Apply a theme, notifying subscribers if it changed
    pub fn apply(&mut self, theme: Theme) {
        if self.theme != theme {
            self.theme = theme;
            self.events.publish(PresentationEvent::ThemeChanged(theme));
        }
    }

    pub fn subscribe(&self) -> Subscription<PresentationEvent> {
        self.events.subscribe()
    }
}

/// What the observer did with one storage event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    ManifestReloaded,
    DocumentDeleted(String),
    CurrentDocumentReloaded(String),
    /// A document that is not open changed
    OtherDocumentChanged(String),
    ThemeApplied(Theme),
    Ignored(String),
    /// Handling the change to `key` failed; later changes were still handled
    Failed { key: String, reason: String },
}

/// Reconciles local state with changes made by other instances
pub struct StorageObserver {
    medium: Rc<dyn Medium>,
    store_events: Notifier<StoreEvent>,
}

impl StorageObserver {
    /// Observe the medium a store is built on
    ///
    /// Deletions are published on the store's own notifier.
    pub fn new(store: &DocumentStore) -> Self {
        Self {
            medium: Rc::clone(store.medium()),
            store_events: store.notifier().clone(),
        }
    }

    /// Pull pending changes from the medium and handle each in order
    ///
    /// A change that cannot be handled is logged and reported as
    /// [`Observed::Failed`]; the rest of the batch is still applied. Only a
    /// failure to read the pending changes themselves is returned as an error.
    pub fn poll(
        &self,
        store: &mut DocumentStore,
        current: &mut CurrentDocument,
        presentation: &mut Presentation,
    ) -> StoreResult<Vec<Observed>> {
        let changes = self.medium.poll_changes()?;
        let observed = changes
            .iter()
            .map(|change| {
                self.handle_change(change, store, current, presentation)
                    .unwrap_or_else(|e| {
                        tracing::warn!("Failed to apply change to {}: {}", change.key, e);
                        Observed::Failed {
                            key: change.key.clone(),
                            reason: e.to_string(),
                        }
                    })
            })
            .collect();
        Ok(observed)
    }

    /// Handle a single storage event
    pub fn handle_change(
        &self,
        change: &StorageEvent,
        store: &mut DocumentStore,
        current: &mut CurrentDocument,
        presentation: &mut Presentation,
    ) -> StoreResult<Observed> {
        let key = change.key.as_str();
        match KeyKind::classify(key) {
            KeyKind::Manifest => {
                tracing::debug!("Manifest updated elsewhere");
                store.load_manifest()?;
                Ok(Observed::ManifestReloaded)
            }
            KeyKind::Document => self.handle_document_change(change, store, current),
            KeyKind::Theme => {
                let Some(value) = change.new_value.as_deref() else {
                    return Ok(Observed::Ignored(key.to_string()));
                };
                match value.parse::<Theme>() {
                    Ok(theme) => {
                        tracing::debug!("Theme changed elsewhere to {}", theme);
                        presentation.apply(theme);
                        Ok(Observed::ThemeApplied(theme))
                    }
                    Err(e) => {
                        tracing::warn!("Ignoring theme change: {}", e);
                        Ok(Observed::Ignored(key.to_string()))
                    }
                }
            }
            KeyKind::OtherInNamespace | KeyKind::Foreign => Ok(Observed::Ignored(key.to_string())),
        }
    }

    fn handle_document_change(
        &self,
        change: &StorageEvent,
        store: &DocumentStore,
        current: &mut CurrentDocument,
    ) -> StoreResult<Observed> {
        let key = change.key.clone();

        if change.is_removal() {
            tracing::debug!("Document {} deleted elsewhere", key);
            self.store_events
                .publish(StoreEvent::DocumentDeleted { key: key.clone() });
            return Ok(Observed::DocumentDeleted(key));
        }

        if current.key().as_deref() == Some(key.as_str()) {
            tracing::debug!("Current document {} updated elsewhere", key);
            if let Some(doc) = store.load_document(&key)? {
                current.open(doc);
            }
            return Ok(Observed::CurrentDocumentReloaded(key));
        }

        tracing::debug!("Document {} updated elsewhere", key);
        Ok(Observed::OtherDocumentChanged(key))
    }
}
