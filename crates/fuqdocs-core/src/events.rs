//! Typed change notifications
//!
//! Components that others need to react to own a `Notifier` and publish
//! typed events on it. Consumers call `subscribe()` and drain the returned
//! receiver; nothing is global.
//!
//! ```ignore
//! let mut rx = store.subscribe();
//! store.save_document(&mut doc)?;
//! while let Ok(event) = rx.try_recv() { /* … */ }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::mpsc;

use crate::models::{Document, Theme};

/// Events published by the document store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A document was written and moved to the front of the manifest
    DocumentSaved { key: String, doc: Document },
    /// A document was removed, here or by another instance
    DocumentDeleted { key: String },
}

/// Events published by the current-document reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    /// A different document was opened
    DocumentChanged,
    /// The open document's title was edited
    TitleChanged,
    /// The open document's content was edited
    ContentChanged,
}

/// Events published when shared presentation state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationEvent {
    ThemeChanged(Theme),
}

/// Receiving half of a subscription
pub type Subscription<E> = mpsc::UnboundedReceiver<E>;

/// Fan-out publisher for one event type
///
/// Cloning a `Notifier` yields another handle to the same subscriber list,
/// so the store and the storage observer can publish on one stream.
#[derive(Debug)]
pub struct Notifier<E> {
    subscribers: Rc<RefCell<Vec<mpsc::UnboundedSender<E>>>>,
}

impl<E> Clone for Notifier<E> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<E: Clone> Notifier<E> {
    /// Create a notifier with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> Subscription<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber
    ///
    /// Subscribers whose receiver has been dropped are forgotten.
    pub fn publish(&self, event: E) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }
}

/// Drain every event currently queued on a subscription
pub fn drain<E>(rx: &mut Subscription<E>) -> Vec<E> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
