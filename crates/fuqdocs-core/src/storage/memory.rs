//! In-memory medium
//!
//! A `MemoryOrigin` holds the shared key space. Each `MemoryMedium`
//! connected to it is an independent handle; a write through one handle is
//! delivered as a `StorageEvent` to every other handle.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::{Medium, StorageEvent};
use crate::error::{MediumError, MediumResult};

#[derive(Default)]
struct OriginState {
    values: BTreeMap<String, String>,
    subscribers: Vec<(u64, mpsc::UnboundedSender<StorageEvent>)>,
    next_handle: u64,
}

impl OriginState {
    fn publish(&mut self, from: u64, event: StorageEvent) {
        self.subscribers
            .retain(|(handle, tx)| *handle == from || tx.send(event.clone()).is_ok());
    }
}

/// Shared key space for in-memory handles
#[derive(Clone, Default)]
pub struct MemoryOrigin {
    state: Arc<Mutex<OriginState>>,
}

impl MemoryOrigin {
    /// Create an empty origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys stored
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.values.len()).unwrap_or(0)
    }

    /// Whether the origin holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every key/value pair, sorted by key
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.state
            .lock()
            .map(|s| s.values.clone())
            .unwrap_or_default()
    }
}

/// One handle onto a `MemoryOrigin`
pub struct MemoryMedium {
    origin: MemoryOrigin,
    handle: u64,
    events: Mutex<mpsc::UnboundedReceiver<StorageEvent>>,
}

impl MemoryMedium {
    /// Create a handle onto a fresh, private origin
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = OriginState {
            values: BTreeMap::new(),
            subscribers: vec![(0, tx)],
            next_handle: 1,
        };
        Self {
            origin: MemoryOrigin {
                state: Arc::new(Mutex::new(state)),
            },
            handle: 0,
            events: Mutex::new(rx),
        }
    }

    /// Connect a new handle to an existing origin
    ///
    /// Fails with [`MediumError::Poisoned`] if the origin's lock is poisoned.
    pub fn connect(origin: &MemoryOrigin) -> MediumResult<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = {
            let mut state = origin.state.lock().map_err(|_| MediumError::Poisoned)?;
            let handle = state.next_handle;
            state.next_handle += 1;
            state.subscribers.push((handle, tx));
            handle
        };

        Ok(Self {
            origin: origin.clone(),
            handle,
            events: Mutex::new(rx),
        })
    }

    /// The origin this handle is connected to
    pub fn origin(&self) -> &MemoryOrigin {
        &self.origin
    }

    fn state(&self) -> MediumResult<MutexGuard<'_, OriginState>> {
        self.origin.state.lock().map_err(|_| MediumError::Poisoned)
    }
}

impl Default for MemoryMedium {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryMedium {
    fn drop(&mut self) {
        if let Ok(mut state) = self.origin.state.lock() {
            state.subscribers.retain(|(handle, _)| *handle != self.handle);
        }
    }
}

impl Medium for MemoryMedium {
    fn get(&self, key: &str) -> MediumResult<Option<String>> {
        Ok(self.state()?.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> MediumResult<()> {
        let mut state = self.state()?;
        let old_value = state.values.insert(key.to_string(), value.to_string());
        if old_value.as_deref() == Some(value) {
            return Ok(());
        }

        state.publish(
            self.handle,
            StorageEvent {
                key: key.to_string(),
                old_value,
                new_value: Some(value.to_string()),
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> MediumResult<()> {
        let mut state = self.state()?;
        if let Some(old_value) = state.values.remove(key) {
            state.publish(
                self.handle,
                StorageEvent {
                    key: key.to_string(),
                    old_value: Some(old_value),
                    new_value: None,
                },
            );
        }
        Ok(())
    }

    fn keys(&self) -> MediumResult<Vec<String>> {
        Ok(self.state()?.values.keys().cloned().collect())
    }

    fn poll_changes(&self) -> MediumResult<Vec<StorageEvent>> {
        let mut rx = self.events.lock().map_err(|_| MediumError::Poisoned)?;
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        Ok(events)
    }
}
