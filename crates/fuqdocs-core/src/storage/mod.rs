//! Storage layer
//!
//! The persistent medium is a synchronous, string-keyed store shared by
//! every open instance of the application, the way browser local storage
//! is shared by tabs of one origin.
//!
//! ## Backends
//!
//! - **SQLite** (`SqliteMedium`): one database file is one origin. Every
//!   mutation is also appended to a change log so other processes can
//!   observe it.
//! - **Memory** (`MemoryMedium`): handles connected to the same
//!   `MemoryOrigin` behave like tabs sharing storage. Used by tests and for
//!   throwaway sessions.
//!
//! Either way, `poll_changes` only ever reports mutations made by *other*
//! handles. A handle never sees its own writes as events.

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::{MemoryMedium, MemoryOrigin};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::SqliteMedium;

use crate::error::MediumResult;

/// A mutation made to the medium by another handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// The key that changed
    pub key: String,
    /// Value before the change, if the key existed
    pub old_value: Option<String>,
    /// Value after the change; `None` when the key was removed
    pub new_value: Option<String>,
}

impl StorageEvent {
    /// Whether this event removed the key
    pub fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }
}

/// A persistent, synchronous key-value medium
///
/// Implementations must apply each call immediately; there is no batching.
/// Setting a key to the value it already holds, or removing a key that is
/// absent, is not a mutation and produces no event.
pub trait Medium {
    /// Read a key
    fn get(&self, key: &str) -> MediumResult<Option<String>>;

    /// Write a key
    fn set(&self, key: &str, value: &str) -> MediumResult<()>;

    /// Remove a key
    fn remove(&self, key: &str) -> MediumResult<()>;

    /// List every key currently stored
    fn keys(&self) -> MediumResult<Vec<String>>;

    /// Take the mutations other handles have made since the last call
    fn poll_changes(&self) -> MediumResult<Vec<StorageEvent>>;
}
