//! fuqdocs Core Library
//!
//! This crate provides the core functionality for fuqdocs, a local-only
//! store of markdown notes. Several instances may share one storage medium
//! and keep each other up to date.
//!
//! # Architecture
//!
//! - **Medium**: a synchronous string key-value store (SQLite on disk, or
//!   in memory) that also reports mutations made by other handles
//! - **DocumentStore**: manifest plus one record per document on top of a
//!   medium
//! - **Session**: startup flow, save rules and cross-instance reconciliation
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut session = Session::open_storage(&config)?;
//!
//! session.new_document("Groceries");
//! session.current_mut().set_content("- eggs\n- milk");
//! session.save()?;
//!
//! // pick up what other instances did
//! session.sync()?;
//! ```
//!
//! # Modules
//!
//! - `session`: Application flow (main entry point)
//! - `store`: Manifest and document CRUD
//! - `codec`: Document record encoding and validation
//! - `storage`: Key-value media
//! - `migrations`: Startup data migrations
//! - `current`: The currently open document
//! - `observer`: Reconciliation with other instances
//! - `config`: Application configuration

pub mod codec;
pub mod config;
pub mod current;
pub mod error;
pub mod events;
pub mod keys;
pub mod migrations;
pub mod models;
pub mod observer;
pub mod session;
pub mod storage;
pub mod store;
pub mod welcome;

pub use config::Config;
pub use current::CurrentDocument;
pub use error::{MediumError, StoreError, StoreResult, ValidationError};
pub use events::{DocumentEvent, Notifier, PresentationEvent, StoreEvent, Subscription};
pub use migrations::{Migration, MigrationReport, MigrationRunner};
pub use models::{Document, Theme};
pub use observer::{Observed, Presentation, StorageObserver};
pub use session::{DocumentSummary, SaveOutcome, Session};
pub use storage::{Medium, MemoryMedium, MemoryOrigin, SqliteMedium, StorageEvent};
pub use store::{Clock, DocumentStore, SystemClock};
