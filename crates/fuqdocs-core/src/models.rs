//! Data models
//!
//! Defines the core data structures: Document and Theme.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A markdown document
///
/// Timestamps are milliseconds since the Unix epoch (UTC), which is also
/// how they are stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Unique identifier (UUID-v4, lowercase hyphenated)
    pub id: String,
    /// When this document was created
    pub created_at: i64,
    /// When this document was last saved
    pub updated_at: i64,
    /// Document title
    pub title: String,
    /// Markdown source
    pub content: String,
}

impl Document {
    /// Create an empty document with a fresh random id
    ///
    /// The id comes from the operating system's cryptographic random
    /// source.
    pub fn new(now_millis: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now_millis,
            updated_at: now_millis,
            title: String::new(),
            content: String::new(),
        }
    }

    /// Create a document with a specific id (for loading from storage)
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// The title, or the id when the title is empty
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }

    /// Creation time as a `DateTime`
    pub fn created(&self) -> DateTime<Utc> {
        millis_to_datetime(self.created_at)
    }

    /// Last save time as a `DateTime`
    pub fn updated(&self) -> DateTime<Utc> {
        millis_to_datetime(self.updated_at)
    }
}

pub(crate) fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}

/// Presentation theme shared by every open instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// The stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// The other theme
    pub fn toggled(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known theme
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme '{0}' (expected 'dark' or 'light')")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}
