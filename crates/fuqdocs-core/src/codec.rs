//! Document record codec
//!
//! A stored document is a JSON object with exactly five fields:
//!
//! ```text
//! {"id":"…","created_at":0,"updated_at":0,"title":"…","content":"…"}
//! ```
//!
//! Decoding is strict about the fields that identify a document (`id`,
//! `content`) and lenient about the rest: missing timestamps become 0 and
//! a missing title becomes the empty string.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::models::Document;

/// Field names used in the stored record
mod fields {
    pub const ID: &str = "id";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
    pub const TITLE: &str = "title";
    pub const CONTENT: &str = "content";
}

#[derive(Serialize)]
struct Record<'a> {
    id: &'a str,
    created_at: i64,
    updated_at: i64,
    title: &'a str,
    content: &'a str,
}

/// Encode a document as a JSON record
pub fn encode(doc: &Document) -> Result<String, ValidationError> {
    if doc.id.is_empty() {
        return Err(ValidationError::MissingId);
    }

    let record = Record {
        id: &doc.id,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
        title: &doc.title,
        content: &doc.content,
    };

    serde_json::to_string(&record).map_err(|e| ValidationError::Malformed(e.to_string()))
}

/// Decode a JSON record into a document
pub fn decode(text: &str) -> Result<Document, ValidationError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    let Value::Object(record) = value else {
        return Err(ValidationError::NotARecord);
    };

    let id = match record.get(fields::ID) {
        None | Some(Value::Null) => return Err(ValidationError::MissingId),
        Some(Value::String(s)) if s.is_empty() => return Err(ValidationError::MissingId),
        Some(Value::String(s)) if is_uuid_v4_shape(s) => s.clone(),
        Some(other) => return Err(ValidationError::InvalidId(other.to_string())),
    };

    let content = match record.get(fields::CONTENT) {
        Some(Value::String(s)) => s.clone(),
        _ => return Err(ValidationError::InvalidContent),
    };

    let title = match record.get(fields::TITLE) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(ValidationError::InvalidTitle),
    };

    Ok(Document {
        id,
        created_at: timestamp(&record, fields::CREATED_AT)?,
        updated_at: timestamp(&record, fields::UPDATED_AT)?,
        title,
        content,
    })
}

fn timestamp(record: &Map<String, Value>, field: &'static str) -> Result<i64, ValidationError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v.as_i64().ok_or(ValidationError::InvalidTimestamp(field)),
    }
}

/// Check that a string has the lowercase hyphenated UUID shape
///
/// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`, hex digits `0-9a-f` only.
pub fn is_uuid_v4_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 36
        && bytes.iter().enumerate().all(|(i, &b)| match i {
            8 | 13 | 18 | 23 => b == b'-',
            _ => matches!(b, b'0'..=b'9' | b'a'..=b'f'),
        })
}
