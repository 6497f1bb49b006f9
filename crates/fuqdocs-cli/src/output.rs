//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use anyhow::Result;
use serde::Serialize;

use fuqdocs_core::{Document, DocumentSummary};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single document
    ///
    /// Quiet mode prints just the markdown, so it can be piped.
    pub fn print_document(&self, doc: &Document) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", doc.id);
                println!("Title:   {}", doc.display_title());
                println!("Created: {}", doc.created().format("%Y-%m-%d %H:%M"));
                println!("Updated: {}", doc.updated().format("%Y-%m-%d %H:%M"));
                println!("────────────────────────────────────────");
                println!("{}", doc.content);
            }
            OutputFormat::Json => print_json(doc)?,
            OutputFormat::Quiet => println!("{}", doc.content),
        }
        Ok(())
    }

    /// Print a document listing
    pub fn print_listing(&self, listing: &[DocumentSummary]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if listing.is_empty() {
                    println!("No documents found.");
                    return Ok(());
                }
                for entry in listing {
                    println!(
                        "{} {} | {} | {}",
                        if entry.is_current { "*" } else { " " },
                        short_id(&entry.id),
                        truncate(&entry.title, 40),
                        entry.updated().format("%Y-%m-%d %H:%M")
                    );
                }
                println!("\n{} document(s)", listing.len());
            }
            OutputFormat::Json => print_json(&listing)?,
            OutputFormat::Quiet => {
                for entry in listing {
                    println!("{}", entry.id);
                }
            }
        }
        Ok(())
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warning(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// First eight characters of a document id
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ünïcödé títle", 8), "ünïcö...");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("3f1c2d4e-5a6b-4c7d-8e9f-0a1b2c3d4e5f"), "3f1c2d4e");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_should_prompt_only_for_humans() {
        assert!(Output::new(OutputFormat::Human).should_prompt());
        assert!(!Output::new(OutputFormat::Json).should_prompt());
        assert!(!Output::new(OutputFormat::Quiet).should_prompt());
    }
}
