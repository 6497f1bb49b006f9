//! Document command handlers

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use fuqdocs_core::{SaveOutcome, Session, StoreError};

use crate::editor::{confirm_delete, edit_markdown};
use crate::output::{short_id, Output};

/// List documents, most recently saved first
pub fn list(session: &Session, filter: Option<String>, output: &Output) -> Result<()> {
    let listing = session
        .browse(filter.as_deref().unwrap_or(""))
        .context("Failed to list documents")?;
    output.print_listing(&listing)
}

/// Show a document (the last saved one if no id is given)
pub fn show(session: &mut Session, id: Option<String>, output: &Output) -> Result<()> {
    if let Some(id) = id {
        open_by_id(session, &id)?;
    }

    let doc = session
        .current()
        .document()
        .context("No document is open")?;
    output.print_document(doc)
}

/// Create and save a new document
pub fn create(
    session: &mut Session,
    title: String,
    content: Option<String>,
    file: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let content = match (content, file) {
        (Some(content), _) => content,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?,
        (None, None) => edit_markdown("").context("Failed to edit document")?,
    };

    session.new_document(title);
    session.current_mut().set_content(content);
    save(session)?;

    let id = session.current().id().unwrap_or_default();
    if output.is_quiet() {
        println!("{}", id);
    }
    output.success(&format!("Created document {}", short_id(id)));
    Ok(())
}

/// Edit a document's title and/or content
///
/// Without `--title` or `--content` the content is opened in the editor.
pub fn edit(
    session: &mut Session,
    id: Option<String>,
    title: Option<String>,
    content: Option<String>,
    output: &Output,
) -> Result<()> {
    if let Some(id) = id {
        open_by_id(session, &id)?;
    }

    let content = match (&title, content) {
        (_, Some(content)) => Some(content),
        (Some(_), None) => None,
        (None, None) => Some(
            edit_markdown(session.current().content()).context("Failed to edit document")?,
        ),
    };

    if let Some(title) = title {
        session.current_mut().set_title(title);
    }
    if let Some(content) = content {
        session.current_mut().set_content(content);
    }

    let id = session.current().id().unwrap_or_default().to_string();
    if !session.has_unsaved_changes()? {
        output.message("No changes.");
        return Ok(());
    }

    save(session)?;
    output.success(&format!("Updated document {}", short_id(&id)));
    Ok(())
}

/// Delete a document
pub fn delete(session: &mut Session, id: String, yes: bool, output: &Output) -> Result<()> {
    open_by_id(session, &id)?;

    let doc = session
        .current()
        .document()
        .cloned()
        .context("No document is open")?;

    if output.should_prompt() && !yes {
        let description = format!("{} - {}", short_id(&doc.id), doc.display_title());
        if !confirm_delete(&description)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    session
        .delete_current()
        .context("Failed to delete document")?;

    output.success(&format!("Deleted document: {}", short_id(&doc.id)));
    Ok(())
}

fn save(session: &mut Session) -> Result<()> {
    match session.save().context("Failed to save document")? {
        SaveOutcome::Saved => Ok(()),
        SaveOutcome::TitleRequired => {
            bail!("Set a document title in order to save (--title)")
        }
    }
}

/// Open a document by full id, key or unique id prefix
fn open_by_id(session: &mut Session, id: &str) -> Result<()> {
    let key = match session.resolve(id) {
        Ok(key) => key,
        Err(StoreError::AmbiguousId { .. }) => {
            eprintln!("Multiple documents match '{}':", id);
            for entry in session.browse("")? {
                if entry.id.starts_with(id) {
                    eprintln!("  {} - {}", short_id(&entry.id), entry.title);
                }
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
        Err(StoreError::NotFound(_)) => bail!("No document found matching: {}", id),
        Err(e) => return Err(e.into()),
    };

    session
        .open_document(&key)
        .with_context(|| format!("Failed to open document {}", id))
}
