//! Watch command handler
//!
//! Keeps a session running: polls for changes made by other instances,
//! autosaves the open document, and reports what happened until Ctrl+C.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{interval, MissedTickBehavior};

use fuqdocs_core::events::drain;
use fuqdocs_core::{keys, Config, DocumentEvent, Observed, SaveOutcome, Session};

use crate::output::{short_id, Output};

/// Run until interrupted
pub async fn run(session: &mut Session, config: &Config, output: &Output) -> Result<()> {
    let mut poll = interval(Duration::from_millis(config.poll_interval_ms.max(1)));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut autosave = interval(Duration::from_millis(config.autosave_interval_ms.max(1)));
    autosave.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut document_events = session.current().subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    output.message(&format!(
        "Watching {} (Ctrl+C to stop)",
        config.storage_path().display()
    ));
    report_current(session, output);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let observed = session.sync().context("Failed to apply external changes")?;
                for change in &observed {
                    if let Some(message) = describe(change) {
                        output.message(&message);
                    }
                }
                if drain(&mut document_events).contains(&DocumentEvent::DocumentChanged) {
                    report_current(session, output);
                }
            }
            _ = autosave.tick() => {
                match session.autosave().context("Autosave failed")? {
                    Some(SaveOutcome::Saved) => tracing::debug!("Autosaved"),
                    Some(SaveOutcome::TitleRequired) => {
                        output.warning("Set a document title in order to save");
                    }
                    None => {}
                }
            }
            result = &mut shutdown => {
                result.context("Failed to listen for Ctrl+C")?;
                break;
            }
        }
    }

    output.message("Stopped.");
    Ok(())
}

fn report_current(session: &Session, output: &Output) {
    if let Some(doc) = session.current().document() {
        output.message(&format!(
            "Current document: {} - {}",
            short_id(&doc.id),
            doc.display_title()
        ));
    }
}

/// Human description of an observed change, if it is worth reporting
fn describe(observed: &Observed) -> Option<String> {
    let id = |key: &str| short_id(keys::document_id(key).unwrap_or(key)).to_string();
    match observed {
        Observed::ManifestReloaded | Observed::Ignored(_) => None,
        Observed::DocumentDeleted(key) => Some(format!("Document {} was deleted", id(key))),
        Observed::CurrentDocumentReloaded(key) => {
            Some(format!("Current document {} was updated elsewhere", id(key)))
        }
        Observed::OtherDocumentChanged(key) => Some(format!("Document {} was saved", id(key))),
        Observed::ThemeApplied(theme) => Some(format!("Theme changed to {}", theme)),
        Observed::Failed { key, reason } => {
            Some(format!("Could not apply change to {}: {}", id(key), reason))
        }
    }
}
