//! Status command handler

use anyhow::Result;

use fuqdocs_core::{Config, Session};

use crate::output::{short_id, Output, OutputFormat};

/// Show status information
pub fn show(session: &Session, config: &Config, output: &Output) -> Result<()> {
    let storage_path = config.storage_path();
    let storage_size = std::fs::metadata(&storage_path)
        .map(|m| m.len())
        .unwrap_or(0);
    let documents = session.store().manifest().len();
    let current = session.current().document();
    let report = session.migrations();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "storage": {
                        "path": storage_path,
                        "size": storage_size
                    },
                    "documents": documents,
                    "current": current.map(|d| serde_json::json!({
                        "id": d.id,
                        "title": d.title
                    })),
                    "theme": session.theme(),
                    "migrations": {
                        "applied": report.applied,
                        "failed": report.failed.as_ref().map(|(name, e)| serde_json::json!({
                            "name": name,
                            "error": format!("{:#}", e)
                        }))
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", documents);
        }
        OutputFormat::Human => {
            println!("fuqdocs Status");
            println!("==============");
            println!();
            println!("Storage:");
            println!("  Location: {}", storage_path.display());
            println!("  Size:     {}", human_size(storage_size));
            println!();
            println!("Documents: {}", documents);
            if let Some(doc) = current {
                println!("  Current: {} - {}", short_id(&doc.id), doc.display_title());
            }
            println!("Theme:     {}", session.theme());
            println!();
            match &report.failed {
                None => println!("Migrations: {} applied", report.applied.len()),
                Some((name, e)) => {
                    println!("Migrations: '{}' failed: {:#}", name, e);
                }
            }
        }
    }

    Ok(())
}

/// Format a byte count for display
fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 bytes");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
