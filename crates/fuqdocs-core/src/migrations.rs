//! Startup migrations
//!
//! Every step runs on every startup, in order. There is no record of which
//! steps have already been applied, so each step must be idempotent: running
//! it against already-migrated data has to leave that data unchanged.
//!
//! A failing step stops the remaining steps. The failure is reported and
//! logged, and the application carries on with whatever state the earlier
//! steps produced.

use anyhow::{Context, Result};

use crate::keys::{NAMESPACE, THEME_KEY};
use crate::models::Theme;
use crate::storage::Medium;

/// Namespace used before the rename to `fuqdocs`
pub const LEGACY_NAMESPACE: &str = "scratchmark";

/// Legacy key that tracked the last saved document before the manifest did
pub const LEGACY_LAST_SAVED_KEY: &str = "scratchmark.lastSaved";

/// A named, idempotent upgrade step
#[derive(Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub run: fn(&dyn Medium) -> Result<()>,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration").field("name", &self.name).finish()
    }
}

/// Outcome of a migration run
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Steps that completed, in order
    pub applied: Vec<&'static str>,
    /// The step that failed and why; later steps did not run
    pub failed: Option<(&'static str, anyhow::Error)>,
}

impl MigrationReport {
    /// Whether every step completed
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// Runs an ordered list of migrations
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    steps: Vec<Migration>,
}

impl Default for MigrationRunner {
    fn default() -> Self {
        Self::new(builtin_migrations())
    }
}

impl MigrationRunner {
    pub fn new(steps: Vec<Migration>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Migration] {
        &self.steps
    }

    /// Run every step in order, stopping at the first failure
    pub fn run(&self, medium: &dyn Medium) -> MigrationReport {
        tracing::debug!("Migrations starting");
        let mut report = MigrationReport::default();

        for step in &self.steps {
            match (step.run)(medium) {
                Ok(()) => {
                    tracing::debug!("Migration '{}' complete", step.name);
                    report.applied.push(step.name);
                }
                Err(e) => {
                    tracing::warn!(
                        "Migration '{}' failed, skipping remaining steps: {:#}",
                        step.name,
                        e
                    );
                    report.failed = Some((step.name, e));
                    return report;
                }
            }
        }

        tracing::debug!("Migrations complete");
        report
    }
}

/// The migrations applied at every startup
pub fn builtin_migrations() -> Vec<Migration> {
    vec![
        Migration {
            name: "remove-last-saved-key",
            run: remove_last_saved_key,
        },
        Migration {
            name: "port-old-namespace",
            run: port_old_namespace,
        },
        Migration {
            name: "default-theme",
            run: default_theme,
        },
    ]
}

/// Drop the legacy "last saved" pointer; the manifest head replaced it
fn remove_last_saved_key(medium: &dyn Medium) -> Result<()> {
    medium
        .remove(LEGACY_LAST_SAVED_KEY)
        .context("Failed to remove legacy last-saved key")?;
    Ok(())
}

fn rename_legacy_key(key: &str) -> Option<String> {
    key.strip_prefix(LEGACY_NAMESPACE)
        .filter(|rest| rest.starts_with('.'))
        .map(|rest| format!("{}{}", NAMESPACE, rest))
}

/// Move every `scratchmark.*` key to `fuqdocs.*`
///
/// The manifest value lists document keys, so it is rewritten as well as
/// renamed. Keys are collected up front because the loop deletes as it goes.
fn port_old_namespace(medium: &dyn Medium) -> Result<()> {
    let legacy_manifest = format!("{}.manifest", LEGACY_NAMESPACE);
    let keys = medium.keys().context("Failed to list storage keys")?;

    for key in keys {
        let Some(new_key) = rename_legacy_key(&key) else {
            continue;
        };
        let Some(mut value) = medium.get(&key)? else {
            continue;
        };

        if key == legacy_manifest {
            let old: Vec<String> = if value.is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&value)
                    .with_context(|| format!("Legacy manifest '{}' is not a key list", key))?
            };
            let ported: Vec<String> = old
                .iter()
                .map(|k| rename_legacy_key(k).unwrap_or_else(|| k.clone()))
                .collect();
            value = serde_json::to_string(&ported)?;
            tracing::debug!("Ported manifest {} to {}", key, value);
        }

        tracing::debug!("Copy+rename {} to {}", key, new_key);
        medium.set(&new_key, &value)?;
        medium.remove(&key)?;
    }

    Ok(())
}

/// Give the theme key a value if it has never been set
fn default_theme(medium: &dyn Medium) -> Result<()> {
    if medium.get(THEME_KEY)?.is_none() {
        medium.set(THEME_KEY, Theme::default().as_str())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::MANIFEST_KEY;
    use crate::storage::{MemoryMedium, MemoryOrigin};
    use anyhow::bail;

    const DOC_A: &str = "3f1c2d4e-5a6b-4c7d-8e9f-0a1b2c3d4e5f";
    const DOC_B: &str = "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d";

    fn seed_legacy(medium: &dyn Medium) {
        medium.set(LEGACY_LAST_SAVED_KEY, DOC_A).unwrap();
        medium
            .set(
                "scratchmark.manifest",
                &format!(
                    r#"["scratchmark.docs/{}","scratchmark.docs/{}"]"#,
                    DOC_B, DOC_A
                ),
            )
            .unwrap();
        for id in [DOC_A, DOC_B] {
            medium
                .set(
                    &format!("scratchmark.docs/{}", id),
                    &format!(r#"{{"id":"{}","content":"x"}}"#, id),
                )
                .unwrap();
        }
        medium.set("unrelated", "keep me").unwrap();
    }

    #[test]
    fn test_ports_legacy_namespace() {
        let medium = MemoryMedium::new();
        seed_legacy(&medium);

        let report = MigrationRunner::default().run(&medium);
        assert!(report.is_complete());
        assert_eq!(
            report.applied,
            vec!["remove-last-saved-key", "port-old-namespace", "default-theme"]
        );

        let keys = medium.keys().unwrap();
        assert!(keys.iter().all(|k| !k.starts_with("scratchmark")));
        assert_eq!(
            medium.get(MANIFEST_KEY).unwrap().unwrap(),
            format!(r#"["fuqdocs.docs/{}","fuqdocs.docs/{}"]"#, DOC_B, DOC_A)
        );
        assert!(medium
            .get(&format!("fuqdocs.docs/{}", DOC_A))
            .unwrap()
            .is_some());
        assert_eq!(medium.get("unrelated").unwrap().unwrap(), "keep me");
        assert_eq!(medium.get(THEME_KEY).unwrap().unwrap(), "dark");
    }

    #[test]
    fn test_running_twice_is_idempotent() {
        let origin = MemoryOrigin::new();
        let medium = MemoryMedium::connect(&origin).unwrap();
        seed_legacy(&medium);

        MigrationRunner::default().run(&medium);
        let first = origin.snapshot();

        MigrationRunner::default().run(&medium);
        assert_eq!(origin.snapshot(), first);
    }

    #[test]
    fn test_default_theme_keeps_existing_value() {
        let medium = MemoryMedium::new();
        medium.set(THEME_KEY, "light").unwrap();

        MigrationRunner::default().run(&medium);
        assert_eq!(medium.get(THEME_KEY).unwrap().unwrap(), "light");
    }

    #[test]
    fn test_does_not_touch_lookalike_prefixes() {
        let medium = MemoryMedium::new();
        medium.set("scratchmarks.other", "v").unwrap();

        MigrationRunner::default().run(&medium);
        assert_eq!(medium.get("scratchmarks.other").unwrap().unwrap(), "v");
        assert!(medium.get("fuqdocss.other").unwrap().is_none());
    }

    #[test]
    fn test_failure_stops_remaining_steps() {
        fn ok_step(medium: &dyn Medium) -> Result<()> {
            medium.set("ran.first", "1")?;
            Ok(())
        }
        fn failing_step(_: &dyn Medium) -> Result<()> {
            bail!("boom")
        }
        fn never_step(medium: &dyn Medium) -> Result<()> {
            medium.set("ran.third", "1")?;
            Ok(())
        }

        let runner = MigrationRunner::new(vec![
            Migration {
                name: "first",
                run: ok_step,
            },
            Migration {
                name: "second",
                run: failing_step,
            },
            Migration {
                name: "third",
                run: never_step,
            },
        ]);

        let medium = MemoryMedium::new();
        let report = runner.run(&medium);

        assert!(!report.is_complete());
        assert_eq!(report.applied, vec!["first"]);
        let (name, err) = report.failed.unwrap();
        assert_eq!(name, "second");
        assert_eq!(err.to_string(), "boom");
        assert!(medium.get("ran.first").unwrap().is_some());
        assert!(medium.get("ran.third").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_legacy_manifest_fails_port() {
        let medium = MemoryMedium::new();
        medium.set("scratchmark.manifest", "not json").unwrap();

        let report = MigrationRunner::default().run(&medium);
        assert_eq!(report.failed.as_ref().map(|(n, _)| *n), Some("port-old-namespace"));
        assert_eq!(report.applied, vec!["remove-last-saved-key"]);
    }
}
