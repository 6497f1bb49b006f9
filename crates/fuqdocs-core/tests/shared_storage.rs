//! Sessions sharing one storage file, the way several open windows would

use std::path::Path;
use std::rc::Rc;

use fuqdocs_core::welcome::WELCOME_TITLE;
use fuqdocs_core::{keys, Medium, Observed, SaveOutcome, Session, SqliteMedium, Theme};
use tempfile::TempDir;

fn open(path: &Path) -> Session {
    let medium: Rc<dyn Medium> = Rc::new(SqliteMedium::open(path, 1000).unwrap());
    Session::open(medium).unwrap()
}

fn storage() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.sqlite3");
    (dir, path)
}

#[test]
fn test_welcome_document_created_once() {
    let (_dir, path) = storage();

    let first = open(&path);
    assert_eq!(first.current().title(), WELCOME_TITLE);
    drop(first);

    let second = open(&path);
    assert_eq!(second.current().title(), WELCOME_TITLE);
    assert_eq!(second.store().manifest().len(), 1);
}

#[test]
fn test_save_in_one_session_is_visible_in_another() {
    let (_dir, path) = storage();
    let mut a = open(&path);
    let mut b = open(&path);

    a.new_document("Alpha");
    a.current_mut().set_content("from a");
    assert_eq!(a.save().unwrap(), SaveOutcome::Saved);
    let alpha = a.current().key().unwrap();

    assert_eq!(b.store().manifest().len(), 1);
    let observed = b.sync().unwrap();

    assert!(observed.contains(&Observed::ManifestReloaded));
    assert!(observed.contains(&Observed::OtherDocumentChanged(alpha.clone())));
    assert_eq!(b.store().manifest()[0], alpha);

    let titles: Vec<String> = b.browse("").unwrap().into_iter().map(|s| s.title).collect();
    assert_eq!(titles, vec!["Alpha".to_string(), WELCOME_TITLE.to_string()]);
}

#[test]
fn test_sync_ignores_own_writes() {
    let (_dir, path) = storage();
    let mut a = open(&path);

    a.new_document("Alpha");
    a.save().unwrap();

    assert!(a.sync().unwrap().is_empty());
}

#[test]
fn test_last_writer_wins_for_open_document() {
    let (_dir, path) = storage();
    let mut a = open(&path);
    let mut b = open(&path);
    let welcome = a.current().key().unwrap();

    b.current_mut().set_content("b's unsaved edit");
    a.current_mut().set_content("a saved this");
    a.save().unwrap();

    let observed = b.sync().unwrap();
    assert!(observed.contains(&Observed::CurrentDocumentReloaded(welcome)));
    assert_eq!(b.current().content(), "a saved this");
}

#[test]
fn test_delete_in_one_session_moves_the_other_on() {
    let (_dir, path) = storage();
    let mut a = open(&path);
    let mut b = open(&path);
    let welcome = a.current().key().unwrap();

    a.new_document("Alpha");
    a.save().unwrap();
    let alpha = a.current().key().unwrap();
    b.sync().unwrap();

    a.open_document(&welcome).unwrap();
    a.delete_current().unwrap();
    b.sync().unwrap();

    assert_eq!(b.current().key(), Some(alpha.clone()));
    assert_eq!(b.store().manifest(), &[alpha]);
    assert!(b.store().load_document(&welcome).unwrap().is_none());
}

#[test]
fn test_theme_shared_between_sessions() {
    let (_dir, path) = storage();
    let mut a = open(&path);
    let mut b = open(&path);

    a.set_theme(Theme::Light).unwrap();
    b.sync().unwrap();
    assert_eq!(b.theme(), Theme::Light);

    drop(a);
    drop(b);
    assert_eq!(open(&path).theme(), Theme::Light);
}

#[test]
fn test_legacy_storage_is_ported_on_open() {
    let (_dir, path) = storage();
    let id = "3f1c2d4e-5a6b-4c7d-8e9f-0a1b2c3d4e5f";
    {
        let legacy = SqliteMedium::open(&path, 1000).unwrap();
        legacy.set("scratchmark.lastSaved", id).unwrap();
        legacy
            .set("scratchmark.manifest", &format!(r#"["scratchmark.docs/{}"]"#, id))
            .unwrap();
        legacy
            .set(
                &format!("scratchmark.docs/{}", id),
                &format!(
                    r#"{{"id":"{}","created_at":1,"updated_at":2,"title":"Legacy","content":"old"}}"#,
                    id
                ),
            )
            .unwrap();
    }

    let session = open(&path);
    assert!(session.migrations().is_complete());
    assert_eq!(session.current().key(), Some(keys::document_key(id)));
    assert_eq!(session.current().title(), "Legacy");

    let medium = SqliteMedium::open(&path, 1000).unwrap();
    let leftover: Vec<String> = medium
        .keys()
        .unwrap()
        .into_iter()
        .filter(|k| k.starts_with("scratchmark"))
        .collect();
    assert!(leftover.is_empty());
}

#[test]
fn test_corrupt_newest_record_does_not_block_open() {
    let (_dir, path) = storage();
    let mut a = open(&path);
    let welcome = a.current().key().unwrap();
    a.new_document("Alpha");
    a.save().unwrap();
    let alpha = a.current().key().unwrap();
    a.store().medium().set(&alpha, "{broken").unwrap();
    drop(a);

    let b = open(&path);
    assert_eq!(b.current().key(), Some(welcome));
    assert_eq!(b.browse("").unwrap().len(), 1);
    assert!(b.store().load_document(&alpha).unwrap_err().is_corrupt_data());
}
