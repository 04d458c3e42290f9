//! Incremental sync tests, driving the watch session with synthetic events.

use std::fs;
use std::path::{Path, PathBuf};

use mddb_core::document::document_id;
use mddb_core::markdowndb::{IndexOptions, MarkdownDb, WatchSession};
use mddb_core::schema::{DocumentSchema, FieldSchema, FieldType, SchemaRegistry};
use mddb_core::watch::FileEvent;
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn canonical_root(tmp: &TempDir) -> PathBuf {
    tmp.path().canonicalize().unwrap()
}

#[test]
fn created_file_is_indexed() {
    let tmp = TempDir::new().unwrap();
    let root = canonical_root(&tmp);
    let mut db = MarkdownDb::open_in_memory().unwrap();
    let options = IndexOptions::default();
    let mut session = WatchSession::new(&mut db, &root, &options).unwrap();

    let file = root.join("a.md");
    write(&file, "---\ntags: [x]\n---\n# A\n");
    session.handle(FileEvent::Created(file)).unwrap();
    drop(session);

    let record = db.get_file(&document_id(Some("a.md"), "")).unwrap().unwrap();
    assert_eq!(record.tags, vec!["x"]);
    assert_eq!(db.store().count_tags().unwrap(), 1);
}

#[test]
fn modified_file_replaces_previous_rows() {
    let tmp = TempDir::new().unwrap();
    let root = canonical_root(&tmp);
    write(&root.join("a.md"), "---\ntags: [x, y]\n---\n");

    let mut db = MarkdownDb::open_in_memory().unwrap();
    db.index_folder(&root, &IndexOptions::default()).unwrap();
    assert_eq!(db.store().count_tags().unwrap(), 2);

    let options = IndexOptions::default();
    let mut session = WatchSession::new(&mut db, &root, &options).unwrap();
    let file = root.join("a.md");
    write(&file, "---\ntags: [z]\n---\n- [x] done\n");
    session.handle(FileEvent::Modified(file)).unwrap();
    drop(session);

    let record = db.get_file(&document_id(Some("a.md"), "")).unwrap().unwrap();
    assert_eq!(record.tags, vec!["z"]);
    assert_eq!(record.tasks.len(), 1);
    assert!(record.tasks[0].checked);
    assert_eq!(db.store().count_tags().unwrap(), 1);
}

#[test]
fn deleted_file_is_removed() {
    let tmp = TempDir::new().unwrap();
    let root = canonical_root(&tmp);
    write(&root.join("a.md"), "# A\n");

    let mut db = MarkdownDb::open_in_memory().unwrap();
    db.index_folder(&root, &IndexOptions::default()).unwrap();
    assert_eq!(db.count_files().unwrap(), 1);

    let options = IndexOptions::default();
    let mut session = WatchSession::new(&mut db, &root, &options).unwrap();
    fs::remove_file(root.join("a.md")).unwrap();
    session.handle(FileEvent::Deleted(root.join("a.md"))).unwrap();
    drop(session);

    assert_eq!(db.count_files().unwrap(), 0);
}

#[test]
fn rename_is_delete_plus_create() {
    let tmp = TempDir::new().unwrap();
    let root = canonical_root(&tmp);
    write(&root.join("old.md"), "# Note\n");

    let mut db = MarkdownDb::open_in_memory().unwrap();
    db.index_folder(&root, &IndexOptions::default()).unwrap();

    let options = IndexOptions::default();
    let mut session = WatchSession::new(&mut db, &root, &options).unwrap();
    fs::rename(root.join("old.md"), root.join("new.md")).unwrap();
    session
        .handle(FileEvent::Renamed(root.join("old.md"), root.join("new.md")))
        .unwrap();
    drop(session);

    assert!(db.get_file(&document_id(Some("old.md"), "")).unwrap().is_none());
    let renamed = db.get_file(&document_id(Some("new.md"), "")).unwrap().unwrap();
    assert_eq!(renamed.url_path, "new.md");
}

#[test]
fn invalid_file_keeps_previous_state() {
    let tmp = TempDir::new().unwrap();
    let root = canonical_root(&tmp);
    write(&root.join("a.md"), "---\ntype: blog\nstatus: live\n---\n");

    let mut registry = SchemaRegistry::new();
    registry.register(
        "blog",
        DocumentSchema::default()
            .with_field("status", FieldSchema::required(FieldType::String)),
    );
    let options = IndexOptions { schemas: registry, ..IndexOptions::default() };

    let mut db = MarkdownDb::open_in_memory().unwrap();
    db.index_folder(&root, &options).unwrap();

    let mut session = WatchSession::new(&mut db, &root, &options).unwrap();
    // The edit drops the required field; the event is absorbed.
    let file = root.join("a.md");
    write(&file, "---\ntype: blog\n---\n");
    session.handle(FileEvent::Modified(file)).unwrap();
    drop(session);

    let record = db.get_file(&document_id(Some("a.md"), "")).unwrap().unwrap();
    assert_eq!(record.metadata["status"], serde_json::json!("live"));
}

#[test]
fn build_error_keeps_state_and_later_events_still_apply() {
    let tmp = TempDir::new().unwrap();
    let root = canonical_root(&tmp);
    write(&root.join("a.md"), "---\ntags: [x]\n---\n");

    let mut db = MarkdownDb::open_in_memory().unwrap();
    db.index_folder(&root, &IndexOptions::default()).unwrap();

    let options = IndexOptions::default();
    let mut session = WatchSession::new(&mut db, &root, &options).unwrap();
    let file = root.join("a.md");

    // Malformed front matter fails the build; the run loop logs this kind
    // of error and keeps consuming events.
    write(&file, "---\ntitle: [unclosed\n---\n");
    let err = session.handle(FileEvent::Modified(file.clone())).unwrap_err();
    assert!(matches!(err, mddb_core::markdowndb::IndexFolderError::Build { .. }));
    drop(session);

    // The file's previous rows are untouched by the failed event.
    let record = db.get_file(&document_id(Some("a.md"), "")).unwrap().unwrap();
    assert_eq!(record.tags, vec!["x"]);

    // A subsequent valid edit still applies.
    let mut session = WatchSession::new(&mut db, &root, &options).unwrap();
    write(&file, "---\ntags: [z]\n---\n");
    session.handle(FileEvent::Modified(file)).unwrap();
    drop(session);

    let record = db.get_file(&document_id(Some("a.md"), "")).unwrap().unwrap();
    assert_eq!(record.tags, vec!["z"]);
}

#[test]
fn ignored_paths_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let root = canonical_root(&tmp);

    let options = IndexOptions {
        ignore_patterns: vec!["drafts".into(), "drafts/**".into()],
        ..IndexOptions::default()
    };
    let mut db = MarkdownDb::open_in_memory().unwrap();
    let mut session = WatchSession::new(&mut db, &root, &options).unwrap();

    let file = root.join("drafts/wip.md");
    write(&file, "# WIP\n");
    session.handle(FileEvent::Created(file)).unwrap();
    drop(session);

    assert_eq!(db.count_files().unwrap(), 0);
}

#[test]
fn events_outside_root_are_absorbed() {
    let tmp = TempDir::new().unwrap();
    let root = canonical_root(&tmp);
    let mut db = MarkdownDb::open_in_memory().unwrap();
    let options = IndexOptions::default();
    let mut session = WatchSession::new(&mut db, &root, &options).unwrap();

    session
        .handle(FileEvent::Created(PathBuf::from("/elsewhere/a.md")))
        .unwrap();
    drop(session);

    assert_eq!(db.count_files().unwrap(), 0);
}
