use anyhow::Result;
use keepnote::{
    DocumentStore, LocalStore, NewNote, NoteId, NotePatch, NoteStore, OwnerId, SnapshotEvent,
    Timestamp, ViewState, compute_visible_notes_default,
};
use std::time::Duration;
use tempfile::tempdir;

fn owner() -> OwnerId {
    OwnerId::new("alice")
}

/// Runs a full create → edit → pin → archive → delete cycle.
fn exercise_lifecycle(store: &dyn NoteStore) -> Result<()> {
    let id = store.create(
        &owner(),
        NewNote::new("Project plan", "<h1>Q3</h1><p>ship &amp; measure</p>").category("Work"),
    )?;

    let note = store.get(&owner(), &id)?.expect("note should exist");
    assert_eq!(note.plain_text(), Some("Q3 ship & measure"));
    assert!(!note.is_pinned());
    assert!(!note.is_archived());

    store.update(
        &owner(),
        &id,
        NotePatch {
            content: Some("<p>ship it</p>".to_string()),
            ..Default::default()
        },
    )?;
    assert_eq!(
        store.get(&owner(), &id)?.and_then(|n| n.plain_text().map(String::from)),
        Some("ship it".to_string())
    );

    store.toggle_pin(&owner(), &id)?;
    assert!(store.get(&owner(), &id)?.is_some_and(|n| n.is_pinned()));

    store.set_archived(&owner(), &id, true)?;
    let archived = store.get(&owner(), &id)?.expect("note should exist");
    assert!(archived.is_archived());
    assert!(!archived.is_pinned());

    store.delete(&owner(), &id)?;
    assert!(store.get(&owner(), &id)?.is_none());
    assert!(store.delete(&owner(), &id).is_err());

    Ok(())
}

#[test]
fn document_store_lifecycle() -> Result<()> {
    let dir = tempdir()?;
    let store = DocumentStore::open(dir.path().join("notes.db"))?;
    exercise_lifecycle(&store)
}

#[test]
fn local_store_lifecycle() -> Result<()> {
    let dir = tempdir()?;
    let store = LocalStore::open(dir.path().join("notes.json"))?;
    exercise_lifecycle(&store)
}

#[test]
fn both_backends_persist_across_reopen() -> Result<()> {
    let dir = tempdir()?;
    let db_path = dir.path().join("notes.db");
    let json_path = dir.path().join("notes.json");

    let (doc_id, local_id) = {
        let document = DocumentStore::open(&db_path)?;
        let local = LocalStore::open(&json_path)?;
        let doc_id = document.create(&owner(), NewNote::new("In SQLite", "x").pinned(true))?;
        let local_id = local.create(&owner(), NewNote::new("In JSON", "x").pinned(true))?;
        (doc_id, local_id)
    };

    let document = DocumentStore::open(&db_path)?;
    let local = LocalStore::open(&json_path)?;

    let from_document = document.get(&owner(), &doc_id)?.expect("sqlite note");
    let from_local = local.get(&owner(), &local_id)?.expect("json note");

    assert!(from_document.is_pinned());
    assert!(from_local.is_pinned());
    assert!(matches!(from_document.created_at(), Some(Timestamp::Server { .. })));
    assert!(matches!(from_local.created_at(), Some(Timestamp::Local(_))));
    Ok(())
}

#[test]
fn local_store_file_is_camel_case_json() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("notes.json");
    let store = LocalStore::open(&path)?;
    let id = store.create(&owner(), NewNote::new("T", "C").product_link("https://x.test"))?;

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    let document = &json["alice"][id.as_str()];

    assert_eq!(document["title"], "T");
    assert_eq!(document["productLink"], "https://x.test");
    assert_eq!(document["isPinned"], false);
    assert_eq!(document["isArchived"], false);
    assert!(document["createdAt"].is_string());
    Ok(())
}

#[test]
fn legacy_documents_without_flags_show_in_main_view() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("notes.json");
    std::fs::write(
        &path,
        r#"{
            "alice": {
                "legacy-1": { "title": "Old note", "content": "<p>from before</p>", "updatedAt": 1600000000000 },
                "legacy-2": { "title": "Half-written", "isPinned": "yes", "category": "" }
            }
        }"#,
    )?;

    let store = LocalStore::open(&path)?;
    let subscription = store.subscribe(&owner())?;
    let notes = match subscription.recv_timeout(Duration::from_secs(1)) {
        Some(SnapshotEvent::Snapshot(notes)) => notes,
        other => panic!("expected snapshot, got {other:?}"),
    };

    let main = compute_visible_notes_default(&notes, &ViewState::new());
    let archived = compute_visible_notes_default(&notes, &ViewState::archived());

    assert_eq!(main.len(), 2);
    assert!(archived.is_empty());
    // The dated note sorts ahead of the one with no timestamps
    assert_eq!(main[0].id(), &NoteId::new("legacy-1"));
    assert_eq!(main[1].category(), "Uncategorized");
    assert!(!main[1].is_pinned());
    Ok(())
}

#[test]
fn owners_never_see_each_other() -> Result<()> {
    let store = DocumentStore::in_memory()?;
    let bob = OwnerId::new("bob");

    let id = store.create(&owner(), NewNote::new("Alice's secret", "x"))?;

    assert!(store.list(&bob)?.is_empty());
    assert!(store.get(&bob, &id)?.is_none());
    assert!(store.toggle_pin(&bob, &id).is_err());
    assert_eq!(store.list(&owner())?.len(), 1);
    Ok(())
}
