//! Behavior every `NoteStore` backend must share.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::*;
use crate::pipeline::compute_visible_notes_default;
use crate::view::ViewState;

fn backends() -> Vec<(&'static str, Box<dyn NoteStore>)> {
    vec![
        (
            "document",
            Box::new(DocumentStore::in_memory().expect("failed to open document store")),
        ),
        ("local", Box::new(LocalStore::in_memory())),
    ]
}

fn owner() -> OwnerId {
    OwnerId::new("owner-1")
}

fn expect_snapshot(sub: &Subscription) -> Vec<Note> {
    match sub.recv_timeout(Duration::from_secs(1)) {
        Some(SnapshotEvent::Snapshot(notes)) => notes,
        other => panic!("expected snapshot, got {other:?}"),
    }
}

#[test]
fn create_returns_id_and_applies_defaults() {
    for (name, store) in backends() {
        let id = store
            .create(&owner(), NewNote::new("Title", "<p>Body</p>"))
            .expect("failed to create note");

        let note = store
            .get(&owner(), &id)
            .expect("failed to get note")
            .expect("note should exist");

        assert_eq!(note.title(), "Title", "{name}");
        assert_eq!(note.plain_text(), Some("Body"), "{name}");
        assert_eq!(note.category(), "Uncategorized", "{name}");
        assert!(!note.is_pinned(), "{name}");
        assert!(!note.is_archived(), "{name}");
        assert!(note.created_at().is_some(), "{name}");
        assert_eq!(
            note.created_at().map(|t| t.epoch_millis()),
            note.updated_at().map(|t| t.epoch_millis()),
            "{name}"
        );
    }
}

#[test]
fn create_rejects_blank_title_or_content() {
    for (name, store) in backends() {
        let err = store
            .create(&owner(), NewNote::new("", "Body"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "title" }), "{name}");

        let err = store
            .create(&owner(), NewNote::new("Title", "  "))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "content" }), "{name}");

        assert!(store.list(&owner()).unwrap().is_empty(), "{name}");
    }
}

#[test]
fn create_can_override_archival_defaults() {
    for (name, store) in backends() {
        let id = store
            .create(&owner(), NewNote::new("T", "C").pinned(true).archived(true))
            .unwrap();
        let note = store.get(&owner(), &id).unwrap().unwrap();
        assert!(note.is_archived(), "{name}");
        assert!(!note.is_pinned(), "{name}");
    }
}

#[test]
fn update_merges_fields_and_refreshes_updated_at() {
    for (name, store) in backends() {
        let id = store
            .create(&owner(), NewNote::new("Old", "Body").category("Work"))
            .unwrap();
        let before = store.get(&owner(), &id).unwrap().unwrap();

        std::thread::sleep(Duration::from_millis(5));
        store
            .update(
                &owner(),
                &id,
                NotePatch {
                    title: Some("New".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let after = store.get(&owner(), &id).unwrap().unwrap();
        assert_eq!(after.title(), "New", "{name}");
        assert_eq!(after.category(), "Work", "{name}");
        assert_eq!(after.content(), "Body", "{name}");
        assert!(
            after.effective_millis() > before.effective_millis(),
            "{name}: updatedAt should move forward"
        );
        assert_eq!(
            after.created_at().map(|t| t.epoch_millis()),
            before.created_at().map(|t| t.epoch_millis()),
            "{name}"
        );
    }
}

#[test]
fn update_unknown_note_is_not_found() {
    for (name, store) in backends() {
        let err = store
            .update(&owner(), &NoteId::new("missing"), NotePatch::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }), "{name}");
    }
}

#[test]
fn notes_are_scoped_to_their_owner() {
    for (name, store) in backends() {
        let id = store.create(&owner(), NewNote::new("Mine", "C")).unwrap();
        let other = OwnerId::new("intruder");

        assert!(store.get(&other, &id).unwrap().is_none(), "{name}");
        assert!(store.list(&other).unwrap().is_empty(), "{name}");
        assert!(
            matches!(
                store.update(&other, &id, NotePatch::pin(true)),
                Err(StoreError::NotFound { .. })
            ),
            "{name}"
        );
        assert!(
            matches!(store.delete(&other, &id), Err(StoreError::NotFound { .. })),
            "{name}"
        );
        assert!(store.get(&owner(), &id).unwrap().is_some(), "{name}");
    }
}

#[test]
fn delete_twice_reports_not_found() {
    for (name, store) in backends() {
        let id = store.create(&owner(), NewNote::new("T", "C")).unwrap();

        store.delete(&owner(), &id).expect("first delete should succeed");
        assert!(store.get(&owner(), &id).unwrap().is_none(), "{name}");

        let err = store.delete(&owner(), &id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }), "{name}");
    }
}

#[test]
fn toggle_pin_flips_flag() {
    for (name, store) in backends() {
        let id = store.create(&owner(), NewNote::new("T", "C")).unwrap();

        store.toggle_pin(&owner(), &id).unwrap();
        assert!(store.get(&owner(), &id).unwrap().unwrap().is_pinned(), "{name}");

        store.toggle_pin(&owner(), &id).unwrap();
        assert!(!store.get(&owner(), &id).unwrap().unwrap().is_pinned(), "{name}");

        assert!(
            matches!(
                store.toggle_pin(&owner(), &NoteId::new("missing")),
                Err(StoreError::NotFound { .. })
            ),
            "{name}"
        );
    }
}

#[test]
fn archiving_a_pinned_note_unpins_it() {
    for (name, store) in backends() {
        let id = store.create(&owner(), NewNote::new("Project plan", "C")).unwrap();
        store.toggle_pin(&owner(), &id).unwrap();

        store.set_archived(&owner(), &id, true).unwrap();
        let note = store.get(&owner(), &id).unwrap().unwrap();
        assert!(note.is_archived(), "{name}");
        assert!(!note.is_pinned(), "{name}");

        let notes = store.list(&owner()).unwrap();
        assert!(compute_visible_notes_default(&notes, &ViewState::new()).is_empty(), "{name}");
        assert_eq!(
            compute_visible_notes_default(&notes, &ViewState::archived()).len(),
            1,
            "{name}"
        );

        store.set_archived(&owner(), &id, false).unwrap();
        let restored = store.get(&owner(), &id).unwrap().unwrap();
        assert!(!restored.is_archived(), "{name}");
        assert!(!restored.is_pinned(), "{name}");
    }
}

#[test]
fn archived_note_cannot_be_pinned() {
    for (name, store) in backends() {
        let id = store
            .create(&owner(), NewNote::new("Old", "C").archived(true))
            .unwrap();
        let sub = store.subscribe(&owner()).unwrap();
        expect_snapshot(&sub);

        assert!(
            matches!(
                store.toggle_pin(&owner(), &id),
                Err(StoreError::PinArchived { .. })
            ),
            "{name}"
        );
        assert!(!store.get(&owner(), &id).unwrap().unwrap().is_pinned(), "{name}");
        assert!(sub.try_recv().is_none(), "{name}");
    }
}

/// Hammers one store from several threads and checks that the last
/// snapshot delivered is the complete final state.
fn last_snapshot_matches_store_after_concurrent_creates<S>(store: S)
where
    S: NoteStore + Send + Sync + 'static,
{
    const THREADS: usize = 4;
    const PER_THREAD: usize = 50;

    let store = Arc::new(store);
    let sub = store.subscribe(&owner()).unwrap();

    let writers: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    store
                        .create(&owner(), NewNote::new(format!("t{t}-{i}"), "C"))
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let last = sub
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            SnapshotEvent::Snapshot(notes) => Some(notes.len()),
            SnapshotEvent::Error(_) => None,
        })
        .last();
    assert_eq!(last, Some(THREADS * PER_THREAD));
    assert_eq!(store.list(&owner()).unwrap().len(), THREADS * PER_THREAD);
}

#[test]
fn concurrent_mutations_deliver_snapshots_in_order_local() {
    last_snapshot_matches_store_after_concurrent_creates(LocalStore::in_memory());
}

#[test]
fn concurrent_mutations_deliver_snapshots_in_order_document() {
    last_snapshot_matches_store_after_concurrent_creates(
        DocumentStore::in_memory().expect("failed to open document store"),
    );
}

#[test]
fn subscribe_delivers_initial_snapshot_then_updates() {
    for (name, store) in backends() {
        store.create(&owner(), NewNote::new("First", "C")).unwrap();

        let sub = store.subscribe(&owner()).unwrap();
        assert_eq!(expect_snapshot(&sub).len(), 1, "{name}");

        let id = store.create(&owner(), NewNote::new("Second", "C")).unwrap();
        assert_eq!(expect_snapshot(&sub).len(), 2, "{name}");

        store.toggle_pin(&owner(), &id).unwrap();
        let notes = expect_snapshot(&sub);
        assert!(
            notes.iter().any(|n| n.id() == &id && n.is_pinned()),
            "{name}"
        );

        store.delete(&owner(), &id).unwrap();
        assert_eq!(expect_snapshot(&sub).len(), 1, "{name}");
    }
}

#[test]
fn failed_mutation_publishes_nothing() {
    for (name, store) in backends() {
        let sub = store.subscribe(&owner()).unwrap();
        expect_snapshot(&sub);

        assert!(store.create(&owner(), NewNote::new("", "")).is_err(), "{name}");
        assert!(store.delete(&owner(), &NoteId::new("nope")).is_err(), "{name}");
        assert!(sub.try_recv().is_none(), "{name}");
    }
}

#[test]
fn snapshots_are_not_filtered_by_archive_state() {
    for (name, store) in backends() {
        let active = store.create(&owner(), NewNote::new("Active", "C")).unwrap();
        let archived = store
            .create(&owner(), NewNote::new("Archived", "C").archived(true))
            .unwrap();

        let sub = store.subscribe(&owner()).unwrap();
        let notes = expect_snapshot(&sub);
        let ids: Vec<&NoteId> = notes.iter().map(Note::id).collect();

        assert!(ids.contains(&&active), "{name}");
        assert!(ids.contains(&&archived), "{name}");
    }
}

#[test]
fn new_subscription_tears_down_the_previous_one() {
    for (name, store) in backends() {
        let first = store.subscribe(&owner()).unwrap();
        expect_snapshot(&first);

        let second = store.subscribe(&owner()).unwrap();
        expect_snapshot(&second);
        assert!(!first.is_connected(), "{name}");

        store.create(&owner(), NewNote::new("T", "C")).unwrap();
        assert!(first.recv().is_none(), "{name}: stale feed must not deliver");
        assert_eq!(expect_snapshot(&second).len(), 1, "{name}");
    }
}

#[test]
fn subscriptions_of_different_owners_are_independent() {
    for (name, store) in backends() {
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");

        let alice_sub = store.subscribe(&alice).unwrap();
        let bob_sub = store.subscribe(&bob).unwrap();
        expect_snapshot(&alice_sub);
        expect_snapshot(&bob_sub);

        store.create(&alice, NewNote::new("Alice's", "C")).unwrap();
        assert_eq!(expect_snapshot(&alice_sub).len(), 1, "{name}");
        assert!(bob_sub.try_recv().is_none(), "{name}");
        assert!(bob_sub.is_connected(), "{name}");
    }
}

#[test]
fn cancelled_subscription_stops_delivery() {
    for (name, store) in backends() {
        let sub = store.subscribe(&owner()).unwrap();
        expect_snapshot(&sub);
        sub.cancel();

        // Mutations keep working with nobody listening
        store.create(&owner(), NewNote::new("T", "C")).unwrap();
        let again = store.subscribe(&owner()).unwrap();
        assert_eq!(expect_snapshot(&again).len(), 1, "{name}");
    }
}

#[test]
fn legacy_document_appears_in_main_view_of_live_snapshot() {
    let store = DocumentStore::in_memory().unwrap();
    let sub = store.subscribe(&owner()).unwrap();
    expect_snapshot(&sub);

    store
        .insert_raw_document(
            &owner(),
            &NoteId::new("legacy"),
            r#"{"title": "Written before archiving existed", "createdAt": {"seconds": 1600000000, "nanoseconds": 0}}"#,
        )
        .unwrap();

    let notes = expect_snapshot(&sub);
    let main = compute_visible_notes_default(&notes, &ViewState::new());
    let archived = compute_visible_notes_default(&notes, &ViewState::archived());

    assert_eq!(main.len(), 1);
    assert_eq!(main[0].id().as_str(), "legacy");
    assert!(archived.is_empty());
}
