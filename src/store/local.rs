use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;

use super::{NoteStore, SnapshotEvent, Subscription, SubscriptionHub};
use crate::error::StoreError;
use crate::models::{NewNote, Note, NoteId, NotePatch, NoteRecord, OwnerId, Timestamp};

/// Owner ID → note ID → document.
type Collections = BTreeMap<String, BTreeMap<String, NoteRecord>>;

/// Local store: documents kept in memory and optionally mirrored to a
/// JSON file after every mutation.
///
/// This is the offline counterpart of [`DocumentStore`](super::DocumentStore).
/// Timestamps are written as plain local dates.
pub struct LocalStore {
    path: Option<PathBuf>,
    collections: Mutex<Collections>,
    hub: SubscriptionHub,
}

impl LocalStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            collections: Mutex::new(Collections::new()),
            hub: SubscriptionHub::new(),
        }
    }

    /// Opens the store file at `path`, starting empty if it does not exist.
    ///
    /// Documents in the file are read leniently, the same way the document
    /// store reads its rows.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let collections = if path.exists() {
            load_file(&path)?
        } else {
            Collections::new()
        };
        tracing::debug!(path = %path.display(), owners = collections.len(), "opened local store");

        Ok(Self {
            path: Some(path),
            collections: Mutex::new(collections),
            hub: SubscriptionHub::new(),
        })
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Applies `change` to the owner's collection and persists the result.
    ///
    /// If `change` or the write fails, the collection is restored and no
    /// snapshot is published. The snapshot is sent before the lock is
    /// released.
    fn mutate<T>(
        &self,
        owner: &OwnerId,
        change: impl FnOnce(&mut BTreeMap<String, NoteRecord>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut collections = self.collections.lock();
        let backup = collections.get(owner.as_str()).cloned();

        let outcome = change(collections.entry(owner.to_string()).or_default())
            .and_then(|value| self.persist(&collections).map(|()| value));

        match outcome {
            Ok(value) => {
                // Published under the lock so snapshots arrive in mutation order
                self.hub
                    .publish(owner, || SnapshotEvent::Snapshot(notes_of(&collections, owner)));
                Ok(value)
            }
            Err(err) => {
                match backup {
                    Some(previous) => {
                        collections.insert(owner.to_string(), previous);
                    }
                    None => {
                        collections.remove(owner.as_str());
                    }
                }
                Err(err)
            }
        }
    }

    fn persist(&self, collections: &Collections) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename so a crash never leaves a half-written file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(collections)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn load_file(path: &Path) -> Result<Collections, StoreError> {
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(Collections::new());
    }

    let raw: BTreeMap<String, BTreeMap<String, Value>> = serde_json::from_str(&text)?;
    Ok(raw
        .into_iter()
        .map(|(owner, docs)| {
            let docs = docs
                .into_iter()
                .map(|(id, doc)| (id, NoteRecord::from_value_lenient(&doc)))
                .collect();
            (owner, docs)
        })
        .collect())
}

fn notes_of(collections: &Collections, owner: &OwnerId) -> Vec<Note> {
    collections
        .get(owner.as_str())
        .map(|docs| {
            docs.iter()
                .map(|(id, record)| Note::from_record(NoteId::new(id.clone()), record.clone()))
                .collect()
        })
        .unwrap_or_default()
}

impl NoteStore for LocalStore {
    fn create(&self, owner: &OwnerId, note: NewNote) -> Result<NoteId, StoreError> {
        note.validate()?;

        let id = NoteId::generate();
        let record = note.into_record(Timestamp::local_now());

        self.mutate(owner, |docs| {
            docs.insert(id.to_string(), record);
            Ok(())
        })?;
        tracing::debug!(owner = %owner, id = %id, "created note");
        Ok(id)
    }

    fn get(&self, owner: &OwnerId, id: &NoteId) -> Result<Option<Note>, StoreError> {
        let collections = self.collections.lock();
        Ok(collections
            .get(owner.as_str())
            .and_then(|docs| docs.get(id.as_str()))
            .map(|record| Note::from_record(id.clone(), record.clone())))
    }

    fn update(&self, owner: &OwnerId, id: &NoteId, patch: NotePatch) -> Result<(), StoreError> {
        patch.validate()?;

        self.mutate(owner, |docs| {
            let record = docs
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
            patch.apply_to(record, Timestamp::local_now());
            Ok(())
        })?;
        tracing::debug!(owner = %owner, id = %id, "updated note");
        Ok(())
    }

    fn delete(&self, owner: &OwnerId, id: &NoteId) -> Result<(), StoreError> {
        self.mutate(owner, |docs| {
            docs.remove(id.as_str())
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound { id: id.clone() })
        })?;
        tracing::debug!(owner = %owner, id = %id, "deleted note");
        Ok(())
    }

    fn list(&self, owner: &OwnerId) -> Result<Vec<Note>, StoreError> {
        Ok(notes_of(&self.collections.lock(), owner))
    }

    fn subscribe(&self, owner: &OwnerId) -> Result<Subscription, StoreError> {
        let collections = self.collections.lock();
        let subscription = self.hub.register(owner);
        tracing::info!(owner = %owner, "opened live subscription");

        self.hub
            .publish(owner, || SnapshotEvent::Snapshot(notes_of(&collections, owner)));
        Ok(subscription)
    }
}
