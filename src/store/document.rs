use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};

use super::{NoteStore, SnapshotEvent, Subscription, SubscriptionHub};
use crate::db::Database;
use crate::error::StoreError;
use crate::models::{NewNote, Note, NoteId, NotePatch, NoteRecord, OwnerId, Timestamp};

/// Document-database store backed by SQLite.
///
/// Each note is one JSON document in the `notes` table, keyed by owner and
/// ID. Timestamps are written in the server-native representation.
///
/// The live feed only sees mutations made through this instance. Writes
/// from another handle or process on the same file reach a subscriber on
/// its next [`subscribe`](NoteStore::subscribe).
///
/// # Examples
///
/// ```
/// use keepnote::{DocumentStore, NewNote, NoteStore, OwnerId};
///
/// # fn main() -> Result<(), keepnote::StoreError> {
/// let store = DocumentStore::in_memory()?;
/// let owner = OwnerId::new("u1");
///
/// let id = store.create(&owner, NewNote::new("Buy milk", "<p>2 litres</p>"))?;
/// let note = store.get(&owner, &id)?.expect("note should exist");
/// assert_eq!(note.plain_text(), Some("2 litres"));
/// # Ok(())
/// # }
/// ```
pub struct DocumentStore {
    db: Mutex<Database>,
    hub: SubscriptionHub,
}

impl DocumentStore {
    /// Opens an in-memory store.
    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::with_database(Database::in_memory()?))
    }

    /// Opens (or creates) a store file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::with_database(Database::open(path)?))
    }

    /// Wraps an already-open database.
    pub fn with_database(db: Database) -> Self {
        Self {
            db: Mutex::new(db),
            hub: SubscriptionHub::new(),
        }
    }

    /// Writes a raw JSON document as-is, replacing any existing one.
    ///
    /// Used to import documents from older clients, which may lack fields
    /// such as `isArchived`. The document is stored verbatim and normalized
    /// only when read.
    pub fn insert_raw_document(
        &self,
        owner: &OwnerId,
        id: &NoteId,
        document: &str,
    ) -> Result<(), StoreError> {
        let db = self.db.lock();
        let conn = db.connection();
        conn.execute(
            "INSERT OR REPLACE INTO notes (owner_id, id, document) VALUES (?1, ?2, ?3)",
            (owner.as_str(), id.as_str(), document),
        )?;
        tracing::debug!(owner = %owner, id = %id, "imported raw document");

        self.publish_snapshot(conn, owner);
        Ok(())
    }

    fn load_record(
        conn: &Connection,
        owner: &OwnerId,
        id: &NoteId,
    ) -> Result<Option<NoteRecord>, StoreError> {
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM notes WHERE owner_id = ?1 AND id = ?2",
                (owner.as_str(), id.as_str()),
                |row| row.get(0),
            )
            .optional()?;

        Ok(document.map(|doc| decode_document(id, &doc)))
    }

    fn load_notes(conn: &Connection, owner: &OwnerId) -> Result<Vec<Note>, StoreError> {
        let mut stmt =
            conn.prepare("SELECT id, document FROM notes WHERE owner_id = ?1 ORDER BY id")?;

        let rows = stmt.query_map([owner.as_str()], |row| {
            let id: String = row.get(0)?;
            let document: String = row.get(1)?;
            Ok((id, document))
        })?;

        let mut notes = Vec::new();
        for row in rows {
            let (id, document) = row?;
            let id = NoteId::new(id);
            let record = decode_document(&id, &document);
            notes.push(Note::from_record(id, record));
        }
        Ok(notes)
    }

    fn write_record(
        conn: &Connection,
        owner: &OwnerId,
        id: &NoteId,
        record: &NoteRecord,
    ) -> Result<(), StoreError> {
        let document = serde_json::to_string(record)?;
        conn.execute(
            "INSERT OR REPLACE INTO notes (owner_id, id, document) VALUES (?1, ?2, ?3)",
            (owner.as_str(), id.as_str(), document),
        )?;
        Ok(())
    }

    /// Sends the owner's current collection to their live subscription.
    fn publish_snapshot(&self, conn: &Connection, owner: &OwnerId) {
        self.hub.publish(owner, || match Self::load_notes(conn, owner) {
            Ok(notes) => SnapshotEvent::Snapshot(notes),
            Err(err) => {
                tracing::warn!(owner = %owner, error = %err, "failed to load snapshot");
                SnapshotEvent::Error(StoreError::Subscription(err.to_string()))
            }
        });
    }
}

/// Parses a stored document, defaulting anything unreadable.
fn decode_document(id: &NoteId, document: &str) -> NoteRecord {
    NoteRecord::from_json_lenient(document).unwrap_or_else(|err| {
        tracing::warn!(id = %id, error = %err, "unreadable note document, using defaults");
        NoteRecord::default()
    })
}

impl NoteStore for DocumentStore {
    fn create(&self, owner: &OwnerId, note: NewNote) -> Result<NoteId, StoreError> {
        note.validate()?;

        let id = NoteId::generate();
        let record = note.into_record(Timestamp::server_now());

        let db = self.db.lock();
        let conn = db.connection();
        Self::write_record(conn, owner, &id, &record)?;
        tracing::debug!(owner = %owner, id = %id, "created note");

        self.publish_snapshot(conn, owner);
        Ok(id)
    }

    fn get(&self, owner: &OwnerId, id: &NoteId) -> Result<Option<Note>, StoreError> {
        let db = self.db.lock();
        let record = Self::load_record(db.connection(), owner, id)?;
        Ok(record.map(|record| Note::from_record(id.clone(), record)))
    }

    fn update(&self, owner: &OwnerId, id: &NoteId, patch: NotePatch) -> Result<(), StoreError> {
        patch.validate()?;

        let mut db = self.db.lock();
        {
            let tx = db.connection_mut().transaction()?;
            let mut record = Self::load_record(&tx, owner, id)?
                .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;

            patch.apply_to(&mut record, Timestamp::server_now());
            Self::write_record(&tx, owner, id, &record)?;
            tx.commit()?;
        }
        tracing::debug!(owner = %owner, id = %id, "updated note");

        self.publish_snapshot(db.connection(), owner);
        Ok(())
    }

    fn delete(&self, owner: &OwnerId, id: &NoteId) -> Result<(), StoreError> {
        let db = self.db.lock();
        let conn = db.connection();

        let removed = conn.execute(
            "DELETE FROM notes WHERE owner_id = ?1 AND id = ?2",
            (owner.as_str(), id.as_str()),
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound { id: id.clone() });
        }
        tracing::debug!(owner = %owner, id = %id, "deleted note");

        self.publish_snapshot(conn, owner);
        Ok(())
    }

    fn list(&self, owner: &OwnerId) -> Result<Vec<Note>, StoreError> {
        let db = self.db.lock();
        Self::load_notes(db.connection(), owner)
    }

    fn subscribe(&self, owner: &OwnerId) -> Result<Subscription, StoreError> {
        let db = self.db.lock();
        let subscription = self.hub.register(owner);
        tracing::info!(owner = %owner, "opened live subscription");

        self.publish_snapshot(db.connection(), owner);
        Ok(subscription)
    }
}
