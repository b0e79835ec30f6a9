//! Note store adapters and the live subscription contract.
//!
//! A [`NoteStore`] persists notes per owner and feeds complete snapshots of
//! the owner's collection to at most one live [`Subscription`]. Snapshots
//! are deliberately unfiltered: archive and category filtering happen in
//! the pipeline, so documents lacking newer fields are never dropped by a
//! store-side query.

mod document;
mod hub;
mod local;

use crate::error::StoreError;
use crate::models::{NewNote, Note, NoteId, NotePatch, OwnerId};

pub use document::DocumentStore;
pub use hub::{SnapshotEvent, Subscription};
pub use local::LocalStore;

pub(crate) use hub::SubscriptionHub;

/// Persistent, owner-scoped note storage with a live snapshot feed.
///
/// Mutations report failure to the caller and never produce a snapshot
/// when they fail. A successful mutation is followed by a fresh snapshot
/// on the owner's subscription, if one is open.
pub trait NoteStore: Send + Sync {
    /// Creates a note and returns its store-assigned ID.
    ///
    /// Fails with [`StoreError::Validation`] when title or content is blank.
    fn create(&self, owner: &OwnerId, note: NewNote) -> Result<NoteId, StoreError>;

    /// Reads a single note. Returns `None` if it does not exist for `owner`.
    fn get(&self, owner: &OwnerId, id: &NoteId) -> Result<Option<Note>, StoreError>;

    /// Merges `patch` into the note and refreshes `updatedAt`.
    ///
    /// Fails with [`StoreError::NotFound`] if the note does not exist for
    /// `owner`.
    fn update(&self, owner: &OwnerId, id: &NoteId, patch: NotePatch) -> Result<(), StoreError>;

    /// Permanently deletes a note.
    ///
    /// Fails with [`StoreError::NotFound`] if the note does not exist, so a
    /// second delete of the same ID is an error.
    fn delete(&self, owner: &OwnerId, id: &NoteId) -> Result<(), StoreError>;

    /// Loads every note of `owner` once, without subscribing.
    fn list(&self, owner: &OwnerId) -> Result<Vec<Note>, StoreError>;

    /// Opens the live feed for `owner`, replacing any previous one.
    ///
    /// The first event is the current snapshot. A previously returned
    /// subscription for the same owner is disconnected.
    fn subscribe(&self, owner: &OwnerId) -> Result<Subscription, StoreError>;

    /// Flips the pin flag.
    ///
    /// Fails with [`StoreError::PinArchived`] for an archived note, which
    /// stays unpinned until it is restored.
    fn toggle_pin(&self, owner: &OwnerId, id: &NoteId) -> Result<(), StoreError> {
        let note = self
            .get(owner, id)?
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        if note.is_archived() {
            return Err(StoreError::PinArchived { id: id.clone() });
        }
        self.update(owner, id, NotePatch::pin(!note.is_pinned()))
    }

    /// Archives or restores a note. Archiving always unpins.
    fn set_archived(&self, owner: &OwnerId, id: &NoteId, archived: bool) -> Result<(), StoreError> {
        self.update(owner, id, NotePatch::archive(archived))
    }
}

impl<S: NoteStore + ?Sized> NoteStore for Box<S> {
    fn create(&self, owner: &OwnerId, note: NewNote) -> Result<NoteId, StoreError> {
        (**self).create(owner, note)
    }

    fn get(&self, owner: &OwnerId, id: &NoteId) -> Result<Option<Note>, StoreError> {
        (**self).get(owner, id)
    }

    fn update(&self, owner: &OwnerId, id: &NoteId, patch: NotePatch) -> Result<(), StoreError> {
        (**self).update(owner, id, patch)
    }

    fn delete(&self, owner: &OwnerId, id: &NoteId) -> Result<(), StoreError> {
        (**self).delete(owner, id)
    }

    fn list(&self, owner: &OwnerId) -> Result<Vec<Note>, StoreError> {
        (**self).list(owner)
    }

    fn subscribe(&self, owner: &OwnerId) -> Result<Subscription, StoreError> {
        (**self).subscribe(owner)
    }

    fn toggle_pin(&self, owner: &OwnerId, id: &NoteId) -> Result<(), StoreError> {
        (**self).toggle_pin(owner, id)
    }

    fn set_archived(&self, owner: &OwnerId, id: &NoteId, archived: bool) -> Result<(), StoreError> {
        (**self).set_archived(owner, id, archived)
    }
}

impl<S: NoteStore + ?Sized> NoteStore for &S {
    fn create(&self, owner: &OwnerId, note: NewNote) -> Result<NoteId, StoreError> {
        (**self).create(owner, note)
    }

    fn get(&self, owner: &OwnerId, id: &NoteId) -> Result<Option<Note>, StoreError> {
        (**self).get(owner, id)
    }

    fn update(&self, owner: &OwnerId, id: &NoteId, patch: NotePatch) -> Result<(), StoreError> {
        (**self).update(owner, id, patch)
    }

    fn delete(&self, owner: &OwnerId, id: &NoteId) -> Result<(), StoreError> {
        (**self).delete(owner, id)
    }

    fn list(&self, owner: &OwnerId) -> Result<Vec<Note>, StoreError> {
        (**self).list(owner)
    }

    fn subscribe(&self, owner: &OwnerId) -> Result<Subscription, StoreError> {
        (**self).subscribe(owner)
    }

    fn toggle_pin(&self, owner: &OwnerId, id: &NoteId) -> Result<(), StoreError> {
        (**self).toggle_pin(owner, id)
    }

    fn set_archived(&self, owner: &OwnerId, id: &NoteId, archived: bool) -> Result<(), StoreError> {
        (**self).set_archived(owner, id, archived)
    }
}

#[cfg(test)]
mod tests;
