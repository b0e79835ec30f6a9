//! Error types for store operations and live subscriptions.

use thiserror::Error;

use crate::NoteId;

/// Errors raised by a [`NoteStore`](crate::store::NoteStore).
///
/// Validation and not-found errors come back synchronously from the
/// mutating call. Subscription errors travel over the subscription
/// channel instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field was missing or blank.
    #[error("Note {field} cannot be empty")]
    Validation { field: &'static str },

    /// The note does not exist in the owner's collection.
    #[error("Note not found: {id}")]
    NotFound { id: NoteId },

    /// Archived notes are always unpinned; restore the note first.
    #[error("Archived note cannot be pinned: {id}")]
    PinArchived { id: NoteId },

    /// A session operation needs an owner but nobody is signed in.
    #[error("Not signed in")]
    NotSignedIn,

    /// The live feed could not produce a snapshot.
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// The SQLite backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A document could not be encoded or the store file is not JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading or writing the local store file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for errors caused by user input rather than the backend.
    ///
    /// Used by the CLI to choose between exit codes 1 and 2.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::PinArchived { .. }
                | Self::NotSignedIn
        )
    }
}
