pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod session;
pub mod store;
pub mod tui;
pub mod utils;
pub mod view;

pub use db::Database;
pub use error::StoreError;
pub use models::{NewNote, Note, NoteBuilder, NoteId, NotePatch, NoteRecord, OwnerId, Timestamp};
pub use pipeline::{
    Renderer, SearchOptions, compute_visible_notes, compute_visible_notes_default,
    render_visible_notes,
};
pub use session::Session;
pub use store::{DocumentStore, LocalStore, NoteStore, SnapshotEvent, Subscription};
pub use view::{ActiveView, CategoryFilter, ViewAction, ViewState};
