mod draft;
mod ids;
mod markup;
mod note;
mod record;
mod timestamp;

pub use draft::{NewNote, NotePatch};
pub use ids::{NoteId, OwnerId};
pub use markup::plain_text_from_markup;
pub use note::{DEFAULT_CATEGORY, Note, NoteBuilder};
pub use record::NoteRecord;
pub use timestamp::Timestamp;
