use serde::{Deserialize, Serialize};

use super::{NoteId, NoteRecord, Timestamp};

/// Category given to notes that have none.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// A normalized note as seen by the pipeline and the UI.
///
/// Notes are only ever constructed from store documents through
/// [`Note::from_record`] (or [`NoteBuilder`] in tests and fixtures), so every
/// optional field has already been defaulted. Consumers never need to guess
/// what a missing `is_archived` means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    id: NoteId,
    title: String,
    content: String,
    plain_text: Option<String>,
    category: String,
    tags: Vec<String>,
    product_link: Option<String>,
    is_pinned: bool,
    is_archived: bool,
    created_at: Option<Timestamp>,
    updated_at: Option<Timestamp>,
}

impl Note {
    /// Normalizes a raw store document into a `Note`.
    ///
    /// Legacy documents written before pinning and archiving existed lack
    /// `isPinned`/`isArchived`; both default to `false` so such notes stay
    /// visible in the main view. Missing strings default to empty, a
    /// missing or blank category to [`DEFAULT_CATEGORY`]. An archived
    /// document is always read as unpinned.
    pub fn from_record(id: NoteId, record: NoteRecord) -> Self {
        let is_archived = record.is_archived.unwrap_or(false);
        let category = record
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        Self {
            id,
            title: record.title.unwrap_or_default(),
            content: record.content.unwrap_or_default(),
            plain_text: record.plain_text,
            category,
            tags: record.tags.unwrap_or_default(),
            product_link: record.product_link.filter(|l| !l.trim().is_empty()),
            is_pinned: record.is_pinned.unwrap_or(false) && !is_archived,
            is_archived,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Returns the note's unique identifier.
    pub fn id(&self) -> &NoteId {
        &self.id
    }

    /// Returns the display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the rich-text markup.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the plain-text projection of the content, if recorded.
    pub fn plain_text(&self) -> Option<&str> {
        self.plain_text.as_deref()
    }

    /// Returns the category, never blank.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns the tags in stored order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the related product link, if any.
    pub fn product_link(&self) -> Option<&str> {
        self.product_link.as_deref()
    }

    /// Returns whether the note is pinned. Always `false` when archived.
    pub fn is_pinned(&self) -> bool {
        self.is_pinned
    }

    /// Returns whether the note is in the archive.
    pub fn is_archived(&self) -> bool {
        self.is_archived
    }

    /// Returns the creation time, if recorded.
    pub fn created_at(&self) -> Option<Timestamp> {
        self.created_at
    }

    /// Returns the last modification time, if recorded.
    pub fn updated_at(&self) -> Option<Timestamp> {
        self.updated_at
    }

    /// Time used for ordering: last update, else creation, else the epoch.
    pub fn effective_millis(&self) -> i64 {
        self.updated_at
            .or(self.created_at)
            .map(|ts| ts.epoch_millis())
            .unwrap_or(0)
    }
}

/// Builder for constructing `Note` instances directly.
///
/// Intended for fixtures and renderers under test; production notes come
/// from [`Note::from_record`].
///
/// # Examples
///
/// ```
/// use keepnote::{NoteBuilder, NoteId};
///
/// let note = NoteBuilder::new(NoteId::new("1"))
///     .title("My first note")
///     .pinned(true)
///     .build();
///
/// assert_eq!(note.title(), "My first note");
/// assert!(note.is_pinned());
/// assert_eq!(note.category(), "Uncategorized");
/// ```
#[derive(Debug)]
pub struct NoteBuilder {
    id: NoteId,
    record: NoteRecord,
}

impl NoteBuilder {
    /// Creates a new `NoteBuilder` for the given ID.
    pub fn new(id: NoteId) -> Self {
        Self {
            id,
            record: NoteRecord::default(),
        }
    }

    /// Sets the note title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.record.title = Some(title.into());
        self
    }

    /// Sets the note content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.record.content = Some(content.into());
        self
    }

    /// Sets the plain-text projection.
    pub fn plain_text(mut self, plain_text: impl Into<String>) -> Self {
        self.record.plain_text = Some(plain_text.into());
        self
    }

    /// Sets the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.record.category = Some(category.into());
        self
    }

    /// Sets the tags.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.record.tags = Some(tags);
        self
    }

    /// Sets the product link.
    pub fn product_link(mut self, link: impl Into<String>) -> Self {
        self.record.product_link = Some(link.into());
        self
    }

    /// Sets the pin flag.
    pub fn pinned(mut self, pinned: bool) -> Self {
        self.record.is_pinned = Some(pinned);
        self
    }

    /// Sets the archive flag.
    pub fn archived(mut self, archived: bool) -> Self {
        self.record.is_archived = Some(archived);
        self
    }

    /// Sets the creation timestamp.
    pub fn created_at(mut self, at: Timestamp) -> Self {
        self.record.created_at = Some(at);
        self
    }

    /// Sets the update timestamp.
    pub fn updated_at(mut self, at: Timestamp) -> Self {
        self.record.updated_at = Some(at);
        self
    }

    /// Builds the `Note`, applying the same defaults as a store document.
    pub fn build(self) -> Note {
        Note::from_record(self.id, self.record)
    }
}
