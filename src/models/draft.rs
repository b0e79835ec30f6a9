use super::{NoteRecord, Timestamp, plain_text_from_markup};
use crate::error::StoreError;

/// Fields supplied by the caller when creating a note.
///
/// # Examples
///
/// ```
/// use keepnote::NewNote;
///
/// let draft = NewNote::new("Groceries", "<p>milk, eggs</p>")
///     .category("Errands")
///     .tags(vec!["home".to_string()]);
/// assert_eq!(draft.title, "Groceries");
/// assert!(!draft.is_archived);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    /// Plain-text projection; derived from `content` when `None`.
    pub plain_text: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub product_link: Option<String>,
    pub is_pinned: bool,
    pub is_archived: bool,
}

impl NewNote {
    /// Creates a draft with the two required fields and default flags.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn product_link(mut self, link: impl Into<String>) -> Self {
        self.product_link = Some(link.into());
        self
    }

    pub fn plain_text(mut self, text: impl Into<String>) -> Self {
        self.plain_text = Some(text.into());
        self
    }

    /// Overrides the pin default.
    pub fn pinned(mut self, pinned: bool) -> Self {
        self.is_pinned = pinned;
        self
    }

    /// Overrides the archive default. An archived note is never pinned.
    pub fn archived(mut self, archived: bool) -> Self {
        self.is_archived = archived;
        self
    }

    /// Checks that title and content are present.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::Validation { field: "title" });
        }
        if self.content.trim().is_empty() {
            return Err(StoreError::Validation { field: "content" });
        }
        Ok(())
    }

    /// Produces the document to persist, stamped with `now`.
    pub fn into_record(self, now: Timestamp) -> NoteRecord {
        let plain_text = self
            .plain_text
            .unwrap_or_else(|| plain_text_from_markup(&self.content));

        NoteRecord {
            title: Some(self.title),
            content: Some(self.content),
            plain_text: Some(plain_text),
            category: self.category,
            tags: Some(self.tags),
            product_link: self.product_link,
            is_pinned: Some(self.is_pinned && !self.is_archived),
            is_archived: Some(self.is_archived),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub plain_text: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub product_link: Option<String>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
}

impl NotePatch {
    /// Patch that only sets the pin flag.
    pub fn pin(pinned: bool) -> Self {
        Self {
            is_pinned: Some(pinned),
            ..Default::default()
        }
    }

    /// Patch for an archive transition. Archiving also unpins.
    pub fn archive(archived: bool) -> Self {
        Self {
            is_archived: Some(archived),
            is_pinned: archived.then_some(false),
            ..Default::default()
        }
    }

    /// Rejects patches that would blank a required field.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(StoreError::Validation { field: "title" });
        }
        if self.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(StoreError::Validation { field: "content" });
        }
        Ok(())
    }

    /// Merges this patch into a stored document and refreshes `updatedAt`.
    ///
    /// New content without an explicit plain text re-derives the plain
    /// text. After merging, an archived document is always unpinned.
    pub fn apply_to(self, record: &mut NoteRecord, now: Timestamp) {
        if let Some(content) = self.content {
            if self.plain_text.is_none() {
                record.plain_text = Some(plain_text_from_markup(&content));
            }
            record.content = Some(content);
        }
        if let Some(title) = self.title {
            record.title = Some(title);
        }
        if let Some(plain_text) = self.plain_text {
            record.plain_text = Some(plain_text);
        }
        if let Some(category) = self.category {
            record.category = Some(category);
        }
        if let Some(tags) = self.tags {
            record.tags = Some(tags);
        }
        if let Some(link) = self.product_link {
            record.product_link = Some(link);
        }
        if let Some(pinned) = self.is_pinned {
            record.is_pinned = Some(pinned);
        }
        if let Some(archived) = self.is_archived {
            record.is_archived = Some(archived);
        }
        if record.is_archived == Some(true) {
            record.is_pinned = Some(false);
        }
        record.updated_at = Some(now);
    }
}
