use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Note, Timestamp};

/// A note document exactly as it sits in a store.
///
/// Every field is optional because documents written by older clients
/// lack fields that were added later. Normalization into [`Note`] happens
/// in [`Note::from_record`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl NoteRecord {
    /// Parses a stored JSON document, salvaging every well-typed field.
    ///
    /// Only text that is not JSON at all is an error. A field holding the
    /// wrong type (say `"isPinned": "yes"`) is dropped and later defaulted,
    /// and a non-object document yields an empty record.
    pub fn from_json_lenient(json: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value_lenient(&value))
    }

    /// Field-by-field extraction from an arbitrary JSON value.
    pub fn from_value_lenient(value: &Value) -> Self {
        let Some(doc) = value.as_object() else {
            return Self::default();
        };

        fn field<T: DeserializeOwned>(doc: &serde_json::Map<String, Value>, key: &str) -> Option<T> {
            doc.get(key)
                .filter(|v| !v.is_null())
                .and_then(|v| serde_json::from_value(v.clone()).ok())
        }

        Self {
            title: field(doc, "title"),
            content: field(doc, "content"),
            plain_text: field(doc, "plainText"),
            category: field(doc, "category"),
            tags: field(doc, "tags"),
            product_link: field(doc, "productLink"),
            is_pinned: field(doc, "isPinned"),
            is_archived: field(doc, "isArchived"),
            created_at: field(doc, "createdAt"),
            updated_at: field(doc, "updatedAt"),
        }
    }
}

impl From<&Note> for NoteRecord {
    fn from(note: &Note) -> Self {
        Self {
            title: Some(note.title().to_string()),
            content: Some(note.content().to_string()),
            plain_text: note.plain_text().map(str::to_string),
            category: Some(note.category().to_string()),
            tags: Some(note.tags().to_vec()),
            product_link: note.product_link().map(str::to_string),
            is_pinned: Some(note.is_pinned()),
            is_archived: Some(note.is_archived()),
            created_at: note.created_at(),
            updated_at: note.updated_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_document_without_flags_parses() {
        let record =
            NoteRecord::from_json_lenient(r#"{"title": "Old note", "content": "<p>hi</p>"}"#)
                .unwrap();

        assert_eq!(record.title.as_deref(), Some("Old note"));
        assert_eq!(record.is_archived, None);
        assert_eq!(record.is_pinned, None);
    }

    #[test]
    fn wrongly_typed_fields_are_dropped_not_fatal() {
        let record = NoteRecord::from_json_lenient(
            r#"{"title": 42, "isPinned": "yes", "tags": ["a", "b"], "isArchived": null}"#,
        )
        .unwrap();

        assert_eq!(record.title, None);
        assert_eq!(record.is_pinned, None);
        assert_eq!(record.is_archived, None);
        assert_eq!(record.tags, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn non_object_document_yields_empty_record() {
        let record = NoteRecord::from_json_lenient("[1, 2, 3]").unwrap();
        assert_eq!(record, NoteRecord::default());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(NoteRecord::from_json_lenient("{not json").is_err());
    }

    #[test]
    fn mixed_timestamp_shapes_parse() {
        let record = NoteRecord::from_json_lenient(
            r#"{"createdAt": {"seconds": 5, "nanoseconds": 0}, "updatedAt": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(
            record.created_at,
            Some(Timestamp::Server {
                seconds: 5,
                nanoseconds: 0
            })
        );
        assert!(matches!(record.updated_at, Some(Timestamp::Local(_))));
    }

    #[test]
    fn absent_fields_are_not_serialized() {
        let record = NoteRecord {
            title: Some("t".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"title":"t"}"#);
    }
}
