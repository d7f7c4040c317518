//! Article domain model.
//!
//! # Responsibility
//! - Define the persisted article record and its id-less draft form.
//! - Parse mutation payloads into drafts before any store access.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes after insert.
//! - A draft never carries an id; any `id` field in a payload is ignored.
//! - `date` and `image` are opaque caller-supplied strings.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned article identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ArticleId = i64;

/// Canonical persisted article record.
///
/// Serialized with the exact field names `id,title,content,date,image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    /// Caller-supplied publication date, stored verbatim.
    pub date: String,
    /// URI or filename of the cover image, stored verbatim.
    pub image: String,
}

impl Article {
    /// Builds a stored article from a draft and a store-assigned id.
    pub fn from_draft(id: ArticleId, draft: ArticleDraft) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            date: draft.date,
            image: draft.image,
        }
    }

    /// Replaces every field except `id`.
    pub fn apply(&mut self, draft: ArticleDraft) {
        self.title = draft.title;
        self.content = draft.content;
        self.date = draft.date;
        self.image = draft.image;
    }
}

/// Article fields supplied by a caller for insert or update.
///
/// Missing string fields decode as empty strings, unknown fields (including
/// `id`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub date: String,
    pub image: String,
}

impl ArticleDraft {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        date: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            date: date.into(),
            image: image.into(),
        }
    }

    /// Parses a JSON request body into a draft.
    ///
    /// # Errors
    /// - Returns `ArticlePayloadError::Empty` for an empty or blank body.
    /// - Returns `ArticlePayloadError::Malformed` when the body is not a JSON
    ///   object with string-typed article fields.
    pub fn from_json(body: &[u8]) -> Result<Self, ArticlePayloadError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ArticlePayloadError::Empty);
        }
        serde_json::from_slice(body).map_err(|err| ArticlePayloadError::Malformed(err.to_string()))
    }
}

/// Payload parse errors for article mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticlePayloadError {
    Empty,
    Malformed(String),
}

impl Display for ArticlePayloadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "article payload is empty"),
            Self::Malformed(details) => write!(f, "article payload is malformed: {details}"),
        }
    }
}

impl Error for ArticlePayloadError {}

#[cfg(test)]
mod tests {
    use super::{Article, ArticleDraft, ArticlePayloadError};

    #[test]
    fn from_json_ignores_id_and_unknown_fields() {
        let draft = ArticleDraft::from_json(
            br#"{"id": 99, "title": "t", "content": "c", "extra": true}"#,
        )
        .expect("payload should parse");
        assert_eq!(draft.title, "t");
        assert_eq!(draft.content, "c");
        assert_eq!(draft.date, "");
        assert_eq!(draft.image, "");
    }

    #[test]
    fn from_json_rejects_wrong_field_types() {
        let err = ArticleDraft::from_json(br#"{"title": 5}"#).expect_err("number title");
        assert!(matches!(err, ArticlePayloadError::Malformed(_)));
    }

    #[test]
    fn from_json_rejects_blank_body() {
        let err = ArticleDraft::from_json(b"  \n").expect_err("blank body");
        assert_eq!(err, ArticlePayloadError::Empty);
    }

    #[test]
    fn apply_keeps_id() {
        let mut article = Article::from_draft(3, ArticleDraft::new("a", "b", "c", "d"));
        article.apply(ArticleDraft::new("w", "x", "y", "z"));
        assert_eq!(article.id, 3);
        assert_eq!(article.title, "w");
        assert_eq!(article.image, "z");
    }
}
