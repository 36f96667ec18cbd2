//! Post types and data structures.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publication status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Not yet visible to readers.
    #[default]
    Draft,
    /// Visible to readers.
    Published,
}

impl PostStatus {
    /// Convert to database string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

/// Post domain model.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Datastore-assigned stable identifier.
    pub id: i64,
    /// Post title.
    pub title: String,
    /// Derived URL slug; optional and not unique.
    pub slug: Option<String>,
    /// Post body.
    pub content: String,
    /// Public URL of the thumbnail image, if one was uploaded.
    pub thumbnail_url: Option<String>,
    /// Publication status.
    pub status: PostStatus,
    /// Owner: the user who created the post.
    pub owner_user_id: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp, refreshed by the datastore on write.
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a post mutation.
///
/// `slug` and `status` are optional with coalescing defaults; on
/// update, an absent field is overwritten with its default rather
/// than left untouched (full replace, not patch).
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    /// Post title (required, 1..=255 chars).
    pub title: String,
    /// Post body (required, non-empty).
    pub content: String,
    /// URL slug (optional).
    pub slug: Option<String>,
    /// Publication status (defaults to draft).
    pub status: Option<PostStatus>,
}

/// An uploaded image as received from the request layer.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original filename.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Raw bytes.
    pub bytes: Bytes,
}

/// Row values for inserting a new post.
#[derive(Debug, Clone)]
pub struct NewPostRecord {
    /// Post title.
    pub title: String,
    /// URL slug.
    pub slug: Option<String>,
    /// Post body.
    pub content: String,
    /// Resolved thumbnail URL, if an image was uploaded.
    pub thumbnail_url: Option<String>,
    /// Publication status.
    pub status: PostStatus,
    /// Owner user id.
    pub owner_user_id: i64,
}

/// Row values for a full-row post update.
///
/// The owner column is deliberately absent: ownership is re-validated
/// by the caller, never reassigned.
#[derive(Debug, Clone)]
pub struct PostUpdateRecord {
    /// Post title.
    pub title: String,
    /// URL slug.
    pub slug: Option<String>,
    /// Post body.
    pub content: String,
    /// Thumbnail URL: the freshly uploaded one, or the existing row's
    /// value carried forward.
    pub thumbnail_url: Option<String>,
    /// Publication status.
    pub status: PostStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PostStatus::Draft, "draft")]
    #[case(PostStatus::Published, "published")]
    fn test_status_roundtrip(#[case] status: PostStatus, #[case] s: &str) {
        assert_eq!(status.as_str(), s);
        assert_eq!(PostStatus::parse(s), Some(status));
    }

    #[test]
    fn test_status_unknown() {
        assert_eq!(PostStatus::parse("archived"), None);
    }

    #[test]
    fn test_status_default_is_draft() {
        assert_eq!(PostStatus::default(), PostStatus::Draft);
    }
}
