//! Domain models for listable resources.
//!
//! These models are storage-agnostic. Each resource exposes a static
//! field table and a reflection-free accessor so that filters can be
//! validated, typed and evaluated without knowing the concrete type.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Record Capability
// =============================================================================

/// Minimal identity shared by every persisted entity.
///
/// `id` is assigned by the store and strictly increases with insertion
/// order. Keyset pagination depends on this, and additionally assumes
/// that `id` increases with `created_at`.
pub trait Record {
    fn id(&self) -> i64;
    fn created_at(&self) -> DateTime<Utc>;
}

/// A record type the engine can list, filter and sort.
pub trait Resource: Record + Clone + Serialize + Send + Sync + 'static {
    /// Resource name used in logs and metrics (e.g. `posts`).
    const NAME: &'static str;
    /// Backing table name.
    const TABLE: &'static str;
    /// Fields that may appear in `where__` and `order__` keys.
    const FIELDS: &'static [FieldDef];

    /// Look up a field by its public (query-string) name.
    fn field(name: &str) -> Option<&'static FieldDef> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }

    /// Read a field value by public name.
    fn value(&self, field: &str) -> Option<FieldValue>;
}

// =============================================================================
// Field Table
// =============================================================================

/// Scalar type of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    Timestamp,
    Boolean,
}

impl FieldKind {
    /// Whether `more_than`/`less_than` are meaningful for this kind.
    pub fn is_ordered(self) -> bool {
        matches!(self, Self::Integer | Self::Timestamp)
    }
}

/// One entry of a resource's field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Name used in query keys (`likeCount`).
    pub name: &'static str,
    /// Column name in the store (`like_count`).
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }
}

/// The `id` field, present on every resource.
pub const ID_FIELD: &str = "id";
/// The `createdAt` field, present on every resource.
pub const CREATED_AT_FIELD: &str = "createdAt";

// =============================================================================
// Field Values
// =============================================================================

/// A typed value coerced from a raw query-string value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Boolean(bool),
}

impl FieldValue {
    /// Coerce a raw string to the given kind.
    ///
    /// Timestamps accept RFC 3339 or a bare `YYYY-MM-DD` date (midnight UTC).
    pub fn parse(kind: FieldKind, raw: &str) -> Result<Self, String> {
        match kind {
            FieldKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Self::Integer)
                .map_err(|_| "expected an integer".to_string()),
            FieldKind::Text => Ok(Self::Text(raw.to_string())),
            FieldKind::Timestamp => parse_timestamp(raw.trim()).map(Self::Timestamp),
            FieldKind::Boolean => match raw.trim() {
                "true" | "1" => Ok(Self::Boolean(true)),
                "false" | "0" => Ok(Self::Boolean(false)),
                _ => Err("expected true or false".to_string()),
            },
        }
    }

    /// Compare two values of the same variant. Mixed variants are unordered.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Boolean(v) => write!(f, "{}", v),
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| "expected an RFC 3339 timestamp or YYYY-MM-DD date".to_string())
}

// =============================================================================
// Posts
// =============================================================================

/// A post written by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub like_count: i64,
    pub comment_count: i64,
}

impl Record for Post {
    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Resource for Post {
    const NAME: &'static str = "posts";
    const TABLE: &'static str = "posts";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id", "id", FieldKind::Integer),
        FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
        FieldDef::new("updatedAt", "updated_at", FieldKind::Timestamp),
        FieldDef::new("authorId", "author_id", FieldKind::Integer),
        FieldDef::new("title", "title", FieldKind::Text),
        FieldDef::new("content", "content", FieldKind::Text),
        FieldDef::new("likeCount", "like_count", FieldKind::Integer),
        FieldDef::new("commentCount", "comment_count", FieldKind::Integer),
    ];

    fn value(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "id" => FieldValue::Integer(self.id),
            "createdAt" => FieldValue::Timestamp(self.created_at),
            "updatedAt" => FieldValue::Timestamp(self.updated_at),
            "authorId" => FieldValue::Integer(self.author_id),
            "title" => FieldValue::Text(self.title.clone()),
            "content" => FieldValue::Text(self.content.clone()),
            "likeCount" => FieldValue::Integer(self.like_count),
            "commentCount" => FieldValue::Integer(self.comment_count),
            _ => return None,
        };
        Some(value)
    }
}

// =============================================================================
// Comments
// =============================================================================

/// A comment attached to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub post_id: i64,
    pub author_id: i64,
    pub comment: String,
    pub like_count: i64,
}

impl Record for Comment {
    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Resource for Comment {
    const NAME: &'static str = "comments";
    const TABLE: &'static str = "comments";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id", "id", FieldKind::Integer),
        FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
        FieldDef::new("updatedAt", "updated_at", FieldKind::Timestamp),
        FieldDef::new("postId", "post_id", FieldKind::Integer),
        FieldDef::new("authorId", "author_id", FieldKind::Integer),
        FieldDef::new("comment", "comment", FieldKind::Text),
        FieldDef::new("likeCount", "like_count", FieldKind::Integer),
    ];

    fn value(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "id" => FieldValue::Integer(self.id),
            "createdAt" => FieldValue::Timestamp(self.created_at),
            "updatedAt" => FieldValue::Timestamp(self.updated_at),
            "postId" => FieldValue::Integer(self.post_id),
            "authorId" => FieldValue::Integer(self.author_id),
            "comment" => FieldValue::Text(self.comment.clone()),
            "likeCount" => FieldValue::Integer(self.like_count),
            _ => return None,
        };
        Some(value)
    }
}

// =============================================================================
// Chat Messages
// =============================================================================

/// A message posted in a chat room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub chat_id: i64,
    pub author_id: i64,
    pub message: String,
}

impl Record for Message {
    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Resource for Message {
    const NAME: &'static str = "messages";
    const TABLE: &'static str = "messages";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("id", "id", FieldKind::Integer),
        FieldDef::new("createdAt", "created_at", FieldKind::Timestamp),
        FieldDef::new("updatedAt", "updated_at", FieldKind::Timestamp),
        FieldDef::new("chatId", "chat_id", FieldKind::Integer),
        FieldDef::new("authorId", "author_id", FieldKind::Integer),
        FieldDef::new("message", "message", FieldKind::Text),
    ];

    fn value(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            "id" => FieldValue::Integer(self.id),
            "createdAt" => FieldValue::Timestamp(self.created_at),
            "updatedAt" => FieldValue::Timestamp(self.updated_at),
            "chatId" => FieldValue::Integer(self.chat_id),
            "authorId" => FieldValue::Integer(self.author_id),
            "message" => FieldValue::Text(self.message.clone()),
            _ => return None,
        };
        Some(value)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_tables_expose_identity_fields() {
        for fields in [Post::FIELDS, Comment::FIELDS, Message::FIELDS] {
            assert!(fields.iter().any(|f| f.name == ID_FIELD));
            assert!(fields.iter().any(|f| f.name == CREATED_AT_FIELD));
        }
    }

    #[test]
    fn field_lookup_uses_public_name() {
        let field = Post::field("likeCount").unwrap();
        assert_eq!(field.column, "like_count");
        assert!(Post::field("like_count").is_none());
    }

    #[test]
    fn parse_integer_rejects_text() {
        assert_eq!(
            FieldValue::parse(FieldKind::Integer, "42"),
            Ok(FieldValue::Integer(42))
        );
        assert!(FieldValue::parse(FieldKind::Integer, "abc").is_err());
    }

    #[test]
    fn parse_timestamp_accepts_date_and_rfc3339() {
        let from_date = FieldValue::parse(FieldKind::Timestamp, "2024-03-01").unwrap();
        let from_rfc = FieldValue::parse(FieldKind::Timestamp, "2024-03-01T00:00:00Z").unwrap();
        assert_eq!(from_date, from_rfc);
        assert!(FieldValue::parse(FieldKind::Timestamp, "yesterday").is_err());
    }

    #[test]
    fn compare_mixed_variants_is_unordered() {
        let a = FieldValue::Integer(1);
        let b = FieldValue::Text("1".into());
        assert_eq!(a.compare(&b), None);
        assert_eq!(a.compare(&FieldValue::Integer(2)), Some(Ordering::Less));
    }
}
