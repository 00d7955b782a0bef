//! Row types and their conversion into domain models.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use sift_core::error::{StorageError, StorageResult};
use sift_core::models::{Comment, Message, Post, Resource};

/// A resource that can be read from PostgreSQL.
pub trait PgResource: Resource + Unpin {
    /// Row shape returned by the column list in the resource's field table.
    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;

    fn from_row(row: Self::Row) -> StorageResult<Self>;
}

/// A resource row plus the `COUNT(*) OVER()` column.
pub struct CountedRow<R> {
    pub row: R,
    pub total: i64,
}

impl<'r, R: FromRow<'r, PgRow>> FromRow<'r, PgRow> for CountedRow<R> {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            row: R::from_row(row)?,
            total: row.try_get(super::sql::TOTAL_COLUMN)?,
        })
    }
}

/// Database row representation for Post.
#[derive(FromRow)]
pub struct PostRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: i64,
    title: String,
    content: String,
    like_count: i64,
    comment_count: i64,
}

impl PgResource for Post {
    type Row = PostRow;

    fn from_row(row: PostRow) -> StorageResult<Self> {
        Ok(Post {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            author_id: row.author_id,
            title: row.title,
            content: row.content,
            like_count: non_negative(row.like_count, "posts.like_count")?,
            comment_count: non_negative(row.comment_count, "posts.comment_count")?,
        })
    }
}

/// Database row representation for Comment.
#[derive(FromRow)]
pub struct CommentRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    post_id: i64,
    author_id: i64,
    comment: String,
    like_count: i64,
}

impl PgResource for Comment {
    type Row = CommentRow;

    fn from_row(row: CommentRow) -> StorageResult<Self> {
        Ok(Comment {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            post_id: row.post_id,
            author_id: row.author_id,
            comment: row.comment,
            like_count: non_negative(row.like_count, "comments.like_count")?,
        })
    }
}

/// Database row representation for Message.
#[derive(FromRow)]
pub struct MessageRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    chat_id: i64,
    author_id: i64,
    message: String,
}

impl PgResource for Message {
    type Row = MessageRow;

    fn from_row(row: MessageRow) -> StorageResult<Self> {
        Ok(Message {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            chat_id: row.chat_id,
            author_id: row.author_id,
            message: row.message,
        })
    }
}

/// Reject negative counters as corrupt.
fn non_negative(value: i64, field_name: &str) -> StorageResult<i64> {
    if value < 0 {
        return Err(StorageError::SerializationError(format!(
            "{} is negative ({}), which indicates data corruption",
            field_name, value
        )));
    }
    Ok(value)
}
