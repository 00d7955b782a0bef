//! Result envelopes returned by list queries.
//!
//! Page mode returns a window plus the total match count. Cursor mode
//! returns a window plus a continuation URL that encodes the next id bound
//! as an ordinary query parameter.

use serde::Serialize;

/// Page-mode result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    /// Rows matching the filter, ignoring the window.
    pub total: u64,
}

impl<T> PageResult<T> {
    /// Whether a page after the window at `offset` of size `take` exists.
    pub fn has_next(&self, offset: u64, take: u32) -> bool {
        offset + u64::from(take) < self.total
    }
}

/// Anchor of the next cursor window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CursorInfo {
    /// Id of the last record, when a following page is presumed.
    pub after: Option<i64>,
}

/// Cursor-mode result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorResult<T> {
    pub data: Vec<T>,
    pub cursor: CursorInfo,
    /// Number of records in `data`.
    pub count: usize,
    /// Continuation URL, or `None` on a short (final) page.
    pub next: Option<String>,
}

/// Uniform envelope returned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Paginated<T> {
    Page(PageResult<T>),
    Cursor(CursorResult<T>),
}

impl<T> Paginated<T> {
    pub fn data(&self) -> &[T] {
        match self {
            Self::Page(page) => &page.data,
            Self::Cursor(cursor) => &cursor.data,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Page(_) => "page",
            Self::Cursor(_) => "cursor",
        }
    }

    pub fn into_page(self) -> Option<PageResult<T>> {
        match self {
            Self::Page(page) => Some(page),
            Self::Cursor(_) => None,
        }
    }

    pub fn into_cursor(self) -> Option<CursorResult<T>> {
        match self {
            Self::Cursor(cursor) => Some(cursor),
            Self::Page(_) => None,
        }
    }
}
