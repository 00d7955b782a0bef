//! Keyset pagination with continuation URLs.
//!
//! The window boundary is always the record `id`, while the sort key is
//! usually `createdAt`. This relies on ids increasing with creation time;
//! rows whose `createdAt` disagrees with their id order (backfills, clock
//! skew) can be skipped or repeated across windows.
//!
//! No state is kept between calls. Each continuation is re-derived from the
//! last record of the window:
//!
//! ```text
//! /posts?take=2                          -> [1, 2]  next: ...&where__id__more_than=2
//! /posts?take=2&where__id__more_than=2   -> [3, 4]  next: ...&where__id__more_than=4
//! /posts?take=2&where__id__more_than=4   -> [5]     next: null
//! ```

use tracing::{debug, instrument};
use url::Url;

use crate::error::StorageResult;
use crate::models::{Record, Resource};
use crate::ports::{CursorInfo, CursorResult, RecordRepository};
use crate::query::key::{self, FilterInstruction};
use crate::query::request::TAKE_PARAM;
use crate::query::{OrderDirection, Overrides, PaginationRequest, QuerySpec};

/// Lower id bound carried by ascending continuations.
pub const ID_AFTER_PARAM: &str = "where__id__more_than";
/// Upper id bound carried by descending continuations.
pub const ID_BEFORE_PARAM: &str = "where__id__less_than";

/// Cursor strategy: bounded fetch plus an id-bound continuation URL.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    public_url: Url,
}

impl CursorPaginator {
    /// `public_url` is the externally visible origin (and optional path
    /// prefix) continuation URLs are built on.
    pub fn new(public_url: Url) -> Self {
        Self { public_url }
    }

    /// Fetch one window.
    ///
    /// A following window is presumed iff the fetch returned exactly
    /// `limit` records. When the data ends on a full window, the
    /// continuation yields an empty final window.
    #[instrument(skip_all, fields(resource = R::NAME, limit = spec.limit(), path = %path))]
    pub async fn paginate<R: Resource>(
        &self,
        spec: &QuerySpec,
        request: &PaginationRequest,
        repository: &dyn RecordRepository<R>,
        overrides: &Overrides,
        path: &str,
    ) -> StorageResult<CursorResult<R>> {
        let data = repository.find(spec).await?;

        let full_window = spec.limit() > 0 && data.len() == spec.limit() as usize;
        let anchor = data.last().filter(|_| full_window).map(Record::id);
        let next = anchor.map(|id| self.next_url(request, overrides, path, id).to_string());

        debug!(returned = data.len(), after = ?anchor, "Cursor window fetched");

        Ok(CursorResult {
            count: data.len(),
            data,
            cursor: CursorInfo { after: anchor },
            next,
        })
    }

    /// Build the continuation URL for a window ending at `anchor_id`.
    ///
    /// Every request parameter is copied in arrival order except the two id
    /// bounds and filters on fields pinned by `overrides`, then `take`, then
    /// exactly one id bound: the lower bound for `order__createdAt=ASC`, the
    /// upper bound otherwise.
    pub fn next_url(
        &self,
        request: &PaginationRequest,
        overrides: &Overrides,
        path: &str,
        anchor_id: i64,
    ) -> Url {
        let mut url = self.public_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url.set_query(None);
        url.set_fragment(None);

        let bound = match request.created_at_direction() {
            OrderDirection::Asc => ID_AFTER_PARAM,
            OrderDirection::Desc => ID_BEFORE_PARAM,
        };

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in request.params() {
                let id_bound = key == ID_AFTER_PARAM || key == ID_BEFORE_PARAM;
                if id_bound || pinned(key, value, overrides) {
                    continue;
                }
                query.append_pair(key, value);
            }
            query.append_pair(TAKE_PARAM, &request.take().to_string());
            query.append_pair(bound, &anchor_id.to_string());
        }

        url
    }
}

/// A `where__` filter on a field the route fixes.
fn pinned(key: &str, value: &str, overrides: &Overrides) -> bool {
    matches!(
        key::parse(key, value),
        Ok(FilterInstruction::Where { field, .. }) if overrides.pins(field)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn paginator(base: &str) -> CursorPaginator {
        CursorPaginator::new(Url::parse(base).unwrap())
    }

    #[test]
    fn test_next_url_ascending_swaps_bound() {
        let request = PaginationRequest::from_pairs([
            ("where__id__more_than", "2"),
            ("where__title__i_like", "rust"),
            ("take", "2"),
        ])
        .unwrap();

        let url = paginator("http://localhost:3000").next_url(&request, &Overrides::new(), "posts", 4);
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/posts?where__title__i_like=rust&order__createdAt=ASC&take=2&where__id__more_than=4"
        );
    }

    // Test critique: en DESC la borne haute descend, la borne basse disparaît
    #[test]
    fn test_next_url_descending_uses_upper_bound() {
        let request = PaginationRequest::from_pairs([
            ("order__createdAt", "DESC"),
            ("where__id__less_than", "10"),
            ("where__id__more_than", "1"),
        ])
        .unwrap();

        let url = paginator("https://api.example.com").next_url(
            &request,
            &Overrides::new(),
            "/chats/3/messages",
            8,
        );
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(url.path(), "/chats/3/messages");
        assert_eq!(
            pairs,
            vec![
                ("order__createdAt".into(), "DESC".into()),
                ("take".into(), "20".into()),
                ("where__id__less_than".into(), "8".into()),
            ]
        );
    }

    #[test]
    fn test_next_url_keeps_base_path_prefix() {
        let request = PaginationRequest::from_pairs([("take", "5")]).unwrap();
        let url = paginator("https://example.com/api/v1/?stale=1").next_url(
            &request,
            &Overrides::new(),
            "posts",
            1,
        );
        assert_eq!(url.path(), "/api/v1/posts");
        assert!(!url.as_str().contains("stale"));
    }

    // Test critique: un filtre sur un champ fixé par la route ne ressort pas dans next
    #[test]
    fn test_next_url_drops_pinned_filters() {
        let request = PaginationRequest::from_pairs([
            ("where__postId", "9"),
            ("where__postId__more_than", "2"),
            ("where__likeCount__more_than", "1"),
            ("take", "2"),
        ])
        .unwrap();
        let overrides = Overrides::new().equal("postId", FieldValue::Integer(1));

        let url = paginator("http://localhost:3000").next_url(
            &request,
            &overrides,
            "posts/1/comments",
            6,
        );
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/posts/1/comments?where__likeCount__more_than=1&order__createdAt=ASC&take=2&where__id__more_than=6"
        );
    }
}
