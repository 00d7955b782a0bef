//! Pagination entry point.

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{PaginationError, PaginationResult, QueryError};
use crate::metrics::{FetchTimer, record_pagination, record_rejected_query, record_store_error};
use crate::models::Resource;
use crate::ports::{Paginated, RecordRepository};
use crate::query::{OperatorRegistry, Overrides, PaginationRequest, QuerySpec, RequestLimits};

use super::cursor::CursorPaginator;
use super::page::PagePaginator;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the pagination engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Externally visible base URL continuation links are built on.
    pub public_url: Url,
    /// Page-size bounds.
    pub limits: RequestLimits,
}

impl EngineConfig {
    pub fn new(public_url: Url) -> Self {
        Self {
            public_url,
            limits: RequestLimits::default(),
        }
    }

    /// Build from a protocol (`http`/`https`) and a host with optional port.
    pub fn from_protocol_and_host(protocol: &str, host: &str) -> Result<Self, url::ParseError> {
        Url::parse(&format!("{}://{}", protocol, host)).map(Self::new)
    }
}

// =============================================================================
// PaginationEngine
// =============================================================================

/// Selects page or cursor pagination for a request and runs it.
///
/// # Flow
///
/// 1. Fold the request (plus caller overrides) into a [`QuerySpec`]
/// 2. `page` present: count + windowed fetch, returns `{data, total}`
/// 3. otherwise: bounded keyset fetch, returns `{data, cursor, count, next}`
///
/// The engine holds no per-request state and is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PaginationEngine {
    limits: RequestLimits,
    registry: Arc<OperatorRegistry>,
    page: PagePaginator,
    cursor: CursorPaginator,
}

impl PaginationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            limits: config.limits,
            registry: Arc::new(OperatorRegistry::standard()),
            page: PagePaginator,
            cursor: CursorPaginator::new(config.public_url),
        }
    }

    /// Replace the operator registry.
    pub fn with_registry(mut self, registry: Arc<OperatorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn limits(&self) -> RequestLimits {
        self.limits
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Parse raw query pairs with this engine's limits.
    pub fn parse_request<I, K, V>(&self, pairs: I) -> PaginationResult<PaginationRequest>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        PaginationRequest::parse(pairs, self.limits).map_err(rejected)
    }

    /// Paginate `repository` according to `request`.
    ///
    /// `overrides` are fixed predicates that user filters cannot replace.
    /// `path` is the resource path continuation URLs point at
    /// (e.g. `posts/7/comments`).
    #[instrument(skip_all, fields(resource = R::NAME, path = %path))]
    pub async fn paginate<R: Resource>(
        &self,
        request: &PaginationRequest,
        repository: &dyn RecordRepository<R>,
        overrides: &Overrides,
        path: &str,
    ) -> PaginationResult<Paginated<R>> {
        let spec = QuerySpec::build::<R>(request, overrides, &self.registry).map_err(rejected)?;

        debug!(
            predicates = spec.filter().len(),
            limit = spec.limit(),
            page = ?request.page(),
            "Query spec built"
        );

        let result = {
            let _timer = FetchTimer::new();
            if request.page().is_some() {
                self.page.paginate(&spec, repository).await.map(Paginated::Page)
            } else {
                self.cursor
                    .paginate(&spec, request, repository, overrides, path)
                    .await
                    .map(Paginated::Cursor)
            }
        };

        let result = result.map_err(|e| {
            record_store_error(R::NAME);
            warn!(error = %e, "Store failed during pagination");
            PaginationError::from(e)
        })?;

        record_pagination(result.mode(), R::NAME);
        Ok(result)
    }
}

fn rejected(err: QueryError) -> PaginationError {
    record_rejected_query(err.kind());
    debug!(error = %err, "Query rejected");
    PaginationError::Query(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};

    use crate::error::{StorageError, StorageResult};
    use crate::models::{Post, Resource};
    use crate::query::Filter;

    struct MockRepository {
        posts: Vec<Post>,
        fail: bool,
    }

    #[async_trait]
    impl RecordRepository<Post> for MockRepository {
        async fn count(&self, filter: &Filter) -> StorageResult<u64> {
            if self.fail {
                return Err(StorageError::QueryError("boom".into()));
            }
            Ok(self.posts.iter().filter(|p| filter.matches(*p)).count() as u64)
        }

        async fn find(&self, spec: &QuerySpec) -> StorageResult<Vec<Post>> {
            if self.fail {
                return Err(StorageError::QueryError("boom".into()));
            }
            Ok(spec.apply(&self.posts))
        }
    }

    fn post(id: i64, title: &str) -> Post {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(id);
        Post {
            id,
            created_at: created,
            updated_at: created,
            author_id: 1,
            title: title.into(),
            content: String::new(),
            like_count: id * 10,
            comment_count: 0,
        }
    }

    fn repo() -> MockRepository {
        MockRepository {
            posts: (1..=5).map(|id| post(id, &format!("post {id}"))).collect(),
            fail: false,
        }
    }

    fn engine() -> PaginationEngine {
        PaginationEngine::new(EngineConfig::new(Url::parse("http://localhost:3000").unwrap()))
    }

    async fn run(pairs: &[(&str, &str)], repository: &MockRepository) -> PaginationResult<Paginated<Post>> {
        let engine = engine();
        let request = engine.parse_request(pairs.iter().copied())?;
        engine.paginate(&request, repository, &Overrides::new(), "posts").await
    }

    fn ids(result: &Paginated<Post>) -> Vec<i64> {
        result.data().iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_page_param_selects_page_mode() {
        let result = run(&[("page", "2"), ("take", "2")], &repo()).await.unwrap();
        assert_eq!(result.mode(), "page");
        assert_eq!(ids(&result), vec![3, 4]);
        assert_eq!(result.into_page().unwrap().total, 5);
    }

    #[tokio::test]
    async fn test_cursor_mode_by_default() {
        let result = run(&[("take", "2")], &repo()).await.unwrap();
        let cursor = result.into_cursor().unwrap();
        assert_eq!(cursor.cursor.after, Some(2));
        assert_eq!(cursor.count, 2);
        assert!(cursor.next.unwrap().contains("where__id__more_than=2"));
    }

    // Test critique: une page exactement pleine produit une continuation vers une page vide
    #[tokio::test]
    async fn test_full_last_window_yields_empty_terminal_page() {
        let first = run(&[("take", "5")], &repo()).await.unwrap();
        let next = first.into_cursor().unwrap().next.unwrap();
        assert!(next.ends_with("where__id__more_than=5"));

        let last = run(&[("take", "5"), ("where__id__more_than", "5")], &repo())
            .await
            .unwrap()
            .into_cursor()
            .unwrap();
        assert!(last.data.is_empty());
        assert_eq!(last.cursor.after, None);
        assert_eq!(last.next, None);
    }

    #[tokio::test]
    async fn test_descending_walks_down() {
        let result = run(&[("take", "2"), ("order__createdAt", "DESC")], &repo())
            .await
            .unwrap();
        assert_eq!(ids(&result), vec![5, 4]);
        let next = result.into_cursor().unwrap().next.unwrap();
        assert!(next.contains("where__id__less_than=4"));
        assert!(!next.contains("more_than"));
    }

    #[tokio::test]
    async fn test_client_error_is_rejected_before_store() {
        let failing = MockRepository {
            fail: true,
            ..repo()
        };
        let err = run(&[("where__id__more__than", "1")], &failing).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let failing = MockRepository {
            fail: true,
            ..repo()
        };
        for pairs in [&[("page", "1")][..], &[][..]] {
            let err = run(pairs, &failing).await.unwrap_err();
            assert!(matches!(err, PaginationError::Storage(_)));
        }
    }

    #[test]
    fn test_config_from_protocol_and_host() {
        let config = EngineConfig::from_protocol_and_host("https", "api.example.com:8443").unwrap();
        assert_eq!(config.public_url.as_str(), "https://api.example.com:8443/");
        assert_eq!(Post::NAME, "posts");
    }
}
