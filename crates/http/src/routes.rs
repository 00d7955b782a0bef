//! List endpoints.
//!
//! ```text
//! GET /posts                          all posts
//! GET /posts/{post_id}/comments       comments of one post
//! GET /chats/{chat_id}/messages       messages of one chat
//! GET /health                         store reachability
//! ```
//!
//! Query pairs are forwarded to the engine in arrival order. Nested routes
//! pin their parent id with an override, so `where__postId` in the query
//! string cannot widen the result.

use std::sync::Arc;

use axum::extract::rejection::PathRejection;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::routing::get;
use axum::{Json, Router};

use sift_core::models::{Comment, FieldValue, Message, Post, Resource};
use sift_core::pagination::PaginationEngine;
use sift_core::ports::{Paginated, RecordRepository, Repositories};
use sift_core::query::Overrides;

use crate::error::ApiError;

/// Raw query pairs, in arrival order.
type QueryPairs = Query<Vec<(String, String)>>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<PaginationEngine>,
    repositories: Arc<dyn Repositories>,
}

impl AppState {
    pub fn new(engine: Arc<PaginationEngine>, repositories: Arc<dyn Repositories>) -> Self {
        Self {
            engine,
            repositories,
        }
    }
}

/// Router with every list endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/{post_id}/comments", get(list_comments))
        .route("/chats/{chat_id}/messages", get(list_messages))
        .route("/health", get(health_check))
        .with_state(state)
}

/// `200 OK` while the store answers, `503` otherwise.
async fn health_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if state.repositories.is_healthy().await {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
    }
}

async fn list_posts(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(pairs): QueryPairs,
) -> Result<Json<Paginated<Post>>, ApiError> {
    paginate(
        &state.engine,
        state.repositories.posts(),
        pairs,
        &Overrides::new(),
        "posts",
        uri.to_string(),
    )
    .await
}

async fn list_comments(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    post_id: Result<Path<i64>, PathRejection>,
    Query(pairs): QueryPairs,
) -> Result<Json<Paginated<Comment>>, ApiError> {
    let post_id = path_id(post_id, &uri)?;
    paginate(
        &state.engine,
        state.repositories.comments(),
        pairs,
        &Overrides::new().equal("postId", FieldValue::Integer(post_id)),
        &format!("posts/{}/comments", post_id),
        uri.to_string(),
    )
    .await
}

async fn list_messages(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    chat_id: Result<Path<i64>, PathRejection>,
    Query(pairs): QueryPairs,
) -> Result<Json<Paginated<Message>>, ApiError> {
    let chat_id = path_id(chat_id, &uri)?;
    paginate(
        &state.engine,
        state.repositories.messages(),
        pairs,
        &Overrides::new().equal("chatId", FieldValue::Integer(chat_id)),
        &format!("chats/{}/messages", chat_id),
        uri.to_string(),
    )
    .await
}

/// Unwrap a parent id, reporting a bad segment with the JSON error body.
fn path_id(path: Result<Path<i64>, PathRejection>, uri: &Uri) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        ApiError::new(rejection.status(), rejection.body_text(), uri.to_string())
    })
}

async fn paginate<R: Resource>(
    engine: &PaginationEngine,
    repository: &dyn RecordRepository<R>,
    pairs: Vec<(String, String)>,
    overrides: &Overrides,
    path: &str,
    request_path: String,
) -> Result<Json<Paginated<R>>, ApiError> {
    let request = engine
        .parse_request(pairs)
        .map_err(|e| ApiError::from_pagination(e, request_path.clone()))?;

    engine
        .paginate(&request, repository, overrides, path)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_pagination(e, request_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;
    use chrono::{TimeZone, Utc};
    use sift_core::pagination::EngineConfig;
    use sift_storage::MemoryRepositories;
    use url::Url;

    async fn state() -> AppState {
        let engine = PaginationEngine::new(EngineConfig::new(
            Url::parse("https://api.example.com").unwrap(),
        ));
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        AppState::new(
            Arc::new(engine),
            Arc::new(MemoryRepositories::demo(start).await),
        )
    }

    fn query(pairs: &[(&str, &str)]) -> QueryPairs {
        Query(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn uri(raw: &'static str) -> OriginalUri {
        OriginalUri(Uri::from_static(raw))
    }

    #[tokio::test]
    async fn test_list_posts_cursor_mode() {
        let Json(result) = list_posts(
            State(state().await),
            uri("/posts?take=5"),
            query(&[("take", "5")]),
        )
        .await
        .unwrap();

        let cursor = result.into_cursor().unwrap();
        assert_eq!(cursor.count, 5);
        assert_eq!(
            cursor.next.as_deref(),
            Some("https://api.example.com/posts?order__createdAt=ASC&take=5&where__id__more_than=5")
        );
    }

    #[tokio::test]
    async fn test_list_comments_pinned_to_post() {
        let Json(result) = list_comments(
            State(state().await),
            uri("/posts/2/comments?page=1&where__postId=1"),
            Ok(Path(2)),
            query(&[("page", "1"), ("where__postId", "1")]),
        )
        .await
        .unwrap();

        let page = result.into_page().unwrap();
        assert_eq!(page.total, 3);
        assert!(page.data.iter().all(|c| c.post_id == 2));
    }

    #[tokio::test]
    async fn test_list_messages_descending() {
        let Json(result) = list_messages(
            State(state().await),
            uri("/chats/1/messages?take=2&order__createdAt=DESC"),
            Ok(Path(1)),
            query(&[("take", "2"), ("order__createdAt", "DESC")]),
        )
        .await
        .unwrap();

        let cursor = result.into_cursor().unwrap();
        assert!(cursor.data.iter().all(|m| m.chat_id == 1));
        assert!(cursor.data[0].id > cursor.data[1].id);
        let next = cursor.next.unwrap();
        assert!(next.starts_with("https://api.example.com/chats/1/messages?"));
        assert!(next.ends_with(&format!("where__id__less_than={}", cursor.data[1].id)));
    }

    // Test critique: une clé invalide renvoie 400 avec le corps JSON attendu
    #[tokio::test]
    async fn test_rejected_query_is_400_json() {
        let err = list_posts(
            State(state().await),
            uri("/posts?where__title__more_than=a"),
            query(&[("where__title__more_than", "a")]),
        )
        .await
        .unwrap_err();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["path"], "/posts?where__title__more_than=a");
        assert!(body["message"].as_str().unwrap().contains("title"));
    }
}
