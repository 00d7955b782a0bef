//! JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use sift_core::error::PaginationError;

/// Body returned for every failed list request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Request path and query string.
    pub path: String,
}

/// Error returned by list handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    path: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            path: path.into(),
        }
    }

    /// Map a pagination failure: rejected queries are the caller's fault,
    /// store failures are ours and their details stay in the logs.
    pub fn from_pagination(err: PaginationError, path: impl Into<String>) -> Self {
        let path = path.into();
        match err {
            PaginationError::Query(query) => {
                Self::new(StatusCode::BAD_REQUEST, query.to_string(), path)
            }
            PaginationError::Storage(storage) => {
                error!(error = %storage, path = %path, "List request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", path)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn body(&self) -> ErrorBody {
        ErrorBody {
            status_code: self.status.as_u16(),
            message: self.message.clone(),
            timestamp: Utc::now(),
            path: self.path.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::error::{QueryError, StorageError};

    #[test]
    fn test_query_error_is_bad_request() {
        let err = PaginationError::Query(QueryError::UnknownField {
            field: "nope".into(),
        });
        let api = ApiError::from_pagination(err, "/posts?where__nope=1");
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.message(), "Unknown field 'nope'");
    }

    // Test critique: les détails du stockage ne fuient pas vers le client
    #[test]
    fn test_storage_error_is_masked() {
        let err = PaginationError::Storage(StorageError::QueryError(
            "relation \"posts\" does not exist".into(),
        ));
        let api = ApiError::from_pagination(err, "/posts");
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message().contains("relation"));
    }

    #[test]
    fn test_body_shape() {
        let body = ApiError::new(StatusCode::BAD_REQUEST, "bad", "/posts?take=0").body();
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["statusCode"], 400);
        assert_eq!(value["message"], "bad");
        assert_eq!(value["path"], "/posts?take=0");
        assert!(value["timestamp"].is_string());
    }
}
