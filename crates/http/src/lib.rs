//! HTTP list endpoints for sift.
//!
//! Exposes posts, post comments and chat messages through the pagination
//! engine, with JSON error bodies and per-request logging.

pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, ErrorBody};
pub use routes::{AppState, router};
pub use server::{ServerConfig, app, serve_with_shutdown};
