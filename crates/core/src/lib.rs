//! Core domain layer for sift.
//!
//! This crate contains the record capability, the query-string grammar,
//! the port traits (interfaces) and the pagination strategies shared by
//! every list endpoint. It follows hexagonal architecture principles -
//! this is the innermost layer with no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       sift (binary)                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                sift-http (list endpoints)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │          sift-storage (PostgreSQL, in-memory)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  sift-core  ← YOU ARE HERE                  │
//! │      (models, query grammar, ports, pagination)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - `Record`/`Resource` capability and the posts, comments and messages resources
//! - [`query`] - Key grammar, operator registry, query spec
//! - [`ports`] - Repository trait and result envelopes
//! - [`pagination`] - Page and cursor strategies, [`pagination::PaginationEngine`]
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Query Grammar
//!
//! ```text
//! page=2&take=10                         page mode, offset 10
//! take=10&order__createdAt=DESC          cursor mode, newest first
//! where__likeCount__more_than=5          likeCount > 5
//! where__title__i_like=rust              title ILIKE '%rust%'
//! where__authorId=3                      authorId = 3
//! ```
//!
//! # Request Lifecycle
//!
//! 1. Raw query pairs are parsed into a [`query::PaginationRequest`]
//! 2. Keys are classified, resolved against the resource's field table and
//!    folded into an immutable [`query::QuerySpec`]
//! 3. The engine runs page or cursor pagination against a
//!    [`ports::RecordRepository`]
//! 4. The caller serializes the [`ports::Paginated`] envelope

pub mod error;
pub mod metrics;
pub mod models;
pub mod pagination;
pub mod ports;
pub mod query;
