//! Storage layer for sift.
//!
//! This crate provides implementations of the repository traits defined in
//! `sift-core`: a PostgreSQL adapter for production and an in-memory adapter
//! that evaluates query specs directly, used for demos and tests.
//!
//! # Architecture
//!
//! - [`postgres::Database`] - Connection pool management and migrations
//! - [`postgres::PgRepositories`] - Composite repository over the SQL tables
//! - [`memory::MemoryRepositories`] - Composite repository held in memory
//!
//! # Usage
//!
//! ```ignore
//! use sift_storage::{Database, DatabaseConfig, PgRepositories};
//!
//! // Connect to the database
//! let config = DatabaseConfig::for_api(&database_url);
//! let db = Database::connect(&config).await?;
//!
//! // Run migrations
//! db.migrate().await?;
//!
//! // Create repositories
//! let repositories = Arc::new(PgRepositories::new(&db));
//! ```

pub mod memory;
pub mod postgres;

pub use memory::{MemoryRepositories, MemoryRepository};
pub use postgres::{Database, DatabaseConfig, PgRepositories};
