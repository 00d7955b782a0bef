//! PostgreSQL storage adapter.
//!
//! This module implements the repository traits defined in `sift-core`
//! using PostgreSQL as the backing store.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool and migrations
//! - [`PgRepositories`] - Composite repository implementing `Repositories` trait
//! - [`PgRecordRepository`] - One generic repository per resource table
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::for_api(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let repositories = PgRepositories::new(&db);
//! ```

mod database;
mod record_repo;
mod rows;
mod sql;

pub use database::{Database, DatabaseConfig};
pub use record_repo::PgRecordRepository;
pub use rows::{CommentRow, MessageRow, PgResource, PostRow};

use async_trait::async_trait;

use sift_core::models::{Comment, Message, Post};
use sift_core::ports::{RecordRepository, Repositories};

// =============================================================================
// Composite Repository
// =============================================================================

/// Aggregated PostgreSQL repositories implementing the `Repositories` trait.
pub struct PgRepositories {
    db: Database,
    posts: PgRecordRepository<Post>,
    comments: PgRecordRepository<Comment>,
    messages: PgRecordRepository<Message>,
}

impl PgRepositories {
    /// Create a new repository aggregate from a database connection.
    pub fn new(db: &Database) -> Self {
        Self {
            posts: PgRecordRepository::new(db),
            comments: PgRecordRepository::new(db),
            messages: PgRecordRepository::new(db),
            db: db.clone(),
        }
    }
}

#[async_trait]
impl Repositories for PgRepositories {
    fn posts(&self) -> &dyn RecordRepository<Post> {
        &self.posts
    }

    fn comments(&self) -> &dyn RecordRepository<Comment> {
        &self.comments
    }

    fn messages(&self) -> &dyn RecordRepository<Message> {
        &self.messages
    }

    async fn is_healthy(&self) -> bool {
        self.db.is_healthy().await
    }
}
