//! In-memory repository adapter.
//!
//! Evaluates a [`QuerySpec`] directly over a vector of records, with the
//! same semantics as the SQL rendering: predicates are ANDed, sort keys are
//! applied in order, then the window is cut.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use sift_core::error::StorageResult;
use sift_core::models::{Comment, Message, Post, Record, Resource};
use sift_core::ports::{RecordRepository, Repositories};
use sift_core::query::{Filter, QuerySpec};

/// Vector-backed repository for one resource.
pub struct MemoryRepository<T> {
    records: RwLock<Vec<T>>,
}

impl<T: Resource> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn from_records(records: Vec<T>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Insert a record built from the next free id.
    ///
    /// Ids are assigned monotonically, so inserting in creation order keeps
    /// id order and `createdAt` order aligned.
    pub async fn insert_with<F>(&self, build: F) -> T
    where
        F: FnOnce(i64) -> T,
    {
        let mut records = self.records.write().await;
        let next_id = records.iter().map(Record::id).max().unwrap_or(0) + 1;
        let record = build(next_id);
        records.push(record.clone());
        record
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl<T: Resource> RecordRepository<T> for MemoryRepository<T> {
    async fn count(&self, filter: &Filter) -> StorageResult<u64> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(*r)).count() as u64)
    }

    async fn find(&self, spec: &QuerySpec) -> StorageResult<Vec<T>> {
        let records = self.records.read().await;
        Ok(spec.apply(&records))
    }
}

// =============================================================================
// Composite Repository
// =============================================================================

/// In-memory repositories for every listable resource.
#[derive(Default)]
pub struct MemoryRepositories {
    pub posts: MemoryRepository<Post>,
    pub comments: MemoryRepository<Comment>,
    pub messages: MemoryRepository<Message>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a small deterministic dataset, one minute between records,
    /// starting at `start`.
    ///
    /// 12 posts by 3 authors, 3 comments on each of the first 4 posts and
    /// two chats with 5 messages each.
    pub async fn demo(start: DateTime<Utc>) -> Self {
        let repositories = Self::new();
        let mut clock = start;
        let mut tick = || {
            clock += Duration::minutes(1);
            clock
        };

        for n in 1..=12_i64 {
            let at = tick();
            let topic = if n % 2 == 0 { "Rust" } else { "Postgres" };
            repositories
                .posts
                .insert_with(|id| Post {
                    id,
                    created_at: at,
                    updated_at: at,
                    author_id: n % 3 + 1,
                    title: format!("{} notes #{}", topic, n),
                    content: format!("Body of post {}", n),
                    like_count: n * 3 % 7,
                    comment_count: if n <= 4 { 3 } else { 0 },
                })
                .await;
        }

        for post_id in 1..=4_i64 {
            for n in 1..=3_i64 {
                let at = tick();
                repositories
                    .comments
                    .insert_with(|id| Comment {
                        id,
                        created_at: at,
                        updated_at: at,
                        post_id,
                        author_id: n,
                        comment: format!("Comment {} on post {}", n, post_id),
                        like_count: n - 1,
                    })
                    .await;
            }
        }

        for chat_id in 1..=2_i64 {
            for n in 1..=5_i64 {
                let at = tick();
                repositories
                    .messages
                    .insert_with(|id| Message {
                        id,
                        created_at: at,
                        updated_at: at,
                        chat_id,
                        author_id: n % 2 + 1,
                        message: format!("Message {} in chat {}", n, chat_id),
                    })
                    .await;
            }
        }

        debug!(
            posts = repositories.posts.len().await,
            comments = repositories.comments.len().await,
            messages = repositories.messages.len().await,
            "Seeded in-memory dataset"
        );

        repositories
    }
}

#[async_trait]
impl Repositories for MemoryRepositories {
    fn posts(&self) -> &dyn RecordRepository<Post> {
        &self.posts
    }

    fn comments(&self) -> &dyn RecordRepository<Comment> {
        &self.comments
    }

    fn messages(&self) -> &dyn RecordRepository<Message> {
        &self.messages
    }
}
