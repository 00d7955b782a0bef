//! Port trait for record repositories.
//!
//! This trait defines the read interface used by the pagination engine.
//! Implementations live in the infrastructure layer (e.g., `sift-storage`).

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::{Comment, Message, Post, Resource};
use crate::query::{Filter, QuerySpec};

/// Read access to one resource type.
///
/// The engine assumes nothing about the schema beyond the resource's field
/// table and the `id`/`createdAt` identity.
#[async_trait]
pub trait RecordRepository<T: Resource>: Send + Sync {
    /// Count rows matching a filter.
    async fn count(&self, filter: &Filter) -> StorageResult<u64>;

    /// Fetch rows matching the spec's filter, sorted and windowed.
    async fn find(&self, spec: &QuerySpec) -> StorageResult<Vec<T>>;

    /// Fetch a window together with the unwindowed match count.
    ///
    /// The default issues a count then a fetch. Stores that can answer both
    /// in one round trip should override it.
    async fn find_and_count(&self, spec: &QuerySpec) -> StorageResult<(Vec<T>, u64)> {
        let total = self.count(spec.filter()).await?;
        let data = self.find(spec).await?;
        Ok((data, total))
    }
}

// =============================================================================
// Composite Repository
// =============================================================================

/// Combined repository access for every listable resource.
#[async_trait]
pub trait Repositories: Send + Sync {
    /// Access the post repository.
    fn posts(&self) -> &dyn RecordRepository<Post>;

    /// Access the comment repository.
    fn comments(&self) -> &dyn RecordRepository<Comment>;

    /// Access the chat message repository.
    fn messages(&self) -> &dyn RecordRepository<Message>;

    /// Whether the backing store can currently serve requests.
    async fn is_healthy(&self) -> bool {
        true
    }
}
