//! Offset pagination.

use tracing::{debug, instrument};

use crate::error::StorageResult;
use crate::models::Resource;
use crate::ports::{PageResult, RecordRepository};
use crate::query::QuerySpec;

/// Page-number strategy: one count plus one windowed fetch.
///
/// Correct while rows are not inserted or deleted between page requests;
/// concurrent writes shift offsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct PagePaginator;

impl PagePaginator {
    #[instrument(skip_all, fields(resource = R::NAME, limit = spec.limit(), offset = ?spec.offset()))]
    pub async fn paginate<R: Resource>(
        &self,
        spec: &QuerySpec,
        repository: &dyn RecordRepository<R>,
    ) -> StorageResult<PageResult<R>> {
        let (data, total) = repository.find_and_count(spec).await?;

        debug!(returned = data.len(), total, "Page fetched");

        Ok(PageResult { data, total })
    }
}
