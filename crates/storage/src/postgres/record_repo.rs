//! Generic record repository implementation for PostgreSQL.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::trace;

use sift_core::error::{StorageError, StorageResult};
use sift_core::ports::RecordRepository;
use sift_core::query::{Filter, QuerySpec};

use super::database::Database;
use super::rows::{CountedRow, PgResource};
use super::sql;

/// PostgreSQL implementation of RecordRepository for any [`PgResource`].
pub struct PgRecordRepository<T> {
    pool: PgPool,
    _resource: PhantomData<fn() -> T>,
}

impl<T: PgResource> PgRecordRepository<T> {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<T: PgResource> RecordRepository<T> for PgRecordRepository<T> {
    async fn count(&self, filter: &Filter) -> StorageResult<u64> {
        let mut builder = sql::count::<T>(filter);
        trace!(sql = builder.sql(), "Counting rows");

        let total: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(total.max(0) as u64)
    }

    async fn find(&self, spec: &QuerySpec) -> StorageResult<Vec<T>> {
        let mut builder = sql::select::<T>(spec);
        trace!(sql = builder.sql(), "Fetching rows");

        let rows: Vec<T::Row> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        rows.into_iter().map(T::from_row).collect()
    }

    /// One statement: the window plus `COUNT(*) OVER()`.
    ///
    /// An empty window past the first row carries no total, so only then
    /// is a separate COUNT issued.
    async fn find_and_count(&self, spec: &QuerySpec) -> StorageResult<(Vec<T>, u64)> {
        let mut builder = sql::select_counted::<T>(spec);
        trace!(sql = builder.sql(), "Fetching rows with total");

        let rows: Vec<CountedRow<T::Row>> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        let total = match rows.first() {
            Some(first) => first.total.max(0) as u64,
            None if spec.offset().unwrap_or(0) > 0 => self.count(spec.filter()).await?,
            None => 0,
        };

        let data = rows
            .into_iter()
            .map(|counted| T::from_row(counted.row))
            .collect::<StorageResult<Vec<T>>>()?;

        Ok((data, total))
    }
}
