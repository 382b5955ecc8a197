//! [`PlanStore`] backed by the `kv_blobs` table.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use dieta_db::queries::blobs;

use super::PlanStore;

/// SQLite-backed store. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct SqlitePlanStore {
    pool: SqlitePool,
}

impl SqlitePlanStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for SqlitePlanStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let blob = blobs::get_blob(&self.pool, key).await?;
        Ok(blob.map(|b| b.value))
    }

    async fn set(&self, key: &str, blob: &str) -> Result<()> {
        let stored = blobs::put_blob(&self.pool, key, blob).await?;
        debug!(key, updated_at = %stored.updated_at, "blob stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let removed = blobs::delete_blob(&self.pool, key).await?;
        debug!(key, removed, "blob deleted");
        Ok(())
    }
}
