//! Database query functions for the `kv_blobs` table.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::StoredBlob;

/// Fetch the blob stored under `key`.
pub async fn get_blob(pool: &SqlitePool, key: &str) -> Result<Option<StoredBlob>> {
    let blob = sqlx::query_as::<_, StoredBlob>("SELECT * FROM kv_blobs WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to fetch blob {key:?}"))?;

    Ok(blob)
}

/// Insert or replace the blob stored under `key`. Returns the stored row.
pub async fn put_blob(pool: &SqlitePool, key: &str, value: &str) -> Result<StoredBlob> {
    let blob = sqlx::query_as::<_, StoredBlob>(
        "INSERT INTO kv_blobs (key, value, updated_at) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (key) DO UPDATE \
         SET value = excluded.value, updated_at = excluded.updated_at \
         RETURNING *",
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to store blob {key:?}"))?;

    Ok(blob)
}

/// Delete the blob stored under `key`.
///
/// Returns `true` if a row was removed. Deleting an absent key is not an
/// error.
pub async fn delete_blob(pool: &SqlitePool, key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM kv_blobs WHERE key = $1")
        .bind(key)
        .execute(pool)
        .await
        .with_context(|| format!("failed to delete blob {key:?}"))?;

    Ok(result.rows_affected() > 0)
}
