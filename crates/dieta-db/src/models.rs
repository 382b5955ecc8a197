use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row in the `kv_blobs` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StoredBlob {
    pub key: String,
    /// Serialized payload. Opaque to the database layer.
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
