//! Durable key/value storage for the current plan.
//!
//! The cache controller talks to storage only through [`PlanStore`], so the
//! backing store is injected once at startup:
//!
//! ```text
//! PlanCacheController
//!     |
//!     v
//! Arc<dyn PlanStore> --get/set/delete(PLAN_KEY)--> SqlitePlanStore | MemoryStore
//! ```

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use sqlite::SqlitePlanStore;

/// The fixed key the current plan is stored under.
pub const PLAN_KEY: &str = "savedDiet";

/// Blob storage that survives process restarts.
///
/// Values are opaque serialized strings; encoding is the caller's concern.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Read the blob under `key`, or `None` when nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `blob` under `key`, replacing any previous value.
    async fn set(&self, key: &str, blob: &str) -> Result<()>;

    /// Remove the blob under `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}

// Compile-time assertion: PlanStore must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanStore) {}
};
