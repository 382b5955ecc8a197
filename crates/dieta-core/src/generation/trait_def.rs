//! The `GenerationClient` trait -- the adapter interface for plan sources.
//!
//! The trait is object-safe so the controller can hold an
//! `Arc<dyn GenerationClient>` chosen at startup.

use anyhow::Result;
use async_trait::async_trait;

use crate::plan::{DietPlan, UserProfile};

/// Produces a diet plan for a profile.
///
/// Implementations issue a single attempt per call. Any transport failure,
/// non-success response, or malformed payload is an `Err`; a returned plan
/// is always fully populated.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Human-readable name for logs (e.g. "http").
    fn name(&self) -> &str;

    /// Request a plan for `profile`.
    async fn generate(&self, profile: &UserProfile) -> Result<DietPlan>;
}

// Compile-time assertion: GenerationClient must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn GenerationClient) {}
};
