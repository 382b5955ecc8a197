//! Errors surfaced by the plan cache and its collaborators.

use thiserror::Error;

/// Failure kinds of plan cache operations.
///
/// Adapter errors are flattened to their rendered message so the error can be
/// cloned into the observable cache state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The caller supplied an incomplete profile. Raised before any I/O.
    #[error("invalid profile: {0}")]
    InvalidInput(String),

    /// The generation service errored or returned a malformed plan.
    #[error("failed to generate diet plan: {0}")]
    FetchFailed(String),

    /// The saved plan could not be read or decoded.
    #[error("failed to read saved diet plan: {0}")]
    StoreReadFailed(String),

    /// The store rejected a write or delete.
    #[error("failed to save diet plan: {0}")]
    StoreWriteFailed(String),

    /// No plan is available to export or display.
    #[error("no diet plan available")]
    EmptyPlan,
}

impl PlanError {
    pub(crate) fn fetch(err: &anyhow::Error) -> Self {
        Self::FetchFailed(format!("{err:#}"))
    }

    pub(crate) fn store_read(err: &anyhow::Error) -> Self {
        Self::StoreReadFailed(format!("{err:#}"))
    }

    pub(crate) fn store_write(err: &anyhow::Error) -> Self {
        Self::StoreWriteFailed(format!("{err:#}"))
    }
}
