//! Plan cache: the current-plan slot, its precedence rules, and the
//! controller that drives it.

pub mod controller;
pub mod slot;

pub use controller::{FetchOutcome, LoadOutcome, PlanCacheController};
pub use slot::{CacheSlot, CacheState, PlanSource, PlanView};
