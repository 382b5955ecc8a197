//! Core of the dieta client: diet plan types, the plan cache controller, and
//! the adapters it talks to (durable store, remote generation service).

pub mod cache;
pub mod error;
pub mod generation;
pub mod plan;
pub mod store;

pub use cache::{CacheSlot, FetchOutcome, LoadOutcome, PlanCacheController, PlanSource, PlanView};
pub use error::PlanError;
pub use plan::{DietPlan, Meal, UserProfile};
