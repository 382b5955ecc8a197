//! Strict encoding and decoding of diet plans.
//!
//! Decoding fails closed: a payload that is not a complete, well-formed plan
//! is rejected instead of being partially rendered. Checks beyond the JSON
//! shape:
//! - The plan name is not blank.
//! - Every meal has a non-blank name.
//! - Meal names are unique (they identify meals in list rendering).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::DietPlan;

/// Errors that can occur while decoding a plan.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plan name is blank")]
    BlankPlanName,

    #[error("meal #{0} has a blank name")]
    BlankMealName(usize),

    #[error("duplicate meal name: {0:?}")]
    DuplicateMealName(String),
}

/// Response envelope of the generation service: `{"data": <plan>}`.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Serialize a plan for the durable store.
pub fn encode(plan: &DietPlan) -> Result<String, CodecError> {
    Ok(serde_json::to_string(plan)?)
}

/// Decode a stored blob into a validated plan.
pub fn decode(blob: &str) -> Result<DietPlan, CodecError> {
    let plan: DietPlan = serde_json::from_str(blob)?;
    validate(&plan)?;
    Ok(plan)
}

/// Decode a generation service response body into a validated plan.
pub fn decode_response(body: &[u8]) -> Result<DietPlan, CodecError> {
    let envelope: Envelope<DietPlan> = serde_json::from_slice(body)?;
    validate(&envelope.data)?;
    Ok(envelope.data)
}

/// Validate the decoded plan structure.
pub fn validate(plan: &DietPlan) -> Result<(), CodecError> {
    if plan.name.trim().is_empty() {
        return Err(CodecError::BlankPlanName);
    }

    let mut seen = HashSet::new();
    for (idx, meal) in plan.meals.iter().enumerate() {
        if meal.name.trim().is_empty() {
            return Err(CodecError::BlankMealName(idx));
        }
        if !seen.insert(meal.name.as_str()) {
            return Err(CodecError::DuplicateMealName(meal.name.clone()));
        }
    }

    Ok(())
}
