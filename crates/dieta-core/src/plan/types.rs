//! Diet plan types.
//!
//! These types map directly to the JSON the generation service returns and
//! the blob kept in the durable store. Field names on the wire follow the
//! service (`nome`, `objetivo`, `refeicoes`, ...); Rust names are English.

use serde::{Deserialize, Serialize};

/// A generated diet recommendation for one user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietPlan {
    /// Plan name (the service uses the person's name).
    #[serde(rename = "nome")]
    pub name: String,
    /// Objective label, e.g. "Perder peso".
    #[serde(rename = "objetivo")]
    pub objective: String,
    /// Meals in the order they are eaten.
    #[serde(rename = "refeicoes")]
    pub meals: Vec<Meal>,
    /// Supplement tips, in the order given by the service.
    #[serde(rename = "suplementos")]
    pub supplements: Vec<String>,
}

/// A single meal within a [`DietPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    /// Meal name. Unique within a plan.
    #[serde(rename = "nome")]
    pub name: String,
    /// Time-of-day label, e.g. "08:00".
    #[serde(rename = "horario")]
    pub time: String,
    /// Food items, in serving order.
    #[serde(rename = "alimentos")]
    pub foods: Vec<String>,
}
