//! Human-readable export of a plan, used by the share action.

use crate::error::PlanError;

use super::types::{DietPlan, Meal};

/// Render `plan` as the share text.
///
/// Fails with [`PlanError::EmptyPlan`] when there is no plan.
pub fn export_text(plan: Option<&DietPlan>) -> Result<String, PlanError> {
    plan.map(render).ok_or(PlanError::EmptyPlan)
}

/// Render a plan that is known to be present.
pub fn render(plan: &DietPlan) -> String {
    let meals = plan
        .meals
        .iter()
        .map(meal_block)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Dieta: {} - Objetivo: {}\n\n{}\n\n- Dica Suplemento: {}",
        plan.name,
        plan.objective,
        meals,
        plan.supplements.join(", ")
    )
}

fn meal_block(meal: &Meal) -> String {
    format!(
        "\n- Nome: {}\n- Horário: {}\n- Alimentos: {}",
        meal.name,
        meal.time,
        meal.foods.join(", ")
    )
}
