//! CLI handlers for the plan commands.
//!
//! Implements:
//! - `dieta generate`  -- request a new plan, falling back to the saved one
//! - `dieta show`      -- show the saved plan without contacting the service
//! - `dieta export`    -- write the share text to stdout or a file
//! - `dieta clear`     -- forget the current plan

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;
use sqlx::SqlitePool;
use tracing::debug;

use dieta_core::generation::HttpGenerationClient;
use dieta_core::store::SqlitePlanStore;
use dieta_core::{DietPlan, LoadOutcome, PlanCacheController, PlanSource, PlanView, UserProfile};

use crate::config::DietaConfig;

/// Shown while a fetch is outstanding and nothing else is available.
pub const LOADING_MESSAGE: &str = "Estamos gerando sua dieta!";

/// Shown when generation failed and no saved plan exists.
pub const FAILURE_MESSAGE: &str = "Falha ao gerar dieta!";

/// Profile sources for `dieta generate`.
///
/// Flags override values read from `--profile`.
#[derive(Debug, Default, Args)]
pub struct ProfileArgs {
    /// TOML file with one key per profile field
    #[arg(long)]
    pub profile: Option<PathBuf>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub age: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    /// Height in meters, e.g. 1.75
    #[arg(long)]
    pub height: Option<String>,
    /// Weight in kilograms
    #[arg(long)]
    pub weight: Option<String>,
    /// Goal, e.g. "Perder peso"
    #[arg(long)]
    pub objective: Option<String>,
    /// Activity level
    #[arg(long)]
    pub level: Option<String>,
}

impl ProfileArgs {
    /// Assemble the profile. Missing fields are left blank so validation
    /// reports all of them at once.
    pub fn into_profile(self) -> Result<UserProfile> {
        let mut profile = match &self.profile {
            Some(path) => read_profile(path)?,
            None => UserProfile::default(),
        };

        let overrides = [
            (&mut profile.name, self.name),
            (&mut profile.age, self.age),
            (&mut profile.gender, self.gender),
            (&mut profile.height, self.height),
            (&mut profile.weight, self.weight),
            (&mut profile.objective, self.objective),
            (&mut profile.level, self.level),
        ];
        for (field, value) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }

        Ok(profile)
    }
}

/// Read a profile file without validating it; validation happens once the
/// flags are merged in.
fn read_profile(path: &Path) -> Result<UserProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile file: {}", path.display()))?;
    UserProfile::from_toml(&content)
        .with_context(|| format!("failed to parse profile file: {}", path.display()))
}

// -----------------------------------------------------------------------
// Controller wiring
// -----------------------------------------------------------------------

/// Build the controller over the opened database and the configured service.
pub fn build_controller(config: &DietaConfig, pool: &SqlitePool) -> Result<PlanCacheController> {
    let client = HttpGenerationClient::new(&config.api_url, config.timeout)?;
    let store = SqlitePlanStore::new(pool.clone());
    debug!(api_url = %config.api_url, timeout = ?config.timeout, "generation client ready");
    Ok(PlanCacheController::new(Arc::new(client), Arc::new(store)))
}

// -----------------------------------------------------------------------
// dieta generate
// -----------------------------------------------------------------------

pub async fn run_generate(ctl: &PlanCacheController, args: ProfileArgs) -> Result<()> {
    let profile = args.into_profile()?;
    profile.validate()?;
    println!("{LOADING_MESSAGE}");

    let view = ctl.mount(&profile).await?;
    println!("{}", render_view(&view));

    if let PlanView::Failed(err) = view {
        bail!(err);
    }
    Ok(())
}

// -----------------------------------------------------------------------
// dieta show
// -----------------------------------------------------------------------

pub async fn run_show(ctl: &PlanCacheController) -> Result<()> {
    if let LoadOutcome::Unreadable(err) = ctl.load_persisted().await {
        eprintln!("warning: {err}");
    }
    println!("{}", render_view(&ctl.view()));
    Ok(())
}

// -----------------------------------------------------------------------
// dieta export
// -----------------------------------------------------------------------

pub async fn run_export(ctl: &PlanCacheController, output: Option<&Path>) -> Result<()> {
    ctl.load_persisted().await;
    let text = ctl
        .export_text()
        .context("nothing to export; run `dieta generate` first")?;

    match output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Plan exported to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

// -----------------------------------------------------------------------
// dieta clear
// -----------------------------------------------------------------------

pub async fn run_clear(ctl: &PlanCacheController) -> Result<()> {
    ctl.clear().await?;
    println!("Plan cleared. Run `dieta generate` to create a new one.");
    Ok(())
}

// -----------------------------------------------------------------------
// Presentation
// -----------------------------------------------------------------------

/// Render the view as terminal text.
pub fn render_view(view: &PlanView) -> String {
    match view {
        PlanView::Loading => LOADING_MESSAGE.to_string(),
        PlanView::Failed(_) => FAILURE_MESSAGE.to_string(),
        PlanView::Ready { plan, source } => {
            let mut out = render_plan(plan);
            if *source == PlanSource::Persisted {
                out.push_str("\n\n(saved plan)");
            }
            out
        }
        PlanView::Empty => "No diet plan saved. Run `dieta generate` to create one.".to_string(),
    }
}

fn render_plan(plan: &DietPlan) -> String {
    let mut lines = vec![
        format!("Nome: {}", plan.name),
        format!("Foco: {}", plan.objective),
    ];

    for meal in &plan.meals {
        lines.push(String::new());
        lines.push(format!("{} ({})", meal.name, meal.time));
        lines.extend(meal.foods.iter().map(|food| format!("  - {food}")));
    }

    if !plan.supplements.is_empty() {
        lines.push(String::new());
        lines.push("Dica de suplementos:".to_string());
        lines.extend(plan.supplements.iter().map(|s| format!("  - {s}")));
    }

    lines.join("\n")
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
