mod config;
mod plan_cmds;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use dieta_db::pool;

use config::DietaConfig;
use plan_cmds::ProfileArgs;

#[derive(Parser)]
#[command(name = "dieta", about = "Generate and keep a personal diet plan")]
struct Cli {
    /// Database URL (overrides DIETA_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Generation service base URL (overrides DIETA_API_URL env var)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a dieta config file from the resolved settings (no database required)
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create and migrate the dieta database
    DbInit,
    /// Request a new diet plan, showing the saved one if the request fails
    Generate {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Show the saved diet plan
    Show,
    /// Export the saved plan as share text
    Export {
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Forget the current plan
    Clear,
}

/// Execute the `dieta init` command: write config file.
fn cmd_init(resolved: &DietaConfig, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        api: config::ApiSection {
            base_url: resolved.api_url.clone(),
            timeout_secs: resolved.timeout.as_secs(),
        },
        database: config::DatabaseSection {
            url: resolved.db_config.database_url.clone(),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  api.base_url = {}", cfg.api.base_url);
    println!("  api.timeout_secs = {}", cfg.api.timeout_secs);
    println!("  database.url = {}", cfg.database.url);
    println!();
    println!("Next: run `dieta db-init` to create the database.");

    Ok(())
}

/// Execute the `dieta db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &DietaConfig) -> anyhow::Result<()> {
    println!("Initializing dieta database...");

    let db_pool = pool::open(&resolved.db_config).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("dieta db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let resolved = DietaConfig::resolve(cli.database_url.as_deref(), cli.api_url.as_deref());

    match cli.command {
        Commands::Init { force } => {
            cmd_init(&resolved, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(&resolved).await?;
        }
        Commands::Generate { profile } => {
            let db_pool = pool::open(&resolved.db_config).await?;
            let ctl = plan_cmds::build_controller(&resolved, &db_pool)?;
            let result = plan_cmds::run_generate(&ctl, profile).await;
            db_pool.close().await;
            result?;
        }
        Commands::Show => {
            let db_pool = pool::open(&resolved.db_config).await?;
            let ctl = plan_cmds::build_controller(&resolved, &db_pool)?;
            let result = plan_cmds::run_show(&ctl).await;
            db_pool.close().await;
            result?;
        }
        Commands::Export { output } => {
            let db_pool = pool::open(&resolved.db_config).await?;
            let ctl = plan_cmds::build_controller(&resolved, &db_pool)?;
            let result = plan_cmds::run_export(&ctl, output.as_deref()).await;
            db_pool.close().await;
            result?;
        }
        Commands::Clear => {
            let db_pool = pool::open(&resolved.db_config).await?;
            let ctl = plan_cmds::build_controller(&resolved, &db_pool)?;
            let result = plan_cmds::run_clear(&ctl).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
