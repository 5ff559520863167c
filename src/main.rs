mod api;
mod cli;
mod config;
mod error;
mod models;
mod services;
mod session;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::session::Dashboard;

#[derive(Parser)]
#[command(name = "parlaypro")]
#[command(about = "AI-assisted match predictions and parlay builder")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Search for upcoming matches
    Fetch,
    /// Fetch, score and build the parlay
    Predict {
        /// Number of parlay legs
        #[arg(short, long)]
        legs: Option<usize>,
        /// Example stake for the payout
        #[arg(short, long)]
        stake: Option<f64>,
    },
    /// Run the whole pipeline on built-in fixtures, no API key needed
    Demo {
        #[arg(short, long)]
        legs: Option<usize>,
        #[arg(short, long)]
        stake: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("parlaypro=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Some(Commands::Serve { port }) => {
            tracing::info!("Starting ParlayPro API server on port {}", port);
            api::serve(Dashboard::from_config(&config)?, port).await?;
        }
        Some(Commands::Fetch) => {
            tracing::info!("Fetching upcoming matches...");
            cli::fetch_matches(&config).await?;
        }
        Some(Commands::Predict { legs, stake }) => {
            apply_parlay_overrides(&mut config, legs, stake)?;
            tracing::info!("Generating predictions...");
            cli::generate_predictions(&config).await?;
        }
        Some(Commands::Demo { legs, stake }) => {
            apply_parlay_overrides(&mut config, legs, stake)?;
            cli::run_demo(&config).await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting ParlayPro API server on port 3000");
            api::serve(Dashboard::from_config(&config)?, 3000).await?;
        }
    }

    Ok(())
}

fn apply_parlay_overrides(config: &mut Config, legs: Option<usize>, stake: Option<f64>) -> Result<()> {
    if let Some(legs) = legs {
        config.leg_count = legs;
    }
    if let Some(stake) = stake {
        if !stake.is_finite() || stake <= 0.0 {
            anyhow::bail!("--stake must be a positive number");
        }
        config.stake = stake;
    }
    Ok(())
}
