//! pricewise - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pricewise::claude::{ClaudeModel, check_claude_installed};
use pricewise::codex::{CodexModel, check_codex_installed};
use pricewise::config::Settings;
use pricewise::llm::{FallbackModel, LanguageModel, Provider, ProviderSelection, Retrying};
use pricewise::usecase::{
    BookingInput, ModelPair, PricingRequest, WebSources, extract_hotel_pricing,
    forecast_total_bookings, with_deadline,
};
use pricewise::web::{BraveSearch, HttpScraper};

/// Hotel pricing and occupancy analytics with self-correcting LLM output.
#[derive(Parser, Debug)]
#[command(name = "pricewise")]
#[command(about = "Hotel pricing and occupancy analytics with self-correcting LLM output")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Primary model provider (claude or codex)
    #[arg(long, global = true)]
    provider: Option<Provider>,

    /// Refinement iteration budget
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Use only the primary provider, never fall back
    #[arg(long, global = true)]
    no_fallback: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract competitor prices for a hotel and stay
    Pricing {
        #[arg(long)]
        hotel_name: String,

        #[arg(long)]
        hotel_location: String,

        /// First night, YYYY-MM-DD
        #[arg(long)]
        start_date: String,

        /// Last night, YYYY-MM-DD
        #[arg(long)]
        end_date: String,
    },
    /// Forecast daily total bookings from a JSON input file
    Forecast {
        /// Path to a bookings JSON document
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries only the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pricewise=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(provider) = cli.provider {
        settings.provider = provider;
    }
    if let Some(max) = cli.max_iterations {
        settings.max_iterations = max;
    }

    let model = build_model(&settings, cli.no_fallback).await?;
    let models = ModelPair::shared(&*model);

    match cli.command {
        Command::Pricing {
            hotel_name,
            hotel_location,
            start_date,
            end_date,
        } => {
            let request = PricingRequest {
                hotel_name,
                hotel_location,
                start_date,
                end_date,
            };

            let api_key = settings
                .brave_api_key
                .clone()
                .context("BRAVE_SEARCH_KEY must be set for pricing extraction")?;
            let search = BraveSearch::new(api_key).context("Failed to configure web search")?;
            let scraper = HttpScraper::new().context("Failed to build HTTP client")?;
            let sources = WebSources {
                search: &search,
                scraper: &scraper,
                results: settings.search_results,
            };

            info!(
                "Extracting competitor prices for {} ({})",
                request.hotel_name, request.hotel_location
            );
            let response = with_deadline(
                settings.refine_timeout,
                extract_hotel_pricing(&request, sources, models, settings.max_iterations),
            )
            .await
            .context("Pricing extraction failed")?;

            print_json(&response)?;
        }
        Command::Forecast { input } => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let bookings: BookingInput = serde_json::from_str(&content)
                .with_context(|| format!("Invalid booking input in {}", input.display()))?;

            info!("Forecasting total bookings for {}", bookings.hotel_name);
            let output = with_deadline(
                settings.refine_timeout,
                forecast_total_bookings(&bookings, models, settings.max_iterations),
            )
            .await
            .context("Forecast failed")?;

            print_json(&output)?;
        }
    }

    Ok(())
}

/// Build the model stack: each provider retried with backoff, the pair
/// wrapped in a sticky fallback unless disabled.
async fn build_model(settings: &Settings, no_fallback: bool) -> Result<Box<dyn LanguageModel>> {
    let claude = Retrying::new(
        ClaudeModel::new(settings.model_timeout).with_model(settings.model.clone()),
    );
    let codex = Retrying::new(
        CodexModel::new(settings.model_timeout).with_model(settings.model.clone()),
    );

    if no_fallback {
        return match settings.provider {
            Provider::Claude => {
                check_claude_installed()
                    .await
                    .context("Claude Code CLI is required")?;
                Ok(Box::new(claude))
            }
            Provider::Codex => {
                check_codex_installed()
                    .await
                    .context("Codex CLI is required")?;
                Ok(Box::new(codex))
            }
        };
    }

    let claude_ok = check_claude_installed().await.is_ok();
    let codex_ok = check_codex_installed().await.is_ok();
    if !claude_ok && !codex_ok {
        anyhow::bail!("Neither the Claude Code CLI nor the Codex CLI is installed");
    }
    if !claude_ok || !codex_ok {
        warn!(
            "Only one provider CLI is installed (claude: {}, codex: {}), fallback will fail",
            claude_ok, codex_ok
        );
    }

    Ok(Box::new(FallbackModel::new(
        ProviderSelection::from_primary(settings.provider),
        Box::new(claude),
        Box::new(codex),
    )))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}
