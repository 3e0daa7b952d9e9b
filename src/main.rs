use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ipval::application::engine::ValuationEngine;
use ipval::application::estimators::{ModelArtifacts, ModelStore};
use ipval::application::training::{load_sales_csv, ModelTrainer};
use ipval::config::Config;
use ipval::domain::asset::AssetDescriptor;
use ipval::domain::valuation::ValuationRequest;
use ipval::infrastructure::comparables::HttpComparableSalesProvider;
use ipval::infrastructure::market_data::HttpMarketDataProvider;
use ipval::infrastructure::mock::{
    sample_sales, MockComparableSalesProvider, MockMarketDataProvider,
};
use ipval::infrastructure::oracle::HttpOracleSink;
use ipval::infrastructure::FileModelStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "ipval", about = "IP asset valuation engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Value one asset and print the result as JSON
    Value {
        /// Path to a JSON valuation request
        #[arg(long, conflicts_with = "demo")]
        request: Option<PathBuf>,
        /// Run a canned demo valuation with mock providers
        #[arg(long)]
        demo: bool,
    },
    /// Train tree models from a sales CSV and persist the new version
    Train {
        /// CSV with columns price,category,creator,quality_score,rarity,timestamp,volume
        #[arg(long)]
        data: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Value { request, demo } => value_command(config, request, demo).await,
        Command::Train { data } => train_command(config, data),
    }
}

async fn value_command(config: Config, request: Option<PathBuf>, demo: bool) -> Result<()> {
    let store = FileModelStore::new(config.model_dir.clone())?;
    let artifacts = store.load()?.unwrap_or_else(ModelArtifacts::empty);
    if !artifacts.has_trained_models() {
        info!("no trained models found, serving rule-based estimates");
    }

    let request = match request {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read request at {}", path.display()))?;
            serde_json::from_str::<ValuationRequest>(&content)
                .context("failed to parse valuation request")?
        }
        None if demo => demo_request(),
        None => anyhow::bail!("either --request <path> or --demo is required"),
    };

    let mut engine = ValuationEngine::new(config.clone(), artifacts);
    if demo {
        engine = engine
            .with_market_data(Arc::new(MockMarketDataProvider::full()))
            .with_comparables(Arc::new(MockComparableSalesProvider::new(sample_sales(
                &request.asset.category,
                5_000.0,
                8,
                42,
            ))));
    } else {
        if let Some(url) = &config.market_data_url {
            engine = engine.with_market_data(Arc::new(HttpMarketDataProvider::new(url.clone())));
        }
        if let Some(url) = &config.comparables_url {
            engine =
                engine.with_comparables(Arc::new(HttpComparableSalesProvider::new(url.clone())));
        }
        if let Some(url) = &config.oracle_url {
            engine = engine.with_oracle(Arc::new(HttpOracleSink::new(url.clone())));
        }
    }

    let result = engine.value(&request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn train_command(config: Config, data: PathBuf) -> Result<()> {
    let store = FileModelStore::new(config.model_dir.clone())?;
    let previous = store.load()?.unwrap_or_else(ModelArtifacts::empty);

    let sales = load_sales_csv(&data)?;
    info!(samples = sales.len(), "loaded training data from {}", data.display());

    let (artifacts, report) = ModelTrainer::default().train(&sales, &previous)?;
    store.save(&artifacts)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn demo_request() -> ValuationRequest {
    ValuationRequest {
        asset: AssetDescriptor {
            token_id: 1,
            category: "music".to_string(),
            creator: "0xdemo".to_string(),
            quality_score: 0.85,
            rarity: 0.7,
            has_license: true,
            is_verified: true,
            views: 12_000,
            likes: 800,
            shares: 150,
        },
        historical_sales: Vec::new(),
    }
}
