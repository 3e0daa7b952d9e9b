use crate::application::assembler::FeatureAssembler;
use crate::application::estimators::{BoostedModel, ForestModel, ModelArtifacts};
use crate::application::estimators::boosted::{DEFAULT_BOOSTING_ROUNDS, DEFAULT_LEARNING_RATE};
use crate::application::scaler::FeatureScaler;
use crate::domain::asset::{AssetDescriptor, HistoricalSale};
use crate::domain::market::MarketSnapshot;
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::path::Path;
use tracing::info;

/// Below this many sales the tree models would just memorize the input.
pub const MIN_TRAINING_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub r2: f64,
    pub version: i64,
}

/// Fits the scaler and both tree ensembles from historical sales and
/// packages them as a new artifact version. Runs out-of-request; the
/// caller swaps the result into the engine and persists it.
///
/// Neural weights are produced by an offline pipeline and only loaded
/// here, so training carries the previous network forward untouched.
pub struct ModelTrainer {
    rounds: usize,
    learning_rate: f64,
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_BOOSTING_ROUNDS,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

impl ModelTrainer {
    pub fn new(rounds: usize, learning_rate: f64) -> Self {
        Self { rounds, learning_rate }
    }

    pub fn train(
        &self,
        sales: &[HistoricalSale],
        previous: &ModelArtifacts,
    ) -> Result<(ModelArtifacts, TrainingReport)> {
        if sales.len() < MIN_TRAINING_SAMPLES {
            bail!(
                "need at least {} sales to train, got {}",
                MIN_TRAINING_SAMPLES,
                sales.len()
            );
        }

        let now = Utc::now();
        let rows: Vec<Vec<f64>> = sales
            .iter()
            .map(|sale| {
                let asset = sale_as_asset(sale);
                FeatureAssembler::assemble(&asset, &[], &MarketSnapshot::default(), now).to_vec()
            })
            .collect();
        let targets: Vec<f64> = sales.iter().map(|s| s.price).collect();

        let scaler = FeatureScaler::fit(&rows);
        let scaled: Vec<Vec<f64>> = rows.iter().map(|r| scaler.transform_row(r)).collect();
        let x = DenseMatrix::from_2d_vec(&scaled)
            .map_err(|e| anyhow!("training matrix creation failed: {}", e))?;

        let forest = ForestModel::fit(&x, &targets)?;
        let boosted = BoostedModel::fit(&x, &targets, self.rounds, self.learning_rate)?;

        // In-sample fit of the boosted model; feeds the accuracy term of
        // the uncertainty breakdown via the performance tracker.
        let fitted = boosted.predict_batch(&x, targets.len())?;
        let r2 = r_squared(&targets, &fitted);

        let version = now.timestamp();
        let report = TrainingReport { samples: sales.len(), r2, version };
        info!(samples = report.samples, r2, version, "training run completed");

        Ok((
            ModelArtifacts {
                version,
                scaler,
                neural: previous.neural.clone(),
                forest: Some(forest),
                boosted: Some(boosted),
            },
            report,
        ))
    }
}

/// A training row is the sale itself viewed as an asset: the sale's own
/// attributes stand in for the listing that produced it.
fn sale_as_asset(sale: &HistoricalSale) -> AssetDescriptor {
    AssetDescriptor {
        token_id: 0,
        category: sale.category.clone(),
        creator: sale.creator.clone().unwrap_or_default(),
        quality_score: sale.quality_score,
        rarity: sale.rarity,
        has_license: false,
        is_verified: false,
        views: 0,
        likes: 0,
        shares: 0,
    }
}

fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len() as f64;
    let mean = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_tot < 1e-12 {
        return 0.0;
    }
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(y, f)| (y - f).powi(2))
        .sum();
    (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
}

/// Loads training sales from a CSV with the header
/// `price,category,creator,quality_score,rarity,timestamp,volume`.
/// `creator` and `volume` may be empty.
pub fn load_sales_csv(path: &Path) -> Result<Vec<HistoricalSale>> {
    #[derive(serde::Deserialize)]
    struct Row {
        price: f64,
        category: String,
        creator: Option<String>,
        quality_score: f64,
        rarity: f64,
        timestamp: i64,
        volume: Option<f64>,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open training data at {}", path.display()))?;

    let mut sales = Vec::new();
    for record in reader.deserialize() {
        let row: Row = record.context("malformed training row")?;
        sales.push(HistoricalSale {
            price: row.price,
            category: row.category,
            creator: row.creator.filter(|c| !c.is_empty()),
            quality_score: row.quality_score,
            rarity: row.rarity,
            timestamp: row.timestamp,
            volume: row.volume,
            source: None,
        });
    }
    Ok(sales)
}
