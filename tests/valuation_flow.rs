use chrono::Utc;
use ipval::application::engine::ValuationEngine;
use ipval::application::estimators::ModelArtifacts;
use ipval::application::training::ModelTrainer;
use ipval::config::Config;
use ipval::domain::asset::{AssetDescriptor, HistoricalSale};
use ipval::domain::valuation::{EstimatorId, ValuationRequest, VALUE_CEILING, VALUE_FLOOR};
use ipval::infrastructure::mock::{
    MockComparableSalesProvider, MockMarketDataProvider, RecordingOracleSink,
};
use std::sync::Arc;
use std::time::Duration;

fn asset() -> AssetDescriptor {
    AssetDescriptor {
        token_id: 42,
        category: "music".to_string(),
        creator: "0xabc".to_string(),
        quality_score: 0.9,
        rarity: 0.8,
        has_license: true,
        is_verified: true,
        views: 20_000,
        likes: 1_500,
        shares: 300,
    }
}

fn request() -> ValuationRequest {
    ValuationRequest { asset: asset(), historical_sales: Vec::new() }
}

fn sale(price: f64, days_ago: i64) -> HistoricalSale {
    HistoricalSale {
        price,
        category: "music".to_string(),
        creator: None,
        quality_score: 0.85,
        rarity: 0.75,
        timestamp: Utc::now().timestamp() - days_ago * 86_400,
        volume: Some(120.0),
        source: None,
    }
}

fn comparables() -> Vec<HistoricalSale> {
    vec![sale(4_200.0, 5), sale(5_000.0, 30), sale(7_500.0, 90)]
}

#[tokio::test]
async fn test_full_pipeline_with_collaborators() {
    let engine = ValuationEngine::new(Config::default(), ModelArtifacts::empty())
        .with_market_data(Arc::new(MockMarketDataProvider::full()))
        .with_comparables(Arc::new(MockComparableSalesProvider::new(comparables())));

    let result = engine.value(&request()).await.unwrap();

    assert!((VALUE_FLOOR..=VALUE_CEILING).contains(&result.estimated_value));
    assert!(result.confidence_interval.contains(result.estimated_value));

    // Calibrated against sales of [4200, 5000, 7500] the value must land
    // inside the market-implied band [0.5 * min, 2 * max].
    assert!(
        (2_100.0..=15_000.0).contains(&result.estimated_value),
        "value {} outside market-implied bounds",
        result.estimated_value
    );

    assert_eq!(result.comparable_sales.len(), 3);
    for pair in result.comparable_sales.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }

    let weight_sum: f64 = result.weights_used.iter().map(|(_, w)| w).sum();
    assert!((weight_sum - 1.0).abs() < 1e-6);

    // No trained models loaded: all three estimators degrade and the
    // rule-based fallback serves alone.
    assert_eq!(result.weights_used, vec![(EstimatorId::RuleBased, 1.0)]);
    assert_eq!(result.degraded.len(), 3);
    assert!(result.degraded.iter().all(|f| !f.timed_out));
}

#[tokio::test]
async fn test_rule_based_value_without_collaborators() {
    let engine = ValuationEngine::new(Config::default(), ModelArtifacts::empty());
    let result = engine.value(&request()).await.unwrap();

    // 1000 * (1 + 2*0.5 + 1.5*0.9 + 1*0.8 + 0.5*1) * 1.5 for a verified
    // asset with neutral creator reputation.
    assert!((result.estimated_value - 6_975.0).abs() < 1e-6);
    assert!(result.comparable_sales.is_empty());
}

#[tokio::test]
async fn test_missing_collaborators_widen_interval() {
    let rich = ValuationEngine::new(Config::default(), ModelArtifacts::empty())
        .with_market_data(Arc::new(MockMarketDataProvider::full()))
        .with_comparables(Arc::new(MockComparableSalesProvider::new(comparables())));
    let bare = ValuationEngine::new(Config::default(), ModelArtifacts::empty());

    let with_data = rich.value(&request()).await.unwrap();
    let without_data = bare.value(&request()).await.unwrap();

    // Same rule-based point estimate, but absent market data and sales
    // must cost interval width.
    assert!((with_data.estimated_value - without_data.estimated_value).abs() < 1e-6);
    assert!(without_data.confidence_interval.width() > with_data.confidence_interval.width());
}

#[tokio::test]
async fn test_caller_sales_take_precedence_over_provider() {
    // The provider would fail if consulted; caller-supplied sales must
    // short-circuit it.
    let engine = ValuationEngine::new(Config::default(), ModelArtifacts::empty())
        .with_comparables(Arc::new(MockComparableSalesProvider::failing()));

    let req = ValuationRequest { asset: asset(), historical_sales: comparables() };
    let result = engine.value(&req).await.unwrap();
    assert_eq!(result.comparable_sales.len(), 3);
}

#[tokio::test]
async fn test_trained_models_serve_the_ensemble() {
    let sales: Vec<HistoricalSale> = (0..40)
        .map(|i| {
            let t = i as f64 / 40.0;
            let mut s = sale(2_000.0 + 8_000.0 * t, i);
            s.quality_score = 0.2 + 0.7 * t;
            s.rarity = 0.1 + 0.8 * t;
            s
        })
        .collect();
    let (artifacts, _) = ModelTrainer::new(20, 0.1)
        .train(&sales, &ModelArtifacts::empty())
        .unwrap();

    let engine = ValuationEngine::new(Config::default(), artifacts);
    let result = engine.value(&request()).await.unwrap();

    // Neural weights come from an offline pipeline, so only the two tree
    // estimators serve; their weights renormalize to 0.6 / 0.4.
    assert_eq!(result.degraded.len(), 1);
    assert_eq!(result.degraded[0].estimator, EstimatorId::Neural);

    let ids: Vec<EstimatorId> = result.weights_used.iter().map(|(id, _)| *id).collect();
    assert!(ids.contains(&EstimatorId::BaggedTree));
    assert!(ids.contains(&EstimatorId::BoostedTree));
    let weight_sum: f64 = result.weights_used.iter().map(|(_, w)| w).sum();
    assert!((weight_sum - 1.0).abs() < 1e-6);

    assert!((VALUE_FLOOR..=VALUE_CEILING).contains(&result.estimated_value));
    assert!(result.confidence_interval.contains(result.estimated_value));
}

#[tokio::test]
async fn test_oracle_receives_submission() {
    let sink = Arc::new(RecordingOracleSink::new());
    let engine = ValuationEngine::new(Config::default(), ModelArtifacts::empty())
        .with_oracle(sink.clone());

    let result = engine.value(&request()).await.unwrap();

    // Submission is fire-and-forget on a spawned task.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let submissions = sink.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].0, 42);
    assert!((submissions[0].1 - result.estimated_value).abs() < 1e-9);
}
