use crate::application::assembler::FeatureAssembler;
use crate::application::calibrator::MarketBoundCalibrator;
use crate::application::combiner::PredictionCombiner;
use crate::application::comparables::ComparableSalesRanker;
use crate::application::estimators::{
    BaggedTreeEstimator, BoostedTreeEstimator, Estimator, ModelArtifacts, NeuralEstimator,
    RuleBasedEstimator,
};
use crate::application::explainer::FactorExplainer;
use crate::application::tracker::PerformanceTracker;
use crate::application::uncertainty::UncertaintyQuantifier;
use crate::config::Config;
use crate::domain::asset::HistoricalSale;
use crate::domain::errors::ValuationError;
use crate::domain::features::FeatureVector;
use crate::domain::market::MarketSnapshot;
use crate::domain::ports::{ComparableSalesProvider, MarketDataProvider, OracleSink};
use crate::domain::valuation::{
    clamp_value, EstimatorFailure, EstimatorId, EstimatorPrediction, FactorReport,
    ValuationRequest, ValuationResult,
};
use crate::infrastructure::cache::{SystemClock, TtlCache};
use chrono::Utc;
use futures::future::join_all;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// Orchestrates one valuation request through the straight-line pipeline:
/// assemble, fan out estimators, combine, quantify, rank, calibrate,
/// explain. Holds no per-request state; the only mutation it ever sees is
/// the atomic swap of trained model artifacts after retraining.
pub struct ValuationEngine {
    config: Config,
    models: RwLock<Arc<ModelArtifacts>>,
    combiner: PredictionCombiner,
    quantifier: UncertaintyQuantifier,
    ranker: ComparableSalesRanker,
    calibrator: MarketBoundCalibrator,
    explainer: FactorExplainer,
    tracker: PerformanceTracker,
    market_cache: TtlCache<MarketSnapshot>,
    market_data: Option<Arc<dyn MarketDataProvider>>,
    comparables: Option<Arc<dyn ComparableSalesProvider>>,
    oracle: Option<Arc<dyn OracleSink>>,
}

impl ValuationEngine {
    pub fn new(config: Config, artifacts: ModelArtifacts) -> Self {
        Self {
            combiner: PredictionCombiner::new(config.ensemble_weights),
            quantifier: UncertaintyQuantifier::new(config.interval_z),
            ranker: ComparableSalesRanker::new(
                config.min_comparable_similarity,
                config.max_comparables,
            ),
            calibrator: MarketBoundCalibrator::new(),
            explainer: FactorExplainer::new(),
            tracker: PerformanceTracker::new(),
            market_cache: TtlCache::new(config.market_cache_ttl_ms, Arc::new(SystemClock)),
            models: RwLock::new(Arc::new(artifacts)),
            config,
            market_data: None,
            comparables: None,
            oracle: None,
        }
    }

    pub fn with_market_data(mut self, provider: Arc<dyn MarketDataProvider>) -> Self {
        self.market_data = Some(provider);
        self
    }

    pub fn with_comparables(mut self, provider: Arc<dyn ComparableSalesProvider>) -> Self {
        self.comparables = Some(provider);
        self
    }

    pub fn with_oracle(mut self, sink: Arc<dyn OracleSink>) -> Self {
        self.oracle = Some(sink);
        self
    }

    pub fn tracker(&self) -> &PerformanceTracker {
        &self.tracker
    }

    /// Current serving artifacts. Cheap: clones the shared pointer, so a
    /// request keeps one consistent model version end to end.
    pub fn current_models(&self) -> Arc<ModelArtifacts> {
        match self.models.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Atomically replaces the serving artifacts. In-flight requests keep
    /// the version they started with; no request ever observes a partial
    /// swap.
    pub fn swap_models(&self, artifacts: ModelArtifacts) {
        let version = artifacts.version;
        match self.models.write() {
            Ok(mut guard) => *guard = Arc::new(artifacts),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(artifacts),
        }
        info!(version, "model artifacts swapped");
    }

    pub async fn value(&self, request: &ValuationRequest) -> Result<ValuationResult, ValuationError> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();

        request.asset.validate()?;
        let now = Utc::now();

        // Collaborators are independent of each other; fetch concurrently.
        let (market, history) = tokio::join!(
            self.market_snapshot(&request.asset.category),
            self.historical_sales(request),
        );

        let features = FeatureAssembler::assemble(&request.asset, &history, &market, now);
        let artifacts = self.current_models();

        let (mut predictions, mut failures) = self.fan_out(&artifacts, &features, started).await;

        if predictions.is_empty() {
            if self.config.rule_fallback_enabled {
                match RuleBasedEstimator::new().predict(&features) {
                    Ok(pred) => predictions.push((EstimatorId::RuleBased, pred)),
                    Err(reason) => failures.push(EstimatorFailure {
                        estimator: EstimatorId::RuleBased,
                        reason,
                        timed_out: false,
                    }),
                }
            } else {
                // Only an actually elapsed deadline is a deadline error;
                // per-estimator timeouts with budget remaining fall through
                // to the insufficient-estimators path below.
                let deadline = Duration::from_millis(self.config.request_deadline_ms);
                if started.elapsed() >= deadline
                    && !failures.is_empty()
                    && failures.iter().all(|f| f.timed_out)
                {
                    return Err(ValuationError::DeadlineExceeded {
                        deadline_ms: self.config.request_deadline_ms,
                    });
                }
            }
        }

        let combined = self.combiner.combine(&predictions, &failures)?;
        let breakdown =
            self.quantifier
                .quantify(&combined, &features, &market, self.tracker.historical_r2());

        let ranked = self.ranker.rank(&request.asset, &history, now);
        let estimated_value = clamp_value(self.calibrator.calibrate(combined.value, &ranked));
        let confidence_interval = self.quantifier.interval_around(estimated_value, breakdown.total);
        let factors = self.explainer.explain(&features, &market);

        self.tracker.record_prediction();
        self.submit_to_oracle(request, estimated_value, &factors, artifacts.version, breakdown.total);

        let processing_time_ms = started.elapsed().as_secs_f64() * 1_000.0;
        info!(
            %request_id,
            token_id = request.asset.token_id,
            estimated_value,
            total_uncertainty = breakdown.total,
            comparables = ranked.len(),
            degraded = failures.len(),
            processing_time_ms,
            "valuation completed"
        );

        Ok(ValuationResult {
            estimated_value,
            confidence_interval,
            comparable_sales: ranked,
            factors,
            model_uncertainty: combined.model_uncertainty,
            weights_used: combined.weights,
            degraded: failures,
            processing_time_ms,
        })
    }

    /// Runs the trained estimators concurrently, each on a blocking task
    /// under `min(per-estimator timeout, remaining deadline)`. A timeout
    /// or error degrades the ensemble; it never aborts the request here.
    async fn fan_out(
        &self,
        artifacts: &Arc<ModelArtifacts>,
        features: &FeatureVector,
        started: Instant,
    ) -> (Vec<(EstimatorId, EstimatorPrediction)>, Vec<EstimatorFailure>) {
        let estimators: Vec<Arc<dyn Estimator>> = vec![
            Arc::new(NeuralEstimator::new(artifacts.clone())),
            Arc::new(BaggedTreeEstimator::new(artifacts.clone())),
            Arc::new(BoostedTreeEstimator::new(artifacts.clone())),
        ];

        let per_estimator = Duration::from_millis(self.config.per_estimator_timeout_ms);
        let deadline = Duration::from_millis(self.config.request_deadline_ms);
        let remaining = deadline.saturating_sub(started.elapsed());
        let budget = per_estimator.min(remaining);

        if budget.is_zero() {
            let reason = if remaining.is_zero() {
                "deadline exhausted before dispatch"
            } else {
                "timed out after 0ms"
            };
            let failures = estimators
                .iter()
                .map(|est| EstimatorFailure {
                    estimator: est.id(),
                    reason: reason.to_string(),
                    timed_out: true,
                })
                .collect();
            return (Vec::new(), failures);
        }

        let tasks = estimators.into_iter().map(|est| {
            let features = features.clone();
            async move {
                let id = est.id();
                let outcome = tokio::time::timeout(
                    budget,
                    tokio::task::spawn_blocking(move || est.predict(&features)),
                )
                .await;
                match outcome {
                    Err(_) => Err(EstimatorFailure {
                        estimator: id,
                        reason: format!("timed out after {}ms", budget.as_millis()),
                        timed_out: true,
                    }),
                    Ok(Err(join_err)) => Err(EstimatorFailure {
                        estimator: id,
                        reason: format!("task failed: {}", join_err),
                        timed_out: false,
                    }),
                    Ok(Ok(Err(reason))) => Err(EstimatorFailure {
                        estimator: id,
                        reason,
                        timed_out: false,
                    }),
                    Ok(Ok(Ok(pred))) => Ok((id, pred)),
                }
            }
        });

        let mut predictions = Vec::new();
        let mut failures = Vec::new();
        for outcome in join_all(tasks).await {
            match outcome {
                Ok(pred) => predictions.push(pred),
                Err(failure) => {
                    warn!(
                        estimator = %failure.estimator,
                        reason = %failure.reason,
                        "estimator unavailable, degrading ensemble"
                    );
                    failures.push(failure);
                }
            }
        }
        (predictions, failures)
    }

    /// TTL-cached market snapshot. Provider failure or absence falls back
    /// to the empty snapshot (neutral defaults downstream).
    async fn market_snapshot(&self, category: &str) -> MarketSnapshot {
        if let Some(snapshot) = self.market_cache.get(category) {
            return snapshot;
        }
        let Some(provider) = &self.market_data else {
            return MarketSnapshot::default();
        };
        match provider.get_snapshot(category).await {
            Ok(snapshot) => {
                self.market_cache.insert(category, snapshot.clone());
                snapshot
            }
            Err(e) => {
                warn!(category, error = %e, "market data unavailable, using defaults");
                MarketSnapshot::default()
            }
        }
    }

    /// Caller-supplied sales win; otherwise the comparables provider is
    /// consulted. Absent both, the ranking runs over an empty set.
    async fn historical_sales(&self, request: &ValuationRequest) -> Vec<HistoricalSale> {
        if !request.historical_sales.is_empty() {
            return request.historical_sales.clone();
        }
        let Some(provider) = &self.comparables else {
            return Vec::new();
        };
        match provider.fetch(&request.asset).await {
            Ok(sales) => sales,
            Err(e) => {
                warn!(
                    token_id = request.asset.token_id,
                    error = %e,
                    "comparable sales unavailable, proceeding without history"
                );
                Vec::new()
            }
        }
    }

    /// Fire-and-forget oracle submission; failure is logged, never
    /// surfaced to the caller.
    fn submit_to_oracle(
        &self,
        request: &ValuationRequest,
        value: f64,
        factors: &FactorReport,
        model_version: i64,
        total_uncertainty: f64,
    ) {
        let Some(oracle) = &self.oracle else {
            return;
        };
        let oracle = oracle.clone();
        let token_id = request.asset.token_id;
        let confidence = factors.overall_confidence;
        let metadata = serde_json::json!({
            "category": request.asset.category,
            "model_version": model_version,
            "total_uncertainty": total_uncertainty,
        });
        tokio::spawn(async move {
            match oracle.submit(token_id, value, confidence, metadata).await {
                Ok(Some(tx_id)) => info!(token_id, tx_id, "valuation submitted to oracle"),
                Ok(None) => {}
                Err(e) => warn!(token_id, error = %e, "oracle submission failed"),
            }
        });
    }
}
