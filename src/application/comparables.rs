use crate::domain::asset::{AssetDescriptor, HistoricalSale};
use crate::domain::valuation::RankedComparable;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Minimum similarity for a sale to count as comparable.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.3;

/// Maximum number of comparables returned to the caller.
pub const DEFAULT_MAX_RESULTS: usize = 10;

const SECONDS_PER_DAY: f64 = 86_400.0;
const RECENCY_WINDOW_DAYS: f64 = 365.0;

/// Scores and ranks historical sales by similarity to the target asset.
/// Pure and restartable; the external comparables provider is consulted
/// by the engine before ranking, never from here.
#[derive(Debug, Clone, Copy)]
pub struct ComparableSalesRanker {
    min_similarity: f64,
    max_results: usize,
}

impl Default for ComparableSalesRanker {
    fn default() -> Self {
        Self {
            min_similarity: DEFAULT_MIN_SIMILARITY,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl ComparableSalesRanker {
    pub fn new(min_similarity: f64, max_results: usize) -> Self {
        Self { min_similarity, max_results }
    }

    /// Similarity in [0, 1]: category 0.4, creator 0.2, quality 0.2,
    /// rarity 0.1, recency 0.1 (linear decay over a year).
    pub fn similarity(asset: &AssetDescriptor, sale: &HistoricalSale, now: DateTime<Utc>) -> f64 {
        let category = if sale.category == asset.category { 0.4 } else { 0.0 };
        let creator = if sale.creator.as_deref() == Some(asset.creator.as_str()) {
            0.2
        } else {
            0.0
        };
        let quality = 0.2 * (1.0 - (asset.quality_score - sale.quality_score).abs());
        let rarity = 0.1 * (1.0 - (asset.rarity - sale.rarity).abs());

        let days_ago = ((now.timestamp() - sale.timestamp) as f64 / SECONDS_PER_DAY).max(0.0);
        let recency = 0.1 * (1.0 - days_ago / RECENCY_WINDOW_DAYS).max(0.0);

        (category + creator + quality + rarity + recency).clamp(0.0, 1.0)
    }

    /// Ranks sales by similarity descending, ties broken toward the more
    /// recent sale, truncated to `max_results`. An empty input yields an
    /// empty ranking, never an error.
    pub fn rank(
        &self,
        asset: &AssetDescriptor,
        sales: &[HistoricalSale],
        now: DateTime<Utc>,
    ) -> Vec<RankedComparable> {
        let mut ranked: Vec<RankedComparable> = sales
            .iter()
            .map(|sale| RankedComparable {
                sale: sale.clone(),
                similarity: Self::similarity(asset, sale, now),
            })
            .filter(|rc| rc.similarity > self.min_similarity)
            .collect();

        ranked.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.sale.timestamp.cmp(&a.sale.timestamp))
        });

        ranked.truncate(self.max_results);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn asset() -> AssetDescriptor {
        AssetDescriptor {
            token_id: 1,
            category: "music".to_string(),
            creator: "0xabc".to_string(),
            quality_score: 0.9,
            rarity: 0.8,
            has_license: true,
            is_verified: true,
            views: 0,
            likes: 0,
            shares: 0,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 7, 12, 0, 0).unwrap()
    }

    fn sale(category: &str, quality: f64, rarity: f64, days_ago: i64) -> HistoricalSale {
        HistoricalSale {
            price: 5_000.0,
            category: category.to_string(),
            creator: None,
            quality_score: quality,
            rarity,
            timestamp: now().timestamp() - days_ago * 86_400,
            volume: None,
            source: None,
        }
    }

    #[test]
    fn test_exact_match_scores_one() {
        let mut s = sale("music", 0.9, 0.8, 0);
        s.creator = Some("0xabc".to_string());
        s.timestamp = now().timestamp();
        let sim = ComparableSalesRanker::similarity(&asset(), &s, now());
        assert!((sim - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_category_mismatch_drops_weight() {
        let same = ComparableSalesRanker::similarity(&asset(), &sale("music", 0.9, 0.8, 0), now());
        let diff = ComparableSalesRanker::similarity(&asset(), &sale("art", 0.9, 0.8, 0), now());
        assert!((same - diff - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_recency_decays_over_a_year() {
        let fresh = ComparableSalesRanker::similarity(&asset(), &sale("music", 0.9, 0.8, 0), now());
        let old = ComparableSalesRanker::similarity(&asset(), &sale("music", 0.9, 0.8, 400), now());
        assert!((fresh - old - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_low_similarity_excluded() {
        let ranker = ComparableSalesRanker::default();
        // Different category, far quality/rarity, ancient: below 0.3.
        let sales = vec![sale("art", 0.0, 0.0, 400)];
        assert!(ranker.rank(&asset(), &sales, now()).is_empty());
    }

    #[test]
    fn test_ordering_and_tiebreak() {
        let ranker = ComparableSalesRanker::default();
        let a = sale("music", 0.9, 0.8, 10);
        let b = sale("music", 0.9, 0.8, 10); // same similarity
        let mut b_newer = b.clone();
        b_newer.timestamp += 3_600;
        let c = sale("music", 0.5, 0.5, 10); // lower similarity

        let ranked = ranker.rank(&asset(), &[c.clone(), a.clone(), b_newer.clone()], now());
        assert_eq!(ranked.len(), 3);
        // Tie broken toward the more recent sale.
        assert_eq!(ranked[0].sale.timestamp, b_newer.timestamp);
        assert_eq!(ranked[1].sale.timestamp, a.timestamp);
        assert!(ranked[2].similarity < ranked[1].similarity);
    }

    #[test]
    fn test_truncation_to_max_results() {
        let ranker = ComparableSalesRanker::default();
        let sales: Vec<HistoricalSale> = (0..25).map(|i| sale("music", 0.9, 0.8, i)).collect();
        let ranked = ranker.rank(&asset(), &sales, now());
        assert_eq!(ranked.len(), DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        let ranker = ComparableSalesRanker::default();
        assert!(ranker.rank(&asset(), &[], now()).is_empty());
    }
}
