use crate::domain::errors::ValuationError;
use serde::{Deserialize, Serialize};

/// Descriptor of the IP asset being valued.
///
/// Owned by the caller and immutable for the duration of one valuation.
/// Validated once at the request boundary; everything downstream may
/// assume the invariants hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub token_id: u64,
    pub category: String,
    pub creator: String,
    /// Content quality in [0, 1], typically produced by the upstream
    /// fingerprinting pipeline.
    #[serde(default = "default_neutral")]
    pub quality_score: f64,
    /// Rarity in [0, 1].
    #[serde(default = "default_neutral")]
    pub rarity: f64,
    #[serde(default)]
    pub has_license: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub shares: u64,
}

fn default_neutral() -> f64 {
    0.5
}

impl AssetDescriptor {
    /// Boundary validation. Rejects before any feature assembly happens.
    pub fn validate(&self) -> Result<(), ValuationError> {
        if self.category.trim().is_empty() {
            return Err(ValuationError::InvalidInput {
                reason: "category must not be empty".to_string(),
            });
        }
        if self.creator.trim().is_empty() {
            return Err(ValuationError::InvalidInput {
                reason: "creator must not be empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.quality_score) || !self.quality_score.is_finite() {
            return Err(ValuationError::InvalidInput {
                reason: format!("quality_score {} outside [0, 1]", self.quality_score),
            });
        }
        if !(0.0..=1.0).contains(&self.rarity) || !self.rarity.is_finite() {
            return Err(ValuationError::InvalidInput {
                reason: format!("rarity {} outside [0, 1]", self.rarity),
            });
        }
        Ok(())
    }
}

/// One historical transaction used for comparable-sales analysis and
/// model training. Read-only for the duration of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalSale {
    /// Sale price in USD. Must be positive.
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default = "default_neutral")]
    pub quality_score: f64,
    #[serde(default = "default_neutral")]
    pub rarity: f64,
    /// Seconds since epoch.
    pub timestamp: i64,
    /// Normalized trading volume associated with the sale, when the
    /// source reports one.
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> AssetDescriptor {
        AssetDescriptor {
            token_id: 1,
            category: "music".to_string(),
            creator: "0xabc".to_string(),
            quality_score: 0.9,
            rarity: 0.8,
            has_license: true,
            is_verified: true,
            views: 50_000,
            likes: 5_000,
            shares: 1_000,
        }
    }

    #[test]
    fn test_valid_descriptor_passes() {
        assert!(asset().validate().is_ok());
    }

    #[test]
    fn test_empty_category_rejected() {
        let mut a = asset();
        a.category = "  ".to_string();
        let err = a.validate().unwrap_err();
        assert!(err.to_string().contains("category"));
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        let mut a = asset();
        a.quality_score = 1.2;
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_engagement_fields_default_to_zero() {
        let json = r#"{"token_id": 7, "category": "art", "creator": "0xdef"}"#;
        let a: AssetDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(a.views, 0);
        assert_eq!(a.quality_score, 0.5);
        assert!(a.validate().is_ok());
    }
}
