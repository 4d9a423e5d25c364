use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::features::{FeatureSet, FeatureSource};
use crate::region::UNKNOWN_REGION;
use crate::scorer::{Provenance, RiskLevel};

pub const MODEL_VERSION: &str = "1.0";
/// Reported when satellite features were merged in.
pub const MODEL_VERSION_ENHANCED: &str = "1.0-enhanced";

/// Score assigned when the input itself could not be processed.
pub const INPUT_ERROR_SCORE: f64 = 0.2;
pub const INPUT_ERROR_CONFIDENCE: f64 = 0.5;

/// One point prediction, flat and camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Date the prediction is for.
    pub date: NaiveDate,
    /// When the prediction was generated.
    pub timestamp: DateTime<Utc>,
    pub provenance: Provenance,
    pub data_source: FeatureSource,
    pub satellite_features: bool,
    pub model_version: String,
    pub features: FeatureSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Prediction {
    /// Structured result for a request that failed validation. Never an `Err`.
    pub fn input_error(latitude: f64, longitude: f64, date: NaiveDate, message: impl Into<String>) -> Self {
        Self {
            risk_score: INPUT_ERROR_SCORE,
            risk_level: RiskLevel::Low,
            confidence: INPUT_ERROR_CONFIDENCE,
            region: UNKNOWN_REGION.to_string(),
            latitude,
            longitude,
            date,
            timestamp: Utc::now(),
            provenance: Provenance::ErrorFallback,
            data_source: FeatureSource::Synthetic,
            satellite_features: false,
            model_version: MODEL_VERSION.to_string(),
            features: FeatureSet::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

pub fn model_version(source: FeatureSource) -> &'static str {
    match source {
        FeatureSource::Synthetic => MODEL_VERSION,
        FeatureSource::Satellite => MODEL_VERSION_ENHANCED,
    }
}
