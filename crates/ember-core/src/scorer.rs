//! Risk scoring: classifier inference with a weighted-heuristic fallback.
//!
//! Quality tiers, best first:
//!   satellite features + model → synthetic features + model → heuristic.
//! The tier actually used is reported as a [`Provenance`] tag on every result.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::features::season::{day_of_year, seasonal_boost};
use crate::features::{Feature, FeatureSet, FeatureSource};
use crate::model::linear::sigmoid;
use crate::model::{ModelOutput, ModelState, ModelStatus};
use crate::vector::FeatureVector;

// ── Confidence constants ──────────────────────────────────────────────────────

/// Confidence of the heuristic formula.
pub const HEURISTIC_CONFIDENCE: f64 = 0.75;
/// Ceiling on every reported confidence.
pub const MAX_CONFIDENCE: f64 = 0.95;
/// Added to confidence when satellite features were merged in.
pub const SATELLITE_CONFIDENCE_BOOST: f64 = 0.1;

const MODEL_CONFIDENCE_BASE: f64 = 0.6;
const MODEL_CONFIDENCE_SPAN: f64 = 0.3;

// ── Heuristic weights ─────────────────────────────────────────────────────────

const W_TEMPERATURE: f64 = 0.25;
const W_HUMIDITY: f64 = 0.20;
const W_WIND: f64 = 0.15;
const W_VEGETATION: f64 = 0.15;
const W_SOIL: f64 = 0.15;
const W_PRECIPITATION: f64 = 0.10;

// ── Classification ────────────────────────────────────────────────────────────

/// Categorical risk level. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High, RiskLevel::Extreme];

    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            RiskLevel::Extreme
        } else if score >= 0.5 {
            RiskLevel::High
        } else if score >= 0.25 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Extreme => "EXTREME",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a score was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMethod {
    Model,
    Heuristic,
}

/// Feature/model tier behind a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "satellite+model")]
    SatelliteModel,
    #[serde(rename = "synthetic+model")]
    SyntheticModel,
    #[serde(rename = "satellite+heuristic")]
    SatelliteHeuristic,
    #[serde(rename = "synthetic+heuristic")]
    SyntheticHeuristic,
    /// Input could not be processed at all.
    #[serde(rename = "error-fallback")]
    ErrorFallback,
}

impl Provenance {
    pub fn from_parts(source: FeatureSource, method: ScoringMethod) -> Self {
        match (source, method) {
            (FeatureSource::Satellite, ScoringMethod::Model) => Provenance::SatelliteModel,
            (FeatureSource::Synthetic, ScoringMethod::Model) => Provenance::SyntheticModel,
            (FeatureSource::Satellite, ScoringMethod::Heuristic) => Provenance::SatelliteHeuristic,
            (FeatureSource::Synthetic, ScoringMethod::Heuristic) => Provenance::SyntheticHeuristic,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Provenance::SatelliteModel => "satellite+model",
            Provenance::SyntheticModel => "synthetic+model",
            Provenance::SatelliteHeuristic => "satellite+heuristic",
            Provenance::SyntheticHeuristic => "synthetic+heuristic",
            Provenance::ErrorFallback => "error-fallback",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ── Scoring primitives ────────────────────────────────────────────────────────

/// Weighted sum of six dryness factors plus `boost`, clamped to [0, 1].
/// Missing features take the synthesis fallback values.
pub fn heuristic_risk(features: &FeatureSet, boost: f64) -> f64 {
    let temp = features.get_or(Feature::Temperature, 25.0);
    let humidity = features.get_or(Feature::Humidity, 50.0);
    let wind = features.get_or(Feature::WindSpeed, 5.0);
    let ndvi = features.get_or(Feature::VegetationIndex, 0.5);
    let soil = features.get_or(Feature::SoilMoisture, 30.0);
    let precip = features.get_or(Feature::Precipitation, 0.0);

    let unit = |v: f64| v.clamp(0.0, 1.0);
    let risk = W_TEMPERATURE * unit((temp - 15.0) / 30.0)
        + W_HUMIDITY * unit((100.0 - humidity) / 80.0)
        + W_WIND * unit(wind / 20.0)
        + W_VEGETATION * unit((0.8 - ndvi) / 0.8)
        + W_SOIL * unit((60.0 - soil) / 60.0)
        + W_PRECIPITATION * unit((5.0 - precip) / 5.0)
        + boost;
    risk.clamp(0.0, 1.0)
}

/// Confidence grows with distance from the 0.5 decision midpoint.
pub fn model_confidence(score: f64) -> f64 {
    (MODEL_CONFIDENCE_BASE + MODEL_CONFIDENCE_SPAN * (score - 0.5).abs() * 2.0).min(MAX_CONFIDENCE)
}

pub fn satellite_boost(confidence: f64) -> f64 {
    (confidence + SATELLITE_CONFIDENCE_BOOST).min(MAX_CONFIDENCE)
}

/// Result of scoring one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub risk_score: f64,
    pub confidence: f64,
    pub method: ScoringMethod,
}

impl Score {
    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}

// ── Scorer ────────────────────────────────────────────────────────────────────

/// Owns the resolved model state; read-only after construction.
#[derive(Debug, Default)]
pub struct RiskScorer {
    state: ModelState,
}

impl RiskScorer {
    pub fn new(state: ModelState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn status(&self) -> ModelStatus {
        self.state.status()
    }

    /// Score a vectorized request. The model is tried first; any model
    /// failure falls through to the heuristic.
    pub fn score(
        &self,
        vector: &FeatureVector,
        features: &FeatureSet,
        date: NaiveDate,
        source: FeatureSource,
    ) -> Score {
        let mut score = match self.model_score(vector) {
            Some(p) => Score {
                risk_score: p,
                confidence: model_confidence(p),
                method: ScoringMethod::Model,
            },
            None => Score {
                risk_score: heuristic_risk(features, seasonal_boost(day_of_year(date))),
                confidence: HEURISTIC_CONFIDENCE,
                method: ScoringMethod::Heuristic,
            },
        };
        if source == FeatureSource::Satellite {
            score.confidence = satellite_boost(score.confidence);
        }
        score
    }

    fn model_score(&self, vector: &FeatureVector) -> Option<f64> {
        let model = self.state.classifier()?;
        let p = match model.output(vector.as_slice()) {
            Ok(ModelOutput::Probability(p)) => p,
            Ok(ModelOutput::Decision(d)) => sigmoid(d),
            Err(e) => {
                warn!(error = %e, "model inference failed, using heuristic");
                return None;
            }
        };
        if !p.is_finite() {
            warn!(output = p, "model produced a non-finite score, using heuristic");
            return None;
        }
        Some(p.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::model::{Classifier, LogisticModel, ModelOrigin};
    use crate::vector::FEATURE_COUNT;
    use approx::assert_abs_diff_eq;

    #[derive(Debug)]
    struct Fixed(Result<ModelOutput, ()>);

    impl Classifier for Fixed {
        fn n_features(&self) -> usize {
            FEATURE_COUNT
        }
        fn output(&self, _x: &[f32]) -> Result<ModelOutput, ModelError> {
            self.0.map_err(|_| ModelError::FeatureCount { expected: 1, got: 2 })
        }
    }

    fn scorer_with(output: Result<ModelOutput, ()>) -> RiskScorer {
        RiskScorer::new(ModelState::trained(Fixed(output), 0.5, ModelOrigin::Artifact))
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 9).unwrap()
    }

    fn extreme_features() -> FeatureSet {
        [
            (Feature::Temperature, 40.0),
            (Feature::Humidity, 10.0),
            (Feature::WindSpeed, 20.0),
            (Feature::VegetationIndex, 0.0),
            (Feature::SoilMoisture, 0.0),
            (Feature::Precipitation, 0.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(RiskLevel::from_score(0.75), RiskLevel::Extreme);
        assert_eq!(RiskLevel::from_score(0.74999), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.5), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.25), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::Extreme);
    }

    #[test]
    fn level_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&RiskLevel::Moderate).unwrap(), "\"MODERATE\"");
        assert_eq!(serde_json::to_string(&Provenance::SatelliteHeuristic).unwrap(), "\"satellite+heuristic\"");
    }

    #[test]
    fn heuristic_is_deterministic() {
        let r = heuristic_risk(&extreme_features(), 0.0);
        let expected = 0.25 * (25.0 / 30.0) + 0.20 + 0.15 + 0.15 + 0.15 + 0.10;
        assert_abs_diff_eq!(r, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(r, 0.958333, epsilon = 1e-6);
    }

    #[test]
    fn heuristic_boost_is_clamped() {
        assert_eq!(heuristic_risk(&extreme_features(), 0.2), 1.0);
        let wet: FeatureSet = [
            (Feature::Temperature, 0.0),
            (Feature::Humidity, 100.0),
            (Feature::WindSpeed, 0.0),
            (Feature::VegetationIndex, 1.0),
            (Feature::SoilMoisture, 100.0),
            (Feature::Precipitation, 20.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(heuristic_risk(&wet, 0.0), 0.0);
    }

    #[test]
    fn model_confidence_formula() {
        assert_abs_diff_eq!(model_confidence(0.5), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(model_confidence(0.75), 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(model_confidence(1.0), 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(model_confidence(0.0), 0.9, epsilon = 1e-12);
    }

    #[test]
    fn probability_output_is_the_score() {
        let s = scorer_with(Ok(ModelOutput::Probability(0.8)));
        let v = FeatureVector::from_vec(vec![]);
        let out = s.score(&v, &FeatureSet::defaults(), date(), FeatureSource::Synthetic);
        assert_eq!(out.method, ScoringMethod::Model);
        assert_abs_diff_eq!(out.risk_score, 0.8);
        assert_abs_diff_eq!(out.confidence, 0.78, epsilon = 1e-12);
        assert_eq!(out.level(), RiskLevel::Extreme);
    }

    #[test]
    fn decision_output_goes_through_sigmoid() {
        let s = scorer_with(Ok(ModelOutput::Decision(0.0)));
        let out = s.score(&FeatureVector::from_vec(vec![]), &FeatureSet::new(), date(), FeatureSource::Synthetic);
        assert_abs_diff_eq!(out.risk_score, 0.5);
        assert_eq!(out.method, ScoringMethod::Model);
    }

    #[test]
    fn model_error_falls_back_to_heuristic() {
        let s = scorer_with(Err(()));
        let features = extreme_features();
        let out = s.score(&FeatureVector::from_vec(vec![]), &features, date(), FeatureSource::Synthetic);
        assert_eq!(out.method, ScoringMethod::Heuristic);
        assert_eq!(out.confidence, HEURISTIC_CONFIDENCE);
        let boost = seasonal_boost(day_of_year(date()));
        assert_abs_diff_eq!(out.risk_score, heuristic_risk(&features, boost), epsilon = 1e-12);
    }

    #[test]
    fn non_finite_output_falls_back_to_heuristic() {
        let s = scorer_with(Ok(ModelOutput::Probability(f64::NAN)));
        let out = s.score(&FeatureVector::from_vec(vec![]), &FeatureSet::defaults(), date(), FeatureSource::Synthetic);
        assert_eq!(out.method, ScoringMethod::Heuristic);
    }

    #[test]
    fn feature_count_mismatch_falls_back_to_heuristic() {
        let model = LogisticModel { weights: vec![0.1; 20], bias: 0.0 };
        let s = RiskScorer::new(ModelState::trained(model, 0.5, ModelOrigin::Artifact));
        let out = s.score(&FeatureVector::from_vec(vec![]), &FeatureSet::defaults(), date(), FeatureSource::Synthetic);
        assert_eq!(out.method, ScoringMethod::Heuristic);
    }

    #[test]
    fn fallback_state_uses_heuristic() {
        let s = RiskScorer::new(ModelState::Fallback);
        let out = s.score(&FeatureVector::from_vec(vec![]), &FeatureSet::defaults(), date(), FeatureSource::Synthetic);
        assert_eq!(out.method, ScoringMethod::Heuristic);
        assert!((0.0..=1.0).contains(&out.risk_score));
    }

    #[test]
    fn satellite_features_raise_confidence_up_to_cap() {
        for output in [ModelOutput::Probability(0.5), ModelOutput::Probability(0.99)] {
            let s = scorer_with(Ok(output));
            let v = FeatureVector::from_vec(vec![]);
            let syn = s.score(&v, &FeatureSet::defaults(), date(), FeatureSource::Synthetic);
            let sat = s.score(&v, &FeatureSet::defaults(), date(), FeatureSource::Satellite);
            assert!(sat.confidence >= syn.confidence);
            assert!(sat.confidence <= MAX_CONFIDENCE);
        }
        let h = RiskScorer::new(ModelState::Fallback);
        let sat = h.score(&FeatureVector::from_vec(vec![]), &FeatureSet::defaults(), date(), FeatureSource::Satellite);
        assert_abs_diff_eq!(sat.confidence, 0.85, epsilon = 1e-12);
    }

    #[test]
    fn provenance_from_parts() {
        assert_eq!(
            Provenance::from_parts(FeatureSource::Satellite, ScoringMethod::Model).tag(),
            "satellite+model"
        );
        assert_eq!(
            Provenance::from_parts(FeatureSource::Synthetic, ScoringMethod::Heuristic).to_string(),
            "synthetic+heuristic"
        );
    }
}
