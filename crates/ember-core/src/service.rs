//! Prediction service: wires the pipeline stages together.
//!
//! Per point:
//!   1. Validate coordinate (failure → input-error prediction)
//!   2. Resolve region
//!   3. Synthesize baseline features
//!   4. Merge external overlay, or add synthetic spectral bands
//!   5. Vectorize
//!   6. Score (model, else heuristic) and classify

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::config::EmberConfig;
use crate::coords::{Bounds, Coordinate};
use crate::error::{EmberError, Result};
use crate::features::merge::{parse_overlay, FeatureMerger};
use crate::features::noise::NoisePolicy;
use crate::features::synth::FeatureSynthesizer;
use crate::features::{FeatureSet, FeatureSource};
use crate::model::{ModelState, ModelStatus};
use crate::prediction::{model_version, Prediction};
use crate::region::RegionResolver;
use crate::request::{resolve_date, today, Request, Response};
use crate::riskmap::{CellPredictor, RiskMap, RiskMapAggregator};
use crate::scorer::{Provenance, RiskScorer, Score};
use crate::vector::Vectorizer;

/// Owns the region table, the resolved model and the noise policy.
/// Immutable after construction and safe to share across threads.
#[derive(Debug)]
pub struct RiskService {
    regions: RegionResolver,
    synthesizer: FeatureSynthesizer,
    merger: FeatureMerger,
    vectorizer: Vectorizer,
    scorer: RiskScorer,
    aggregator: RiskMapAggregator,
    noise: NoisePolicy,
}

impl RiskService {
    /// Resolve the model once and build the service.
    pub fn new(config: &EmberConfig) -> Self {
        let service = Self::with_model(ModelState::initialize(config), NoisePolicy::from_seed(config.seed));
        let status = service.model_status();
        info!(state = status.state, origin = ?status.origin, "risk service ready");
        service
    }

    /// Build around an already-resolved model.
    pub fn with_model(state: ModelState, noise: NoisePolicy) -> Self {
        let regions = RegionResolver::default();
        Self {
            regions,
            synthesizer: FeatureSynthesizer::new(regions),
            merger: FeatureMerger::new(),
            vectorizer: Vectorizer::new(),
            scorer: RiskScorer::new(state),
            aggregator: RiskMapAggregator::new(),
            noise,
        }
    }

    /// Synthetic-feature prediction.
    pub fn predict(&self, coord: Coordinate, date: NaiveDate) -> Prediction {
        self.predict_stream(coord, date, None, 0)
    }

    /// Prediction with an external feature overlay. `None` or an empty overlay
    /// behaves like [`predict`](Self::predict).
    pub fn predict_with_features(&self, coord: Coordinate, date: NaiveDate, overlay: Option<&FeatureSet>) -> Prediction {
        self.predict_stream(coord, date, overlay, 0)
    }

    /// One prediction per input, in input order. Invalid inputs yield
    /// input-error predictions in place.
    pub fn predict_batch(&self, coords: &[Coordinate], date: NaiveDate) -> Vec<Prediction> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &c)| self.predict_stream(c, date, None, i as u64))
            .collect()
    }

    /// Batch prediction with an unparsed date. A bad date turns every entry
    /// into an input-error prediction dated today.
    pub fn handle_batch(&self, coords: &[Coordinate], date: Option<&str>) -> Vec<Prediction> {
        match resolve_date(date) {
            Ok(date) => self.predict_batch(coords, date),
            Err(e) => {
                warn!(error = %e, count = coords.len(), "rejected batch");
                let today = today();
                coords
                    .iter()
                    .map(|c| Prediction::input_error(c.latitude, c.longitude, today, e.to_string()))
                    .collect()
            }
        }
    }

    pub fn generate_map(&self, bounds: Bounds, date: NaiveDate) -> Result<RiskMap> {
        self.aggregator.generate(self, bounds, date)
    }

    pub fn detect_region(&self, lat: f64, lng: f64) -> &'static str {
        self.regions.resolve(lat, lng)
    }

    pub fn model_status(&self) -> ModelStatus {
        self.scorer.status()
    }

    /// Entry point for a decoded JSON request. Never fails: bad input comes
    /// back as an input-error prediction.
    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::Point(req) => match resolve_date(req.date.as_deref()) {
                Ok(date) => {
                    let overlay = req.features.as_ref().map(parse_overlay);
                    let p = self.predict_with_features(req.coordinate(), date, overlay.as_ref());
                    Response::Prediction(Box::new(p))
                }
                Err(e) => input_error(req.coordinate(), today(), &e),
            },
            Request::Area(req) => {
                let center = req.bounds.center();
                match resolve_date(req.date.as_deref()) {
                    Ok(date) => match self.generate_map(req.bounds, date) {
                        Ok(map) => Response::Map(Box::new(map)),
                        Err(e) => input_error(center, date, &e),
                    },
                    Err(e) => input_error(center, today(), &e),
                }
            }
        }
    }

    fn predict_stream(&self, coord: Coordinate, date: NaiveDate, overlay: Option<&FeatureSet>, stream: u64) -> Prediction {
        let coord = match coord.validate() {
            Ok(c) => c,
            Err(e) => {
                warn!(lat = coord.latitude, lng = coord.longitude, error = %e, "rejected coordinate");
                return Prediction::input_error(coord.latitude, coord.longitude, date, e.to_string());
            }
        };

        let region = self.regions.resolve(coord.latitude, coord.longitude);
        let (features, source, score) = self.run_pipeline(coord, date, region, overlay, stream);

        debug!(
            lat = coord.latitude,
            lng = coord.longitude,
            region,
            score = score.risk_score,
            method = ?score.method,
            "prediction"
        );

        Prediction {
            risk_score: score.risk_score,
            risk_level: score.level(),
            confidence: score.confidence,
            region: region.to_string(),
            latitude: coord.latitude,
            longitude: coord.longitude,
            date,
            timestamp: Utc::now(),
            provenance: Provenance::from_parts(source, score.method),
            data_source: source,
            satellite_features: source == FeatureSource::Satellite,
            model_version: model_version(source).to_string(),
            features,
            error: None,
        }
    }

    /// Steps 3 to 6 for an already validated coordinate.
    fn run_pipeline(
        &self,
        coord: Coordinate,
        date: NaiveDate,
        region: &str,
        overlay: Option<&FeatureSet>,
        stream: u64,
    ) -> (FeatureSet, FeatureSource, Score) {
        let mut noise = self.noise.source(stream);
        let baseline = self.synthesizer.synthesize(coord, date, region, &mut *noise);
        let (features, source) = self.merger.merge(&baseline, overlay, &mut *noise);
        let vector = self.vectorizer.vectorize(&features);
        let score = self.scorer.score(&vector, &features, date, source);
        (features, source, score)
    }
}

fn input_error(at: Coordinate, date: NaiveDate, err: &EmberError) -> Response {
    warn!(lat = at.latitude, lng = at.longitude, error = %err, "rejected request");
    Response::Prediction(Box::new(Prediction::input_error(at.latitude, at.longitude, date, err.to_string())))
}

/// Grid cells run the synthetic-only pipeline.
impl CellPredictor for RiskService {
    fn predict_cell(&self, coord: Coordinate, date: NaiveDate, stream: u64) -> Result<f64> {
        let coord = coord.validate()?;
        let region = self.regions.resolve(coord.latitude, coord.longitude);
        let (_, _, score) = self.run_pipeline(coord, date, region, None, stream);
        Ok(score.risk_score)
    }
}
