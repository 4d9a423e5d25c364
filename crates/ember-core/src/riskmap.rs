//! Area risk maps: the per-point pipeline repeated over a fixed grid.
//!
//! Pipeline:
//!   1. Validate bounds
//!   2. Inclusive linear spacing of GRID_RESOLUTION latitudes × longitudes
//!   3. Score every cell (in parallel with the `threading` feature)
//!   4. Summary statistics over cells with a positive score
//!   5. Hotspots: every cell at or above HOTSPOT_THRESHOLD

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDate;
#[cfg(feature = "threading")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coords::{linspace, Bounds, Coordinate};
use crate::error::Result;
use crate::grid::RiskGrid;
use crate::scorer::RiskLevel;

// ── Grid constants ────────────────────────────────────────────────────────────

/// Cells per axis.
pub const GRID_RESOLUTION: usize = 20;
/// Cells scoring at or above this are reported as hotspots.
pub const HOTSPOT_THRESHOLD: f64 = 0.6;

// ── Public structs ────────────────────────────────────────────────────────────

/// Anything that can score a single grid cell.
///
/// `stream` is the cell's row-major index, used to give each cell its own
/// noise source.
pub trait CellPredictor: Sync {
    fn predict_cell(&self, coord: Coordinate, date: NaiveDate, stream: u64) -> Result<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSummary {
    /// Always width × height, including cells that failed.
    pub total_cells: usize,
    /// Per-level counts over cells with a positive score.
    pub risk_distribution: BTreeMap<RiskLevel, usize>,
    pub average_risk: f64,
    pub max_risk: f64,
    pub hotspot_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub latitude: f64,
    pub longitude: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

/// Full output of an area query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMap {
    pub risk_grid: RiskGrid,
    pub dimensions: Dimensions,
    pub summary: MapSummary,
    pub hotspots: Vec<Hotspot>,
    pub bounds: Bounds,
    pub date: NaiveDate,
    pub processing_time_ms: u64,
}

// ── Aggregator ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct RiskMapAggregator {
    resolution: usize,
}

impl Default for RiskMapAggregator {
    fn default() -> Self {
        Self { resolution: GRID_RESOLUTION }
    }
}

impl RiskMapAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score every cell of `bounds`. Only invalid bounds are an error; a
    /// failing cell is logged and scored 0.0.
    pub fn generate<P: CellPredictor>(&self, predictor: &P, bounds: Bounds, date: NaiveDate) -> Result<RiskMap> {
        let t = Instant::now();
        let bounds = bounds.validate()?;

        let (width, height) = (self.resolution, self.resolution);
        let lats = linspace(bounds.south, bounds.north, height);
        let lngs = linspace(bounds.west, bounds.east, width);
        let cells: Vec<Coordinate> = lats
            .iter()
            .flat_map(|&lat| lngs.iter().map(move |&lng| Coordinate::new(lat, lng)))
            .collect();

        let score_cell = |(k, coord): (usize, &Coordinate)| match predictor.predict_cell(*coord, date, k as u64) {
            Ok(score) => score,
            Err(e) => {
                warn!(lat = coord.latitude, lng = coord.longitude, error = %e, "grid cell failed, scoring 0");
                0.0
            }
        };

        #[cfg(feature = "threading")]
        let scores: Vec<f64> = cells.par_iter().enumerate().map(score_cell).collect();
        #[cfg(not(feature = "threading"))]
        let scores: Vec<f64> = cells.iter().enumerate().map(score_cell).collect();

        let hotspots: Vec<Hotspot> = cells
            .iter()
            .zip(&scores)
            .filter(|(_, &s)| s >= HOTSPOT_THRESHOLD)
            .map(|(c, &s)| Hotspot {
                latitude: c.latitude,
                longitude: c.longitude,
                risk_score: s,
                risk_level: RiskLevel::from_score(s),
            })
            .collect();

        let summary = summarize(&scores, hotspots.len());
        let risk_grid = RiskGrid::from_row_major(width, height, scores)
            .unwrap_or_else(|| RiskGrid::new(width, height, 0.0));

        let processing_time_ms = t.elapsed().as_millis() as u64;
        debug!(
            cells = summary.total_cells,
            hotspots = summary.hotspot_count,
            ms = processing_time_ms,
            "risk map generated"
        );

        Ok(RiskMap {
            risk_grid,
            dimensions: Dimensions { width, height },
            summary,
            hotspots,
            bounds,
            date,
            processing_time_ms,
        })
    }
}

fn summarize(scores: &[f64], hotspot_count: usize) -> MapSummary {
    let mut risk_distribution: BTreeMap<RiskLevel, usize> = RiskLevel::ALL.iter().map(|&l| (l, 0)).collect();
    let positive: Vec<f64> = scores.iter().copied().filter(|&s| s > 0.0).collect();
    for &s in &positive {
        *risk_distribution.entry(RiskLevel::from_score(s)).or_insert(0) += 1;
    }

    let (average_risk, max_risk) = if positive.is_empty() {
        (0.0, 0.0)
    } else {
        let mean = positive.iter().sum::<f64>() / positive.len() as f64;
        (mean, positive.iter().cloned().fold(f64::NEG_INFINITY, f64::max))
    };

    MapSummary {
        total_cells: scores.len(),
        risk_distribution,
        average_risk,
        max_risk,
        hotspot_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmberError;
    use approx::assert_abs_diff_eq;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 10).unwrap()
    }

    fn delhi_box() -> Bounds {
        Bounds::new(29.0, 28.0, 78.0, 77.0)
    }

    /// Score rises from south-west to north-east; every 7th cell fails.
    struct Ramp;

    impl CellPredictor for Ramp {
        fn predict_cell(&self, coord: Coordinate, _date: NaiveDate, stream: u64) -> Result<f64> {
            if stream % 7 == 3 {
                return Err(EmberError::Config("injected".into()));
            }
            Ok(((coord.latitude - 28.0) + (coord.longitude - 77.0)) / 2.0)
        }
    }

    struct Constant(f64);

    impl CellPredictor for Constant {
        fn predict_cell(&self, _: Coordinate, _: NaiveDate, _: u64) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct AlwaysFails;

    impl CellPredictor for AlwaysFails {
        fn predict_cell(&self, _: Coordinate, _: NaiveDate, _: u64) -> Result<f64> {
            Err(EmberError::Config("down".into()))
        }
    }

    #[test]
    fn failing_cells_still_count() {
        let map = RiskMapAggregator::new().generate(&Ramp, delhi_box(), day()).unwrap();
        assert_eq!(map.dimensions, Dimensions { width: 20, height: 20 });
        assert_eq!(map.summary.total_cells, 400);
        assert_eq!(map.risk_grid.get(0, 3), 0.0);
        let counted: usize = map.summary.risk_distribution.values().sum();
        // 400 cells, 57 injected failures, plus the south-west corner scoring 0.
        assert_eq!(counted, 400 - 57 - 1);
    }

    #[test]
    fn grid_is_south_to_north_west_to_east() {
        let map = RiskMapAggregator::new().generate(&Ramp, delhi_box(), day()).unwrap();
        assert_abs_diff_eq!(map.risk_grid.get(0, 0), 0.0);
        assert_abs_diff_eq!(map.risk_grid.get(19, 19), 1.0, epsilon = 1e-12);
        assert!(map.risk_grid.get(19, 0) > map.risk_grid.get(0, 0));
        assert!(map.risk_grid.get(0, 19) > map.risk_grid.get(0, 0));
    }

    #[test]
    fn hotspots_are_cells_at_or_above_threshold() {
        let map = RiskMapAggregator::new().generate(&Ramp, delhi_box(), day()).unwrap();
        let expected = map.risk_grid.values().iter().filter(|&&s| s >= HOTSPOT_THRESHOLD).count();
        assert_eq!(map.hotspots.len(), expected);
        assert_eq!(map.summary.hotspot_count, expected);
        assert!(map.hotspots.iter().all(|h| h.risk_score >= HOTSPOT_THRESHOLD));
        assert!(map.hotspots.iter().all(|h| h.risk_level >= RiskLevel::High));
        assert_abs_diff_eq!(map.summary.max_risk, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn summary_statistics_for_constant_map() {
        let map = RiskMapAggregator::new().generate(&Constant(0.6), delhi_box(), day()).unwrap();
        assert_eq!(map.hotspots.len(), 400);
        assert_abs_diff_eq!(map.summary.average_risk, 0.6, epsilon = 1e-12);
        assert_eq!(map.summary.risk_distribution[&RiskLevel::High], 400);
        assert_eq!(map.summary.risk_distribution[&RiskLevel::Low], 0);
    }

    #[test]
    fn all_failures_give_empty_statistics() {
        let map = RiskMapAggregator::new().generate(&AlwaysFails, delhi_box(), day()).unwrap();
        assert_eq!(map.summary.total_cells, 400);
        assert_eq!(map.summary.average_risk, 0.0);
        assert_eq!(map.summary.max_risk, 0.0);
        assert!(map.hotspots.is_empty());
        assert!(map.risk_grid.values().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        let inverted = Bounds::new(28.0, 29.0, 78.0, 77.0);
        let err = RiskMapAggregator::new().generate(&Constant(0.5), inverted, day()).unwrap_err();
        assert!(matches!(err, EmberError::InvalidBounds(_)));
    }

    #[test]
    fn map_serializes_with_camel_case_keys() {
        let map = RiskMapAggregator::new().generate(&Constant(0.3), delhi_box(), day()).unwrap();
        let v = serde_json::to_value(&map).unwrap();
        assert_eq!(v["riskGrid"].as_array().unwrap().len(), 20);
        assert_eq!(v["summary"]["totalCells"], 400);
        assert_eq!(v["summary"]["riskDistribution"]["MODERATE"], 400);
        assert!(v.get("processingTimeMs").is_some());
    }
}
