//! Feature vector in the exact layout the classifier was trained on.
//!
//! The trained model sees three days of dynamic bands, the two day-to-day
//! differences, a burn mask and five static terrain bands:
//!
//! ```text
//! [ 0..15)  lag t-2, t-1, t     × (TempC, U10, V10, WindSpeed, NDVI)
//! [15..25)  diff (t-1)-(t-2), t-(t-1) × same bands
//! [25]      burn mask
//! [26..31)  LULC, DEM, Slope, Aspect, Hillshade
//! ```
//!
//! Only one day is observed, so the lag days are scaled copies of it.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::features::{Feature, FeatureSet};

pub const LAG_DAYS: usize = 3;
pub const DYNAMIC_BANDS: usize = 5;
pub const STATIC_BANDS: usize = 5;
pub const DIFF_SETS: usize = LAG_DAYS - 1;

/// Total vector length: 15 lag + 10 diff + 1 burn + 5 static.
pub const FEATURE_COUNT: usize =
    LAG_DAYS * DYNAMIC_BANDS + DIFF_SETS * DYNAMIC_BANDS + 1 + STATIC_BANDS;

/// Multipliers producing days t-2, t-1, t from the observed day.
pub const LAG_FACTORS: [f64; LAG_DAYS] = [0.85, 0.92, 1.0];

/// No fire is assumed to be burning at prediction time.
pub const BURN_MASK: f64 = 0.0;

pub const DYNAMIC_BAND_NAMES: [&str; DYNAMIC_BANDS] = ["TempC", "U10", "V10", "WindSpeed", "NDVI"];
pub const STATIC_BAND_NAMES: [&str; STATIC_BANDS] = ["LULC", "DEM", "Slope", "Aspect", "Hillshade"];

// Defaults for features missing from the set.
const DEFAULT_TEMPERATURE: f64 = 25.0;
const DEFAULT_WIND_SPEED: f64 = 5.0;
const DEFAULT_WIND_DIRECTION: f64 = 270.0;
const DEFAULT_NDVI: f64 = 0.5;

const STATIC_DEFAULTS: [(Feature, f64); STATIC_BANDS] = [
    (Feature::LandUse, 50.0),
    (Feature::Elevation, 500.0),
    (Feature::Slope, 10.0),
    (Feature::Aspect, 180.0),
    (Feature::Hillshade, 200.0),
];

/// Name of every slot, e.g. `TempC_t-2`, `diff1_NDVI`, `BurnNow`, `DEM`.
pub fn vector_layout() -> Vec<String> {
    let mut names = Vec::with_capacity(FEATURE_COUNT);
    for day in ["t-2", "t-1", "t"] {
        for band in DYNAMIC_BAND_NAMES {
            names.push(format!("{band}_{day}"));
        }
    }
    for set in 1..=DIFF_SETS {
        for band in DYNAMIC_BAND_NAMES {
            names.push(format!("diff{set}_{band}"));
        }
    }
    names.push("BurnNow".to_string());
    names.extend(STATIC_BAND_NAMES.iter().map(|s| s.to_string()));
    names
}

/// Fixed-length model input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    /// Build from any length: shorter input is zero-padded, longer truncated.
    pub fn from_vec(values: Vec<f32>) -> Self {
        let mut array = [0.0f32; FEATURE_COUNT];
        for (slot, v) in array.iter_mut().zip(values) {
            *slot = v;
        }
        Self { values: array }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }
}

/// Converts a merged `FeatureSet` into a `FeatureVector`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vectorizer;

impl Vectorizer {
    pub fn new() -> Self {
        Self
    }

    pub fn vectorize(&self, features: &FeatureSet) -> FeatureVector {
        let raw = self.raw_values(features);
        if raw.len() != FEATURE_COUNT {
            warn!(len = raw.len(), expected = FEATURE_COUNT, "adjusting feature vector length");
        }
        FeatureVector::from_vec(raw.into_iter().map(|v| v as f32).collect())
    }

    fn raw_values(&self, features: &FeatureSet) -> Vec<f64> {
        let dynamic = dynamic_bands(features);

        let mut out = Vec::with_capacity(FEATURE_COUNT);
        for factor in LAG_FACTORS {
            out.extend(dynamic.iter().map(|v| v * factor));
        }
        for day in 0..DIFF_SETS {
            let (prev, next) = (day * DYNAMIC_BANDS, (day + 1) * DYNAMIC_BANDS);
            for band in 0..DYNAMIC_BANDS {
                out.push(out[next + band] - out[prev + band]);
            }
        }
        out.push(BURN_MASK);
        out.extend(STATIC_DEFAULTS.iter().map(|&(f, d)| features.get_or(f, d)));
        out
    }
}

/// Observed-day values of TempC, U10, V10, WindSpeed, NDVI.
fn dynamic_bands(features: &FeatureSet) -> [f64; DYNAMIC_BANDS] {
    let temp = features.get_or(Feature::Temperature, DEFAULT_TEMPERATURE);
    let speed = features.get_or(Feature::WindSpeed, DEFAULT_WIND_SPEED);
    let dir = features
        .get_or(Feature::WindDirection, DEFAULT_WIND_DIRECTION)
        .to_radians();
    let ndvi = features.get_or(Feature::VegetationIndex, DEFAULT_NDVI);
    [temp, speed * dir.cos(), speed * dir.sin(), speed, ndvi]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> FeatureSet {
        [
            (Feature::Temperature, 30.0),
            (Feature::WindSpeed, 10.0),
            (Feature::WindDirection, 0.0),
            (Feature::VegetationIndex, 0.4),
            (Feature::LandUse, 60.0),
            (Feature::Elevation, 1200.0),
            (Feature::Slope, 20.0),
            (Feature::Aspect, 90.0),
            (Feature::Hillshade, 180.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn feature_count_is_31() {
        assert_eq!(FEATURE_COUNT, 31);
        assert_eq!(vector_layout().len(), FEATURE_COUNT);
    }

    #[test]
    fn layout_slots_are_where_documented() {
        let layout = vector_layout();
        assert_eq!(layout[0], "TempC_t-2");
        assert_eq!(layout[14], "NDVI_t");
        assert_eq!(layout[15], "diff1_TempC");
        assert_eq!(layout[25], "BurnNow");
        assert_eq!(layout[26], "LULC");
        assert_eq!(layout[30], "Hillshade");
    }

    #[test]
    fn empty_set_uses_defaults_and_keeps_length() {
        let v = Vectorizer::new().vectorize(&FeatureSet::new());
        assert_eq!(v.len(), FEATURE_COUNT);
        // t-day temperature and static defaults
        assert_abs_diff_eq!(v.get(10).unwrap(), 25.0);
        assert_abs_diff_eq!(v.get(26).unwrap(), 50.0);
        assert_abs_diff_eq!(v.get(27).unwrap(), 500.0);
        assert_abs_diff_eq!(v.get(30).unwrap(), 200.0);
        // wind from 270°: U ≈ 0, V = -5
        assert_abs_diff_eq!(v.get(11).unwrap(), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(v.get(12).unwrap(), -5.0, epsilon = 1e-5);
    }

    #[test]
    fn lag_days_scale_the_observed_day() {
        let v = Vectorizer::new().vectorize(&sample());
        // TempC at t-2, t-1, t
        assert_abs_diff_eq!(v.get(0).unwrap(), 25.5, epsilon = 1e-4);
        assert_abs_diff_eq!(v.get(5).unwrap(), 27.6, epsilon = 1e-4);
        assert_abs_diff_eq!(v.get(10).unwrap(), 30.0, epsilon = 1e-4);
        // wind from 0°: U = speed, V = 0
        assert_abs_diff_eq!(v.get(11).unwrap(), 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(v.get(12).unwrap(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn differences_follow_band_order() {
        let v = Vectorizer::new().vectorize(&sample());
        for band in 0..DYNAMIC_BANDS {
            let d1 = v.get(15 + band).unwrap();
            let d2 = v.get(20 + band).unwrap();
            assert_abs_diff_eq!(d1, v.get(5 + band).unwrap() - v.get(band).unwrap(), epsilon = 1e-4);
            assert_abs_diff_eq!(d2, v.get(10 + band).unwrap() - v.get(5 + band).unwrap(), epsilon = 1e-4);
        }
        // TempC: 27.6 - 25.5 and 30 - 27.6
        assert_abs_diff_eq!(v.get(15).unwrap(), 2.1, epsilon = 1e-4);
        assert_abs_diff_eq!(v.get(20).unwrap(), 2.4, epsilon = 1e-4);
    }

    #[test]
    fn burn_mask_and_statics() {
        let v = Vectorizer::new().vectorize(&sample());
        assert_eq!(v.get(25), Some(0.0));
        let statics: Vec<f32> = (26..31).map(|i| v.get(i).unwrap()).collect();
        assert_eq!(statics, vec![60.0, 1200.0, 20.0, 90.0, 180.0]);
    }

    #[test]
    fn from_vec_pads_and_truncates() {
        let short = FeatureVector::from_vec(vec![1.0, 2.0]);
        assert_eq!(short.len(), FEATURE_COUNT);
        assert_eq!(short.get(1), Some(2.0));
        assert_eq!(short.get(30), Some(0.0));

        let long = FeatureVector::from_vec((0..40).map(|i| i as f32).collect());
        assert_eq!(long.len(), FEATURE_COUNT);
        assert_eq!(long.get(30), Some(30.0));
    }
}
