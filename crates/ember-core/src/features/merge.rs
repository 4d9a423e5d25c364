//! Satellite overlay merge.
//!
//! External values always win over the synthetic baseline. When red and NIR
//! reflectance are both available, NDVI recomputed from them replaces any
//! supplied or synthetic vegetation index.

use std::collections::HashMap;

use tracing::debug;

use super::noise::NoiseSource;
use super::{Feature, FeatureSet, FeatureSource};

/// Synthetic reflectance: (band, mean, noise sd).
const SYNTHETIC_BANDS: [(Feature, f64, f64); 6] = [
    (Feature::Blue, 0.15, 0.05),
    (Feature::Green, 0.20, 0.05),
    (Feature::Red, 0.25, 0.05),
    (Feature::Nir, 0.50, 0.10),
    (Feature::Swir1, 0.35, 0.05),
    (Feature::Swir2, 0.25, 0.05),
];

/// Merges optional external features over a synthetic baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureMerger;

impl FeatureMerger {
    pub fn new() -> Self {
        Self
    }

    /// Returns the merged set and the provenance of its values. An empty
    /// overlay counts as absent.
    pub fn merge(
        &self,
        baseline: &FeatureSet,
        external: Option<&FeatureSet>,
        noise: &mut dyn NoiseSource,
    ) -> (FeatureSet, FeatureSource) {
        match external.filter(|e| !e.is_empty()) {
            Some(overlay) => (self.merge_satellite(baseline, overlay), FeatureSource::Satellite),
            None => (self.add_synthetic_bands(baseline, noise), FeatureSource::Synthetic),
        }
    }

    fn add_synthetic_bands(&self, baseline: &FeatureSet, noise: &mut dyn NoiseSource) -> FeatureSet {
        let mut merged = baseline.clone();
        for (band, mean, sd) in SYNTHETIC_BANDS {
            merged.set(band, noise.gaussian(mean, sd));
        }
        if let Some(ndvi) = merged.get(Feature::VegetationIndex) {
            merged.set(Feature::ModisNdvi, ndvi);
        }
        merged
    }

    fn merge_satellite(&self, baseline: &FeatureSet, overlay: &FeatureSet) -> FeatureSet {
        let mut merged = baseline.clone();

        // Bands the collaborator did not deliver take their nominal reflectance.
        for (band, mean, _) in SYNTHETIC_BANDS {
            merged.set(band, mean);
        }
        if let Some(ndvi) = baseline.get(Feature::VegetationIndex) {
            merged.set(Feature::ModisNdvi, ndvi);
        }

        merged.overlay(overlay);

        if let (Some(red), Some(nir)) = (merged.get(Feature::Red), merged.get(Feature::Nir)) {
            let ndvi = if nir + red > 0.0 {
                Some((nir - red) / (nir + red))
            } else {
                merged.get(Feature::VegetationIndex)
            };
            if let Some(ndvi) = ndvi {
                merged.set(Feature::NdviCalculated, ndvi);
                merged.set(Feature::VegetationIndex, ndvi);
            }
        }
        merged
    }
}

/// Convert a loosely typed external mapping into a `FeatureSet`.
///
/// Unknown names and non-finite values are dropped; out-of-range values are
/// clamped.
pub fn parse_overlay(raw: &HashMap<String, f64>) -> FeatureSet {
    let mut set = FeatureSet::new();
    for (name, &value) in raw {
        match Feature::from_name(name) {
            Some(feature) if value.is_finite() => set.set(feature, value),
            Some(feature) => debug!(%feature, value, "dropping non-finite overlay value"),
            None => debug!(name = name.as_str(), "ignoring unrecognised overlay key"),
        }
    }
    set
}
