//! Baseline environmental features from location and date.
//!
//! There is no observation behind these values. They are closed-form seasonal
//! and geographic trends plus Gaussian noise, shaped so that the dry season
//! (around day 100) is hot, windy, dry and sparsely vegetated.

use chrono::NaiveDate;
use tracing::warn;

use super::noise::NoiseSource;
use super::season::{day_of_year, latitude_coolness, season_factor};
use super::{Feature, FeatureSet};
use crate::coords::Coordinate;
use crate::error::SynthesisError;
use crate::region::RegionResolver;

/// Builds the synthetic baseline `FeatureSet`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureSynthesizer {
    regions: RegionResolver,
}

impl FeatureSynthesizer {
    pub fn new(regions: RegionResolver) -> Self {
        Self { regions }
    }

    /// Synthesize the twelve base features. Never fails: any arithmetic
    /// failure is logged and replaced by [`FeatureSet::defaults`].
    pub fn synthesize(
        &self,
        coord: Coordinate,
        date: NaiveDate,
        region: &str,
        noise: &mut dyn NoiseSource,
    ) -> FeatureSet {
        match self.try_synthesize(coord, date, region, noise) {
            Ok(features) => features,
            Err(e) => {
                warn!(
                    lat = coord.latitude,
                    lng = coord.longitude,
                    error = %e,
                    "feature synthesis failed, using default features"
                );
                FeatureSet::defaults()
            }
        }
    }

    /// Fallible core of [`synthesize`](Self::synthesize).
    pub fn try_synthesize(
        &self,
        coord: Coordinate,
        date: NaiveDate,
        region: &str,
        noise: &mut dyn NoiseSource,
    ) -> Result<FeatureSet, SynthesisError> {
        let season = season_factor(day_of_year(date));
        let wet = 1.0 - season;
        let coolness = latitude_coolness(coord.latitude);

        let elevation = (self.regions.elevation_baseline(region) + noise.gaussian(0.0, 200.0)).max(0.0);
        let aspect = noise.uniform(0.0, 360.0);

        let raw = [
            (
                Feature::Temperature,
                15.0 + 15.0 * season - 5.0 * coolness + noise.gaussian(0.0, 3.0),
            ),
            (Feature::Humidity, 40.0 + 30.0 * wet + noise.gaussian(0.0, 10.0)),
            (Feature::WindSpeed, 2.0 + 8.0 * season + noise.gaussian(0.0, 2.0)),
            (Feature::Precipitation, 5.0 * wet + noise.gaussian(0.0, 2.0)),
            (Feature::VegetationIndex, 0.3 + 0.4 * wet + noise.gaussian(0.0, 0.1)),
            (Feature::SoilMoisture, 20.0 + 30.0 * wet + noise.gaussian(0.0, 5.0)),
            (Feature::Elevation, elevation),
            (Feature::Slope, noise.gaussian(10.0, 8.0)),
            (Feature::Aspect, aspect),
            (Feature::WindDirection, noise.uniform(0.0, 360.0)),
            (Feature::LandUse, 50.0 + noise.gaussian(0.0, 20.0)),
            (
                Feature::Hillshade,
                150.0 + 100.0 * aspect.to_radians().sin() + noise.gaussian(0.0, 30.0),
            ),
        ];

        let mut features = FeatureSet::new();
        for (feature, value) in raw {
            if !value.is_finite() {
                return Err(SynthesisError::NonFinite {
                    feature: feature.name(),
                    value,
                });
            }
            features.set(feature, value);
        }
        Ok(features)
    }
}
