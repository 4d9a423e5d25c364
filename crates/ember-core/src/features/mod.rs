//! Environmental feature layer.
//!
//! Produces the per-request `FeatureSet` that feeds the vectorizer:
//!   seasonal / latitude factors → baseline synthesis → satellite overlay merge.
//!
//! Every value in a `FeatureSet` is kept inside its physical range; the
//! setters clamp on write so no code path can store an out-of-range value.

pub mod merge;
pub mod noise;
pub mod season;
pub mod synth;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed feature vocabulary. Wire names match the external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "humidity")]
    Humidity,
    #[serde(rename = "windSpeed")]
    WindSpeed,
    #[serde(rename = "precipitation")]
    Precipitation,
    #[serde(rename = "vegetationIndex")]
    VegetationIndex,
    #[serde(rename = "soilMoisture")]
    SoilMoisture,
    #[serde(rename = "elevation")]
    Elevation,
    #[serde(rename = "slope")]
    Slope,
    #[serde(rename = "aspect")]
    Aspect,
    #[serde(rename = "windDirection")]
    WindDirection,
    #[serde(rename = "landUse")]
    LandUse,
    #[serde(rename = "hillshade")]
    Hillshade,
    #[serde(rename = "blue")]
    Blue,
    #[serde(rename = "green")]
    Green,
    #[serde(rename = "red")]
    Red,
    #[serde(rename = "nir")]
    Nir,
    #[serde(rename = "swir1")]
    Swir1,
    #[serde(rename = "swir2")]
    Swir2,
    #[serde(rename = "modisNdvi")]
    ModisNdvi,
    #[serde(rename = "ndvi_calculated")]
    NdviCalculated,
}

impl Feature {
    pub const ALL: [Feature; 20] = [
        Feature::Temperature,
        Feature::Humidity,
        Feature::WindSpeed,
        Feature::Precipitation,
        Feature::VegetationIndex,
        Feature::SoilMoisture,
        Feature::Elevation,
        Feature::Slope,
        Feature::Aspect,
        Feature::WindDirection,
        Feature::LandUse,
        Feature::Hillshade,
        Feature::Blue,
        Feature::Green,
        Feature::Red,
        Feature::Nir,
        Feature::Swir1,
        Feature::Swir2,
        Feature::ModisNdvi,
        Feature::NdviCalculated,
    ];

    /// Surface reflectance bands, all in [0, 1].
    pub const SPECTRAL_BANDS: [Feature; 6] = [
        Feature::Blue,
        Feature::Green,
        Feature::Red,
        Feature::Nir,
        Feature::Swir1,
        Feature::Swir2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::WindSpeed => "windSpeed",
            Feature::Precipitation => "precipitation",
            Feature::VegetationIndex => "vegetationIndex",
            Feature::SoilMoisture => "soilMoisture",
            Feature::Elevation => "elevation",
            Feature::Slope => "slope",
            Feature::Aspect => "aspect",
            Feature::WindDirection => "windDirection",
            Feature::LandUse => "landUse",
            Feature::Hillshade => "hillshade",
            Feature::Blue => "blue",
            Feature::Green => "green",
            Feature::Red => "red",
            Feature::Nir => "nir",
            Feature::Swir1 => "swir1",
            Feature::Swir2 => "swir2",
            Feature::ModisNdvi => "modisNdvi",
            Feature::NdviCalculated => "ndvi_calculated",
        }
    }

    /// Look up a feature by its wire name.
    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Documented physical range (inclusive).
    pub fn range(self) -> (f64, f64) {
        match self {
            Feature::Temperature => (-10.0, 50.0),
            Feature::Humidity => (10.0, 100.0),
            Feature::WindSpeed => (0.0, 30.0),
            Feature::Precipitation | Feature::Elevation => (0.0, f64::INFINITY),
            Feature::VegetationIndex | Feature::ModisNdvi | Feature::NdviCalculated => (-1.0, 1.0),
            Feature::SoilMoisture | Feature::LandUse => (0.0, 100.0),
            Feature::Slope => (0.0, 45.0),
            Feature::Aspect | Feature::WindDirection => (0.0, 360.0),
            Feature::Hillshade => (0.0, 255.0),
            Feature::Blue
            | Feature::Green
            | Feature::Red
            | Feature::Nir
            | Feature::Swir1
            | Feature::Swir2 => (0.0, 1.0),
        }
    }

    pub fn clamp(self, value: f64) -> f64 {
        let (lo, hi) = self.range();
        value.clamp(lo, hi)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the feature values of a prediction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureSource {
    Synthetic,
    Satellite,
}

/// Clamped mapping from feature to value.
///
/// Deserialization goes through [`FeatureSet::set`], so decoded values are
/// clamped the same way as values stored in code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Feature, f64>", into = "BTreeMap<Feature, f64>")]
pub struct FeatureSet {
    values: BTreeMap<Feature, f64>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fallback values used when synthesis fails.
    pub fn defaults() -> Self {
        [
            (Feature::Temperature, 25.0),
            (Feature::Humidity, 50.0),
            (Feature::WindSpeed, 5.0),
            (Feature::Precipitation, 0.0),
            (Feature::VegetationIndex, 0.5),
            (Feature::SoilMoisture, 30.0),
            (Feature::Elevation, 500.0),
            (Feature::Slope, 10.0),
            (Feature::Aspect, 180.0),
            (Feature::WindDirection, 270.0),
            (Feature::LandUse, 50.0),
            (Feature::Hillshade, 200.0),
        ]
        .into_iter()
        .collect()
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values.get(&feature).copied()
    }

    pub fn get_or(&self, feature: Feature, default: f64) -> f64 {
        self.get(feature).unwrap_or(default)
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.values.contains_key(&feature)
    }

    /// Store `value` clamped to the feature's range. Non-finite values are
    /// ignored and leave any previous entry in place.
    pub fn set(&mut self, feature: Feature, value: f64) {
        if value.is_finite() {
            self.values.insert(feature, feature.clamp(value));
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }

    /// Overlay every entry of `other` onto `self`; `other` wins.
    pub fn overlay(&mut self, other: &FeatureSet) {
        for (k, v) in other.iter() {
            self.set(k, v);
        }
    }

    /// True when every stored value lies inside its documented range.
    pub fn is_within_ranges(&self) -> bool {
        self.iter().all(|(k, v)| {
            let (lo, hi) = k.range();
            v >= lo && v <= hi
        })
    }
}

impl FromIterator<(Feature, f64)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (Feature, f64)>>(iter: I) -> Self {
        let mut set = FeatureSet::new();
        for (k, v) in iter {
            set.set(k, v);
        }
        set
    }
}

impl From<BTreeMap<Feature, f64>> for FeatureSet {
    fn from(values: BTreeMap<Feature, f64>) -> Self {
        values.into_iter().collect()
    }
}

impl From<FeatureSet> for BTreeMap<Feature, f64> {
    fn from(set: FeatureSet) -> Self {
        set.values
    }
}
