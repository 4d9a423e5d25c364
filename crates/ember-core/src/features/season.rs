//! Seasonal and latitudinal factors shared by synthesis and the heuristic scorer.
//!
//! The dry-season proxy is a cosine over the day of year that peaks at day 100
//! (early April, pre-monsoon) and bottoms out half a year later.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};

/// Day of year with the strongest dry-season signal.
pub const DRY_SEASON_PEAK_DOY: f64 = 100.0;

/// Latitude used as the zero point of the coolness term.
const COOLNESS_ORIGIN_LAT: f64 = 8.0;
/// Degrees of latitude spanning the coolness term's unit range.
const COOLNESS_SPAN_DEG: f64 = 30.0;

fn phase(doy: f64) -> f64 {
    (2.0 * PI * (doy - DRY_SEASON_PEAK_DOY) / 365.0).cos()
}

/// 0-1 dryness factor for a day of year; 1 at the peak.
pub fn season_factor(doy: f64) -> f64 {
    0.5 + 0.5 * phase(doy)
}

/// Additive heuristic boost in [0, 0.2]; 0 half a year after the peak.
pub fn seasonal_boost(doy: f64) -> f64 {
    0.1 * (1.0 + phase(doy))
}

/// Normalised latitude: 0 at 8°N, 1 at 38°N. Northern sites run cooler.
pub fn latitude_coolness(lat: f64) -> f64 {
    (lat - COOLNESS_ORIGIN_LAT) / COOLNESS_SPAN_DEG
}

pub fn day_of_year(date: NaiveDate) -> f64 {
    date.ordinal() as f64
}
