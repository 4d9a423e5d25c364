//! Geographic coordinate and bounding-box types.
//! All coordinate math uses f64 for precision.

use serde::{Deserialize, Serialize};

use crate::error::{EmberError, Result};

/// A point on the globe in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, -90 to +90.
    pub latitude: f64,
    /// Longitude in degrees, -180 to +180.
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Reject non-finite or out-of-range coordinates.
    pub fn validate(self) -> Result<Self> {
        let reason = if !self.latitude.is_finite() || !self.longitude.is_finite() {
            Some("coordinates must be finite")
        } else if !(-90.0..=90.0).contains(&self.latitude) {
            Some("latitude must be within [-90, 90]")
        } else if !(-180.0..=180.0).contains(&self.longitude) {
            Some("longitude must be within [-180, 180]")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(EmberError::InvalidCoordinate {
                lat: self.latitude,
                lng: self.longitude,
                reason,
            }),
            None => Ok(self),
        }
    }
}

/// Rectangular area in degrees, as supplied by area queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self { north, south, east, west }
    }

    /// Both corners must be valid coordinates and the box must not be inverted.
    pub fn validate(self) -> Result<Self> {
        Coordinate::new(self.south, self.west)
            .validate()
            .and_then(|_| Coordinate::new(self.north, self.east).validate())
            .map_err(|e| EmberError::InvalidBounds(e.to_string()))?;
        if self.north < self.south {
            return Err(EmberError::InvalidBounds(format!(
                "north ({}) is below south ({})",
                self.north, self.south
            )));
        }
        if self.east < self.west {
            return Err(EmberError::InvalidBounds(format!(
                "east ({}) is west of west ({})",
                self.east, self.west
            )));
        }
        Ok(self)
    }

    /// Centre of the box; used to anchor error results for area queries.
    pub fn center(&self) -> Coordinate {
        Coordinate::new((self.north + self.south) / 2.0, (self.east + self.west) / 2.0)
    }
}

/// `n` evenly spaced values from `start` to `end`, both ends included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
