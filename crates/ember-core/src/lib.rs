//! Wildfire risk prediction core.
//!
//! Pipeline per point: region → synthetic features → satellite merge →
//! 31-slot vector → model or heuristic score → risk level. Area queries repeat
//! it over a 20×20 grid.

pub mod config;
pub mod coords;
pub mod error;
pub mod features;
pub mod grid;
pub mod model;
pub mod prediction;
pub mod region;
pub mod request;
pub mod riskmap;
pub mod scorer;
pub mod service;
pub mod vector;

pub use config::EmberConfig;
pub use coords::{Bounds, Coordinate};
pub use error::{EmberError, Result};
pub use features::{Feature, FeatureSet, FeatureSource};
pub use prediction::Prediction;
pub use request::{Request, Response};
pub use riskmap::RiskMap;
pub use scorer::{Provenance, RiskLevel};
pub use service::RiskService;
