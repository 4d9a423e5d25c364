//! JSON request/response envelope for the service entry point.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coords::{Bounds, Coordinate};
use crate::error::{EmberError, Result};
use crate::prediction::Prediction;
use crate::riskmap::RiskMap;

/// A point prediction or an area map request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Request {
    Area(AreaRequest),
    Point(PointRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// External feature overlay, keyed by wire name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<HashMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRequest {
    pub bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl PointRequest {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Whatever the request produced; input errors are a `Prediction` with its
/// `error` field set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Prediction(Box<Prediction>),
    Map(Box<RiskMap>),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Prediction(p) if p.is_error())
    }
}

/// Today in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse an ISO-8601 date: `YYYY-MM-DD`, a naive date-time, or RFC 3339.
/// Only the calendar date is kept.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        return Ok(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    Err(EmberError::InvalidDate(s.to_string()))
}

/// `None` resolves to [`today`].
pub fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    date.map_or_else(|| Ok(today()), parse_date)
}
