use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geo::GeoPoint;

fn default_dot_source() -> String {
    "dot".to_string()
}

/// Authoritative, slow-moving baseline (state DOT / AADT derived).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotTrafficData {
    #[serde(default = "default_dot_source")]
    pub source: String,
    pub monthly_estimate: u64,
    #[serde(default)]
    pub daily_average: Option<u64>,
}

/// Fast-changing activity signal (place popularity / busyness).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleTrafficData {
    /// Daily foot traffic
    pub avg_daily_traffic: u64,
    /// 0-100 activity intensity
    pub area_vitality_score: f64,
}

/// Everything the fusion engine needs for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficInputs {
    pub location: GeoPoint,
    #[serde(default)]
    pub dot: Option<DotTrafficData>,
    #[serde(default)]
    pub google: Option<GoogleTrafficData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimarySource {
    Blended,
    Dot,
    Google,
    /// Synthetic placeholder, not measured data
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficTrend {
    pub direction: TrendDirection,
    pub change_percent: f64,
    pub current_estimate: u64,
    pub historical_baseline: u64,
    pub insight: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedTrafficResult {
    pub monthly_vehicle_traffic: u64,
    pub monthly_foot_traffic: u64,
    pub confidence_score: f64,
    pub primary_source: PrimarySource,
    /// True when the numbers are a deterministic placeholder rather than measurements
    pub is_placeholder: bool,
    pub breakdown: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub trend: Option<TrafficTrend>,
}
