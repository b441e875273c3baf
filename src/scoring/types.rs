use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geo::GeoPoint;

/// Demographics summary for the area around a candidate zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub total_population: u64,
    pub median_income: u64,
    #[serde(default)]
    pub total_households: Option<u64>,
    #[serde(default)]
    pub median_age: Option<f64>,
}

/// A competing business as returned by the places provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews: Option<u32>,
}

impl Competitor {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthTrend {
    High,
    Moderate,
    #[serde(other)]
    Other,
}

/// Market-signal summary (gaps, growth, demand).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSignals {
    #[serde(default)]
    pub market_gap_identified: bool,
    #[serde(default)]
    pub growth_trend: Option<GrowthTrend>,
    #[serde(default)]
    pub demand_signals: bool,
}

/// Dimension a zone is scored along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Demographics,
    Competition,
    MarketSignals,
}

/// Score and explanatory insights for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    pub score: f64,
    pub insights: Vec<String>,
}

/// A scored candidate zone. Request-scoped; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateZone {
    pub id: String,
    pub center: GeoPoint,
    pub radius_miles: f64,
    pub total_score: f64,
    pub scores: BTreeMap<ScoreCategory, f64>,
    pub insights: Vec<String>,
    /// 1-based position among the returned zones; 0 when not ranked
    pub rank: usize,
}

impl CandidateZone {
    /// Stable id derived from the zone center
    pub fn id_for(center: &GeoPoint) -> String {
        format!("zone_{:.4}_{:.4}", center.lat, center.lng)
    }
}
