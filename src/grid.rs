use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::geo::GeoPoint;
use crate::scoring::{
    analyze_zone, CandidateZone, Competitor, Demographics, MarketSignals, ScoringConfig,
    ScoringWeights, ZoneInputs,
};

/// Target radius (miles) above which a third sampling ring is added
const WIDE_SEARCH_RADIUS_MILES: f64 = 10.0;

/// A request to find the best zones around a target location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRequest {
    pub center: GeoPoint,
    pub target_radius_miles: f64,
    #[serde(default)]
    pub demographics: Option<Demographics>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub market_signals: Option<MarketSignals>,
    #[serde(default)]
    pub business_type: Option<String>,
}

/// Knobs for a zone search, usually taken from the scoring config.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub analysis_radius_miles: f64,
    pub top_n: usize,
    pub ideal_competitor_count: usize,
    pub weights: ScoringWeights,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl SearchOptions {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            analysis_radius_miles: config.analysis_radius(),
            top_n: config.top_n(),
            ideal_competitor_count: config.ideal_competitor_count(),
            weights: config.effective_weights(),
        }
    }
}

/// Candidate centers on concentric hexagonal rings around `center`.
///
/// Always includes `center`. Ring `r` (1-based) sits at
/// `radius_miles * r / (num_rings + 1)` and carries `6 * r` evenly spaced
/// points, giving `1 + 3 * n * (n + 1)` points in total.
pub fn generate_grid_points(center: GeoPoint, radius_miles: f64, num_rings: usize) -> Vec<GeoPoint> {
    let mut points = Vec::with_capacity(1 + 3 * num_rings * (num_rings + 1));
    points.push(center);

    for ring in 1..=num_rings {
        let ring_radius = radius_miles * ring as f64 / (num_rings + 1) as f64;
        let count = 6 * ring;
        let step = 2.0 * PI / count as f64;

        for i in 0..count {
            let angle = step * i as f64;
            points.push(center.offset_miles(ring_radius * angle.cos(), ring_radius * angle.sin()));
        }
    }

    points
}

/// Number of sampling rings used for a search of the given radius
pub fn rings_for_radius(target_radius_miles: f64) -> usize {
    if target_radius_miles <= WIDE_SEARCH_RADIUS_MILES {
        2
    } else {
        3
    }
}

/// Score every grid candidate around the request center and return the best
/// `top_n`, ranked 1..=N by descending total score.
///
/// Each candidate only sees competitors within `analysis_radius_miles` of it.
/// Ties keep grid order (center first).
pub fn find_optimal_zones(request: &ZoneRequest, options: &SearchOptions) -> Vec<CandidateZone> {
    let num_rings = rings_for_radius(request.target_radius_miles);
    let points = generate_grid_points(request.center, request.target_radius_miles, num_rings);

    log::debug!(
        "Scoring {} candidate points ({} rings) around ({:.4}, {:.4})",
        points.len(),
        num_rings,
        request.center.lat,
        request.center.lng
    );

    let mut zones: Vec<CandidateZone> = points
        .into_iter()
        .map(|point| {
            let nearby: Vec<Competitor> = request
                .competitors
                .iter()
                .filter(|c| point.distance_miles(&c.location()) <= options.analysis_radius_miles)
                .cloned()
                .collect();

            let inputs = ZoneInputs {
                demographics: request.demographics.as_ref(),
                competitors: &nearby,
                market_signals: request.market_signals.as_ref(),
                business_type: request.business_type.as_deref(),
            };

            analyze_zone(
                point,
                options.analysis_radius_miles,
                &inputs,
                &options.weights,
                options.ideal_competitor_count,
            )
        })
        .collect();

    // Stable sort keeps grid order for equal scores
    zones.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    zones.truncate(options.top_n);
    for (i, zone) in zones.iter_mut().enumerate() {
        zone.rank = i + 1;
    }

    log::info!(
        "Selected {} zones, best score {:.1}",
        zones.len(),
        zones.first().map(|z| z.total_score).unwrap_or(0.0)
    );

    zones
}
