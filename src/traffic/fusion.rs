use serde_json::json;
use std::collections::BTreeMap;

use super::placeholder;
use super::types::{
    DotTrafficData, FusedTrafficResult, GoogleTrafficData, PrimarySource, TrafficTrend,
    TrendDirection,
};
use crate::geo::GeoPoint;
use crate::metrics::clamp_score;

const DOT_WEIGHT: f64 = 0.6;
const GOOGLE_WEIGHT: f64 = 0.4;
/// Share of DOT vehicle traffic assumed to arrive on foot
const DOT_FOOT_RATIO: f64 = 0.20;
const DAYS_PER_MONTH: u64 = 30;

const DOT_ONLY_CONFIDENCE: f64 = 65.0;
const GOOGLE_ONLY_CONFIDENCE: f64 = 55.0;
const PLACEHOLDER_CONFIDENCE: f64 = 30.0;

/// Percent change beyond which the trend is up/down rather than stable
const TREND_THRESHOLD_PERCENT: f64 = 5.0;
/// Percent change beyond which the trend is described as strong
const STRONG_TREND_PERCENT: f64 = 20.0;

/// How much busier (or quieter) current activity is than the baseline implies.
pub fn activity_multiplier(vitality: f64) -> f64 {
    match vitality {
        v if (0.0..20.0).contains(&v) => 0.6,
        v if (20.0..40.0).contains(&v) => 0.8,
        v if (40.0..60.0).contains(&v) => 1.0,
        v if (60.0..80.0).contains(&v) => 1.2,
        v if (80.0..=100.0).contains(&v) => 1.4,
        _ => 1.0,
    }
}

/// Vehicles per pedestrian assumed when only activity data is available
pub fn vehicle_ratio(vitality: f64) -> f64 {
    if vitality >= 70.0 {
        4.0
    } else if vitality >= 50.0 {
        6.0
    } else {
        8.0
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn to_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Reconcile the DOT baseline and the activity signal into one estimate.
///
/// A source counts as available only when present with a positive headline
/// count. With neither available the result is a synthetic placeholder,
/// flagged by `is_placeholder` and `PrimarySource::Estimated`.
pub fn fuse_traffic(
    location: &GeoPoint,
    dot: Option<&DotTrafficData>,
    google: Option<&GoogleTrafficData>,
) -> FusedTrafficResult {
    let dot = dot.filter(|d| d.monthly_estimate > 0);
    let google = google.filter(|g| g.avg_daily_traffic > 0);

    match (dot, google) {
        (Some(dot), Some(google)) => fuse_blended(dot, google),
        (Some(dot), None) => fuse_dot_only(dot),
        (None, Some(google)) => fuse_google_only(google),
        (None, None) => fuse_placeholder(location),
    }
}

fn fuse_blended(dot: &DotTrafficData, google: &GoogleTrafficData) -> FusedTrafficResult {
    let dot_monthly = dot.monthly_estimate as f64;
    let vitality = google.area_vitality_score;
    let multiplier = activity_multiplier(vitality);

    let google_vehicle_estimate = to_count(dot_monthly * multiplier);
    let fused_vehicle = to_count(dot_monthly * DOT_WEIGHT + google_vehicle_estimate as f64 * GOOGLE_WEIGHT);
    let fused_foot = google.avg_daily_traffic.saturating_mul(DAYS_PER_MONTH);
    let confidence = round_to(70.0 + 25.0 * (1.0 - (multiplier - 1.0).abs()), 1);

    let trend = build_trend(google_vehicle_estimate, dot.monthly_estimate);

    let mut breakdown = BTreeMap::new();
    breakdown.insert("dot_source".to_string(), json!(dot.source));
    breakdown.insert("dot_monthly".to_string(), json!(dot.monthly_estimate));
    breakdown.insert("vitality_score".to_string(), json!(vitality));
    breakdown.insert("activity_multiplier".to_string(), json!(multiplier));
    breakdown.insert("google_vehicle_estimate".to_string(), json!(google_vehicle_estimate));
    breakdown.insert("dot_weight".to_string(), json!(DOT_WEIGHT));
    breakdown.insert("google_weight".to_string(), json!(GOOGLE_WEIGHT));
    breakdown.insert("google_foot_daily".to_string(), json!(google.avg_daily_traffic));
    breakdown.insert(
        "foot_formula".to_string(),
        json!("avg_daily_traffic * 30"),
    );

    log::debug!(
        "Blended traffic: dot {} x{} -> vehicle {}, foot {}",
        dot.monthly_estimate,
        multiplier,
        fused_vehicle,
        fused_foot
    );

    FusedTrafficResult {
        monthly_vehicle_traffic: fused_vehicle,
        monthly_foot_traffic: fused_foot,
        confidence_score: clamp_score(confidence),
        primary_source: PrimarySource::Blended,
        is_placeholder: false,
        breakdown,
        trend: Some(trend),
    }
}

fn fuse_dot_only(dot: &DotTrafficData) -> FusedTrafficResult {
    let foot = to_count(dot.monthly_estimate as f64 * DOT_FOOT_RATIO);

    let mut breakdown = BTreeMap::new();
    breakdown.insert("dot_source".to_string(), json!(dot.source));
    breakdown.insert("dot_monthly".to_string(), json!(dot.monthly_estimate));
    breakdown.insert("foot_ratio".to_string(), json!(DOT_FOOT_RATIO));
    if let Some(daily) = dot.daily_average {
        breakdown.insert("dot_daily_average".to_string(), json!(daily));
    }

    FusedTrafficResult {
        monthly_vehicle_traffic: dot.monthly_estimate,
        monthly_foot_traffic: foot,
        confidence_score: DOT_ONLY_CONFIDENCE,
        primary_source: PrimarySource::Dot,
        is_placeholder: false,
        breakdown,
        trend: None,
    }
}

fn fuse_google_only(google: &GoogleTrafficData) -> FusedTrafficResult {
    let vitality = google.area_vitality_score;
    let ratio = vehicle_ratio(vitality);
    let foot_monthly = google.avg_daily_traffic.saturating_mul(DAYS_PER_MONTH);
    let vehicle = to_count(foot_monthly as f64 * ratio);

    let mut breakdown = BTreeMap::new();
    breakdown.insert("google_foot_daily".to_string(), json!(google.avg_daily_traffic));
    breakdown.insert("google_foot_monthly".to_string(), json!(foot_monthly));
    breakdown.insert("vitality_score".to_string(), json!(vitality));
    breakdown.insert("vehicle_ratio".to_string(), json!(ratio));

    FusedTrafficResult {
        monthly_vehicle_traffic: vehicle,
        monthly_foot_traffic: foot_monthly,
        confidence_score: GOOGLE_ONLY_CONFIDENCE,
        primary_source: PrimarySource::Google,
        is_placeholder: false,
        breakdown,
        trend: None,
    }
}

fn fuse_placeholder(location: &GeoPoint) -> FusedTrafficResult {
    let estimate = placeholder::estimate(location);

    log::warn!(
        "No traffic sources for ({:.4}, {:.4}); returning synthetic placeholder",
        location.lat,
        location.lng
    );

    let mut breakdown = BTreeMap::new();
    breakdown.insert("synthetic".to_string(), json!(true));
    breakdown.insert("seed_key".to_string(), json!(estimate.seed_key));
    breakdown.insert("seed".to_string(), json!(estimate.seed));
    breakdown.insert(
        "note".to_string(),
        json!("no traffic sources available; deterministic placeholder, not measured data"),
    );

    FusedTrafficResult {
        monthly_vehicle_traffic: estimate.monthly_vehicle,
        monthly_foot_traffic: estimate.monthly_foot,
        confidence_score: PLACEHOLDER_CONFIDENCE,
        primary_source: PrimarySource::Estimated,
        is_placeholder: true,
        breakdown,
        trend: None,
    }
}

/// Compare the activity-implied vehicle count with the DOT baseline.
/// `baseline` must be positive.
fn build_trend(current: u64, baseline: u64) -> TrafficTrend {
    let change = (current as f64 - baseline as f64) * 100.0 / baseline as f64;
    let change_percent = round_to(change, 2);

    let direction = if change_percent > TREND_THRESHOLD_PERCENT {
        TrendDirection::Up
    } else if change_percent < -TREND_THRESHOLD_PERCENT {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    let strong = change_percent.abs() > STRONG_TREND_PERCENT;
    let insight = match direction {
        TrendDirection::Up => format!(
            "{} growth: current activity runs {:.1}% above the DOT baseline",
            if strong { "Strong" } else { "Moderate" },
            change_percent
        ),
        TrendDirection::Down => format!(
            "{} decline: current activity runs {:.1}% below the DOT baseline",
            if strong { "Strong" } else { "Moderate" },
            change_percent.abs()
        ),
        TrendDirection::Stable => {
            "Stable: current activity is within 5% of the DOT baseline".to_string()
        }
    };

    TrafficTrend {
        direction,
        change_percent,
        current_estimate: current,
        historical_baseline: baseline,
        insight,
    }
}
