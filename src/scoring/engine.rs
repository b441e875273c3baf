use std::collections::BTreeMap;

use super::types::{
    CandidateZone, CategoryScore, Competitor, Demographics, GrowthTrend, MarketSignals,
    ScoreCategory,
};
use super::weights::ScoringWeights;
use crate::geo::GeoPoint;
use crate::metrics::clamp_score;

/// Maximum number of insights kept on a zone
pub const MAX_INSIGHTS: usize = 5;

/// Competitor count at which a market is considered proven but not crowded
pub const DEFAULT_IDEAL_COMPETITORS: usize = 3;

const NEUTRAL_SCORE: f64 = 50.0;

/// Collaborator summaries a zone is scored from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneInputs<'a> {
    pub demographics: Option<&'a Demographics>,
    pub competitors: &'a [Competitor],
    pub market_signals: Option<&'a MarketSignals>,
    pub business_type: Option<&'a str>,
}

pub fn score_demographics(data: Option<&Demographics>, business_type: Option<&str>) -> CategoryScore {
    let Some(data) = data else {
        return CategoryScore {
            score: NEUTRAL_SCORE,
            insights: vec!["No demographics data available".to_string()],
        };
    };

    let mut score = NEUTRAL_SCORE;
    let mut insights = Vec::new();

    let population = data.total_population;
    if population > 100_000 {
        score += 15.0;
        insights.push(format!("Large population base ({} residents)", population));
    } else if population > 50_000 {
        score += 10.0;
        insights.push(format!("Solid population base ({} residents)", population));
    } else if population > 20_000 {
        score += 5.0;
        insights.push(format!("Moderate population base ({} residents)", population));
    } else {
        insights.push(format!("Limited population base ({} residents)", population));
    }

    let audience = business_type.unwrap_or("local business");
    let income = data.median_income;
    if income > 80_000 {
        score += 15.0;
        insights.push(format!(
            "High median income (${}) supports {} spending",
            income, audience
        ));
    } else if income > 60_000 {
        score += 10.0;
        insights.push(format!("Above-average median income (${})", income));
    } else if income > 40_000 {
        score += 5.0;
        insights.push(format!("Moderate median income (${})", income));
    } else {
        insights.push(format!(
            "Lower median income (${}) may limit {} spending",
            income, audience
        ));
    }

    if let Some(households) = data.total_households {
        if households > 30_000 {
            score += 5.0;
            insights.push(format!("Dense residential area ({} households)", households));
        }
    }

    CategoryScore {
        score: clamp_score(score),
        insights,
    }
}

pub fn score_competition(competitors: &[Competitor], ideal_count: usize) -> CategoryScore {
    let count = competitors.len();
    if count == 0 {
        return CategoryScore {
            score: 40.0,
            insights: vec!["No direct competitors found - unproven market".to_string()],
        };
    }

    let mut insights = Vec::new();
    let c = count as f64;
    let ideal = ideal_count as f64;

    let mut score = if count <= ideal_count {
        insights.push(format!(
            "Healthy competition: {} competitors validate demand",
            count
        ));
        90.0 - 5.0 * c
    } else if count <= 2 * ideal_count {
        insights.push(format!("Moderate competition: {} competitors nearby", count));
        70.0 - 5.0 * (c - ideal)
    } else {
        insights.push(format!("Saturated market: {} competitors nearby", count));
        40.0 - (2.0 * (c - 2.0 * ideal)).min(20.0)
    };

    let ratings: Vec<f64> = competitors
        .iter()
        .filter_map(|c| c.rating)
        .filter(|r| r.is_finite())
        .collect();
    if !ratings.is_empty() {
        let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
        if mean < 3.5 {
            score += 10.0;
            insights.push(format!(
                "Competitors average {:.1} stars - quality gap to exploit",
                mean
            ));
        } else if mean > 4.5 {
            score -= 5.0;
            insights.push(format!("Strong competitors averaging {:.1} stars", mean));
        }
    }

    CategoryScore {
        score: clamp_score(score),
        insights,
    }
}

pub fn score_market_signals(signal_data: Option<&MarketSignals>) -> CategoryScore {
    let Some(signals) = signal_data else {
        return CategoryScore {
            score: NEUTRAL_SCORE,
            insights: vec!["No market signal data available".to_string()],
        };
    };

    let mut score = NEUTRAL_SCORE;
    let mut insights = Vec::new();

    if signals.market_gap_identified {
        score += 20.0;
        insights.push("Market gap identified in this area".to_string());
    }

    match signals.growth_trend {
        Some(GrowthTrend::High) => {
            score += 15.0;
            insights.push("High growth trend".to_string());
        }
        Some(GrowthTrend::Moderate) => {
            score += 8.0;
            insights.push("Moderate growth trend".to_string());
        }
        Some(GrowthTrend::Other) | None => {}
    }

    if signals.demand_signals {
        score += 10.0;
        insights.push("Active demand signals detected".to_string());
    }

    CategoryScore {
        score: clamp_score(score),
        insights,
    }
}

/// Score a single candidate zone by blending the three category scores.
///
/// Weights are normalized first, so callers may pass weights that don't sum
/// to 1.0. The returned zone is unranked (rank 0).
pub fn analyze_zone(
    point: GeoPoint,
    radius_miles: f64,
    inputs: &ZoneInputs<'_>,
    weights: &ScoringWeights,
    ideal_competitor_count: usize,
) -> CandidateZone {
    let weights = weights.normalized();

    let demographics = score_demographics(inputs.demographics, inputs.business_type);
    let competition = score_competition(inputs.competitors, ideal_competitor_count);
    let market = score_market_signals(inputs.market_signals);

    let total_score = clamp_score(
        demographics.score * weights.demographics
            + competition.score * weights.competition
            + market.score * weights.market_signals,
    );

    let mut scores = BTreeMap::new();
    scores.insert(ScoreCategory::Demographics, demographics.score);
    scores.insert(ScoreCategory::Competition, competition.score);
    scores.insert(ScoreCategory::MarketSignals, market.score);

    let insights: Vec<String> = demographics
        .insights
        .into_iter()
        .chain(competition.insights)
        .chain(market.insights)
        .take(MAX_INSIGHTS)
        .collect();

    log::debug!(
        "Zone ({:.4}, {:.4}): total {:.1} with {} competitors",
        point.lat,
        point.lng,
        total_score,
        inputs.competitors.len()
    );

    CandidateZone {
        id: CandidateZone::id_for(&point),
        center: point,
        radius_miles,
        total_score,
        scores,
        insights,
        rank: 0,
    }
}
