use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::normalizer::{clamp_score, MetricCategory, MetricKey};

/// Already-fetched zone summary the derived metrics are computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawZoneMetrics {
    pub total_population: u64,
    /// Percent change, e.g. 2.5 for +2.5%
    pub population_growth: f64,
    pub median_income: f64,
    pub median_age: f64,
    pub total_competitors: u64,
    pub foot_traffic_monthly: u64,
    pub drive_by_traffic_monthly: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetric {
    pub name: String,
    pub raw_value: f64,
    pub normalized_value: f64,
    pub category: MetricCategory,
    pub higher_is_better: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetricsResult {
    pub metrics: BTreeMap<MetricKey, NormalizedMetric>,
    pub category_scores: BTreeMap<MetricCategory, f64>,
    pub overall_score: f64,
}

/// Compute every derived metric for a zone, normalize them and roll them up
/// into category and overall scores.
pub fn calculate(raw: &RawZoneMetrics) -> DerivedMetricsResult {
    let population = raw.total_population as f64;
    let competitors = raw.total_competitors as f64;
    let income = raw.median_income;
    let foot = raw.foot_traffic_monthly as f64;
    let vehicle = raw.drive_by_traffic_monthly as f64;
    let total_traffic = foot + vehicle;

    let competition_per_capita = if population > 0.0 {
        competitors / population * 10_000.0
    } else {
        competitors
    };

    let revenue_pool = income * population / 2.5;
    let revenue_potential_per_competitor = revenue_pool / competitors.max(1.0);

    let traffic_per_competitor = if competitors > 0.0 {
        total_traffic / competitors
    } else {
        total_traffic
    };

    let foot_to_vehicle_ratio = if vehicle > 0.0 {
        (foot / vehicle).min(1.0)
    } else {
        1.0
    };

    let traffic_density = if population > 0.0 {
        total_traffic / population
    } else {
        0.0
    };

    let customer_conversion_potential = if total_traffic > 0.0 {
        foot / total_traffic * 100.0
    } else {
        50.0
    };

    let purchasing_power_index = income * population / 1_000_000.0;

    let growth_momentum = raw.population_growth.max(0.0) * traffic_density * 10.0;

    let income_score = (income / 100_000.0).min(1.0) * 100.0;
    let competition_score = (100.0 - competition_per_capita * 10.0).max(0.0);
    let traffic_score = (traffic_density * 30.0).min(100.0);
    let market_opportunity_score =
        0.4 * income_score + 0.35 * competition_score + 0.25 * traffic_score;

    let working_age_ratio = (100.0 - 4.0 * (raw.median_age - 40.0).abs()).max(0.0);

    let income_per_traffic = if total_traffic > 0.0 {
        (income / (total_traffic / 1000.0)).min(100.0)
    } else {
        income
    };

    let raw_values = [
        (MetricKey::CompetitionPerCapita, competition_per_capita),
        (
            MetricKey::RevenuePotentialPerCompetitor,
            revenue_potential_per_competitor,
        ),
        (MetricKey::MarketOpportunityScore, market_opportunity_score),
        (MetricKey::TrafficPerCompetitor, traffic_per_competitor),
        (MetricKey::FootToVehicleRatio, foot_to_vehicle_ratio),
        (MetricKey::TrafficDensity, traffic_density),
        (
            MetricKey::CustomerConversionPotential,
            customer_conversion_potential,
        ),
        (MetricKey::PurchasingPowerIndex, purchasing_power_index),
        (MetricKey::IncomePerTraffic, income_per_traffic),
        (MetricKey::GrowthMomentum, growth_momentum),
        (MetricKey::WorkingAgeRatio, working_age_ratio),
    ];

    let metrics: BTreeMap<MetricKey, NormalizedMetric> = raw_values
        .into_iter()
        .map(|(key, raw_value)| {
            let metric = NormalizedMetric {
                name: key.as_str().to_string(),
                raw_value,
                normalized_value: key.normalize(raw_value),
                category: key.category(),
                higher_is_better: key.range().higher_is_better,
            };
            (key, metric)
        })
        .collect();

    let category_scores = category_averages(&metrics);
    let overall_score = clamp_score(
        category_scores
            .iter()
            .map(|(category, score)| score * category.weight())
            .sum(),
    );

    log::debug!(
        "Derived metrics: overall {:.1} from {} categories",
        overall_score,
        category_scores.len()
    );

    DerivedMetricsResult {
        metrics,
        category_scores,
        overall_score,
    }
}

/// Arithmetic mean of normalized values per category. A category with no
/// metrics scores a neutral 50.
fn category_averages(
    metrics: &BTreeMap<MetricKey, NormalizedMetric>,
) -> BTreeMap<MetricCategory, f64> {
    MetricCategory::ALL
        .into_iter()
        .map(|category| {
            let values: Vec<f64> = metrics
                .values()
                .filter(|m| m.category == category)
                .map(|m| m.normalized_value)
                .collect();
            let score = if values.is_empty() {
                50.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            (category, clamp_score(score))
        })
        .collect()
}
