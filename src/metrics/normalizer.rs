use serde::{Deserialize, Serialize};

/// Category a derived metric rolls up into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Market,
    Traffic,
    Economic,
    Demographics,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 4] = [
        MetricCategory::Market,
        MetricCategory::Traffic,
        MetricCategory::Economic,
        MetricCategory::Demographics,
    ];

    /// Fixed contribution of this category to the overall score. Sums to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            MetricCategory::Market => 0.30,
            MetricCategory::Traffic => 0.25,
            MetricCategory::Economic => 0.30,
            MetricCategory::Demographics => 0.15,
        }
    }
}

/// Raw range a metric is rescaled from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
    pub higher_is_better: bool,
}

const fn range(min: f64, max: f64, higher_is_better: bool) -> MetricRange {
    MetricRange {
        min,
        max,
        higher_is_better,
    }
}

/// Every metric the normalizer has a calibrated range for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    CompetitionPerCapita,
    RevenuePotentialPerCompetitor,
    MarketOpportunityScore,
    TrafficPerCompetitor,
    FootToVehicleRatio,
    TrafficDensity,
    CustomerConversionPotential,
    PurchasingPowerIndex,
    IncomePerTraffic,
    GrowthMomentum,
    WorkingAgeRatio,
}

impl MetricKey {
    pub const ALL: [MetricKey; 11] = [
        MetricKey::CompetitionPerCapita,
        MetricKey::RevenuePotentialPerCompetitor,
        MetricKey::MarketOpportunityScore,
        MetricKey::TrafficPerCompetitor,
        MetricKey::FootToVehicleRatio,
        MetricKey::TrafficDensity,
        MetricKey::CustomerConversionPotential,
        MetricKey::PurchasingPowerIndex,
        MetricKey::IncomePerTraffic,
        MetricKey::GrowthMomentum,
        MetricKey::WorkingAgeRatio,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|key| key.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::CompetitionPerCapita => "competition_per_capita",
            MetricKey::RevenuePotentialPerCompetitor => "revenue_potential_per_competitor",
            MetricKey::MarketOpportunityScore => "market_opportunity_score",
            MetricKey::TrafficPerCompetitor => "traffic_per_competitor",
            MetricKey::FootToVehicleRatio => "foot_to_vehicle_ratio",
            MetricKey::TrafficDensity => "traffic_density",
            MetricKey::CustomerConversionPotential => "customer_conversion_potential",
            MetricKey::PurchasingPowerIndex => "purchasing_power_index",
            MetricKey::IncomePerTraffic => "income_per_traffic",
            MetricKey::GrowthMomentum => "growth_momentum",
            MetricKey::WorkingAgeRatio => "working_age_ratio",
        }
    }

    pub fn category(&self) -> MetricCategory {
        match self {
            MetricKey::CompetitionPerCapita
            | MetricKey::RevenuePotentialPerCompetitor
            | MetricKey::MarketOpportunityScore => MetricCategory::Market,
            MetricKey::TrafficPerCompetitor
            | MetricKey::FootToVehicleRatio
            | MetricKey::TrafficDensity
            | MetricKey::CustomerConversionPotential => MetricCategory::Traffic,
            MetricKey::PurchasingPowerIndex | MetricKey::IncomePerTraffic => {
                MetricCategory::Economic
            }
            MetricKey::GrowthMomentum | MetricKey::WorkingAgeRatio => {
                MetricCategory::Demographics
            }
        }
    }

    /// Calibration range for this metric
    pub fn range(&self) -> MetricRange {
        match self {
            // competitors per 10k residents
            MetricKey::CompetitionPerCapita => range(0.0, 10.0, false),
            MetricKey::RevenuePotentialPerCompetitor => range(0.0, 500_000_000.0, true),
            MetricKey::MarketOpportunityScore => range(0.0, 100.0, true),
            // monthly trips per competitor
            MetricKey::TrafficPerCompetitor => range(0.0, 200_000.0, true),
            MetricKey::FootToVehicleRatio => range(0.0, 1.0, true),
            // monthly trips per resident
            MetricKey::TrafficDensity => range(0.0, 10.0, true),
            MetricKey::CustomerConversionPotential => range(0.0, 100.0, true),
            MetricKey::PurchasingPowerIndex => range(0.0, 100_000.0, true),
            MetricKey::IncomePerTraffic => range(0.0, 100.0, true),
            MetricKey::GrowthMomentum => range(0.0, 100.0, true),
            MetricKey::WorkingAgeRatio => range(0.0, 100.0, true),
        }
    }

    /// Rescale a raw value onto 0-100 using this metric's range.
    ///
    /// Non-finite input scores 0.
    pub fn normalize(&self, raw_value: f64) -> f64 {
        if !raw_value.is_finite() {
            return 0.0;
        }

        let MetricRange {
            min,
            max,
            higher_is_better,
        } = self.range();
        let clamped = raw_value.clamp(min, max);
        let scaled = (clamped - min) / (max - min) * 100.0;
        let score = if higher_is_better { scaled } else { 100.0 - scaled };

        clamp_score(score)
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a raw value by metric name. Unknown names are clamped to 0-100 as-is.
pub fn normalize(metric_key: &str, raw_value: f64) -> f64 {
    match MetricKey::parse(metric_key) {
        Some(key) => key.normalize(raw_value),
        None => clamp_score(raw_value),
    }
}

/// Clamp to [0, 100]; NaN and infinities collapse to 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
