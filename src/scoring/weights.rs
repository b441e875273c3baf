use serde::{Deserialize, Serialize};

/// Relative weight of each scoring category.
///
/// Weights are expected to sum to 1.0. `normalized()` rescales them when they
/// don't, which is what zone scoring applies before blending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringWeights {
    pub demographics: f64,
    pub competition: f64,
    pub market_signals: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            demographics: 0.4,
            competition: 0.4,
            market_signals: 0.2,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.demographics + self.competition + self.market_signals
    }

    /// Rescale so the weights sum to 1.0. Negative or non-finite components
    /// count as zero; if nothing positive remains, the default weights are used.
    pub fn normalized(&self) -> Self {
        let sanitize = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let clean = Self {
            demographics: sanitize(self.demographics),
            competition: sanitize(self.competition),
            market_signals: sanitize(self.market_signals),
        };

        let total = clean.sum();
        if !total.is_finite() || total <= 0.0 {
            return Self::default();
        }
        if (total - 1.0).abs() < 1e-9 {
            return clean;
        }

        Self {
            demographics: clean.demographics / total,
            competition: clean.competition / total,
            market_signals: clean.market_signals / total,
        }
    }
}

/// A map layer the caller has switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Demographics,
    Competition,
    MarketSignals,
    /// Clone-a-successful-location mode; spreads its share over all categories
    DeepClone,
}

impl Layer {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demographics" => Some(Layer::Demographics),
            "competition" => Some(Layer::Competition),
            "market_signals" => Some(Layer::MarketSignals),
            "deep_clone" => Some(Layer::DeepClone),
            _ => None,
        }
    }
}

/// Derive scoring weights from the active layers.
///
/// No active layers gives the 0.4/0.4/0.2 default. Otherwise each layer gets an
/// equal share; `deep_clone` splits its share 0.3/0.4/0.3. Unrecognised layers
/// still take a share but contribute it to nothing.
pub fn get_layer_weights<S: AsRef<str>>(active_layers: &[S]) -> ScoringWeights {
    if active_layers.is_empty() {
        return ScoringWeights::default();
    }

    let share = 1.0 / active_layers.len() as f64;
    let mut weights = ScoringWeights {
        demographics: 0.0,
        competition: 0.0,
        market_signals: 0.0,
    };

    for name in active_layers {
        match Layer::parse(name.as_ref()) {
            Some(Layer::Demographics) => weights.demographics += share,
            Some(Layer::Competition) => weights.competition += share,
            Some(Layer::MarketSignals) => weights.market_signals += share,
            Some(Layer::DeepClone) => {
                weights.demographics += share * 0.3;
                weights.competition += share * 0.4;
                weights.market_signals += share * 0.3;
            }
            None => log::warn!("Ignoring unknown layer '{}'", name.as_ref()),
        }
    }

    weights
}
