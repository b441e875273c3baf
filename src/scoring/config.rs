use serde::{Deserialize, Serialize};

use super::engine::DEFAULT_IDEAL_COMPETITORS;
use super::weights::{get_layer_weights, ScoringWeights};

pub const DEFAULT_ANALYSIS_RADIUS_MILES: f64 = 3.0;
pub const DEFAULT_TOP_N: usize = 3;

/// Zone scoring configuration.
///
/// Every field is optional; missing fields fall back to built-in defaults.
/// Explicit `weights` win over `layers`.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   analysis_radius_miles: 3.0
///   top_n: 5
///   layers: ["demographics", "deep_clone"]
///   business_type: "coffee shop"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Radius around each candidate point used to count competitors (default: 3.0)
    #[serde(default)]
    pub analysis_radius_miles: Option<f64>,

    /// Number of ranked zones returned (default: 3)
    #[serde(default)]
    pub top_n: Option<usize>,

    /// Competitor count considered healthy for a proven market (default: 3)
    #[serde(default)]
    pub ideal_competitor_count: Option<usize>,

    /// Explicit category weights
    #[serde(default)]
    pub weights: Option<ScoringWeights>,

    /// Active map layers, used to derive weights when `weights` is unset
    #[serde(default)]
    pub layers: Option<Vec<String>>,

    /// Business type used to phrase insights, e.g. "coffee shop"
    #[serde(default)]
    pub business_type: Option<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            analysis_radius_miles: Some(DEFAULT_ANALYSIS_RADIUS_MILES),
            top_n: Some(DEFAULT_TOP_N),
            ideal_competitor_count: Some(DEFAULT_IDEAL_COMPETITORS),
            weights: None,
            layers: None,
            business_type: None,
        }
    }
}

impl ScoringConfig {
    pub fn analysis_radius(&self) -> f64 {
        self.analysis_radius_miles
            .unwrap_or(DEFAULT_ANALYSIS_RADIUS_MILES)
    }

    pub fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    pub fn ideal_competitor_count(&self) -> usize {
        self.ideal_competitor_count
            .unwrap_or(DEFAULT_IDEAL_COMPETITORS)
    }

    /// Weights to score with: explicit weights, else layer-derived, else default
    pub fn effective_weights(&self) -> ScoringWeights {
        if let Some(weights) = self.weights {
            return weights;
        }
        match &self.layers {
            Some(layers) => get_layer_weights(layers.as_slice()),
            None => ScoringWeights::default(),
        }
    }
}
