pub mod config;
pub mod engine;
pub mod types;
pub mod validation;
pub mod weights;

pub use config::*;
pub use engine::{
    analyze_zone, score_competition, score_demographics, score_market_signals, ZoneInputs,
    DEFAULT_IDEAL_COMPETITORS, MAX_INSIGHTS,
};
pub use types::*;
pub use validation::validate_scoring;
pub use weights::{get_layer_weights, Layer, ScoringWeights};
