use super::config::ScoringConfig;
use super::weights::Layer;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(radius) = config.analysis_radius_miles {
        if !radius.is_finite() || radius <= 0.0 {
            errors.push(format!(
                "scoring.analysis_radius_miles: must be positive, got {}",
                radius
            ));
        }
    }

    if config.top_n == Some(0) {
        errors.push("scoring.top_n: must be at least 1".to_string());
    }

    if config.ideal_competitor_count == Some(0) {
        errors.push("scoring.ideal_competitor_count: must be at least 1".to_string());
    }

    if let Some(ref weights) = config.weights {
        let parts = [
            ("demographics", weights.demographics),
            ("competition", weights.competition),
            ("market_signals", weights.market_signals),
        ];
        for (name, value) in parts {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!(
                    "scoring.weights.{}: must be a non-negative number, got {}",
                    name, value
                ));
            }
        }
        let total = weights.sum();
        if total.is_finite() && total <= 0.0 {
            errors.push("scoring.weights: at least one weight must be positive".to_string());
        }
    }

    if let Some(ref layers) = config.layers {
        for (i, layer) in layers.iter().enumerate() {
            if Layer::parse(layer).is_none() {
                errors.push(format!(
                    "scoring.layers[{}]: unknown layer '{}' (expected demographics, competition, market_signals or deep_clone)",
                    i, layer
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
