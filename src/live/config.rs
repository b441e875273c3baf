use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.2;
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SEARCH_RADIUS_M: u32 = 500;

/// Live congestion sampling configuration.
///
/// Example YAML:
/// ```yaml
/// live_sampling:
///   endpoint: "https://congestion.example/v1/flow"
///   sample_fraction: 0.2
///   concurrency: 10
///   timeout: "10s"
///   search_radius_m: 500
///   seed: 7
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LiveSamplingConfig {
    /// Congestion service URL. Sampling is disabled without one.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Fraction of segments queried live (default: 0.2)
    #[serde(default)]
    pub sample_fraction: Option<f64>,

    /// Maximum queries in flight (default: 10)
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Per-query timeout, humantime format (default: "10s")
    #[serde(default)]
    pub timeout: Option<String>,

    /// Search radius around each segment midpoint in meters (default: 500)
    #[serde(default)]
    pub search_radius_m: Option<u32>,

    /// Seed for segment selection; random each run when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for LiveSamplingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            sample_fraction: Some(DEFAULT_SAMPLE_FRACTION),
            concurrency: Some(DEFAULT_CONCURRENCY),
            timeout: Some("10s".to_string()),
            search_radius_m: Some(DEFAULT_SEARCH_RADIUS_M),
            seed: None,
        }
    }
}

/// Resolved sampler knobs with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerSettings {
    pub sample_fraction: f64,
    pub concurrency: usize,
    pub timeout: Duration,
    pub search_radius_m: u32,
    pub seed: Option<u64>,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            sample_fraction: DEFAULT_SAMPLE_FRACTION,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            search_radius_m: DEFAULT_SEARCH_RADIUS_M,
            seed: None,
        }
    }
}

impl SamplerSettings {
    /// Apply defaults to a config. Values that failed validation fall back to defaults.
    pub fn from_config(config: &LiveSamplingConfig) -> Self {
        let timeout = config
            .timeout
            .as_deref()
            .and_then(|t| humantime::parse_duration(t.trim()).ok())
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_TIMEOUT);

        Self {
            sample_fraction: config
                .sample_fraction
                .filter(|f| *f > 0.0 && *f <= 1.0)
                .unwrap_or(DEFAULT_SAMPLE_FRACTION),
            concurrency: config
                .concurrency
                .filter(|c| *c > 0)
                .unwrap_or(DEFAULT_CONCURRENCY),
            timeout,
            search_radius_m: config
                .search_radius_m
                .filter(|r| *r > 0)
                .unwrap_or(DEFAULT_SEARCH_RADIUS_M),
            seed: config.seed,
        }
    }
}

/// Validate live sampling configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_live_sampling(config: &LiveSamplingConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(fraction) = config.sample_fraction {
        if !(fraction > 0.0 && fraction <= 1.0) {
            errors.push(format!(
                "live_sampling.sample_fraction: must be in (0, 1], got {}",
                fraction
            ));
        }
    }

    if config.concurrency == Some(0) {
        errors.push("live_sampling.concurrency: must be at least 1".to_string());
    }

    if let Some(ref timeout) = config.timeout {
        match humantime::parse_duration(timeout.trim()) {
            Ok(d) if d.is_zero() => {
                errors.push("live_sampling.timeout: must be greater than zero".to_string())
            }
            Ok(_) => {}
            Err(e) => errors.push(format!(
                "live_sampling.timeout: invalid duration '{}' - {}",
                timeout, e
            )),
        }
    }

    if config.search_radius_m == Some(0) {
        errors.push("live_sampling.search_radius_m: must be positive".to_string());
    }

    if let Some(ref endpoint) = config.endpoint {
        if reqwest::Url::parse(endpoint).is_err() {
            errors.push(format!("live_sampling.endpoint: invalid URL '{}'", endpoint));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SamplerSettings::from_config(&LiveSamplingConfig::default());
        assert_eq!(settings, SamplerSettings::default());
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.concurrency, 10);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
endpoint: "https://congestion.invalid/v1/flow"
sample_fraction: 0.5
concurrency: 4
timeout: "2s 500ms"
search_radius_m: 250
seed: 7
"#;
        let config: LiveSamplingConfig = serde_saphyr::from_str(yaml).unwrap();
        assert!(validate_live_sampling(&config).is_ok());

        let settings = SamplerSettings::from_config(&config);
        assert_eq!(settings.sample_fraction, 0.5);
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.timeout, Duration::from_millis(2_500));
        assert_eq!(settings.search_radius_m, 250);
        assert_eq!(settings.seed, Some(7));
    }

    #[test]
    fn test_invalid_values_collected() {
        let config = LiveSamplingConfig {
            endpoint: Some("::nope::".to_string()),
            sample_fraction: Some(1.5),
            concurrency: Some(0),
            timeout: Some("soon".to_string()),
            search_radius_m: Some(0),
            seed: None,
        };
        let errors = validate_live_sampling(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors[0].contains("live_sampling.sample_fraction"));
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = LiveSamplingConfig {
            endpoint: None,
            sample_fraction: Some(0.0),
            concurrency: Some(0),
            timeout: Some("soon".to_string()),
            search_radius_m: Some(0),
            seed: None,
        };
        assert_eq!(SamplerSettings::from_config(&config), SamplerSettings::default());
    }
}
