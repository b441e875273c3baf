mod schema;

pub use schema::Config;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::live::validate_live_sampling;
use crate::scoring::validate_scoring;

/// Get the config directory path (~/.config/site-scout/)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("site-scout"))
}

/// Get the default config file path (~/.config/site-scout/config.yaml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses default path (~/.config/site-scout/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
///
/// A missing default config file is not an error; built-in defaults apply.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found at {}", path.display());
            }
            read_config(&path)
        }
        None => match get_config_path() {
            Some(path) if path.exists() => read_config(&path),
            _ => {
                log::debug!("No config file found; using defaults");
                Ok(Config::default())
            }
        },
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let config_content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", path.display()))?;

    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Validate every config section, collecting all errors.
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref scoring) = config.scoring {
        if let Err(mut e) = validate_scoring(scoring) {
            errors.append(&mut e);
        }
    }
    if let Some(ref live) = config.live_sampling {
        if let Err(mut e) = validate_live_sampling(live) {
            errors.append(&mut e);
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
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("site-scout-{}-{}.yaml", name, std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_full_config() {
        let path = write_temp(
            "full",
            r#"
scoring:
  analysis_radius_miles: 2.5
  top_n: 5
  layers: [demographics, competition]
live_sampling:
  endpoint: "https://congestion.invalid/v1/flow"
  sample_fraction: 0.3
"#,
        );
        let config = load_config(Some(path.clone())).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.scoring().top_n(), 5);
        assert_eq!(config.scoring().analysis_radius(), 2.5);
        assert_eq!(config.live_sampling().sample_fraction, Some(0.3));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let path = write_temp("empty", "{}\n");
        let config = load_config(Some(path.clone())).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config, Config::default());
        assert_eq!(config.scoring().top_n(), 3);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let path = std::env::temp_dir().join("site-scout-does-not-exist.yaml");
        let err = load_config(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let path = write_temp("unknown", "queries: []\n");
        let result = load_config(Some(path.clone()));
        fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_collects_both_sections() {
        let config: Config = serde_saphyr::from_str(
            r#"
scoring:
  top_n: 0
live_sampling:
  concurrency: 0
"#,
        )
        .unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("scoring."));
        assert!(errors[1].starts_with("live_sampling."));
    }
}
