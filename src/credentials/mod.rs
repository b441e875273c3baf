/// Environment variable holding the live congestion service API key
pub const ENV_API_KEY_VAR: &str = "SITE_SCOUT_TRAFFIC_KEY";

/// Check for a congestion API key in the SITE_SCOUT_TRAFFIC_KEY environment variable.
/// Returns Some(key) if the env var is set and non-empty, None otherwise.
pub fn get_api_key_from_env() -> Option<String> {
    api_key_from(std::env::var(ENV_API_KEY_VAR).ok())
}

fn api_key_from(raw: Option<String>) -> Option<String> {
    let trimmed = raw?.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
