use super::{types::Config, ConfigError};

const POLL_ATTEMPTS_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Size bounds are non-negative and ordered
/// - Debrid poll attempts stay within 1..=30
/// - Result cap and per-tier try limit are non-zero
/// - The indexer proxy, if set, is a usable proxy URL
/// - An enabled rate limit has a non-zero budget and window
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Filter validation
    let filters = &config.filters;
    if filters.min_size_gb < 0.0 || filters.max_size_gb < 0.0 {
        return Err(ConfigError::ValidationError(
            "filters size bounds cannot be negative".to_string(),
        ));
    }
    if filters.max_size_gb < filters.min_size_gb {
        return Err(ConfigError::ValidationError(format!(
            "filters.max_size_gb ({}) is below filters.min_size_gb ({})",
            filters.max_size_gb, filters.min_size_gb
        )));
    }
    if config.episodes.min_season_pack_size_gb < 0.0 {
        return Err(ConfigError::ValidationError(
            "episodes.min_season_pack_size_gb cannot be negative".to_string(),
        ));
    }

    // Debrid validation
    for (key, value) in [
        ("debrid.files_poll_attempts", config.debrid.files_poll_attempts),
        ("debrid.links_poll_attempts", config.debrid.links_poll_attempts),
    ] {
        if !POLL_ATTEMPTS_RANGE.contains(&value) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be between {} and {}, got {}",
                key,
                POLL_ATTEMPTS_RANGE.start(),
                POLL_ATTEMPTS_RANGE.end(),
                value
            )));
        }
    }

    // Pipeline validation
    if config.pipeline.max_results == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_results cannot be 0".to_string(),
        ));
    }
    if config.pipeline.max_attempts_per_tier == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_attempts_per_tier cannot be 0".to_string(),
        ));
    }

    // Indexer validation
    if let Some(proxy) = config.indexers.proxy_url() {
        let valid_scheme = ["http://", "https://"]
            .iter()
            .any(|scheme| proxy.to_ascii_lowercase().starts_with(scheme));
        if !valid_scheme || reqwest::Proxy::all(proxy).is_err() {
            return Err(ConfigError::ValidationError(
                "indexers.proxy is not a valid proxy URL".to_string(),
            ));
        }
    }

    // Rate limit validation
    let rate_limit = &config.rate_limit;
    if rate_limit.enabled && (rate_limit.max_requests == 0 || rate_limit.window_secs == 0) {
        return Err(ConfigError::ValidationError(
            "rate_limit.max_requests and rate_limit.window_secs must be non-zero".to_string(),
        ));
    }

    Ok(())
}
