use crate::config::types::{
    BatchConfig, CompetitorConfig, Config, DiscoveryConfig, FetcherConfig, GroundedConfig,
    RendererConfig,
};
use crate::ConfigError;
use url::Url;

const MAX_TIMEOUT_SECS: u64 = 120;
const MAX_CONTENT_THRESHOLD: usize = 10_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    if let Some(renderer) = &config.renderer {
        validate_renderer_config(renderer)?;
    }
    validate_discovery_config(&config.discovery)?;
    validate_batch_config(&config.batch)?;
    validate_competitor_config(&config.competitors)?;
    validate_grounded_config(&config.grounded)?;
    Ok(())
}

/// Validates page fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    validate_timeout("request_timeout_secs", config.request_timeout_secs)?;
    validate_timeout("connect_timeout_secs", config.connect_timeout_secs)?;

    if config.min_content_chars > MAX_CONTENT_THRESHOLD {
        return Err(ConfigError::Validation(format!(
            "min_content_chars must be <= {}, got {}",
            MAX_CONTENT_THRESHOLD, config.min_content_chars
        )));
    }

    Ok(())
}

/// Validates renderer configuration
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    validate_endpoint("renderer.endpoint", &config.endpoint)?;
    validate_timeout("renderer.timeout_secs", config.timeout_secs)?;

    if let Some(var) = &config.api_key_env {
        if var.trim().is_empty() {
            return Err(ConfigError::Validation(
                "renderer.api_key_env cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates discovery bounds
fn validate_discovery_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    validate_bound("max_urls", config.max_urls)?;
    validate_bound("crawl_hard_cap", config.crawl_hard_cap)?;
    validate_bound("crawl_limit", config.crawl_limit)?;
    validate_timeout("sitemap_timeout_secs", config.sitemap_timeout_secs)?;
    Ok(())
}

/// Validates batch bounds
fn validate_batch_config(config: &BatchConfig) -> Result<(), ConfigError> {
    validate_bound("max_pages", config.max_pages)?;
    validate_bound("max_chunks", config.max_chunks)?;
    validate_bound("max_errors", config.max_errors)?;
    validate_bound("max_samples", config.max_samples)?;
    Ok(())
}

/// Validates competitor search configuration
fn validate_competitor_config(config: &CompetitorConfig) -> Result<(), ConfigError> {
    validate_bound("max_results", config.max_results)?;
    validate_timeout("search_timeout_secs", config.search_timeout_secs)?;
    validate_endpoint("duckduckgo_url", &config.duckduckgo_url)?;
    validate_endpoint("bing_url", &config.bing_url)?;
    Ok(())
}

/// Validates grounded search configuration
fn validate_grounded_config(config: &GroundedConfig) -> Result<(), ConfigError> {
    validate_endpoint("grounded.endpoint", &config.endpoint)?;
    validate_timeout("grounded.timeout_secs", config.timeout_secs)?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "grounded.model cannot be empty".to_string(),
        ));
    }

    if config.api_key_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "grounded.api_key_env cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_timeout(name: &str, secs: u64) -> Result<(), ConfigError> {
    if secs < 1 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_TIMEOUT_SECS, secs
        )));
    }
    Ok(())
}

fn validate_bound(name: &str, value: usize) -> Result<(), ConfigError> {
    if value < 1 {
        return Err(ConfigError::Validation(format!(
            "{} must be >= 1, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Endpoints must be absolute HTTP(S) URLs
fn validate_endpoint(name: &str, endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, endpoint
        )));
    }

    Ok(())
}
