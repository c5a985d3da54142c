use crate::config::types::{
    BrowserConfig, ChallengeConfig, Config, HarvesterConfig, StorageConfig, TimeoutConfig,
};
use crate::engine::EngineKind;
use crate::ConfigError;
use std::collections::HashSet;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvester_config(&config.harvester)?;
    validate_challenge_config(&config.challenge)?;
    validate_timeout_config(&config.timeouts)?;
    validate_browser_config(&config.browser)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

fn validate_harvester_config(config: &HarvesterConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 32 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 32, got {}",
            config.workers
        )));
    }

    if config.max_listing_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_listing_pages must be >= 1, got {}",
            config.max_listing_pages
        )));
    }

    if config.empty_page_streak < 1 {
        return Err(ConfigError::Validation(format!(
            "empty_page_streak must be >= 1, got {}",
            config.empty_page_streak
        )));
    }

    Ok(())
}

fn validate_challenge_config(config: &ChallengeConfig) -> Result<(), ConfigError> {
    if config.attempts < 1 || config.attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "challenge attempts must be between 1 and 10, got {}",
            config.attempts
        )));
    }

    Ok(())
}

fn validate_timeout_config(config: &TimeoutConfig) -> Result<(), ConfigError> {
    if config.navigation_secs < 1 {
        return Err(ConfigError::Validation(
            "navigation_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.engines.is_empty() {
        return Err(ConfigError::Validation(
            "at least one engine must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for name in &config.engines {
        if EngineKind::from_name(name).is_none() {
            return Err(ConfigError::UnknownEngine(name.clone()));
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "engine '{}' is listed more than once",
                name
            )));
        }
    }

    if config.locale.trim().is_empty() {
        return Err(ConfigError::Validation("locale cannot be empty".to_string()));
    }

    for name in config.extra_headers.keys() {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ConfigError::Validation(format!(
                "invalid extra header name '{}'",
                name
            )));
        }
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
