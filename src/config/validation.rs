use crate::config::types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::crawler::MAX_REQUESTS_PER_SECOND;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Runs before any worker starts; every invalid value is reported as a
/// `ConfigError` and nothing is spawned.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.workers < 1 {
        return Err(ConfigError::Validation(format!(
            "workers must be >= 1, got {}",
            config.workers
        )));
    }

    if !(1..=MAX_REQUESTS_PER_SECOND).contains(&config.requests_per_second) {
        return Err(ConfigError::Validation(format!(
            "requests_per_second must be between 1 and {}, got {}",
            MAX_REQUESTS_PER_SECOND, config.requests_per_second
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "queue_capacity must be >= 1, got {}",
            config.queue_capacity
        )));
    }

    if config.request_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll_interval_ms must be > 0".to_string(),
        ));
    }

    if config.stable_polls < 1 {
        return Err(ConfigError::Validation(format!(
            "stable_polls must be >= 1, got {}",
            config.stable_polls
        )));
    }

    validate_seed_url(&config.seed_url)?;

    Ok(())
}

/// Validates that the seed is an absolute http(s) URL with a host
fn validate_seed_url(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use the http or https scheme",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("results_json", &config.results_json),
        ("results_csv", &config.results_csv),
        ("links_csv", &config.links_csv),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_zero_values() {
        let cases: [fn(&mut CrawlerConfig); 6] = [
            |c| c.workers = 0,
            |c| c.requests_per_second = 0,
            |c| c.queue_capacity = 0,
            |c| c.request_timeout_ms = 0,
            |c| c.poll_interval_ms = 0,
            |c| c.stable_polls = 0,
        ];

        for mutate in cases {
            let mut config = Config::default();
            mutate(&mut config.crawler);
            assert!(matches!(
                validate(&config),
                Err(ConfigError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_rejects_rate_beyond_refill_resolution() {
        let mut config = Config::default();
        config.crawler.requests_per_second = MAX_REQUESTS_PER_SECOND;
        assert!(validate(&config).is_ok());

        config.crawler.requests_per_second = MAX_REQUESTS_PER_SECOND + 1;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_depth_is_valid() {
        let mut config = Config::default();
        config.crawler.max_depth = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_seed_url() {
        assert!(validate_seed_url("https://example.com/").is_ok());
        assert!(validate_seed_url("http://127.0.0.1:8080/start").is_ok());

        assert!(matches!(
            validate_seed_url("not a url"),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_seed_url("ftp://example.com/"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            validate_seed_url("mailto:someone@example.com"),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_user_agent() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "  ".to_string();
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.user_agent.contact_url = Some("not a url".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_output() {
        let mut config = Config::default();
        config.output.links_csv = String::new();
        assert!(validate(&config).is_err());
    }
}
