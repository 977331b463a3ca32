//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_portal(config)?;
    validate_limits(config)?;
    validate_enrich(config)?;
    Ok(())
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

/// Validate portal and geocoder URLs.
fn validate_portal(config: &Config) -> Result<()> {
    check_http_url("portal.url", &config.portal.url)?;
    if let Some(ref geocoder) = config.portal.geocoder_url {
        check_http_url("portal.geocoder_url", geocoder)?;
    }
    Ok(())
}

fn check_http_url(key: &str, value: &str) -> Result<()> {
    let url = url::Url::parse(value).map_err(|e| invalid(format!("{key} '{value}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "{key} must use http or https, got '{}'",
            url.scheme()
        )));
    }
    Ok(())
}

/// Validate timeouts, polling, and paging.
fn validate_limits(config: &Config) -> Result<()> {
    if config.http.connect_timeout_secs == 0 || config.http.timeout_secs == 0 {
        return Err(invalid("http timeouts must be at least 1 second"));
    }

    if config.publish.poll_interval_secs == 0 {
        return Err(invalid("publish.poll_interval_secs must be at least 1"));
    }

    if config.publish.max_polls == 0 {
        return Err(invalid("publish.max_polls must be at least 1"));
    }

    if config.download.page_size == 0 {
        return Err(invalid("download.page_size must be at least 1"));
    }

    if config.geocode.batch_size == Some(0) {
        return Err(invalid("geocode.batch_size must be at least 1"));
    }

    if config.geocode.source_country.trim().is_empty() {
        return Err(invalid("geocode.source_country must not be empty"));
    }

    if config.publish.tags.trim().is_empty() {
        return Err(invalid("publish.tags must not be empty"));
    }

    Ok(())
}

/// Validate enrichment buffer settings.
fn validate_enrich(config: &Config) -> Result<()> {
    let enrich = &config.enrich;

    if !(enrich.distance.is_finite() && enrich.distance > 0.0) {
        return Err(invalid(format!(
            "enrich.distance must be positive, got {}",
            enrich.distance
        )));
    }

    if enrich.country.trim().is_empty() {
        return Err(invalid("enrich.country must not be empty"));
    }

    if enrich.data_collection.trim().is_empty() {
        return Err(invalid("enrich.data_collection must not be empty"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_http_portal() {
        let mut config = Config::default();
        config.portal.url = "ftp://portal.example.com".to_string();
        assert!(validate_config(&config).is_err());

        config.portal.url = "not a url".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_non_positive_distance() {
        let mut config = Config::default();
        config.enrich.distance = 0.0;
        assert!(validate_config(&config).is_err());

        config.enrich.distance = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let mut config = Config::default();
        config.geocode.batch_size = Some(0);
        assert!(validate_config(&config).is_err());

        config.geocode.batch_size = Some(100);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let mut config = Config::default();
        config.publish.poll_interval_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
