//! Configuration type definitions.

use crate::constants;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Portal connection settings.
    pub portal: PortalConfig,

    /// HTTP client settings.
    pub http: HttpConfig,

    /// Geocoding settings.
    pub geocode: GeocodeConfig,

    /// Item publishing settings.
    pub publish: PublishConfig,

    /// Enrichment settings.
    pub enrich: EnrichConfig,

    /// Layer download settings.
    pub download: DownloadConfig,

    /// Output locations.
    pub output: OutputConfig,
}

/// Portal connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Portal root or organisation home page URL.
    pub url: String,

    /// YAML file holding `arcgis_username` and `arcgis_password`.
    pub credentials_file: PathBuf,

    /// Geocode service to use instead of the portal's helper geocoder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocoder_url: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: constants::DEFAULT_PORTAL_URL.to_string(),
            credentials_file: PathBuf::from(constants::DEFAULT_CREDENTIALS_FILE),
            geocoder_url: None,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: constants::http::CONNECT_TIMEOUT_SECS,
            timeout_secs: constants::http::TIMEOUT_SECS,
        }
    }
}

/// How addresses are sent to the geocoder.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeocodeStrategy {
    /// One `geocodeAddresses` request per batch.
    #[default]
    Batch,
    /// One `findAddressCandidates` request per address.
    Single,
}

/// Geocoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    /// Country constraint applied to every address.
    pub source_country: String,

    /// Batch or per-address geocoding.
    pub strategy: GeocodeStrategy,

    /// Addresses per request, overriding the locator's suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            source_country: constants::geocode::SOURCE_COUNTRY.to_string(),
            strategy: GeocodeStrategy::Batch,
            batch_size: None,
        }
    }
}

/// Item publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Description applied to uploaded items.
    pub description: String,

    /// Comma-separated tags applied to uploaded items.
    pub tags: String,

    /// Seconds between job status checks.
    pub poll_interval_secs: u64,

    /// Status checks before giving up on a job.
    pub max_polls: u32,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            description: constants::publish::DESCRIPTION.to_string(),
            tags: constants::publish::TAGS.to_string(),
            poll_interval_secs: constants::publish::POLL_INTERVAL_SECS,
            max_polls: constants::publish::MAX_POLLS,
        }
    }
}

/// Enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Country code for the demographic catalog.
    pub country: String,

    /// Data collection the variable codes belong to.
    pub data_collection: String,

    /// File listing variable codes, one per line.
    pub variables_file: PathBuf,

    /// Buffer geometry type.
    pub buffer_type: String,

    /// Buffer radius.
    pub distance: f64,

    /// Buffer radius units.
    pub units: String,

    /// Prefix for the enriched layer's name.
    pub output_prefix: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            country: constants::enrich::COUNTRY.to_string(),
            data_collection: constants::enrich::DATA_COLLECTION.to_string(),
            variables_file: PathBuf::from(constants::enrich::VARIABLES_FILE),
            buffer_type: constants::enrich::BUFFER_TYPE.to_string(),
            distance: constants::enrich::DISTANCE,
            units: constants::enrich::UNITS.to_string(),
            output_prefix: constants::enrich::OUTPUT_PREFIX.to_string(),
        }
    }
}

/// Layer download settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Rows requested per query page.
    pub page_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            page_size: constants::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for CSV output.
    pub csv_dir: PathBuf,

    /// Directory for zipped shapefiles.
    pub shapefile_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from(constants::output::CSV_DIR),
            shapefile_dir: PathBuf::from(constants::output::SHAPEFILE_DIR),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_constants() {
        let config = Config::default();
        assert_eq!(config.geocode.source_country, "USA");
        assert_eq!(config.enrich.distance, 3.0);
        assert_eq!(config.enrich.units, "Miles");
        assert_eq!(config.output.csv_dir, PathBuf::from("output/csv"));
        assert_eq!(config.geocode.strategy, GeocodeStrategy::Batch);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[geocode]
strategy = "single"

[enrich]
distance = 5.0
"#,
        )
        .unwrap();
        assert_eq!(config.geocode.strategy, GeocodeStrategy::Single);
        assert_eq!(config.geocode.source_country, "USA");
        assert_eq!(config.enrich.distance, 5.0);
        assert_eq!(config.enrich.buffer_type, "StraightLine");
    }
}
