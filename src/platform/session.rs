//! Portal session establishment.

use super::wire::{self, HelperGeocoder, PortalSelf, TokenResponse};
use crate::config::{Config, Credentials};
use crate::constants;
use crate::error::ConnectError;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Token lifetime requested from the portal, in minutes.
const TOKEN_EXPIRATION_MINUTES: u32 = 120;

/// Settings the client needs beyond credentials.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Portal root or organisation page URL.
    pub portal_url: String,
    /// Geocode service override.
    pub geocoder_url: Option<String>,
    /// Addresses per geocode request, overriding the locator.
    pub batch_size: Option<usize>,
    /// Rows per query page.
    pub page_size: usize,
    /// Delay between job status checks.
    pub poll_interval: Duration,
    /// Status checks before giving up.
    pub max_polls: u32,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Show progress bars and spinners.
    pub show_progress: bool,
}

impl ClientSettings {
    /// Build settings from the loaded configuration.
    pub fn from_config(config: &Config, show_progress: bool) -> Self {
        Self {
            portal_url: config.portal.url.clone(),
            geocoder_url: config.portal.geocoder_url.clone(),
            batch_size: config.geocode.batch_size,
            page_size: config.download.page_size,
            poll_interval: Duration::from_secs(config.publish.poll_interval_secs),
            max_polls: config.publish.max_polls,
            connect_timeout: Duration::from_secs(config.http.connect_timeout_secs),
            timeout: Duration::from_secs(config.http.timeout_secs),
            show_progress,
        }
    }
}

/// Reduce an organisation page URL to the portal root.
///
/// `http://lahub.maps.arcgis.com/home/organization.html` becomes
/// `http://lahub.maps.arcgis.com`. Paths before `/home` or `/sharing` are
/// kept so on-premises portals under a web adaptor still work.
pub fn portal_root(url: &str) -> Result<String, ConnectError> {
    let parsed = Url::parse(url).map_err(|e| ConnectError::MalformedResponse {
        url: url.to_string(),
        message: format!("invalid portal URL: {e}"),
    })?;

    let path = parsed.path();
    let cut = ["/home", "/sharing"]
        .iter()
        .filter_map(|marker| path.find(marker))
        .min()
        .unwrap_or(path.len());
    let base_path = path[..cut].trim_end_matches('/');

    let mut root = format!("{}://{}", parsed.scheme(), parsed.host_str().unwrap_or_default());
    if let Some(port) = parsed.port() {
        root = format!("{root}:{port}");
    }
    root.push_str(base_path);
    Ok(root)
}

/// Map a token endpoint response to a token or a connection error.
pub(super) fn token_from_body(url: &str, text: &str) -> Result<String, ConnectError> {
    let body: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ConnectError::MalformedResponse {
            url: url.to_string(),
            message: format!("not JSON: {e}"),
        })?;

    if let Some(err) = wire::portal_error(&body) {
        let message = err.full_message();
        // generateToken reports bad username/password as a 400
        return Err(if err.code == 400 || message.contains("Invalid username or password") {
            ConnectError::InvalidCredentials { message }
        } else {
            ConnectError::Portal {
                code: err.code,
                message,
            }
        });
    }

    let parsed: TokenResponse =
        serde_json::from_value(body).map_err(|e| ConnectError::MalformedResponse {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    parsed
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ConnectError::MalformedResponse {
            url: url.to_string(),
            message: "no token in response".to_string(),
        })
}

/// Map a `portals/self` response to its description.
pub(super) fn portal_self_from_body(url: &str, text: &str) -> Result<PortalSelf, ConnectError> {
    let body: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ConnectError::MalformedResponse {
            url: url.to_string(),
            message: format!("not JSON: {e}"),
        })?;

    if let Some(err) = wire::portal_error(&body) {
        return Err(ConnectError::Portal {
            code: err.code,
            message: err.full_message(),
        });
    }

    serde_json::from_value(body).map_err(|e| ConnectError::MalformedResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Choose the geocode service: explicit override, else the first
/// batch-capable helper, else the first helper.
pub(super) fn choose_geocoder(
    override_url: Option<&str>,
    helpers: &[HelperGeocoder],
) -> Option<String> {
    if let Some(url) = override_url {
        return Some(url.to_string());
    }
    helpers
        .iter()
        .find(|g| g.batch)
        .or_else(|| helpers.first())
        .map(|g| g.url.clone())
}

/// Form fields for `generateToken`.
pub(super) fn token_form(credentials: &Credentials, referer: &str) -> Vec<(String, String)> {
    debug!("Requesting token for {}", credentials.username);
    vec![
        ("username".to_string(), credentials.username.clone()),
        ("password".to_string(), credentials.password.clone()),
        ("client".to_string(), "referer".to_string()),
        ("referer".to_string(), referer.to_string()),
        (
            "expiration".to_string(),
            TOKEN_EXPIRATION_MINUTES.to_string(),
        ),
        ("f".to_string(), "json".to_string()),
    ]
}

/// Build the HTTP client shared by every request.
pub(super) fn build_http_client(settings: &ClientSettings) -> Result<reqwest::Client, ConnectError> {
    reqwest::Client::builder()
        .user_agent(constants::USER_AGENT)
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.timeout)
        .build()
        .map_err(|e| ConnectError::Network {
            url: settings.portal_url.clone(),
            source: e,
        })
}
