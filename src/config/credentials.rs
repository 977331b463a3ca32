//! Portal credentials file.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Username and password for the portal.
///
/// Both keys are required; there are no placeholder defaults.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Portal username.
    #[serde(rename = "arcgis_username")]
    pub username: String,

    /// Portal password.
    #[serde(rename = "arcgis_password")]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Load credentials from a YAML document.
///
/// # File Format
/// ```yaml
/// arcgis_username: someone
/// arcgis_password: secret
/// ```
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::CredentialsRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_yaml::from_str(&contents).map_err(|e| Error::CredentialsParse {
        path: path.to_path_buf(),
        source: e,
    })
}
