//! Error types for gis-cli.

use std::fmt::Write;
use std::path::PathBuf;

/// Result type alias for gis-cli operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a failed attempt to open a portal session.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The portal rejected the username/password pair.
    #[error("portal rejected the credentials: {message}")]
    InvalidCredentials {
        /// Message reported by the portal.
        message: String,
    },

    /// The portal could not be reached.
    #[error("could not reach portal at {url}")]
    Network {
        /// URL that was requested.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The portal answered with an error other than bad credentials.
    #[error("portal error {code}: {message}")]
    Portal {
        /// Error code reported by the portal.
        code: i64,
        /// Error message reported by the portal.
        message: String,
    },

    /// The portal answered with something that is not a session.
    #[error("unexpected response from {url}: {message}")]
    MalformedResponse {
        /// URL that was requested.
        url: String,
        /// What was wrong with the response.
        message: String,
    },
}

/// Top-level error type for gis-cli.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Failed to read the credentials file.
    #[error("failed to read credentials file '{path}'")]
    CredentialsRead {
        /// Path to the credentials file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Credentials file is not valid or lacks a required key.
    #[error("invalid credentials file '{path}'")]
    CredentialsParse {
        /// Path to the credentials file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// Opening the portal session failed.
    #[error("failed to connect to portal")]
    Connect(#[from] ConnectError),

    /// HTTP request failed in transport.
    #[error("request to {url} failed")]
    Http {
        /// URL that was requested.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The portal returned an error envelope.
    #[error("portal error {code} from {url}: {message}")]
    Portal {
        /// URL that was requested.
        url: String,
        /// Error code reported by the portal.
        code: i64,
        /// Error message, including any details.
        message: String,
    },

    /// The portal returned a response we could not interpret.
    #[error("unexpected response from {url}: {message}")]
    MalformedResponse {
        /// URL that was requested.
        url: String,
        /// What was wrong with the response.
        message: String,
    },

    /// The portal does not advertise a helper service the operation needs.
    #[error("portal does not provide a {service} service")]
    ServiceUnavailable {
        /// Kind of helper service (geocode, geoenrichment, analysis).
        service: String,
    },

    /// A remote job reported failure.
    #[error("{job} job failed: {message}")]
    JobFailed {
        /// Kind of job (publish, enrich).
        job: String,
        /// Failure message reported by the job.
        message: String,
    },

    /// A remote job did not finish within the allowed status checks.
    #[error("{job} job did not finish after {polls} status checks")]
    JobTimedOut {
        /// Kind of job (publish, enrich).
        job: String,
        /// Number of status checks performed.
        polls: u32,
    },

    /// Failed to read a CSV table.
    #[error("failed to read CSV '{path}'")]
    TableRead {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to write a CSV table.
    #[error("failed to write CSV '{path}'")]
    TableWrite {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A required column is absent.
    #[error("column '{column}' not found in '{path}'")]
    MissingColumn {
        /// Name of the missing column.
        column: String,
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// A cell expected to be numeric could not be parsed.
    #[error("invalid number '{value}' in column '{column}' at line {line} of '{path}'")]
    InvalidNumber {
        /// Column holding the value.
        column: String,
        /// 1-based line number in the file (header is line 1).
        line: usize,
        /// The offending text.
        value: String,
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Geocoder results cannot be aligned with the input rows.
    #[error("geocoder results do not line up with input rows: {message}")]
    GeocodeMismatch {
        /// Description of the mismatch.
        message: String,
    },

    /// An output directory does not exist.
    #[error("output directory does not exist: {path}")]
    OutputDirMissing {
        /// Path to the missing directory.
        path: PathBuf,
    },

    /// File has no usable name.
    #[error("path has no file name: {path}")]
    InvalidFileName {
        /// The offending path.
        path: PathBuf,
    },

    /// Failed to read a shapefile.
    #[error("failed to read shapefile '{path}'")]
    Shapefile {
        /// Path to the `.shp` file.
        path: PathBuf,
        /// Underlying shapefile error.
        #[source]
        source: shapefile::Error,
    },

    /// A required shapefile component is missing.
    #[error("shapefile component missing: {path}")]
    ShapefileComponentMissing {
        /// Expected path of the component.
        path: PathBuf,
    },

    /// Failed to build a zip archive.
    #[error("failed to write archive '{path}'")]
    Archive {
        /// Path to the archive.
        path: PathBuf,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// No feature layer matched the given title.
    #[error("no feature layer titled '{title}'")]
    LayerNotFound {
        /// Title that was searched.
        title: String,
    },

    /// Item has no service URL.
    #[error("item '{id}' has no service URL")]
    ItemHasNoUrl {
        /// Item ID.
        id: String,
    },

    /// Service exposes no layers.
    #[error("service '{url}' has no layers")]
    ServiceHasNoLayers {
        /// Service URL.
        url: String,
    },

    /// Failed to read the enrichment variables file.
    #[error("failed to read variables file '{path}'")]
    VariablesRead {
        /// Path to the variables file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The enrichment variables file lists no codes.
    #[error("variables file lists no variable codes: {path}")]
    EmptyVariableList {
        /// Path to the variables file.
        path: PathBuf,
    },

    /// Failed to serialize JSON output.
    #[error("failed to serialize JSON output")]
    JsonSerialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Internal error (unexpected state).
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// The message followed by every underlying cause, one per line.
    pub fn report(&self) -> String {
        let mut text = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let _ = write!(text, "\n  caused by: {cause}");
            source = cause.source();
        }
        text
    }
}
