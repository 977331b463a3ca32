//! Application-wide constants.
//!
//! Default values for configuration and the fixed names the portal
//! expects are defined here so changes are easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "gis-cli";

/// User agent sent with every portal request.
pub const USER_AGENT: &str = concat!("gis-cli/", env!("CARGO_PKG_VERSION"));

/// Default portal root.
pub const DEFAULT_PORTAL_URL: &str = "https://www.arcgis.com";

/// Default credentials file, one directory above the working directory.
pub const DEFAULT_CREDENTIALS_FILE: &str = "../keys.yaml";

/// HTTP timeouts in seconds.
pub mod http {
    /// Connection establishment timeout.
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;

    /// Whole-request timeout. Uploads of large archives need headroom.
    pub const TIMEOUT_SECS: u64 = 300;
}

/// Geocoding defaults.
pub mod geocode {
    /// Column holding the free-text address.
    pub const ADDRESS_COLUMN: &str = "Address";

    /// Column receiving longitude.
    pub const X_COLUMN: &str = "X";

    /// Column receiving latitude.
    pub const Y_COLUMN: &str = "Y";

    /// Prefix added to the input file name for the geocoded output.
    pub const OUTPUT_PREFIX: &str = "Geocoded ";

    /// Source country constraint sent with every address.
    pub const SOURCE_COUNTRY: &str = "USA";

    /// Output spatial reference (WGS84) so X/Y are longitude/latitude.
    pub const OUT_WKID: u32 = 4326;

    /// Batch size used when the locator does not advertise one.
    pub const FALLBACK_BATCH_SIZE: usize = 150;
}

/// Publishing defaults.
pub mod publish {
    /// Item description applied to every uploaded layer.
    pub const DESCRIPTION: &str = "Mobile Vaccine Sites Carbon Health";

    /// Comma-separated item tags.
    pub const TAGS: &str = "vaccine, i-team";

    /// Seconds between job status checks.
    pub const POLL_INTERVAL_SECS: u64 = 2;

    /// Status checks before a job is considered stuck.
    pub const MAX_POLLS: u32 = 300;
}

/// Enrichment defaults.
pub mod enrich {
    /// Country whose demographic catalog is used.
    pub const COUNTRY: &str = "US";

    /// Data collection holding the age/race/sex variables.
    pub const DATA_COLLECTION: &str = "AgeByRaceBySex";

    /// Variable codes file, one code per line.
    pub const VARIABLES_FILE: &str = "data/enrichment_variables/race_variables.txt";

    /// Buffer geometry type.
    pub const BUFFER_TYPE: &str = "StraightLine";

    /// Buffer radius.
    pub const DISTANCE: f64 = 3.0;

    /// Buffer radius units.
    pub const UNITS: &str = "Miles";

    /// Prefix for the enriched layer's name.
    pub const OUTPUT_PREFIX: &str = "Age and Race by Sex 3 Mile Buffer ";
}

/// Output locations.
pub mod output {
    /// Directory for CSV output. Must already exist.
    pub const CSV_DIR: &str = "output/csv";

    /// Directory receiving zipped shapefiles before upload.
    pub const SHAPEFILE_DIR: &str = "output";
}

/// Rows requested per page when downloading a layer.
pub const DEFAULT_PAGE_SIZE: usize = 2000;

/// Portal item type names.
pub mod item_types {
    /// Hosted feature service.
    pub const FEATURE_SERVICE: &str = "Feature Service";

    /// Feature collection stored as item JSON.
    pub const FEATURE_COLLECTION: &str = "Feature Collection";

    /// Zipped shapefile.
    pub const SHAPEFILE: &str = "Shapefile";
}
