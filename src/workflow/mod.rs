//! The remote operations behind each CLI flag.
//!
//! Each workflow takes a [`GisPlatform`](crate::platform::GisPlatform) so it
//! can run against the live portal or an in-memory stand-in.

pub mod download;
pub mod enrich;
pub mod geocode;
pub mod upload;

pub use download::download_feature_layer;
pub use enrich::{EnrichOptions, enrich_layer_by_title};
pub use geocode::{GeocodeOptions, GeocodeOutcome, GeocodeSummary, geocode_csv, merge_coordinates};
pub use upload::{
    UploadKind, UploadOptions, feature_collection_envelope, service_name, upload_feature_layer,
    warn_unsupported,
};
