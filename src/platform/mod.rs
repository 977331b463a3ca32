//! Remote GIS platform access.
//!
//! Every capability the workflows need from the hosted portal goes through
//! [`GisPlatform`]. [`ArcGisClient`] implements it over the portal's REST
//! API; tests substitute an in-memory implementation.

mod client;
mod session;
mod wire;

pub use client::ArcGisClient;
pub use session::{ClientSettings, portal_root};

use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// One address sent to the geocoder, tagged with its row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Correlation ID; the geocoder echoes it back as `ResultID`.
    pub id: usize,
    /// Free-text address.
    pub address: String,
}

/// Geocoder verdict for one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// Matched to a location.
    Matched,
    /// Tied between candidates; a location is still returned.
    Tied,
    /// Not matched.
    Unmatched,
}

impl MatchStatus {
    /// Parse the geocoder's one-letter status code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "M" => Self::Matched,
            "T" => Self::Tied,
            _ => Self::Unmatched,
        }
    }
}

/// Geocoder result for one address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    /// Correlation ID of the input address.
    pub result_id: usize,
    /// Match status.
    pub status: MatchStatus,
    /// Match score (0-100).
    pub score: f64,
    /// Longitude, when matched.
    pub x: Option<f64>,
    /// Latitude, when matched.
    pub y: Option<f64>,
    /// Address the geocoder matched to.
    pub match_address: String,
}

impl GeocodeMatch {
    /// Result for an address the geocoder could not place.
    pub fn unmatched(result_id: usize) -> Self {
        Self {
            result_id,
            status: MatchStatus::Unmatched,
            score: 0.0,
            x: None,
            y: None,
            match_address: String::new(),
        }
    }

    /// Coordinates, if the address was placed.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.status, self.x, self.y) {
            (MatchStatus::Unmatched, _, _) => None,
            (_, Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}

/// Columns holding point coordinates in an uploaded CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateFields<'a> {
    /// Latitude column.
    pub latitude: &'a str,
    /// Longitude column.
    pub longitude: &'a str,
}

/// Display metadata for a portal item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemMetadata {
    /// Item title.
    pub title: String,
    /// Item description.
    pub description: String,
    /// Comma-separated tags.
    pub tags: String,
}

/// A new item to register with the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// Portal item type, e.g. `Feature Collection` or `Shapefile`.
    pub item_type: String,
    /// Display metadata.
    pub metadata: ItemMetadata,
    /// Item JSON stored inline, for feature collections.
    pub text: Option<String>,
}

/// Source format of an item being published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishFileType {
    /// Feature collection item JSON.
    FeatureCollection,
    /// Zipped shapefile.
    Shapefile,
}

impl PublishFileType {
    /// Name the publish endpoint expects.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FeatureCollection => "featureCollection",
            Self::Shapefile => "shapefile",
        }
    }
}

/// A hosted feature service created by publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedService {
    /// Item ID of the new service.
    pub item_id: String,
    /// Service URL.
    pub service_url: String,
}

/// Summary of a portal item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    /// Item ID.
    pub id: String,
    /// Item title.
    pub title: String,
    /// Item type.
    pub item_type: String,
    /// Service URL, for service items.
    pub url: Option<String>,
    /// Owner's username.
    pub owner: String,
    /// Creation time in epoch milliseconds.
    pub created: Option<i64>,
}

/// A layer within a feature service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    /// Layer index within the service.
    pub id: i64,
    /// Layer name.
    pub name: String,
}

impl LayerInfo {
    /// URL of this layer under `service_url`.
    pub fn url_under(&self, service_url: &str) -> String {
        format!("{}/{}", service_url.trim_end_matches('/'), self.id)
    }
}

/// All attribute rows of a layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Field names in service order.
    pub fields: Vec<String>,
    /// One attribute map per feature.
    pub rows: Vec<Map<String, Value>>,
}

/// A demographic data collection and its variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCollection {
    /// Collection ID, e.g. `AgeByRaceBySex`.
    pub id: String,
    /// Variable IDs in the collection.
    pub variables: Vec<String>,
}

/// Parameters for a buffered enrichment job.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichRequest {
    /// URL of the layer to enrich.
    pub input_layer_url: String,
    /// Country code.
    pub country: String,
    /// Fully qualified variable names.
    pub analysis_variables: Vec<String>,
    /// Buffer type, e.g. `StraightLine`.
    pub buffer_type: String,
    /// Buffer radius.
    pub distance: f64,
    /// Buffer units, e.g. `Miles`.
    pub units: String,
    /// Name of the layer the job creates.
    pub output_name: String,
}

/// Layer created by an enrichment job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedLayer {
    /// Item ID of the new layer.
    pub item_id: String,
    /// Service URL of the new layer.
    pub url: String,
}

/// Remote capabilities of the hosted GIS portal.
#[allow(async_fn_in_trait)]
pub trait GisPlatform {
    /// Geocode addresses in batches. One result per input, keyed by `id`.
    async fn batch_geocode(
        &self,
        addresses: &[AddressRecord],
        source_country: &str,
    ) -> Result<Vec<GeocodeMatch>>;

    /// Geocode a single address, returning the best candidate.
    async fn geocode_one(
        &self,
        address: &AddressRecord,
        source_country: &str,
    ) -> Result<GeocodeMatch>;

    /// Turn CSV text with coordinate columns into feature collection layers.
    async fn generate_feature_collection(
        &self,
        csv_text: &str,
        name: &str,
        coordinates: CoordinateFields<'_>,
    ) -> Result<Vec<Value>>;

    /// Register an item, optionally uploading a file. Returns the item ID.
    async fn add_item(&self, item: &NewItem, data: Option<&Path>) -> Result<String>;

    /// Publish an item as a hosted feature service and wait for completion.
    async fn publish_item(
        &self,
        item_id: &str,
        file_type: PublishFileType,
        service_name: &str,
    ) -> Result<PublishedService>;

    /// Replace an item's display metadata.
    async fn update_item(&self, item_id: &str, metadata: &ItemMetadata) -> Result<()>;

    /// Search items with a portal query string.
    async fn search_items(&self, query: &str) -> Result<Vec<ItemSummary>>;

    /// Fetch an item by ID.
    async fn get_item(&self, item_id: &str) -> Result<ItemSummary>;

    /// List the layers of a feature service.
    async fn service_layers(&self, service_url: &str) -> Result<Vec<LayerInfo>>;

    /// Fetch every row of a layer, all fields, without geometry.
    async fn query_all(&self, layer_url: &str) -> Result<QueryResult>;

    /// List a country's demographic data collections.
    async fn data_collections(&self, country: &str) -> Result<Vec<DataCollection>>;

    /// Run a buffered enrichment job and wait for its output layer.
    async fn enrich_layer(&self, request: &EnrichRequest) -> Result<EnrichedLayer>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_status_codes() {
        assert_eq!(MatchStatus::from_code("M"), MatchStatus::Matched);
        assert_eq!(MatchStatus::from_code("T"), MatchStatus::Tied);
        assert_eq!(MatchStatus::from_code("U"), MatchStatus::Unmatched);
        assert_eq!(MatchStatus::from_code(""), MatchStatus::Unmatched);
    }

    #[test]
    fn test_unmatched_has_no_coordinates() {
        let mut m = GeocodeMatch::unmatched(3);
        assert_eq!(m.coordinates(), None);

        m.status = MatchStatus::Matched;
        m.x = Some(-118.24);
        m.y = Some(34.05);
        assert_eq!(m.coordinates(), Some((-118.24, 34.05)));
    }

    #[test]
    fn test_layer_url_under_service() {
        let layer = LayerInfo {
            id: 0,
            name: "sites".to_string(),
        };
        assert_eq!(
            layer.url_under("https://services.example.com/FeatureServer/"),
            "https://services.example.com/FeatureServer/0"
        );
    }
}
