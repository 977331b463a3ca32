//! JSON shapes exchanged with the portal REST API.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Error envelope returned with HTTP 200 by most endpoints.
#[derive(Debug, Deserialize)]
pub struct PortalError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl PortalError {
    /// Message with any details appended.
    pub fn full_message(&self) -> String {
        if self.details.is_empty() {
            self.message.clone()
        } else {
            format!("{} ({})", self.message, self.details.join("; "))
        }
    }
}

/// Extract an error envelope from a response body, if there is one.
pub fn portal_error(body: &Value) -> Option<PortalError> {
    body.get("error")
        .and_then(|e| serde_json::from_value(e.clone()).ok())
}

/// Parse a response body, turning error envelopes into [`Error::Portal`].
pub fn parse_body<T: DeserializeOwned>(url: &str, text: &str) -> Result<T> {
    let body: Value = serde_json::from_str(text).map_err(|e| Error::MalformedResponse {
        url: url.to_string(),
        message: format!("not JSON: {e}"),
    })?;

    if let Some(err) = portal_error(&body) {
        return Err(Error::Portal {
            url: url.to_string(),
            code: err.code,
            message: err.full_message(),
        });
    }

    serde_json::from_value(body).map_err(|e| Error::MalformedResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PortalSelf {
    #[serde(default)]
    pub user: Option<PortalUser>,
    #[serde(default, rename = "helperServices")]
    pub helper_services: HelperServices,
}

#[derive(Debug, Deserialize)]
pub struct PortalUser {
    pub username: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HelperServices {
    #[serde(default)]
    pub geocode: Vec<HelperGeocoder>,
    #[serde(default)]
    pub geoenrichment: Option<HelperService>,
    #[serde(default)]
    pub analysis: Option<HelperService>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelperGeocoder {
    pub url: String,
    #[serde(default)]
    pub batch: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelperService {
    pub url: String,
}

/// Geocode service description (`GeocodeServer?f=json`).
#[derive(Debug, Default, Deserialize)]
pub struct LocatorInfo {
    #[serde(default, rename = "locatorProperties")]
    pub locator_properties: LocatorProperties,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocatorProperties {
    #[serde(default, rename = "MaxBatchSize")]
    pub max_batch_size: Option<usize>,
    #[serde(default, rename = "SuggestedBatchSize")]
    pub suggested_batch_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeAddressesResponse {
    #[serde(default)]
    pub locations: Vec<BatchLocation>,
}

#[derive(Debug, Deserialize)]
pub struct BatchLocation {
    pub attributes: BatchAttributes,
}

#[derive(Debug, Deserialize)]
pub struct BatchAttributes {
    #[serde(rename = "ResultID")]
    pub result_id: i64,
    #[serde(default, rename = "Status")]
    pub status: String,
    #[serde(default, rename = "Score")]
    pub score: f64,
    #[serde(default, rename = "X")]
    pub x: Option<f64>,
    #[serde(default, rename = "Y")]
    pub y: Option<f64>,
    #[serde(default, rename = "Match_addr")]
    pub match_addr: String,
}

#[derive(Debug, Deserialize)]
pub struct CandidatesResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub address: String,
    pub location: Point,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(rename = "featureCollection")]
    pub feature_collection: GeneratedCollection,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedCollection {
    #[serde(default)]
    pub layers: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemResponse {
    #[serde(default)]
    pub success: bool,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct PublishResponse {
    #[serde(default)]
    pub services: Vec<PublishedEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PublishedEntry {
    #[serde(rename = "serviceItemId")]
    pub service_item_id: Option<String>,
    #[serde(default, rename = "serviceurl")]
    pub service_url: Option<String>,
    #[serde(default, rename = "jobId")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub error: Option<PortalError>,
}

#[derive(Debug, Deserialize)]
pub struct ItemStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "statusMessage")]
    pub status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<ItemJson>,
}

#[derive(Debug, Deserialize)]
pub struct ItemJson {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub created: Option<i64>,
}

impl From<ItemJson> for super::ItemSummary {
    fn from(item: ItemJson) -> Self {
        Self {
            id: item.id,
            title: item.title,
            item_type: item.item_type,
            url: item.url.filter(|u| !u.is_empty()),
            owner: item.owner,
            created: item.created,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub layers: Vec<LayerJson>,
}

#[derive(Debug, Deserialize)]
pub struct LayerJson {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LayerDetails {
    #[serde(default, rename = "advancedQueryCapabilities")]
    pub advanced_query_capabilities: Option<QueryCapabilities>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryCapabilities {
    #[serde(default, rename = "supportsPagination")]
    pub supports_pagination: bool,
}

#[derive(Debug, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub fields: Vec<FieldJson>,
    #[serde(default)]
    pub features: Vec<FeatureJson>,
    #[serde(default, rename = "exceededTransferLimit")]
    pub exceeded_transfer_limit: bool,
}

#[derive(Debug, Deserialize)]
pub struct FieldJson {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FeatureJson {
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct DataCollectionsResponse {
    #[serde(default, rename = "DataCollections")]
    pub data_collections: Vec<DataCollectionJson>,
}

#[derive(Debug, Deserialize)]
pub struct DataCollectionJson {
    #[serde(rename = "dataCollectionID")]
    pub id: String,
    #[serde(default)]
    pub data: Vec<VariableJson>,
}

#[derive(Debug, Deserialize)]
pub struct VariableJson {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct JobSubmitted {
    #[serde(rename = "jobId")]
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "jobStatus")]
    pub job_status: String,
    #[serde(default)]
    pub messages: Vec<JobMessage>,
}

#[derive(Debug, Deserialize)]
pub struct JobMessage {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct JobResult {
    pub value: EnrichedValue,
}

#[derive(Debug, Deserialize)]
pub struct EnrichedValue {
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "itemId")]
    pub item_id: Option<String>,
}
