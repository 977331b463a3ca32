//! Portal REST client.

use super::session::{self, ClientSettings};
use super::wire::{
    self, AddItemResponse, CandidatesResponse, DataCollectionsResponse, GenerateResponse,
    GeocodeAddressesResponse, ItemJson, ItemStatus, JobResult, JobStatus, JobSubmitted,
    LayerDetails, LocatorInfo, LocatorProperties, PublishResponse, QueryPage, SearchResponse,
    ServiceInfo, SuccessResponse,
};
use super::{
    AddressRecord, CoordinateFields, DataCollection, EnrichRequest, EnrichedLayer, GeocodeMatch,
    GisPlatform, ItemMetadata, ItemSummary, LayerInfo, MatchStatus, NewItem, PublishFileType,
    PublishedService, QueryResult,
};
use crate::config::Credentials;
use crate::constants::geocode::{FALLBACK_BATCH_SIZE, OUT_WKID};
use crate::error::{ConnectError, Error, Result};
use crate::output::progress;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

/// State of a remote job after one status check.
#[derive(Debug, PartialEq, Eq)]
enum JobState {
    Running,
    Done,
    Failed(String),
}

/// Authenticated session with a hosted GIS portal.
#[derive(Debug)]
pub struct ArcGisClient {
    http: reqwest::Client,
    portal: String,
    token: String,
    username: String,
    geocoder_url: Option<String>,
    geoenrichment_url: Option<String>,
    analysis_url: Option<String>,
    settings: ClientSettings,
}

impl ArcGisClient {
    /// Open a session: exchange credentials for a token, then discover the
    /// signed-in user and the portal's helper services.
    pub async fn connect(
        settings: ClientSettings,
        credentials: &Credentials,
    ) -> std::result::Result<Self, ConnectError> {
        let portal = session::portal_root(&settings.portal_url)?;
        let http = session::build_http_client(&settings)?;

        let token_url = format!("{portal}/sharing/rest/generateToken");
        let text = http
            .post(&token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(encode_form(&session::token_form(credentials, &portal)))
            .send()
            .await
            .map_err(|e| ConnectError::Network {
                url: token_url.clone(),
                source: e,
            })?
            .text()
            .await
            .map_err(|e| ConnectError::Network {
                url: token_url.clone(),
                source: e,
            })?;
        let token = session::token_from_body(&token_url, &text)?;

        let self_url = format!("{portal}/sharing/rest/portals/self");
        let request_url = Url::parse_with_params(&self_url, [("f", "json"), ("token", token.as_str())])
            .map_err(|e| ConnectError::MalformedResponse {
                url: self_url.clone(),
                message: e.to_string(),
            })?;
        let text = http
            .get(request_url)
            .send()
            .await
            .map_err(|e| ConnectError::Network {
                url: self_url.clone(),
                source: e,
            })?
            .text()
            .await
            .map_err(|e| ConnectError::Network {
                url: self_url.clone(),
                source: e,
            })?;
        let portal_self = session::portal_self_from_body(&self_url, &text)?;

        let username = portal_self
            .user
            .map(|u| u.username)
            .unwrap_or_else(|| credentials.username.clone());
        let helpers = portal_self.helper_services;
        let geocoder_url =
            session::choose_geocoder(settings.geocoder_url.as_deref(), &helpers.geocode);

        info!("Connected to {portal} as {username}");
        debug!(
            "Helper services: geocode={:?}, geoenrichment={:?}, analysis={:?}",
            geocoder_url,
            helpers.geoenrichment.as_ref().map(|s| &s.url),
            helpers.analysis.as_ref().map(|s| &s.url)
        );

        Ok(Self {
            http,
            portal,
            token,
            username,
            geocoder_url,
            geoenrichment_url: helpers.geoenrichment.map(|s| s.url),
            analysis_url: helpers.analysis.map(|s| s.url),
            settings,
        })
    }

    /// Name of the signed-in user.
    pub fn username(&self) -> &str {
        &self.username
    }

    fn sharing(&self, path: &str) -> String {
        format!("{}/sharing/rest/{path}", self.portal)
    }

    fn user_content(&self, path: &str) -> String {
        self.sharing(&format!("content/users/{}/{path}", self.username))
    }

    fn authed<'a>(&'a self, params: &[(&'a str, String)]) -> Vec<(&'a str, String)> {
        let mut all = params.to_vec();
        all.push(("f", "json".to_string()));
        all.push(("token", self.token.clone()));
        all
    }

    fn helper<'a>(url: Option<&'a String>, service: &str) -> Result<&'a str> {
        url.map(String::as_str)
            .ok_or_else(|| Error::ServiceUnavailable {
                service: service.to_string(),
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, String)]) -> Result<T> {
        let request_url =
            Url::parse_with_params(url, self.authed(params)).map_err(|e| Error::MalformedResponse {
                url: url.to_string(),
                message: format!("invalid URL: {e}"),
            })?;
        debug!("GET {url}");
        let response = self
            .http
            .get(request_url)
            .send()
            .await
            .map_err(|e| http_error(url, e))?;
        read_body(url, response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, String)]) -> Result<T> {
        debug!("POST {url}");
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(encode_form(&self.authed(params)))
            .send()
            .await
            .map_err(|e| http_error(url, e))?;
        read_body(url, response).await
    }

    async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
        file: &Path,
    ) -> Result<T> {
        let mut form = Form::new();
        for (key, value) in self.authed(params) {
            form = form.text(key.to_string(), value);
        }

        let bytes = tokio::fs::read(file).await?;
        let file_name = crate::table::file_name_of(file)?;
        debug!("POST {url} with {file_name} ({} bytes)", bytes.len());
        form = form.part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| http_error(url, e))?;
        read_body(url, response).await
    }

    /// Addresses per `geocodeAddresses` request.
    async fn geocode_batch_size(&self, geocoder: &str) -> Result<usize> {
        let info: LocatorInfo = self.get_json(geocoder, &[]).await?;
        Ok(batch_size(&info.locator_properties, self.settings.batch_size))
    }
}

impl GisPlatform for ArcGisClient {
    async fn batch_geocode(
        &self,
        addresses: &[AddressRecord],
        source_country: &str,
    ) -> Result<Vec<GeocodeMatch>> {
        let geocoder = Self::helper(self.geocoder_url.as_ref(), "geocode")?;
        let batch_size = self.geocode_batch_size(geocoder).await?;
        let url = format!("{geocoder}/geocodeAddresses");
        info!(
            "Geocoding {} address(es) in batches of {batch_size}",
            addresses.len()
        );

        let pb = progress::create_address_progress(addresses.len(), self.settings.show_progress);
        let mut matches = Vec::with_capacity(addresses.len());

        for chunk in addresses.chunks(batch_size) {
            let records: Vec<Value> = chunk
                .iter()
                .map(|a| json!({ "attributes": { "OBJECTID": a.id, "SingleLine": a.address } }))
                .collect();
            let params = [
                ("addresses", json!({ "records": records }).to_string()),
                ("sourceCountry", source_country.to_string()),
                ("outSR", OUT_WKID.to_string()),
            ];
            let response: GeocodeAddressesResponse = self.post_json(&url, &params).await?;

            for location in response.locations {
                let attrs = location.attributes;
                let result_id =
                    usize::try_from(attrs.result_id).map_err(|_| Error::MalformedResponse {
                        url: url.clone(),
                        message: format!("negative ResultID {}", attrs.result_id),
                    })?;
                matches.push(GeocodeMatch {
                    result_id,
                    status: MatchStatus::from_code(&attrs.status),
                    score: attrs.score,
                    x: attrs.x,
                    y: attrs.y,
                    match_address: attrs.match_addr,
                });
            }
            progress::inc_progress(pb.as_ref(), chunk.len());
        }

        progress::finish_progress(pb, "Geocoding complete");
        Ok(matches)
    }

    async fn geocode_one(
        &self,
        address: &AddressRecord,
        source_country: &str,
    ) -> Result<GeocodeMatch> {
        let geocoder = Self::helper(self.geocoder_url.as_ref(), "geocode")?;
        let url = format!("{geocoder}/findAddressCandidates");
        let params = [
            ("SingleLine", address.address.clone()),
            ("sourceCountry", source_country.to_string()),
            ("maxLocations", "1".to_string()),
            ("outSR", OUT_WKID.to_string()),
        ];
        let response: CandidatesResponse = self.get_json(&url, &params).await?;

        Ok(response.candidates.into_iter().next().map_or_else(
            || GeocodeMatch::unmatched(address.id),
            |c| GeocodeMatch {
                result_id: address.id,
                status: MatchStatus::Matched,
                score: c.score,
                x: Some(c.location.x),
                y: Some(c.location.y),
                match_address: c.address,
            },
        ))
    }

    async fn generate_feature_collection(
        &self,
        csv_text: &str,
        name: &str,
        coordinates: CoordinateFields<'_>,
    ) -> Result<Vec<Value>> {
        let url = self.sharing("content/features/generate");
        let publish_parameters = json!({
            "name": name,
            "locationType": "coordinates",
            "latitudeFieldName": coordinates.latitude,
            "longitudeFieldName": coordinates.longitude,
            "sourceSR": { "wkid": OUT_WKID },
        });
        let params = [
            ("filetype", "csv".to_string()),
            ("text", csv_text.to_string()),
            ("publishParameters", publish_parameters.to_string()),
        ];
        let response: GenerateResponse = self.post_json(&url, &params).await?;

        let layers = response.feature_collection.layers;
        if layers.is_empty() {
            return Err(Error::MalformedResponse {
                url,
                message: "feature collection has no layers".to_string(),
            });
        }
        Ok(layers)
    }

    async fn add_item(&self, item: &NewItem, data: Option<&Path>) -> Result<String> {
        let url = self.user_content("addItem");
        let mut params = vec![
            ("type", item.item_type.clone()),
            ("title", item.metadata.title.clone()),
            ("description", item.metadata.description.clone()),
            ("tags", item.metadata.tags.clone()),
        ];
        if let Some(ref text) = item.text {
            params.push(("text", text.clone()));
        }

        let response: AddItemResponse = match data {
            Some(file) => self.post_multipart(&url, &params, file).await?,
            None => self.post_json(&url, &params).await?,
        };

        match response.id {
            Some(id) if response.success => {
                info!("Added item {id} ({})", item.item_type);
                Ok(id)
            }
            _ => Err(Error::MalformedResponse {
                url,
                message: "addItem did not return an item ID".to_string(),
            }),
        }
    }

    async fn publish_item(
        &self,
        item_id: &str,
        file_type: PublishFileType,
        service_name: &str,
    ) -> Result<PublishedService> {
        let url = self.user_content("publish");
        let params = [
            ("itemId", item_id.to_string()),
            ("filetype", file_type.as_str().to_string()),
            ("publishParameters", json!({ "name": service_name }).to_string()),
        ];
        let response: PublishResponse = self.post_json(&url, &params).await?;

        let entry = response
            .services
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedResponse {
                url: url.clone(),
                message: "publish returned no services".to_string(),
            })?;

        if let Some(err) = entry.error {
            return Err(Error::Portal {
                url,
                code: err.code,
                message: err.full_message(),
            });
        }

        let service_item_id = entry.service_item_id.ok_or_else(|| Error::MalformedResponse {
            url: url.clone(),
            message: "publish returned no service item ID".to_string(),
        })?;

        if let Some(job_id) = entry.job_id {
            let status_url = self.user_content(&format!("items/{service_item_id}/status"));
            let params = [("jobId", job_id), ("jobType", "publish".to_string())];
            let label = format!("Publishing {service_name}");
            poll_job(&self.settings, "publish", &label, async || {
                let status: ItemStatus = self.get_json(&status_url, &params).await?;
                Ok(publish_job_state(status))
            })
            .await?;
        }

        Ok(PublishedService {
            item_id: service_item_id,
            service_url: entry.service_url.unwrap_or_default(),
        })
    }

    async fn update_item(&self, item_id: &str, metadata: &ItemMetadata) -> Result<()> {
        let url = self.user_content(&format!("items/{item_id}/update"));
        let params = [
            ("title", metadata.title.clone()),
            ("description", metadata.description.clone()),
            ("tags", metadata.tags.clone()),
        ];
        let response: SuccessResponse = self.post_json(&url, &params).await?;
        if response.success {
            Ok(())
        } else {
            Err(Error::MalformedResponse {
                url,
                message: "update did not report success".to_string(),
            })
        }
    }

    async fn search_items(&self, query: &str) -> Result<Vec<ItemSummary>> {
        let url = self.sharing("search");
        let params = [("q", query.to_string()), ("num", "100".to_string())];
        let response: SearchResponse = self.get_json(&url, &params).await?;
        Ok(response.results.into_iter().map(ItemSummary::from).collect())
    }

    async fn get_item(&self, item_id: &str) -> Result<ItemSummary> {
        let url = self.sharing(&format!("content/items/{item_id}"));
        let item: ItemJson = self.get_json(&url, &[]).await?;
        Ok(item.into())
    }

    async fn service_layers(&self, service_url: &str) -> Result<Vec<LayerInfo>> {
        let info: ServiceInfo = self.get_json(service_url, &[]).await?;
        Ok(info
            .layers
            .into_iter()
            .map(|l| LayerInfo {
                id: l.id,
                name: l.name,
            })
            .collect())
    }

    async fn query_all(&self, layer_url: &str) -> Result<QueryResult> {
        let layer_url = layer_url.trim_end_matches('/');
        let details: LayerDetails = self.get_json(layer_url, &[]).await?;
        let paginated = details
            .advanced_query_capabilities
            .is_some_and(|c| c.supports_pagination);
        let url = format!("{layer_url}/query");
        let page_size = self.settings.page_size.to_string();

        collect_pages(paginated, async |offset: usize| {
            let mut params = vec![
                ("where", "1=1".to_string()),
                ("outFields", "*".to_string()),
                ("returnGeometry", "false".to_string()),
            ];
            if paginated {
                params.push(("resultOffset", offset.to_string()));
                params.push(("resultRecordCount", page_size.clone()));
            }
            self.get_json::<QueryPage>(&url, &params).await
        })
        .await
    }

    async fn data_collections(&self, country: &str) -> Result<Vec<DataCollection>> {
        let base = Self::helper(self.geoenrichment_url.as_ref(), "geoenrichment")?;
        let url = format!(
            "{}/Geoenrichment/dataCollections/{country}",
            base.trim_end_matches('/')
        );
        let response: DataCollectionsResponse = self.get_json(&url, &[]).await?;
        Ok(response
            .data_collections
            .into_iter()
            .map(|c| DataCollection {
                id: c.id,
                variables: c.data.into_iter().map(|v| v.id).collect(),
            })
            .collect())
    }

    async fn enrich_layer(&self, request: &EnrichRequest) -> Result<EnrichedLayer> {
        let base = Self::helper(self.analysis_url.as_ref(), "analysis")?;
        let task = format!("{}/EnrichLayer", base.trim_end_matches('/'));
        let submit_url = format!("{task}/submitJob");
        let params = [
            ("inputLayer", json!({ "url": request.input_layer_url }).to_string()),
            ("analysisVariables", json!(request.analysis_variables).to_string()),
            ("country", request.country.clone()),
            ("bufferType", request.buffer_type.clone()),
            ("distance", request.distance.to_string()),
            ("units", request.units.clone()),
            (
                "outputName",
                json!({ "serviceProperties": { "name": request.output_name } }).to_string(),
            ),
        ];
        let submitted: JobSubmitted = self.post_json(&submit_url, &params).await?;
        info!("Enrichment job {} submitted", submitted.job_id);

        let job_url = format!("{task}/jobs/{}", submitted.job_id);
        poll_job(&self.settings, "enrich", "Enriching data... please wait", async || {
            let status: JobStatus = self.get_json(&job_url, &[]).await?;
            Ok(enrich_job_state(status))
        })
        .await?;

        let result_url = format!("{job_url}/results/enrichedLayer");
        let result: JobResult = self.get_json(&result_url, &[]).await?;
        let item_id = result.value.item_id.ok_or_else(|| Error::MalformedResponse {
            url: result_url,
            message: "enrichment result has no item ID".to_string(),
        })?;
        if result.value.url.is_empty() {
            warn!("Enrichment result for item {item_id} has no service URL");
        }

        Ok(EnrichedLayer {
            item_id,
            url: result.value.url,
        })
    }
}

/// Check a job until it finishes, sleeping `poll_interval` between checks.
async fn poll_job(
    settings: &ClientSettings,
    job: &str,
    label: &str,
    mut check: impl AsyncFnMut() -> Result<JobState>,
) -> Result<()> {
    let spinner = progress::create_job_spinner(label, settings.show_progress);

    for attempt in 1..=settings.max_polls {
        match check().await {
            Ok(JobState::Done) => {
                progress::finish_progress(spinner, "Done");
                return Ok(());
            }
            Ok(JobState::Failed(message)) => {
                progress::finish_progress(spinner, "Failed");
                return Err(Error::JobFailed {
                    job: job.to_string(),
                    message,
                });
            }
            Ok(JobState::Running) => {
                debug!("{job} job still running (check {attempt})");
                tokio::time::sleep(settings.poll_interval).await;
            }
            Err(e) => {
                progress::finish_progress(spinner, "Failed");
                return Err(e);
            }
        }
    }

    progress::finish_progress(spinner, "Timed out");
    Err(Error::JobTimedOut {
        job: job.to_string(),
        polls: settings.max_polls,
    })
}

fn publish_job_state(status: ItemStatus) -> JobState {
    match status.status.as_str() {
        "completed" => JobState::Done,
        "failed" => JobState::Failed(
            status
                .status_message
                .unwrap_or_else(|| "no message".to_string()),
        ),
        _ => JobState::Running,
    }
}

fn enrich_job_state(status: JobStatus) -> JobState {
    match status.job_status.as_str() {
        "esriJobSucceeded" => JobState::Done,
        "esriJobFailed" | "esriJobCancelled" | "esriJobTimedOut" => {
            let errors: Vec<String> = status
                .messages
                .into_iter()
                .filter(|m| m.kind == "esriJobMessageTypeError")
                .map(|m| m.description)
                .collect();
            if errors.is_empty() {
                JobState::Failed(status.job_status)
            } else {
                JobState::Failed(errors.join("; "))
            }
        }
        _ => JobState::Running,
    }
}

/// Addresses per geocode request: the override or the locator's suggestion,
/// never above its maximum.
fn batch_size(props: &LocatorProperties, override_size: Option<usize>) -> usize {
    let advertised = props
        .suggested_batch_size
        .or(props.max_batch_size)
        .unwrap_or(FALLBACK_BATCH_SIZE);
    let wanted = override_size.unwrap_or(advertised);
    let size = props.max_batch_size.map_or(wanted, |max| wanted.min(max));
    size.max(1)
}

/// Fetch query pages from `fetch(offset)` until the service reports no
/// more rows. A layer without paging support is read in one request.
async fn collect_pages(
    paginated: bool,
    mut fetch: impl AsyncFnMut(usize) -> Result<QueryPage>,
) -> Result<QueryResult> {
    let mut result = QueryResult::default();

    loop {
        let page = fetch(result.rows.len()).await?;

        if result.fields.is_empty() {
            result.fields = page.fields.into_iter().map(|f| f.name).collect();
        }
        let received = page.features.len();
        result
            .rows
            .extend(page.features.into_iter().map(|f| f.attributes));
        debug!("Fetched {received} row(s), {} so far", result.rows.len());

        if !page.exceeded_transfer_limit || received == 0 {
            break;
        }
        if !paginated {
            warn!(
                "Layer does not support paging; only the first {} row(s) were returned",
                result.rows.len()
            );
            break;
        }
    }

    Ok(result)
}

fn http_error(url: &str, source: reqwest::Error) -> Error {
    Error::Http {
        url: url.to_string(),
        source,
    }
}

/// Read a response body and parse it, reporting HTTP failures that carry
/// no error envelope by their status code.
async fn read_body<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await.map_err(|e| http_error(url, e))?;
    match wire::parse_body(url, &text) {
        Err(Error::MalformedResponse { .. }) if !status.is_success() => Err(Error::Portal {
            url: url.to_string(),
            code: i64::from(status.as_u16()),
            message: status.canonical_reason().unwrap_or("HTTP error").to_string(),
        }),
        other => other,
    }
}

fn encode_form<K: AsRef<str>, V: AsRef<str>>(params: &[(K, V)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(max_polls: u32) -> ClientSettings {
        ClientSettings {
            portal_url: "https://www.arcgis.com".to_string(),
            geocoder_url: None,
            batch_size: None,
            page_size: 2,
            poll_interval: Duration::ZERO,
            max_polls,
            connect_timeout: Duration::from_secs(1),
            timeout: Duration::from_secs(1),
            show_progress: false,
        }
    }

    fn page(ids: &[i64], exceeded: bool) -> QueryPage {
        let features: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "attributes": { "OBJECTID": id } }))
            .collect();
        serde_json::from_value(json!({
            "fields": [{ "name": "OBJECTID" }],
            "features": features,
            "exceededTransferLimit": exceeded,
        }))
        .unwrap()
    }

    #[test]
    fn test_batch_size_uses_suggestion_capped_by_max() {
        let props = LocatorProperties {
            max_batch_size: Some(1000),
            suggested_batch_size: Some(150),
        };
        assert_eq!(batch_size(&props, None), 150);
        assert_eq!(batch_size(&props, Some(5000)), 1000);
        assert_eq!(batch_size(&props, Some(20)), 20);
        assert_eq!(batch_size(&props, Some(0)), 1);
    }

    #[test]
    fn test_batch_size_without_locator_properties() {
        let props = LocatorProperties::default();
        assert_eq!(batch_size(&props, None), FALLBACK_BATCH_SIZE);
        assert_eq!(batch_size(&props, Some(7)), 7);

        let only_max = LocatorProperties {
            max_batch_size: Some(300),
            suggested_batch_size: None,
        };
        assert_eq!(batch_size(&only_max, None), 300);
    }

    #[test]
    fn test_publish_job_states() {
        let status = |s: &str, m: Option<&str>| ItemStatus {
            status: s.to_string(),
            status_message: m.map(str::to_string),
        };
        assert_eq!(publish_job_state(status("completed", None)), JobState::Done);
        assert_eq!(publish_job_state(status("processing", None)), JobState::Running);
        assert_eq!(
            publish_job_state(status("failed", Some("bad geometry"))),
            JobState::Failed("bad geometry".to_string())
        );
        assert_eq!(
            publish_job_state(status("failed", None)),
            JobState::Failed("no message".to_string())
        );
    }

    #[test]
    fn test_enrich_job_states() {
        let status = |body: Value| serde_json::from_value::<JobStatus>(body).unwrap();
        assert_eq!(
            enrich_job_state(status(json!({ "jobStatus": "esriJobSucceeded" }))),
            JobState::Done
        );
        assert_eq!(
            enrich_job_state(status(json!({ "jobStatus": "esriJobExecuting" }))),
            JobState::Running
        );
        assert_eq!(
            enrich_job_state(status(json!({
                "jobStatus": "esriJobFailed",
                "messages": [
                    { "type": "esriJobMessageTypeInformative", "description": "Started" },
                    { "type": "esriJobMessageTypeError", "description": "Not enough credits" }
                ]
            }))),
            JobState::Failed("Not enough credits".to_string())
        );
        assert_eq!(
            enrich_job_state(status(json!({ "jobStatus": "esriJobCancelled" }))),
            JobState::Failed("esriJobCancelled".to_string())
        );
    }

    #[tokio::test]
    async fn test_poll_job_times_out_after_max_polls() {
        let mut checks = 0;
        let result = poll_job(&settings(3), "publish", "Publishing", async || {
            checks += 1;
            Ok(JobState::Running)
        })
        .await;

        assert!(matches!(result, Err(Error::JobTimedOut { polls: 3, .. })));
        assert_eq!(checks, 3);
    }

    #[tokio::test]
    async fn test_poll_job_reports_failure_message() {
        let mut checks = 0;
        let result = poll_job(&settings(10), "enrich", "Enriching", async || {
            checks += 1;
            Ok(if checks < 2 {
                JobState::Running
            } else {
                JobState::Failed("Not enough credits".to_string())
            })
        })
        .await;

        match result {
            Err(Error::JobFailed { job, message }) => {
                assert_eq!(job, "enrich");
                assert_eq!(message, "Not enough credits");
            }
            other => panic!("expected JobFailed, got {other:?}"),
        }
        assert_eq!(checks, 2);
    }

    #[tokio::test]
    async fn test_poll_job_done() {
        let result = poll_job(&settings(1), "publish", "Publishing", async || Ok(JobState::Done)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_collect_pages_follows_transfer_limit() {
        let mut offsets = Vec::new();
        let result = collect_pages(true, async |offset: usize| {
            offsets.push(offset);
            Ok(match offset {
                0 => page(&[1, 2], true),
                2 => page(&[3, 4], true),
                _ => page(&[5], false),
            })
        })
        .await
        .unwrap();

        assert_eq!(offsets, [0, 2, 4]);
        assert_eq!(result.fields, ["OBJECTID"]);
        assert_eq!(result.rows.len(), 5);
        assert_eq!(result.rows[4]["OBJECTID"], json!(5));
    }

    #[tokio::test]
    async fn test_collect_pages_without_paging_support_reads_once() {
        let mut requests = 0;
        let result = collect_pages(false, async |_: usize| {
            requests += 1;
            Ok(page(&[1, 2], true))
        })
        .await
        .unwrap();

        assert_eq!(requests, 1);
        assert_eq!(result.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_collect_pages_stops_on_empty_page() {
        let mut requests = 0;
        let result = collect_pages(true, async |_: usize| {
            requests += 1;
            Ok(page(&[], true))
        })
        .await
        .unwrap();

        assert_eq!(requests, 1);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_encode_form_escapes_values() {
        let encoded = encode_form(&[("q", "title:\"Sites Mar 1\""), ("f", "json")]);
        assert_eq!(encoded, "q=title%3A%22Sites+Mar+1%22&f=json");
    }

    #[test]
    fn test_publish_file_type_names() {
        assert_eq!(PublishFileType::FeatureCollection.as_str(), "featureCollection");
        assert_eq!(PublishFileType::Shapefile.as_str(), "shapefile");
    }
}
