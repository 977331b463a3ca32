//! Demographic enrichment of a published layer.

use crate::constants::item_types::FEATURE_SERVICE;
use crate::error::{Error, Result};
use crate::platform::{EnrichRequest, EnrichedLayer, GisPlatform, ItemSummary};
use crate::utils::variable_list::{prefix_variables, read_variable_list};
use chrono::DateTime;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Unknown variables listed individually before the rest are summarised.
const UNKNOWN_VARIABLES_SHOWN: usize = 10;

/// Settings for a buffered enrichment.
#[derive(Debug, Clone)]
pub struct EnrichOptions<'a> {
    /// Country whose demographic catalog is used.
    pub country: &'a str,
    /// Data collection the variables belong to.
    pub data_collection: &'a str,
    /// File listing the variable codes.
    pub variables_file: &'a Path,
    /// Buffer geometry type.
    pub buffer_type: &'a str,
    /// Buffer radius.
    pub distance: f64,
    /// Buffer radius units.
    pub units: &'a str,
    /// Prefix for the enriched layer's name.
    pub output_prefix: &'a str,
}

/// Portal search query for a feature service with an exact title.
pub fn title_query(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('"', "\\\"");
    format!("title:\"{escaped}\" AND type:\"{FEATURE_SERVICE}\"")
}

/// Enrich the feature service titled `title` with the listed variables
/// inside a buffer around each feature.
pub async fn enrich_layer_by_title<P: GisPlatform>(
    platform: &P,
    title: &str,
    options: &EnrichOptions<'_>,
) -> Result<EnrichedLayer> {
    let variables = read_variable_list(options.variables_file)?;
    info!(
        "Loaded {} variable(s) from {}",
        variables.len(),
        options.variables_file.display()
    );

    let results = platform.search_items(&title_query(title)).await?;
    let item = pick_item(title, &results)?;
    let service_url = item.url.as_deref().ok_or_else(|| Error::ItemHasNoUrl {
        id: item.id.clone(),
    })?;

    let layers = platform.service_layers(service_url).await?;
    let layer = layers.first().ok_or_else(|| Error::ServiceHasNoLayers {
        url: service_url.to_string(),
    })?;
    let layer_url = layer.url_under(service_url);
    debug!("Enriching layer {} at {layer_url}", layer.name);

    let catalog = platform.data_collections(options.country).await?;
    info!(
        "{} data collection(s) available for {}",
        catalog.len(),
        options.country
    );
    match catalog
        .iter()
        .find(|c| c.id.eq_ignore_ascii_case(options.data_collection))
    {
        Some(collection) => {
            let known: HashSet<&str> = collection.variables.iter().map(String::as_str).collect();
            let unknown: Vec<&str> = variables
                .iter()
                .map(String::as_str)
                .filter(|v| !known.contains(v))
                .collect();
            if !unknown.is_empty() {
                let shown = unknown.len().min(UNKNOWN_VARIABLES_SHOWN);
                warn!(
                    "{} variable(s) not in {}: {}{}",
                    unknown.len(),
                    collection.id,
                    unknown[..shown].join(", "),
                    if unknown.len() > shown { ", ..." } else { "" }
                );
            }
        }
        None => warn!(
            "Data collection {} not found for {}",
            options.data_collection, options.country
        ),
    }

    let request = EnrichRequest {
        input_layer_url: layer_url,
        country: options.country.to_string(),
        analysis_variables: prefix_variables(options.data_collection, &variables),
        buffer_type: options.buffer_type.to_string(),
        distance: options.distance,
        units: options.units.to_string(),
        output_name: format!("{}{title}", options.output_prefix),
    };

    let enriched = platform.enrich_layer(&request).await?;
    println!("Enriched layer ID: {}", enriched.item_id);
    if !enriched.url.is_empty() {
        println!("Service URL: {}", enriched.url);
    }
    Ok(enriched)
}

/// First search result, warning when the title is ambiguous.
fn pick_item<'a>(title: &str, results: &'a [ItemSummary]) -> Result<&'a ItemSummary> {
    let first = results.first().ok_or_else(|| Error::LayerNotFound {
        title: title.to_string(),
    })?;

    if results.len() > 1 {
        warn!(
            "{} feature layers are titled '{title}'; using the first",
            results.len()
        );
        for item in results {
            warn!(
                "  {} owned by {} created {}",
                item.id,
                item.owner,
                created_date(item.created)
            );
        }
    }
    Ok(first)
}

fn created_date(millis: Option<i64>) -> String {
    millis
        .and_then(DateTime::from_timestamp_millis)
        .map_or_else(|| "unknown".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str) -> ItemSummary {
        ItemSummary {
            id: id.to_string(),
            title: "Sites".to_string(),
            item_type: FEATURE_SERVICE.to_string(),
            url: None,
            owner: "analyst".to_string(),
            created: Some(1_614_556_800_000),
        }
    }

    #[test]
    fn test_title_query_quotes_and_escapes() {
        assert_eq!(
            title_query("Vaccine Sites"),
            "title:\"Vaccine Sites\" AND type:\"Feature Service\""
        );
        assert_eq!(
            title_query("a \"b\""),
            "title:\"a \\\"b\\\"\" AND type:\"Feature Service\""
        );
    }

    #[test]
    fn test_pick_item_uses_first_result() {
        let results = vec![item("one"), item("two")];
        assert_eq!(pick_item("Sites", &results).unwrap().id, "one");
        assert!(matches!(
            pick_item("Sites", &[]).unwrap_err(),
            Error::LayerNotFound { .. }
        ));
    }

    #[test]
    fn test_created_date_formats_epoch_millis() {
        assert_eq!(created_date(Some(1_614_556_800_000)), "2021-03-01");
        assert_eq!(created_date(None), "unknown");
    }
}
