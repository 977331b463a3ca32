//! Exporting a hosted layer's attribute table.

use crate::error::{Error, Result};
use crate::platform::{GisPlatform, QueryResult};
use crate::table::{self, Table};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

/// Download every row of the first layer of item `item_id` and write
/// `<csv_dir>/<layer name>.csv`.
pub async fn download_feature_layer<P: GisPlatform>(
    platform: &P,
    item_id: &str,
    csv_dir: &Path,
) -> Result<PathBuf> {
    table::require_output_dir(csv_dir)?;

    let item = platform.get_item(item_id).await?;
    let service_url = item.url.as_deref().ok_or_else(|| Error::ItemHasNoUrl {
        id: item.id.clone(),
    })?;
    info!("Downloading '{}' ({})", item.title, item.item_type);

    let layers = platform.service_layers(service_url).await?;
    for layer in &layers {
        println!("Layer {}: {}", layer.id, layer.name);
    }
    let layer = layers.first().ok_or_else(|| Error::ServiceHasNoLayers {
        url: service_url.to_string(),
    })?;

    let result = platform.query_all(&layer.url_under(service_url)).await?;
    info!("Fetched {} row(s) from layer {}", result.rows.len(), layer.name);

    let output_path = table::csv_path_in(csv_dir, &layer.name);
    query_table(result).write_csv(&output_path)?;
    println!("Saved layer to {}", output_path.display());
    Ok(output_path)
}

/// Lay out query rows as a table in the service's field order.
///
/// When the service reports no fields, the first row's keys are used.
pub fn query_table(result: QueryResult) -> Table {
    let fields = if result.fields.is_empty() {
        result
            .rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    } else {
        result.fields
    };

    let rows = result
        .rows
        .iter()
        .map(|row| fields.iter().map(|f| cell_text(row.get(f))).collect())
        .collect();
    Table::new(fields, rows)
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
