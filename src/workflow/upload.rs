//! Publishing local files as hosted feature layers.

use crate::constants::geocode::{X_COLUMN, Y_COLUMN};
use crate::constants::item_types;
use crate::error::{Error, Result};
use crate::platform::{
    CoordinateFields, GisPlatform, ItemMetadata, NewItem, PublishFileType, PublishedService,
};
use crate::table::Table;
use crate::utils::archive;
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, info, warn};

/// File formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Table with `X`/`Y` coordinate columns.
    Csv,
    /// Shapefile, zipped with its sibling files before upload.
    Shapefile,
    /// Already-zipped shapefile.
    Zip,
}

impl UploadKind {
    /// Classify a path by extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "shp" => Some(Self::Shapefile),
            "zip" => Some(Self::Zip),
            _ => None,
        }
    }
}

/// Report a file that cannot be uploaded.
pub fn warn_unsupported(path: &Path) {
    warn!(
        "Unsupported upload type: {} (expected .csv, .shp or .zip)",
        path.display()
    );
}

/// Metadata and locations used when publishing.
#[derive(Debug, Clone)]
pub struct UploadOptions<'a> {
    /// Item description.
    pub description: &'a str,
    /// Comma-separated item tags.
    pub tags: &'a str,
    /// Existing directory receiving zipped shapefiles.
    pub shapefile_dir: &'a Path,
}

/// Hosted service name for a title: anything other than ASCII letters,
/// digits, and `_` becomes `_`.
pub fn service_name(title: &str) -> String {
    let name: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() { "layer".to_string() } else { name }
}

/// Item JSON for a feature collection built from generated layers.
pub fn feature_collection_envelope(layers: Vec<Value>) -> Value {
    json!({ "featureCollection": { "layers": layers } })
}

/// Publish `path` as a hosted feature layer titled after its file stem.
///
/// Unsupported extensions are reported and skipped without contacting the
/// portal, returning `Ok(None)`.
pub async fn upload_feature_layer<P: GisPlatform>(
    platform: &P,
    path: &Path,
    options: &UploadOptions<'_>,
) -> Result<Option<PublishedService>> {
    let Some(kind) = UploadKind::from_path(path) else {
        warn_unsupported(path);
        return Ok(None);
    };

    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidFileName {
            path: path.to_path_buf(),
        })?;
    let metadata = ItemMetadata {
        title: title.clone(),
        description: options.description.to_string(),
        tags: options.tags.to_string(),
    };
    let name = service_name(&title);
    debug!("Uploading {} as {kind:?}, service name {name}", path.display());

    let published = match kind {
        UploadKind::Csv => publish_csv(platform, path, metadata, &name).await?,
        UploadKind::Shapefile => {
            let records = archive::count_shapefile_records(path)?;
            info!("Read {records} record(s) from {}", path.display());
            let zipped = archive::zip_shapefile(path, options.shapefile_dir, &title)?;
            info!("Zipped shapefile to {}", zipped.display());
            publish_archive(platform, &zipped, &metadata, &name).await?
        }
        UploadKind::Zip => publish_archive(platform, path, &metadata, &name).await?,
    };

    println!("Published '{title}' as item {}", published.item_id);
    if !published.service_url.is_empty() {
        println!("Service URL: {}", published.service_url);
    }
    Ok(Some(published))
}

async fn publish_csv<P: GisPlatform>(
    platform: &P,
    path: &Path,
    metadata: ItemMetadata,
    name: &str,
) -> Result<PublishedService> {
    let table = Table::read_csv(path)?;
    table.require_column(X_COLUMN, path)?;
    table.require_column(Y_COLUMN, path)?;
    info!("Loaded {} row(s) from {}", table.len(), path.display());

    let csv_text = std::fs::read_to_string(path)?;
    let layers = platform
        .generate_feature_collection(
            &csv_text,
            &metadata.title,
            CoordinateFields {
                latitude: Y_COLUMN,
                longitude: X_COLUMN,
            },
        )
        .await?;

    let envelope = feature_collection_envelope(layers);
    let item = NewItem {
        item_type: item_types::FEATURE_COLLECTION.to_string(),
        metadata,
        text: Some(envelope.to_string()),
    };
    let item_id = platform.add_item(&item, None).await?;
    platform
        .publish_item(&item_id, PublishFileType::FeatureCollection, name)
        .await
}

async fn publish_archive<P: GisPlatform>(
    platform: &P,
    archive_path: &Path,
    metadata: &ItemMetadata,
    name: &str,
) -> Result<PublishedService> {
    let item = NewItem {
        item_type: item_types::SHAPEFILE.to_string(),
        metadata: metadata.clone(),
        text: None,
    };
    let item_id = platform.add_item(&item, Some(archive_path)).await?;
    let published = platform
        .publish_item(&item_id, PublishFileType::Shapefile, name)
        .await?;
    platform.update_item(&published.item_id, metadata).await?;
    Ok(published)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_kind_from_extension() {
        assert_eq!(UploadKind::from_path(Path::new("a/sites.csv")), Some(UploadKind::Csv));
        assert_eq!(UploadKind::from_path(Path::new("SITES.SHP")), Some(UploadKind::Shapefile));
        assert_eq!(UploadKind::from_path(Path::new("bundle.Zip")), Some(UploadKind::Zip));
        assert_eq!(UploadKind::from_path(Path::new("sites.xlsx")), None);
        assert_eq!(UploadKind::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_service_name_replaces_unsafe_characters() {
        assert_eq!(service_name("Vaccine Sites 3-1"), "Vaccine_Sites_3_1");
        assert_eq!(service_name("sites_v2"), "sites_v2");
        assert_eq!(service_name(""), "layer");
    }

    #[test]
    fn test_feature_collection_envelope_shape() {
        let envelope = feature_collection_envelope(vec![json!({"layerDefinition": {}})]);
        assert!(envelope["featureCollection"]["layers"].is_array());
        assert_eq!(envelope["featureCollection"]["layers"].as_array().map(Vec::len), Some(1));
    }
}
