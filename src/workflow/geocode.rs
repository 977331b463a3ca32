//! Address table geocoding.

use crate::config::GeocodeStrategy;
use crate::constants::geocode::{ADDRESS_COLUMN, OUTPUT_PREFIX, X_COLUMN, Y_COLUMN};
use crate::error::{Error, Result};
use crate::output::progress;
use crate::platform::{AddressRecord, GeocodeMatch, GisPlatform};
use crate::table::{self, Table};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings for one geocoding run.
#[derive(Debug, Clone)]
pub struct GeocodeOptions<'a> {
    /// Country constraint sent with every address.
    pub source_country: &'a str,
    /// Batch or per-address requests.
    pub strategy: GeocodeStrategy,
    /// Existing directory receiving the geocoded table.
    pub output_dir: &'a Path,
    /// Show a progress bar for per-address requests.
    pub show_progress: bool,
}

/// How many addresses were placed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodeSummary {
    /// Rows in the input table.
    pub total: usize,
    /// Rows that received coordinates.
    pub matched: usize,
    /// Row indexes the geocoder could not place.
    pub unmatched_rows: Vec<usize>,
}

impl fmt::Display for GeocodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} addresses geocoded", self.matched, self.total)
    }
}

/// Result of geocoding a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeOutcome {
    /// Where the geocoded table was written.
    pub output_path: PathBuf,
    /// Match counts.
    pub summary: GeocodeSummary,
}

/// Geocode the `Address` column of `input` and write
/// `<output_dir>/Geocoded <file name>` with `X`/`Y` columns added.
pub async fn geocode_csv<P: GisPlatform>(
    platform: &P,
    input: &Path,
    options: &GeocodeOptions<'_>,
) -> Result<GeocodeOutcome> {
    let mut table = Table::read_csv(input)?;
    let address_idx = table.require_column(ADDRESS_COLUMN, input)?;
    table::require_output_dir(options.output_dir)?;

    let output_path = options
        .output_dir
        .join(format!("{OUTPUT_PREFIX}{}", table::file_name_of(input)?));

    let records: Vec<AddressRecord> = table
        .column_values(address_idx)
        .enumerate()
        .map(|(id, address)| AddressRecord {
            id,
            address: address.trim().to_string(),
        })
        .collect();

    let matches = if records.is_empty() {
        info!("{} has no rows, nothing to geocode", input.display());
        Vec::new()
    } else {
        info!("Geocoding {} address(es) from {}", records.len(), input.display());
        match options.strategy {
            GeocodeStrategy::Batch => {
                platform
                    .batch_geocode(&records, options.source_country)
                    .await?
            }
            GeocodeStrategy::Single => {
                geocode_each(platform, &records, options.source_country, options.show_progress)
                    .await?
            }
        }
    };

    let summary = merge_coordinates(&mut table, matches)?;
    for &row in &summary.unmatched_rows {
        warn!(
            "No match for row {} ({:?})",
            row + 2,
            records.get(row).map_or("", |r| r.address.as_str())
        );
    }

    table.write_csv(&output_path)?;
    println!("Saved geocoded table to {}", output_path.display());
    println!("{summary}");

    Ok(GeocodeOutcome {
        output_path,
        summary,
    })
}

/// Send addresses one at a time.
async fn geocode_each<P: GisPlatform>(
    platform: &P,
    records: &[AddressRecord],
    source_country: &str,
    show_progress: bool,
) -> Result<Vec<GeocodeMatch>> {
    let pb = progress::create_address_progress(records.len(), show_progress);
    let mut matches = Vec::with_capacity(records.len());
    for record in records {
        matches.push(platform.geocode_one(record, source_country).await?);
        progress::inc_progress(pb.as_ref(), 1);
    }
    progress::finish_progress(pb, "Geocoding complete");
    Ok(matches)
}

/// Write geocoder results into the table's `X` and `Y` columns.
///
/// Results are joined on their correlation ID, which is the row index, so
/// the order the geocoder returns them in does not matter. Every row must
/// have exactly one result.
pub fn merge_coordinates(table: &mut Table, matches: Vec<GeocodeMatch>) -> Result<GeocodeSummary> {
    let rows = table.len();
    if matches.len() != rows {
        return Err(Error::GeocodeMismatch {
            message: format!("{} result(s) for {rows} row(s)", matches.len()),
        });
    }

    let mut slots: Vec<Option<GeocodeMatch>> = vec![None; rows];
    for m in matches {
        let id = m.result_id;
        let slot = slots.get_mut(id).ok_or_else(|| Error::GeocodeMismatch {
            message: format!("result ID {id} does not name a row"),
        })?;
        if slot.is_some() {
            return Err(Error::GeocodeMismatch {
                message: format!("duplicate result ID {id}"),
            });
        }
        *slot = Some(m);
    }

    let mut summary = GeocodeSummary {
        total: rows,
        ..GeocodeSummary::default()
    };
    let mut xs = Vec::with_capacity(rows);
    let mut ys = Vec::with_capacity(rows);

    // Every slot is filled: counts match and IDs are unique and in range.
    for (row, slot) in slots.into_iter().enumerate() {
        match slot.as_ref().and_then(GeocodeMatch::coordinates) {
            Some((x, y)) => {
                summary.matched += 1;
                xs.push(x.to_string());
                ys.push(y.to_string());
            }
            None => {
                summary.unmatched_rows.push(row);
                xs.push(String::new());
                ys.push(String::new());
            }
        }
    }

    table.set_column(X_COLUMN, xs)?;
    table.set_column(Y_COLUMN, ys)?;
    Ok(summary)
}
