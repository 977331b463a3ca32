//! Breakdown report over enrichment output.

use gis_cli::breakdown::{ReportFormat, all_columns, compute_breakdown, write_report};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One-row enrichment table with every cohort column set to zero except
/// those in `values`.
fn enrichment_table(dir: &Path, values: &[(&str, &str)]) -> PathBuf {
    let columns = all_columns();
    let row: Vec<&str> = columns
        .iter()
        .map(|c| {
            values
                .iter()
                .find(|(name, _)| *name == c.as_str())
                .map_or("0", |(_, v)| *v)
        })
        .collect();

    let path = dir.join("Age and Race by Sex 3 Mile Buffer Mar 1.csv");
    std::fs::write(
        &path,
        format!("OBJECTID,{}\n1,{}\n", columns.join(","), row.join(",")),
    )
    .unwrap();
    path
}

#[test]
fn test_white_males_65_74_adds_two_bands() {
    let dir = TempDir::new().unwrap();
    let path = enrichment_table(dir.path(), &[("WHTM65_CY", "10"), ("WHTM70_CY", "5")]);

    let report = compute_breakdown(&path).unwrap();
    let white = report.cohort("White").unwrap();
    assert!((white.male.bands[0].total - 15.0).abs() < f64::EPSILON);

    let mut out = Vec::new();
    write_report(&report, ReportFormat::Text, false, &mut out, &mut Cursor::new("")).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Total White Males 65-74: 15\n"));
    assert!(text.contains("Total White Males 75-84: 0\n"));
}

#[test]
fn test_black_total_is_independent_of_white_total() {
    let dir = TempDir::new().unwrap();
    let path = enrichment_table(dir.path(), &[("WAGEBASECY", "900"), ("BAGEBASECY", "120")]);

    let report = compute_breakdown(&path).unwrap();
    let text = report.to_string();
    assert!(text.contains("Total White Pop: 900\n"));
    assert!(text.contains("Total Black Pop: 120\n"));
}

#[test]
fn test_fractional_estimates_are_kept() {
    let dir = TempDir::new().unwrap();
    let path = enrichment_table(dir.path(), &[("HSPF85_CY", "2.5")]);

    let report = compute_breakdown(&path).unwrap();
    assert!(report.to_string().contains("Total Hispanic Females 85+: 2.5\n"));
}

#[test]
fn test_variables_file_lists_every_breakdown_column() {
    let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join(gis_cli::constants::enrich::VARIABLES_FILE);
    let variables = gis_cli::utils::variable_list::read_variable_list(&shipped).unwrap();

    for column in all_columns() {
        assert!(
            variables.contains(&column),
            "{column} missing from {}",
            shipped.display()
        );
    }
}
