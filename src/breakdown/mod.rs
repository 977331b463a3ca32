//! Age, race, and sex population breakdown of an enrichment table.

pub mod cohorts;
pub mod report;

pub use cohorts::{AGE_BANDS, COHORTS, Cohort, Sex, all_columns};
pub use report::{BandTotal, BreakdownReport, CohortSummary, ReportFormat, SexSummary};

use crate::error::{Error, Result};
use crate::table::Table;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::info;

/// Sum the cohort columns of the enrichment table at `path`.
///
/// Empty cells count as zero. A missing column or a non-numeric cell is an
/// error naming the column.
pub fn compute_breakdown(path: &Path) -> Result<BreakdownReport> {
    let table = Table::read_csv(path)?;
    info!("Summing {} row(s) from {}", table.len(), path.display());

    let sum = |column: &str| sum_column(&table, column, path);

    let mut summaries = Vec::with_capacity(COHORTS.len());
    for cohort in &COHORTS {
        let sex_summary = |sex: Sex| -> Result<SexSummary> {
            let cols = cohort.sex(sex);
            let total = sum(cols.base)?;
            let mut bands = Vec::with_capacity(AGE_BANDS.len());
            for band in &AGE_BANDS {
                let mut band_total = 0.0;
                for column in cols.band_columns(band) {
                    band_total += sum(&column)?;
                }
                bands.push(BandTotal {
                    band: band.label.to_string(),
                    total: band_total,
                });
            }
            Ok(SexSummary { total, bands })
        };

        summaries.push(CohortSummary {
            cohort: cohort.name.to_string(),
            total: sum(cohort.total)?,
            male: sex_summary(Sex::Male)?,
            female: sex_summary(Sex::Female)?,
        });
    }

    Ok(BreakdownReport {
        source: path.to_path_buf(),
        rows: table.len(),
        cohorts: summaries,
    })
}

/// Sum a numeric column.
fn sum_column(table: &Table, column: &str, path: &Path) -> Result<f64> {
    let index = table.require_column(column, path)?;
    let mut total = 0.0;
    for (row, cell) in table.column_values(index).enumerate() {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        let invalid = || Error::InvalidNumber {
            column: column.to_string(),
            line: row + 2,
            value: cell.to_string(),
            path: path.to_path_buf(),
        };
        let value = cell.parse::<f64>().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        total += value;
    }
    Ok(total)
}

/// Print a report to `out` in `format`.
///
/// With `pause`, text output waits for a line on `input` after every cohort
/// but the last.
pub fn write_report<W: Write, R: BufRead>(
    report: &BreakdownReport,
    format: ReportFormat,
    pause: bool,
    out: &mut W,
    input: &mut R,
) -> Result<()> {
    match format {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .map_err(|source| Error::JsonSerialize { source })?;
            writeln!(out, "{json}")?;
        }
        ReportFormat::Text => {
            let last = report.cohorts.len().saturating_sub(1);
            for (i, cohort) in report.cohorts.iter().enumerate() {
                write!(out, "{cohort}")?;
                if i < last {
                    if pause {
                        write!(out, "Press Enter to continue")?;
                        out.flush()?;
                        input.read_line(&mut String::new())?;
                    }
                    writeln!(out)?;
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    /// Two rows with every column set to `value`.
    fn write_uniform(dir: &Path, value: &str) -> std::path::PathBuf {
        let columns = all_columns();
        let row = vec![value; columns.len()].join(",");
        let path = dir.join("enriched.csv");
        std::fs::write(&path, format!("{}\n{row}\n{row}\n", columns.join(","))).unwrap();
        path
    }

    #[test]
    fn test_uniform_table_totals() {
        let dir = TempDir::new().unwrap();
        let report = compute_breakdown(&write_uniform(dir.path(), "1")).unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.cohorts.len(), 7);
        let asian = report.cohort("Asian").unwrap();
        assert!((asian.total - 2.0).abs() < f64::EPSILON);
        // 65-74 spans two five-year columns over two rows
        assert!((asian.female.bands[0].total - 4.0).abs() < f64::EPSILON);
        assert!((asian.female.bands[2].total - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_column_is_named() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.csv");
        std::fs::write(&path, "WAGEBASECY\n5\n").unwrap();

        let err = compute_breakdown(&path).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "WHTMBASECY"));
    }

    #[test]
    fn test_non_numeric_cell_is_reported_with_line() {
        let dir = TempDir::new().unwrap();
        let path = write_uniform(dir.path(), "1");
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replacen("\n1,", "\nabc,", 1)).unwrap();

        let err = compute_breakdown(&path).unwrap_err();
        match err {
            Error::InvalidNumber { column, line, value, .. } => {
                assert_eq!(column, "WAGEBASECY");
                assert_eq!(line, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nan_and_infinite_cells_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_uniform(dir.path(), "1");
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replacen("\n1,", "\nNaN,", 1)).unwrap();

        match compute_breakdown(&path).unwrap_err() {
            Error::InvalidNumber { column, line, value, .. } => {
                assert_eq!(column, "WAGEBASECY");
                assert_eq!(line, 2);
                assert_eq!(value, "NaN");
            }
            other => panic!("unexpected error: {other}"),
        }

        for cell in ["inf", "-infinity"] {
            let path = write_uniform(dir.path(), cell);
            match compute_breakdown(&path).unwrap_err() {
                Error::InvalidNumber { value, .. } => assert_eq!(value, cell),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_empty_cells_count_as_zero() {
        let dir = TempDir::new().unwrap();
        let report = compute_breakdown(&write_uniform(dir.path(), "")).unwrap();
        assert!(report.cohorts.iter().all(|c| c.total == 0.0));
    }

    #[test]
    fn test_write_report_pauses_between_cohorts() {
        let dir = TempDir::new().unwrap();
        let report = compute_breakdown(&write_uniform(dir.path(), "1")).unwrap();

        let mut out = Vec::new();
        let mut input = Cursor::new("\n".repeat(10));
        write_report(&report, ReportFormat::Text, true, &mut out, &mut input).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Press Enter to continue").count(), 6);
        assert!(text.starts_with("Total White Pop: 2\n"));
        assert!(text.ends_with("Total Hispanic Females 85+: 2\n"));
    }

    #[test]
    fn test_write_report_json() {
        let dir = TempDir::new().unwrap();
        let report = compute_breakdown(&write_uniform(dir.path(), "3")).unwrap();

        let mut out = Vec::new();
        write_report(&report, ReportFormat::Json, false, &mut out, &mut Cursor::new("")).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["rows"], 2);
        assert_eq!(parsed["cohorts"][1]["cohort"], "Black");
        assert_eq!(parsed["cohorts"][1]["total"], 6.0);
    }
}
