//! Breakdown report types and rendering.

use super::cohorts::Sex;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// How a breakdown report is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Labelled lines, one cohort block at a time.
    #[default]
    Text,
    /// A single JSON document.
    Json,
}

/// Population summed over an age band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandTotal {
    /// Band label, e.g. `65-74`.
    pub band: String,
    /// Summed population.
    pub total: f64,
}

/// Totals for one sex within a cohort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SexSummary {
    /// All ages.
    pub total: f64,
    /// Older age bands.
    pub bands: Vec<BandTotal>,
}

/// Totals for one cohort.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSummary {
    /// Cohort name, e.g. `White`.
    pub cohort: String,
    /// Cohort population.
    pub total: f64,
    /// Male totals.
    pub male: SexSummary,
    /// Female totals.
    pub female: SexSummary,
}

/// Age/race/sex totals over every row of an enrichment table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownReport {
    /// Table the totals were read from.
    pub source: PathBuf,
    /// Rows summed.
    pub rows: usize,
    /// One summary per cohort, in report order.
    pub cohorts: Vec<CohortSummary>,
}

impl BreakdownReport {
    /// Summary for the cohort named `name`.
    pub fn cohort(&self, name: &str) -> Option<&CohortSummary> {
        self.cohorts.iter().find(|c| c.cohort == name)
    }
}

/// Format a population count, dropping the fraction for whole numbers.
pub fn format_count(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for CohortSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.cohort;
        writeln!(f, "Total {name} Pop: {}", format_count(self.total))?;
        for (sex, summary) in [(Sex::Male, &self.male), (Sex::Female, &self.female)] {
            writeln!(
                f,
                "Total {name} {} Pop: {}",
                sex.label(),
                format_count(summary.total)
            )?;
            for band in &summary.bands {
                writeln!(
                    f,
                    "Total {name} {} {}: {}",
                    sex.plural(),
                    band.band,
                    format_count(band.total)
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for BreakdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cohort) in self.cohorts.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{cohort}")?;
        }
        Ok(())
    }
}
