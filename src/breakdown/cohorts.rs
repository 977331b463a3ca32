//! Column layout of the age/race/sex enrichment output.
//!
//! Variable codes follow the demographic catalog's convention: a cohort
//! and sex prefix, a five-year band start, and the `_CY` current-year
//! suffix, e.g. `WHTM65_CY` for white males aged 65-69.

/// Suffix on every current-year estimate.
pub const YEAR_SUFFIX: &str = "_CY";

/// Population sex within a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    /// Male population.
    Male,
    /// Female population.
    Female,
}

impl Sex {
    /// Singular label, e.g. `Male`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }

    /// Plural label, e.g. `Males`.
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Male => "Males",
            Self::Female => "Females",
        }
    }
}

/// An age band built from one or more five-year bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBand {
    /// Label, e.g. `65-74`.
    pub label: &'static str,
    /// Start ages of the five-year bands it covers.
    pub starts: &'static [&'static str],
}

/// Age bands reported for every cohort and sex.
pub const AGE_BANDS: [AgeBand; 3] = [
    AgeBand {
        label: "65-74",
        starts: &["65", "70"],
    },
    AgeBand {
        label: "75-84",
        starts: &["75", "80"],
    },
    AgeBand {
        label: "85+",
        starts: &["85"],
    },
];

/// Columns for one sex within a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SexColumns {
    /// Column holding the total for this sex.
    pub base: &'static str,
    /// Prefix of the five-year band columns.
    pub prefix: &'static str,
}

impl SexColumns {
    /// Band columns summed for `band`, e.g. `WHTM65_CY` and `WHTM70_CY`.
    pub fn band_columns(&self, band: &AgeBand) -> Vec<String> {
        band.starts
            .iter()
            .map(|start| format!("{}{start}{YEAR_SUFFIX}", self.prefix))
            .collect()
    }
}

/// A racial or ethnic cohort and the columns describing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cohort {
    /// Display name, e.g. `White`.
    pub name: &'static str,
    /// Column holding the cohort total.
    pub total: &'static str,
    /// Male columns.
    pub male: SexColumns,
    /// Female columns.
    pub female: SexColumns,
}

impl Cohort {
    /// Columns for `sex`.
    pub const fn sex(&self, sex: Sex) -> &SexColumns {
        match sex {
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        }
    }

    /// Every column this cohort reads.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![self.total.to_string()];
        for sex in [Sex::Male, Sex::Female] {
            let cols = self.sex(sex);
            columns.push(cols.base.to_string());
            for band in &AGE_BANDS {
                columns.extend(cols.band_columns(band));
            }
        }
        columns
    }
}

const fn cohort(
    name: &'static str,
    total: &'static str,
    male: (&'static str, &'static str),
    female: (&'static str, &'static str),
) -> Cohort {
    Cohort {
        name,
        total,
        male: SexColumns {
            base: male.0,
            prefix: male.1,
        },
        female: SexColumns {
            base: female.0,
            prefix: female.1,
        },
    }
}

/// Cohorts in report order.
pub const COHORTS: [Cohort; 7] = [
    cohort("White", "WAGEBASECY", ("WHTMBASECY", "WHTM"), ("WHTFBASECY", "WHTF")),
    cohort("Black", "BAGEBASECY", ("BLKMBASECY", "BLKM"), ("BLKFBASECY", "BLKF")),
    cohort("Native American", "IAGEBASECY", ("AIMBASE_CY", "AIM"), ("AIFBASE_CY", "AIF")),
    cohort("Asian", "AAGEBASECY", ("ASNMBASECY", "ASNM"), ("ASNFBASECY", "ASNF")),
    cohort("Pacific Islander", "PAGEBASECY", ("PIMBASE_CY", "PIM"), ("PIFBASE_CY", "PIF")),
    cohort("Other Race", "OAGEBASECY", ("OTHMBASECY", "OTHM"), ("OTHFBASECY", "OTHF")),
    cohort("Hispanic", "HAGEBASECY", ("HSPMBASECY", "HSPM"), ("HSPFBASECY", "HSPF")),
];

/// Every column the report reads, in cohort order.
pub fn all_columns() -> Vec<String> {
    COHORTS.iter().flat_map(Cohort::columns).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_band_columns_follow_naming_convention() {
        let white = &COHORTS[0];
        assert_eq!(
            white.male.band_columns(&AGE_BANDS[0]),
            ["WHTM65_CY", "WHTM70_CY"]
        );
        assert_eq!(white.female.band_columns(&AGE_BANDS[2]), ["WHTF85_CY"]);
    }

    #[test]
    fn test_black_total_reads_black_column() {
        let black = COHORTS.iter().find(|c| c.name == "Black");
        assert_eq!(black.map(|c| c.total), Some("BAGEBASECY"));
    }

    #[test]
    fn test_all_columns_are_distinct() {
        let columns = all_columns();
        // total + 2 * (base + 5 band columns) per cohort
        assert_eq!(columns.len(), COHORTS.len() * 13);
        let unique: HashSet<&String> = columns.iter().collect();
        assert_eq!(unique.len(), columns.len());
    }
}
