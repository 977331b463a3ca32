//! Enrichment variable list reading.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read enrichment variable codes from file.
///
/// # File Format
/// - One variable code per line (e.g., `WHTM65_CY`)
/// - Blank lines and lines starting with `#` are ignored
/// - Codes are used as written; the data collection prefix is added later
///
/// # Errors
/// - Returns error if file cannot be read
/// - Returns error if the file lists no codes
pub fn read_variable_list(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| Error::VariablesRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let reader = BufReader::new(file);
    let mut variables = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| Error::VariablesRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            variables.push(trimmed.to_string());
        }
    }

    if variables.is_empty() {
        return Err(Error::EmptyVariableList {
            path: path.to_path_buf(),
        });
    }

    Ok(variables)
}

/// Qualify each code with its data collection, e.g. `agebyracebysex.WHTM65_CY`.
pub fn prefix_variables(collection: &str, variables: &[String]) -> Vec<String> {
    let namespace = collection.to_lowercase();
    variables
        .iter()
        .map(|code| format!("{namespace}.{code}"))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_variable_list_skips_blanks_and_comments() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# White males").unwrap();
        writeln!(file, "WHTM65_CY").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  WHTM70_CY  ").unwrap();

        let variables = read_variable_list(file.path()).unwrap();
        assert_eq!(variables, ["WHTM65_CY", "WHTM70_CY"]);
    }

    #[test]
    fn test_read_variable_list_file_not_found() {
        let result = read_variable_list(Path::new("nonexistent.txt"));
        assert!(matches!(result, Err(Error::VariablesRead { .. })));
    }

    #[test]
    fn test_empty_list_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here").unwrap();

        let result = read_variable_list(file.path());
        assert!(matches!(result, Err(Error::EmptyVariableList { .. })));
    }

    #[test]
    fn test_prefix_variables_lowercases_collection() {
        let prefixed = prefix_variables("AgeByRaceBySex", &["WHTM65_CY".to_string()]);
        assert_eq!(prefixed, ["agebyracebysex.WHTM65_CY"]);
    }
}
