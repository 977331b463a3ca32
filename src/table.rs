//! In-memory CSV tables.
//!
//! Address lists, enrichment output, and downloaded layers are all plain
//! delimited files with a header row. They are kept as strings so columns
//! the tool does not understand pass through unchanged.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table from headers and rows.
    ///
    /// Short rows are padded with empty cells; long rows are truncated.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Read a CSV file with a header row.
    ///
    /// A UTF-8 BOM is tolerated and ragged rows are padded.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let read_err = |source| Error::TableRead {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(read_err)?;

        let headers = reader
            .headers()
            .map_err(read_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(read_err)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self::new(headers, rows))
    }

    /// Write the table as CSV.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let write_err = |source| Error::TableWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
        writer.write_record(&self.headers).map_err(write_err)?;
        for row in &self.rows {
            writer.write_record(row).map_err(write_err)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Column names in order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of a column, or an error naming the column and its source file.
    pub fn require_column(&self, name: &str, source: &Path) -> Result<usize> {
        self.column_index(name).ok_or_else(|| Error::MissingColumn {
            column: name.to_string(),
            path: source.to_path_buf(),
        })
    }

    /// All values of one column.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[index].as_str())
    }

    /// Replace a column's values, appending the column if it is new.
    ///
    /// `values` must have one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::Internal {
                message: format!(
                    "column '{name}' has {} values for {} rows",
                    values.len(),
                    self.rows.len()
                ),
            });
        }

        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }
}

/// Require that an output directory already exists.
pub fn require_output_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(Error::OutputDirMissing {
            path: dir.to_path_buf(),
        })
    }
}

/// Final path component as text.
pub fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidFileName {
            path: path.to_path_buf(),
        })
}

/// Replace characters that are unsafe in file names.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "layer".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Path of a CSV named after `stem` inside `dir`.
pub fn csv_path_in(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}.csv", sanitize_file_name(stem)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_read_csv_with_bom_and_quotes() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "\u{FEFF}Name,Address\nClinic A,\"200 N Spring St, Los Angeles, CA\"\nClinic B,1 World Way\n"
        )
        .unwrap();

        let table = Table::read_csv(file.path()).unwrap();
        assert_eq!(table.headers(), ["Name", "Address"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][1], "200 N Spring St, Los Angeles, CA");
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "A,B,C\n1,2\n").unwrap();

        let table = Table::read_csv(file.path()).unwrap();
        assert_eq!(table.rows()[0], ["1", "2", ""]);
    }

    #[test]
    fn test_require_column_names_missing_column() {
        let table = Table::new(vec!["Name".to_string()], vec![]);
        let err = table
            .require_column("Address", Path::new("sites.csv"))
            .unwrap_err();
        assert!(err.to_string().contains("Address"));
    }

    #[test]
    fn test_set_column_appends_then_replaces() {
        let mut table = Table::new(
            vec!["Address".to_string()],
            vec![vec!["a".to_string()], vec!["b".to_string()]],
        );
        table
            .set_column("X", vec!["1".to_string(), "2".to_string()])
            .unwrap();
        assert_eq!(table.headers(), ["Address", "X"]);

        table
            .set_column("X", vec!["3".to_string(), "4".to_string()])
            .unwrap();
        assert_eq!(table.headers().len(), 2);
        assert_eq!(table.rows()[1][1], "4");

        assert!(table.set_column("Y", vec![String::new()]).is_err());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let table = Table::new(
            vec!["A".to_string(), "B".to_string()],
            vec![vec!["x,y".to_string(), "2".to_string()]],
        );
        table.write_csv(&path).unwrap();

        let back = Table::read_csv(&path).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_require_output_dir() {
        let dir = TempDir::new().unwrap();
        assert!(require_output_dir(dir.path()).is_ok());
        assert!(matches!(
            require_output_dir(&dir.path().join("missing")),
            Err(Error::OutputDirMissing { .. })
        ));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Sites Mar 1"), "Sites Mar 1");
        assert_eq!(sanitize_file_name("a/b:c"), "a_b_c");
        assert_eq!(sanitize_file_name(".."), "layer");
        assert_eq!(
            csv_path_in(Path::new("output/csv"), "x/y"),
            Path::new("output/csv/x_y.csv")
        );
    }
}
