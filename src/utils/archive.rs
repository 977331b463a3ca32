//! Shapefile bundle inspection and zipping.
//!
//! A shapefile is a set of sibling files sharing one stem. The portal only
//! accepts them as a single zip archive.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Components every shapefile must have.
const REQUIRED_EXTENSIONS: [&str; 3] = ["shp", "shx", "dbf"];

/// Components carried along when present.
const OPTIONAL_EXTENSIONS: [&str; 6] = ["prj", "cpg", "sbn", "sbx", "qix", "shp.xml"];

/// Count the records in a shapefile, reading every shape and attribute row.
pub fn count_shapefile_records(shp: &Path) -> Result<usize> {
    let shp_err = |source| Error::Shapefile {
        path: shp.to_path_buf(),
        source,
    };

    let mut reader = shapefile::Reader::from_path(shp).map_err(shp_err)?;
    let mut count = 0;
    for item in reader.iter_shapes_and_records() {
        item.map_err(shp_err)?;
        count += 1;
    }
    Ok(count)
}

/// Locate the component files of the shapefile at `shp`.
///
/// Returns required components first, then any optional ones found.
pub fn shapefile_components(shp: &Path) -> Result<Vec<PathBuf>> {
    let dir = shp.parent().unwrap_or_else(|| Path::new(""));
    let stem = shp
        .file_stem()
        .ok_or_else(|| Error::InvalidFileName {
            path: shp.to_path_buf(),
        })?
        .to_string_lossy()
        .into_owned();

    let mut components = Vec::new();

    for ext in REQUIRED_EXTENSIONS {
        let path = find_component(dir, &stem, ext).ok_or_else(|| {
            Error::ShapefileComponentMissing {
                path: dir.join(format!("{stem}.{ext}")),
            }
        })?;
        components.push(path);
    }

    for ext in OPTIONAL_EXTENSIONS {
        if let Some(path) = find_component(dir, &stem, ext) {
            components.push(path);
        }
    }

    Ok(components)
}

/// Find `<stem>.<ext>`, accepting an upper-case extension as well.
fn find_component(dir: &Path, stem: &str, ext: &str) -> Option<PathBuf> {
    [ext.to_string(), ext.to_uppercase()]
        .into_iter()
        .map(|e| dir.join(format!("{stem}.{e}")))
        .find(|p| p.is_file())
}

/// Zip `files` into `dest`, storing each under its bare file name.
pub fn zip_files(files: &[PathBuf], dest: &Path) -> Result<()> {
    let zip_err = |source| Error::Archive {
        path: dest.to_path_buf(),
        source,
    };

    let out = File::create(dest)?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        let name = crate::table::file_name_of(file)?;
        zip.start_file(name, options).map_err(zip_err)?;
        let mut input = File::open(file)?;
        std::io::copy(&mut input, &mut zip)?;
    }

    zip.finish().map_err(zip_err)?;
    Ok(())
}

/// Zip the shapefile at `shp` into `<dest_dir>/<name>.zip`.
///
/// `dest_dir` must already exist.
pub fn zip_shapefile(shp: &Path, dest_dir: &Path, name: &str) -> Result<PathBuf> {
    crate::table::require_output_dir(dest_dir)?;
    let components = shapefile_components(shp)?;
    let dest = dest_dir.join(format!("{name}.zip"));
    zip_files(&components, &dest)?;
    Ok(dest)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn archive_names(path: &Path) -> Vec<String> {
        let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn test_components_include_optional_files() {
        let dir = TempDir::new().unwrap();
        let shp = touch(dir.path(), "sites.shp", b"shp");
        touch(dir.path(), "sites.shx", b"shx");
        touch(dir.path(), "sites.dbf", b"dbf");
        touch(dir.path(), "sites.prj", b"prj");
        touch(dir.path(), "other.prj", b"prj");

        let components = shapefile_components(&shp).unwrap();
        assert_eq!(components.len(), 4);
        assert!(components[3].ends_with("sites.prj"));
    }

    #[test]
    fn test_missing_dbf_is_reported() {
        let dir = TempDir::new().unwrap();
        let shp = touch(dir.path(), "sites.shp", b"shp");
        touch(dir.path(), "sites.shx", b"shx");

        let err = shapefile_components(&shp).unwrap_err();
        assert!(err.to_string().contains("sites.dbf"));
    }

    #[test]
    fn test_zip_shapefile_stores_bare_names() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let shp = touch(src.path(), "sites.shp", b"shp");
        touch(src.path(), "sites.shx", b"shx");
        touch(src.path(), "sites.cpg", b"UTF-8");
        touch(src.path(), "sites.dbf", b"dbf");

        let zip_path = zip_shapefile(&shp, out.path(), "sites").unwrap();
        assert_eq!(zip_path, out.path().join("sites.zip"));
        assert_eq!(
            archive_names(&zip_path),
            ["sites.cpg", "sites.dbf", "sites.shp", "sites.shx"]
        );
    }

    #[test]
    fn test_zip_shapefile_requires_existing_dir() {
        let src = TempDir::new().unwrap();
        let shp = touch(src.path(), "sites.shp", b"shp");

        let result = zip_shapefile(&shp, &src.path().join("missing"), "sites");
        assert!(matches!(result, Err(Error::OutputDirMissing { .. })));
    }
}
