use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::parser::{parse_table, Table};
use crate::schema::layer_name;

/// A zip archive of YKR CSV files
pub struct CsvArchive {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl CsvArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open zip file: {:?}", path))?;
        let reader = BufReader::new(file);
        let archive = ZipArchive::new(reader)
            .with_context(|| format!("Failed to read zip archive: {:?}", path))?;

        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Archive base name, used for the GeoPackage file and the combined layer
    pub fn stem(&self) -> String {
        layer_name(&self.path.to_string_lossy())
    }

    /// Names of the `.csv` members, in archive order
    pub fn csv_members(&mut self) -> Result<Vec<String>> {
        let mut members = Vec::new();

        for i in 0..self.archive.len() {
            let file = self
                .archive
                .by_index(i)
                .context("Failed to read file from archive")?;

            if file.is_dir() || !file.name().ends_with(".csv") {
                continue;
            }
            members.push(file.name().to_string());
        }

        Ok(members)
    }

    /// Read and parse one CSV member
    pub fn read_table(&mut self, member: &str, delimiter: u8) -> Result<Table> {
        let file = self
            .archive
            .by_name(member)
            .with_context(|| format!("Failed to read {} from {:?}", member, self.path))?;

        parse_table(file, member, delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(dir: &Path, name: &str, members: &[(&str, &str)]) -> PathBuf {
        let path = dir.join(name);
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        for (member, contents) in members {
            zip.start_file(*member, SimpleFileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    #[test]
    fn test_csv_members_in_archive_order() {
        let dir = TempDir::new().unwrap();
        let path = write_zip(
            dir.path(),
            "YKR_vaesto.zip",
            &[
                ("b_2020.csv", "xyind\n1\n"),
                ("readme.txt", "hello"),
                ("a_2019.csv", "xyind\n2\n"),
                ("metadata.CSV.bak", ""),
            ],
        );

        let mut archive = CsvArchive::open(&path).unwrap();
        assert_eq!(archive.stem(), "YKR_vaesto");
        assert_eq!(archive.csv_members().unwrap(), vec!["b_2020.csv", "a_2019.csv"]);

        let table = archive.read_table("a_2019.csv", b',').unwrap();
        assert_eq!(table.name, "a_2019");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_open_missing_archive_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(CsvArchive::open(&dir.path().join("missing.zip")).is_err());
    }

    #[test]
    fn test_open_non_zip_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("not.zip");
        std::fs::write(&path, "plain text").unwrap();
        assert!(CsvArchive::open(&path).is_err());
    }
}
