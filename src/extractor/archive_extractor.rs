use crate::config::ExtractionConfig;
use crate::error::{ConvertError, Result};
use serde::Serialize;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    pub destination: PathBuf,
    pub files_written: usize,
    pub directories_created: usize,
    pub bytes_written: u64,
    pub skipped_entries: Vec<String>,
}

/// Unpacks a ZIP archive into a directory.
///
/// Every entry name is checked before anything touches the disk: an archive
/// with an absolute entry, or one whose `..` segments climb out of the
/// destination, is rejected as a whole.
pub struct ArchiveExtractor {
    clean_before_extract: bool,
}

impl ArchiveExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            clean_before_extract: config.clean_before_extract,
        }
    }

    pub fn with_clean_before_extract(mut self, clean: bool) -> Self {
        self.clean_before_extract = clean;
        self
    }

    pub fn extract(&self, archive: &Path, destination: &Path) -> Result<ExtractionReport> {
        let file = fs::File::open(archive)
            .map_err(|e| ConvertError::extraction(archive, format!("cannot open archive: {}", e)))?;

        let mut zip = ZipArchive::new(BufReader::new(file))
            .map_err(|e| ConvertError::extraction(archive, e.to_string()))?;

        debug!(archive = %archive.display(), entries = zip.len(), "Opened archive");

        self.validate_entries(&mut zip, archive)?;

        if self.clean_before_extract {
            remove_existing(destination)
                .map_err(|e| ConvertError::extraction(archive, format!(
                    "cannot clear {}: {}",
                    destination.display(),
                    e
                )))?;
        }

        fs::create_dir_all(destination).map_err(|e| {
            ConvertError::extraction(archive, format!(
                "cannot create {}: {}",
                destination.display(),
                e
            ))
        })?;

        let mut report = ExtractionReport {
            destination: destination.to_path_buf(),
            ..ExtractionReport::default()
        };

        for index in 0..zip.len() {
            let mut entry = zip
                .by_index(index)
                .map_err(|e| ConvertError::extraction(archive, e.to_string()))?;

            let relative = enclosed_path(entry.name(), entry.enclosed_name(), archive)?;

            if entry.is_symlink() {
                warn!(entry = entry.name(), "Skipping symbolic link in archive");
                report.skipped_entries.push(entry.name().to_string());
                continue;
            }

            let target = destination.join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&target).map_err(|e| entry_error(archive, &relative, e))?;
                report.directories_created += 1;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| entry_error(archive, &relative, e))?;
            }

            let out_file =
                fs::File::create(&target).map_err(|e| entry_error(archive, &relative, e))?;
            let mut writer = BufWriter::new(out_file);
            let bytes = io::copy(&mut entry, &mut writer)
                .map_err(|e| entry_error(archive, &relative, e))?;
            writer
                .flush()
                .map_err(|e| entry_error(archive, &relative, e))?;

            report.files_written += 1;
            report.bytes_written += bytes;
        }

        info!(
            archive = %archive.display(),
            destination = %destination.display(),
            files = report.files_written,
            "Extracted archive"
        );

        Ok(report)
    }

    fn validate_entries<R: io::Read + io::Seek>(
        &self,
        zip: &mut ZipArchive<R>,
        archive: &Path,
    ) -> Result<()> {
        for index in 0..zip.len() {
            let entry = zip
                .by_index(index)
                .map_err(|e| ConvertError::extraction(archive, e.to_string()))?;
            enclosed_path(entry.name(), entry.enclosed_name(), archive)?;
        }

        Ok(())
    }
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

/// `<archive parent>/<directory_name>`.
pub fn extraction_directory(archive: &Path, directory_name: &str) -> PathBuf {
    archive
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(directory_name)
}

/// Relative path of `entry` inside the extraction directory, or an error for
/// absolute and escaping names.
fn enclosed_path(name: &str, enclosed: Option<PathBuf>, archive: &Path) -> Result<PathBuf> {
    enclosed.ok_or_else(|| ConvertError::UnsafeArchiveEntry {
        archive: archive.to_path_buf(),
        entry: name.to_string(),
    })
}

fn remove_existing(destination: &Path) -> io::Result<()> {
    match fs::symlink_metadata(destination) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(destination),
        Ok(_) => fs::remove_file(destination),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn entry_error(archive: &Path, entry: &Path, error: io::Error) -> ConvertError {
    ConvertError::extraction(archive, format!("cannot write {}: {}", entry.display(), error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (name, content) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extracts_nested_structure() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("site.zip");
        write_zip(
            &archive,
            &[
                ("index.html", "<p>home</p>"),
                ("docs/", ""),
                ("docs/guide/intro.html", "<p>intro</p>"),
            ],
        );

        let destination = temp_dir.path().join("extracted");
        let report = ArchiveExtractor::default()
            .extract(&archive, &destination)
            .unwrap();

        assert_eq!(report.files_written, 2);
        assert_eq!(report.directories_created, 1);
        assert_eq!(
            fs::read_to_string(destination.join("docs/guide/intro.html")).unwrap(),
            "<p>intro</p>"
        );
        assert!(destination.join("index.html").is_file());
    }

    #[test]
    fn test_clean_extraction_removes_stale_files() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("extracted");

        let first = temp_dir.path().join("first.zip");
        write_zip(&first, &[("old.html", "old")]);
        let second = temp_dir.path().join("second.zip");
        write_zip(&second, &[("new.html", "new")]);

        let extractor = ArchiveExtractor::default();
        extractor.extract(&first, &destination).unwrap();
        extractor.extract(&second, &destination).unwrap();

        assert!(!destination.join("old.html").exists());
        assert!(destination.join("new.html").exists());
    }

    #[test]
    fn test_keep_existing_merges() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("extracted");
        fs::create_dir_all(&destination).unwrap();
        fs::write(destination.join("kept.html"), "kept").unwrap();

        let archive = temp_dir.path().join("a.zip");
        write_zip(&archive, &[("new.html", "new")]);

        ArchiveExtractor::default()
            .with_clean_before_extract(false)
            .extract(&archive, &destination)
            .unwrap();

        assert!(destination.join("kept.html").exists());
        assert!(destination.join("new.html").exists());
    }

    #[test]
    fn test_rejects_parent_traversal_before_writing() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("evil.zip");
        write_zip(
            &archive,
            &[("fine.html", "ok"), ("../escaped.html", "nope")],
        );

        let destination = temp_dir.path().join("extracted");
        let result = ArchiveExtractor::default().extract(&archive, &destination);

        match result {
            Err(ConvertError::UnsafeArchiveEntry { entry, .. }) => {
                assert_eq!(entry, "../escaped.html");
            }
            other => panic!("expected unsafe entry error, got {:?}", other),
        }
        assert!(!destination.exists());
        assert!(!temp_dir.path().join("escaped.html").exists());
    }

    #[test]
    fn test_rejects_absolute_entry() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("abs.zip");
        write_zip(&archive, &[("/etc/owned.html", "nope")]);

        let result = ArchiveExtractor::default()
            .extract(&archive, &temp_dir.path().join("extracted"));
        assert!(matches!(result, Err(ConvertError::UnsafeArchiveEntry { .. })));
    }

    #[test]
    fn test_inner_parent_segments_are_allowed() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("dots.zip");
        write_zip(&archive, &[("a/../b.html", "fine")]);

        let destination = temp_dir.path().join("extracted");
        ArchiveExtractor::default()
            .extract(&archive, &destination)
            .unwrap();
        assert!(destination.join("b.html").exists());
    }

    #[test]
    fn test_not_a_zip_is_extraction_error() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("fake.zip");
        fs::write(&archive, "this is plain text").unwrap();

        let destination = temp_dir.path().join("extracted");
        let error = ArchiveExtractor::default()
            .extract(&archive, &destination)
            .unwrap_err();

        assert_eq!(error.kind(), crate::error::ErrorKind::Extraction);
        assert!(!destination.exists());
    }

    #[test]
    fn test_missing_archive() {
        let temp_dir = TempDir::new().unwrap();
        let error = ArchiveExtractor::default()
            .extract(
                &temp_dir.path().join("nope.zip"),
                &temp_dir.path().join("extracted"),
            )
            .unwrap_err();
        assert!(matches!(error, ConvertError::Extraction { .. }));
    }

    #[test]
    fn test_extraction_directory() {
        assert_eq!(
            extraction_directory(Path::new("/data/site.zip"), "extracted"),
            PathBuf::from("/data/extracted")
        );
        assert_eq!(
            extraction_directory(Path::new("site.zip"), "out"),
            PathBuf::from("out")
        );
    }

    #[test]
    fn test_enclosed_path_rejects_missing_name() {
        let archive = Path::new("site.zip");
        assert_eq!(
            enclosed_path("a/b.html", Some(PathBuf::from("a/b.html")), archive).unwrap(),
            PathBuf::from("a/b.html")
        );

        let error = enclosed_path("../evil.html", None, archive).unwrap_err();
        assert!(matches!(
            error,
            ConvertError::UnsafeArchiveEntry { ref entry, .. } if entry == "../evil.html"
        ));
    }
}
