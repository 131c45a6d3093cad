use crate::config::DocumentConfig;
use crate::error::{ConvertError, Result};
use crate::scanner::file_filter::FileFilter;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
    pub filename: String,
    pub size: u64,
}

impl DocumentFile {
    pub fn new(source_path: PathBuf, relative_path: PathBuf, size: u64) -> Self {
        let filename = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            source_path,
            relative_path,
            filename,
            size,
        }
    }

    /// File name without the document extension (`guide.html` -> `guide`).
    pub fn stem(&self, extension: &str) -> String {
        let cut = self.filename.len().saturating_sub(extension.len());
        match self.filename.get(..cut) {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => self.filename.clone(),
        }
    }

    pub fn display_path(&self) -> String {
        self.relative_path.display().to_string()
    }

    pub fn format_size(&self) -> String {
        format_bytes(self.size)
    }
}

pub struct DocumentScanner {
    filter: FileFilter,
    max_depth: usize,
}

impl DocumentScanner {
    pub fn new(config: &DocumentConfig) -> Self {
        Self {
            filter: FileFilter::new(config),
            max_depth: config.max_depth,
        }
    }

    pub fn extension(&self) -> &str {
        self.filter.extension()
    }

    /// Starts a fresh walk of `root`. Documents are produced lazily as the
    /// walk advances; calling this again restarts from the beginning.
    pub fn find_documents<P: AsRef<Path>>(&self, root: P) -> Result<DocumentIter<'_>> {
        let root_path = root.as_ref();

        if !root_path.exists() {
            return Err(ConvertError::Locator {
                path: root_path.to_path_buf(),
                message: "directory does not exist".to_string(),
            });
        }

        if !root_path.is_dir() {
            return Err(ConvertError::Locator {
                path: root_path.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }

        debug!(
            root = %root_path.display(),
            extension = self.filter.extension(),
            "Searching for documents"
        );

        let walker = WalkDir::new(root_path)
            .max_depth(self.max_depth)
            .follow_links(false)
            .into_iter();

        Ok(DocumentIter {
            walker,
            filter: &self.filter,
            root: root_path.to_path_buf(),
        })
    }

    /// Eagerly collects every document, sorted by relative path.
    pub fn scan_directory<P: AsRef<Path>>(&self, root: P) -> Result<Vec<DocumentFile>> {
        let mut documents = self.find_documents(root)?.collect::<Result<Vec<_>>>()?;
        documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(documents)
    }
}

pub struct DocumentIter<'a> {
    walker: walkdir::IntoIter,
    filter: &'a FileFilter,
    root: PathBuf,
}

impl Iterator for DocumentIter<'_> {
    type Item = Result<DocumentFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    return Some(Err(ConvertError::Locator {
                        path,
                        message: err.to_string(),
                    }));
                }
            };

            if !entry.file_type().is_file() || !self.filter.is_document(entry.path()) {
                continue;
            }

            return Some(self.to_document(&entry));
        }
    }
}

impl DocumentIter<'_> {
    fn to_document(&self, entry: &walkdir::DirEntry) -> Result<DocumentFile> {
        let path = entry.path();
        let metadata = entry.metadata().map_err(|e| ConvertError::Locator {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| ConvertError::InvalidPath {
                path: format!(
                    "Cannot calculate relative path for {} from root {}",
                    path.display(),
                    self.root.display()
                ),
            })?;

        if relative.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(ConvertError::InvalidPath {
                path: format!(
                    "Path contains parent directory references: {}",
                    relative.display()
                ),
            });
        }

        Ok(DocumentFile::new(
            path.to_path_buf(),
            relative.to_path_buf(),
            metadata.len(),
        ))
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
