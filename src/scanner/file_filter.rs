use crate::config::DocumentConfig;
use std::path::Path;

/// Decides which files in the extracted tree are documents.
pub struct FileFilter {
    extension: String,
    case_sensitive: bool,
}

impl FileFilter {
    pub fn new(config: &DocumentConfig) -> Self {
        let extension = config.normalized_extension();
        let extension = if config.case_sensitive {
            extension
        } else {
            extension.to_lowercase()
        };

        Self {
            extension,
            case_sensitive: config.case_sensitive,
        }
    }

    pub fn is_document(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };

        // A bare ".html" has no stem to name the output after
        if filename.len() <= self.extension.len() {
            return false;
        }

        if self.case_sensitive {
            filename.ends_with(&self.extension)
        } else {
            filename.to_lowercase().ends_with(&self.extension)
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        let config = DocumentConfig::default();
        Self::new(&config)
    }
}
