use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to extract archive {archive}: {message}")]
    Extraction { archive: PathBuf, message: String },

    #[error("Archive {archive} contains an unsafe entry: {entry}")]
    UnsafeArchiveEntry { archive: PathBuf, entry: String },

    #[error("Failed to scan {path}: {message}")]
    Locator { path: PathBuf, message: String },

    #[error("Failed to read document {path}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Font not found: {path}")]
    FontNotFound { path: PathBuf },

    #[error("Font {name} could not be loaded: {message}")]
    FontInvalid { name: String, message: String },

    #[error("Failed to write PDF {path}: {message}")]
    RenderWrite { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },
}

/// Coarse classification used for status messages and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Extraction,
    Locator,
    Render,
    Config,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Extraction => "extraction error",
            ErrorKind::Locator => "locator error",
            ErrorKind::Render => "render error",
            ErrorKind::Config => "configuration error",
            ErrorKind::Io => "I/O error",
        };
        f.write_str(name)
    }
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::Extraction { .. } | ConvertError::UnsafeArchiveEntry { .. } => {
                ErrorKind::Extraction
            }
            // Reading a discovered document is part of consuming the walk.
            ConvertError::Locator { .. } | ConvertError::DocumentRead { .. } => ErrorKind::Locator,
            ConvertError::FontNotFound { .. }
            | ConvertError::FontInvalid { .. }
            | ConvertError::RenderWrite { .. } => ErrorKind::Render,
            ConvertError::Config { .. } => ErrorKind::Config,
            ConvertError::Io(_) | ConvertError::InvalidPath { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn extraction<S: Into<String>>(archive: impl Into<PathBuf>, message: S) -> Self {
        ConvertError::Extraction {
            archive: archive.into(),
            message: message.into(),
        }
    }

    pub(crate) fn render_write<S: Into<String>>(path: impl Into<PathBuf>, message: S) -> Self {
        ConvertError::RenderWrite {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ConvertError {
    fn user_message(&self) -> String {
        match self {
            ConvertError::Extraction { archive, message } => {
                format!("Could not extract {}: {}", archive.display(), message)
            }
            ConvertError::UnsafeArchiveEntry { entry, .. } => {
                format!("Archive entry escapes the extraction directory: {}", entry)
            }
            ConvertError::Locator { path, message } => {
                format!("Could not search {} for documents: {}", path.display(), message)
            }
            ConvertError::DocumentRead { path, source } => {
                format!("Could not read {}: {}", path.display(), source)
            }
            ConvertError::FontNotFound { path } => {
                format!("Font file not found: {}", path.display())
            }
            ConvertError::FontInvalid { name, message } => {
                format!("Font {} is not a usable TrueType font: {}", name, message)
            }
            ConvertError::RenderWrite { path, message } => {
                format!("Could not write {}: {}", path.display(), message)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ConvertError::Extraction { .. } => Some(
                "Check that the file is a complete, uncorrupted ZIP archive.".to_string()
            ),
            ConvertError::UnsafeArchiveEntry { .. } => Some(
                "The archive tries to write outside its extraction directory. Re-create it without absolute or '..' paths.".to_string()
            ),
            ConvertError::Locator { .. } | ConvertError::DocumentRead { .. } => Some(
                "Ensure you have read permission for the extracted files.".to_string()
            ),
            ConvertError::FontNotFound { .. } | ConvertError::FontInvalid { .. } => Some(
                "Point --font (or render.font_path) at a TrueType font such as DejaVuSansMono.ttf.".to_string()
            ),
            ConvertError::RenderWrite { .. } => Some(
                "Ensure the output directory is writable and the disk is not full.".to_string()
            ),
            ConvertError::Config { .. } => Some(
                "Check your configuration file syntax and values.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for ConvertError {
    fn from(error: toml::de::Error) -> Self {
        ConvertError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
