use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub documents: DocumentConfig,
    pub extraction: ExtractionConfig,
    pub render: RenderConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub extension: String,
    pub case_sensitive: bool,
    pub max_depth: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub directory_name: String,
    pub clean_before_extract: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    pub line_height_mm: f32,
    pub margin_mm: f32,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where PDFs are written; the archive's own directory when unset.
    pub directory: Option<PathBuf>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            extension: ".html".to_string(),
            case_sensitive: true,
            max_depth: 64,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            directory_name: "extracted".to_string(),
            clean_before_extract: true,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: 10.0,
            line_height_mm: 5.0,
            margin_mm: 10.0,
            page_width_mm: 210.0, // A4
            page_height_mm: 297.0,
        }
    }
}

impl DocumentConfig {
    /// The configured extension with exactly one leading dot.
    pub fn normalized_extension(&self) -> String {
        let trimmed = self.extension.trim().trim_start_matches('.');
        format!(".{}", trimmed)
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConvertError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConvertError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConvertError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["htmlzip2pdf.toml", ".htmlzip2pdf.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref extension) = cli_args.extension {
            self.documents.extension = extension.clone();
        }

        if let Some(ref font) = cli_args.font_path {
            self.render.font_path = Some(font.clone());
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.directory = Some(output_dir.clone());
        }

        if let Some(clean) = cli_args.clean_before_extract {
            self.extraction.clean_before_extract = clean;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ConvertError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| ConvertError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let extension = self.documents.normalized_extension();
        if extension.len() < 2 {
            return Err(ConvertError::Config {
                message: "Document extension must not be empty".to_string(),
            });
        }
        if extension.contains('/') || extension.contains('\\') {
            return Err(ConvertError::Config {
                message: format!("Document extension contains a path separator: {}", extension),
            });
        }

        if self.documents.max_depth == 0 {
            return Err(ConvertError::Config {
                message: "Maximum directory depth must be greater than 0".to_string(),
            });
        }

        // The extraction directory is always a direct child of the archive's directory
        let mut components = Path::new(&self.extraction.directory_name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal {
            return Err(ConvertError::Config {
                message: format!(
                    "Extraction directory name must be a single directory name: {:?}",
                    self.extraction.directory_name
                ),
            });
        }

        let render = &self.render;
        if render.font_size <= 0.0 || render.line_height_mm <= 0.0 {
            return Err(ConvertError::Config {
                message: "Font size and line height must be greater than 0".to_string(),
            });
        }
        if render.margin_mm < 0.0 {
            return Err(ConvertError::Config {
                message: "Page margin cannot be negative".to_string(),
            });
        }
        if render.page_width_mm - 2.0 * render.margin_mm <= 0.0
            || render.page_height_mm - 2.0 * render.margin_mm < render.line_height_mm
        {
            return Err(ConvertError::Config {
                message: "Page margins leave no room for text".to_string(),
            });
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub extension: Option<String>,
    pub font_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub clean_before_extract: Option<bool>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension;
        self
    }

    pub fn with_font_path(mut self, font_path: Option<PathBuf>) -> Self {
        self.font_path = font_path;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_clean_before_extract(mut self, clean: Option<bool>) -> Self {
        self.clean_before_extract = clean;
        self
    }
}
