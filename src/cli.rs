use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "htmlzip2pdf.toml";

#[derive(Parser, Debug)]
#[command(name = "htmlzip2pdf")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert the HTML documents of a ZIP archive into PDFs")]
#[command(
    long_about = "htmlzip2pdf extracts a ZIP archive next to itself, finds every HTML \
                  document inside it and writes the visible text of each one to a PDF \
                  beside the archive."
)]
#[command(after_help = "EXAMPLES:\n  \
    htmlzip2pdf site.zip\n  \
    htmlzip2pdf site.zip --output-dir pdfs --verbose\n  \
    htmlzip2pdf export.zip --extension .htm --font DejaVuSans.ttf\n  \
    htmlzip2pdf --generate-config --config htmlzip2pdf.toml")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// ZIP archive to convert
    #[arg(required_unless_present = "generate_config")]
    pub archive: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Document extension to convert
    #[arg(short, long, help = "Document extension to look for (default: .html)")]
    pub extension: Option<String>,

    /// TrueType font used for rendering
    #[arg(long, help = "Path to a TrueType font (default: bundled DejaVu Sans Mono)")]
    pub font: Option<PathBuf>,

    /// Directory for the generated PDFs
    #[arg(short, long, help = "Write PDFs here instead of next to the archive")]
    pub output_dir: Option<PathBuf>,

    /// Keep files left in the extraction directory by earlier runs
    #[arg(long, help = "Extract over the existing extraction directory")]
    pub keep_existing: bool,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Write a sample configuration file and exit")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl From<OutputFormat> for OutputMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_extension(self.extension.clone())
            .with_font_path(self.font.clone())
            .with_output_dir(self.output_dir.clone())
            .with_clean_before_extract(self.keep_existing.then_some(false))
    }

    /// Where `--generate-config` writes the sample.
    pub fn generated_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_format.into()
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
