pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod render;
pub mod scanner;
pub mod text;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{
    CliOverrides, Config, DocumentConfig, ExtractionConfig, OutputConfig, RenderConfig,
};
pub use error::{ConvertError, ErrorKind, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{ArchiveExtractor, ExtractionReport, OutputPlanner, PlannedOutput};
pub use pipeline::{ConvertedDocument, Pipeline, PipelineState, RunSummary, Stage};
pub use render::{FontResource, PdfRenderer, RenderOutcome};
pub use scanner::{DocumentFile, DocumentScanner, FileFilter};
pub use text::TextExtractor;
pub use ui::{OutputFormatter, OutputMode};

use std::path::{Path, PathBuf};

/// Main library interface: converts archives and reports the outcome
pub struct Converter {
    pipeline: Pipeline,
    output_formatter: OutputFormatter,
}

impl Converter {
    /// Create a converter; fails when the configuration is invalid or the
    /// font cannot be loaded.
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let pipeline = Pipeline::new(config)?;

        Ok(Self {
            pipeline,
            output_formatter,
        })
    }

    /// Create a converter from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Self::new(
            config,
            cli_args.output_mode(),
            cli_args.verbosity_level(),
            cli_args.quiet,
        )
    }

    /// Convert every document in `archive` and print the resulting status.
    pub fn convert_archive<P: AsRef<Path>>(&mut self, archive: P) -> Result<RunSummary> {
        let archive = archive.as_ref();
        self.output_formatter
            .start_operation(&format!("Converting {}", archive.display()));

        match self.pipeline.run(archive) {
            Ok(summary) => {
                self.output_formatter.info(&format!(
                    "Extracted {} files into {}",
                    summary.extraction.files_written,
                    summary.extraction.destination.display()
                ));
                if let Some(warning) = missing_glyph_warning(&summary) {
                    self.output_formatter.warning(&warning);
                }
                self.output_formatter.print_run_summary(&summary);
                if let Some(status) = self.pipeline.status_message() {
                    self.output_formatter.success(status);
                }
                Ok(summary)
            }
            Err(error) => {
                match self.pipeline.status_message() {
                    Some(status) => self.output_formatter.print_failure(status, &error),
                    None => self.handle_error(&error),
                }
                self.output_formatter
                    .print_partial_outputs(self.pipeline.written_outputs());
                Err(error)
            }
        }
    }

    /// Convert the first archive of a selection. An empty selection is a no-op.
    pub fn process_selection(&mut self, selection: &[PathBuf]) -> Option<Result<RunSummary>> {
        let archive = selection.first()?;
        Some(self.convert_archive(archive))
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        self.pipeline.config()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// The status message of the last run, if any.
    pub fn status_message(&self) -> Option<&str> {
        self.pipeline.status_message()
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &ConvertError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Warning for characters the font could not draw, if any were left out.
fn missing_glyph_warning(summary: &RunSummary) -> Option<String> {
    let affected: Vec<String> = summary
        .documents
        .iter()
        .filter(|document| document.missing_glyphs > 0)
        .map(|document| document.source.display().to_string())
        .collect();

    if affected.is_empty() {
        return None;
    }

    Some(format!(
        "{} character(s) not covered by the font were left out of: {}",
        summary.missing_glyphs(),
        affected.join(", ")
    ))
}

/// Process exit code for a failed run.
pub fn exit_code_for(error: &ConvertError) -> i32 {
    match error.kind() {
        ErrorKind::Config => 2,
        ErrorKind::Extraction => 3,
        ErrorKind::Locator => 4,
        ErrorKind::Render => 5,
        ErrorKind::Io => 1,
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get build information
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
        bundled_font: cfg!(feature = "bundled-font"),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
    pub bundled_font: bool,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "htmlzip2pdf {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )?;
        if self.bundled_font {
            write!(f, " with bundled font")?;
        }
        Ok(())
    }
}
