use crate::config::Config;
use crate::error::{ConvertError, Result, UserFriendlyError};
use crate::extractor::{extraction_directory, ArchiveExtractor, OutputPlanner, PlannedOutput};
use crate::pipeline::state::{PipelineState, Stage};
use crate::pipeline::summary::{ConvertedDocument, RunSummary};
use crate::render::{FontResource, PdfRenderer};
use crate::scanner::DocumentScanner;
use crate::text::{decode_document, TextExtractor};
use chrono::Utc;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs one archive through extraction, discovery, text extraction and
/// rendering, strictly in sequence.
///
/// The first error stops the run. PDFs written before it and the extraction
/// directory are left in place; `written_outputs` lists the PDFs.
pub struct Pipeline {
    config: Config,
    extractor: ArchiveExtractor,
    scanner: DocumentScanner,
    text_extractor: TextExtractor,
    renderer: PdfRenderer,
    state: PipelineState,
    transitions: Vec<PipelineState>,
    written: Vec<PathBuf>,
    status: Option<String>,
}

impl Pipeline {
    /// Validates `config` and loads the font. A missing or unreadable font
    /// fails here, before any archive is touched.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let font = FontResource::load(&config.render)?;
        debug!(font = font.name(), "Loaded font");
        Ok(Self::with_font(config, font))
    }

    pub fn with_font(config: Config, font: FontResource) -> Self {
        Self {
            extractor: ArchiveExtractor::new(&config.extraction),
            scanner: DocumentScanner::new(&config.documents),
            text_extractor: TextExtractor::new(),
            renderer: PdfRenderer::new(font, &config.render),
            config,
            state: PipelineState::Idle,
            transitions: vec![PipelineState::Idle],
            written: Vec::new(),
            status: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Every state of the last run, starting with `Idle`.
    pub fn transitions(&self) -> &[PipelineState] {
        &self.transitions
    }

    /// PDFs written by the last run, including those written before a failure.
    pub fn written_outputs(&self) -> &[PathBuf] {
        &self.written
    }

    /// The message for the user once the last run reached `Done` or `Failed`.
    pub fn status_message(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Where the PDFs of `archive` are written.
    pub fn output_directory(&self, archive: &Path) -> PathBuf {
        match self.config.output.directory {
            Some(ref dir) => dir.clone(),
            None => archive_parent(archive),
        }
    }

    pub fn run(&mut self, archive: &Path) -> Result<RunSummary> {
        self.reset();
        let started_at = Utc::now();
        let timer = Instant::now();

        info!(archive = %archive.display(), "Starting conversion");

        self.transition(PipelineState::Extracting);
        let extraction_dir = extraction_directory(archive, &self.config.extraction.directory_name);
        let output_dir = self.output_directory(archive);

        if let Err(error) = check_locations(archive, &extraction_dir, &output_dir) {
            return Err(self.fail(Stage::Extracting, error));
        }

        let extraction = match self.extractor.extract(archive, &extraction_dir) {
            Ok(report) => report,
            Err(error) => return Err(self.fail(Stage::Extracting, error)),
        };

        self.transition(PipelineState::Scanning);
        let found = self
            .scanner
            .find_documents(&extraction_dir)
            .and_then(|documents| documents.collect::<Result<Vec<_>>>());
        let documents = match found {
            Ok(documents) => documents,
            Err(error) => return Err(self.fail(Stage::Scanning, error)),
        };

        info!(count = documents.len(), "Found documents");

        let plan = OutputPlanner::new(&output_dir, self.scanner.extension()).plan(documents);
        if !plan.is_empty() {
            if let Err(error) = fs::create_dir_all(&output_dir) {
                let error = ConvertError::render_write(&output_dir, error.to_string());
                return Err(self.fail(Stage::Scanning, error));
            }
        }

        let mut converted = Vec::with_capacity(plan.len());
        for (index, planned) in plan.iter().enumerate() {
            self.transition(PipelineState::ConvertingDocument {
                index,
                source: planned.document.relative_path.clone(),
            });

            match self.convert_document(planned) {
                Ok(document) => {
                    self.written.push(document.output.clone());
                    converted.push(document);
                }
                Err(error) => return Err(self.fail(Stage::Converting, error)),
            }
        }

        self.transition(PipelineState::Done {
            converted: converted.len(),
        });

        let summary = RunSummary {
            archive: archive.to_path_buf(),
            extraction,
            output_directory: output_dir,
            documents: converted,
            started_at,
            duration_ms: timer.elapsed().as_millis(),
        };

        self.status = Some(success_message(&summary, self.scanner.extension()));
        info!(
            converted = summary.converted(),
            pages = summary.total_pages(),
            "Conversion finished"
        );

        Ok(summary)
    }

    fn convert_document(&self, planned: &PlannedOutput) -> Result<ConvertedDocument> {
        let document = &planned.document;
        let bytes = fs::read(&document.source_path).map_err(|source| ConvertError::DocumentRead {
            path: document.source_path.clone(),
            source,
        })?;

        let html = decode_document(&bytes);
        let text = self.text_extractor.extract_text(&html);
        let title = document.stem(self.scanner.extension());

        let outcome = self
            .renderer
            .render_document(&title, &text, &planned.output_path)?;

        info!(
            source = %document.display_path(),
            output = %planned.output_path.display(),
            pages = outcome.pages,
            "Converted document"
        );

        Ok(ConvertedDocument {
            source: document.relative_path.clone(),
            output: planned.output_path.clone(),
            pages: outcome.pages,
            lines: outcome.lines,
            characters: text.chars().count(),
            missing_glyphs: outcome.missing_glyphs,
        })
    }

    fn reset(&mut self) {
        self.state = PipelineState::Idle;
        self.transitions = vec![PipelineState::Idle];
        self.written.clear();
        self.status = None;
    }

    fn transition(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "Pipeline transition");
        self.state = next.clone();
        self.transitions.push(next);
    }

    fn fail(&mut self, stage: Stage, error: ConvertError) -> ConvertError {
        warn!(stage = %stage, error = %error, "Conversion failed");
        self.transition(PipelineState::Failed { stage });
        self.status = Some(failure_message(&error, self.written.len()));
        error
    }
}

fn archive_parent(archive: &Path) -> PathBuf {
    match archive.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Rejects layouts where a clean extraction would delete the archive or the PDFs.
fn check_locations(archive: &Path, extraction_dir: &Path, output_dir: &Path) -> Result<()> {
    let base = std::env::current_dir()?;
    check_locations_from(&base, archive, extraction_dir, output_dir)
}

fn check_locations_from(
    base: &Path,
    archive: &Path,
    extraction_dir: &Path,
    output_dir: &Path,
) -> Result<()> {
    let extraction_abs = absolute_from(base, extraction_dir);

    if absolute_from(base, archive).starts_with(&extraction_abs) {
        return Err(ConvertError::extraction(
            archive,
            format!(
                "archive lies inside the extraction directory {}",
                extraction_dir.display()
            ),
        ));
    }

    if absolute_from(base, output_dir).starts_with(&extraction_abs) {
        return Err(ConvertError::Config {
            message: format!(
                "Output directory {} lies inside the extraction directory {}",
                output_dir.display(),
                extraction_dir.display()
            ),
        });
    }

    Ok(())
}

/// `path` joined onto `base` with `.` and `..` resolved lexically.
fn absolute_from(base: &Path, path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in base.join(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved
}

fn success_message(summary: &RunSummary, extension: &str) -> String {
    match summary.documents.as_slice() {
        [] => format!("No {} documents found; nothing to convert", extension),
        [single] => format!("PDF created: {}", single.output.display()),
        documents => format!(
            "{} PDFs created in {}",
            documents.len(),
            summary.output_directory.display()
        ),
    }
}

fn failure_message(error: &ConvertError, written: usize) -> String {
    let mut message = format!("Error ({}): {}", error.kind(), error.user_message());
    match written {
        0 => {}
        1 => message.push_str(" (1 PDF was written before the failure)"),
        n => message.push_str(&format!(" ({} PDFs were written before the failure)", n)),
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(fs::File::create(path).unwrap());
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_successful_run_records_transitions() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("site.zip");
        write_zip(
            &archive,
            &[
                ("index.html", "<body>Hello World</body>"),
                ("docs/guide.html", "<p>Guide</p>"),
            ],
        );

        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        let summary = pipeline.run(&archive).unwrap();

        assert_eq!(summary.converted(), 2);
        assert_eq!(pipeline.state(), &PipelineState::Done { converted: 2 });
        assert_eq!(pipeline.transitions().len(), 6);
        assert_eq!(pipeline.transitions()[1], PipelineState::Extracting);
        assert_eq!(pipeline.written_outputs().len(), 2);
        assert!(temp_dir.path().join("index.pdf").is_file());
        assert!(temp_dir.path().join("guide.pdf").is_file());
        assert!(pipeline.status_message().unwrap().contains("2 PDFs created"));
    }

    #[test]
    fn test_zero_documents_is_done() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("plain.zip");
        write_zip(&archive, &[("notes.txt", "no html here")]);

        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        let summary = pipeline.run(&archive).unwrap();

        assert_eq!(summary.converted(), 0);
        assert_eq!(
            pipeline.transitions(),
            &[
                PipelineState::Idle,
                PipelineState::Extracting,
                PipelineState::Scanning,
                PipelineState::Done { converted: 0 },
            ]
        );
        assert!(pipeline.status_message().unwrap().contains("nothing to convert"));
    }

    #[test]
    fn test_invalid_archive_fails_at_extraction() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("broken.zip");
        fs::write(&archive, "not a zip").unwrap();

        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        let error = pipeline.run(&archive).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Extraction);
        assert_eq!(
            pipeline.state(),
            &PipelineState::Failed {
                stage: Stage::Extracting
            }
        );
        assert!(pipeline.written_outputs().is_empty());
        assert!(pipeline.status_message().unwrap().starts_with("Error (extraction error)"));
    }

    #[test]
    fn test_failure_keeps_earlier_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("site.zip");
        write_zip(&archive, &[("a.html", "<p>a</p>"), ("b.html", "<p>b</p>")]);
        // a directory where b.pdf should go makes the second write fail
        fs::create_dir(temp_dir.path().join("b.pdf")).unwrap();

        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        let error = pipeline.run(&archive).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Render);
        assert_eq!(
            pipeline.state(),
            &PipelineState::Failed {
                stage: Stage::Converting
            }
        );
        assert_eq!(pipeline.written_outputs(), &[temp_dir.path().join("a.pdf")]);
        assert!(pipeline
            .status_message()
            .unwrap()
            .contains("1 PDF was written before the failure"));
        assert!(temp_dir.path().join("extracted/b.html").exists());
    }

    #[test]
    fn test_missing_font_fails_construction() {
        let mut config = Config::default();
        config.render.font_path = Some(PathBuf::from("/no/such/font.ttf"));

        let error = Pipeline::new(config).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Render);
    }

    #[test]
    fn test_custom_output_directory() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("site.zip");
        write_zip(&archive, &[("page.html", "<p>x</p>")]);

        let mut config = Config::default();
        config.output.directory = Some(temp_dir.path().join("pdfs"));

        let mut pipeline = Pipeline::new(config).unwrap();
        let summary = pipeline.run(&archive).unwrap();

        assert_eq!(summary.documents[0].output, temp_dir.path().join("pdfs/page.pdf"));
        assert!(summary.documents[0].output.is_file());
    }

    #[test]
    fn test_output_inside_extraction_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("site.zip");
        write_zip(&archive, &[("page.html", "<p>x</p>")]);

        let mut config = Config::default();
        config.output.directory = Some(temp_dir.path().join("extracted").join("pdf"));

        let mut pipeline = Pipeline::new(config).unwrap();
        let error = pipeline.run(&archive).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
        assert!(!temp_dir.path().join("extracted").exists());
    }

    #[test]
    fn test_archive_named_like_extraction_directory_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("extracted");
        write_zip(&archive, &[("a.html", "<p>a</p>")]);

        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        let error = pipeline.run(&archive).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Extraction);
        assert_eq!(
            pipeline.state(),
            &PipelineState::Failed {
                stage: Stage::Extracting
            }
        );
        assert!(archive.is_file());
        assert!(!temp_dir.path().join("a.pdf").exists());
    }

    #[test]
    fn test_archive_inside_extraction_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("extracted")).unwrap();
        let archive = temp_dir.path().join("extracted").join("site.zip");
        write_zip(&archive, &[("a.html", "<p>a</p>")]);

        let mut pipeline = Pipeline::new(Config::default()).unwrap();
        assert!(pipeline.run(&archive).is_err());
        assert!(archive.is_file());
    }

    #[test]
    fn test_locations_compared_in_absolute_form() {
        let base = Path::new("/work");
        let extraction = Path::new("extracted");

        let check = |archive: &str, output: &str| {
            check_locations_from(base, Path::new(archive), extraction, Path::new(output))
        };

        let error = check("site.zip", "/work/extracted/pdf").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
        assert!(check("site.zip", "./extracted/../extracted/pdf").is_err());

        let error = check("./extracted", "/work").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Extraction);
        assert!(check("extracted/site.zip", "/work").is_err());

        assert!(check("site.zip", "/work/extracted-pdf").is_ok());
        assert!(check("site.zip", "/work").is_ok());
    }

    #[test]
    fn test_absolute_from() {
        let base = Path::new("/work/dir");
        assert_eq!(absolute_from(base, Path::new("a/./b")), PathBuf::from("/work/dir/a/b"));
        assert_eq!(absolute_from(base, Path::new("../x")), PathBuf::from("/work/x"));
        assert_eq!(absolute_from(base, Path::new("/abs/y")), PathBuf::from("/abs/y"));
    }

    #[test]
    fn test_archive_parent() {
        assert_eq!(archive_parent(Path::new("site.zip")), PathBuf::from("."));
        assert_eq!(archive_parent(Path::new("/data/site.zip")), PathBuf::from("/data"));
    }
}
