pub mod archive_extractor;
pub mod output_paths;

pub use archive_extractor::{extraction_directory, ArchiveExtractor, ExtractionReport};
pub use output_paths::{sanitize_filename, OutputPlanner, PlannedOutput};
