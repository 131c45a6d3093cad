use crate::extractor::ExtractionReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct ConvertedDocument {
    /// Path relative to the extraction directory.
    pub source: PathBuf,
    pub output: PathBuf,
    pub pages: usize,
    pub lines: usize,
    pub characters: usize,
    pub missing_glyphs: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub archive: PathBuf,
    pub extraction: ExtractionReport,
    pub output_directory: PathBuf,
    pub documents: Vec<ConvertedDocument>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u128,
}

impl RunSummary {
    pub fn converted(&self) -> usize {
        self.documents.len()
    }

    pub fn total_pages(&self) -> usize {
        self.documents.iter().map(|d| d.pages).sum()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &PathBuf> {
        self.documents.iter().map(|d| &d.output)
    }

    pub fn missing_glyphs(&self) -> usize {
        self.documents.iter().map(|d| d.missing_glyphs).sum()
    }
}
