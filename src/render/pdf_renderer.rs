use crate::config::RenderConfig;
use crate::error::{ConvertError, Result};
use crate::render::font::FontResource;
use crate::render::layout::{paginate, wrap_text, PageLayout};
use printpdf::{IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Pt};
use serde::Serialize;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderOutcome {
    pub pages: usize,
    pub lines: usize,
    pub missing_glyphs: usize,
}

pub struct PdfRenderer {
    font: FontResource,
    layout: PageLayout,
}

impl PdfRenderer {
    pub fn new(font: FontResource, config: &RenderConfig) -> Self {
        Self {
            font,
            layout: PageLayout::from_config(config),
        }
    }

    pub fn font(&self) -> &FontResource {
        &self.font
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Renders `text` to `output`, titled after the output file's stem.
    pub fn render_to_pdf(&self, text: &str, output: &Path) -> Result<RenderOutcome> {
        let title = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.render_document(&title, text, output)
    }

    pub fn render_document(&self, title: &str, text: &str, output: &Path) -> Result<RenderOutcome> {
        let metrics = self.font.metrics(self.layout.font_size_pt)?;
        let wrapped = wrap_text(text, &metrics, self.layout.text_width_mm());

        if wrapped.missing_glyphs > 0 {
            warn!(
                output = %output.display(),
                font = self.font.name(),
                missing = wrapped.missing_glyphs,
                "Font has no glyph for some characters; they were left out"
            );
        }

        let pages = paginate(&wrapped.lines, self.layout.lines_per_page());
        let width = Mm(self.layout.page_width_mm);
        let height = Mm(self.layout.page_height_mm);

        let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Layer 1");
        let font_ref = doc
            .add_external_font(Cursor::new(self.font.bytes()))
            .map_err(|e| ConvertError::FontInvalid {
                name: self.font.name().to_string(),
                message: e.to_string(),
            })?;

        for (index, page_lines) in pages.iter().enumerate() {
            let (page, layer) = if index == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(width, height, format!("Page {}, Layer 1", index + 1))
            };
            let layer = doc.get_page(page).get_layer(layer);
            self.write_lines(&layer, &font_ref, page_lines);
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| ConvertError::render_write(output, e.to_string()))?;
        fs::write(output, bytes).map_err(|e| ConvertError::render_write(output, e.to_string()))?;

        let outcome = RenderOutcome {
            pages: pages.len(),
            lines: wrapped.lines.len(),
            missing_glyphs: wrapped.missing_glyphs,
        };

        debug!(
            output = %output.display(),
            pages = outcome.pages,
            lines = outcome.lines,
            "Wrote PDF"
        );

        Ok(outcome)
    }

    fn write_lines(&self, layer: &PdfLayerReference, font: &IndirectFontRef, lines: &[String]) {
        if lines.is_empty() {
            return;
        }

        layer.begin_text_section();
        layer.set_font(font, self.layout.font_size_pt);
        layer.set_line_height(Pt::from(Mm(self.layout.line_height_mm)).0);
        layer.set_text_cursor(
            Mm(self.layout.margin_mm),
            Mm(self.layout.first_baseline_mm()),
        );

        for line in lines {
            if !line.is_empty() {
                layer.write_text(line.as_str(), font);
            }
            layer.add_line_break();
        }

        layer.end_text_section();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn renderer() -> PdfRenderer {
        let config = RenderConfig::default();
        PdfRenderer::new(FontResource::load(&config).unwrap(), &config)
    }

    fn page_count(path: &Path) -> usize {
        printpdf::lopdf::Document::load(path).unwrap().get_pages().len()
    }

    #[test]
    fn test_single_page_document() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("hello.pdf");

        let outcome = renderer().render_to_pdf("Hello World", &output).unwrap();

        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.lines, 1);
        assert_eq!(page_count(&output), 1);
        assert!(fs::read(&output).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_text_gives_blank_page() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("empty.pdf");

        let outcome = renderer().render_to_pdf("", &output).unwrap();

        assert_eq!(outcome.pages, 1);
        assert_eq!(outcome.lines, 0);
        assert_eq!(page_count(&output), 1);
    }

    #[test]
    fn test_paginates_long_text() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("long.pdf");
        let text = (1..=120)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");

        let outcome = renderer().render_to_pdf(&text, &output).unwrap();

        assert_eq!(outcome.lines, 120);
        assert_eq!(outcome.pages, 3);
        assert_eq!(page_count(&output), 3);
    }

    #[test]
    fn test_non_ascii_renders() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("turkish.pdf");

        let outcome = renderer()
            .render_to_pdf("İstanbul'da çeşmeler", &output)
            .unwrap();

        assert_eq!(outcome.missing_glyphs, 0);
        assert_eq!(page_count(&output), 1);
    }

    #[test]
    fn test_overwrites_existing_output() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("again.pdf");
        fs::write(&output, "stale").unwrap();

        renderer().render_to_pdf("fresh", &output).unwrap();
        assert!(fs::read(&output).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_unwritable_output_is_render_error() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("missing-dir").join("out.pdf");

        let error = renderer().render_to_pdf("text", &output).unwrap_err();
        assert!(matches!(error, ConvertError::RenderWrite { .. }));
        assert_eq!(error.kind(), crate::error::ErrorKind::Render);
    }
}
