use crate::config::RenderConfig;
use crate::render::font::FontMetrics;

const TAB_WIDTH: usize = 4;

/// Tolerance for float accumulation when comparing against the line width.
const WIDTH_EPSILON_MM: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub line_height_mm: f32,
    pub font_size_pt: f32,
}

impl PageLayout {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            page_width_mm: config.page_width_mm,
            page_height_mm: config.page_height_mm,
            margin_mm: config.margin_mm,
            line_height_mm: config.line_height_mm,
            font_size_pt: config.font_size,
        }
    }

    pub fn text_width_mm(&self) -> f32 {
        self.page_width_mm - 2.0 * self.margin_mm
    }

    pub fn lines_per_page(&self) -> usize {
        let usable = self.page_height_mm - 2.0 * self.margin_mm;
        ((usable / self.line_height_mm).floor() as usize).max(1)
    }

    /// Baseline of the first line, measured from the bottom edge.
    pub fn first_baseline_mm(&self) -> f32 {
        self.page_height_mm - self.margin_mm - self.line_height_mm
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct WrappedText {
    pub lines: Vec<String>,
    pub missing_glyphs: usize,
}

/// Breaks `text` into lines no wider than `max_width_mm`.
///
/// Lines break at the last space that fits; a word wider than the line is
/// split between characters. Tabs become spaces, other control characters
/// and characters the font cannot draw are left out.
pub fn wrap_text(text: &str, metrics: &FontMetrics<'_>, max_width_mm: f32) -> WrappedText {
    let mut wrapped = WrappedText::default();
    if text.is_empty() {
        return wrapped;
    }

    for paragraph in text.split('\n') {
        let cleaned = clean_line(paragraph, metrics, &mut wrapped.missing_glyphs);
        wrap_line(&cleaned, metrics, max_width_mm, &mut wrapped.lines);
    }

    wrapped
}

fn clean_line(line: &str, metrics: &FontMetrics<'_>, missing: &mut usize) -> String {
    let mut cleaned = String::with_capacity(line.len());
    for ch in line.chars() {
        match ch {
            '\t' => cleaned.extend(std::iter::repeat(' ').take(TAB_WIDTH)),
            c if c.is_control() => {}
            c if !metrics.has_glyph(c) => *missing += 1,
            c => cleaned.push(c),
        }
    }
    cleaned
}

fn wrap_line(line: &str, metrics: &FontMetrics<'_>, max_width: f32, out: &mut Vec<String>) {
    let limit = max_width + WIDTH_EPSILON_MM;
    let mut current = String::new();
    let mut width = 0.0_f32;
    // byte index of the last space in `current` and the width up to and including it
    let mut last_space: Option<(usize, f32)> = None;

    for ch in line.chars() {
        let advance = metrics.advance_mm(ch);

        while width + advance > limit && !current.is_empty() {
            if ch == ' ' {
                break;
            }
            match last_space.take() {
                Some((index, width_through_space)) => {
                    let rest = current.split_off(index + 1);
                    out.push(current.trim_end().to_string());
                    current = rest;
                    width -= width_through_space;
                }
                None => {
                    out.push(std::mem::take(&mut current));
                    width = 0.0;
                }
            }
        }

        if ch == ' ' && width + advance > limit {
            // break at this space and drop it
            out.push(current.trim_end().to_string());
            current.clear();
            width = 0.0;
            last_space = None;
            continue;
        }

        if ch == ' ' {
            last_space = Some((current.len(), width + advance));
        }
        current.push(ch);
        width += advance;
    }

    out.push(current.trim_end().to_string());
}

/// Splits lines into pages; always yields at least one (possibly empty) page.
pub fn paginate(lines: &[String], lines_per_page: usize) -> Vec<&[String]> {
    if lines.is_empty() {
        return vec![&lines[..0]];
    }
    lines.chunks(lines_per_page.max(1)).collect()
}
