use crate::text::normalize::normalize_whitespace;
use scraper::{ElementRef, Html, Node};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Elements whose content is never shown to a reader.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "details", "dialog",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section",
    "summary", "table", "tbody", "tfoot", "thead", "title", "tr", "ul",
];

const CELL_ELEMENTS: &[&str] = &["td", "th"];

/// Nesting beyond this is flattened instead of walked recursively.
const MAX_NESTING: usize = 256;

/// Decodes raw document bytes as UTF-8, replacing invalid sequences and
/// dropping a leading byte order mark.
pub fn decode_document(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Turns an HTML document into the text a reader would see.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_text(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let mut raw = String::with_capacity(html.len() / 2);

        if let Some(title) = Self::title(&document) {
            raw.push_str(&title);
            raw.push('\n');
        }

        self.collect(document.root_element(), &mut raw, 0);
        normalize_whitespace(&raw)
    }

    fn title(document: &Html) -> Option<String> {
        let root = document.root_element();
        let head = root
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "head")?;
        let title = head
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "title")?;

        let text: String = title.text().collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    fn collect(&self, element: ElementRef<'_>, out: &mut String, depth: usize) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(_) => {
                    let Some(child_element) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let name = child_element.value().name();

                    if SKIPPED_ELEMENTS.contains(&name) {
                        continue;
                    }
                    if name == "br" {
                        out.push('\n');
                        continue;
                    }

                    let block = BLOCK_ELEMENTS.contains(&name);
                    if block {
                        out.push('\n');
                    } else if CELL_ELEMENTS.contains(&name) {
                        out.push(' ');
                    }

                    if depth < MAX_NESTING {
                        self.collect(child_element, out, depth + 1);
                    } else {
                        child_element.text().for_each(|t| out.push_str(t));
                    }

                    if block {
                        out.push('\n');
                    }
                }
                // comments, doctype, processing instructions
                _ => {}
            }
        }
    }
}
