pub mod font;
pub mod layout;
pub mod pdf_renderer;

pub use font::{FontMetrics, FontResource};
pub use layout::{paginate, wrap_text, PageLayout, WrappedText};
pub use pdf_renderer::{PdfRenderer, RenderOutcome};
