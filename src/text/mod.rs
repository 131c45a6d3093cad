pub mod normalize;
pub mod text_extractor;

pub use normalize::normalize_whitespace;
pub use text_extractor::{decode_document, TextExtractor};
