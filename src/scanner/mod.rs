pub mod document_scanner;
pub mod file_filter;

pub use document_scanner::{format_bytes, DocumentFile, DocumentIter, DocumentScanner};
pub use file_filter::FileFilter;
