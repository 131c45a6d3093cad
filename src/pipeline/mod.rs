pub mod conversion;
pub mod state;
pub mod summary;

pub use conversion::Pipeline;
pub use state::{PipelineState, Stage};
pub use summary::{ConvertedDocument, RunSummary};
