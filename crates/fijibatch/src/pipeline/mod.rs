pub mod error;
pub mod result;
pub mod runner;

pub use error::PipelineError;
pub use result::{FailedDocument, ProcessedDocument, RunResult};
pub use runner::{BatchRunner, MacroSpec};
