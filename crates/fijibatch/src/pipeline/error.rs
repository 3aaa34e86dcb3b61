use thiserror::Error;

/// Failure while processing one document. Captured at the batch loop and
/// recorded against that document; never aborts the remaining batch.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Macro construction failed: {0}")]
    Macro(#[from] crate::error::ValidationError),

    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Tool invocation failed: {0}")]
    Gateway(#[from] crate::error::GatewayError),

    #[error("Tool exited with code {code}{detail}")]
    ToolFailure { code: String, detail: String },

    #[error("No ROI file associated with this document; ROI inversion requires one")]
    MissingRoi,
}
