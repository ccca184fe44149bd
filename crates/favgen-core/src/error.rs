use thiserror::Error;

/// Failure taxonomy for a pipeline run. Only `NotFound` is non-fatal: it
/// means no source image is selected (or the selected asset vanished) and
/// routes to clearing the persisted state.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no source image available")]
    NotFound,

    #[error("image processing failed: {0}")]
    Processing(String),

    #[error("storage transfer failed: {0}")]
    Storage(String),

    #[error("document write failed: {0}")]
    Persistence(String),
}
