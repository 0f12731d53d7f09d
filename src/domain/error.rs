//! Domain error types for the PageForge application.
//!
//! These errors represent domain-level failures that can occur during
//! generation and preview operations. Generation and preview failures are
//! independent channels: a preview error never aborts a generation.

use crate::domain::options::OutputShape;
use thiserror::Error;

/// Errors surfaced by a generation or refinement attempt.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Please provide an input for the selected mode first.")]
    InputNotReady,

    #[error("Generation backend unavailable: {0}")]
    BackendUnavailable(#[from] anyhow::Error),

    #[error("The backend returned an empty response. This might be due to a content safety filter.")]
    EmptyResponse,

    #[error("The backend returned an invalid envelope: {0}")]
    MalformedEnvelope(String),

    #[error("The backend response violates the output contract: {0}")]
    SchemaViolation(String),

    #[error("The backend returned a {actual} where a {expected} was expected")]
    UnexpectedShape {
        expected: OutputShape,
        actual: OutputShape,
    },
}

/// Errors surfaced while assembling a live preview.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("No renderable document was found among the generated files")]
    BundlingFailed,
}
