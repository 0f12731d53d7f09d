//! One end-to-end generation attempt.

use tokio::sync::mpsc::UnboundedSender;

use super::parser::parse_output;
use super::progress::{Narrator, ProgressEvent, narration_script};
use super::request::build_request;
use crate::domain::{GenerationError, GenerationOptions};
use crate::infra::backend::GenerationBackend;
use crate::state::GenerationSession;

/// Run one generation attempt against the active payload.
///
/// Resets the session's result, error, conversation, and output view before
/// dispatch, then builds the mode-specific request, narrates progress while
/// the backend call is in flight, and validates the response. On failure the
/// session carries exactly one human-readable error and no partial result.
///
/// Callers are expected to avoid overlapping attempts (disabled UI); if two
/// do overlap, whichever settles later overwrites the session state.
pub async fn run_generation(
    session: &mut GenerationSession,
    backend: &dyn GenerationBackend,
    options: &GenerationOptions,
    progress: Option<UnboundedSender<ProgressEvent>>,
) -> Result<(), GenerationError> {
    session.begin_generation();

    let Some(payload) = session.payload().cloned() else {
        session.fail_generation(GenerationError::InputNotReady.to_string());
        return Err(GenerationError::InputNotReady);
    };

    let built = match build_request(&payload, options) {
        Ok(built) => built,
        Err(err) => {
            session.fail_generation(err.to_string());
            return Err(err);
        }
    };

    let mode = payload.mode();
    log::info!(
        "dispatching {mode} generation to model {} (expecting {})",
        built.backend.model_id,
        built.expected_shape
    );

    let mut narrator = progress.map(|tx| Narrator::start(narration_script(mode), tx));
    let raw = backend.invoke(&built.backend).await;
    // The narration timer stops the moment the call settles, on both paths.
    if let Some(narrator) = narrator.as_mut() {
        narrator.stop();
    }

    let outcome = raw
        .map_err(GenerationError::from)
        .and_then(|text| parse_output(&text, built.expected_shape));

    match outcome {
        Ok(result) => {
            log::info!("{mode} generation succeeded");
            session.apply_generation(result, options);
            Ok(())
        }
        Err(err) => {
            log::warn!("{mode} generation failed: {err}");
            session.fail_generation(err.to_string());
            Err(err)
        }
    }
}
