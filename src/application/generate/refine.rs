//! Conversational refinement of a previously generated result.

use serde_json::json;

use super::parser::parse_output;
use crate::domain::{ChatAuthor, ChatMessage, CodeOutput, GenerationError, GenerationOptions, GenerationResult};
use crate::infra::backend::{BackendRequest, ContentPart, GenerationBackend};
use crate::prompts;
use crate::state::GenerationSession;

/// Assistant chat turn used when the backend omits its change summary.
pub const DEFAULT_ACKNOWLEDGEMENT: &str = "I have updated the code based on your request.";

/// Apply one refinement turn to the stored result.
///
/// A blank message or a session without a prior result is a deliberate
/// no-op. The user's turn is appended before dispatch so a failed call still
/// preserves it; on failure the assistant's turn records the error, keeping
/// the conversation a complete audit trail, and the stored result is left
/// untouched.
pub async fn run_refinement(
    session: &mut GenerationSession,
    backend: &dyn GenerationBackend,
    message: &str,
    options: &GenerationOptions,
) -> Result<(), GenerationError> {
    let message = message.trim();
    let Some(prior) = session.result().cloned() else {
        return Ok(());
    };
    if message.is_empty() {
        return Ok(());
    }

    session.clear_error();
    session.push_user_turn(message);

    let expected = prior.code.shape();
    let request = build_refine_request(&prior, session.history(), options);

    log::info!("dispatching refinement to model {}", request.model_id);

    let outcome = backend
        .invoke(&request)
        .await
        .map_err(GenerationError::from)
        .and_then(|raw| parse_output(&raw, expected));

    match outcome {
        Ok(result) => {
            let acknowledgement = result
                .narrative
                .clone()
                .unwrap_or_else(|| DEFAULT_ACKNOWLEDGEMENT.to_string());
            session.apply_refinement(result);
            session.push_assistant_turn(acknowledgement);
            Ok(())
        }
        Err(err) => {
            log::warn!("refinement failed: {err}");
            let text = err.to_string();
            session.push_assistant_turn(format!("Sorry, I encountered an error: {text}"));
            session.fail_generation(text);
            Err(err)
        }
    }
}

fn build_refine_request(
    prior: &GenerationResult,
    history: &[ChatMessage],
    options: &GenerationOptions,
) -> BackendRequest {
    let code_block = match &prior.code {
        CodeOutput::Document(html) => format!("```html\n{html}\n```"),
        CodeOutput::Project(files) => format!(
            "```json\n{}\n```",
            serde_json::to_string_pretty(files).unwrap_or_default()
        ),
    };

    let history_text = history
        .iter()
        .map(|turn| {
            let author = match turn.author {
                ChatAuthor::User => "User",
                ChatAuthor::Assistant => "AI",
            };
            format!("{author}: {}", turn.text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = prompts::render(
        "refine",
        &json!({
            "framework": options.framework.display_name(),
            "language": options.language.to_string(),
            "code_block": code_block,
            "history": history_text,
            "document_output": matches!(prior.code, CodeOutput::Document(_)),
        }),
    )
    .expect("failed to render refine prompt");

    BackendRequest {
        model_id: options.model_id.clone(),
        parts: vec![ContentPart::text(prompt)],
        web_lookup: false,
    }
}
