//! Session state for the generation workflow.
//!
//! One [`GenerationSession`] tracks the active input mode and payload, the
//! latest generated result, the refinement conversation, the surfaced
//! generation error, and which output view is showing. Results are replaced
//! wholesale, never field-mutated, so a later call's settlement simply
//! overwrites an earlier one (last-write-wins).

use chrono::{DateTime, Utc};

use crate::application::preview::is_previewable;
use crate::domain::{
    ChatMessage, GenerationOptions, GenerationPayload, GenerationResult, InputMode,
};

/// Which pane of the output panel is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputView {
    #[default]
    Code,
    Preview,
}

#[derive(Debug)]
pub struct GenerationSession {
    mode: InputMode,
    payload: Option<GenerationPayload>,
    result: Option<GenerationResult>,
    history: Vec<ChatMessage>,
    error: Option<String>,
    output_view: OutputView,
    previewable: bool,
    generated_at: Option<DateTime<Utc>>,
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self {
            mode: InputMode::Image,
            payload: None,
            result: None,
            history: Vec::new(),
            error: None,
            output_view: OutputView::Code,
            previewable: false,
            generated_at: None,
        }
    }
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Activate an input mode. Switching away from the current mode discards
    /// its payload and any surfaced error; the generated result survives.
    pub fn set_mode(&mut self, mode: InputMode) {
        if mode != self.mode {
            self.mode = mode;
            self.payload = None;
            self.error = None;
        }
    }

    /// Attach a payload, activating its mode first when it differs.
    pub fn set_payload(&mut self, payload: GenerationPayload) {
        self.set_mode(payload.mode());
        self.payload = Some(payload);
    }

    pub fn payload(&self) -> Option<&GenerationPayload> {
        self.payload.as_ref()
    }

    /// Whether the active mode has enough payload to permit generation.
    pub fn is_ready(&self) -> bool {
        self.payload
            .as_ref()
            .is_some_and(GenerationPayload::is_ready)
    }

    /// Reset everything a fresh generation attempt replaces: result, error,
    /// conversation, and the output view selection.
    pub fn begin_generation(&mut self) {
        self.result = None;
        self.error = None;
        self.history.clear();
        self.output_view = OutputView::Code;
        self.previewable = false;
        self.generated_at = None;
    }

    /// Store a successful generation: seed the conversation with the user's
    /// custom instructions and auto-switch to the preview when the result is
    /// renderable.
    pub fn apply_generation(&mut self, result: GenerationResult, options: &GenerationOptions) {
        if let Some(instructions) = options.instructions() {
            self.history = vec![ChatMessage::user(instructions)];
        }
        self.previewable = is_previewable(&result.code, options.framework, self.mode);
        self.result = Some(result);
        self.generated_at = Some(Utc::now());
        if self.previewable {
            self.output_view = OutputView::Preview;
        }
    }

    /// Replace the result after a successful refinement. Shape (and with it
    /// previewability) is preserved by the refinement contract.
    pub fn apply_refinement(&mut self, result: GenerationResult) {
        self.result = Some(result);
        self.generated_at = Some(Utc::now());
    }

    pub fn fail_generation(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn push_user_turn(&mut self, text: impl Into<String>) {
        self.history.push(ChatMessage::user(text));
    }

    pub fn push_assistant_turn(&mut self, text: impl Into<String>) {
        self.history.push(ChatMessage::assistant(text));
    }

    pub fn output_view(&self) -> OutputView {
        self.output_view
    }

    pub fn is_result_previewable(&self) -> bool {
        self.previewable
    }

    /// Select an output view; the preview is only reachable for previewable
    /// results.
    pub fn set_output_view(&mut self, view: OutputView) {
        if view == OutputView::Preview && !self.previewable {
            return;
        }
        self.output_view = view;
    }
}
