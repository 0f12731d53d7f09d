//! The generation backend seam.
//!
//! Network and model specifics live behind [`GenerationBackend`]; the core
//! only assembles requests and parses raw text responses.

mod command;

pub use command::CommandBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One part of a multimodal request, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// Base64-encoded binary content.
    InlineData { mime_type: String, data: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A fully assembled backend call specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendRequest {
    pub model_id: String,
    pub parts: Vec<ContentPart>,
    /// Request-scoped capability: let the model consult the live web.
    /// URL cloning requires it.
    #[serde(default)]
    pub web_lookup: bool,
}

/// Invokes the generative model with an assembled request.
///
/// Errors represent transport or configuration failures; contract violations
/// inside the returned text are the parser's concern.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn invoke(&self, request: &BackendRequest) -> anyhow::Result<String>;
}
