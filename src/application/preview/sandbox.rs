//! Sandboxed preview rendering and the runtime error channel.
//!
//! The generated document runs in an isolated context with scripts enabled
//! and host privilege (storage, origin access) denied. A snippet injected
//! into its head forwards uncaught errors and unhandled rejections to the
//! host as structured messages; the host accepts them only from the
//! currently rendered instance.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::infra::prefs::{KEY_PREVIEW_VIEWPORT, KeyValueStore};

/// Script injected into every preview document. Returning `true` from
/// `onerror` suppresses the default console report inside the sandbox.
pub const ERROR_CHANNEL_SCRIPT: &str = r#"
<script>
  window.onerror = function(message, source, lineno, colno, error) {
    window.parent.postMessage({
      type: 'previewError',
      message: message
    }, '*');
    return true;
  };
  window.addEventListener('unhandledrejection', function(event) {
    window.parent.postMessage({
      type: 'previewError',
      message: 'Unhandled promise rejection: ' + (event.reason ? event.reason.message : 'No reason provided')
    }, '*');
  });
</script>
"#;

static HEAD_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<head[^>]*>").expect("head tag regex is valid"));

/// Insert the error channel immediately after the opening head tag, or wrap
/// the fragment in a minimal page when it has none.
pub fn instrument_document(html: &str) -> String {
    match HEAD_OPEN_RE.find(html) {
        Some(open) => {
            let mut out = String::with_capacity(html.len() + ERROR_CHANNEL_SCRIPT.len());
            out.push_str(&html[..open.end()]);
            out.push_str(ERROR_CHANNEL_SCRIPT);
            out.push_str(&html[open.end()..]);
            out
        }
        None => format!("<html><head>{ERROR_CHANNEL_SCRIPT}</head><body>{html}</body></html>"),
    }
}

/// Identity of one rendered sandbox instance. Rotates on every load so
/// messages from torn-down instances are silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxId(Uuid);

impl SandboxId {
    fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Structured message posted from inside the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PreviewMessage {
    #[serde(rename_all = "camelCase")]
    PreviewError { message: String },
}

/// A message envelope as seen by the host: raw payload plus the instance
/// that posted it.
#[derive(Debug, Clone)]
pub struct SandboxEnvelope {
    pub source: SandboxId,
    pub payload: serde_json::Value,
}

/// Bounded inbox standing in for the host's message listener. Transports
/// push envelopes; the host pumps them into a sandbox. When full, the oldest
/// envelope is dropped.
#[derive(Debug)]
pub struct SandboxInbox {
    queue: VecDeque<SandboxEnvelope>,
    capacity: usize,
}

impl SandboxInbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, envelope: SandboxEnvelope) {
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(envelope);
    }

    pub fn pop(&mut self) -> Option<SandboxEnvelope> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for SandboxInbox {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Host-side model of the isolated preview context.
#[derive(Debug)]
pub struct PreviewSandbox {
    id: SandboxId,
    document: String,
    error: Option<String>,
}

impl PreviewSandbox {
    pub fn new(document: &str) -> Self {
        Self {
            id: SandboxId::fresh(),
            document: instrument_document(document),
            error: None,
        }
    }

    /// Swap in a new bundle: the overlay clears and the instance id rotates,
    /// so anything the previous document still posts is ignored.
    pub fn load(&mut self, document: &str) {
        self.id = SandboxId::fresh();
        self.document = instrument_document(document);
        self.error = None;
    }

    pub fn id(&self) -> SandboxId {
        self.id
    }

    /// The instrumented document handed to the renderer.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// The blocking overlay text, if a runtime error is showing.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Accept a message if and only if it originates from the live instance
    /// and decodes as a known message type. A new error replaces the current
    /// overlay; it does not queue behind it. Returns whether the message was
    /// accepted.
    pub fn deliver(&mut self, envelope: &SandboxEnvelope) -> bool {
        if envelope.source != self.id {
            return false;
        }
        match serde_json::from_value::<PreviewMessage>(envelope.payload.clone()) {
            Ok(PreviewMessage::PreviewError { message }) => {
                self.error = Some(message);
                true
            }
            Err(_) => false,
        }
    }

    /// Drain an inbox into this sandbox.
    pub fn pump(&mut self, inbox: &mut SandboxInbox) {
        while let Some(envelope) = inbox.pop() {
            self.deliver(&envelope);
        }
    }
}

/// Preview viewport presets, remembered across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewport {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl Viewport {
    /// CSS dimensions of the preview frame.
    pub fn dimensions(&self) -> (&'static str, &'static str) {
        match self {
            Self::Mobile => ("375px", "667px"),
            Self::Tablet => ("768px", "1024px"),
            Self::Desktop => ("100%", "100%"),
        }
    }

    pub fn remembered(store: &dyn KeyValueStore) -> Self {
        store
            .get(KEY_PREVIEW_VIEWPORT)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    pub fn remember(self, store: &mut dyn KeyValueStore) {
        store.set(KEY_PREVIEW_VIEWPORT, &self.to_string());
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mobile => write!(f, "mobile"),
            Self::Tablet => write!(f, "tablet"),
            Self::Desktop => write!(f, "desktop"),
        }
    }
}

impl FromStr for Viewport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mobile" => Ok(Self::Mobile),
            "tablet" => Ok(Self::Tablet),
            "desktop" => Ok(Self::Desktop),
            other => Err(format!("unknown viewport '{other}'")),
        }
    }
}
