use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kind of design artifact the user is generating from.
///
/// Exactly one mode is active at a time; switching modes discards the
/// payload of every other mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Image,
    Html,
    Figma,
    Url,
    Content,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Html => write!(f, "html"),
            Self::Figma => write!(f, "figma"),
            Self::Url => write!(f, "url"),
            Self::Content => write!(f, "content"),
        }
    }
}

impl FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "html" => Ok(Self::Html),
            "figma" => Ok(Self::Figma),
            "url" => Ok(Self::Url),
            "content" => Ok(Self::Content),
            other => Err(format!("unknown input mode '{other}'")),
        }
    }
}

/// How user-provided content is merged into an HTML template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionMode {
    /// Fill template gaps with generated placeholder content that matches
    /// the theme of the provided content.
    #[default]
    Improve,
    /// Use only the provided content; uncovered template sections are
    /// removed from the output.
    Strict,
}

impl AdoptionMode {
    /// Label used inside the content-adoption prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Improve => "Improve and Add",
            Self::Strict => "Strict Content",
        }
    }
}

impl FromStr for AdoptionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "improve" => Ok(Self::Improve),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown adoption mode '{other}'")),
        }
    }
}

/// The artifact backing a generation attempt, keyed by [`InputMode`].
///
/// At most one variant exists at a time, mirroring the active mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationPayload {
    /// A screenshot or exported design image.
    Image { data: Vec<u8>, mime_type: String },
    /// An HTML document to refactor.
    Html { html: String },
    /// A Figma frame: rendered image plus the pruned node tree.
    Figma {
        image: Vec<u8>,
        mime_type: String,
        node: serde_json::Value,
    },
    /// A live webpage to clone.
    Url { url: String },
    /// An HTML template plus new content to merge into it.
    Content {
        template_html: String,
        content: String,
        adoption: AdoptionMode,
    },
}

impl GenerationPayload {
    /// The input mode this payload belongs to.
    pub fn mode(&self) -> InputMode {
        match self {
            Self::Image { .. } => InputMode::Image,
            Self::Html { .. } => InputMode::Html,
            Self::Figma { .. } => InputMode::Figma,
            Self::Url { .. } => InputMode::Url,
            Self::Content { .. } => InputMode::Content,
        }
    }

    /// Whether every field required for dispatch is present and non-empty.
    pub fn is_ready(&self) -> bool {
        match self {
            Self::Image { data, mime_type } => !data.is_empty() && !mime_type.is_empty(),
            Self::Html { html } => !html.trim().is_empty(),
            Self::Figma {
                image, mime_type, ..
            } => !image.is_empty() && !mime_type.is_empty(),
            Self::Url { url } => !url.trim().is_empty(),
            Self::Content {
                template_html,
                content,
                ..
            } => !template_html.trim().is_empty() && !content.trim().is_empty(),
        }
    }
}

/// One file of a generated multi-file project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Slash-separated path, unique within one result.
    pub path: String,
    pub content: String,
}

/// Generated code: either one complete document or an ordered file list.
///
/// Untagged on the wire so the envelope's `code` key carries either a JSON
/// string or an array of file objects, exactly as the backend emits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeOutput {
    Document(String),
    Project(Vec<GeneratedFile>),
}

impl CodeOutput {
    pub fn shape(&self) -> crate::domain::OutputShape {
        match self {
            Self::Document(_) => crate::domain::OutputShape::Document,
            Self::Project(_) => crate::domain::OutputShape::Project,
        }
    }

    /// The file list, when this is a project.
    pub fn files(&self) -> Option<&[GeneratedFile]> {
        match self {
            Self::Document(_) => None,
            Self::Project(files) => Some(files),
        }
    }
}

/// The validated outcome of one generation or refinement call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub code: CodeOutput,
    /// Actionable refinement suggestions, typically 3-4.
    pub suggestions: Vec<String>,
    /// One-sentence summary of the change, shown as the assistant's chat turn.
    #[serde(rename = "response", default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAuthor {
    User,
    Assistant,
}

/// One turn of the refinement conversation. History is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: ChatAuthor,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            author: ChatAuthor::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            author: ChatAuthor::Assistant,
            text: text.into(),
        }
    }
}
