//! Figma design-source collaborator.
//!
//! The network side (rendering an image, fetching node JSON) lives behind
//! [`DesignSource`]. Reference parsing and node pruning are pure and happen
//! here, so the prompt only ever sees a size-bounded node tree.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::domain::GenerationPayload;

#[derive(Debug, Error)]
pub enum FigmaError {
    #[error(
        "Invalid Figma URL. Please use a URL with a \"node-id\" (e.g., by selecting a frame and using the \"Share\" link)."
    )]
    InvalidUrl,

    #[error("Design source request failed: {0}")]
    RequestFailed(#[from] anyhow::Error),
}

/// A parsed Figma file/node reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigmaRef {
    pub file_key: String,
    /// Node id in the API's `123:45` form.
    pub node_id: String,
}

static FIGMA_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"figma\.com/(?:file|design)/([^/]+)/.*?node-id=([^&]+)").unwrap());

/// Parse a shared Figma URL into its file key and node id.
///
/// Share links write node ids as `123-45`; the API requires `123:45`, so the
/// first hyphen is rewritten after undoing URL escaping of the colon.
pub fn parse_figma_url(url: &str) -> Result<FigmaRef, FigmaError> {
    let caps = FIGMA_URL_RE.captures(url).ok_or(FigmaError::InvalidUrl)?;
    let node_id = caps[2].replace("%3A", ":").replacen('-', ":", 1);
    Ok(FigmaRef {
        file_key: caps[1].to_string(),
        node_id,
    })
}

// Node properties worth forwarding to the model; everything else is noise
// that blows up the prompt.
const RELEVANT_KEYS: &[&str] = &[
    "id",
    "name",
    "type",
    "absoluteBoundingBox",
    "clipsContent",
    "opacity",
    "layoutMode",
    "layoutWrap",
    "layoutAlign",
    "layoutGrow",
    "layoutPositioning",
    "primaryAxisSizingMode",
    "counterAxisSizingMode",
    "primaryAxisAlignItems",
    "counterAxisAlignItems",
    "itemSpacing",
    "paddingLeft",
    "paddingRight",
    "paddingTop",
    "paddingBottom",
    "constraints",
    "fills",
    "strokes",
    "strokeWeight",
    "strokeAlign",
    "cornerRadius",
    "rectangleCornerRadii",
    "effects",
    "blendMode",
    "characters",
    "fontName",
    "fontWeight",
    "fontSize",
    "textAlignHorizontal",
    "textAlignVertical",
    "letterSpacing",
    "lineHeight",
    "textCase",
    "textDecoration",
    "style",
];

/// Recursively prune a raw Figma node down to the whitelisted properties.
pub fn prune_node(node: &Value) -> Value {
    let Some(map) = node.as_object() else {
        return Value::Null;
    };

    let mut pruned = serde_json::Map::new();
    for key in RELEVANT_KEYS {
        if let Some(value) = map.get(*key) {
            pruned.insert((*key).to_string(), value.clone());
        }
    }

    if let Some(children) = map.get("children").and_then(Value::as_array) {
        if !children.is_empty() {
            pruned.insert(
                "children".to_string(),
                Value::Array(children.iter().map(prune_node).collect()),
            );
        }
    }

    Value::Object(pruned)
}

/// A design fetched from the external source, node already pruned.
#[derive(Debug, Clone)]
pub struct DesignImport {
    pub image: Vec<u8>,
    pub mime_type: String,
    pub node: Value,
}

impl DesignImport {
    /// Turn the import into a ready-to-dispatch generation payload.
    pub fn into_payload(self) -> GenerationPayload {
        GenerationPayload::Figma {
            image: self.image,
            mime_type: self.mime_type,
            node: self.node,
        }
    }
}

/// Fetches a rendered image and node tree for a Figma reference.
#[async_trait]
pub trait DesignSource: Send + Sync {
    async fn fetch(&self, reference: &FigmaRef, token: &str) -> Result<DesignImport, FigmaError>;
}
