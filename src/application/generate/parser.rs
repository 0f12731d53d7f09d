//! Output contract enforcement.
//!
//! Extracts the structured envelope from the backend's raw text and
//! validates it field by field. Any violation is a hard failure surfaced to
//! the caller; there is no partial recovery and no best-effort guessing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

use crate::domain::{CodeOutput, GeneratedFile, GenerationError, GenerationResult, OutputShape};

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fence regex is valid"));

/// Parse a raw backend response into a validated [`GenerationResult`].
pub fn parse_output(raw: &str, expected: OutputShape) -> Result<GenerationResult, GenerationError> {
    if raw.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    // First fenced block wins; a fence-less reply is treated as the envelope
    // itself.
    let content = FENCE_RE
        .captures(raw)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| raw.trim().to_string());

    let value: Value = serde_json::from_str(&content)
        .map_err(|err| GenerationError::MalformedEnvelope(err.to_string()))?;
    let Some(envelope) = value.as_object() else {
        return Err(GenerationError::SchemaViolation(
            "the envelope must be a JSON object with 'code' and 'suggestions' keys".to_string(),
        ));
    };

    let code = envelope
        .get("code")
        .ok_or_else(|| GenerationError::SchemaViolation("missing required key 'code'".to_string()))
        .and_then(parse_code)?;
    if code.shape() != expected {
        return Err(GenerationError::UnexpectedShape {
            expected,
            actual: code.shape(),
        });
    }

    let suggestions = envelope
        .get("suggestions")
        .ok_or_else(|| {
            GenerationError::SchemaViolation("missing required key 'suggestions'".to_string())
        })
        .and_then(parse_suggestions)?;

    let narrative = match envelope.get("response") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            return Err(GenerationError::SchemaViolation(
                "'response' must be a string".to_string(),
            ));
        }
    };

    Ok(GenerationResult {
        code,
        suggestions,
        narrative,
    })
}

fn parse_code(value: &Value) -> Result<CodeOutput, GenerationError> {
    match value {
        Value::String(document) => Ok(CodeOutput::Document(document.clone())),
        Value::Array(entries) => {
            let mut files = Vec::with_capacity(entries.len());
            let mut seen = HashSet::new();
            for (idx, entry) in entries.iter().enumerate() {
                let object = entry.as_object().ok_or_else(|| {
                    GenerationError::SchemaViolation(format!("file entry {idx} is not an object"))
                })?;
                let path = object.get("path").and_then(Value::as_str).ok_or_else(|| {
                    GenerationError::SchemaViolation(format!(
                        "file entry {idx} lacks a string 'path'"
                    ))
                })?;
                let content = object
                    .get("content")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        GenerationError::SchemaViolation(format!(
                            "file entry '{path}' lacks a string 'content'"
                        ))
                    })?;
                if !seen.insert(path.to_string()) {
                    return Err(GenerationError::SchemaViolation(format!(
                        "duplicate file path '{path}'"
                    )));
                }
                files.push(GeneratedFile {
                    path: path.to_string(),
                    content: content.to_string(),
                });
            }
            Ok(CodeOutput::Project(files))
        }
        _ => Err(GenerationError::SchemaViolation(
            "'code' must be a string or an array of file objects".to_string(),
        )),
    }
}

fn parse_suggestions(value: &Value) -> Result<Vec<String>, GenerationError> {
    value
        .as_array()
        .ok_or_else(|| {
            GenerationError::SchemaViolation("'suggestions' must be an array".to_string())
        })?
        .iter()
        .map(|entry| {
            entry.as_str().map(str::to_string).ok_or_else(|| {
                GenerationError::SchemaViolation(
                    "'suggestions' must contain only strings".to_string(),
                )
            })
        })
        .collect()
}
