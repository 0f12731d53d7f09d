//! Per-mode request builders.
//!
//! Each builder is a pure mapping from (payload, options) to a backend call
//! specification plus the output shape the parser must enforce. Builders
//! fail fast on missing payload fields and never touch the network.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use crate::domain::{
    GenerationError, GenerationOptions, GenerationPayload, InputMode, OutputShape, ScriptFramework,
    ScriptLanguage,
};
use crate::infra::backend::{BackendRequest, ContentPart};
use crate::prompts;

/// A backend call specification plus the contract the parser enforces on
/// whatever comes back.
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    pub backend: BackendRequest,
    pub expected_shape: OutputShape,
}

/// Build the backend request for the given payload.
pub fn build_request(
    payload: &GenerationPayload,
    options: &GenerationOptions,
) -> Result<BuiltRequest, GenerationError> {
    if !payload.is_ready() {
        return Err(GenerationError::InputNotReady);
    }

    let mut options = options.clone();
    options.normalize();

    let mode = payload.mode();
    let expected_shape = options.expected_shape(mode);

    let parts = match payload {
        GenerationPayload::Image { data, mime_type } => {
            let mut prompt = base_prompt(mode, &options, expected_shape);
            append_instructions(&mut prompt, &options);
            vec![
                ContentPart::InlineData {
                    mime_type: mime_type.clone(),
                    data: BASE64.encode(data),
                },
                ContentPart::text(prompt),
            ]
        }
        GenerationPayload::Html { html } => {
            let mut prompt = base_prompt(mode, &options, expected_shape);
            prompt.push_str(&format!(
                "\n\n**HERE IS THE HTML TO REFACTOR:**\n```html\n{html}\n```"
            ));
            append_instructions(&mut prompt, &options);
            vec![ContentPart::text(prompt)]
        }
        GenerationPayload::Figma {
            image,
            mime_type,
            node,
        } => {
            let mut prompt = base_prompt(mode, &options, expected_shape);
            append_instructions(&mut prompt, &options);
            let node_json =
                serde_json::to_string_pretty(node).unwrap_or_else(|_| "null".to_string());
            vec![
                ContentPart::text(prompt),
                ContentPart::InlineData {
                    mime_type: mime_type.clone(),
                    data: BASE64.encode(image),
                },
                ContentPart::text(format!(
                    "\n\n**FIGMA NODE JSON:**\n```json\n{node_json}\n```"
                )),
            ]
        }
        GenerationPayload::Url { url } => {
            let mut prompt = base_prompt(mode, &options, expected_shape);
            prompt.push_str(&format!("\n\n**WEBPAGE URL TO CLONE:**\n{url}"));
            append_instructions(&mut prompt, &options);
            vec![ContentPart::text(prompt)]
        }
        GenerationPayload::Content {
            template_html,
            content,
            adoption,
        } => {
            let prompt = prompts::render(
                "content_adoption",
                &json!({
                    "adoption_mode": adoption.label(),
                    "template_html": template_html,
                    "content": content,
                }),
            )
            .expect("failed to render content_adoption prompt");
            vec![ContentPart::text(prompt)]
        }
    };

    Ok(BuiltRequest {
        backend: BackendRequest {
            model_id: options.model_id.clone(),
            parts,
            // The model needs live web access to clone a page it has never seen.
            web_lookup: mode == InputMode::Url,
        },
        expected_shape,
    })
}

fn base_prompt(mode: InputMode, options: &GenerationOptions, shape: OutputShape) -> String {
    let source = match mode {
        InputMode::Image => "UI design image",
        InputMode::Html => "HTML code",
        InputMode::Figma => "UI design image and its corresponding Figma JSON data",
        InputMode::Url => "webpage URL",
        InputMode::Content => unreachable!("content mode uses its own template"),
    };

    prompts::render(
        "generate",
        &json!({
            "source": source,
            "framework": options.framework.display_name(),
            "language": options.language.to_string(),
            "plain_css": options.framework == ScriptFramework::HtmlCssJs,
            "framework_instructions":
                framework_instructions(options.framework, options.language, shape),
            "is_figma": mode == InputMode::Figma,
            "is_url": mode == InputMode::Url,
            "document_output": shape == OutputShape::Document,
        }),
    )
    .expect("failed to render generate prompt")
}

fn append_instructions(prompt: &mut String, options: &GenerationOptions) {
    if let Some(instructions) = options.instructions() {
        prompt.push_str(&format!(
            "\n\n**ADDITIONAL USER INSTRUCTIONS:**\n{instructions}"
        ));
    }
}

fn framework_instructions(
    framework: ScriptFramework,
    language: ScriptLanguage,
    shape: OutputShape,
) -> String {
    let ts = if language == ScriptLanguage::TypeScript {
        " Use TypeScript for all logic, including defining props and state types."
    } else {
        ""
    };

    match framework {
        ScriptFramework::HtmlCssJs => "- **HTML + CSS + JS Project:** Generate a project with three files: `index.html`, `style.css`, and `script.js`. The HTML file must link to the CSS and JS files correctly. All styles must be in `style.css` and all JavaScript logic in `script.js`.".to_string(),
        ScriptFramework::React => format!(
            "- **React:** Use functional components and hooks. Use JSX for templating.{ts} The component should be self-contained and ready to be used in a React application. Create a standard Vite project structure."
        ),
        ScriptFramework::Vue => format!(
            "- **Vue:** Use a single-file component structure (`<template>`, `<script setup>`, `<style scoped>`). Use the Composition API with `<script setup>`.{ts} For TypeScript, use `<script setup lang=\"ts\">`. Create a standard Vite project structure."
        ),
        ScriptFramework::Svelte => format!(
            "- **Svelte:** Use a standard Svelte component structure (`<script>`, markup, `<style>`).{ts} For TypeScript, use `<script lang=\"ts\">`. Create a standard SvelteKit project structure."
        ),
        ScriptFramework::Angular => format!(
            "- **Angular:** Generate files for a standalone component using inline templates and styles. Create a standard Angular CLI project structure.{ts}"
        ),
        ScriptFramework::VanillaJs => {
            if shape == OutputShape::Project {
                "- **Vanilla JS Project:** Generate a project structure with a main `index.html` and any necessary JavaScript in a separate file (e.g., `src/index.js`).".to_string()
            } else {
                "- **Vanilla JS:** Generate a complete, single HTML file. Place any necessary JavaScript inside a `<script>` tag at the end of the `<body>`.".to_string()
            }
        }
        ScriptFramework::Html => {
            if shape == OutputShape::Project {
                "- **HTML Project:** Generate a project structure with a well-formed `index.html` as the main file.".to_string()
            } else {
                "- **HTML:** Ensure the output is a well-formed, single, complete HTML document starting with `<!DOCTYPE html>`.".to_string()
            }
        }
    }
}
