//! Output rendering: file navigation, preview bundling, and the sandboxed
//! preview with its runtime error channel.

pub mod bundle;
pub mod file_tree;
pub mod sandbox;

pub use bundle::bundle;
pub use file_tree::{FileTreeNode, build_tree, default_expanded, select_entry_file};
pub use sandbox::{
    PreviewMessage, PreviewSandbox, SandboxEnvelope, SandboxId, SandboxInbox, Viewport,
};

use crate::domain::{CodeOutput, InputMode, PreviewError, ScriptFramework};

/// Whether a result can be rendered live.
///
/// A single document previews when the framework's primary artifact is a
/// directly renderable page (plain Tailwind HTML or vanilla JS), or when it
/// came from content adoption. A project previews only for the plain
/// three-file HTML/CSS/JS target, which the bundler knows how to inline.
pub fn is_previewable(code: &CodeOutput, framework: ScriptFramework, mode: InputMode) -> bool {
    match code {
        CodeOutput::Document(_) => {
            matches!(framework, ScriptFramework::Html | ScriptFramework::VanillaJs)
                || mode == InputMode::Content
        }
        CodeOutput::Project(_) => framework == ScriptFramework::HtmlCssJs,
    }
}

/// Bundle a result and stand up a fresh sandbox around it.
pub fn prepare(code: &CodeOutput) -> Result<PreviewSandbox, PreviewError> {
    let document = bundle(code).ok_or(PreviewError::BundlingFailed)?;
    Ok(PreviewSandbox::new(&document))
}
