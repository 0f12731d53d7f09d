//! Static inlining of a generated project into one renderable document.
//!
//! Best-effort, not a build step: only the first stylesheet and the first
//! script found in the file list are inlined, and only the first matching
//! reference of each kind is rewritten.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use crate::domain::{CodeOutput, GeneratedFile};

static CSS_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<link[^>]*?href=["']?([^"']+\.css)["']?[^>]*?>"#)
        .expect("css link regex is valid")
});

static JS_SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<script[^>]*?src=["']?([^"']+\.js)["']?[^>]*?></script>"#)
        .expect("script tag regex is valid")
});

/// Produce a single renderable document, or `None` when a project has no
/// document file to anchor on.
pub fn bundle(code: &CodeOutput) -> Option<String> {
    match code {
        CodeOutput::Document(html) => Some(html.clone()),
        CodeOutput::Project(files) => bundle_project(files),
    }
}

fn bundle_project(files: &[GeneratedFile]) -> Option<String> {
    let document = files.iter().find(|f| f.path.ends_with("index.html"))?;
    let stylesheet = files.iter().find(|f| f.path.ends_with(".css"));
    let script = files.iter().find(|f| f.path.ends_with(".js"));

    let mut html = document.content.clone();

    if let Some(stylesheet) = stylesheet {
        let inline = format!("<style>{}</style>", stylesheet.content);
        if CSS_LINK_RE.is_match(&html) {
            html = CSS_LINK_RE
                .replace(&html, NoExpand(inline.as_str()))
                .into_owned();
        } else {
            html = html.replacen("</head>", &format!("{inline}</head>"), 1);
        }
    }

    if let Some(script) = script {
        let inline = format!("<script defer>{}</script>", script.content);
        if JS_SCRIPT_RE.is_match(&html) {
            html = JS_SCRIPT_RE
                .replace(&html, NoExpand(inline.as_str()))
                .into_owned();
        } else {
            html = html.replacen("</body>", &format!("{inline}</body>"), 1);
        }
    }

    Some(html)
}
