//! PageForge CLI entry point.
//!
//! Runs one generation end-to-end against a stdio backend command and writes
//! the generated document or project to disk.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Component, Path, PathBuf};

use pageforge::application::generate::{ProgressEvent, run_generation};
use pageforge::application::preview;
use pageforge::domain::{
    AdoptionMode, CodeOutput, DEFAULT_MODEL_ID, GenerationOptions, GenerationPayload, InputMode,
    ScriptFramework, ScriptLanguage,
};
use pageforge::infra::backend::CommandBackend;
use pageforge::state::GenerationSession;

#[derive(Parser, Debug)]
#[command(name = "pageforge")]
#[command(version)]
#[command(about = "Turn designs, HTML, and webpages into frontend projects with AI", long_about = None)]
struct Args {
    /// Input mode (image, html, url, content)
    #[arg(short, long)]
    mode: InputMode,

    /// Design image to generate from (image mode)
    #[arg(long)]
    image: Option<PathBuf>,

    /// HTML file to refactor (html mode) or to use as the template (content mode)
    #[arg(long)]
    html_file: Option<PathBuf>,

    /// Webpage URL to clone (url mode)
    #[arg(long)]
    url: Option<String>,

    /// File holding the new content to apply (content mode)
    #[arg(long)]
    content_file: Option<PathBuf>,

    /// How content is merged into the template (improve, strict)
    #[arg(long, default_value = "improve")]
    adoption: AdoptionMode,

    /// Output format (html-css-js, html, react, vue, svelte, angular, vanillajs)
    #[arg(short, long, default_value = "html-css-js")]
    framework: ScriptFramework,

    /// Implementation language (javascript, typescript)
    #[arg(long, default_value = "javascript")]
    language: ScriptLanguage,

    /// Backend model id
    #[arg(long, default_value = DEFAULT_MODEL_ID)]
    model: String,

    /// Extra instructions passed to the model
    #[arg(long)]
    instructions: Option<String>,

    /// Backend command speaking the stdin-JSON/stdout-text contract
    #[arg(long)]
    backend_cmd: String,

    /// Extra arguments for the backend command (repeatable)
    #[arg(long)]
    backend_arg: Vec<String>,

    /// Directory the generated files are written to
    #[arg(short, long, default_value = "out")]
    out: PathBuf,

    /// Also write an instrumented preview.html next to the output
    #[arg(long)]
    preview: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let payload = build_payload(&args)?;
    let backend = CommandBackend::new(args.backend_cmd.clone(), args.backend_arg.clone());
    if !backend.is_available() {
        bail!("backend command '{}' not found in PATH", args.backend_cmd);
    }

    let options = GenerationOptions {
        model_id: args.model.clone(),
        framework: args.framework,
        language: args.language,
        custom_instructions: args.instructions.clone(),
    };

    let mut session = GenerationSession::new();
    session.set_payload(payload);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(ProgressEvent::Narration(message)) = rx.recv().await {
            eprintln!("{message}");
        }
    });

    let outcome = run_generation(&mut session, &backend, &options, Some(tx)).await;
    let _ = printer.await;

    if let Err(err) = outcome {
        if let Some(message) = session.error() {
            bail!("{message}");
        }
        return Err(err.into());
    }

    let result = session
        .result()
        .context("generation succeeded but left no result")?;

    match &result.code {
        CodeOutput::Document(html) => {
            let target = args.out.join("index.html");
            write_file(&target, html)?;
            println!("wrote {}", target.display());
        }
        CodeOutput::Project(files) => {
            for file in files {
                let Some(relative) = sanitize_path(&file.path) else {
                    log::warn!("skipping file with unsafe path: {}", file.path);
                    continue;
                };
                let target = args.out.join(relative);
                write_file(&target, &file.content)?;
            }
            println!("wrote {} files to {}", files.len(), args.out.display());
            if let Some(entry) = preview::select_entry_file(files) {
                println!("entry file: {}", entry.path);
            }
        }
    }

    if args.preview {
        match preview::prepare(&result.code) {
            Ok(sandbox) => {
                let target = args.out.join("preview.html");
                write_file(&target, sandbox.document())?;
                println!("preview: {}", target.display());
            }
            Err(err) => log::warn!("no preview written: {err}"),
        }
    }

    if !result.suggestions.is_empty() {
        println!("\nRefinement suggestions:");
        for suggestion in &result.suggestions {
            println!("  - {suggestion}");
        }
    }

    if let Some(at) = session.generated_at() {
        log::info!("generated at {}", at.to_rfc3339());
    }

    Ok(())
}

fn build_payload(args: &Args) -> Result<GenerationPayload> {
    match args.mode {
        InputMode::Image => {
            let path = args
                .image
                .as_ref()
                .context("image mode requires --image")?;
            let data = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(GenerationPayload::Image {
                data,
                mime_type: guess_mime(path)?,
            })
        }
        InputMode::Html => {
            let path = args
                .html_file
                .as_ref()
                .context("html mode requires --html-file")?;
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(GenerationPayload::Html { html })
        }
        InputMode::Url => {
            let url = args.url.clone().context("url mode requires --url")?;
            Ok(GenerationPayload::Url { url })
        }
        InputMode::Content => {
            let template = args
                .html_file
                .as_ref()
                .context("content mode requires --html-file for the template")?;
            let content = args
                .content_file
                .as_ref()
                .context("content mode requires --content-file")?;
            Ok(GenerationPayload::Content {
                template_html: std::fs::read_to_string(template)
                    .with_context(|| format!("failed to read {}", template.display()))?,
                content: std::fs::read_to_string(content)
                    .with_context(|| format!("failed to read {}", content.display()))?,
                adoption: args.adoption,
            })
        }
        InputMode::Figma => {
            bail!(
                "figma mode needs a live design source; import the frame in the app instead, \
                 or export it as an image and use --mode image"
            )
        }
    }
}

fn guess_mime(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        other => bail!("unsupported image extension '{other}'"),
    };
    Ok(mime.to_string())
}

// Generated paths are untrusted: keep writes inside the output directory.
fn sanitize_path(path: &str) -> Option<PathBuf> {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return None;
    }
    if candidate
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(candidate.to_path_buf())
}

fn write_file(target: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(target, contents)
        .with_context(|| format!("failed to write {}", target.display()))
}
