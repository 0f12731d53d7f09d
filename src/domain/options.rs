use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::InputMode;

/// Default backend model when the user has not picked one.
pub const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash";

/// Target output format for generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptFramework {
    /// Plain three-file project: `index.html`, `style.css`, `script.js`.
    HtmlCssJs,
    /// A single Tailwind-styled HTML document.
    Html,
    React,
    Vue,
    Svelte,
    Angular,
    /// A single HTML document with inline vanilla JavaScript.
    #[serde(rename = "vanillajs")]
    VanillaJs,
}

impl ScriptFramework {
    pub fn id(&self) -> &'static str {
        match self {
            Self::HtmlCssJs => "html-css-js",
            Self::Html => "html",
            Self::React => "react",
            Self::Vue => "vue",
            Self::Svelte => "svelte",
            Self::Angular => "angular",
            Self::VanillaJs => "vanillajs",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::HtmlCssJs => "HTML + CSS + JS",
            Self::Html => "HTML + Tailwind CSS",
            Self::React => "React + Tailwind CSS",
            Self::Vue => "Vue + Tailwind CSS",
            Self::Svelte => "Svelte + Tailwind CSS",
            Self::Angular => "Angular + Tailwind CSS",
            Self::VanillaJs => "Vanilla JS + Tailwind CSS",
        }
    }

    /// Whether the TypeScript/JavaScript choice applies to this framework.
    ///
    /// Markup-only targets always emit JavaScript; the language selection is
    /// reset whenever one of them becomes active.
    pub fn has_language_choice(&self) -> bool {
        !matches!(self, Self::Html | Self::VanillaJs | Self::HtmlCssJs)
    }

    /// The code shape this framework emits outside of URL cloning.
    pub fn native_shape(&self) -> OutputShape {
        match self {
            Self::Html | Self::VanillaJs => OutputShape::Document,
            _ => OutputShape::Project,
        }
    }
}

impl fmt::Display for ScriptFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for ScriptFramework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html-css-js" => Ok(Self::HtmlCssJs),
            "html" => Ok(Self::Html),
            "react" => Ok(Self::React),
            "vue" => Ok(Self::Vue),
            "svelte" => Ok(Self::Svelte),
            "angular" => Ok(Self::Angular),
            "vanillajs" => Ok(Self::VanillaJs),
            other => Err(format!("unknown framework '{other}'")),
        }
    }
}

/// Implementation language for frameworks that support the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    #[default]
    JavaScript,
    TypeScript,
}

impl fmt::Display for ScriptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JavaScript => write!(f, "JavaScript"),
            Self::TypeScript => write!(f, "TypeScript"),
        }
    }
}

impl FromStr for ScriptLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "javascript" | "js" => Ok(Self::JavaScript),
            "typescript" | "ts" => Ok(Self::TypeScript),
            other => Err(format!("unknown language '{other}'")),
        }
    }
}

/// Whether a result must be a single document or a multi-file project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    Document,
    Project,
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "single document"),
            Self::Project => write!(f, "file project"),
        }
    }
}

/// User-selected knobs for one generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub model_id: String,
    pub framework: ScriptFramework,
    pub language: ScriptLanguage,
    #[serde(default)]
    pub custom_instructions: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            framework: ScriptFramework::HtmlCssJs,
            language: ScriptLanguage::JavaScript,
            custom_instructions: None,
        }
    }
}

impl GenerationOptions {
    /// Reset the language to JavaScript when the framework has no language
    /// choice, so a stale TypeScript selection never reaches a prompt.
    pub fn normalize(&mut self) {
        if !self.framework.has_language_choice() {
            self.language = ScriptLanguage::JavaScript;
        }
    }

    /// The shape the parser must enforce for a given input mode.
    ///
    /// URL cloning always yields a project; content adoption always yields a
    /// single document; everything else follows the framework.
    pub fn expected_shape(&self, mode: InputMode) -> OutputShape {
        match mode {
            InputMode::Url => OutputShape::Project,
            InputMode::Content => OutputShape::Document,
            _ => self.framework.native_shape(),
        }
    }

    /// Trimmed custom instructions, when any were provided.
    pub fn instructions(&self) -> Option<&str> {
        self.custom_instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
