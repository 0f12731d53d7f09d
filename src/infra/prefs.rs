//! Remembered user preferences.
//!
//! Two values survive across sessions: the design-source access token and the
//! preferred preview viewport. Both go through the [`KeyValueStore`]
//! capability so components never touch ambient global state and tests can
//! substitute an in-memory store.

use std::collections::BTreeMap;
use std::path::PathBuf;

pub const KEY_FIGMA_TOKEN: &str = "figma_token";
pub const KEY_PREVIEW_VIEWPORT: &str = "preview_viewport";

/// Minimal persistence capability injected into preference-aware components.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// TOML-file-backed store. Load failures fall back to an empty store; save
/// failures are logged and otherwise ignored so a broken disk never takes
/// down a generation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open() -> Self {
        Self::open_at(prefs_path())
    }

    pub fn open_at(path: PathBuf) -> Self {
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|contents| toml::from_str(&contents).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                log::warn!("failed to create preference dir: {err}");
                return;
            }
        }
        let contents = toml::to_string_pretty(&self.entries).unwrap_or_default();
        if let Err(err) = std::fs::write(&self.path, contents) {
            log::warn!("failed to save preferences: {err}");
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist();
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.persist();
    }
}

fn prefs_path() -> PathBuf {
    if let Ok(path) = std::env::var("PAGEFORGE_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    app_data_dir().join("prefs.toml")
}

fn app_data_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("PAGEFORGE_DATA_HOME") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("PageForge");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("PageForge");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("pageforge");
        }
        if let Some(home) = home::home_dir() {
            return home.join(".local").join("share").join("pageforge");
        }
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".pageforge")
}
