//! Builds the hierarchical file tree shown next to generated projects.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::GeneratedFile;

/// Entry points tried, in order, when picking the file to show first.
const ENTRY_POINTS: [&str; 5] = [
    "src/App.tsx",
    "src/main.tsx",
    "src/App.jsx",
    "src/main.js",
    "index.html",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTreeNode {
    pub name: String,
    /// Full slash-separated path from the root.
    pub path: String,
    pub is_directory: bool,
    pub children: Vec<FileTreeNode>,
}

/// Convert a flat file list into a sorted forest.
///
/// The tree is rebuilt from scratch whenever the file list changes; nodes
/// sharing a path prefix are deduplicated, and every level sorts directories
/// before files, then by name.
pub fn build_tree(files: &[GeneratedFile]) -> Vec<FileTreeNode> {
    let mut roots: Vec<FileTreeNode> = Vec::new();

    for file in files {
        let parts: Vec<&str> = file.path.split('/').filter(|p| !p.is_empty()).collect();
        let mut level = &mut roots;

        for (idx, part) in parts.iter().enumerate() {
            let is_directory = idx + 1 < parts.len();
            let path = parts[..=idx].join("/");

            let pos = match level.iter().position(|node| node.path == path) {
                Some(pos) => pos,
                None => {
                    level.push(FileTreeNode {
                        name: (*part).to_string(),
                        path: path.clone(),
                        is_directory,
                        children: Vec::new(),
                    });
                    level.len() - 1
                }
            };

            level = &mut level[pos].children;
        }
    }

    sort_level(&mut roots);
    roots
}

fn sort_level(nodes: &mut [FileTreeNode]) {
    nodes.sort_by(|a, b| match (a.is_directory, b.is_directory) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => compare_names(&a.name, &b.name),
    });
    for node in nodes {
        sort_level(&mut node.children);
    }
}

// Case-aware ordering: case-insensitive first, exact spelling as tiebreak,
// so results are deterministic regardless of locale.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Paths of directories expanded on first render: a top-level `src` folder.
pub fn default_expanded(tree: &[FileTreeNode]) -> HashSet<String> {
    tree.iter()
        .filter(|node| node.is_directory && node.name == "src")
        .map(|node| node.path.clone())
        .collect()
}

/// The file selected when a project first loads: a conventional entry point
/// when present, otherwise the first file in list order.
pub fn select_entry_file(files: &[GeneratedFile]) -> Option<&GeneratedFile> {
    for entry in ENTRY_POINTS {
        if let Some(file) = files.iter().find(|f| f.path == entry) {
            return Some(file);
        }
    }
    files.first()
}
