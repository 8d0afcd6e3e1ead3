//! VS Code payload files deployed to Windows targets.
use std::path::{Path, PathBuf};

/// Directory holding the editor payload, relative to the dotfiles root.
const VSCODE_DIR: &str = "config/vscode";

/// User `settings.json`.
#[must_use]
pub fn settings_path(root: &Path) -> PathBuf {
    root.join(VSCODE_DIR).join("settings.json")
}

/// User `keybindings.json`.
#[must_use]
pub fn keybindings_path(root: &Path) -> PathBuf {
    root.join(VSCODE_DIR).join("keybindings.json")
}

/// Newline-delimited extension list.
#[must_use]
pub fn extensions_path(root: &Path) -> PathBuf {
    root.join(VSCODE_DIR).join("extensions.txt")
}

/// Parse an extension list: one id per line, blank lines and `#` comment
/// lines ignored, trailing `# ...` comments stripped. File order is kept.
#[must_use]
pub fn parse_extensions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let id = line.split('#').next().unwrap_or_default().trim();
            (!id.is_empty()).then(|| id.to_string())
        })
        .collect()
}

/// Read and parse the extension list at `path`.
///
/// Returns `None` when the file is missing or unreadable.
#[must_use]
pub fn load_extensions(path: &Path) -> Option<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(parse_extensions(&content)),
        Err(e) => {
            tracing::debug!("cannot read {}: {e}", path.display());
            None
        }
    }
}
