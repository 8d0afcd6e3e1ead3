//! Dotfiles root and the configuration loaded from it.
pub mod catalog;
pub mod machines;
pub mod vscode;

use std::path::{Path, PathBuf};

/// Marker file that identifies a dotfiles root.
pub const ROOT_MARKER: &str = "lib/utils.sh";

/// Configuration loaded for a session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dotfiles root: holds `lib/`, `config/` and `machines.yaml`.
    pub root: PathBuf,
    /// Remote machines from `machines.yaml`; empty when none are configured.
    pub machines: machines::Registry,
}

impl Config {
    /// Load configuration rooted at `root`. Never fails: a missing or
    /// malformed registry leaves `machines` empty.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        let machines = machines::load(root);
        tracing::debug!("{} remote machine(s) configured", machines.len());
        Self {
            root: root.to_path_buf(),
            machines,
        }
    }

    /// Returns `true` if `dir` looks like a dotfiles root.
    #[must_use]
    pub fn is_root(dir: &Path) -> bool {
        dir.join(ROOT_MARKER).is_file()
    }
}
