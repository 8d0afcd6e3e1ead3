// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed dotfiles root and re-exports the
// crate's scripted runner and recording reporter.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code, unused_imports, clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

pub use dotfiles_installer::deploy::test_helpers::{
    RecordingReporter, ScriptedRunner, make_context as context,
};

/// Shell library stub: every `setup_<c>` prints its name and succeeds,
/// except `setup_broken`, which fails.
pub const UTILS_SH: &str = r#"detect_os() { OS=test; }
setup_zsh() { echo "setup zsh (sudo=$USE_SUDO)"; }
setup_git() { echo "setup git"; echo "warning from git" >&2; }
setup_broken() { echo "about to fail"; return 3; }
"#;

/// Write the files a dotfiles root needs into `root`.
///
/// Creates:
/// - `lib/utils.sh`, `lib/os.sh`, `lib/packages.sh` (setup library stubs)
/// - `config/vscode/settings.json`, `keybindings.json`, `extensions.txt`
pub fn setup_minimal_root(root: &Path) {
    let lib = root.join("lib");
    std::fs::create_dir_all(&lib).expect("create lib dir");
    std::fs::write(lib.join("utils.sh"), UTILS_SH).expect("write utils.sh");
    std::fs::write(lib.join("os.sh"), "").expect("write os.sh");
    std::fs::write(lib.join("packages.sh"), "").expect("write packages.sh");

    let vscode = root.join("config").join("vscode");
    std::fs::create_dir_all(&vscode).expect("create vscode dir");
    std::fs::write(vscode.join("settings.json"), "{}").expect("write settings.json");
    std::fs::write(vscode.join("keybindings.json"), "[]").expect("write keybindings.json");
    std::fs::write(vscode.join("extensions.txt"), "").expect("write extensions.txt");
}

/// An isolated dotfiles root backed by a [`tempfile::TempDir`].
pub struct TestRoot {
    /// Temporary directory holding the dotfiles tree.
    pub dir: tempfile::TempDir,
}

impl TestRoot {
    /// Create a root with the minimal tree.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        setup_minimal_root(dir.path());
        Self { dir }
    }

    /// Path to the root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `machines.yaml`.
    pub fn with_machines(self, yaml: &str) -> Self {
        std::fs::write(self.path().join("machines.yaml"), yaml).expect("write machines.yaml");
        self
    }

    /// Replace `config/vscode/extensions.txt`.
    pub fn with_extensions(self, content: &str) -> Self {
        let path = self.path().join("config/vscode/extensions.txt");
        std::fs::write(path, content).expect("write extensions.txt");
        self
    }
}
