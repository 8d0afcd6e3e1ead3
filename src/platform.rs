//! Detection of the machine the installer runs on.
use std::fmt;

/// Operating-system family of an install target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux, macOS and other Unix-like systems.
    Unix,
    /// Microsoft Windows.
    Windows,
}

impl Os {
    /// Classify a machine `os` tag. Only `windows` (any case) maps to
    /// [`Os::Windows`]; everything else, including a missing tag, is Unix-like.
    #[must_use]
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(t) if t.trim().eq_ignore_ascii_case("windows") => Self::Windows,
            _ => Self::Unix,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix => write!(f, "unix"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Description of the machine the installer is running on.
#[derive(Debug, Clone)]
pub struct Platform {
    /// OS family of the local machine.
    pub os: Os,
    /// Human-readable OS name (e.g. `macOS`, `Ubuntu 24.04 LTS`).
    pub name: String,
    /// CPU architecture (e.g. `x86_64`, `aarch64`).
    pub arch: String,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        let os = if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            Os::Unix
        };
        Self {
            os,
            name: Self::detect_name(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Create a platform with explicit values (for testing).
    #[cfg(test)]
    pub fn new(os: Os, name: &str, arch: &str) -> Self {
        Self {
            os,
            name: name.to_string(),
            arch: arch.to_string(),
        }
    }

    /// Returns `true` when running on Windows.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    fn detect_name() -> String {
        match std::env::consts::OS {
            "macos" => "macOS".to_string(),
            "windows" => "Windows".to_string(),
            "linux" => std::fs::read_to_string("/etc/os-release")
                .ok()
                .and_then(|content| pretty_name(&content))
                .unwrap_or_else(|| "Linux".to_string()),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.arch)
    }
}

/// Extract `PRETTY_NAME` from the contents of `/etc/os-release`.
fn pretty_name(os_release: &str) -> Option<String> {
    os_release
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|value| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
