//! Static component catalog, profiles and install modes.
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// An installable component: a catalog row pairing an id with a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Identifier passed to the setup routine (`setup_<id>`).
    pub id: &'static str,
    /// Human-readable description shown in selection lists.
    pub description: &'static str,
}

/// Components available for Unix-like targets (local or remote), in catalog order.
pub const COMPONENTS: &[Component] = &[
    Component {
        id: "zsh",
        description: "Shell (Zsh + Zinit + Starship + zoxide + fzf)",
    },
    Component {
        id: "vim",
        description: "Vim/Neovim (vim-plug + plugins)",
    },
    Component {
        id: "tmux",
        description: "Tmux (gpakosz config + TPM)",
    },
    Component {
        id: "git",
        description: "Git (gitconfig + delta + gitignore)",
    },
    Component {
        id: "vscode",
        description: "VSCode (settings + keybindings + extensions)",
    },
    Component {
        id: "claude",
        description: "Claude Code (MCP + settings)",
    },
    Component {
        id: "editorconfig",
        description: "EditorConfig (universal formatting)",
    },
];

/// Components available for Windows targets, in catalog order.
pub const WINDOWS_COMPONENTS: &[Component] = &[
    Component {
        id: "debloat",
        description: "Remove Bloatware (Cortana, Bing, Candy Crush, etc.)",
    },
    Component {
        id: "telemetry",
        description: "Disable Telemetry (Ads, Copilot, Bing search)",
    },
    Component {
        id: "system",
        description: "System Settings (Hibernate off, Cursor 150% black)",
    },
    Component {
        id: "chrome",
        description: "Chrome (Install + set default)",
    },
    Component {
        id: "vscode",
        description: "VSCode (Install + settings + extensions)",
    },
];

/// Look up a Unix component by id.
#[must_use]
pub fn find(id: &str) -> Option<&'static Component> {
    COMPONENTS.iter().find(|c| c.id == id)
}

/// Look up a Windows component by id.
#[must_use]
pub fn find_windows(id: &str) -> Option<&'static Component> {
    WINDOWS_COMPONENTS.iter().find(|c| c.id == id)
}

/// Returns `true` if `id` can be spliced into a shell `setup_<id>` call.
///
/// Catalog ids always qualify; ids from outside the catalog must be made of
/// ASCII letters, digits, `_` and `-`.
#[must_use]
pub fn is_setup_name(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Predefined component subsets. `Minimal ⊂ Medium ⊂ Full`.
///
/// The "custom" choice is an explicit selection and has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Essential shell and git config only.
    Minimal,
    /// Developer essentials without IDE configs.
    Medium,
    /// Complete setup with all tools.
    Full,
}

impl Profile {
    /// All profiles, in the order they are offered to the user.
    pub const ALL: [Self; 3] = [Self::Full, Self::Medium, Self::Minimal];

    /// Component ids this profile expands to, in invocation order.
    #[must_use]
    pub const fn components(self) -> &'static [&'static str] {
        match self {
            Self::Minimal => &["zsh", "git", "editorconfig"],
            Self::Medium => &["zsh", "vim", "tmux", "git", "editorconfig"],
            Self::Full => &[
                "zsh",
                "vim",
                "tmux",
                "git",
                "vscode",
                "claude",
                "editorconfig",
            ],
        }
    }

    /// Display title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Minimal => "Minimal",
            Self::Medium => "Medium",
            Self::Full => "Full (Recommended)",
        }
    }

    /// One-line description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Minimal => "Essential shell + git config only",
            Self::Medium => "Developer essentials without IDE configs",
            Self::Full => "Complete setup with all tools",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minimal => write!(f, "minimal"),
            Self::Medium => write!(f, "medium"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "medium" => Ok(Self::Medium),
            "full" => Ok(Self::Full),
            _ => Err(ConfigError::UnknownProfile(s.to_string())),
        }
    }
}

/// How a local installation treats packages and privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallMode {
    /// Install packages and apply configs (privileged).
    #[default]
    Full,
    /// Apply configs only (unprivileged).
    Config,
    /// Upgrade packages and refresh configs (privileged).
    Update,
}

impl InstallMode {
    /// All modes, in the order they are offered to the user.
    pub const ALL: [Self; 3] = [Self::Full, Self::Config, Self::Update];

    /// Whether setup routines may use `sudo`.
    #[must_use]
    pub const fn use_sudo(self) -> bool {
        !matches!(self, Self::Config)
    }

    /// Whether setup routines should upgrade instead of install.
    #[must_use]
    pub const fn update_only(self) -> bool {
        matches!(self, Self::Update)
    }

    /// Shell assignments consumed by the setup library.
    #[must_use]
    pub fn shell_flags(self) -> String {
        format!(
            "USE_SUDO={}; UPDATE_MODE={}",
            self.use_sudo(),
            self.update_only()
        )
    }

    /// Display title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Full => "Full Install",
            Self::Config => "Config Only",
            Self::Update => "Update",
        }
    }

    /// One-line description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Full => "Install packages + configs",
            Self::Config => "No sudo required",
            Self::Update => "Upgrade packages + refresh",
        }
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Config => write!(f, "config"),
            Self::Update => write!(f, "update"),
        }
    }
}

impl FromStr for InstallMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "config" => Ok(Self::Config),
            "update" => Ok(Self::Update),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}
