//! Command-line surface: subcommands and global flags.
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use crate::config::catalog::{InstallMode, Profile};
use crate::deploy::policy::{DEFAULT_EXTENSION_LIMIT, OutcomePolicy, WindowsPolicy};
use crate::remote::HostKeyPolicy;

/// Top-level CLI entry point for the dotfiles installer.
///
/// Without a subcommand the interactive menu is started.
#[derive(Parser, Debug)]
#[command(
    name = "dotfiles-installer",
    about = "Install dotfiles components locally or deploy them to remote machines",
    version
)]
pub struct Cli {
    /// Subcommand; `None` opens the interactive menu.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Flags accepted by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Override dotfiles root directory
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Verify remote host keys against known_hosts instead of accepting any key
    #[arg(long, global = true)]
    pub strict_host_keys: bool,

    /// Record a failed Chrome install as a failure instead of assuming it is already installed
    #[arg(long, global = true)]
    pub strict_chrome: bool,

    /// Maximum number of VS Code extensions installed on Windows targets
    #[arg(long, global = true, default_value_t = DEFAULT_EXTENSION_LIMIT)]
    pub extension_limit: usize,
}

impl GlobalOpts {
    /// Host-key policy selected by `--strict-host-keys`.
    #[must_use]
    pub const fn host_key_policy(&self) -> HostKeyPolicy {
        if self.strict_host_keys {
            HostKeyPolicy::Strict
        } else {
            HostKeyPolicy::Relaxed
        }
    }

    /// Windows policy selected by `--strict-chrome` and `--extension-limit`.
    #[must_use]
    pub const fn windows_policy(&self) -> WindowsPolicy {
        WindowsPolicy {
            chrome: if self.strict_chrome {
                OutcomePolicy::Strict
            } else {
                OutcomePolicy::AssumeInstalledOnFailure
            },
            extension_limit: self.extension_limit,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install components on this machine
    Install(InstallOpts),
    /// Deploy components to a machine from machines.yaml
    Deploy(DeployOpts),
    /// List configured remote machines
    Machines,
    /// Print version information
    Version,
}

/// Which components to run.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionOpts {
    /// Predefined component set for Unix targets: minimal, medium or full
    #[arg(short, long, value_parser = Profile::from_str, conflicts_with = "components")]
    pub profile: Option<Profile>,

    /// Explicit components, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub components: Vec<String>,
}

/// Options for the `install` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InstallOpts {
    /// Components to run.
    #[command(flatten)]
    pub selection: SelectionOpts,

    /// Installation mode: full, config or update
    #[arg(short, long, value_parser = InstallMode::from_str, default_value_t = InstallMode::Full)]
    pub mode: InstallMode,
}

/// Options for the `deploy` subcommand.
#[derive(Args, Debug, Clone)]
pub struct DeployOpts {
    /// Machine name as listed in machines.yaml
    pub machine: String,

    /// Components to run.
    #[command(flatten)]
    pub selection: SelectionOpts,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_has_no_subcommand() {
        let cli = Cli::parse_from(["dotfiles-installer"]);
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_install_with_profile_and_mode() {
        let cli = Cli::parse_from([
            "dotfiles-installer",
            "install",
            "--profile",
            "medium",
            "--mode",
            "config",
        ]);
        let Some(Command::Install(opts)) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(opts.selection.profile, Some(Profile::Medium));
        assert_eq!(opts.mode, InstallMode::Config);
    }

    #[test]
    fn parse_install_components_list() {
        let cli = Cli::parse_from(["dotfiles-installer", "install", "-c", "zsh,git"]);
        let Some(Command::Install(opts)) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(opts.selection.components, vec!["zsh", "git"]);
        assert_eq!(opts.mode, InstallMode::Full);
    }

    #[test]
    fn profile_and_components_conflict() {
        let result = Cli::try_parse_from([
            "dotfiles-installer",
            "install",
            "--profile",
            "full",
            "--components",
            "zsh",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let err = Cli::try_parse_from(["dotfiles-installer", "install", "-p", "custom"])
            .unwrap_err()
            .to_string();
        assert!(
            err.contains("Invalid profile 'custom': must be one of minimal, medium, full"),
            "{err}"
        );
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = Cli::try_parse_from(["dotfiles-installer", "install", "-m", "turbo"])
            .unwrap_err()
            .to_string();
        assert!(
            err.contains("Invalid install mode 'turbo': must be one of full, config, update"),
            "{err}"
        );
    }

    #[test]
    fn profile_names_are_case_insensitive() {
        let cli = Cli::parse_from(["dotfiles-installer", "install", "-p", "Medium"]);
        let Some(Command::Install(opts)) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(opts.selection.profile, Some(Profile::Medium));
    }

    #[test]
    fn parse_deploy_machine() {
        let cli = Cli::parse_from(["dotfiles-installer", "deploy", "devbox", "-p", "minimal"]);
        let Some(Command::Deploy(opts)) = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(opts.machine, "devbox");
        assert_eq!(opts.selection.profile, Some(Profile::Minimal));
    }

    #[test]
    fn parse_machines_and_version() {
        let cli = Cli::parse_from(["dotfiles-installer", "machines"]);
        assert!(matches!(cli.command, Some(Command::Machines)));
        let cli = Cli::parse_from(["dotfiles-installer", "version"]);
        assert!(matches!(cli.command, Some(Command::Version)));
    }

    #[test]
    fn parse_root_override() {
        let cli = Cli::parse_from(["dotfiles-installer", "--root", "/tmp/dotfiles", "machines"]);
        assert_eq!(cli.global.root, Some(PathBuf::from("/tmp/dotfiles")));
    }

    #[test]
    fn policies_default_to_relaxed_and_lenient() {
        let cli = Cli::parse_from(["dotfiles-installer"]);
        assert_eq!(cli.global.host_key_policy(), HostKeyPolicy::Relaxed);
        assert_eq!(cli.global.windows_policy(), WindowsPolicy::default());
    }

    #[test]
    fn strict_flags_override_policies() {
        let cli = Cli::parse_from([
            "dotfiles-installer",
            "deploy",
            "pc",
            "--strict-host-keys",
            "--strict-chrome",
            "--extension-limit",
            "25",
        ]);
        assert_eq!(cli.global.host_key_policy(), HostKeyPolicy::Strict);
        let windows = cli.global.windows_policy();
        assert_eq!(windows.chrome, OutcomePolicy::Strict);
        assert_eq!(windows.extension_limit, 25);
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["dotfiles-installer", "-v", "install"]);
        assert!(cli.verbose);
    }
}
