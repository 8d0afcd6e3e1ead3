//! Domain-specific error types for the installer.
//!
//! Library modules return typed errors ([`ConfigError`], [`RunnerError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error types
//!
//! ```text
//! ConfigError  : registry, profile/mode parsing, catalog lookups, selection checks
//! RunnerError  : subprocess spawn and wait failures
//! ```
//!
//! Command failures (non-zero exits) are not errors: sequencers record them
//! as `false` outcomes in the run report.

use thiserror::Error;

/// Errors that arise from configuration loading and user selections.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The requested profile name is not one of the predefined profiles.
    #[error("Invalid profile '{0}': must be one of minimal, medium, full")]
    UnknownProfile(String),

    /// A component id is not present in the catalog for the target.
    #[error("Unknown component '{0}'")]
    UnknownComponent(String),

    /// The requested install mode name is not recognised.
    #[error("Invalid install mode '{0}': must be one of full, config, update")]
    UnknownMode(String),

    /// The named machine is not present in `machines.yaml`.
    #[error("Unknown machine '{0}': not configured in machines.yaml")]
    UnknownMachine(String),

    /// The user selected zero components.
    #[error("Please select at least one component")]
    EmptySelection,

    /// A machine entry is missing a required connection field.
    #[error("Invalid machine config for '{name}': missing {field}")]
    InvalidMachine {
        /// Registry key of the offending entry.
        name: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// The YAML document could not be parsed.
    #[error("Invalid YAML in {path}: {source}")]
    Parse {
        /// Path to the file that failed to parse.
        path: String,
        /// Underlying parser error.
        source: serde_yaml::Error,
    },

    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while spawning or waiting on a subprocess.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The executable could not be located on `PATH`.
    #[error("{0}")]
    MissingDependency(String),

    /// The process could not be started for another reason.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Waiting for the process to exit failed.
    #[error("failed to wait for {program}: {source}")]
    Wait {
        /// Program that was being waited on.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    // -----------------------------------------------------------------------
    // ConfigError
    // -----------------------------------------------------------------------

    #[test]
    fn config_error_unknown_profile_display() {
        let e = ConfigError::UnknownProfile("huge".to_string());
        assert_eq!(
            e.to_string(),
            "Invalid profile 'huge': must be one of minimal, medium, full"
        );
    }

    #[test]
    fn config_error_empty_selection_display() {
        assert_eq!(
            ConfigError::EmptySelection.to_string(),
            "Please select at least one component"
        );
    }

    #[test]
    fn config_error_invalid_machine_display() {
        let e = ConfigError::InvalidMachine {
            name: "nas".to_string(),
            field: "host",
        };
        assert_eq!(e.to_string(), "Invalid machine config for 'nas': missing host");
    }

    #[test]
    fn config_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: "/dotfiles/machines.yaml".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.to_string().contains("/dotfiles/machines.yaml"));
        assert!(e.source().is_some());
    }

    // -----------------------------------------------------------------------
    // RunnerError
    // -----------------------------------------------------------------------

    #[test]
    fn runner_error_missing_dependency_is_verbatim() {
        let e = RunnerError::MissingDependency("sshpass is not installed".to_string());
        assert_eq!(e.to_string(), "sshpass is not installed");
    }

    #[test]
    fn runner_error_spawn_display() {
        let e = RunnerError::Spawn {
            program: "rsync".to_string(),
            source: io::Error::other("boom"),
        };
        assert_eq!(e.to_string(), "failed to start rsync: boom");
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<ConfigError>();
        assert_send_sync::<RunnerError>();
    }

    #[test]
    fn config_error_converts_to_anyhow() {
        let e = ConfigError::EmptySelection;
        let _anyhow_err: anyhow::Error = e.into();
    }
}
