//! Rules that turn a raw command result into a recorded outcome.

/// Default cap on editor extensions installed per Windows deployment.
pub const DEFAULT_EXTENSION_LIMIT: usize = 10;

/// How a unit of work's raw success maps to its recorded outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomePolicy {
    /// Record the command's actual result.
    Strict,
    /// Sub-steps are allowed to fail; the unit always counts as done.
    BestEffort,
    /// A failed install most likely means the package is already present.
    AssumeInstalledOnFailure,
}

impl OutcomePolicy {
    /// Map `raw` (the command's exit status) to the recorded outcome.
    #[must_use]
    pub const fn resolve(self, raw: bool) -> bool {
        match self {
            Self::Strict => raw,
            Self::BestEffort | Self::AssumeInstalledOnFailure => true,
        }
    }

    /// Returns `true` when a failure is swallowed with a warning.
    #[must_use]
    pub const fn masks_failure(self) -> bool {
        !matches!(self, Self::Strict)
    }
}

/// Knobs for the Windows sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowsPolicy {
    /// Outcome rule for the browser install.
    pub chrome: OutcomePolicy,
    /// Maximum number of editor extensions to install.
    pub extension_limit: usize,
}

impl Default for WindowsPolicy {
    fn default() -> Self {
        Self {
            chrome: OutcomePolicy::AssumeInstalledOnFailure,
            extension_limit: DEFAULT_EXTENSION_LIMIT,
        }
    }
}
