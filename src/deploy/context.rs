//! State shared by every sequencer during one run.
use std::path::PathBuf;
use std::sync::Arc;

use super::Reporter;
use super::cancel::Cancellation;
use super::policy::WindowsPolicy;
use crate::exec::{CommandSpec, Runner};
use crate::remote::HostKeyPolicy;

/// Shared context for a sequencer run.
pub struct Context {
    /// Dotfiles root: sourced locally and mirrored to Unix hosts.
    pub root: PathBuf,
    /// Process runner (real or scripted in tests).
    pub runner: Arc<dyn Runner>,
    /// Sink for progress and output events.
    pub reporter: Arc<dyn Reporter>,
    /// Checked before every component.
    pub cancel: Cancellation,
    /// Host-key handling for ssh, rsync and scp.
    pub host_keys: HostKeyPolicy,
    /// Windows outcome rules and limits.
    pub windows: WindowsPolicy,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("runner", &"<dyn Runner>")
            .field("reporter", &"<dyn Reporter>")
            .field("cancel", &self.cancel)
            .field("host_keys", &self.host_keys)
            .field("windows", &self.windows)
            .finish()
    }
}

impl Context {
    /// Creates a context with default policies and a fresh cancellation token.
    #[must_use]
    pub fn new(root: PathBuf, runner: Arc<dyn Runner>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            root,
            runner,
            reporter,
            cancel: Cancellation::new(),
            host_keys: HostKeyPolicy::default(),
            windows: WindowsPolicy::default(),
        }
    }

    /// Replace the cancellation token (e.g. with one wired to Ctrl-C).
    #[must_use]
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the host-key policy.
    #[must_use]
    pub fn with_host_keys(mut self, host_keys: HostKeyPolicy) -> Self {
        self.host_keys = host_keys;
        self
    }

    /// Replace the Windows policy.
    #[must_use]
    pub fn with_windows_policy(mut self, windows: WindowsPolicy) -> Self {
        self.windows = windows;
        self
    }

    /// Run `spec`, relaying each output line to the reporter.
    pub fn exec(&self, spec: &CommandSpec) -> bool {
        let reporter = Arc::clone(&self.reporter);
        self.runner.run(spec, &mut |line| reporter.line(line))
    }

    /// Emit a status line of our own.
    pub fn say(&self, line: &str) {
        self.reporter.line(line);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::deploy::policy::OutcomePolicy;
    use crate::deploy::test_helpers::{RecordingReporter, ScriptedRunner};

    #[test]
    fn exec_relays_lines_to_reporter() {
        let runner = Arc::new(ScriptedRunner::with_responses(vec![(
            true,
            vec!["a", "b"],
        )]));
        let reporter = Arc::new(RecordingReporter::default());
        let ctx = Context::new(PathBuf::from("/d"), runner.clone(), reporter.clone());

        assert!(ctx.exec(&CommandSpec::new("true")));
        assert_eq!(reporter.lines(), vec!["a", "b"]);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn builders_override_defaults() {
        let runner = Arc::new(ScriptedRunner::default());
        let reporter = Arc::new(RecordingReporter::default());
        let cancel = Cancellation::new();
        let ctx = Context::new(PathBuf::from("/d"), runner, reporter)
            .with_cancellation(cancel.clone())
            .with_host_keys(HostKeyPolicy::Strict)
            .with_windows_policy(WindowsPolicy {
                chrome: OutcomePolicy::Strict,
                extension_limit: 3,
            });
        cancel.cancel();
        assert!(ctx.cancel.is_cancelled());
        assert_eq!(ctx.host_keys, HostKeyPolicy::Strict);
        assert_eq!(ctx.windows.extension_limit, 3);
        assert!(format!("{ctx:?}").contains("<dyn Runner>"));
    }
}
