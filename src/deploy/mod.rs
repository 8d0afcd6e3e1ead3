//! Installation sequencers and the run model they share.
//!
//! A caller builds an immutable [`RunRequest`], hands it to [`run`] together
//! with a [`Context`], and gets back a [`RunReport`]. While the run is in
//! progress the sequencer pushes [`RunEvent`]s through the context's
//! [`Reporter`]; the report is the only structured result.
//!
//! - **[`local`]**: run `setup_<component>` through the local shell
//! - **[`unix`]**: mirror the tree to a Unix host, then run each setup over ssh
//! - **[`windows`]**: run PowerShell bundles on a Windows host over ssh
pub mod cancel;
pub mod context;
pub mod local;
pub mod policy;
pub mod unix;
pub mod windows;

pub use cancel::Cancellation;
pub use context::Context;

use std::fmt;

use crossbeam_channel::Sender;

use crate::config::catalog::InstallMode;
use crate::config::machines::Machine;
use crate::error::ConfigError;
use crate::platform::Os;

/// Where a run installs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// This machine, through the local shell.
    Local,
    /// A Unix-like remote host.
    Unix(Machine),
    /// A Windows remote host.
    Windows(Machine),
}

impl Target {
    /// Classify `machine` by its `os` tag.
    #[must_use]
    pub fn remote(machine: Machine) -> Self {
        match machine.os() {
            Os::Windows => Self::Windows(machine),
            Os::Unix => Self::Unix(machine),
        }
    }

    /// The remote machine, if any.
    #[must_use]
    pub const fn machine(&self) -> Option<&Machine> {
        match self {
            Self::Local => None,
            Self::Unix(m) | Self::Windows(m) => Some(m),
        }
    }

    /// Returns `true` for Windows hosts.
    #[must_use]
    pub const fn is_windows(&self) -> bool {
        matches!(self, Self::Windows(_))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local machine"),
            Self::Unix(m) | Self::Windows(m) => write!(f, "{} ({})", m.name, m.destination()),
        }
    }
}

/// Everything a sequencer needs to know about one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    target: Target,
    components: Vec<String>,
    mode: InstallMode,
}

impl RunRequest {
    /// Build a request. Duplicate ids are dropped, keeping the first
    /// occurrence, so each component is invoked at most once.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySelection`] if no component was selected.
    pub fn new<I, S>(target: Target, components: I, mode: InstallMode) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selected: Vec<String> = Vec::new();
        for id in components {
            let id = id.into();
            if !selected.contains(&id) {
                selected.push(id);
            }
        }
        if selected.is_empty() {
            return Err(ConfigError::EmptySelection);
        }
        Ok(Self {
            target,
            components: selected,
            mode,
        })
    }

    /// Installation target.
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Selected component ids, in invocation order.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Install mode (only the local sequencer threads it through).
    #[must_use]
    pub const fn mode(&self) -> InstallMode {
        self.mode
    }
}

/// Key used when the remote Unix mirror step fails.
pub const SYNC_KEY: &str = "sync";

/// Ordered per-component outcomes of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    target: String,
    local: bool,
    results: Vec<(String, bool)>,
    cancelled: bool,
}

impl RunReport {
    /// Start an empty report for `target`.
    #[must_use]
    pub fn new(target: &Target) -> Self {
        Self {
            target: target.to_string(),
            local: matches!(target, Target::Local),
            results: Vec::new(),
            cancelled: false,
        }
    }

    /// The report of a run whose mirror step failed: exactly `{"sync": false}`.
    #[must_use]
    pub fn sync_failed(target: &Target) -> Self {
        let mut report = Self::new(target);
        report.record(SYNC_KEY, false);
        report
    }

    /// Record `component`'s outcome. A second record for the same id
    /// overwrites the first in place.
    pub fn record(&mut self, component: &str, success: bool) {
        match self.results.iter_mut().find(|(id, _)| id == component) {
            Some(entry) => entry.1 = success,
            None => self.results.push((component.to_string(), success)),
        }
    }

    /// Outcomes in invocation order.
    #[must_use]
    pub fn results(&self) -> &[(String, bool)] {
        &self.results
    }

    /// Outcome for `component`, if it was recorded.
    #[must_use]
    pub fn get(&self, component: &str) -> Option<bool> {
        self.results
            .iter()
            .find(|(id, _)| id == component)
            .map(|(_, ok)| *ok)
    }

    /// Recorded component ids in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|(id, _)| id.as_str())
    }

    /// Number of successful components.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, ok)| *ok).count()
    }

    /// Number of failed components.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Returns `true` when every recorded component succeeded.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|(_, ok)| *ok)
    }

    /// Returns `true` when the mirror step failed and nothing else ran.
    #[must_use]
    pub fn is_sync_failure(&self) -> bool {
        matches!(self.results.as_slice(), [(id, false)] if id == SYNC_KEY)
    }

    /// Mark the run as stopped early.
    pub const fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    /// Returns `true` if the run was stopped before every component ran.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Human-readable target label.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns `true` if the run installed on this machine.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.local
    }
}

/// Message sent from a running sequencer to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// About to start component `index` (zero-based) of `total`.
    Progress {
        /// Zero-based position in the selection.
        index: usize,
        /// Selection size.
        total: usize,
        /// Component id.
        component: String,
    },
    /// One line of output, relayed or generated.
    Line(String),
    /// A component finished.
    Finished {
        /// Component id.
        component: String,
        /// Recorded outcome.
        success: bool,
    },
}

/// Receives events from a running sequencer.
pub trait Reporter: Send + Sync {
    /// Called before each component is started.
    fn progress(&self, index: usize, total: usize, component: &str);

    /// Called once per output line.
    fn line(&self, line: &str);

    /// Called after each component with its recorded outcome.
    fn finished(&self, component: &str, success: bool);
}

/// [`Reporter`] that forwards every event into a channel.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: Sender<RunEvent>,
}

impl ChannelReporter {
    /// Wrap `tx`.
    #[must_use]
    pub const fn new(tx: Sender<RunEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: RunEvent) {
        // The receiver only disappears when the renderer has gone away.
        if self.tx.send(event).is_err() {
            tracing::debug!("run event dropped: receiver closed");
        }
    }
}

impl Reporter for ChannelReporter {
    fn progress(&self, index: usize, total: usize, component: &str) {
        self.send(RunEvent::Progress {
            index,
            total,
            component: component.to_string(),
        });
    }

    fn line(&self, line: &str) {
        self.send(RunEvent::Line(line.to_string()));
    }

    fn finished(&self, component: &str, success: bool) {
        self.send(RunEvent::Finished {
            component: component.to_string(),
            success,
        });
    }
}

/// Dispatch `request` to the sequencer for its target.
#[must_use]
pub fn run(request: &RunRequest, ctx: &Context) -> RunReport {
    tracing::debug!(
        "run: target={} components={:?} mode={}",
        request.target(),
        request.components(),
        request.mode()
    );
    match request.target() {
        Target::Local => local::install(request, ctx),
        Target::Unix(machine) => unix::deploy(machine, request, ctx),
        Target::Windows(machine) => windows::deploy(machine, request, ctx),
    }
}

/// Drive `unit` once per selected component, in order.
///
/// Emits progress before and the outcome after each component. Once the
/// context's token is cancelled no further unit is started; the remaining
/// components are recorded as failed and the report is marked cancelled.
pub(crate) fn for_each_component<F>(
    request: &RunRequest,
    ctx: &Context,
    report: &mut RunReport,
    mut unit: F,
) where
    F: FnMut(&str) -> bool,
{
    let total = request.components().len();
    for (index, component) in request.components().iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            if !report.is_cancelled() {
                ctx.say("Cancelled: remaining components skipped");
                report.mark_cancelled();
            }
            report.record(component, false);
            continue;
        }
        ctx.reporter.progress(index, total, component);
        let success = unit(component);
        ctx.reporter.finished(component, success);
        report.record(component, success);
    }
}

/// Test doubles for driving sequencers without spawning processes.
///
/// Compiled for unit tests and, through the `test-support` feature, for the
/// integration tests under `tests/`.
#[cfg(any(test, feature = "test-support"))]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::significant_drop_tightening
)]
pub mod test_helpers {
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use super::{Cancellation, Context, Reporter, RunEvent};
    use crate::exec::{CommandSpec, Runner};

    /// Runner that records every spec and replays queued outcomes.
    ///
    /// Once the queue is empty every call returns `fallback` with no output.
    #[derive(Debug, Default)]
    pub struct ScriptedRunner {
        responses: Mutex<VecDeque<(bool, Vec<String>)>>,
        fallback: bool,
        calls: Mutex<Vec<CommandSpec>>,
        cancel_on: Option<(usize, Cancellation)>,
    }

    impl ScriptedRunner {
        /// Every call succeeds.
        #[must_use]
        pub fn succeeding() -> Self {
            Self {
                fallback: true,
                ..Self::default()
            }
        }

        /// Every call fails.
        #[must_use]
        pub fn failing() -> Self {
            Self::default()
        }

        /// Replay `(success, lines)` pairs in order, then fail.
        #[must_use]
        pub fn with_responses(responses: Vec<(bool, Vec<&str>)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(ok, lines)| (ok, lines.into_iter().map(String::from).collect()))
                        .collect(),
                ),
                ..Self::default()
            }
        }

        /// Result once the queue is drained.
        #[must_use]
        pub fn then(mut self, fallback: bool) -> Self {
            self.fallback = fallback;
            self
        }

        /// Trigger `cancel` while serving call number `call` (zero-based).
        #[must_use]
        pub fn cancel_during(mut self, call: usize, cancel: Cancellation) -> Self {
            self.cancel_on = Some((call, cancel));
            self
        }

        /// Specs seen so far, in call order.
        #[must_use]
        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }

        /// The last argument of each call (the remote command for ssh).
        #[must_use]
        pub fn remote_commands(&self) -> Vec<String> {
            self.calls()
                .iter()
                .map(|c| c.last_arg().unwrap_or_default().to_string())
                .collect()
        }
    }

    impl Runner for ScriptedRunner {
        fn run(&self, spec: &CommandSpec, on_line: &mut dyn FnMut(&str)) -> bool {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(spec.clone());
                calls.len() - 1
            };
            if let Some((at, cancel)) = &self.cancel_on
                && *at == index
            {
                cancel.cancel();
            }
            let (ok, lines) = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| (self.fallback, Vec::new()));
            for line in &lines {
                on_line(line);
            }
            ok
        }
    }

    /// Reporter that keeps every event.
    #[derive(Debug, Default)]
    pub struct RecordingReporter {
        events: Mutex<Vec<RunEvent>>,
    }

    impl RecordingReporter {
        /// All events in order.
        #[must_use]
        pub fn events(&self) -> Vec<RunEvent> {
            self.events.lock().unwrap().clone()
        }

        /// Only the `Line` payloads.
        #[must_use]
        pub fn lines(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    RunEvent::Line(l) => Some(l),
                    _ => None,
                })
                .collect()
        }

        /// Only the `Progress` payloads as `(index, total, component)`.
        #[must_use]
        pub fn progress(&self) -> Vec<(usize, usize, String)> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    RunEvent::Progress {
                        index,
                        total,
                        component,
                    } => Some((index, total, component)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Reporter for RecordingReporter {
        fn progress(&self, index: usize, total: usize, component: &str) {
            self.events.lock().unwrap().push(RunEvent::Progress {
                index,
                total,
                component: component.to_string(),
            });
        }

        fn line(&self, line: &str) {
            self.events
                .lock()
                .unwrap()
                .push(RunEvent::Line(line.to_string()));
        }

        fn finished(&self, component: &str, success: bool) {
            self.events.lock().unwrap().push(RunEvent::Finished {
                component: component.to_string(),
                success,
            });
        }
    }

    /// Build a context rooted at `root` around `runner` with a recording
    /// reporter.
    #[must_use]
    pub fn make_context(
        root: impl Into<PathBuf>,
        runner: Arc<dyn Runner>,
    ) -> (Context, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::default());
        let ctx = Context::new(root.into(), runner, reporter.clone());
        (ctx, reporter)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::test_helpers::{ScriptedRunner, make_context};
    use super::*;

    fn machine(os: &str) -> Machine {
        Machine::new("box", "alice", "10.0.0.5", Some(os))
    }

    #[test]
    fn target_classifies_by_os_tag() {
        assert!(Target::remote(machine("Windows")).is_windows());
        assert!(matches!(Target::remote(machine("linux")), Target::Unix(_)));
        assert_eq!(Target::Local.machine(), None);
        assert_eq!(
            Target::remote(machine("mac")).to_string(),
            "box (alice@10.0.0.5)"
        );
    }

    #[test]
    fn request_rejects_empty_selection() {
        let err = RunRequest::new(Target::Local, Vec::<String>::new(), InstallMode::Full)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptySelection));
    }

    #[test]
    fn request_drops_duplicates_keeping_order() {
        let req = RunRequest::new(Target::Local, ["git", "zsh", "git", "vim"], InstallMode::Config)
            .unwrap();
        assert_eq!(req.components(), &["git", "zsh", "vim"]);
        assert_eq!(req.mode(), InstallMode::Config);
    }

    #[test]
    fn report_record_keeps_order_and_overwrites() {
        let mut report = RunReport::new(&Target::Local);
        report.record("zsh", true);
        report.record("git", false);
        report.record("zsh", false);
        assert_eq!(report.keys().collect::<Vec<_>>(), vec!["zsh", "git"]);
        assert_eq!(report.get("zsh"), Some(false));
        assert_eq!(report.failed(), 2);
        assert!(!report.all_ok());
        assert_eq!(report.target(), "local machine");
    }

    #[test]
    fn sync_failed_report_is_exactly_sync_false() {
        let report = RunReport::sync_failed(&Target::Local);
        assert_eq!(report.results(), &[(SYNC_KEY.to_string(), false)]);
        assert!(report.is_sync_failure());
    }

    #[test]
    fn channel_reporter_forwards_events() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let reporter = ChannelReporter::new(tx);
        reporter.progress(0, 2, "zsh");
        reporter.line("hello");
        reporter.finished("zsh", true);
        drop(reporter);
        let events: Vec<RunEvent> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                RunEvent::Progress {
                    index: 0,
                    total: 2,
                    component: "zsh".to_string()
                },
                RunEvent::Line("hello".to_string()),
                RunEvent::Finished {
                    component: "zsh".to_string(),
                    success: true
                },
            ]
        );
    }

    #[test]
    fn channel_reporter_tolerates_closed_receiver() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        ChannelReporter::new(tx).line("nobody listening");
    }

    #[test]
    fn cancellation_records_remaining_as_failed() {
        let cancel = Cancellation::new();
        let runner = Arc::new(ScriptedRunner::succeeding().cancel_during(0, cancel.clone()));
        let (ctx, reporter) = make_context("/d", runner.clone());
        let ctx = ctx.with_cancellation(cancel);
        let req = RunRequest::new(Target::Local, ["zsh", "vim", "git"], InstallMode::Full).unwrap();

        let report = run(&req, &ctx);

        assert_eq!(runner.calls().len(), 1);
        assert!(report.is_cancelled());
        assert_eq!(
            report.results(),
            &[
                ("zsh".to_string(), true),
                ("vim".to_string(), false),
                ("git".to_string(), false),
            ]
        );
        assert_eq!(reporter.progress().len(), 1);
        assert!(reporter.lines().iter().any(|l| l.starts_with("Cancelled")));
    }
}
