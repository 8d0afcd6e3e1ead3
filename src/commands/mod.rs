//! Subcommand implementations and the setup they share.
pub mod deploy;
pub mod install;
pub mod interactive;
pub mod machines;
pub mod version;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};

use crate::cli::{GlobalOpts, SelectionOpts};
use crate::config::Config;
use crate::config::catalog::{self, Profile};
use crate::deploy::{Cancellation, ChannelReporter, Context, RunReport, RunRequest, Target};
use crate::error::ConfigError;
use crate::exec::{Runner, SystemRunner};
use crate::logging::Logger;
use crate::platform::Platform;

/// Exit status used when the user aborts with Ctrl-C outside a run.
const INTERRUPTED_EXIT: i32 = 130;

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates platform detection, root resolution and registry loading so
/// that each command does not have to repeat the boilerplate.
pub struct Session {
    /// Machine the installer runs on.
    pub platform: Platform,
    /// Resolved root and remote registry.
    pub config: Config,
    global: GlobalOpts,
    runner: Arc<dyn Runner>,
    interrupt: Interrupt,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("platform", &self.platform)
            .field("config", &self.config)
            .field("global", &self.global)
            .field("interrupt", &self.interrupt)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Detect the platform, resolve the root, load `machines.yaml` and arm
    /// the Ctrl-C handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be determined or the
    /// signal handler cannot be installed.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let platform = Platform::detect();
        let root = resolve_root(global)?;
        log.debug(&format!("root: {}", root.display()));
        log.debug(&format!("platform: {} ({})", platform.name, platform.arch));

        let config = Config::load(&root);
        log.debug(&format!("{} remote machine(s)", config.machines.len()));

        let interrupt = Interrupt::install()?;
        Ok(Self::new(
            platform,
            config,
            global,
            Arc::new(SystemRunner),
            interrupt,
        ))
    }

    /// Assemble a session from already-resolved parts.
    #[must_use]
    pub fn new(
        platform: Platform,
        config: Config,
        global: &GlobalOpts,
        runner: Arc<dyn Runner>,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            platform,
            config,
            global: global.clone(),
            runner,
            interrupt,
        }
    }

    /// Look up `name` in the registry and classify it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMachine`] if `name` is not configured.
    pub fn remote_target(&self, name: &str) -> Result<Target, ConfigError> {
        self.config
            .machines
            .get(name)
            .cloned()
            .map(Target::remote)
            .ok_or_else(|| ConfigError::UnknownMachine(name.to_string()))
    }

    fn context(&self, reporter: ChannelReporter, cancel: Cancellation) -> Context {
        Context::new(
            self.config.root.clone(),
            Arc::clone(&self.runner),
            Arc::new(reporter),
        )
        .with_cancellation(cancel)
        .with_host_keys(self.global.host_key_policy())
        .with_windows_policy(self.global.windows_policy())
    }
}

/// Ctrl-C handling for the whole process.
///
/// While a run is armed the first press cancels it: the component in flight
/// finishes and nothing further is scheduled. Any other press exits with
/// status 130.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    armed: Arc<AtomicBool>,
    cancel: Cancellation,
}

impl Interrupt {
    /// Install the process-wide handler.
    ///
    /// # Errors
    ///
    /// Returns an error if a handler is already installed.
    pub fn install() -> Result<Self> {
        let interrupt = Self::default();
        let handler = interrupt.clone();
        ctrlc::set_handler(move || {
            if !handler.interrupt_run() {
                std::process::exit(INTERRUPTED_EXIT);
            }
        })
        .context("failed to install Ctrl-C handler")?;
        Ok(interrupt)
    }

    /// Prepare a fresh token for the next run.
    #[must_use]
    pub fn arm(&self) -> Cancellation {
        self.cancel.reset();
        self.armed.store(true, Ordering::SeqCst);
        self.cancel.clone()
    }

    /// Leave run mode.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    /// Cancel the armed run. Returns `false` when no run was armed.
    fn interrupt_run(&self) -> bool {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.cancel.cancel();
            true
        } else {
            false
        }
    }
}

/// Run `request` on a worker thread while this thread renders its events.
///
/// Remote runs first warn about local tools (`ssh`, `rsync`, `scp`,
/// `sshpass`) missing from `PATH`.
///
/// # Errors
///
/// Returns an error if the worker thread panics.
pub fn execute(request: &RunRequest, session: &Session, log: &Logger) -> Result<RunReport> {
    if let Some(machine) = request.target().machine() {
        for program in crate::remote::missing_programs(machine) {
            log.warn(&format!(
                "{program} is not installed or not on PATH; steps that need it will fail"
            ));
        }
    }

    let (tx, rx) = crossbeam_channel::unbounded();
    let ctx = session.context(ChannelReporter::new(tx), session.interrupt.arm());

    let joined = std::thread::scope(|s| {
        let worker = s.spawn(move || crate::deploy::run(request, &ctx));
        // The channel closes once the worker drops its context.
        for event in &rx {
            log.event(&event);
        }
        worker.join()
    });
    session.interrupt.disarm();

    joined.map_err(|_| anyhow::anyhow!("installer worker thread panicked"))
}

/// Fail the command when any component did not succeed.
///
/// # Errors
///
/// Returns an error describing the failed run.
pub fn ensure_success(report: &RunReport) -> Result<()> {
    if report.is_sync_failure() {
        anyhow::bail!("failed to sync dotfiles to {}", report.target());
    }
    if report.is_cancelled() {
        anyhow::bail!("installation cancelled");
    }
    if !report.all_ok() {
        anyhow::bail!(
            "{} of {} components failed",
            report.failed(),
            report.results().len()
        );
    }
    Ok(())
}

/// Resolve the components to run on `target` from CLI flags.
///
/// Explicit `--components` are checked against the target's catalog. Without
/// them a Unix target gets `--profile` (default `full`) and a Windows target
/// gets its whole catalog.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownComponent`] for an id outside the catalog.
pub fn select_components(
    target: &Target,
    selection: &SelectionOpts,
) -> Result<Vec<&'static str>, ConfigError> {
    let lookup = if target.is_windows() {
        catalog::find_windows
    } else {
        catalog::find
    };
    if !selection.components.is_empty() {
        return selection
            .components
            .iter()
            .map(|id| {
                lookup(id.trim())
                    .map(|c| c.id)
                    .ok_or_else(|| ConfigError::UnknownComponent(id.clone()))
            })
            .collect();
    }
    if target.is_windows() {
        return Ok(catalog::WINDOWS_COMPONENTS.iter().map(|c| c.id).collect());
    }
    Ok(selection.profile.unwrap_or(Profile::Full).components().to_vec())
}

/// Resolve the dotfiles root directory.
///
/// # Errors
///
/// Returns an error if the root directory cannot be determined from the
/// `--root` flag, the `DOTFILES_ROOT` environment variable, the binary
/// location, or the current working directory.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    if let Some(ref root) = global.root {
        return Ok(root.clone());
    }

    if let Ok(root) = std::env::var("DOTFILES_ROOT") {
        return Ok(PathBuf::from(root));
    }

    // target/release/ or bin/ inside the repository
    if let Ok(exe) = std::env::current_exe() {
        for candidate in exe.ancestors().skip(1).take(4) {
            if Config::is_root(candidate) {
                return Ok(std::fs::canonicalize(candidate)?);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    if Config::is_root(&cwd) {
        return Ok(cwd);
    }

    anyhow::bail!("cannot determine dotfiles root. Use --root or set DOTFILES_ROOT env var");
}
