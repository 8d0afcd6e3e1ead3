//! Console logger and run-report rendering.
use std::path::PathBuf;

use super::subscriber::{OUTPUT_TARGET, SEPARATOR_TARGET, STAGE_TARGET};
use super::utils::{log_file_path, progress_bar};
use crate::deploy::{RunEvent, RunReport};

/// Width of the progress bar shown in component headers.
const BAR_WIDTH: usize = 20;

/// Structured logger for installer runs.
///
/// All messages are always written to a persistent log file at
/// `$XDG_CACHE_HOME/dotfiles/<command>.log` (default `~/.cache/dotfiles/<command>.log`)
/// with timestamps and ANSI codes stripped, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run report.  The log file
    /// itself is created by [`init_subscriber`](super::subscriber::init_subscriber);
    /// this constructor does not write to it.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Print an empty separator line on the console.
    pub fn blank(&self) {
        tracing::info!(target: SEPARATOR_TARGET, "");
    }

    /// Relay one line of installer output.
    pub fn output(&self, line: &str) {
        tracing::info!(target: OUTPUT_TARGET, "{line}");
    }

    /// Render one event from a running sequencer.
    pub fn event(&self, event: &RunEvent) {
        match event {
            RunEvent::Progress {
                index,
                total,
                component,
            } => self.stage(&format!(
                "[{}/{total}] {} {component}",
                index + 1,
                progress_bar(*index, *total, BAR_WIDTH)
            )),
            RunEvent::Line(line) => self.output(line),
            RunEvent::Finished { component, success } => {
                if *success {
                    self.info(&format!("\x1b[32m✓ {component} complete\x1b[0m"));
                } else {
                    self.error(&format!("{component} failed"));
                }
            }
        }
    }

    /// Print the completion summary for `report`.
    pub fn print_report(&self, report: &RunReport) {
        self.blank();
        self.stage("Installation Complete");
        self.info(&format!("target: {}", report.target()));

        if report.is_sync_failure() {
            self.error("sync failed: no component was installed");
        } else {
            for (component, success) in report.results() {
                if *success {
                    self.info(&format!("\x1b[32m✓ {component}\x1b[0m"));
                } else {
                    self.info(&format!("\x1b[31m✗ {component}\x1b[0m"));
                }
            }
        }

        self.blank();
        self.info(&format!(
            "{} components: \x1b[32m{} ok\x1b[0m, \x1b[31m{} failed\x1b[0m",
            report.results().len(),
            report.succeeded(),
            report.failed()
        ));
        if report.is_cancelled() {
            self.warn("run was cancelled before every component ran");
        }
        if report.is_local() && report.all_ok() {
            self.info("next: restart your shell or run: exec zsh");
        }
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::deploy::Target;
    use crate::logging::isolated_logger;
    use std::fs;

    fn read_log(log: &Logger) -> String {
        fs::read_to_string(log.log_path().expect("log path")).unwrap()
    }

    #[test]
    fn log_file_is_created() {
        let (log, _tmp, _guard) = isolated_logger();
        let path = log.log_path().expect("log path should exist");
        assert!(path.exists(), "log file should be created by the file layer");
    }

    #[test]
    fn debug_always_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("debug-marker-{}", std::process::id());
        log.debug(&marker);
        assert!(read_log(&log).contains(&marker));
    }

    #[test]
    fn stage_written_to_file_with_arrow() {
        let (log, _tmp, _guard) = isolated_logger();
        log.stage("Deploying");
        assert!(read_log(&log).contains("==> Deploying"));
    }

    #[test]
    fn output_written_with_gutter_and_ansi_stripped() {
        let (log, _tmp, _guard) = isolated_logger();
        log.output("\x1b[32minstalled zinit\x1b[0m");
        assert!(read_log(&log).contains("│ installed zinit"));
    }

    #[test]
    fn warn_and_error_are_tagged() {
        let (log, _tmp, _guard) = isolated_logger();
        log.warn("careful");
        log.error("broken");
        let contents = read_log(&log);
        assert!(contents.contains("[warn] careful"));
        assert!(contents.contains("[error] broken"));
    }

    #[test]
    fn progress_event_renders_position() {
        let (log, _tmp, _guard) = isolated_logger();
        log.event(&RunEvent::Progress {
            index: 1,
            total: 4,
            component: "vim".to_string(),
        });
        log.event(&RunEvent::Finished {
            component: "vim".to_string(),
            success: false,
        });
        let contents = read_log(&log);
        assert!(contents.contains("==> [2/4]"));
        assert!(contents.contains("vim"));
        assert!(contents.contains("[error] vim failed"));
    }

    #[test]
    fn report_lists_every_component() {
        let (log, _tmp, _guard) = isolated_logger();
        let mut report = RunReport::new(&Target::Local);
        report.record("zsh", true);
        report.record("git", false);
        log.print_report(&report);
        let contents = read_log(&log);
        assert!(contents.contains("✓ zsh"));
        assert!(contents.contains("✗ git"));
        assert!(contents.contains("2 components: 1 ok, 1 failed"));
        assert!(contents.contains("target: local machine"));
    }

    #[test]
    fn separators_stay_out_of_the_log_file() {
        let (log, _tmp, _guard) = isolated_logger();
        log.info("before");
        log.blank();
        log.info("after");
        let contents = read_log(&log);
        let lines: Vec<&str> = contents.lines().skip(1).collect();
        assert_eq!(lines.len(), 2, "{contents}");
        assert!(lines[0].ends_with("before"));
        assert!(lines[1].ends_with("after"));
    }

    #[test]
    fn report_explains_sync_failure() {
        let (log, _tmp, _guard) = isolated_logger();
        log.print_report(&RunReport::sync_failed(&Target::Local));
        assert!(read_log(&log).contains("sync failed"));
    }
}
