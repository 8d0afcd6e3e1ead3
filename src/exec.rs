//! Subprocess execution with real-time line streaming.
//!
//! A [`Runner`] spawns one process described by a [`CommandSpec`], forwards
//! its merged stdout/stderr to a line sink as the lines arrive, blocks until
//! the process exits, and reports success as `exit code == 0`.
use std::fmt;
use std::io::{BufRead as _, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::RunnerError;

/// Description of a single process invocation.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    cwd: Option<PathBuf>,
    missing_hint: Option<String>,
}

impl CommandSpec {
    /// Start a spec for `program` with no arguments.
    #[must_use]
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            ..Self::default()
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child only.
    #[must_use]
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Run the child in `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Message emitted instead of a generic error when `program` is not found.
    #[must_use]
    pub fn missing_hint(mut self, hint: &str) -> Self {
        self.missing_hint = Some(hint.to_string());
        self
    }

    /// Program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments, in order.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Working directory, if set.
    #[must_use]
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Value of an extra environment variable, if set.
    #[must_use]
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The last argument; for ssh invocations this is the remote command.
    #[must_use]
    pub fn last_arg(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    fn missing_message(&self) -> String {
        self.missing_hint
            .clone()
            .unwrap_or_else(|| format!("{} is not installed or not on PATH", self.program))
    }
}

// Environment values are left out: they carry credentials (SSHPASS).
impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field(
                "env",
                &self.env.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            )
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg.trim())?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Executes commands and streams their output.
///
/// Implementations must never panic or return early without calling back on
/// failure: a process that cannot be started is reported as one explanatory
/// line through `on_line` and a `false` result.
pub trait Runner: Send + Sync {
    /// Run `spec` to completion, invoking `on_line` for every output line in
    /// arrival order. Returns `true` iff the process exited with status 0.
    fn run(&self, spec: &CommandSpec, on_line: &mut dyn FnMut(&str)) -> bool;
}

/// [`Runner`] backed by real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, spec: &CommandSpec, on_line: &mut dyn FnMut(&str)) -> bool {
        tracing::debug!("exec: {spec}");
        match Self::spawn_streaming(spec, on_line) {
            Ok(status) => {
                tracing::debug!("{} exited with {status}", spec.program());
                status.success()
            }
            Err(e) => {
                on_line(&format!("Error: {e}"));
                false
            }
        }
    }
}

impl SystemRunner {
    fn spawn_streaming(
        spec: &CommandSpec,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<ExitStatus, RunnerError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).stdin(Stdio::null());
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &spec.cwd {
            // A missing cwd also surfaces as NotFound; keep it distinct from a
            // missing program.
            if !dir.is_dir() {
                return Err(RunnerError::Spawn {
                    program: spec.program.clone(),
                    source: std::io::Error::other(format!(
                        "working directory {} does not exist",
                        dir.display()
                    )),
                });
            }
            cmd.current_dir(dir);
        }

        // Both streams share one pipe so lines keep the order the child
        // wrote them in.
        let (reader, writer) = std::io::pipe().map_err(|source| RunnerError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        let stderr = writer.try_clone().map_err(|source| RunnerError::Spawn {
            program: spec.program.clone(),
            source,
        })?;
        cmd.stdout(writer).stderr(stderr);

        let spawned = cmd.spawn();
        // The command holds the parent's copies of the write end; EOF only
        // arrives once they are closed.
        drop(cmd);
        let mut child = spawned.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RunnerError::MissingDependency(spec.missing_message())
            } else {
                RunnerError::Spawn {
                    program: spec.program.clone(),
                    source,
                }
            }
        })?;

        for_each_line(reader, on_line);

        child.wait().map_err(|source| RunnerError::Wait {
            program: spec.program.clone(),
            source,
        })
    }
}

/// Feed every line of `source` to `on_line` until EOF, lossily decoded with
/// the line terminator removed.
fn for_each_line(source: impl Read, on_line: &mut dyn FnMut(&str)) {
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(['\n', '\r']));
            }
        }
    }
}

/// Check if a program is available on PATH.
#[must_use]
pub fn which(program: &str) -> bool {
    which::which(program).is_ok()
}
