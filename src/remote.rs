//! Command builders for reaching a remote machine over ssh.
//!
//! Every remote invocation (ssh, rsync, scp) goes through [`Transport`] so
//! that the host-key policy and password injection are applied uniformly.
//! When a machine has a password, the program is wrapped in `sshpass -e`
//! and the password travels in the child's `SSHPASS` environment variable,
//! never on the command line.
use std::path::Path;

use crate::config::machines::Machine;
use crate::exec::{self, CommandSpec};
use crate::platform::Os;

/// Emitted when the password helper is missing.
pub const SSHPASS_HINT: &str =
    "sshpass is not installed (required for password authentication). Run: brew install sshpass";

/// Remote directory the dotfiles tree is mirrored to.
pub const REMOTE_DOTFILES_DIR: &str = "~/dotfiles";

/// How ssh treats unknown or changed host keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostKeyPolicy {
    /// Never block on first contact or a changed key, and do not record keys.
    ///
    /// Suitable for throwaway machines on a trusted network only.
    #[default]
    Relaxed,
    /// Use ssh's own configuration and `known_hosts`.
    Strict,
}

impl HostKeyPolicy {
    /// `-o` option values contributed by this policy.
    #[must_use]
    pub const fn ssh_options(self) -> &'static [&'static str] {
        match self {
            Self::Relaxed => &["StrictHostKeyChecking=no", "UserKnownHostsFile=/dev/null"],
            Self::Strict => &[],
        }
    }
}

/// Builds [`CommandSpec`]s that reach one machine.
#[derive(Debug, Clone, Copy)]
pub struct Transport<'a> {
    machine: &'a Machine,
    host_keys: HostKeyPolicy,
}

impl<'a> Transport<'a> {
    /// Create a transport for `machine`.
    #[must_use]
    pub const fn new(machine: &'a Machine, host_keys: HostKeyPolicy) -> Self {
        Self { machine, host_keys }
    }

    /// `-o` options shared by ssh and scp.
    fn options(&self) -> Vec<String> {
        let mut opts: Vec<&str> = self.host_keys.ssh_options().to_vec();
        // Without a password there is nobody to answer a prompt.
        if self.machine.password().is_none() {
            opts.push("BatchMode=yes");
        }
        opts.into_iter()
            .flat_map(|o| ["-o".to_string(), o.to_string()])
            .collect()
    }

    /// Wrap `program` in `sshpass -e` when a password is configured.
    fn wrap(&self, program: &str, args: Vec<String>) -> CommandSpec {
        match self.machine.password() {
            Some(password) => CommandSpec::new("sshpass")
                .arg("-e")
                .arg(program)
                .args(args)
                .env("SSHPASS", password)
                .missing_hint(SSHPASS_HINT),
            None => CommandSpec::new(program).args(args).missing_hint(&format!(
                "{program} is not installed (required for remote deployment)"
            )),
        }
    }

    /// Run `command` on the remote host through its login shell.
    #[must_use]
    pub fn ssh(&self, command: &str) -> CommandSpec {
        let mut args = self.options();
        args.push(self.machine.destination());
        args.push(command.to_string());
        self.wrap("ssh", args)
    }

    /// Run a PowerShell `script` on a Windows host.
    #[must_use]
    pub fn powershell(&self, script: &str) -> CommandSpec {
        self.ssh(&format!("powershell -Command \"{script}\""))
    }

    /// Mirror `root` into [`REMOTE_DOTFILES_DIR`], skipping `.git`.
    #[must_use]
    pub fn rsync(&self, root: &Path) -> CommandSpec {
        let mut args: Vec<String> = ["-avz", "--exclude", ".git"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut remote_shell = vec!["ssh".to_string()];
        remote_shell.extend(self.options());
        if remote_shell.len() > 1 {
            args.push("-e".to_string());
            args.push(remote_shell.join(" "));
        }
        args.push(format!("{}/", root.display()));
        args.push(format!(
            "{}:{REMOTE_DOTFILES_DIR}/",
            self.machine.destination()
        ));
        self.wrap("rsync", args)
    }

    /// Copy `local` to `remote_path` on the host.
    #[must_use]
    pub fn scp(&self, local: &Path, remote_path: &str) -> CommandSpec {
        let mut args = self.options();
        args.push(local.display().to_string());
        args.push(format!("{}:{remote_path}", self.machine.destination()));
        self.wrap("scp", args)
    }
}

/// Local programs a deployment to `machine` invokes.
#[must_use]
pub fn required_programs(machine: &Machine) -> Vec<&'static str> {
    let mut programs = match machine.os() {
        Os::Unix => vec!["rsync", "ssh"],
        Os::Windows => vec!["ssh", "scp"],
    };
    if machine.password().is_some() {
        programs.insert(0, "sshpass");
    }
    programs
}

/// The subset of [`required_programs`] that is not on `PATH`.
#[must_use]
pub fn missing_programs(machine: &Machine) -> Vec<&'static str> {
    required_programs(machine)
        .into_iter()
        .filter(|program| !exec::which(program))
        .collect()
}
