//! Command: deploy components to a machine from `machines.yaml`.
use anyhow::Result;

use crate::cli::{DeployOpts, GlobalOpts};
use crate::config::catalog::InstallMode;
use crate::deploy::RunRequest;
use crate::logging::Logger;

use super::{Session, ensure_success, execute, select_components};

/// Run the deploy command.
///
/// # Errors
///
/// Returns an error if the machine is not configured, the selection is
/// invalid, the sync fails, or any component fails.
pub fn run(global: &GlobalOpts, opts: &DeployOpts, log: &Logger) -> Result<()> {
    let session = Session::init(global, log)?;
    let target = session.remote_target(&opts.machine)?;
    if target.is_windows() && opts.selection.profile.is_some() {
        log.warn("profiles apply to Unix targets; using the Windows component list");
    }
    let components = select_components(&target, &opts.selection)?;

    log.stage(&format!("Deploying to {target}"));
    log.info(&format!("components: {}", components.join(", ")));

    let request = RunRequest::new(target, components, InstallMode::Full)?;
    let report = execute(&request, &session, log)?;
    log.print_report(&report);
    ensure_success(&report)
}
