//! Command: install components on this machine.
use anyhow::Result;

use crate::cli::{GlobalOpts, InstallOpts};
use crate::deploy::{RunRequest, Target};
use crate::logging::Logger;

use super::{Session, ensure_success, execute, select_components};

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the root cannot be resolved, the selection is invalid,
/// or any component fails.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    let session = Session::init(global, log)?;
    let components = select_components(&Target::Local, &opts.selection)?;

    log.stage("Installing on local machine");
    log.info(&format!("platform: {}", session.platform.name));
    log.info(&format!("components: {}", components.join(", ")));
    log.info(&format!("mode: {}", opts.mode.title()));

    let request = RunRequest::new(Target::Local, components, opts.mode)?;
    let report = execute(&request, &session, log)?;
    log.print_report(&report);
    ensure_success(&report)
}
