//! Remote deployment to Unix-like hosts: mirror the tree, then run each
//! setup routine over ssh.
use super::{Context, RunReport, RunRequest, for_each_component};
use crate::config::catalog::is_setup_name;
use crate::config::machines::Machine;
use crate::remote::{REMOTE_DOTFILES_DIR, Transport};

/// Remote command that runs `setup_<component>` inside the mirrored tree.
#[must_use]
pub fn setup_command(component: &str) -> String {
    format!(
        "cd {REMOTE_DOTFILES_DIR} && source lib/utils.sh && source lib/os.sh \
         && source lib/packages.sh && detect_os && setup_{component}"
    )
}

/// Deploy the selected components to `machine`.
///
/// If mirroring the tree fails the report is exactly `{"sync": false}` and
/// no component is attempted.
#[must_use]
pub fn deploy(machine: &Machine, request: &RunRequest, ctx: &Context) -> RunReport {
    let transport = Transport::new(machine, ctx.host_keys);

    ctx.say(&format!("Syncing dotfiles to {}...", machine.destination()));
    if !ctx.exec(&transport.rsync(&ctx.root)) {
        ctx.say("Error: Failed to sync dotfiles");
        tracing::warn!("sync to {} failed", machine.name);
        return RunReport::sync_failed(request.target());
    }
    ctx.say("Sync complete");

    let mut report = RunReport::new(request.target());
    for_each_component(request, ctx, &mut report, |component| {
        if !is_setup_name(component) {
            ctx.say(&format!("Error: invalid component id '{component}'"));
            return false;
        }
        ctx.say(&format!("Installing {component}..."));
        ctx.exec(&transport.ssh(&setup_command(component)))
    });
    report
}
