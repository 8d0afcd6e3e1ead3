//! Command: list configured remote machines.
use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::config::machines::{MACHINES_FILE, Registry};
use crate::logging::Logger;

use super::resolve_root;

/// Run the machines command.
///
/// # Errors
///
/// Returns an error if the dotfiles root cannot be determined.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let root = resolve_root(global)?;
    let config = Config::load(&root);
    if config.machines.is_empty() {
        log.warn(&format!(
            "No remote machines configured in {}",
            root.join(MACHINES_FILE).display()
        ));
        return Ok(());
    }
    log.stage(&format!("{} remote machine(s)", config.machines.len()));
    for line in listing(&config.machines) {
        log.info(&line);
    }
    Ok(())
}

/// One display line per machine, in file order.
fn listing(machines: &Registry) -> Vec<String> {
    machines
        .iter()
        .map(|m| {
            if m.password().is_some() {
                format!("{m} [password]")
            } else {
                m.to_string()
            }
        })
        .collect()
}
