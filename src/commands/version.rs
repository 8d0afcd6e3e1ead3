//! Command: print version information.
use std::io::Write as _;

use anyhow::Result;

use crate::platform::Platform;

/// Version string embedded at build time, falling back to the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DOTFILES_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the installer version and host platform to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run() -> Result<()> {
    writeln!(std::io::stdout().lock(), "{}", banner(&Platform::detect()))?;
    Ok(())
}

fn banner(platform: &Platform) -> String {
    format!(
        "dotfiles-installer {} ({}, {})",
        version(),
        platform.name,
        platform.arch
    )
}
