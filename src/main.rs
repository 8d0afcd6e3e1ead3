//! Command-line entry point for the dotfiles installer.
use anyhow::Result;
use clap::Parser;

use dotfiles_installer::cli::{Cli, Command};
use dotfiles_installer::{commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    let name = match &args.command {
        None => "interactive",
        Some(Command::Install(_)) => "install",
        Some(Command::Deploy(_)) => "deploy",
        Some(Command::Machines) => "machines",
        Some(Command::Version) => "version",
    };
    logging::init_subscriber(args.verbose, name);
    let log = logging::Logger::new(name);

    match &args.command {
        None => commands::interactive::run(&args.global, &log),
        Some(Command::Install(opts)) => commands::install::run(&args.global, opts, &log),
        Some(Command::Deploy(opts)) => commands::deploy::run(&args.global, opts, &log),
        Some(Command::Machines) => commands::machines::run(&args.global, &log),
        Some(Command::Version) => commands::version::run(),
    }
}
