//! Dotfiles installer front end.
//!
//! Lets a user pick configuration components (shell, editor, git, ...) and a
//! target, then drives the repository's setup scripts on this machine or on
//! a remote host reached over ssh, streaming their output as it is produced.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: dotfiles root, `machines.yaml` registry, component catalog
//! - **[`exec`]** and **[`remote`]**: subprocess runner and ssh/rsync/scp command builders
//! - **[`deploy`]**: local, remote Unix and remote Windows sequencers
//! - **[`commands`]**: interactive menu and scripted subcommands
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod remote;
