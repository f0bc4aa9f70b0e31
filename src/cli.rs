//! Command-line interface definitions for the `snapwarden` binary.
//!
//! Kept free of crate dependencies so the build script can include it to
//! render the manual page.

use camino::Utf8PathBuf;
use clap::{Args, Parser};

/// Top-level CLI for the `snapwarden` binary.
#[derive(Debug, Parser)]
#[command(
    name = "snapwarden",
    about = "Create EBS snapshots for tagged volumes and prune expired ones",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Snapshot every volume tagged `Backup=true`.
    #[command(name = "create", about = "Snapshot every volume tagged Backup=true")]
    Create(EventArgs),
    /// Delete snapshots older than the retention window.
    #[command(
        name = "prune",
        about = "Delete an account's snapshots older than the retention window"
    )]
    Prune(EventArgs),
}

/// Trigger event source shared by both subcommands.
#[derive(Debug, Args)]
pub(crate) struct EventArgs {
    /// Trigger event as inline JSON, for example `{"account":"123","days":5}`.
    #[arg(long, value_name = "JSON", conflicts_with = "event_file")]
    pub(crate) event: Option<String>,
    /// Read the trigger event from a JSON file.
    #[arg(long, value_name = "PATH", conflicts_with = "event")]
    pub(crate) event_file: Option<Utf8PathBuf>,
}
