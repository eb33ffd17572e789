//! Command-line interface for registrar.
//!
//! This module provides the CLI structure for the `registrar` binary and the
//! text rendering its commands share.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BrowseCommand, CameraCommand, ConfigCommand, CropModeArg, EditCommand, ListCommand,
    PersonArgs, PhotoArgs, RegisterCommand,
};

use crate::logging::Verbosity;

/// registrar - Register people in a remote table
///
/// Validates person records, captures and crops a photo from an image
/// source, and creates, lists and edits records in the remote store.
#[derive(Debug, Parser)]
#[command(name = "registrar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new person
    Register(RegisterCommand),

    /// List people, one page at a time
    List(ListCommand),

    /// Edit an existing person
    Edit(EditCommand),

    /// Browse people interactively with live search
    Browse(BrowseCommand),

    /// Camera diagnostics
    #[command(subcommand)]
    Camera(CameraCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}
