//! CLI command definitions and dispatch.

pub mod images;
pub mod pull;
pub mod run;

use clap::{Parser, Subcommand};

/// iza — minimal container runtime.
#[derive(Parser, Debug)]
#[command(name = "iza", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download an image and register it in the local catalog.
    Pull(pull::PullArgs),
    /// List locally available images.
    Images(images::ImagesArgs),
    /// Run a command inside an isolated container.
    Run(run::RunArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Pull(args) => pull::execute(args),
        Command::Images(args) => images::execute(args),
        Command::Run(args) => run::execute(args),
    }
}
