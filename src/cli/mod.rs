//! Command-line interface

pub mod commands;

use clap::{Parser, Subcommand};
use commands::{RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Real-time signal-processing pipeline runtime
#[derive(Debug, Parser, Clone)]
#[command(name = "loopline")]
#[command(version = "0.1.0")]
#[command(about = "Run device pipelines in a real-time control loop", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline until done or interrupted
    Run(RunCommand),

    /// Check a pipeline configuration without starting the loop
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_profile_and_limit() {
        let cli = Cli::try_parse_from([
            "loopline",
            "run",
            "--file",
            "loop.json",
            "--profile",
            "--max-iterations",
            "100",
        ])
        .unwrap();
        match cli.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.file, "loop.json");
                assert!(cmd.profile);
                assert_eq!(cmd.max_iterations, Some(100));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_validate_with_global_verbose() {
        let cli = Cli::try_parse_from(["loopline", "-v", "validate", "-f", "loop.json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Validate(_)));
    }
}
