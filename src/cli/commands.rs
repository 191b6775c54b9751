//! CLI command definitions

use clap::Args;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline JSON file
    #[arg(short, long)]
    pub file: String,

    /// Time every device call and print a summary at shutdown
    #[arg(long)]
    pub profile: bool,

    /// Stop after at most this many iterations
    #[arg(long)]
    pub max_iterations: Option<u64>,
}

/// Validate a pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline JSON file
    #[arg(short, long)]
    pub file: String,
}
