//! Command-line arguments

use clap::Parser;
use scenarios::DEFAULT_SEED;

/// Runs scenarios on a simulated single-threaded event loop and prints what
/// they log, in the order it happened.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "promise-lab", version)]
pub struct Cli {
    /// Scenarios to run, in the order given
    #[arg(value_name = "SCENARIO", conflicts_with = "chapter")]
    pub scenarios: Vec<String>,

    /// List every scenario, grouped by chapter
    #[arg(short, long, conflicts_with_all = ["scenarios", "chapter"])]
    pub list: bool,

    /// Run every scenario of one chapter
    #[arg(short, long, value_name = "NAME")]
    pub chapter: Option<String>,

    /// Seed for the simulated network latency
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Print the trace as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Prefix each line with the virtual time it was written at
    #[arg(short, long)]
    pub timestamps: bool,
}
