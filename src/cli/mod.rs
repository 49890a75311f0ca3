//! [Command-line interface](Cli) (CLI) of the main binary.

use crate::{NormalizeArgs, RunArgs, SamplesArgs};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

// ----------------------------------------------------------------------------
// CLI Entry Point
// ----------------------------------------------------------------------------

/// The command-line interface (CLI).
/// ---
/// The CLI is intended for parsing user input from the command-line in the main function. This is achieved with the `parse` function, which parses the command line arguments from [`std::env::args`](https://doc.rust-lang.org/std/env/fn.args.html).
/// ```no_run
/// use clap::Parser;
/// let args = lcenv::Cli::parse();
/// ```
/// Here is a manual example of setting the command-line input:
/// ```rust
/// use clap::Parser;
/// use lcenv::{Cli, cli::Command};
///
/// let input = ["lcenv", "environment", "--input", "metadata.tsv", "--output-dir", "env", "--exclude-recombinants"];
/// let args = Cli::parse_from(input);
/// let Command::Environment(args) = args.command else { panic!("expected environment") };
/// assert!(args.exclude_recombinants);
/// assert_eq!(args.min_genome_count, 10);
/// ```
#[derive(Debug, Deserialize, Parser, Serialize)]
#[clap(name = "lcenv", author, version)]
#[clap(about = "lcenv normalizes genomic mutations and characterizes lineages for recombination detection.")]
pub struct Cli {
    #[clap(subcommand)]
    /// Pass CLI arguments to a particular [Command].
    #[clap(help = "Set the command.")]
    pub command: Command,

    /// Set the output [Verbosity] level.
    #[clap(short = 'v', long)]
    #[clap(value_enum, default_value_t = Verbosity::default())]
    #[clap(hide_possible_values = false)]
    #[clap(global = true)]
    #[clap(help = "Set the output verbosity level.")]
    pub verbosity: Verbosity,
}

/// CLI [commands](#variants).
#[derive(Debug, Deserialize, Serialize, Subcommand)]
pub enum Command {
    /// Rewrite raw mutations into canonical notation.
    ///
    /// ```rust
    /// use lcenv::{Cli, cli::Command};
    /// use clap::Parser;
    /// let input = ["lcenv", "normalize", "--input", "metadata.tsv", "--output", "normalized.tsv", "--format", "atomic-list"];
    /// let args = Cli::parse_from(input);
    /// assert!(matches!(args.command, Command::Normalize(_)));
    /// ```
    #[clap(about = "Normalize mutations into canonical notation.")]
    Normalize(NormalizeArgs),
    #[clap(about = "Build the lineage environment.")]
    Environment(RunArgs),
    #[clap(about = "Write per-lineage sample files.")]
    Samples(SamplesArgs),
}

// -----------------------------------------------------------------------------
// Verbosity
// -----------------------------------------------------------------------------

/// The output verbosity level.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ValueEnum)]
pub enum Verbosity {
    #[default]
    Info,
    Warn,
    Debug,
    Error,
}

impl Display for Verbosity {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        // lowercase for RUST_LOG
        let lowercase = format!("{:?}", self).to_lowercase();
        write!(f, "{lowercase}")
    }
}
