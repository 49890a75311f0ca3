//! Build the lineage environment from a metadata table.

use crate::corpus::{Corpus, Statistics};
use crate::environment::{Artifact, Attributes, Environment, EnvironmentBuilder, WITH_RECOMBINANTS_SUFFIX};
use crate::normalize::{normalize_table, write_table, SourceFormat};
use crate::utils::{create_parent_dir, Cancellable, CancellationToken};
#[cfg(feature = "cli")]
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use lcenv_table::Table;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

/// File name of the normalized metadata written next to the artifacts.
pub const NORMALIZED_TABLE: &str = "mutations.tsv";
/// File name of the effective run arguments.
pub const RUN_ARGS: &str = "run_args.json";
/// File name of the environment attributes.
pub const ATTRIBUTES: &str = "attributes.json";

/// The environments of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct Environments {
    /// Built from the whole corpus.
    pub full: Environment,
    /// Built from the corpus without recombinant lineages, if requested.
    pub without_recombinants: Option<Environment>,
}

impl Environments {
    /// The environment written under the plain artifact names.
    pub fn primary(&self) -> &Environment {
        self.without_recombinants.as_ref().unwrap_or(&self.full)
    }

    /// Write the artifacts.
    ///
    /// Global probabilities and lineage quality always describe the full corpus. When a
    /// recombinant-free environment exists, its matrices take the plain names and the full
    /// matrices are written with the `_with_X` suffix.
    pub fn write<P>(&self, dir: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        match &self.without_recombinants {
            None => self.full.write_all(dir)?,
            Some(without) => {
                let (matrices, global): (Vec<_>, Vec<_>) = Artifact::iter().partition(|a| a.is_matrix());
                self.full.write(dir, &global, "")?;
                self.full.write(dir, &matrices, WITH_RECOMBINANTS_SUFFIX)?;
                without.write(dir, &matrices, "")?;
            }
        }
        Ok(())
    }
}

/// Normalize a metadata table, build the environment, and write its artifacts.
pub fn run(args: &RunArgs) -> Result<Environments, Report> {
    run_with(args, &CancellationToken::new())
}

/// Same as [`run`], stopping early if `cancel` is triggered.
///
/// Nothing is written if the environment is empty.
pub fn run_with(args: &RunArgs, cancel: &CancellationToken) -> Result<Environments, Report> {
    if !(0.0..=1.0).contains(&args.char_threshold) {
        return Err(eyre!("Characteristic threshold must be between 0 and 1: {}", args.char_threshold))
            .suggestion("Try the default of 0.75.");
    }

    // ------------------------------------------------------------------------
    // Normalize

    info!("Reading input table: {:?}", args.input);
    let table = Table::read(&args.input)?;
    let table = normalize_table(table, args.format, cancel)?;

    // ------------------------------------------------------------------------
    // Statistics

    let corpus = Corpus::from_table(&table)?;
    info!("Computing statistics over {} genome(s).", corpus.len());
    let stats = Statistics::par_compute(&corpus, cancel)?;

    let builder = EnvironmentBuilder::new(args.min_genome_count, args.char_threshold);
    let full = builder.build(&stats);
    cancel.check()?;

    let without_recombinants = match args.exclude_recombinants {
        true => {
            info!("Computing statistics without recombinant lineages.");
            let stats = Statistics::par_compute(&corpus.without_recombinants(), cancel)?;
            Some(builder.build(&stats))
        }
        false => None,
    };
    let environments = Environments { full, without_recombinants };
    environments.primary().check()?;

    // ------------------------------------------------------------------------
    // Export

    let dir = &args.output_dir;
    write_table(&table, &dir.join(NORMALIZED_TABLE))?;
    environments.write(dir)?;

    let attributes = Attributes::from_environment(environments.primary(), args.exclude_recombinants);
    attributes.write(&dir.join(ATTRIBUTES))?;
    args.write(&dir.join(RUN_ARGS))?;
    info!("Environment written to: {dir:?}");

    Ok(environments)
}

// ----------------------------------------------------------------------------
// RunArgs
// ----------------------------------------------------------------------------

/// Build the lineage environment from a metadata table.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[serde(default)]
pub struct RunArgs {
    /// Input metadata table (tsv, csv, optionally .zst compressed).
    #[cfg_attr(feature = "cli", clap(short = 'i', long, required = true))]
    #[serde(skip_serializing_if = "RunArgs::is_default_path")]
    pub input: PathBuf,

    /// Output directory.
    ///
    /// If the directory does not exist, it will be created.
    #[cfg_attr(feature = "cli", clap(short = 'o', long, required = true))]
    #[serde(skip_serializing_if = "RunArgs::is_default_path")]
    pub output_dir: PathBuf,

    /// Minimum number of genomes for a lineage to be characterized.
    #[cfg_attr(feature = "cli", arg(short = 'm', long, default_value_t = RunArgs::default().min_genome_count))]
    pub min_genome_count: usize,

    /// Minimum frequency for a mutation to be characteristic of a lineage.
    #[cfg_attr(feature = "cli", arg(short = 'c', long, default_value_t = RunArgs::default().char_threshold))]
    pub char_threshold: f64,

    /// Also build the lineage matrices without recombinant lineages.
    ///
    /// The recombinant-free matrices take the plain names, the full matrices are suffixed with '_with_X'.
    #[cfg_attr(feature = "cli", arg(short = 'x', long, default_value_t = RunArgs::default().exclude_recombinants))]
    pub exclude_recombinants: bool,

    /// Notation of the input mutations, detected from the headers if not provided.
    #[cfg_attr(feature = "cli", arg(short = 'f', long))]
    pub format: Option<SourceFormat>,

    /// Number of CPU threads to use.
    #[cfg_attr(feature = "cli", clap(short = 't', long, default_value_t = RunArgs::default().threads))]
    #[serde(skip)]
    pub threads: usize,
}

impl Default for RunArgs {
    fn default() -> Self {
        RunArgs {
            input: PathBuf::new(),
            output_dir: PathBuf::new(),
            min_genome_count: 10,
            char_threshold: 0.75,
            exclude_recombinants: false,
            format: None,
            threads: 1,
        }
    }
}

impl RunArgs {
    /// Check if a path is default (empty).
    pub fn is_default_path(path: &Path) -> bool {
        path.as_os_str().is_empty()
    }

    /// Reads [`RunArgs`] from a JSON file.
    ///
    /// Missing parameters take their default values.
    pub fn read<P>(path: &P) -> Result<RunArgs, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let input = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read run arguments: {path:?}."))?;
        let run_args = serde_json::from_str(&input)
            .wrap_err_with(|| format!("Failed to deserialize run arguments: {input}"))?;
        Ok(run_args)
    }

    /// Write [`RunArgs`] to a JSON file.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use lcenv::RunArgs;
    ///
    /// let dir = tempfile::tempdir()?;
    /// let path = dir.path().join("run_args.json");
    /// RunArgs::default().write(&path)?;
    /// assert_eq!(RunArgs::read(&path)?, RunArgs::default());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        create_parent_dir(path)?;
        let output = serde_json::to_string_pretty(self)
            .wrap_err(format!("Failed to serialize run arguments: {self:?}"))?;
        std::fs::write(path, output)
            .wrap_err(format!("Failed to write run arguments: {path:?}"))?;
        Ok(())
    }
}
