//! Metadata to identify how an environment was created, for reproducibility.

use crate::environment::Environment;
use chrono::Local;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::io::Write;
use std::path::Path;

/// [`Attributes`] of a written environment.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Attributes {
    /// CLI version used to create the environment (ex. "lcenv 0.1.0").
    pub version: String,
    /// Creation time, RFC 3339.
    pub created: String,
    pub min_genome_count: usize,
    pub char_threshold: f64,
    /// True if the plain artifacts exclude recombinant lineages.
    pub exclude_recombinants: bool,
    /// Number of genomes in the corpus.
    pub genome_count: usize,
    /// Number of lineages with enough genomes to be characterized.
    pub selected_lineages: usize,
    /// Number of mutations characteristic of at least one lineage.
    pub characteristic_mutations: usize,
}

impl Default for Attributes {
    fn default() -> Self {
        Self::new()
    }
}

impl Attributes {
    /// Returns new [`Attributes`] with the current version and time.
    pub fn new() -> Self {
        Attributes {
            version: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            created: Local::now().to_rfc3339(),
            min_genome_count: 0,
            char_threshold: 0.0,
            exclude_recombinants: false,
            genome_count: 0,
            selected_lineages: 0,
            characteristic_mutations: 0,
        }
    }

    /// Describe an [`Environment`].
    pub fn from_environment(environment: &Environment, exclude_recombinants: bool) -> Self {
        Attributes {
            min_genome_count: environment.min_genome_count,
            char_threshold: environment.char_threshold,
            exclude_recombinants,
            genome_count: environment.genome_count,
            selected_lineages: environment.probability_matrix.lineages.len(),
            characteristic_mutations: environment.characteristic_matrix.len(),
            ..Attributes::new()
        }
    }

    /// Read [`Attributes`] from a JSON file.
    pub fn read<P>(path: &P) -> Result<Attributes, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let file =
            std::fs::File::open(path).wrap_err(eyre!("Failed to open Attributes file: {path:?}."))?;
        let reader = std::io::BufReader::new(file);
        let attributes = serde_json::from_reader(reader)
            .wrap_err(eyre!("Failed to deserialize Attributes file: {path:?}."))?;
        Ok(attributes)
    }

    /// Write [`Attributes`] to a JSON file.
    ///
    /// ```rust
    /// use lcenv::environment::Attributes;
    ///
    /// let attributes = Attributes::new();
    /// let file = tempfile::NamedTempFile::new()?;
    /// attributes.write(&file.path())?;
    /// assert_eq!(Attributes::read(&file.path())?, attributes);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let mut file = std::fs::File::create(path)
            .wrap_err(eyre!("Failed to create Attributes file: {path:?}"))?;
        let output = serde_json::to_string_pretty(self)
            .wrap_err(eyre!("Failed to serialize Attributes: {self:?}"))?;
        file.write_all(format!("{output}\n").as_bytes())
            .wrap_err(eyre!("Failed to write Attributes file: {path:?}"))?;
        Ok(())
    }
}
