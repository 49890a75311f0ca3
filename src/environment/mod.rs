//! Characterize lineages by their mutations, producing the [`Environment`] read by the recombination detector.
//!
//! ## Artifacts
//!
//! | File                               | Rows      | Columns                        |
//! |------------------------------------|-----------|--------------------------------|
//! | `change_probability.csv`           | mutations | `probability`, `pos`           |
//! | `lc_df.csv`                        | mutations | lineages (bool), `lc_pos`      |
//! | `change2lineage_probability.csv`   | mutations | lineages (frequency), `pos`    |
//! | `lc_quality_df.csv`                | `num`     | non-recombinant lineages       |

pub mod attributes;

#[doc(inline)]
pub use attributes::Attributes;

use crate::corpus::{Lineage, Statistics};
use crate::error::Error;
use crate::mutation::Mutation;
use crate::utils::create_parent_dir;
use color_eyre::eyre::{Report, Result};
use itertools::Itertools;
use lcenv_table::Table;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Display};
use std::path::Path;
use strum::{EnumIter, IntoEnumIterator};
use tabled::builder::Builder;

/// File name suffix of the matrices computed with recombinant lineages, when both variants are written.
pub const WITH_RECOMBINANTS_SUFFIX: &str = "_with_X";

/// Returns true if a lineage is a top-level recombinant (ex. `XBB`, but not `XBB.1.5`).
///
/// ```rust
/// use lcenv::environment::is_recombinant;
///
/// assert!(is_recombinant("XBB"));
/// assert!(is_recombinant("xa"));
/// assert!(!is_recombinant("XBB.1.5"));
/// assert!(!is_recombinant("BA.2"));
/// ```
pub fn is_recombinant(lineage: &str) -> bool {
    let lineage = lineage.to_uppercase();
    lineage.starts_with('X') && !lineage.contains('.')
}

// ----------------------------------------------------------------------------
// Matrix
// ----------------------------------------------------------------------------

/// A [mutation × lineage] table, rows sorted by genomic position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Matrix<T> {
    /// Column names, sorted.
    pub lineages: Vec<String>,
    /// One row of values per mutation, in the order of `lineages`.
    pub rows: Vec<(Mutation, Vec<T>)>,
}

impl<T> Matrix<T>
where
    T: Copy + Display,
{
    pub fn new() -> Self {
        Matrix { lineages: Vec::new(), rows: Vec::new() }
    }

    /// Number of mutations (rows).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn mutations(&self) -> impl Iterator<Item = &Mutation> {
        self.rows.iter().map(|(mutation, _)| mutation)
    }

    /// Returns the value for a mutation and lineage, [`None`] if either is absent.
    pub fn get(&self, mutation: &Mutation, lineage: &str) -> Option<T> {
        let lineage_i = self.lineages.iter().position(|l| l == lineage)?;
        let (_, values) = self.rows.iter().find(|(m, _)| m == mutation)?;
        values.get(lineage_i).copied()
    }

    /// Values of one lineage column, in row order.
    pub fn column(&self, lineage: &str) -> Option<Vec<T>> {
        let lineage_i = self.lineages.iter().position(|l| l == lineage)?;
        Some(self.rows.iter().map(|(_, values)| values[lineage_i]).collect())
    }

    /// Convert to a [`Table`] with a leading `mutation` column and a trailing position column.
    pub fn to_table(&self, pos_column: &str) -> Table<String> {
        let mut table = Table::new();
        table.headers = std::iter::once("mutation".to_string())
            .chain(self.lineages.iter().cloned())
            .chain(std::iter::once(pos_column.to_string()))
            .collect();
        table.rows = self
            .rows
            .iter()
            .map(|(mutation, values)| {
                std::iter::once(mutation.to_string())
                    .chain(values.iter().map(|v| v.to_string()))
                    .chain(std::iter::once(mutation.coord.to_string()))
                    .collect()
            })
            .collect();
        table
    }
}

// ----------------------------------------------------------------------------
// Environment
// ----------------------------------------------------------------------------

/// The files of an [`Environment`].
#[derive(Clone, Copy, Debug, EnumIter, PartialEq, Eq, strum::Display)]
pub enum Artifact {
    ChangeProbability,
    CharacteristicMatrix,
    ProbabilityMatrix,
    LineageQuality,
}

impl Artifact {
    /// File stem of the artifact.
    pub fn stem(&self) -> &'static str {
        match self {
            Artifact::ChangeProbability => "change_probability",
            Artifact::CharacteristicMatrix => "lc_df",
            Artifact::ProbabilityMatrix => "change2lineage_probability",
            Artifact::LineageQuality => "lc_quality_df",
        }
    }

    /// File name of the artifact, with an optional suffix before the extension.
    ///
    /// ```rust
    /// use lcenv::environment::{Artifact, WITH_RECOMBINANTS_SUFFIX};
    ///
    /// assert_eq!(Artifact::CharacteristicMatrix.file_name(""), "lc_df.csv");
    /// assert_eq!(Artifact::ProbabilityMatrix.file_name(WITH_RECOMBINANTS_SUFFIX), "change2lineage_probability_with_X.csv");
    /// ```
    pub fn file_name(&self, suffix: &str) -> String {
        format!("{}{suffix}.csv", self.stem())
    }

    /// True for the artifacts that are written once per recombinant variant.
    pub fn is_matrix(&self) -> bool {
        matches!(self, Artifact::CharacteristicMatrix | Artifact::ProbabilityMatrix)
    }
}

/// Lineage statistics consumed by the recombination detector.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Environment {
    /// Fraction of all genomes carrying each mutation, sorted by position.
    pub global_probability: Vec<(Mutation, f64)>,
    /// Mutations characteristic of at least one selected lineage.
    pub characteristic_matrix: Matrix<bool>,
    /// Frequencies of every mutation observed in a selected lineage.
    pub probability_matrix: Matrix<f64>,
    /// Genome counts of the non-recombinant lineages.
    pub lineage_quality: BTreeMap<String, usize>,
    /// Genome counts of the selected lineages.
    pub genome_counts: BTreeMap<String, usize>,
    /// Number of genomes the environment was built from.
    pub genome_count: usize,
    pub min_genome_count: usize,
    pub char_threshold: f64,
}

impl Environment {
    /// Returns [`Error::EmptyEnvironment`] if no lineage was selected.
    ///
    /// An empty environment has nothing to compare genomes against.
    pub fn check(&self) -> Result<(), Report> {
        if self.probability_matrix.lineages.is_empty() {
            let min_genome_count = self.min_genome_count;
            return Err(Error::EmptyEnvironment { min_genome_count }.into());
        }
        Ok(())
    }

    /// Convert one artifact to a [`Table`].
    pub fn to_table(&self, artifact: Artifact) -> Table<String> {
        match artifact {
            Artifact::ChangeProbability => {
                let mut table = Table::new();
                table.headers = ["mutation", "probability", "pos"].map(String::from).to_vec();
                table.rows = self
                    .global_probability
                    .iter()
                    .map(|(m, p)| vec![m.to_string(), p.to_string(), m.coord.to_string()])
                    .collect();
                table
            }
            Artifact::CharacteristicMatrix => self.characteristic_matrix.to_table("lc_pos"),
            Artifact::ProbabilityMatrix => self.probability_matrix.to_table("pos"),
            Artifact::LineageQuality => {
                let mut table = Table::new();
                table.headers = std::iter::once(String::new())
                    .chain(self.lineage_quality.keys().cloned())
                    .collect();
                let row = std::iter::once("num".to_string())
                    .chain(self.lineage_quality.values().map(|n| n.to_string()))
                    .collect();
                table.rows = vec![row];
                table
            }
        }
    }

    /// Write the artifacts to a directory, appending `suffix` to the matrix file names.
    pub fn write<P>(&self, dir: &P, artifacts: &[Artifact], suffix: &str) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        for artifact in artifacts {
            let suffix = if artifact.is_matrix() { suffix } else { "" };
            let path = dir.as_ref().join(artifact.file_name(suffix));
            create_parent_dir(&path)?;
            info!("Writing {artifact}: {path:?}");
            self.to_table(*artifact).write(&path, Some(','))?;
        }
        Ok(())
    }

    /// Write every artifact under its plain name.
    pub fn write_all<P>(&self, dir: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        self.write(dir, &Artifact::iter().collect_vec(), "")
    }

    /// Summarize the selected lineages as a table.
    ///
    /// ```rust
    /// use lcenv::Environment;
    ///
    /// let summary = Environment::default().summary();
    /// assert!(summary.to_string().contains("Characteristic Mutations"));
    /// ```
    pub fn summary(&self) -> tabled::Table {
        let mut builder = Builder::default();
        builder.push_record(["Lineage", "Genomes", "Characteristic Mutations"]);

        let counts = self.probability_matrix.lineages.iter().map(|lineage| {
            let characteristic = self
                .characteristic_matrix
                .column(lineage)
                .map(|column| column.into_iter().filter(|c| *c).count())
                .unwrap_or_default();
            (lineage, characteristic)
        });

        for (lineage, characteristic) in counts {
            let genomes = self.genome_counts.get(lineage).map(|n| n.to_string()).unwrap_or_default();
            builder.push_record([lineage.clone(), genomes, characteristic.to_string()]);
        }

        builder.build()
    }
}

// ----------------------------------------------------------------------------
// Environment Builder
// ----------------------------------------------------------------------------

/// Builds an [`Environment`] from corpus [`Statistics`].
#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentBuilder {
    /// Lineages with fewer genomes are excluded from both matrices.
    pub min_genome_count: usize,
    /// Minimum frequency for a mutation to be characteristic of a lineage.
    pub char_threshold: f64,
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        EnvironmentBuilder { min_genome_count: 10, char_threshold: 0.75 }
    }
}

impl EnvironmentBuilder {
    pub fn new(min_genome_count: usize, char_threshold: f64) -> Self {
        EnvironmentBuilder { min_genome_count, char_threshold }
    }

    /// Lineages with at least `min_genome_count` genomes, sorted by name.
    ///
    /// Excluded lineages are logged at info level, they are not an error.
    pub fn select_lineages(&self, stats: &Statistics) -> Vec<Lineage> {
        let (selected, excluded): (Vec<_>, Vec<_>) = stats
            .lineages()
            .into_iter()
            .partition(|lineage| lineage.genome_count >= self.min_genome_count);

        for lineage in &excluded {
            let e = Error::InsufficientSupport {
                lineage: lineage.name.clone(),
                count: lineage.genome_count,
                min_genome_count: self.min_genome_count,
            };
            info!("{e}");
        }
        info!(
            "Selected {} lineage(s) with at least {} genomes, excluded {}.",
            selected.len(),
            self.min_genome_count,
            excluded.len()
        );

        selected
    }

    /// Build an [`Environment`].
    ///
    /// ```rust
    /// use lcenv::{Corpus, EnvironmentBuilder, Mutation, Statistics};
    /// use lcenv::corpus::GenomeRecord;
    ///
    /// let c241t = Mutation::substitution(241, "C", "T");
    /// let mut corpus = Corpus::new();
    /// for i in 0..10 {
    ///     corpus.genomes.push(GenomeRecord::new(&format!("g{i}"), Some("BA.2"), vec![c241t.clone()]));
    /// }
    ///
    /// let environment = EnvironmentBuilder::default().build(&Statistics::compute(&corpus));
    /// assert_eq!(environment.characteristic_matrix.get(&c241t, "BA.2"), Some(true));
    /// assert_eq!(environment.probability_matrix.get(&c241t, "BA.2"), Some(1.0));
    /// environment.check()?;
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn build(&self, stats: &Statistics) -> Environment {
        let selected = self.select_lineages(stats);
        let lineages = selected.iter().map(|l| l.name.clone()).collect_vec();
        let genome_counts = selected.iter().map(|l| (l.name.clone(), l.genome_count)).collect();

        // every mutation seen in a selected lineage, sorted by position
        let mutations: BTreeSet<&Mutation> =
            selected.iter().flat_map(|l| l.mutation_frequency.keys()).collect();

        let mut probability_matrix = Matrix { lineages: lineages.clone(), rows: Vec::new() };
        let mut characteristic_matrix = Matrix { lineages, rows: Vec::new() };

        for mutation in mutations {
            let frequencies = selected
                .iter()
                .map(|l| l.mutation_frequency.get(mutation).copied().unwrap_or(0.0))
                .collect_vec();
            let characteristic = frequencies.iter().map(|f| *f >= self.char_threshold).collect_vec();

            if characteristic.iter().any(|c| *c) {
                characteristic_matrix.rows.push((mutation.clone(), characteristic));
            }
            probability_matrix.rows.push((mutation.clone(), frequencies));
        }
        debug!(
            "{} of {} mutation(s) are characteristic of at least one lineage.",
            characteristic_matrix.len(),
            probability_matrix.len()
        );

        let lineage_quality = stats
            .genome_counts
            .iter()
            .filter(|(lineage, _)| !is_recombinant(lineage))
            .map(|(lineage, count)| (lineage.clone(), *count))
            .collect();

        Environment {
            global_probability: stats.global_probability(),
            characteristic_matrix,
            probability_matrix,
            lineage_quality,
            genome_counts,
            genome_count: stats.total_genome_count,
            min_genome_count: self.min_genome_count,
            char_threshold: self.char_threshold,
        }
    }
}

#[cfg(test)]
mod tests;
