use crate::corpus::{Corpus, GenomeRecord};
use crate::mutation::Mutation;
use crate::utils::{Cancellable, CancellationToken};
use color_eyre::eyre::{Report, Result};
use itertools::Itertools;
use log::debug;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

// ----------------------------------------------------------------------------
// Lineage
// ----------------------------------------------------------------------------

/// Mutation frequencies of one lineage.
#[derive(Clone, Debug, PartialEq)]
pub struct Lineage {
    pub name: String,
    pub genome_count: usize,
    /// Fraction of the lineage's genomes carrying each mutation.
    pub mutation_frequency: HashMap<Mutation, f64>,
}

// ----------------------------------------------------------------------------
// Statistics
// ----------------------------------------------------------------------------

/// Mutation presence counts over a [`Corpus`].
///
/// A genome contributes at most one count per distinct mutation it carries. Unassigned genomes
/// count toward the global totals only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistics {
    pub total_genome_count: usize,
    /// Number of genomes carrying each mutation.
    pub mutation_counts: HashMap<Mutation, usize>,
    /// Number of genomes assigned to each lineage.
    pub genome_counts: BTreeMap<String, usize>,
    /// Number of genomes of each lineage carrying each mutation.
    pub lineage_mutation_counts: BTreeMap<String, HashMap<Mutation, usize>>,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    /// Compute statistics in a single pass over the corpus.
    ///
    /// ```rust
    /// use lcenv::{Corpus, Statistics, Mutation};
    /// use lcenv::corpus::GenomeRecord;
    ///
    /// let c241t = Mutation::substitution(241, "C", "T");
    /// let mut corpus = Corpus::new();
    /// corpus.genomes.push(GenomeRecord::new("g1", Some("BA.2"), vec![c241t.clone(), c241t.clone()]));
    /// corpus.genomes.push(GenomeRecord::new("g2", None, vec![]));
    ///
    /// let stats = Statistics::compute(&corpus);
    /// assert_eq!(stats.total_genome_count, 2);
    /// assert_eq!(stats.mutation_counts[&c241t], 1);
    /// assert_eq!(stats.genome_counts["BA.2"], 1);
    /// ```
    pub fn compute(corpus: &Corpus) -> Statistics {
        corpus.iter().fold(Statistics::new(), |mut stats, genome| {
            stats.add(genome);
            stats
        })
    }

    /// Compute statistics in parallel, folding shards of genomes and merging the results.
    pub fn par_compute(corpus: &Corpus, cancel: &CancellationToken) -> Result<Statistics, Report> {
        let stats = corpus
            .genomes
            .par_iter()
            .try_fold(Statistics::new, |mut stats, genome| -> Result<Statistics, Report> {
                cancel.check()?;
                stats.add(genome);
                Ok(stats)
            })
            .try_reduce(Statistics::new, |a, b| Ok(a.merge(b)))?;

        debug!(
            "Counted {} distinct mutation(s) over {} genome(s) and {} lineage(s).",
            stats.mutation_counts.len(),
            stats.total_genome_count,
            stats.genome_counts.len()
        );
        Ok(stats)
    }

    /// Add one genome to the counts.
    pub fn add(&mut self, genome: &GenomeRecord) {
        self.total_genome_count += 1;
        let distinct = genome.mutations.iter().collect::<HashSet<_>>();

        for mutation in &distinct {
            *self.mutation_counts.entry((*mutation).clone()).or_default() += 1;
        }

        if let Some(lineage) = &genome.lineage {
            *self.genome_counts.entry(lineage.clone()).or_default() += 1;
            let counts = self.lineage_mutation_counts.entry(lineage.clone()).or_default();
            for mutation in distinct {
                *counts.entry(mutation.clone()).or_default() += 1;
            }
        }
    }

    /// Combine the counts of two disjoint shards.
    pub fn merge(mut self, other: Statistics) -> Statistics {
        self.total_genome_count += other.total_genome_count;
        for (mutation, count) in other.mutation_counts {
            *self.mutation_counts.entry(mutation).or_default() += count;
        }
        for (lineage, count) in other.genome_counts {
            *self.genome_counts.entry(lineage).or_default() += count;
        }
        for (lineage, other_counts) in other.lineage_mutation_counts {
            let counts = self.lineage_mutation_counts.entry(lineage).or_default();
            for (mutation, count) in other_counts {
                *counts.entry(mutation).or_default() += count;
            }
        }
        self
    }

    /// Fraction of all genomes carrying each observed mutation, sorted by position.
    pub fn global_probability(&self) -> Vec<(Mutation, f64)> {
        if self.total_genome_count == 0 {
            return Vec::new();
        }
        let total = self.total_genome_count as f64;
        self.mutation_counts
            .iter()
            .map(|(mutation, count)| (mutation.clone(), *count as f64 / total))
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .collect()
    }

    /// Mutation frequencies of a lineage, [`None`] if the lineage was never observed.
    pub fn lineage(&self, name: &str) -> Option<Lineage> {
        let genome_count = *self.genome_counts.get(name)?;
        let mutation_frequency = self
            .lineage_mutation_counts
            .get(name)
            .map(|counts| {
                counts
                    .iter()
                    .map(|(mutation, count)| (mutation.clone(), *count as f64 / genome_count as f64))
                    .collect()
            })
            .unwrap_or_default();

        Some(Lineage { name: name.to_string(), genome_count, mutation_frequency })
    }

    /// All observed lineages, sorted by name.
    pub fn lineages(&self) -> Vec<Lineage> {
        self.genome_counts.keys().filter_map(|name| self.lineage(name)).collect()
    }
}
