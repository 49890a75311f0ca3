//! Typed errors raised while normalizing mutations and building an [`Environment`](crate::Environment).
//!
//! Library functions return a [`color_eyre::eyre::Report`]. The variants below can be recovered
//! from a report with [`Report::downcast_ref`](color_eyre::eyre::Report::downcast_ref).

use thiserror::Error;

/// A single raw mutation entry that could not be decomposed.
///
/// These are recoverable: the offending entry is logged and kept unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("Mutation {raw:?} has aligned bases of unequal length ({reference} vs {alt}).")]
    LengthMismatch { raw: String, reference: usize, alt: usize },
    #[error("Mutation {raw:?} does not have a valid genomic position.")]
    InvalidPosition { raw: String },
    #[error("Mutation {raw:?} does not match any known mutation notation.")]
    Unrecognized { raw: String },
    #[error("Mutation {raw:?} describes no change.")]
    Empty { raw: String },
}

impl MutationError {
    /// The raw entry that failed to parse.
    pub fn raw(&self) -> &str {
        match self {
            MutationError::LengthMismatch { raw, .. }
            | MutationError::InvalidPosition { raw }
            | MutationError::Unrecognized { raw }
            | MutationError::Empty { raw } => raw,
        }
    }
}

/// Errors that concern a whole column, lineage, or run.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// A canonical mutation column contains a token outside the canonical grammar.
    #[error("Column '{column}' contains an invalid canonical mutation for genome {genome}: {value:?}")]
    Validation { column: String, genome: String, value: String },
    /// A lineage has too few genomes to be characterized.
    #[error("Lineage {lineage} has {count} genomes, fewer than the minimum of {min_genome_count}.")]
    InsufficientSupport { lineage: String, count: usize, min_genome_count: usize },
    /// No lineage passed the minimum genome count.
    #[error("No lineage has at least {min_genome_count} genomes, the environment is empty.")]
    EmptyEnvironment { min_genome_count: usize },
    /// Cooperative cancellation was requested.
    #[error("The run was cancelled.")]
    Cancelled,
}
