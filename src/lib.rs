//! `lcenv` normalizes genomic mutations and builds the **L**ineage **C**haracterization **ENV**ironment used to detect recombination.
//!
//! ## Pipeline
//!
//! 1. **Normalize** per-genome mutation lists from third-party notations into canonical tokens.
//!
//!    | Source                 | Raw                    | Canonical               |
//!    |------------------------|------------------------|-------------------------|
//!    | Alignment diff (listV) | `3622_G\|.`            | `3622`                  |
//!    | Alignment diff (listV) | `7124_....\|TTTA`      | `7124_.\|TTTA`          |
//!    | Alignment diff (listV) | `6959_CTT...\|GGAGTT`  | `6959_CTT\|GGA,6962_.\|GTT` |
//!    | Nextstrain             | `C241T`                | `241_C\|T`              |
//!    | Nextstrain             | `11288-11296`          | `11288_11296`           |
//!    | Nextstrain             | `22204:GAGCCAGAA`      | `22204_.\|GAGCCAGAA`    |
//!
//! 1. **Count** how many genomes carry each mutation, globally and per lineage.
//!
//! 1. **Characterize** every lineage with enough genomes: the frequency of each mutation in
//!    the lineage, and the mutations carried by most of its genomes.
//!
//! ## Example
//!
//! ```rust
//! use lcenv::{Corpus, EnvironmentBuilder, Statistics};
//! use lcenv::normalize::normalize_table;
//! use lcenv::utils::CancellationToken;
//! use lcenv_table::Table;
//!
//! let mut table = Table::new();
//! table.headers = ["genomeID", "pangoLin", "listV"].map(String::from).to_vec();
//! for i in 0..10 {
//!     table.add_row([format!("g{i}"), "BA.2".to_string(), "3622_G|.".to_string()])?;
//! }
//!
//! let table = normalize_table(table, None, &CancellationToken::new())?;
//! let corpus = Corpus::from_table(&table)?;
//! let environment = EnvironmentBuilder::default().build(&Statistics::compute(&corpus));
//! environment.check()?;
//! assert_eq!(environment.characteristic_matrix.lineages, ["BA.2"]);
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod corpus;
pub mod environment;
pub mod error;
pub mod mutation;
pub mod normalize;
pub mod run;
pub mod samples;
pub mod utils;

#[cfg(feature = "cli")]
#[doc(inline)]
pub use crate::cli::Cli;
#[doc(inline)]
pub use crate::corpus::{Corpus, Statistics};
#[doc(inline)]
pub use crate::environment::{Environment, EnvironmentBuilder};
#[doc(inline)]
pub use crate::mutation::Mutation;
#[doc(inline)]
pub use crate::normalize::{normalize, NormalizeArgs};
#[doc(inline)]
pub use crate::run::{run, RunArgs};
#[doc(inline)]
pub use crate::samples::{samples, SamplesArgs};
