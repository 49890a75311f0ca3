//! A snapshot of normalized genomes, and the [`Statistics`] computed over it.

pub mod statistics;

#[doc(inline)]
pub use statistics::{Lineage, Statistics};

use crate::environment::is_recombinant;
use crate::mutation::Mutation;
use crate::normalize::{GENOME_COLUMN, LINEAGE_COLUMN, MUTATIONS_COLUMN};
use crate::utils::is_missing;
use chrono::NaiveDate;
use color_eyre::eyre::{Report, Result, WrapErr};
use color_eyre::Help;
use lcenv_table::Table;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Date format of the collection date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ----------------------------------------------------------------------------
// Genome Record
// ----------------------------------------------------------------------------

/// One genome and its canonical mutations.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct GenomeRecord {
    pub id: String,
    /// Lineage assignment, [`None`] if unassigned.
    pub lineage: Option<String>,
    pub mutations: Vec<Mutation>,
}

impl GenomeRecord {
    pub fn new(id: &str, lineage: Option<&str>, mutations: Vec<Mutation>) -> Self {
        GenomeRecord {
            id: id.to_string(),
            lineage: lineage.map(String::from),
            mutations,
        }
    }
}

// ----------------------------------------------------------------------------
// Corpus
// ----------------------------------------------------------------------------

/// The genomes of one pipeline run.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Corpus {
    pub genomes: Vec<GenomeRecord>,
}

impl Corpus {
    pub fn new() -> Self {
        Corpus::default()
    }

    /// Build a corpus from a table with a canonical `mutations` column.
    ///
    /// - Genomes with no mutations are dropped.
    /// - Tokens that are not canonical are logged and skipped.
    /// - A missing lineage column leaves every genome unassigned.
    ///
    /// ```rust
    /// use lcenv::Corpus;
    /// use lcenv_table::Table;
    ///
    /// let mut table = Table::new();
    /// table.headers = ["genomeID", "pangoLin", "mutations"].map(String::from).to_vec();
    /// table.add_row(["g1", "BA.2", "241_C|T,3622"].map(String::from))?;
    /// table.add_row(["g2", "BA.2", ""].map(String::from))?;
    ///
    /// let corpus = Corpus::from_table(&table)?;
    /// assert_eq!(corpus.len(), 1);
    /// assert_eq!(corpus.genomes[0].mutations.len(), 2);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn from_table(table: &Table<String>) -> Result<Corpus, Report> {
        let genome_i = table
            .get_header_index(&GENOME_COLUMN.to_string())
            .suggestion("Genome identifiers are read from column 'genomeID' (or 'Virus name', 'strain').")?;
        let mutations_i = table
            .get_header_index(&MUTATIONS_COLUMN.to_string())
            .suggestion("Normalize the table first to create the 'mutations' column.")?;
        let lineage_i = table.get_header_index(&LINEAGE_COLUMN.to_string()).ok();
        if lineage_i.is_none() {
            warn!("Column '{LINEAGE_COLUMN}' was not found, all genomes are unassigned.");
        }

        let mut corpus = Corpus::new();
        let mut dropped = 0;

        for row in &table.rows {
            let id = &row[genome_i];
            let raw = &row[mutations_i];
            if is_missing(raw) {
                dropped += 1;
                continue;
            }

            let mutations = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|token| match Mutation::from_str(token) {
                    Ok(mutation) => Some(mutation),
                    Err(e) => {
                        warn!("Genome {id}: {e} It is excluded from statistics.");
                        None
                    }
                })
                .collect::<Vec<_>>();

            let lineage = lineage_i.map(|i| row[i].trim()).filter(|l| !is_missing(l));
            corpus.genomes.push(GenomeRecord::new(id, lineage, mutations));
        }

        if dropped > 0 {
            info!("Dropped {dropped} genome(s) with no mutations.");
        }
        debug!("Corpus has {} genome(s).", corpus.len());

        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenomeRecord> {
        self.genomes.iter()
    }

    /// Returns a copy of the corpus without genomes of recombinant lineages.
    ///
    /// Unassigned genomes are kept.
    pub fn without_recombinants(&self) -> Corpus {
        let genomes = self
            .genomes
            .iter()
            .filter(|g| !g.lineage.as_deref().is_some_and(is_recombinant))
            .cloned()
            .collect();
        Corpus { genomes }
    }
}

/// Parse a collection date, returning [`None`] for missing or partial dates.
///
/// ```rust
/// use lcenv::corpus::parse_date;
/// use chrono::NaiveDate;
///
/// assert_eq!(parse_date("2023-02-09"), NaiveDate::from_ymd_opt(2023, 2, 9));
/// assert_eq!(parse_date("2023-02"), None);
/// ```
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if is_missing(value) {
        return None;
    }
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .wrap_err_with(|| format!("Failed to parse collection date: {value:?}"))
        .map_err(|e| debug!("{e}"))
        .ok()
}
