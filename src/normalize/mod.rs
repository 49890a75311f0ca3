//! Rewrite per-genome mutation lists from third-party notations into canonical [`Mutation`] tokens.

use crate::error::{Error, MutationError};
use crate::mutation::{Mutation, Tokenizer};
use crate::utils::{self, is_missing, Cancellable, CancellationToken};
#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use lcenv_table::Table;
use log::{debug, error, info, warn};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Genome identifier column.
pub const GENOME_COLUMN: &str = "genomeID";
/// Lineage assignment column.
pub const LINEAGE_COLUMN: &str = "pangoLin";
/// Optional sample collection date column.
pub const DATE_COLUMN: &str = "Collection date";
/// Canonical mutation list column.
pub const MUTATIONS_COLUMN: &str = "mutations";

/// Alternative header names and the column they stand for.
pub const ALIASES: &[(&str, &str)] = &[
    ("Virus name", GENOME_COLUMN),
    ("strain", GENOME_COLUMN),
    ("pango_lineage", LINEAGE_COLUMN),
    ("Pango lineage", LINEAGE_COLUMN),
];

static ATOMIC_SUBSTITUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([A-Z-]+)(\d+)([A-Z-]+)$").unwrap());
static ATOMIC_DELETION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)-(\d+)$").unwrap());

// ----------------------------------------------------------------------------
// Source Format
// ----------------------------------------------------------------------------

/// Notation of the raw mutation column(s).
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, strum::Display)]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// Aligned diff entries in a `listV` column, ex. `6959_CTT...|GGAGTT`.
    AlignmentDiff,
    /// Nextstrain `substitutions`, `deletions`, and `insertions` columns, ex. `C241T`, `11288-11296`, `22204:GAGCCAGAA`.
    AtomicList,
}

impl SourceFormat {
    /// The raw columns this format is read from, in processing order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            SourceFormat::AlignmentDiff => &["listV"],
            SourceFormat::AtomicList => &["substitutions", "deletions", "insertions"],
        }
    }

    /// Detect the source format from table headers.
    ///
    /// Returns [`None`] if no raw mutation column is present.
    ///
    /// ```rust
    /// use lcenv::normalize::SourceFormat;
    ///
    /// let headers = ["genomeID", "pangoLin", "listV"].map(String::from);
    /// assert_eq!(SourceFormat::detect(&headers), Some(SourceFormat::AlignmentDiff));
    ///
    /// let headers = ["strain", "substitutions", "insertions"].map(String::from);
    /// assert_eq!(SourceFormat::detect(&headers), Some(SourceFormat::AtomicList));
    ///
    /// let headers = ["genomeID", "mutations"].map(String::from);
    /// assert_eq!(SourceFormat::detect(&headers), None);
    /// ```
    pub fn detect(headers: &[String]) -> Option<SourceFormat> {
        [SourceFormat::AlignmentDiff, SourceFormat::AtomicList]
            .into_iter()
            .find(|format| format.columns().iter().any(|c| headers.iter().any(|h| h == c)))
    }
}

// ----------------------------------------------------------------------------
// Normalizer
// ----------------------------------------------------------------------------

/// The canonical rewrite of one genome's mutation list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Comma-joined canonical tokens.
    pub mutations: String,
    /// Entries that could not be decomposed, kept unchanged in `mutations`.
    pub malformed: Vec<MutationError>,
}

/// Normalizes comma-separated mutation lists.
///
/// Owns the [`Tokenizer`] cache, so a normalizer should be reused across the genomes of a run
/// (one per worker thread).
#[derive(Debug, Default)]
pub struct Normalizer {
    tokenizer: Tokenizer,
}

impl Normalizer {
    pub fn new() -> Self {
        Normalizer::default()
    }

    /// Normalize a comma-separated mutation list.
    ///
    /// ```rust
    /// use lcenv::normalize::{Normalizer, SourceFormat};
    ///
    /// let mut normalizer = Normalizer::new();
    ///
    /// let observed = normalizer.normalize("3622_G|., ,6959_CTT...|GGAGTT", SourceFormat::AlignmentDiff);
    /// assert_eq!(observed.mutations, "3622,6959_CTT|GGA,6962_.|GTT");
    ///
    /// let observed = normalizer.normalize("C241T,11288-11296,22204:GAGCCAGAA", SourceFormat::AtomicList);
    /// assert_eq!(observed.mutations, "241_C|T,11288_11296,22204_.|GAGCCAGAA");
    /// ```
    pub fn normalize(&mut self, raw_list: &str, format: SourceFormat) -> Normalized {
        let mut normalized = Normalized::default();
        let mut tokens = Vec::new();

        for entry in raw_list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match format {
                SourceFormat::AlignmentDiff => match self.tokenizer.tokenize(entry) {
                    Ok(mutations) => tokens.extend(mutations.iter().map(|m| m.to_string())),
                    Err(e) => {
                        tokens.push(entry.to_string());
                        normalized.malformed.push(e.clone());
                    }
                },
                SourceFormat::AtomicList => tokens.push(rewrite_atomic(entry)),
            }
        }

        normalized.mutations = tokens.join(",");
        normalized
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }
}

/// Rewrite one Nextstrain entry into canonical notation.
///
/// Entries already in canonical notation, or not recognized, are returned unchanged.
///
/// ```rust
/// use lcenv::normalize::rewrite_atomic;
///
/// assert_eq!(rewrite_atomic("C241T"), "241_C|T");
/// assert_eq!(rewrite_atomic("11288-11296"), "11288_11296");
/// assert_eq!(rewrite_atomic("22204:GAGCCAGAA"), "22204_.|GAGCCAGAA");
/// assert_eq!(rewrite_atomic("241_C|T"), "241_C|T");
/// ```
pub fn rewrite_atomic(entry: &str) -> String {
    if let Some((pos, seq)) = entry.split_once(':') {
        format!("{}_.|{}", pos.trim(), seq.trim())
    } else if ATOMIC_DELETION.is_match(entry) {
        entry.replacen('-', "_", 1)
    } else if let Some(caps) = ATOMIC_SUBSTITUTION.captures(entry) {
        format!("{}_{}|{}", &caps[2], &caps[1], &caps[3])
    } else {
        entry.to_string()
    }
}

// ----------------------------------------------------------------------------
// Validation
// ----------------------------------------------------------------------------

/// Check that every token of the canonical mutations column is canonical.
///
/// Tokens listed in `allowed` are known malformed entries that were passed through on purpose.
/// Any other violation is fatal and returned as [`Error::Validation`].
pub fn validate(table: &Table<String>, allowed: &HashSet<String>) -> Result<(), Report> {
    let column = MUTATIONS_COLUMN.to_string();
    let mutations_i = table.get_header_index(&column)?;
    let genome_i = table.get_header_index(&GENOME_COLUMN.to_string()).ok();

    for (row_i, row) in table.rows.iter().enumerate() {
        let value = &row[mutations_i];
        if is_missing(value) {
            continue;
        }
        let invalid = value
            .split(',')
            .find(|token| token.is_empty() || !(Mutation::is_canonical(token) || allowed.contains(*token)));

        if let Some(token) = invalid {
            let genome = genome_i.map(|i| row[i].clone()).unwrap_or_else(|| format!("row {}", row_i + 1));
            let e = Error::Validation { column: column.clone(), genome, value: token.to_string() };
            error!("{e}");
            return Err(e).wrap_err_with(|| format!("Validation of column '{column}' failed."));
        }
    }

    Ok(())
}

// ----------------------------------------------------------------------------
// Table
// ----------------------------------------------------------------------------

/// Rename alias headers to their standard names, unless the standard name is already present.
pub fn apply_aliases(table: &mut Table<String>) {
    for (alias, standard) in ALIASES {
        let standard = standard.to_string();
        if !table.has_header(&standard) && table.rename_header(&alias.to_string(), standard.clone()) {
            debug!("Renamed column '{alias}' to '{standard}'.");
        }
    }
}

/// Normalize the raw mutation column(s) of a table into a canonical `mutations` column.
///
/// - If `format` is [`None`], it is detected from the headers.
/// - Tables that already have a canonical `mutations` column are validated but not rewritten.
/// - Raw mutation columns are replaced by `mutations`, all other columns are kept.
///
/// ```rust
/// use lcenv::normalize::{normalize_table, MUTATIONS_COLUMN};
/// use lcenv::utils::CancellationToken;
/// use lcenv_table::Table;
///
/// let mut table = Table::new();
/// table.headers = ["Virus name", "pangoLin", "listV"].map(String::from).to_vec();
/// table.add_row(["g1", "BA.2", "3622_G|.,7124_....|TTTA"].map(String::from))?;
///
/// let table = normalize_table(table, None, &CancellationToken::new())?;
/// assert_eq!(table.headers, ["genomeID", "pangoLin", "mutations"]);
/// assert_eq!(table.get(&MUTATIONS_COLUMN.to_string(), 0)?, "3622,7124_.|TTTA");
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn normalize_table(
    mut table: Table<String>,
    format: Option<SourceFormat>,
    cancel: &CancellationToken,
) -> Result<Table<String>, Report> {
    apply_aliases(&mut table);

    let format = match format.or_else(|| SourceFormat::detect(&table.headers)) {
        Some(format) => format,
        None if table.has_header(&MUTATIONS_COLUMN.to_string()) => {
            info!("Mutations are already canonical, validating.");
            validate(&table, &HashSet::new())?;
            return Ok(table);
        }
        None => {
            return Err(eyre!("No mutation column was found in table: {:?}", table.path)
                .suggestion("Expected one of: listV, substitutions, deletions, insertions, or mutations"))
        }
    };
    info!("Normalizing mutations from {format} notation.");

    // gather the raw list for each genome, joining atomic columns in order
    let columns = format
        .columns()
        .iter()
        .filter_map(|c| table.get_header_index(&c.to_string()).ok())
        .collect_vec();
    if columns.is_empty() {
        return Err(eyre!("Table does not have any {format} columns: {:?}", format.columns()));
    }
    let raw_lists = table
        .rows
        .iter()
        .map(|row| columns.iter().map(|i| &row[*i]).filter(|v| !is_missing(v)).join(","))
        .collect_vec();

    let progress_bar = utils::progress_bar(raw_lists.len(), "Normalizing mutations")?;
    let normalized = raw_lists
        .par_iter()
        .map_init(Normalizer::new, |normalizer, raw_list| -> Result<Normalized, Report> {
            cancel.check()?;
            progress_bar.inc(1);
            Ok(normalizer.normalize(raw_list, format))
        })
        .collect::<Result<Vec<_>, Report>>()?;
    progress_bar.finish_and_clear();

    // report malformed entries, which are passed through unchanged
    let genome_i = table.get_header_index(&GENOME_COLUMN.to_string()).ok();
    let mut allowed = HashSet::new();
    for (row_i, n) in normalized.iter().enumerate() {
        for e in &n.malformed {
            let genome = genome_i.map(|i| table.rows[row_i][i].as_str()).unwrap_or("?");
            warn!("Genome {genome}: {e} It was kept unchanged.");
            allowed.insert(e.raw().to_string());
        }
    }
    if !allowed.is_empty() {
        warn!("{} distinct malformed mutation(s) were passed through.", allowed.len());
    }

    // swap raw columns for the canonical column
    for column in format.columns() {
        let column = column.to_string();
        if table.has_header(&column) {
            table.remove_column(&column)?;
        }
    }
    let existing = MUTATIONS_COLUMN.to_string();
    if table.has_header(&existing) {
        warn!("Replacing existing column '{existing}' with normalized mutations.");
        table.remove_column(&existing)?;
    }
    table.add_column(existing, normalized.into_iter().map(|n| n.mutations))?;

    validate(&table, &allowed)?;

    Ok(table)
}

// ----------------------------------------------------------------------------
// Normalize Arguments
// ----------------------------------------------------------------------------

/// Normalize the mutation notation of a metadata table.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
pub struct NormalizeArgs {
    /// Input metadata table (tsv, csv, optionally .zst compressed).
    #[cfg_attr(feature = "cli", clap(short = 'i', long, required = true))]
    pub input: PathBuf,

    /// Output table with a canonical 'mutations' column.
    #[cfg_attr(feature = "cli", clap(short = 'o', long, required = true))]
    pub output: PathBuf,

    /// Notation of the input mutations, detected from the headers if not provided.
    #[cfg_attr(feature = "cli", clap(short = 'f', long))]
    pub format: Option<SourceFormat>,
}

impl Default for NormalizeArgs {
    fn default() -> Self {
        NormalizeArgs { input: PathBuf::new(), output: PathBuf::new(), format: None }
    }
}

/// Read, normalize, and write a metadata table.
pub fn normalize(args: &NormalizeArgs) -> Result<Table<String>, Report> {
    normalize_with(args, &CancellationToken::new())
}

/// Same as [`normalize`], stopping early if `cancel` is triggered.
pub fn normalize_with(args: &NormalizeArgs, cancel: &CancellationToken) -> Result<Table<String>, Report> {
    info!("Reading input table: {:?}", args.input);
    let table = Table::read(&args.input)?;
    let table = normalize_table(table, args.format, cancel)?;
    write_table(&table, &args.output)?;
    Ok(table)
}

/// Write a normalized table, creating parent directories as needed.
pub fn write_table<P>(table: &Table<String>, path: &P) -> Result<(), Report>
where
    P: AsRef<Path> + Debug,
{
    utils::create_parent_dir(path)?;
    info!("Writing normalized table: {path:?}");
    table.write(path, None)
}

#[cfg(test)]
mod tests;
