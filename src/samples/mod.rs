//! Per-lineage sample files for the recombination detector.

use crate::corpus::parse_date;
use crate::environment::is_recombinant;
use crate::normalize::{
    normalize_table, SourceFormat, DATE_COLUMN, GENOME_COLUMN, LINEAGE_COLUMN, MUTATIONS_COLUMN,
};
use crate::utils::{is_missing, Cancellable, CancellationToken};
use chrono::NaiveDate;
#[cfg(feature = "cli")]
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use itertools::Itertools;
use lcenv_table::Table;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// File name of the per-lineage sample counts.
pub const SAMPLES_TOTAL: &str = "samples_total.json";

/// Output headers, in order.
const GENOME: &str = "genomeID";
const TRUE_LINEAGE: &str = "true_lineage";
const NUC_CHANGES: &str = "nuc_changes";
const COLLECTION_DATE: &str = "collection_date";

// ----------------------------------------------------------------------------
// Samples Arguments
// ----------------------------------------------------------------------------

/// Write the genomes of each lineage to their own sample file.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
pub struct SamplesArgs {
    /// Input metadata table, raw or normalized.
    #[cfg_attr(feature = "cli", clap(short = 'i', long, required = true))]
    pub input: PathBuf,

    /// Output directory.
    ///
    /// If the directory does not exist, it will be created.
    #[cfg_attr(feature = "cli", clap(short = 'o', long, required = true))]
    pub output_dir: PathBuf,

    /// Keep only genomes of top-level recombinant lineages (ex. XBB).
    #[cfg_attr(feature = "cli", arg(short = 'r', long, default_value_t = SamplesArgs::default().recombinants_only))]
    pub recombinants_only: bool,

    /// Keep only genomes collected on or after this date (YYYY-MM-DD).
    #[cfg_attr(feature = "cli", arg(short = 's', long))]
    pub since: Option<NaiveDate>,

    /// Notation of the input mutations, if they are not normalized yet.
    #[cfg_attr(feature = "cli", arg(short = 'f', long))]
    pub format: Option<SourceFormat>,
}

impl Default for SamplesArgs {
    fn default() -> Self {
        SamplesArgs {
            input: PathBuf::new(),
            output_dir: PathBuf::new(),
            recombinants_only: false,
            since: None,
            format: None,
        }
    }
}

// ----------------------------------------------------------------------------
// Samples
// ----------------------------------------------------------------------------

/// Read a metadata table and write the per-lineage sample files.
///
/// Returns the number of samples written per lineage.
pub fn samples(args: &SamplesArgs) -> Result<BTreeMap<String, usize>, Report> {
    samples_with(args, &CancellationToken::new())
}

/// Same as [`samples`], stopping early if `cancel` is triggered.
pub fn samples_with(
    args: &SamplesArgs,
    cancel: &CancellationToken,
) -> Result<BTreeMap<String, usize>, Report> {
    info!("Reading input table: {:?}", args.input);
    let table = Table::read(&args.input)?;
    let table = normalize_table(table, args.format, cancel)?;
    cancel.check()?;

    let groups = group_samples(&table, args)?;
    write_samples(&groups, &args.output_dir)
}

/// Clean the table and group the remaining genomes by lineage.
pub fn group_samples(
    table: &Table<String>,
    args: &SamplesArgs,
) -> Result<BTreeMap<String, Table<String>>, Report> {
    let genome_i = table.get_header_index(&GENOME_COLUMN.to_string())?;
    let lineage_i = table.get_header_index(&LINEAGE_COLUMN.to_string())?;
    let mutations_i = table.get_header_index(&MUTATIONS_COLUMN.to_string())?;
    let date_i = table.get_header_index(&DATE_COLUMN.to_string()).ok();

    if args.since.is_some() && date_i.is_none() {
        return Err(eyre!("Cannot filter by date, column '{DATE_COLUMN}' was not found."));
    }

    // report and drop genomes with missing values
    let (missing_lineage, rows): (Vec<_>, Vec<_>) =
        table.rows.iter().partition(|row| is_missing(&row[lineage_i]));
    if !missing_lineage.is_empty() {
        let ids = missing_lineage.iter().map(|row| &row[genome_i]).join(", ");
        warn!("Dropping {} genome(s) with missing '{LINEAGE_COLUMN}': {ids}", missing_lineage.len());
    }
    let (missing_mutations, rows): (Vec<_>, Vec<_>) =
        rows.into_iter().partition(|row| is_missing(&row[mutations_i]));
    if !missing_mutations.is_empty() {
        let ids = missing_mutations.iter().map(|row| &row[genome_i]).join(", ");
        warn!("Dropping {} genome(s) with missing '{MUTATIONS_COLUMN}': {ids}", missing_mutations.len());
    }
    info!("{} of {} genome(s) remain after cleaning.", rows.len(), table.rows.len());

    let rows = rows
        .into_iter()
        .filter(|row| match (args.since, date_i) {
            (Some(since), Some(i)) => parse_date(&row[i]).is_some_and(|date| date >= since),
            _ => true,
        })
        .filter(|row| !args.recombinants_only || is_recombinant(&row[lineage_i]))
        .collect_vec();
    if let Some(since) = args.since {
        info!("{} genome(s) were collected on or after {since}.", rows.len());
    }
    if args.recombinants_only {
        info!("{} genome(s) belong to recombinant lineages.", rows.len());
    }

    let mut headers = vec![GENOME, TRUE_LINEAGE, NUC_CHANGES];
    if date_i.is_some() {
        headers.push(COLLECTION_DATE);
    }

    let mut groups: BTreeMap<String, Table<String>> = BTreeMap::new();
    for row in rows {
        let lineage = row[lineage_i].trim().to_string();
        let group = groups.entry(lineage.clone()).or_insert_with(|| {
            let mut table = Table::new();
            table.headers = headers.iter().map(|h| h.to_string()).collect();
            table
        });
        let mut values = vec![row[genome_i].clone(), lineage, row[mutations_i].clone()];
        if let Some(i) = date_i {
            values.push(row[i].clone());
        }
        group.add_row(values)?;
    }

    Ok(groups)
}

/// Write one tab-separated file per lineage, and a JSON file of counts.
pub fn write_samples<P>(
    groups: &BTreeMap<String, Table<String>>,
    output_dir: &P,
) -> Result<BTreeMap<String, usize>, Report>
where
    P: AsRef<Path> + Debug,
{
    if groups.is_empty() {
        warn!("No genomes remain, no sample files were written.");
        return Ok(BTreeMap::new());
    }

    std::fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Failed to create output directory: {output_dir:?}"))?;

    let mut counts = BTreeMap::new();
    for (lineage, table) in groups {
        let path = output_dir.as_ref().join(format!("samples_{lineage}.csv"));
        table.write(&path, Some('\t'))?;
        info!("Saved: {path:?} ({} rows)", table.rows.len());
        counts.insert(lineage.clone(), table.rows.len());
    }

    let path = output_dir.as_ref().join(SAMPLES_TOTAL);
    let mut output = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut output, formatter);
    counts
        .serialize(&mut serializer)
        .wrap_err_with(|| format!("Failed to serialize sample counts: {counts:?}"))?;
    std::fs::write(&path, output).wrap_err_with(|| format!("Failed to write: {path:?}"))?;
    info!("Saved sample counts: {path:?}");

    Ok(counts)
}

#[cfg(test)]
mod tests;
