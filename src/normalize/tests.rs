use crate::error::{Error, MutationError};
use crate::normalize::*;
use crate::utils::{Cancellable, CancellationToken};
use color_eyre::eyre::{Report, Result};
use lcenv_table::Table;

fn table(headers: &[&str], rows: &[&[&str]]) -> Result<Table<String>, Report> {
    let mut table = Table::new();
    table.headers = headers.iter().map(|h| h.to_string()).collect();
    for row in rows {
        table.add_row(row.iter().map(|v| v.to_string()))?;
    }
    Ok(table)
}

#[test]
fn nextstrain_substitution() {
    let observed = Normalizer::new().normalize("C241T", SourceFormat::AtomicList);
    assert_eq!(observed.mutations, "241_C|T");
    assert!(observed.malformed.is_empty());
}

#[test]
fn skips_empty_segments() {
    let observed = Normalizer::new().normalize(" , 3622_G|. ,,", SourceFormat::AlignmentDiff);
    assert_eq!(observed.mutations, "3622");
    assert_eq!(Normalizer::new().normalize("", SourceFormat::AlignmentDiff).mutations, "");
}

#[test]
fn idempotent() {
    let raw = "3622_G|.,10415_AACCTGAAACCGGGA|...............,6959_CTT...|GGAGTT,7124_....|TTTA";
    let mut normalizer = Normalizer::new();
    let once = normalizer.normalize(raw, SourceFormat::AlignmentDiff).mutations;
    let twice = normalizer.normalize(&once, SourceFormat::AlignmentDiff).mutations;
    assert_eq!(once, "3622,10415_10429,6959_CTT|GGA,6962_.|GTT,7124_.|TTTA");
    assert_eq!(once, twice);

    let atomic = normalizer.normalize(&once, SourceFormat::AtomicList).mutations;
    assert_eq!(once, atomic);
}

#[test]
fn malformed_passes_through() {
    let observed = Normalizer::new().normalize("3622_G|.,5122_CTT|..", SourceFormat::AlignmentDiff);
    assert_eq!(observed.mutations, "3622,5122_CTT|..");
    assert_eq!(
        observed.malformed,
        vec![MutationError::LengthMismatch { raw: "5122_CTT|..".to_string(), reference: 3, alt: 2 }]
    );
}

#[test]
fn detect_format() {
    let headers = ["genomeID", "listV"].map(String::from);
    assert_eq!(SourceFormat::detect(&headers), Some(SourceFormat::AlignmentDiff));
    let headers = ["genomeID", "deletions"].map(String::from);
    assert_eq!(SourceFormat::detect(&headers), Some(SourceFormat::AtomicList));
    let headers = ["genomeID"].map(String::from);
    assert_eq!(SourceFormat::detect(&headers), None);
}

#[test]
fn atomic_columns_joined_in_order() -> Result<(), Report> {
    let input = table(
        &["strain", "pango_lineage", "insertions", "deletions", "substitutions"],
        &[
            &["g1", "BA.2", "22204:GAGCCAGAA", "11288-11296", "C241T,C3037T"],
            &["g2", "BA.2", "", "NA", "C241T"],
        ],
    )?;
    let observed = normalize_table(input, None, &CancellationToken::new())?;
    assert_eq!(observed.headers, ["genomeID", "pangoLin", "mutations"]);
    assert_eq!(observed.rows[0][2], "241_C|T,3037_C|T,11288_11296,22204_.|GAGCCAGAA");
    assert_eq!(observed.rows[1][2], "241_C|T");
    Ok(())
}

#[test]
fn malformed_alignment_diff_is_allowed() -> Result<(), Report> {
    let input = table(&["genomeID", "listV"], &[&["g1", "5122_CTT|..,3622_G|."]])?;
    let observed = normalize_table(input, Some(SourceFormat::AlignmentDiff), &CancellationToken::new())?;
    assert_eq!(observed.rows[0][1], "5122_CTT|..,3622");
    Ok(())
}

#[test]
fn validation_is_fatal() -> Result<(), Report> {
    let input = table(&["genomeID", "substitutions"], &[&["g1", "C241T,not-a-mutation"]])?;
    let result = normalize_table(input, None, &CancellationToken::new());
    let e = result.expect_err("validation should fail");
    let observed = e.downcast_ref::<Error>();
    let expected = Error::Validation {
        column: MUTATIONS_COLUMN.to_string(),
        genome: "g1".to_string(),
        value: "not-a-mutation".to_string(),
    };
    assert_eq!(observed, Some(&expected));
    Ok(())
}

#[test]
fn canonical_table_is_validated_only() -> Result<(), Report> {
    let input = table(&["genomeID", "mutations"], &[&["g1", "241_C|T,3622"]])?;
    let observed = normalize_table(input.clone(), None, &CancellationToken::new())?;
    assert_eq!(observed.rows, input.rows);

    let input = table(&["genomeID", "mutations"], &[&["g1", "C241T"]])?;
    assert!(normalize_table(input, None, &CancellationToken::new()).is_err());
    Ok(())
}

#[test]
fn missing_mutation_column() -> Result<(), Report> {
    let input = table(&["genomeID", "pangoLin"], &[&["g1", "BA.2"]])?;
    assert!(normalize_table(input, None, &CancellationToken::new()).is_err());
    Ok(())
}

#[test]
fn cancelled() -> Result<(), Report> {
    let input = table(&["genomeID", "listV"], &[&["g1", "3622_G|."]])?;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let e = normalize_table(input, None, &cancel).expect_err("run should be cancelled");
    assert_eq!(e.downcast_ref::<Error>(), Some(&Error::Cancelled));
    Ok(())
}

#[test]
fn normalize_file() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("metadata.tsv");
    std::fs::write(&input, "Virus name\tPango lineage\tlistV\ng1\tXBB.1\t3622_G|.\n")?;
    let args = NormalizeArgs { input, output: dir.path().join("out/normalized.tsv"), format: None };
    normalize(&args)?;

    let observed = Table::read(&args.output)?;
    assert_eq!(observed.headers, ["genomeID", "pangoLin", "mutations"]);
    assert_eq!(observed.rows, [["g1", "XBB.1", "3622"]]);
    Ok(())
}

#[test]
fn overflowing_position_passes_through() {
    let raw = format!("3622_G|.,{}_A.|CA", usize::MAX);
    let observed = Normalizer::new().normalize(&raw, SourceFormat::AlignmentDiff);
    assert_eq!(observed.mutations, format!("3622,{}_A.|CA", usize::MAX));
    assert!(matches!(observed.malformed[..], [MutationError::InvalidPosition { .. }]));
}
