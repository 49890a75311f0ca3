use crate::samples::*;
use chrono::NaiveDate;
use color_eyre::eyre::{Report, Result};
use lcenv_table::Table;
use std::collections::BTreeMap;

const METADATA: &str = "\
genomeID\tpangoLin\tCollection date\tlistV
g1\tXBB\t2023-01-05\t3622_G|.
g2\tXBB\t2023-03-01\t7124_....|TTTA
g3\tBA.2\t2023-03-02\t241_C|T
g4\t\t2023-03-03\t241_C|T
g5\tXBB.1.5\t2023-03-04\t
";

#[test]
fn samples_per_lineage() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("metadata.tsv");
    std::fs::write(&input, METADATA)?;

    let args = SamplesArgs { input, output_dir: dir.path().join("samples"), ..Default::default() };
    let counts = samples(&args)?;

    let expected = BTreeMap::from([("BA.2".to_string(), 1), ("XBB".to_string(), 2)]);
    assert_eq!(counts, expected);

    // sample files are tab-separated despite the extension
    let content = std::fs::read_to_string(args.output_dir.join("samples_XBB.csv"))?;
    let lines = content.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "genomeID\ttrue_lineage\tnuc_changes\tcollection_date");
    assert_eq!(lines[1], "g1\tXBB\t3622\t2023-01-05");
    assert_eq!(lines[2], "g2\tXBB\t7124_.|TTTA\t2023-03-01");

    let total = std::fs::read_to_string(args.output_dir.join(SAMPLES_TOTAL))?;
    assert_eq!(total, "{\n    \"BA.2\": 1,\n    \"XBB\": 2\n}");
    Ok(())
}

#[test]
fn recombinants_since() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("metadata.tsv");
    std::fs::write(&input, METADATA)?;

    let args = SamplesArgs {
        input,
        output_dir: dir.path().join("samples"),
        recombinants_only: true,
        since: NaiveDate::from_ymd_opt(2023, 2, 1),
        format: None,
    };
    let counts = samples(&args)?;
    assert_eq!(counts, BTreeMap::from([("XBB".to_string(), 1)]));
    assert!(!args.output_dir.join("samples_BA.2.csv").exists());
    Ok(())
}

#[test]
fn nothing_remains() -> Result<(), Report> {
    let mut table = Table::new();
    table.headers = ["genomeID", "pangoLin", "mutations"].map(String::from).to_vec();
    table.add_row(["g1", "BA.2", "241_C|T"].map(String::from))?;

    let args = SamplesArgs { recombinants_only: true, ..Default::default() };
    let groups = group_samples(&table, &args)?;
    assert!(groups.is_empty());

    let dir = tempfile::tempdir()?;
    let output_dir = dir.path().join("samples");
    assert!(write_samples(&groups, &output_dir)?.is_empty());
    assert!(!output_dir.exists());
    Ok(())
}

#[test]
fn since_requires_dates() -> Result<(), Report> {
    let mut table = Table::new();
    table.headers = ["genomeID", "pangoLin", "mutations"].map(String::from).to_vec();
    let args = SamplesArgs { since: NaiveDate::from_ymd_opt(2023, 2, 1), ..Default::default() };
    assert!(group_samples(&table, &args).is_err());
    Ok(())
}
