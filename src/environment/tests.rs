use crate::corpus::{Corpus, GenomeRecord, Statistics};
use crate::environment::*;
use crate::error::Error;
use crate::mutation::Mutation;
use color_eyre::eyre::{Report, Result};
use lcenv_table::Table;
use std::str::FromStr;

fn m(token: &str) -> Mutation {
    Mutation::from_str(token).expect("canonical test mutation")
}

/// Push `n` genomes of a lineage carrying the same mutations.
fn push(corpus: &mut Corpus, lineage: &str, n: usize, tokens: &[&str]) {
    for i in 0..n {
        let mutations = tokens.iter().map(|t| m(t)).collect();
        let id = format!("{lineage}/{}", corpus.len() + i);
        corpus.genomes.push(GenomeRecord::new(&id, Some(lineage), mutations));
    }
}

fn corpus() -> Corpus {
    let mut corpus = Corpus::new();
    // BA.2: 241_C|T in all, 3622 in 8 of 10
    push(&mut corpus, "BA.2", 8, &["241_C|T", "3622"]);
    push(&mut corpus, "BA.2", 2, &["241_C|T"]);
    // BA.5: 7124_.|TTTA in all, 241_C|T in 5 of 10
    push(&mut corpus, "BA.5", 5, &["7124_.|TTTA", "241_C|T"]);
    push(&mut corpus, "BA.5", 5, &["7124_.|TTTA", "10415_10429"]);
    // XBB: 10 genomes, recombinant
    push(&mut corpus, "XBB", 10, &["5000_A|G"]);
    // BQ.1: 9 genomes, below the minimum
    push(&mut corpus, "BQ.1", 9, &["9000_G|A"]);
    corpus
}

#[test]
fn insufficient_support_is_excluded() -> Result<(), Report> {
    let environment = EnvironmentBuilder::new(10, 0.75).build(&Statistics::compute(&corpus()));

    assert_eq!(environment.probability_matrix.lineages, ["BA.2", "BA.5", "XBB"]);
    assert_eq!(environment.characteristic_matrix.lineages, ["BA.2", "BA.5", "XBB"]);
    assert!(environment.probability_matrix.get(&m("9000_G|A"), "BA.2").is_none());
    assert!(environment.probability_matrix.column("BQ.1").is_none());
    Ok(())
}

#[test]
fn matrices() -> Result<(), Report> {
    let environment = EnvironmentBuilder::new(10, 0.75).build(&Statistics::compute(&corpus()));

    let probability = &environment.probability_matrix;
    let observed = probability.mutations().map(|m| m.to_string()).collect::<Vec<_>>();
    assert_eq!(observed, ["241_C|T", "3622", "5000_A|G", "7124_.|TTTA", "10415_10429"]);
    assert_eq!(probability.get(&m("3622"), "BA.2"), Some(0.8));
    assert_eq!(probability.get(&m("241_C|T"), "BA.5"), Some(0.5));
    assert_eq!(probability.get(&m("3622"), "BA.5"), Some(0.0));

    let characteristic = &environment.characteristic_matrix;
    let observed = characteristic.mutations().map(|m| m.to_string()).collect::<Vec<_>>();
    assert_eq!(observed, ["241_C|T", "3622", "5000_A|G", "7124_.|TTTA"]);
    assert_eq!(characteristic.get(&m("241_C|T"), "BA.2"), Some(true));
    assert_eq!(characteristic.get(&m("241_C|T"), "BA.5"), Some(false));
    Ok(())
}

#[test]
fn characteristic_is_subset_of_probability() -> Result<(), Report> {
    let environment = EnvironmentBuilder::new(10, 0.75).build(&Statistics::compute(&corpus()));
    let threshold = environment.char_threshold;

    for (mutation, values) in &environment.characteristic_matrix.rows {
        for (lineage, is_characteristic) in environment.characteristic_matrix.lineages.iter().zip(values) {
            let p = environment.probability_matrix.get(mutation, lineage);
            assert!(p.is_some());
            if *is_characteristic {
                assert!(p.unwrap_or_default() >= threshold);
            }
        }
    }
    Ok(())
}

#[test]
fn quality_excludes_recombinants() -> Result<(), Report> {
    let environment = EnvironmentBuilder::default().build(&Statistics::compute(&corpus()));
    let observed = environment.lineage_quality.keys().cloned().collect::<Vec<_>>();
    // quality reports every non-recombinant lineage, selected or not
    assert_eq!(observed, ["BA.2", "BA.5", "BQ.1"]);
    assert_eq!(environment.lineage_quality["BQ.1"], 9);
    Ok(())
}

#[test]
fn empty_environment() -> Result<(), Report> {
    let environment = EnvironmentBuilder::new(100, 0.75).build(&Statistics::compute(&corpus()));
    assert!(environment.probability_matrix.is_empty());
    assert!(environment.characteristic_matrix.is_empty());
    // global probability is still defined
    assert!(!environment.global_probability.is_empty());

    let e = environment.check().expect_err("environment should be empty");
    assert_eq!(e.downcast_ref::<Error>(), Some(&Error::EmptyEnvironment { min_genome_count: 100 }));

    let environment = EnvironmentBuilder::default().build(&Statistics::compute(&Corpus::new()));
    assert!(environment.check().is_err());
    Ok(())
}

#[test]
fn write_artifacts() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let environment = EnvironmentBuilder::default().build(&Statistics::compute(&corpus()));
    environment.write_all(&dir.path())?;

    let lc_df = Table::read(&dir.path().join("lc_df.csv"))?;
    assert_eq!(lc_df.headers, ["mutation", "BA.2", "BA.5", "XBB", "lc_pos"]);
    assert_eq!(lc_df.rows[0], ["241_C|T", "true", "false", "false", "241"]);

    let c2lp = Table::read(&dir.path().join("change2lineage_probability.csv"))?;
    assert_eq!(c2lp.headers, ["mutation", "BA.2", "BA.5", "XBB", "pos"]);
    assert_eq!(c2lp.rows[1], ["3622", "0.8", "0", "0", "3622"]);

    let quality = Table::read(&dir.path().join("lc_quality_df.csv"))?;
    assert_eq!(quality.headers, ["", "BA.2", "BA.5", "BQ.1"]);
    assert_eq!(quality.rows, [["num", "10", "10", "9"]]);

    let change = Table::read(&dir.path().join("change_probability.csv"))?;
    assert_eq!(change.headers, ["mutation", "probability", "pos"]);
    assert_eq!(change.rows.len(), 6);
    assert_eq!(change.rows[0][0], "241_C|T");
    Ok(())
}

#[test]
fn write_with_suffix() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let environment = EnvironmentBuilder::default().build(&Statistics::compute(&corpus()));
    let artifacts = [Artifact::CharacteristicMatrix, Artifact::LineageQuality];
    environment.write(&dir.path(), &artifacts, WITH_RECOMBINANTS_SUFFIX)?;

    assert!(dir.path().join("lc_df_with_X.csv").exists());
    assert!(dir.path().join("lc_quality_df.csv").exists());
    assert!(!dir.path().join("lc_df.csv").exists());
    Ok(())
}

#[test]
fn summary() -> Result<(), Report> {
    let environment = EnvironmentBuilder::default().build(&Statistics::compute(&corpus()));
    let summary = environment.summary().to_string();
    assert!(summary.contains("BA.2"));
    assert!(summary.contains("XBB"));
    assert!(!summary.contains("BQ.1"));
    Ok(())
}

#[test]
fn recombinant_names() {
    assert!(is_recombinant("XA"));
    assert!(is_recombinant("XBB"));
    assert!(!is_recombinant("XBB.1"));
    assert!(!is_recombinant("B.1.1.7"));
    assert!(!is_recombinant(""));
}
