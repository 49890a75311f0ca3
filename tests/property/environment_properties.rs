use lcenv::corpus::GenomeRecord;
use lcenv::utils::CancellationToken;
use lcenv::{Corpus, EnvironmentBuilder, Mutation, Statistics};
use proptest::prelude::*;

const LINEAGES: &[&str] = &["BA.2", "BQ.1", "XBB"];

/// Genomes drawn from a small pool of lineages and substitutions.
fn corpus() -> impl Strategy<Value = Corpus> {
    let genome = (prop::sample::select(LINEAGES), prop::collection::vec(1usize..20, 0..6));
    prop::collection::vec(genome, 0..60).prop_map(|genomes| {
        let mut corpus = Corpus::new();
        for (i, (lineage, coords)) in genomes.into_iter().enumerate() {
            let mutations = coords.into_iter().map(|c| Mutation::substitution(c, "C", "T")).collect();
            corpus.genomes.push(GenomeRecord::new(&format!("g{i}"), Some(lineage), mutations));
        }
        corpus
    })
}

proptest! {
    #[test]
    fn probabilities_are_frequencies(corpus in corpus(), min_genome_count in 1usize..10, char_threshold in 0.0f64..=1.0) {
        let stats = Statistics::compute(&corpus);
        let environment = EnvironmentBuilder::new(min_genome_count, char_threshold).build(&stats);

        prop_assert!(environment.global_probability.iter().all(|(_, p)| (0.0..=1.0).contains(p)));
        for (_, row) in &environment.probability_matrix.rows {
            prop_assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn characteristic_is_subset_of_probability(corpus in corpus(), min_genome_count in 1usize..10, char_threshold in 0.0f64..=1.0) {
        let stats = Statistics::compute(&corpus);
        let environment = EnvironmentBuilder::new(min_genome_count, char_threshold).build(&stats);

        let characteristic = &environment.characteristic_matrix;
        let probability = &environment.probability_matrix;
        prop_assert_eq!(&characteristic.lineages, &probability.lineages);

        for (mutation, row) in &characteristic.rows {
            for (lineage, is_characteristic) in characteristic.lineages.iter().zip(row) {
                let frequency = probability.get(mutation, lineage);
                prop_assert!(frequency.is_some());
                prop_assert_eq!(*is_characteristic, frequency.unwrap_or(0.0) >= char_threshold);
            }
        }
    }

    #[test]
    fn selected_lineages_have_support(corpus in corpus(), min_genome_count in 1usize..10) {
        let stats = Statistics::compute(&corpus);
        let environment = EnvironmentBuilder::new(min_genome_count, 0.75).build(&stats);
        for lineage in &environment.probability_matrix.lineages {
            prop_assert!(stats.genome_counts[lineage] >= min_genome_count);
        }
    }

    #[test]
    fn parallel_statistics_match(corpus in corpus()) {
        let parallel = Statistics::par_compute(&corpus, &CancellationToken::new()).unwrap();
        prop_assert_eq!(parallel, Statistics::compute(&corpus));
    }
}
