use itertools::Itertools;
use lcenv::mutation::{decompose, Kind};
use lcenv::normalize::{Normalizer, SourceFormat};
use lcenv::Mutation;
use proptest::prelude::*;

/// Aligned (reference, alt) sites, never a gap on both sides.
fn sites() -> impl Strategy<Value = Vec<(char, char)>> {
    let bases = ['A', 'C', 'G', 'T', '.'];
    let pairs = bases
        .iter()
        .cartesian_product(bases.iter())
        .filter(|(r, a)| !(**r == '.' && **a == '.'))
        .map(|(r, a)| (*r, *a))
        .collect_vec();
    prop::collection::vec(prop::sample::select(pairs), 1..16)
}

fn entry(coord: usize, sites: &[(char, char)]) -> String {
    let reference = sites.iter().map(|(r, _)| r).collect::<String>();
    let alt = sites.iter().map(|(_, a)| a).collect::<String>();
    format!("{coord}_{reference}|{alt}")
}

proptest! {
    #[test]
    fn deletion_length_matches_span(start in 1usize..30_000, width in 0usize..500) {
        let end = start + width;
        let deletion = format!("{start}_{end}").parse::<Mutation>().unwrap();
        prop_assert_eq!(deletion.kind, Kind::Deletion);
        prop_assert_eq!(deletion.len(), width + 1);
        prop_assert_eq!(deletion.end(), end);
    }

    #[test]
    fn reversed_deletion_is_rejected(start in 2usize..30_000, width in 1usize..500) {
        let end = start.saturating_sub(width).max(1);
        prop_assume!(end < start);
        let token = format!("{start}_{end}");
        prop_assert!(token.parse::<Mutation>().is_err());
    }

    #[test]
    fn decompose_reconstructs_alignment(coord in 1usize..30_000, sites in sites()) {
        let raw = entry(coord, &sites);
        let mutations = decompose(&raw).unwrap();

        // put the gaps back, token by token
        let (mut reference, mut alt) = (String::new(), String::new());
        for mutation in &mutations {
            prop_assert_eq!(mutation.coord, coord + reference.chars().count());
            match mutation.kind {
                Kind::Substitution => {
                    reference.push_str(&mutation.reference);
                    alt.push_str(&mutation.alt);
                }
                Kind::Deletion => {
                    reference.push_str(&mutation.reference);
                    alt.push_str(&".".repeat(mutation.len()));
                }
                Kind::Insertion => {
                    reference.push_str(&".".repeat(mutation.alt.len()));
                    alt.push_str(&mutation.alt);
                }
            }
        }

        prop_assert_eq!(entry(coord, &reference.chars().zip(alt.chars()).collect_vec()), raw);
        prop_assert_eq!(reference.chars().count(), sites.len());
    }

    #[test]
    fn decompose_yields_canonical_tokens(coord in 1usize..30_000, sites in sites()) {
        let raw = entry(coord, &sites);
        for mutation in decompose(&raw).unwrap() {
            let token = mutation.to_string();
            prop_assert!(Mutation::is_canonical(&token), "{} is not canonical", token);
            prop_assert_eq!(token.parse::<Mutation>().unwrap(), mutation);
        }
    }

    #[test]
    fn normalization_is_idempotent(entries in prop::collection::vec((1usize..30_000, sites()), 0..8)) {
        let raw = entries.iter().map(|(coord, sites)| entry(*coord, sites)).join(",");
        let mut normalizer = Normalizer::new();
        let once = normalizer.normalize(&raw, SourceFormat::AlignmentDiff);
        prop_assert!(once.malformed.is_empty());
        let twice = normalizer.normalize(&once.mutations, SourceFormat::AlignmentDiff);
        prop_assert_eq!(once, twice);
    }
}
