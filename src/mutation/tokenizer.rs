use crate::error::MutationError;
use crate::mutation::{check_span, parse_coord, Mutation};
use itertools::Itertools;
use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Nextstrain style substitution without separators, ex. `C241T`.
static PRE_ATOMIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([A-Z-]+)(\d+)([A-Z-]+)$").unwrap());
/// Aligned entry without gap markers, ex. `5122_C|AG`.
static ALIGNED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)_([A-Z-]+)\|([A-Z-]+)$").unwrap());

/// Gap marker in aligned bases.
const GAP: char = '.';

// ----------------------------------------------------------------------------
// Entry
// ----------------------------------------------------------------------------

/// The classification of one raw mutation entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry<'raw> {
    /// Already in canonical notation.
    Canonical(Mutation),
    /// Substitution without separators, ex. `C241T`.
    PreAtomic { coord: usize, reference: &'raw str, alt: &'raw str },
    /// Gap-only alternate, ex. `3622_G|.`.
    Deletion { coord: usize, reference: &'raw str },
    /// Gap-only reference, ex. `7124_....|TTTA`.
    Insertion { coord: usize, alt: &'raw str },
    /// Mixed aligned bases, ex. `6959_CTT...|GGAGTT`.
    Compound { coord: usize, reference: &'raw str, alt: &'raw str },
}

impl<'raw> Entry<'raw> {
    /// Classify a raw mutation entry.
    ///
    /// ```rust
    /// use lcenv::mutation::Entry;
    ///
    /// let entry = Entry::classify("3622_G|.")?;
    /// assert_eq!(entry, Entry::Deletion { coord: 3622, reference: "G" });
    /// assert!(Entry::classify("5122_CTT|..").is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn classify(raw: &'raw str) -> Result<Self, MutationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(MutationError::Empty { raw: raw.to_string() });
        }

        if !raw.contains(GAP) {
            return classify_ungapped(raw);
        }

        let unrecognized = || MutationError::Unrecognized { raw: raw.to_string() };
        let (left, alt) = raw.split_once('|').ok_or_else(unrecognized)?;
        let (pos, reference) = left.split_once('_').ok_or_else(unrecognized)?;
        let coord = parse_coord(pos, raw)?;

        let is_base = |c: char| c.is_ascii_alphabetic() || c == '-' || c == GAP;
        if reference.is_empty() || alt.is_empty() || !reference.chars().all(is_base) || !alt.chars().all(is_base)
        {
            return Err(unrecognized());
        }

        let length_mismatch = || MutationError::LengthMismatch {
            raw: raw.to_string(),
            reference: reference.chars().count(),
            alt: alt.chars().count(),
        };
        check_span(coord, reference.chars().count().max(alt.chars().count()), raw)?;

        let all_gaps = |s: &str| s.chars().all(|c| c == GAP);
        let any_gaps = |s: &str| s.contains(GAP);

        match (all_gaps(reference), all_gaps(alt)) {
            (true, true) => Err(MutationError::Empty { raw: raw.to_string() }),
            (true, false) if !any_gaps(alt) => Ok(Entry::Insertion { coord, alt }),
            (false, true) if !any_gaps(reference) => {
                if reference.chars().count() != alt.chars().count() {
                    return Err(length_mismatch());
                }
                Ok(Entry::Deletion { coord, reference })
            }
            _ => {
                if reference.chars().count() != alt.chars().count() {
                    return Err(length_mismatch());
                }
                Ok(Entry::Compound { coord, reference, alt })
            }
        }
    }

    /// Break the entry into canonical mutations, ordered by position.
    pub fn decompose(self) -> Vec<Mutation> {
        match self {
            Entry::Canonical(mutation) => vec![mutation],
            Entry::PreAtomic { coord, reference, alt } => {
                vec![Mutation::substitution(coord, reference, alt)]
            }
            Entry::Deletion { coord, reference } => vec![Mutation::deletion(coord, reference)],
            Entry::Insertion { coord, alt } => vec![Mutation::insertion(coord, alt)],
            Entry::Compound { coord, reference, alt } => decompose_compound(coord, reference, alt),
        }
    }
}

fn classify_ungapped(raw: &str) -> Result<Entry<'_>, MutationError> {
    match raw.parse::<Mutation>() {
        Ok(mutation) => return Ok(Entry::Canonical(mutation)),
        Err(e @ MutationError::InvalidPosition { .. }) => return Err(e),
        Err(_) => (),
    }

    if let Some(caps) = PRE_ATOMIC.captures(raw) {
        let coord = parse_coord(&caps[2], raw)?;
        let (reference, alt) = (caps.get(1), caps.get(3));
        if let (Some(reference), Some(alt)) = (reference, alt) {
            if reference.len() != alt.len() {
                return Err(MutationError::LengthMismatch {
                    raw: raw.to_string(),
                    reference: reference.len(),
                    alt: alt.len(),
                });
            }
            check_span(coord, reference.len(), raw)?;
            return Ok(Entry::PreAtomic { coord, reference: reference.as_str(), alt: alt.as_str() });
        }
    }

    if let Some(caps) = ALIGNED.captures(raw) {
        return Err(MutationError::LengthMismatch {
            raw: raw.to_string(),
            reference: caps[2].len(),
            alt: caps[3].len(),
        });
    }

    Err(MutationError::Unrecognized { raw: raw.to_string() })
}

/// What one aligned site of a compound entry contributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Site {
    Substitution,
    Deletion,
    Insertion,
    Gap,
}

impl Site {
    fn new(reference: char, alt: char) -> Self {
        match (reference == GAP, alt == GAP) {
            (false, false) => Site::Substitution,
            (false, true) => Site::Deletion,
            (true, false) => Site::Insertion,
            (true, true) => Site::Gap,
        }
    }
}

/// Split aligned bases into maximal runs of the same kind.
fn decompose_compound(coord: usize, reference: &str, alt: &str) -> Vec<Mutation> {
    let mut mutations = Vec::new();

    let sites = reference.chars().zip(alt.chars()).enumerate();
    let runs = sites.group_by(|(_, (r, a))| Site::new(*r, *a));

    for (site, run) in &runs {
        let run = run.collect_vec();
        let Some(&(offset, _)) = run.first() else {
            continue;
        };
        let start = coord + offset;
        let run_ref = run.iter().map(|(_, (r, _))| r).collect::<String>();
        let run_alt = run.iter().map(|(_, (_, a))| a).collect::<String>();

        match site {
            Site::Substitution => mutations.push(Mutation::substitution(start, &run_ref, &run_alt)),
            Site::Deletion => mutations.push(Mutation::deletion(start, &run_ref)),
            Site::Insertion => mutations.push(Mutation::insertion(start, &run_alt)),
            Site::Gap => warn!(
                "Skipping {} site(s) at {start} in {coord}_{reference}|{alt}: gap on both sides.",
                run.len()
            ),
        }
    }

    mutations
}

/// Decompose a raw mutation entry into canonical mutations.
///
/// ```rust
/// use lcenv::mutation::decompose;
/// use itertools::Itertools;
///
/// let tokens = decompose("6959_CTT...|GGAGTT")?;
/// assert_eq!(tokens.iter().join(","), "6959_CTT|GGA,6962_.|GTT");
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn decompose(raw: &str) -> Result<Vec<Mutation>, MutationError> {
    Entry::classify(raw).map(Entry::decompose)
}

// ----------------------------------------------------------------------------
// Tokenizer
// ----------------------------------------------------------------------------

/// Decomposes raw mutation entries, remembering the outcome of every distinct entry.
///
/// The same raw entries recur across thousands of genomes, so each is decomposed only once.
/// A tokenizer is not shared between threads: give each worker its own.
#[derive(Debug, Default)]
pub struct Tokenizer {
    cache: HashMap<String, Result<Vec<Mutation>, MutationError>>,
    hits: usize,
}

impl Tokenizer {
    pub fn new() -> Self {
        Tokenizer::default()
    }

    /// Decompose `raw`, reusing a previous result for the same entry.
    ///
    /// ```rust
    /// use lcenv::mutation::Tokenizer;
    ///
    /// let mut tokenizer = Tokenizer::new();
    /// let first = tokenizer.tokenize("10415_AACCTGAAACCGGGA|...............").clone()?;
    /// let again = tokenizer.tokenize("10415_AACCTGAAACCGGGA|...............").clone()?;
    /// assert_eq!(first, again);
    /// assert_eq!(first[0].to_string(), "10415_10429");
    /// assert_eq!(tokenizer.hits(), 1);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn tokenize(&mut self, raw: &str) -> &Result<Vec<Mutation>, MutationError> {
        let raw = raw.trim();
        if self.cache.contains_key(raw) {
            self.hits += 1;
        } else {
            let result = decompose(raw);
            if let Err(e) = &result {
                debug!("{e}");
            }
            self.cache.insert(raw.to_string(), result);
        }
        &self.cache[raw]
    }

    /// Number of distinct entries seen.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }
}
