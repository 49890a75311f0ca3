//! Canonical [`Mutation`] tokens and the [`Tokenizer`] that decomposes raw alignment diffs into them.
//!
//! ## Canonical Notation
//!
//! | Kind         | Notation              | Example       |
//! |--------------|-----------------------|---------------|
//! | Substitution | `{pos}_{ref}\|{alt}`  | `241_C\|T`    |
//! | Deletion     | `{pos}`               | `3622`        |
//! | Deletion     | `{start}_{end}`       | `10415_10429` |
//! | Insertion    | `{pos}_.\|{alt}`      | `7124_.\|TTTA` |

mod tokenizer;

#[doc(inline)]
pub use tokenizer::{decompose, Entry, Tokenizer};

use crate::error::MutationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

static SUBSTITUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)_([A-Z-]+)\|([A-Z-]+)$").unwrap());
static DELETION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)(?:_(\d+))?$").unwrap());
static INSERTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)_\.\|([A-Z-]+)$").unwrap());

// ----------------------------------------------------------------------------
// Kind
// ----------------------------------------------------------------------------

/// The kind of change a [`Mutation`] describes.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Substitution,
    Deletion,
    Insertion,
}

// ----------------------------------------------------------------------------
// Mutation
// ----------------------------------------------------------------------------

/// One atomic, position-indexed change relative to the reference genome.
///
/// - Substitutions have `reference` and `alt` bases of equal length, spanning contiguous sites.
/// - Deletions have an empty `alt`, and `reference` bases only when they were recorded.
/// - Insertions have an empty `reference` and `alt` bases.
///
/// Deletions are identified by their span only: the canonical notation does not record which
/// bases were removed, so two deletions over the same sites are equal regardless of `reference`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Mutation {
    /// 1-based genomic coordinate of the first affected site.
    pub coord: usize,
    pub kind: Kind,
    pub reference: String,
    pub alt: String,
    /// Number of reference sites affected.
    length: usize,
}

impl Mutation {
    /// Returns a substitution of `reference` by `alt` starting at `coord`.
    pub fn substitution(coord: usize, reference: &str, alt: &str) -> Self {
        Mutation {
            coord,
            kind: Kind::Substitution,
            reference: reference.to_string(),
            alt: alt.to_string(),
            length: reference.chars().count(),
        }
    }

    /// Returns a deletion of the `reference` bases starting at `coord`.
    pub fn deletion(coord: usize, reference: &str) -> Self {
        Mutation {
            coord,
            kind: Kind::Deletion,
            reference: reference.to_string(),
            alt: String::new(),
            length: reference.chars().count(),
        }
    }

    /// Returns a deletion spanning `coord..=end` with unknown reference bases.
    ///
    /// ```rust
    /// use lcenv::Mutation;
    ///
    /// let deletion = Mutation::deletion_span(1, 50_000_000);
    /// assert_eq!(deletion.len(), 50_000_000);
    /// assert!(deletion.reference.is_empty());
    /// assert_eq!(deletion, Mutation::deletion_span(1, 50_000_000));
    /// ```
    pub fn deletion_span(coord: usize, end: usize) -> Self {
        let length = end.saturating_sub(coord).saturating_add(1);
        Mutation { coord, kind: Kind::Deletion, reference: String::new(), alt: String::new(), length }
    }

    /// Returns an insertion of the `alt` bases at `coord`.
    pub fn insertion(coord: usize, alt: &str) -> Self {
        Mutation { coord, kind: Kind::Insertion, reference: String::new(), alt: alt.to_string(), length: 0 }
    }

    /// Number of reference sites affected (0 for insertions).
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the mutation affects no reference sites.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last reference coordinate covered by the mutation.
    ///
    /// ```rust
    /// use lcenv::Mutation;
    ///
    /// assert_eq!(Mutation::deletion(10415, "AACCTGAAACCGGGA").end(), 10429);
    /// assert_eq!(Mutation::insertion(7124, "TTTA").end(), 7124);
    /// ```
    pub fn end(&self) -> usize {
        match self.len() {
            0 => self.coord,
            n => self.coord.saturating_add(n - 1),
        }
    }

    /// Returns true if `token` matches one of the three canonical shapes.
    ///
    /// ```rust
    /// use lcenv::Mutation;
    ///
    /// assert!(Mutation::is_canonical("241_C|T"));
    /// assert!(Mutation::is_canonical("3622"));
    /// assert!(Mutation::is_canonical("10415_10429"));
    /// assert!(Mutation::is_canonical("7124_.|TTTA"));
    /// assert!(!Mutation::is_canonical("C241T"));
    /// assert!(!Mutation::is_canonical("3622_G|."));
    /// ```
    pub fn is_canonical(token: &str) -> bool {
        SUBSTITUTION.is_match(token) || DELETION.is_match(token) || INSERTION.is_match(token)
    }

    fn key(&self) -> (usize, Kind, usize, &str, &str) {
        match self.kind {
            Kind::Deletion => (self.coord, self.kind, self.len(), "", ""),
            _ => (self.coord, self.kind, self.len(), &self.reference, &self.alt),
        }
    }
}

impl PartialEq for Mutation {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Mutation {}

impl Hash for Mutation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Ord for Mutation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Mutation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Mutation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.kind {
            Kind::Substitution => write!(f, "{}_{}|{}", self.coord, self.reference, self.alt),
            Kind::Deletion if self.len() <= 1 => write!(f, "{}", self.coord),
            Kind::Deletion => write!(f, "{}_{}", self.coord, self.end()),
            Kind::Insertion => write!(f, "{}_.|{}", self.coord, self.alt),
        }
    }
}

impl FromStr for Mutation {
    type Err = MutationError;

    /// Parse a [`Mutation`] from its canonical notation.
    ///
    /// ```rust
    /// use lcenv::{Mutation, mutation::Kind};
    /// use std::str::FromStr;
    ///
    /// let deletion = Mutation::from_str("10415_10429")?;
    /// assert_eq!(deletion.kind, Kind::Deletion);
    /// assert_eq!(deletion.len(), 15);
    /// assert_eq!(deletion.to_string(), "10415_10429");
    /// assert!(Mutation::from_str("C241T").is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn from_str(token: &str) -> Result<Self, MutationError> {
        let token = token.trim();

        if let Some(caps) = DELETION.captures(token) {
            let coord = parse_coord(&caps[1], token)?;
            let end = match caps.get(2) {
                Some(end) => parse_coord(end.as_str(), token)?,
                None => coord,
            };
            if end < coord {
                return Err(MutationError::InvalidPosition { raw: token.to_string() });
            }
            check_span(coord, end - coord + 1, token)?;
            Ok(Mutation::deletion_span(coord, end))
        } else if let Some(caps) = INSERTION.captures(token) {
            let coord = parse_coord(&caps[1], token)?;
            Ok(Mutation::insertion(coord, &caps[2]))
        } else if let Some(caps) = SUBSTITUTION.captures(token) {
            let coord = parse_coord(&caps[1], token)?;
            let (reference, alt) = (&caps[2], &caps[3]);
            if reference.len() != alt.len() {
                return Err(MutationError::LengthMismatch {
                    raw: token.to_string(),
                    reference: reference.len(),
                    alt: alt.len(),
                });
            }
            check_span(coord, reference.len(), token)?;
            Ok(Mutation::substitution(coord, reference, alt))
        } else {
            Err(MutationError::Unrecognized { raw: token.to_string() })
        }
    }
}

/// Parse a 1-based genomic coordinate.
pub(crate) fn parse_coord(pos: &str, raw: &str) -> Result<usize, MutationError> {
    match pos.trim().parse::<usize>() {
        Ok(coord) if coord >= 1 => Ok(coord),
        _ => Err(MutationError::InvalidPosition { raw: raw.to_string() }),
    }
}

/// Reject entries whose sites would run past the largest representable coordinate.
pub(crate) fn check_span(coord: usize, len: usize, raw: &str) -> Result<(), MutationError> {
    match coord.checked_add(len) {
        Some(_) => Ok(()),
        None => Err(MutationError::InvalidPosition { raw: raw.to_string() }),
    }
}
