//! Taxonomy terms and their ranks.
//!
//! A [`Rank`] is the path of sibling indices from the taxonomy root down to a
//! category or term. Ranks order everything in jumon: selections, groups, and
//! the composed prompt all follow taxonomy declaration order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Sibling-index path from the taxonomy root.
///
/// Ordering compares element by element, treating a missing element as `-1`,
/// so a prefix sorts before all of its extensions. When every compared
/// element is equal the shorter path sorts first.
#[derive(Clone, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(Vec<u32>);

impl Rank {
    pub fn new(path: Vec<u32>) -> Self {
        Self(path)
    }

    /// The empty rank. Sorts before every non-empty rank.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Extend this rank by one level.
    pub fn child(&self, index: u32) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        Self(path)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Rank) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        for i in 0..len {
            let a = self.0.get(i).map_or(-1, |&v| i64::from(v));
            let b = other.0.get(i).map_or(-1, |&v| i64::from(v));
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Vec<u32>> for Rank {
    fn from(path: Vec<u32>) -> Self {
        Self(path)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "{}", parts.join("-"))
    }
}

impl fmt::Debug for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rank({:?})", self.0)
    }
}

/// Prefix of the compact string key for a term (`prompt0-1-2`).
const TERM_KEY_PREFIX: &str = "prompt";

/// One taxonomy entry: a display label, the text it contributes to the
/// prompt, and its fixed position.
///
/// Terms are immutable and owned by the taxonomy; selection trees hold shared
/// handles. Identity is the rank: two terms may share output text under
/// different categories.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    /// Label shown when picking (the source-language side of the pair).
    pub display_text: String,
    /// Text emitted into the composed prompt.
    pub output_text: String,
    /// Position in the taxonomy.
    pub rank: Rank,
}

impl Term {
    pub fn new(display_text: impl Into<String>, output_text: impl Into<String>, rank: Rank) -> Self {
        Self {
            display_text: display_text.into(),
            output_text: output_text.into(),
            rank,
        }
    }

    /// Compact string key derived from the rank: `"prompt{rank}"`.
    pub fn key(&self) -> String {
        format!("{TERM_KEY_PREFIX}{}", self.rank)
    }

    /// Parse the rank back out of a key produced by [`Term::key`].
    pub fn rank_from_key(key: &str) -> Option<Rank> {
        let digits = key.strip_prefix(TERM_KEY_PREFIX)?;
        if digits.is_empty() {
            return Some(Rank::empty());
        }
        digits
            .split('-')
            .map(|part| part.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()
            .map(Rank::new)
    }

    /// The requested side of the display/output pair.
    pub fn text(&self, field: TermField) -> &str {
        match field {
            TermField::Display => &self.display_text,
            TermField::Output => &self.output_text,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.output_text)
    }
}

/// Which side of a term's text pair to match against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum TermField {
    /// The display label.
    #[default]
    #[strum(serialize = "display", serialize = "label")]
    Display,
    /// The prompt output text.
    #[strum(serialize = "output", serialize = "text")]
    Output,
}

impl TermField {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TermField::Display => "display",
            TermField::Output => "output",
        }
    }

    /// The opposite side of the pair.
    pub fn other(&self) -> Self {
        match self {
            TermField::Display => TermField::Output,
            TermField::Output => TermField::Display,
        }
    }
}

impl fmt::Display for TermField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(path: &[u32]) -> Rank {
        Rank::new(path.to_vec())
    }

    #[test]
    fn test_rank_elementwise_order() {
        assert!(rank(&[0, 0]) < rank(&[0, 1]));
        assert!(rank(&[0, 9]) < rank(&[1, 0]));
        assert!(rank(&[2, 0, 5]) > rank(&[2, 0, 4, 9]));
    }

    #[test]
    fn test_rank_prefix_sorts_first() {
        assert!(rank(&[0]) < rank(&[0, 0]));
        assert!(Rank::empty() < rank(&[0]));
        assert_eq!(rank(&[1, 2]).cmp(&rank(&[1, 2])), Ordering::Equal);
    }

    #[test]
    fn test_rank_sort_is_declaration_order() {
        let mut ranks = vec![rank(&[1, 0]), rank(&[0, 2, 1]), rank(&[0]), rank(&[0, 2])];
        ranks.sort();
        assert_eq!(ranks, vec![rank(&[0]), rank(&[0, 2]), rank(&[0, 2, 1]), rank(&[1, 0])]);
    }

    #[test]
    fn test_rank_child_and_prefix() {
        let parent = rank(&[3]);
        let child = parent.child(4);
        assert_eq!(child, rank(&[3, 4]));
        assert!(parent.is_prefix_of(&child));
        assert!(!child.is_prefix_of(&parent));
    }

    #[test]
    fn test_term_key_roundtrip() {
        let term = Term::new("傑作", "masterpiece", rank(&[0, 0, 1]));
        assert_eq!(term.key(), "prompt0-0-1");
        assert_eq!(Term::rank_from_key(&term.key()), Some(term.rank.clone()));
        assert_eq!(Term::rank_from_key("prompt0-x"), None);
        assert_eq!(Term::rank_from_key("checked-0-1"), None);
    }

    #[test]
    fn test_term_text_field() {
        let term = Term::new("傑作", "masterpiece", rank(&[0, 1]));
        assert_eq!(term.text(TermField::Display), "傑作");
        assert_eq!(term.text(TermField::Output), "masterpiece");
        assert_eq!(term.to_string(), "masterpiece");
    }

    #[test]
    fn test_term_field_parse() {
        assert_eq!(TermField::from_str("display"), Some(TermField::Display));
        assert_eq!(TermField::from_str("LABEL"), Some(TermField::Display));
        assert_eq!(TermField::from_str("output"), Some(TermField::Output));
        assert_eq!(TermField::from_str("nope"), None);
        assert_eq!(TermField::Display.other(), TermField::Output);
    }
}
