//! Read-only term taxonomy for jumon.
//!
//! The taxonomy is a static tree of named categories whose leaves are
//! `[display_text, output_text]` pairs. It is loaded once, before any
//! selection exists, and shared immutably (`Arc<Taxonomy>`) with every
//! session and with the prompt codec.
//!
//! # Source Format
//!
//! ```json
//! {
//!   "基本情報": {
//!     "品質": [
//!       ["最高傑作", "best quality"],
//!       ["傑作", "masterpiece"]
//!     ]
//!   }
//! }
//! ```
//!
//! Sibling order at every level defines rank, so the JSON object order must
//! survive parsing (serde_json's `preserve_order`).
//!
//! # Lookups
//!
//! All lookups are first-match in traversal order and return `Option`;
//! callers check before use. Duplicate output text under different
//! categories is permitted; [`Taxonomy::find_all_by_output_text`] returns
//! every match.

mod error;
mod loader;
mod taxonomy;

pub use error::TaxonomyError;
pub use taxonomy::{Category, Taxonomy, TaxonomyNode};

/// Embedded default taxonomy, used when no external file is configured.
pub const DEFAULT_TAXONOMY: &str = include_str!("../../../assets/defaults/taxonomy.json");

/// Result type for taxonomy operations.
pub type Result<T> = std::result::Result<T, TaxonomyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_taxonomy_loads() {
        let taxonomy = Taxonomy::embedded().unwrap();

        assert!(taxonomy.len() > 1000);
        let best = taxonomy.find_by_output_text("best quality").unwrap();
        assert_eq!(best.display_text, "最高傑作");
        assert_eq!(best.rank.as_slice(), &[0, 0, 0]);

        let masterpiece = taxonomy.find_by_display_text("傑作").unwrap();
        assert_eq!(masterpiece.output_text, "masterpiece");
        assert!(best.rank < masterpiece.rank);
    }

    #[test]
    fn test_embedded_taxonomy_duplicates_resolve_first() {
        let taxonomy = Taxonomy::embedded().unwrap();

        let all = taxonomy.find_all_by_output_text("knife");
        assert!(all.len() >= 2);
        let first = taxonomy.find_by_output_text("knife").unwrap();
        assert_eq!(first.rank, all[0].rank);
        assert!(all.windows(2).all(|w| w[0].rank < w[1].rank));
    }
}
