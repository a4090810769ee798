//! The loaded taxonomy and its lookup tables.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use jumon_types::{Rank, Term, TermField};

use crate::loader::build_root;
use crate::{DEFAULT_TAXONOMY, Result, TaxonomyError};

/// A node in the category tree.
#[derive(Clone, Debug)]
pub enum TaxonomyNode {
    Category(Category),
    Term(Arc<Term>),
}

impl TaxonomyNode {
    pub fn rank(&self) -> &Rank {
        match self {
            TaxonomyNode::Category(category) => &category.rank,
            TaxonomyNode::Term(term) => &term.rank,
        }
    }
}

/// A named category: either a list of terms or a list of sub-categories.
#[derive(Clone, Debug)]
pub struct Category {
    /// `None` only for the root.
    pub name: Option<String>,
    pub rank: Rank,
    pub children: Vec<TaxonomyNode>,
}

impl Category {
    /// Every term below this category, depth-first in declaration order.
    pub fn terms(&self) -> Vec<&Arc<Term>> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a Arc<Term>>) {
        for child in &self.children {
            match child {
                TaxonomyNode::Term(term) => out.push(term),
                TaxonomyNode::Category(category) => category.collect_terms(out),
            }
        }
    }

    /// Direct sub-categories, skipping terms.
    pub fn subcategories(&self) -> impl Iterator<Item = &Category> {
        self.children.iter().filter_map(|child| match child {
            TaxonomyNode::Category(category) => Some(category),
            TaxonomyNode::Term(_) => None,
        })
    }

    /// First category (depth-first, this one included) with the given name.
    pub fn find(&self, name: &str) -> Option<&Category> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.subcategories().find_map(|sub| sub.find(name))
    }
}

/// Immutable term taxonomy with precomputed lookup maps.
///
/// Build once with [`Taxonomy::embedded`], [`Taxonomy::load`], or
/// [`Taxonomy::from_json_str`], then share behind an `Arc`.
#[derive(Debug)]
pub struct Taxonomy {
    root: Category,
    /// All terms in traversal (= rank) order.
    terms: Vec<Arc<Term>>,
    by_output: HashMap<String, Vec<usize>>,
    by_display: HashMap<String, Vec<usize>>,
    by_rank: HashMap<Rank, usize>,
}

impl Taxonomy {
    /// Parse a taxonomy from JSON source text.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(source)?;
        Self::from_value(&value)
    }

    /// Build a taxonomy from an already-parsed JSON value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let root = build_root(value)?;
        Self::from_root(root)
    }

    /// Load a taxonomy JSON file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let taxonomy = Self::from_json_str(&source)?;
        tracing::info!(path = %path.display(), terms = taxonomy.len(), "loaded taxonomy");
        Ok(taxonomy)
    }

    /// The taxonomy compiled into the binary.
    pub fn embedded() -> Result<Self> {
        let taxonomy = Self::from_json_str(DEFAULT_TAXONOMY)?;
        tracing::debug!(terms = taxonomy.len(), "loaded embedded taxonomy");
        Ok(taxonomy)
    }

    fn from_root(root: Category) -> Result<Self> {
        let terms: Vec<Arc<Term>> = root.terms().into_iter().cloned().collect();
        if terms.is_empty() {
            return Err(TaxonomyError::Empty);
        }

        let mut by_output: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_display: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_rank = HashMap::with_capacity(terms.len());
        for (index, term) in terms.iter().enumerate() {
            by_output.entry(term.output_text.clone()).or_default().push(index);
            by_display.entry(term.display_text.clone()).or_default().push(index);
            by_rank.insert(term.rank.clone(), index);
        }

        Ok(Self { root, terms, by_output, by_display, by_rank })
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Every term in traversal order. Each call starts a fresh iteration.
    pub fn terms(&self) -> impl Iterator<Item = &Arc<Term>> + Clone {
        self.terms.iter()
    }

    /// First term whose output text matches exactly.
    pub fn find_by_output_text(&self, text: &str) -> Option<Arc<Term>> {
        self.first(&self.by_output, text)
    }

    /// First term whose display text matches exactly.
    pub fn find_by_display_text(&self, text: &str) -> Option<Arc<Term>> {
        self.first(&self.by_display, text)
    }

    /// First term matching on the given side of the pair.
    pub fn find(&self, field: TermField, text: &str) -> Option<Arc<Term>> {
        match field {
            TermField::Display => self.find_by_display_text(text),
            TermField::Output => self.find_by_output_text(text),
        }
    }

    /// Every term sharing this output text, in traversal order.
    pub fn find_all_by_output_text(&self, text: &str) -> Vec<Arc<Term>> {
        self.by_output
            .get(text)
            .map(|indices| indices.iter().map(|&i| Arc::clone(&self.terms[i])).collect())
            .unwrap_or_default()
    }

    /// The term at exactly this rank.
    pub fn find_by_rank(&self, rank: &Rank) -> Option<Arc<Term>> {
        self.by_rank.get(rank).map(|&i| Arc::clone(&self.terms[i]))
    }

    /// Resolve a key produced by [`Term::key`].
    pub fn find_by_key(&self, key: &str) -> Option<Arc<Term>> {
        Term::rank_from_key(key).and_then(|rank| self.find_by_rank(&rank))
    }

    fn first(&self, map: &HashMap<String, Vec<usize>>, text: &str) -> Option<Arc<Term>> {
        map.get(text)
            .and_then(|indices| indices.first())
            .map(|&i| Arc::clone(&self.terms[i]))
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// The root category.
    pub fn categories(&self) -> &Category {
        &self.root
    }

    /// Names of the categories enclosing a term, outermost first.
    pub fn category_path(&self, term: &Term) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = &self.root;
        let steps = term.rank.as_slice();
        for &index in steps.iter().take(steps.len().saturating_sub(1)) {
            match current.children.get(index as usize) {
                Some(TaxonomyNode::Category(category)) => {
                    if let Some(name) = category.name.as_deref() {
                        path.push(name);
                    }
                    current = category;
                }
                _ => break,
            }
        }
        path
    }

    /// Total number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Always false for a successfully built taxonomy.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
