//! Taxonomy browsing output for `jumon list` and `jumon lookup`.

use std::sync::Arc;

use jumon_taxonomy::{Category, Taxonomy, TaxonomyNode};
use jumon_types::Term;

/// Top-level categories with their term counts.
pub fn format_overview(taxonomy: &Taxonomy) -> Vec<String> {
    taxonomy
        .categories()
        .subcategories()
        .map(|category| {
            let name = category.name.as_deref().unwrap_or("<root>");
            format!("{name} ({} terms)", category.terms().len())
        })
        .collect()
}

/// A category as an ASCII tree of sub-categories and `display → output` terms.
pub fn format_category(category: &Category) -> Vec<String> {
    let mut lines = vec![category.name.clone().unwrap_or_else(|| "<root>".to_string())];
    format_children(category, "", &mut lines);
    lines
}

fn format_children(category: &Category, prefix: &str, lines: &mut Vec<String>) {
    for (i, child) in category.children.iter().enumerate() {
        let is_last = i == category.children.len() - 1;
        let connector = if is_last { "└─ " } else { "├─ " };
        match child {
            TaxonomyNode::Term(term) => {
                lines.push(format!("{prefix}{connector}{} → {}", term.display_text, term.output_text));
            }
            TaxonomyNode::Category(sub) => {
                lines.push(format!("{prefix}{connector}{}", sub.name.as_deref().unwrap_or("")));
                let child_prefix = if is_last { format!("{prefix}   ") } else { format!("{prefix}│  ") };
                format_children(sub, &child_prefix, lines);
            }
        }
    }
}

/// Terms matching `query` exactly on either side, in taxonomy order.
///
/// Falls back to a case-insensitive substring match when nothing matches
/// exactly.
pub fn search(taxonomy: &Taxonomy, query: &str) -> Vec<Arc<Term>> {
    let exact: Vec<Arc<Term>> = taxonomy
        .terms()
        .filter(|t| t.display_text == query || t.output_text == query)
        .cloned()
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    let needle = query.to_lowercase();
    taxonomy
        .terms()
        .filter(|t| t.display_text.to_lowercase().contains(&needle) || t.output_text.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// `display → output  [key] category / path`
pub fn describe(taxonomy: &Taxonomy, term: &Term) -> String {
    format!(
        "{} → {}  [{}] {}",
        term.display_text,
        term.output_text,
        term.key(),
        taxonomy.category_path(term).join(" / ")
    )
}

// ============================================================================
// Tests
// ============================================================================
