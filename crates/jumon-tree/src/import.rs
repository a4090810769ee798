//! Replaying parsed prompt text into a selection tree.

use std::collections::HashSet;
use std::sync::Arc;

use jumon_taxonomy::Taxonomy;
use jumon_types::{Rank, Term};

use crate::Result;
use crate::parse::{ParsedPrompt, ParsedTerm, parse};
use crate::tree::SelectionTree;

/// What an import did.
#[derive(Clone, Debug, Default)]
pub struct ImportReport {
    /// Terms newly selected, in input order.
    pub added: Vec<Arc<Term>>,
    /// Terms skipped because they were already selected.
    pub skipped: Vec<Arc<Term>>,
    /// Tokens that named no term.
    pub unresolved: Vec<String>,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.skipped.is_empty() && self.unresolved.is_empty()
    }
}

impl SelectionTree {
    /// Parse `text` and merge it into this tree.
    pub fn import_text(&mut self, taxonomy: &Taxonomy, text: &str) -> Result<ImportReport> {
        let parsed = parse(taxonomy, text);
        self.import(&parsed)
    }

    /// Merge a parsed prompt into this tree.
    ///
    /// Top-level terms are selected as singletons. The fresh members of each
    /// span are selected and then grouped together, and the span weight is
    /// applied to the resulting group (or to the singleton when only one
    /// member was new). Terms already in the tree are skipped and keep their
    /// current position.
    pub fn import(&mut self, parsed: &ParsedPrompt) -> Result<ImportReport> {
        let mut report = ImportReport {
            unresolved: parsed.unresolved.clone(),
            ..ImportReport::default()
        };

        for run in runs(&parsed.items) {
            let mut seen: HashSet<&Rank> = HashSet::new();
            let mut fresh = Vec::new();
            for item in run {
                if !seen.insert(&item.term.rank) || self.contains(&item.term) {
                    report.skipped.push(Arc::clone(&item.term));
                    continue;
                }
                self.select(Arc::clone(&item.term));
                fresh.push(Arc::clone(&item.term));
            }

            let weight = run[0].group.and_then(|span| parsed.group_weights.get(&span).copied());
            match fresh.as_slice() {
                [] => {}
                [only] => {
                    if let (Some(weight), Some(owner)) = (weight, self.find_group(self.root(), only)) {
                        self.set_weight(owner, Some(weight))?;
                    }
                }
                _ if run[0].group.is_some() => {
                    if let Some(group) = self.group(self.root(), &fresh)? {
                        if weight.is_some() {
                            self.set_weight(group, weight)?;
                        }
                    }
                }
                _ => {}
            }
            report.added.extend(fresh);
        }

        tracing::debug!(
            added = report.added.len(),
            skipped = report.skipped.len(),
            unresolved = report.unresolved.len(),
            "imported prompt"
        );
        Ok(report)
    }
}

/// Split items into runs: each span is one run, each top-level item its own.
fn runs(items: &[ParsedTerm]) -> Vec<&[ParsedTerm]> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..=items.len() {
        let boundary = i == items.len() || items[i].group.is_none() || items[i].group != items[start].group;
        if boundary {
            out.push(&items[start..i]);
            start = i;
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
