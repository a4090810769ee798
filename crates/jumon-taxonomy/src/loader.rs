//! Conversion from the JSON source format into the category tree.

use std::sync::Arc;

use jumon_types::{Rank, Term};
use serde_json::Value;

use crate::taxonomy::{Category, TaxonomyNode};
use crate::{Result, TaxonomyError};

/// Build the root category from a parsed JSON document.
///
/// The root may be a mapping of categories or, for tiny taxonomies, a bare
/// list of `[display, output]` pairs.
pub(crate) fn build_root(value: &Value) -> Result<Category> {
    build_category(value, None, Rank::empty(), "")
}

fn build_category(value: &Value, name: Option<String>, rank: Rank, path: &str) -> Result<Category> {
    let mut children = Vec::new();

    match value {
        Value::Object(map) => {
            for (index, (sub_name, sub_value)) in map.iter().enumerate() {
                let sub_path = join_path(path, sub_name);
                let sub = build_category(sub_value, Some(sub_name.clone()), rank.child(index as u32), &sub_path)?;
                children.push(TaxonomyNode::Category(sub));
            }
        }
        Value::Array(entries) => {
            for (index, entry) in entries.iter().enumerate() {
                let term = build_term(entry, rank.child(index as u32), &format!("{path}[{index}]"))?;
                children.push(TaxonomyNode::Term(Arc::new(term)));
            }
        }
        other => {
            return Err(TaxonomyError::InvalidEntry {
                path: display_path(path),
                reason: format!("expected a category mapping or a term list, found {}", kind_of(other)),
            });
        }
    }

    Ok(Category { name, rank, children })
}

fn build_term(entry: &Value, rank: Rank, path: &str) -> Result<Term> {
    let invalid = |reason: &str| TaxonomyError::InvalidEntry {
        path: display_path(path),
        reason: reason.to_string(),
    };

    let pair = entry
        .as_array()
        .ok_or_else(|| invalid("expected a [display, output] pair"))?;
    let [display, output] = pair.as_slice() else {
        return Err(invalid("expected exactly two strings"));
    };
    let display = display.as_str().ok_or_else(|| invalid("display text is not a string"))?;
    let output = output.as_str().ok_or_else(|| invalid("output text is not a string"))?;

    Ok(Term::new(display, output, rank))
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}/{name}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() { "<root>".to_string() } else { path.to_string() }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Tests
// ============================================================================
