//! Error types for taxonomy loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a taxonomy.
///
/// Lookups never fail; only building the taxonomy does.
#[derive(Error, Debug)]
pub enum TaxonomyError {
    /// Taxonomy file could not be read.
    #[error("failed to read taxonomy {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source is not valid JSON.
    #[error("taxonomy JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value that is neither a category mapping, a term list, nor a
    /// `[display, output]` pair.
    #[error("invalid taxonomy entry at {path}: {reason}")]
    InvalidEntry { path: String, reason: String },

    /// The source parsed but contains no terms at all.
    #[error("taxonomy contains no terms")]
    Empty,
}
