//! Shared term and identity types for jumon.
//!
//! This crate is the leaf of the workspace: ranks, terms, and selection-tree
//! node identifiers. It has **no internal jumon dependencies**.
//!
//! # Relationship Overview
//!
//! ```text
//! Taxonomy ← static, loaded once
//!     └── Category (Rank)
//!         └── Term (Rank + display text + output text)
//!
//! SelectionTree ← per session, mutable
//!     └── Group (NodeId, optional weight)
//!         └── Leaf (NodeId) → shared Term
//! ```
//!
//! # Key Types
//!
//! |---------------|-----------------------------------------------|
//! | Type          | Purpose                                       |
//! |---------------|-----------------------------------------------|
//! | [`Rank`]      | Sibling-index path, the canonical order key   |
//! | [`Term`]      | One taxonomy entry (display/output pair)      |
//! | [`TermField`] | Which side of the pair a lookup matches       |
//! | [`NodeId`]    | Arena address of a selection-tree node        |
//! |---------------|-----------------------------------------------|

pub mod ids;
pub mod term;

pub use ids::{MAX_TREE_DEPTH, NodeId};
pub use term::{Rank, Term, TermField};
