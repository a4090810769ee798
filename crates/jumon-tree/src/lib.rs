//! Selection tree and prompt codec for jumon.
//!
//! A session's picked terms live in a [`SelectionTree`]: groups own ordered
//! children, leaves wrap shared taxonomy terms. The tree is always kept in
//! taxonomy rank order, so the prompt it renders is canonical no matter the
//! order terms were picked in.
//!
//! # Operations
//!
//! - **insert / remove**: attach and detach nodes; emptied groups are pruned
//!   upward, never past the root.
//! - **group**: merge picked terms into one composite at their lowest common
//!   ancestor.
//! - **ungroup**: move terms back out to singletons under the root.
//! - **serialize / parse / import**: tree ↔ `a, (b, c:1.2)` prompt text.
//!
//! # Example
//!
//! ```
//! use jumon_taxonomy::Taxonomy;
//! use jumon_tree::SelectionTree;
//!
//! let taxonomy = Taxonomy::from_json_str(
//!     r#"{ "quality": [["傑作", "masterpiece"], ["最高", "best quality"]] }"#,
//! ).unwrap();
//! let masterpiece = taxonomy.find_by_output_text("masterpiece").unwrap();
//! let best = taxonomy.find_by_output_text("best quality").unwrap();
//!
//! let mut tree = SelectionTree::new();
//! tree.select(best.clone());
//! tree.select(masterpiece.clone());
//! assert_eq!(tree.to_prompt(), "masterpiece, best quality");
//!
//! let group = tree.group(tree.root(), &[masterpiece, best]).unwrap().unwrap();
//! tree.set_weight(group, Some(1.3)).unwrap();
//! assert_eq!(tree.to_prompt(), "(masterpiece, best quality:1.3)");
//! ```

mod error;
mod import;
mod node;
mod parse;
mod render;
mod serialize;
mod tree;

pub use error::TreeError;
pub use import::ImportReport;
pub use node::{Group, Node, NodeKind};
pub use parse::{ParsedPrompt, ParsedTerm, parse};
pub use render::{Snapshot, format_tree};
pub use serialize::ITEM_SEPARATOR;
pub use tree::SelectionTree;

/// Result type for selection-tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
