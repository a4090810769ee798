//! Interactive composition session: one taxonomy, one selection tree.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use jumon_taxonomy::Taxonomy;
use jumon_tree::{SelectionTree, TreeError, format_tree};
use jumon_types::{NodeId, Term, TermField};
use thiserror::Error;

use crate::command::{Command, CommandError, HELP, WeightTarget};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("no term named `{0}`")]
    UnknownTerm(String),
    #[error("`{0}` is not selected")]
    NotSelected(String),
    #[error("{0} is not a group in the selection")]
    NotAGroup(NodeId),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("failed to encode tree: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lines to print, and whether the session should end.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl Reply {
    fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }
}

pub struct Session {
    taxonomy: Arc<Taxonomy>,
    tree: SelectionTree,
    lookup: TermField,
    show_tree: bool,
}

impl Session {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self {
            taxonomy,
            tree: SelectionTree::new(),
            lookup: TermField::default(),
            show_tree: false,
        }
    }

    /// Which side of the pair typed names match first.
    pub fn with_lookup(mut self, lookup: TermField) -> Self {
        self.lookup = lookup;
        self
    }

    /// Print the tree after every mutation.
    pub fn with_show_tree(mut self, show_tree: bool) -> Self {
        self.show_tree = show_tree;
        self
    }

    pub fn tree(&self) -> &SelectionTree {
        &self.tree
    }

    pub fn prompt(&self) -> String {
        self.tree.to_prompt()
    }

    /// Resolve a typed name: the configured side first, then the other side,
    /// then a `prompt0-1-2` key.
    pub fn resolve(&self, name: &str) -> Result<Arc<Term>, SessionError> {
        self.taxonomy
            .find(self.lookup, name)
            .or_else(|| self.taxonomy.find(self.lookup.other(), name))
            .or_else(|| self.taxonomy.find_by_key(name))
            .ok_or_else(|| SessionError::UnknownTerm(name.to_string()))
    }

    fn resolve_all(&self, names: &[String]) -> Result<Vec<Arc<Term>>, SessionError> {
        names.iter().map(|name| self.resolve(name)).collect()
    }

    /// Parse and execute one input line.
    pub fn execute_line(&mut self, line: &str) -> Result<Reply, SessionError> {
        match Command::parse(line)? {
            Some(command) => self.execute(command),
            None => Ok(Reply::default()),
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<Reply, SessionError> {
        let mutates = command.mutates();
        let mut reply = match command {
            Command::Pick(names) => {
                let mut reply = Reply::default();
                for term in self.resolve_all(&names)? {
                    if self.tree.select(Arc::clone(&term)).is_none() {
                        reply = reply.line(format!("already picked: {}", term.output_text));
                    }
                }
                reply
            }
            Command::Drop(names) => {
                let mut reply = Reply::default();
                for term in self.resolve_all(&names)? {
                    if !self.tree.deselect(&term) {
                        reply = reply.line(format!("not picked: {}", term.output_text));
                    }
                }
                reply
            }
            Command::Group(names) => {
                let terms = self.resolve_all(&names)?;
                match self.tree.group(self.tree.root(), &terms)? {
                    Some(group) => Reply::default().line(format!("grouped as {group}")),
                    None => Reply::default().line("group needs at least two picked terms"),
                }
            }
            Command::Ungroup(names) => {
                let terms = self.resolve_all(&names)?;
                let moved = self.tree.ungroup(self.tree.root(), &terms)?;
                Reply::default().line(format!("ungrouped {} term(s)", moved.len()))
            }
            Command::Weight { target, weight } => {
                let group = self.weight_target(&target)?;
                self.tree.set_weight(group, weight)?;
                Reply::default()
            }
            Command::Import(text) => {
                let report = self.tree.import_text(&self.taxonomy, &text)?;
                let mut reply = Reply::default().line(format!(
                    "added {}, skipped {}",
                    report.added.len(),
                    report.skipped.len()
                ));
                if !report.unresolved.is_empty() {
                    reply = reply.line(format!("unresolved: {}", report.unresolved.join(", ")));
                }
                reply
            }
            Command::Show => Reply::default().line(self.prompt()),
            Command::Tree { json: false } => Reply { lines: format_tree(&self.tree), quit: false },
            Command::Tree { json: true } => {
                Reply::default().line(serde_json::to_string_pretty(&self.tree.snapshot())?)
            }
            Command::Clear => {
                self.tree.clear();
                Reply::default()
            }
            Command::Help => Reply { lines: HELP.iter().map(|l| l.to_string()).collect(), quit: false },
            Command::Quit => Reply { lines: Vec::new(), quit: true },
        };

        if mutates {
            reply.lines.push(self.prompt());
            if self.show_tree {
                reply.lines.extend(format_tree(&self.tree));
            }
        }
        Ok(reply)
    }

    /// A `#id` must name a live group; a term selects the outermost
    /// non-root group holding it.
    fn weight_target(&self, target: &WeightTarget) -> Result<NodeId, SessionError> {
        match target {
            WeightTarget::Node(id) if self.tree.is_group(*id) => Ok(*id),
            WeightTarget::Node(id) => Err(SessionError::NotAGroup(*id)),
            WeightTarget::Term(name) => {
                let term = self.resolve(name)?;
                let root = self.tree.root();
                let leaf = self
                    .tree
                    .find_leaf(root, &term)
                    .ok_or_else(|| SessionError::NotSelected(name.clone()))?;
                let lineage = self.tree.lineage(leaf);
                lineage
                    .iter()
                    .rev()
                    .find(|&&id| id != root)
                    .copied()
                    .filter(|&id| id != leaf)
                    .ok_or_else(|| SessionError::NotSelected(name.clone()))
            }
        }
    }

    /// Read commands from `input` until end of input or `quit`.
    ///
    /// Errors from individual commands are reported on `output` and do not
    /// end the session.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write!(output, "jumon> ")?;
        output.flush()?;
        for line in input.lines() {
            let line = line?;
            match self.execute_line(&line) {
                Ok(reply) => {
                    for text in &reply.lines {
                        writeln!(output, "{text}")?;
                    }
                    if reply.quit {
                        return Ok(());
                    }
                }
                Err(err) => {
                    tracing::debug!(%err, line = %line, "session command failed");
                    writeln!(output, "error: {err}")?;
                }
            }
            write!(output, "jumon> ")?;
            output.flush()?;
        }
        writeln!(output)?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
