//! Prompt text → flat list of terms with group annotations.
//!
//! The scanner is deliberately lenient: it is fed whatever the user pasted.
//!
//! - Top-level commas separate items; each parenthesized span is one group.
//! - Nested parentheses are flattened into the outermost span.
//! - A stray `)` is ignored; an unclosed `(` closes at end of input.
//! - `name:1.2` inside a span weights the span. A bare `name:1.2` at top level
//!   becomes its own weighted group, and `(a, b):1.2` weights the span just
//!   closed.
//! - Tokens are matched exactly against term output text; anything else is
//!   reported in [`ParsedPrompt::unresolved`] and otherwise dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use jumon_taxonomy::Taxonomy;
use jumon_types::Term;

/// One resolved term and the span it appeared in.
#[derive(Clone, Debug)]
pub struct ParsedTerm {
    pub term: Arc<Term>,
    /// Synthetic span id, sequential from 1 per parse. `None` at top level.
    pub group: Option<u32>,
}

/// Result of scanning prompt text.
#[derive(Clone, Debug, Default)]
pub struct ParsedPrompt {
    pub items: Vec<ParsedTerm>,
    /// Weight per span id, last one written wins.
    pub group_weights: BTreeMap<u32, f64>,
    /// Tokens that named no term, in input order.
    pub unresolved: Vec<String>,
}

impl ParsedPrompt {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Scan `text` and resolve its tokens against `taxonomy` by output text.
pub fn parse(taxonomy: &Taxonomy, text: &str) -> ParsedPrompt {
    let mut scanner = Scanner::new(taxonomy);
    for ch in text.chars() {
        scanner.feed(ch);
    }
    scanner.finish()
}

struct Scanner<'a> {
    taxonomy: &'a Taxonomy,
    parsed: ParsedPrompt,
    token: String,
    depth: usize,
    /// Span currently open at depth 1.
    current: Option<u32>,
    /// Span closed immediately before the pending token.
    just_closed: Option<u32>,
    spans: u32,
}

impl<'a> Scanner<'a> {
    fn new(taxonomy: &'a Taxonomy) -> Self {
        Self {
            taxonomy,
            parsed: ParsedPrompt::default(),
            token: String::new(),
            depth: 0,
            current: None,
            just_closed: None,
            spans: 0,
        }
    }

    fn feed(&mut self, ch: char) {
        match ch {
            '(' => {
                self.flush();
                if self.depth == 0 {
                    self.current = Some(self.next_span());
                }
                self.depth += 1;
            }
            ')' => {
                if self.depth == 0 {
                    tracing::debug!("ignoring unmatched ')'");
                    return;
                }
                self.flush();
                self.depth -= 1;
                if self.depth == 0 {
                    self.just_closed = self.current.take();
                }
            }
            ',' => self.flush(),
            other => self.token.push(other),
        }
    }

    fn finish(mut self) -> ParsedPrompt {
        self.flush();
        if self.depth > 0 {
            tracing::debug!(open = self.depth, "closing unbalanced '(' at end of input");
        }
        self.parsed
    }

    fn next_span(&mut self) -> u32 {
        self.spans += 1;
        self.spans
    }

    fn flush(&mut self) {
        let raw = std::mem::take(&mut self.token);
        let token = raw.trim();
        let just_closed = self.just_closed.take();
        if token.is_empty() {
            return;
        }

        if let Some(term) = self.taxonomy.find_by_output_text(token) {
            self.push(term, self.current);
            return;
        }

        let Some((name, weight)) = split_weight(token) else {
            self.unresolved(token);
            return;
        };

        let term = if name.is_empty() {
            None
        } else {
            let found = self.taxonomy.find_by_output_text(name);
            if found.is_none() {
                self.unresolved(name);
                // A bare unknown name has no span of its own to weight.
                if self.current.is_none() {
                    return;
                }
            }
            found
        };

        let span = match (self.current, name.is_empty()) {
            (Some(span), _) => Some(span),
            (None, true) => just_closed,
            (None, false) => Some(self.next_span()),
        };
        let Some(span) = span else {
            self.unresolved(token);
            return;
        };
        self.parsed.group_weights.insert(span, weight);

        if let Some(term) = term {
            self.push(term, Some(span));
        }
    }

    fn push(&mut self, term: Arc<Term>, group: Option<u32>) {
        self.parsed.items.push(ParsedTerm { term, group });
    }

    fn unresolved(&mut self, token: &str) {
        tracing::debug!(token, "dropping unresolved prompt token");
        self.parsed.unresolved.push(token.to_string());
    }
}

/// Split a trailing `:weight` off a token. The weight must be finite.
fn split_weight(token: &str) -> Option<(&str, f64)> {
    let (name, weight) = token.rsplit_once(':')?;
    let weight: f64 = weight.trim().parse().ok()?;
    weight.is_finite().then(|| (name.trim(), weight))
}

// ============================================================================
// Tests
// ============================================================================
