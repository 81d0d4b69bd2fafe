//! Mutable parsed unit backed by tree-sitter.
//!
//! `ParsedUnit` owns the source text and its tree exclusively for the
//! duration of one file's processing; nodes are never shared across files.
//! Mutation is batch-oriented: strategies *plan* [`TextEdit`]s against the
//! pristine tree, and [`ParsedUnit::apply_edits`] splices them bottom-up and
//! reparses once. This keeps sibling offsets stable while planning and makes
//! the non-overlap invariant checkable in one place.
//!
//! Nodes cannot be held across a mutation (their lifetimes are tied to the
//! tree), so positions that must survive an edit are captured as
//! [`NodeAnchor`]s and relocated via [`ParsedUnit::node_at`].

use crate::errors::{Error, Result};
use crate::model::Span;
use tracing::{debug, trace};
use tree_sitter::{Node, Parser, Tree};

/// Relocatable handle to one AST node: its kind plus its span.
///
/// Relocation is exact (same kind, same byte range), so an anchor is only
/// valid while no edit has landed at a lower byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAnchor {
    pub kind: String,
    pub span: Span,
}

impl NodeAnchor {
    /// Capture an anchor for `node`.
    pub fn of(node: Node) -> Self {
        Self {
            kind: node.kind().to_string(),
            span: span_of(node),
        }
    }
}

/// One planned source splice: replace `start..end` with `replacement`.
///
/// Insertions use `start == end`; deletions use an empty `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl TextEdit {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            replacement: text.into(),
        }
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            replacement: String::new(),
        }
    }
}

/// One parsed source file plus its owned syntax tree.
pub struct ParsedUnit {
    parser: Parser,
    tree: Tree,
    source: String,
}

impl ParsedUnit {
    /// Parse Python source text into a unit.
    pub fn parse_python(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|_| Error::TreeSitterLanguage)?;
        let tree = parser.parse(&source, None).ok_or(Error::TreeSitterParse)?;
        Ok(Self {
            parser,
            tree,
            source,
        })
    }

    /// Current source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root node of the current tree.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Raw text of a node (lossy fallback to empty on range issues).
    pub fn text_of(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }

    /// Relocate an anchored node in the current tree.
    ///
    /// Descends from the root through children containing the anchored byte
    /// range; returns `None` when no node with the anchored kind occupies
    /// exactly that range anymore.
    pub fn node_at(&self, anchor: &NodeAnchor) -> Option<Node<'_>> {
        let (s, e) = (anchor.span.start_byte, anchor.span.end_byte);
        let mut node = self.root();
        loop {
            if node.kind() == anchor.kind && node.start_byte() == s && node.end_byte() == e {
                return Some(node);
            }
            let mut descended = false;
            for i in 0..node.child_count() {
                if let Some(child) = node.child(i) {
                    if child.start_byte() <= s && child.end_byte() >= e {
                        node = child;
                        descended = true;
                        break;
                    }
                }
            }
            if !descended {
                return None;
            }
        }
    }

    /// Collect every node (root included) whose kind is in `kinds` and for
    /// which `keep` holds, in source order.
    pub fn collect_nodes<F>(&self, kinds: &[&str], keep: F) -> Vec<Node<'_>>
    where
        F: Fn(&ParsedUnit, Node) -> bool,
    {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            if kinds.contains(&node.kind()) && keep(self, node) {
                out.push(node);
            }
            for i in (0..node.child_count()).rev() {
                if let Some(child) = node.child(i) {
                    stack.push(child);
                }
            }
        }
        out.sort_by_key(|n| (n.start_byte(), n.end_byte()));
        out
    }

    /// Byte offset of the first character of the line containing `byte`.
    pub fn line_start(&self, byte: usize) -> usize {
        let byte = byte.min(self.source.len());
        match self.source[..byte].rfind('\n') {
            Some(nl) => nl + 1,
            None => 0,
        }
    }

    /// Byte offset just past the newline of the line containing `byte`
    /// (or `source.len()` for the last, unterminated line).
    pub fn line_end(&self, byte: usize) -> usize {
        let byte = byte.min(self.source.len());
        match self.source[byte..].find('\n') {
            Some(nl) => byte + nl + 1,
            None => self.source.len(),
        }
    }

    /// Leading whitespace of the line containing `byte`.
    pub fn indent_at(&self, byte: usize) -> &str {
        let start = self.line_start(byte);
        let line = &self.source[start..self.line_end(byte)];
        let ws_len = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..ws_len]
    }

    /// Apply a batch of edits and reparse.
    ///
    /// Edits are deduplicated (two strategies may legitimately plan the very
    /// same splice for one construction site), checked for overlap, and
    /// applied bottom-up so earlier ranges stay valid. The whole batch is
    /// rejected before any splice if one edit is out of bounds or two edits
    /// overlap.
    pub fn apply_edits(&mut self, mut edits: Vec<TextEdit>) -> Result<()> {
        if edits.is_empty() {
            return Ok(());
        }
        edits.sort();
        edits.dedup();

        for edit in &edits {
            let ok = edit.start <= edit.end
                && edit.end <= self.source.len()
                && self.source.is_char_boundary(edit.start)
                && self.source.is_char_boundary(edit.end);
            if !ok {
                return Err(Error::InvalidEditRange {
                    start: edit.start,
                    end: edit.end,
                });
            }
        }
        for pair in edits.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(Error::OverlappingEdits { at: pair[1].start });
            }
        }

        for edit in edits.iter().rev() {
            trace!(
                start = edit.start,
                end = edit.end,
                len = edit.replacement.len(),
                "splice"
            );
            self.source
                .replace_range(edit.start..edit.end, &edit.replacement);
        }

        self.tree = self
            .parser
            .parse(&self.source, None)
            .ok_or(Error::TreeSitterParse)?;
        debug!(edits = edits.len(), bytes = self.source.len(), "reparsed");
        Ok(())
    }
}

/// Build a `Span` from a node.
pub fn span_of(node: Node) -> Span {
    let sp = node.start_position();
    let ep = node.end_position();
    Span {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start_row: sp.row,
        start_col: sp.column,
        end_row: ep.row,
        end_col: ep.column,
    }
}

/// Dotted name of an identifier/attribute expression (`xml.sax.make_parser`),
/// or `None` for anything more exotic (subscripts, calls, literals).
pub fn dotted_name(unit: &ParsedUnit, node: Node) -> Option<String> {
    match node.kind() {
        "identifier" => Some(unit.text_of(node).to_string()),
        "attribute" => {
            let object = node.child_by_field_name("object")?;
            let attribute = node.child_by_field_name("attribute")?;
            Some(format!(
                "{}.{}",
                dotted_name(unit, object)?,
                unit.text_of(attribute)
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNIPPET: &str = "import xml.sax\n\nparser = xml.sax.make_parser()\nparser.parse(\"a.xml\")\n";

    #[test]
    fn parses_and_exposes_root() {
        let unit = ParsedUnit::parse_python(SNIPPET).unwrap();
        assert_eq!(unit.root().kind(), "module");
        assert_eq!(unit.source(), SNIPPET);
    }

    #[test]
    fn collects_calls_in_source_order() {
        let unit = ParsedUnit::parse_python(SNIPPET).unwrap();
        let calls = unit.collect_nodes(&["call"], |_, _| true);
        assert_eq!(calls.len(), 2);
        assert!(calls[0].start_byte() < calls[1].start_byte());
        assert_eq!(
            unit.text_of(calls[0]),
            "xml.sax.make_parser()"
        );
    }

    #[test]
    fn dotted_names_resolve_through_attributes() {
        let unit = ParsedUnit::parse_python(SNIPPET).unwrap();
        let calls = unit.collect_nodes(&["call"], |_, _| true);
        let callee = calls[0].child_by_field_name("function").unwrap();
        assert_eq!(
            dotted_name(&unit, callee).as_deref(),
            Some("xml.sax.make_parser")
        );
    }

    #[test]
    fn anchors_relocate_after_an_edit_below() {
        let mut unit = ParsedUnit::parse_python(SNIPPET).unwrap();
        let calls = unit.collect_nodes(&["call"], |_, _| true);
        let anchor = NodeAnchor::of(calls[0]);
        let below = unit.source().len();
        unit.apply_edits(vec![TextEdit::insert(below, "x = 1\n")])
            .unwrap();
        let relocated = unit.node_at(&anchor).expect("anchor survives lower edits");
        assert_eq!(unit.text_of(relocated), "xml.sax.make_parser()");
    }

    #[test]
    fn overlapping_edits_are_rejected_before_any_splice() {
        let mut unit = ParsedUnit::parse_python(SNIPPET).unwrap();
        let before = unit.source().to_string();
        let err = unit.apply_edits(vec![TextEdit::delete(0, 10), TextEdit::delete(5, 12)]);
        assert!(matches!(err, Err(Error::OverlappingEdits { at: 5 })));
        assert_eq!(unit.source(), before);
    }

    #[test]
    fn identical_edits_are_applied_once() {
        let mut unit = ParsedUnit::parse_python("a = 1\n").unwrap();
        let edit = TextEdit::insert(6, "b = 2\n");
        unit.apply_edits(vec![edit.clone(), edit]).unwrap();
        assert_eq!(unit.source(), "a = 1\nb = 2\n");
    }

    #[test]
    fn line_helpers_handle_missing_trailing_newline() {
        let unit = ParsedUnit::parse_python("a = 1\nb = 2").unwrap();
        assert_eq!(unit.line_start(8), 6);
        assert_eq!(unit.line_end(8), 11);
        assert_eq!(unit.line_end(2), 6);
    }

    #[test]
    fn indent_is_taken_from_the_anchor_line() {
        let unit = ParsedUnit::parse_python("def f():\n    x = 1\n").unwrap();
        let x_byte = unit.source().find("x = 1").unwrap();
        assert_eq!(unit.indent_at(x_byte), "    ");
    }
}
