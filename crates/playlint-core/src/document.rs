//! In-memory document model.
//!
//! A [`Document`] owns every [`Node`] of one parsed file in an arena. Children
//! are referenced by [`NodeId`] from exactly one parent; the `parent` field is
//! a non-owning back-reference used for context lookups only.

use crate::types::{Position, Span};
use std::path::{Path, PathBuf};

/// Index of a node inside its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Structural kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Key/value mapping.
    Mapping,
    /// Ordered list.
    Sequence,
    /// Leaf value.
    Scalar,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mapping => write!(f, "mapping"),
            Self::Sequence => write!(f, "sequence"),
            Self::Scalar => write!(f, "scalar"),
        }
    }
}

/// How a scalar (or collection) was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    /// Unquoted scalar.
    Plain,
    /// `'single quoted'`.
    SingleQuoted,
    /// `"double quoted"`.
    DoubleQuoted,
    /// `|` block scalar.
    Literal,
    /// `>` block scalar.
    Folded,
    /// `*alias` reference.
    Alias,
    /// `[...]` or `{...}` collection.
    Flow,
    /// Indentation-based collection.
    Block,
}

impl ScalarStyle {
    /// Returns true for quoted scalars.
    #[must_use]
    pub fn is_quoted(self) -> bool {
        matches!(self, Self::SingleQuoted | Self::DoubleQuoted)
    }
}

/// The key under which a node appears in its parent mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Decoded key text.
    pub text: String,
    /// Source range of the key, including quotes.
    pub span: Span,
}

/// A structural element of a document.
#[derive(Debug, Clone)]
pub struct Node {
    /// Identity inside the owning document.
    pub id: NodeId,
    /// Structural kind.
    pub kind: NodeKind,
    /// Decoded value for scalars.
    pub value: Option<String>,
    /// Source style.
    pub style: ScalarStyle,
    /// Key of the mapping entry this node is the value of.
    pub key: Option<Key>,
    /// Explicit tag (`!tag`), without the leading `!`.
    pub tag: Option<String>,
    /// Anchor name (`&name`).
    pub anchor: Option<String>,
    /// Ordered children. Mapping children are entry values tagged with keys.
    pub children: Vec<NodeId>,
    /// Non-owning back-reference to the parent node.
    pub parent: Option<NodeId>,
    /// Source range of the node.
    pub span: Span,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, style: ScalarStyle, span: Span) -> Self {
        Self {
            id,
            kind,
            value: None,
            style,
            key: None,
            tag: None,
            anchor: None,
            children: Vec::new(),
            parent: None,
            span,
        }
    }

    /// Returns true for mapping nodes.
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        self.kind == NodeKind::Mapping
    }

    /// Returns true for sequence nodes.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.kind == NodeKind::Sequence
    }

    /// Returns true for scalar nodes.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.kind == NodeKind::Scalar
    }

    /// Returns the scalar value, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns the key text, if this node is a mapping entry value.
    #[must_use]
    pub fn key_text(&self) -> Option<&str> {
        self.key.as_ref().map(|k| k.text.as_str())
    }

    /// Returns true for an empty or explicit null plain scalar.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.is_scalar()
            && self.style == ScalarStyle::Plain
            && matches!(
                self.value.as_deref(),
                None | Some("" | "~" | "null" | "Null" | "NULL")
            )
    }
}

/// Maps byte offsets to line/column positions.
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            starts,
            len: text.len(),
        }
    }

    pub(crate) fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Position::new(line + 1, offset - self.starts[line] + 1, offset)
    }

    pub(crate) fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line.checked_sub(1)?).copied()
    }

    pub(crate) fn line_count(&self) -> usize {
        self.starts.len()
    }
}

/// One parsed configuration file.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    text: String,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    index: LineIndex,
}

impl Document {
    pub(crate) fn new(path: PathBuf, text: String, nodes: Vec<Node>, roots: Vec<NodeId>) -> Self {
        let index = LineIndex::new(&text);
        Self {
            path,
            text,
            nodes,
            roots,
            index,
        }
    }

    /// Path of the source file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Serializes the document. Untouched documents reproduce their input
    /// byte for byte.
    #[must_use]
    pub fn serialize(&self) -> String {
        self.text.clone()
    }

    /// Root node of each document in the stream.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id belongs to another document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the node with the given id, if it exists.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Iterates over all nodes in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<&Node> {
        self.get(id)?.parent.and_then(|p| self.get(p))
    }

    /// Iterates over a node's ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.parent(id), move |n| self.parent(n.id))
    }

    /// Iterates over a node's children in source order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        self.get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |c| self.node(*c))
    }

    /// Looks up the first entry with the given key in a mapping node.
    #[must_use]
    pub fn entry(&self, mapping: NodeId, key: &str) -> Option<&Node> {
        self.children(mapping).find(|c| c.key_text() == Some(key))
    }

    /// Returns true if any ancestor entry of the node has the given key.
    #[must_use]
    pub fn is_nested_under(&self, id: NodeId, key: &str) -> bool {
        self.get(id).is_some_and(|n| n.key_text() == Some(key))
            || self.ancestors(id).any(|a| a.key_text() == Some(key))
    }

    /// Node ids in post-order (children before parents), roots in order.
    #[must_use]
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, bool)> =
            self.roots.iter().rev().map(|r| (*r, false)).collect();
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for child in self.node(id).children.iter().rev() {
                stack.push((*child, false));
            }
        }
        order
    }

    /// Number of lines in the text.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.index.line_count()
    }

    /// Text of a line (1-indexed) without its line terminator.
    #[must_use]
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = self.index.line_start(line)?;
        let rest = &self.text[start..];
        let end = rest.find('\n').map_or(rest.len(), |i| i);
        Some(rest[..end].trim_end_matches('\r'))
    }

    /// Iterates over `(line number, text)` pairs.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        (1..=self.line_count()).filter_map(move |n| self.line(n).map(|l| (n, l)))
    }

    /// Converts a byte offset into a position.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        self.index.position(offset)
    }

    /// Builds a span from two byte offsets.
    #[must_use]
    pub fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.position(start), self.position(end))
    }

    /// Span covering a whole line, excluding its terminator.
    #[must_use]
    pub fn line_span(&self, line: usize) -> Option<Span> {
        let start = self.index.line_start(line)?;
        let len = self.line(line)?.len();
        Some(self.span(start, start + len))
    }

    /// Source text covered by a span.
    #[must_use]
    pub fn span_text(&self, span: &Span) -> &str {
        self.text
            .get(span.start.offset..span.end.offset)
            .unwrap_or_default()
    }

    /// Returns true if the span is a valid range of this document.
    #[must_use]
    pub fn contains(&self, span: &Span) -> bool {
        span.start.offset <= span.end.offset
            && span.end.offset <= self.text.len()
            && self.text.is_char_boundary(span.start.offset)
            && self.text.is_char_boundary(span.end.offset)
            && self.position(span.start.offset) == span.start
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;

    #[test]
    fn line_index_positions() {
        let doc = parse("a: 1\nbb: 2\n", "t.yml").unwrap();
        let p = doc.position(6);
        assert_eq!((p.line, p.column), (2, 2));
        assert_eq!(doc.line(2), Some("bb: 2"));
        assert_eq!(doc.line_count(), 3);
    }

    #[test]
    fn parent_back_references_and_ancestors() {
        let doc = parse("play:\n  tasks:\n    - name: x\n", "t.yml").unwrap();
        let name = doc
            .nodes()
            .find(|n| n.key_text() == Some("name"))
            .unwrap();
        assert!(doc.is_nested_under(name.id, "tasks"));
        assert!(doc.is_nested_under(name.id, "play"));
        assert!(!doc.is_nested_under(name.id, "handlers"));
        assert_eq!(doc.ancestors(name.id).count(), 4);
    }

    #[test]
    fn post_order_visits_children_first() {
        let doc = parse("a:\n  b: 1\n", "t.yml").unwrap();
        let order = doc.post_order();
        let root = doc.roots()[0];
        assert_eq!(order.last(), Some(&root));
        assert_eq!(order.len(), doc.node_count());
    }

    #[test]
    fn entry_lookup_returns_first_match() {
        let doc = parse("k: 1\nk: 2\n", "t.yml").unwrap();
        let root = doc.roots()[0];
        assert_eq!(doc.entry(root, "k").and_then(|n| n.as_str()), Some("1"));
        assert_eq!(doc.children(root).count(), 2);
    }
}
