//! Position-preserving parser for YAML-like configuration documents.
//!
//! The parser covers the block and flow constructs found in configuration
//! files and keeps a source span for every node. It is tolerant of what the
//! rules are meant to report (duplicate keys, tabs, trailing whitespace) and
//! fails with a [`ParseError`] only when the structure cannot be recovered.

pub mod scan;

use crate::document::{Document, Key, LineIndex, Node, NodeId, NodeKind, ScalarStyle};
use crate::types::{Position, Span};
use scan::{decode_key, decode_quoted, find_comment, is_seq_item, leading_ws, quoted_end, split_key};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error raised when a document's structure cannot be recovered.
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
#[error("{message} (line {line}, column {column})")]
#[diagnostic(code(playlint::parse_error))]
pub struct ParseError {
    /// Path of the document.
    pub path: PathBuf,
    /// Best-known line of the failure (1-indexed).
    pub line: usize,
    /// Best-known column of the failure (1-indexed).
    pub column: usize,
    /// Byte offset of the failure.
    pub offset: usize,
    /// Description of the failure.
    pub message: String,
}

/// Parses raw text into a [`Document`].
///
/// # Errors
///
/// Returns [`ParseError`] for unterminated quoted scalars or flow
/// collections, inconsistent indentation and content that is neither a key,
/// an item nor a value where one is expected.
pub fn parse(text: &str, path: impl Into<PathBuf>) -> Result<Document, ParseError> {
    let path = path.into();
    let (nodes, roots) = Parser::new(text, &path).run()?;
    Ok(Document::new(path, text.to_string(), nodes, roots))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Start,
    End,
}

/// The next significant line, with comments and trailing blanks removed.
#[derive(Debug, Clone, Copy)]
struct View {
    indent: usize,
    start: usize,
    end: usize,
    marker: Option<Marker>,
}

#[derive(Default)]
struct Props {
    tag: Option<String>,
    anchor: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Chomp {
    Strip,
    Clip,
    Keep,
}

struct Parser<'a> {
    text: &'a str,
    path: &'a Path,
    index: LineIndex,
    lines: Vec<(usize, usize)>,
    cur: usize,
    /// Byte offset to resume from on the current line (compact forms).
    resume: Option<usize>,
    nodes: Vec<Node>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, path: &'a Path) -> Self {
        let bytes = text.as_bytes();
        let mut lines = Vec::new();
        let mut start = 0;
        let trim_cr = |start: usize, end: usize| {
            if end > start && bytes[end - 1] == b'\r' {
                end - 1
            } else {
                end
            }
        };
        for (i, b) in bytes.iter().enumerate() {
            if *b == b'\n' {
                lines.push((start, trim_cr(start, i)));
                start = i + 1;
            }
        }
        if start < text.len() {
            lines.push((start, trim_cr(start, text.len())));
        }
        Self {
            text,
            path,
            index: LineIndex::new(text),
            lines,
            cur: 0,
            resume: None,
            nodes: Vec::new(),
        }
    }

    fn run(mut self) -> Result<(Vec<Node>, Vec<NodeId>), ParseError> {
        let mut roots = Vec::new();
        while let Some(view) = self.peek() {
            match view.marker {
                Some(Marker::End) => self.advance_line(),
                Some(Marker::Start) => {
                    let after = view.start + 3;
                    let rest = leading_ws(&self.text[after..view.end]);
                    if after + rest >= view.end {
                        self.advance_line();
                    } else {
                        self.resume = Some(after + rest);
                    }
                    if matches!(self.peek(), Some(v) if v.marker.is_none()) {
                        roots.push(self.parse_block(None, None)?);
                        self.check_leftover()?;
                    }
                }
                None if view.indent == 0 && self.content(&view).starts_with('%') => {
                    self.advance_line();
                }
                None => {
                    roots.push(self.parse_block(None, None)?);
                    self.check_leftover()?;
                }
            }
        }
        Ok((self.nodes, roots))
    }

    fn check_leftover(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            Some(v) if v.marker.is_none() => Err(self.error(
                v.start,
                "unexpected content, check the indentation of this line",
            )),
            _ => Ok(()),
        }
    }

    // ---- line cursor ----

    fn peek(&mut self) -> Option<View> {
        loop {
            let &(line_start, line_end) = self.lines.get(self.cur)?;
            let (start, resumed) = match self.resume {
                Some(offset) => (offset, true),
                None => (
                    line_start + leading_ws(&self.text[line_start..line_end]),
                    false,
                ),
            };
            let raw = &self.text[start..line_end];
            let content = raw[..find_comment(raw).unwrap_or(raw.len())].trim_end();
            if content.is_empty() {
                self.advance_line();
                continue;
            }
            let indent = start - line_start;
            let marker = if !resumed && indent == 0 {
                document_marker(content)
            } else {
                None
            };
            return Some(View {
                indent,
                start,
                end: start + content.len(),
                marker,
            });
        }
    }

    fn advance_line(&mut self) {
        self.cur += 1;
        self.resume = None;
    }

    /// Moves the cursor to the line after the one containing `offset`.
    fn skip_past(&mut self, offset: usize) {
        self.cur = self.index.position(offset).line;
        self.resume = None;
    }

    fn content(&self, view: &View) -> &'a str {
        &self.text[view.start..view.end]
    }

    fn line_end_of(&self, offset: usize) -> usize {
        let line = self.index.position(offset).line;
        self.lines.get(line - 1).map_or(self.text.len(), |l| l.1)
    }

    // ---- node construction ----

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.pos(start), self.pos(end))
    }

    fn pos(&self, offset: usize) -> Position {
        self.index.position(offset)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ParseError {
        let at = self.pos(offset);
        ParseError {
            path: self.path.to_path_buf(),
            line: at.line,
            column: at.column,
            offset,
            message: message.into(),
        }
    }

    fn alloc(
        &mut self,
        kind: NodeKind,
        style: ScalarStyle,
        start: usize,
        end: usize,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = Node::new(id, kind, style, self.span(start, end));
        node.parent = parent;
        self.nodes.push(node);
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    fn scalar(
        &mut self,
        style: ScalarStyle,
        value: String,
        start: usize,
        end: usize,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = self.alloc(NodeKind::Scalar, style, start, end, parent);
        self.nodes[id.0].value = Some(value);
        id
    }

    fn null_at(&mut self, offset: usize, parent: Option<NodeId>) -> NodeId {
        self.scalar(ScalarStyle::Plain, String::new(), offset, offset, parent)
    }

    fn close(&mut self, id: NodeId, end: usize) {
        let start = self.nodes[id.0].span.start.offset;
        self.nodes[id.0].span = self.span(start, end.max(start));
    }

    fn set_props(&mut self, id: NodeId, props: Props) {
        let node = &mut self.nodes[id.0];
        if props.tag.is_some() {
            node.tag = props.tag;
        }
        if props.anchor.is_some() {
            node.anchor = props.anchor;
        }
    }

    /// Reads `&anchor` and `!tag` properties starting at `start`. Returns the
    /// properties and the offset of what follows them.
    fn take_props(&self, start: usize, end: usize) -> (Props, usize) {
        let mut props = Props::default();
        let mut at = start;
        while at < end {
            let rest = &self.text[at..end];
            let sigil = rest.as_bytes()[0];
            if sigil != b'&' && sigil != b'!' {
                break;
            }
            let len = rest
                .find(|c: char| c == ' ' || c == '\t')
                .unwrap_or(rest.len());
            let name = rest[1..len].to_string();
            if sigil == b'&' {
                props.anchor = Some(name);
            } else {
                props.tag = Some(name);
            }
            at += len;
            at += leading_ws(&self.text[at..end]);
        }
        (props, at)
    }

    // ---- block structure ----

    fn parse_block(
        &mut self,
        owner: Option<usize>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ParseError> {
        let Some(view) = self.peek() else {
            return Ok(self.null_at(self.text.len(), parent));
        };
        let content = self.content(&view);
        if content.starts_with(['&', '!']) {
            let (props, next) = self.take_props(view.start, view.end);
            let id = if next >= view.end {
                self.advance_line();
                match self.peek() {
                    Some(v) if v.marker.is_none() && owner.map_or(true, |o| v.indent > o) => {
                        self.parse_block(owner, parent)?
                    }
                    _ => self.null_at(view.end, parent),
                }
            } else {
                self.resume = Some(next);
                self.parse_block(owner, parent)?
            };
            self.set_props(id, props);
            return Ok(id);
        }
        if is_seq_item(content) {
            self.parse_sequence(view.indent, parent)
        } else if split_key(content).is_some() {
            self.parse_mapping(view.indent, parent)
        } else {
            self.parse_inline(view, view.start, owner, parent)
        }
    }

    fn parse_mapping(
        &mut self,
        indent: usize,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ParseError> {
        let first = self.peek().map_or(self.text.len(), |v| v.start);
        let id = self.alloc(NodeKind::Mapping, ScalarStyle::Block, first, first, parent);
        let mut end = first;
        while let Some(view) = self.peek() {
            if view.marker.is_some() || view.indent < indent {
                break;
            }
            if view.indent > indent {
                return Err(self.error(view.start, "unexpected indentation"));
            }
            let content = self.content(&view);
            if is_seq_item(content) {
                return Err(self.error(
                    view.start,
                    "expected a mapping key but found a sequence item",
                ));
            }
            let Some(split) = split_key(content) else {
                return Err(self.error(
                    view.start,
                    "expected a `key: value` entry but found no `:`",
                ));
            };
            let key = Key {
                text: decode_key(&content[..split.key_end]),
                span: self.span(view.start, view.start + split.key_end),
            };
            let value =
                self.parse_entry_value(indent, id, view, view.start + split.colon, view.start + split.value)?;
            self.nodes[value.0].key = Some(key);
            end = end
                .max(self.nodes[value.0].span.end.offset)
                .max(view.start + split.colon + 1);
        }
        self.close(id, end);
        Ok(id)
    }

    fn parse_entry_value(
        &mut self,
        indent: usize,
        mapping: NodeId,
        view: View,
        colon: usize,
        value: usize,
    ) -> Result<NodeId, ParseError> {
        let (props, value) = self.take_props(value.min(view.end), view.end);
        let id = if value >= view.end {
            self.advance_line();
            match self.peek() {
                Some(next) if next.marker.is_none() && next.indent > indent => {
                    self.parse_block(Some(indent), Some(mapping))?
                }
                Some(next)
                    if next.marker.is_none()
                        && next.indent == indent
                        && is_seq_item(self.content(&next)) =>
                {
                    self.parse_sequence(indent, Some(mapping))?
                }
                _ => self.null_at(colon + 1, Some(mapping)),
            }
        } else {
            self.parse_inline(view, value, Some(indent), Some(mapping))?
        };
        self.set_props(id, props);
        Ok(id)
    }

    fn parse_sequence(
        &mut self,
        indent: usize,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ParseError> {
        let first = self.peek().map_or(self.text.len(), |v| v.start);
        let id = self.alloc(NodeKind::Sequence, ScalarStyle::Block, first, first, parent);
        let mut end = first;
        while let Some(view) = self.peek() {
            if view.marker.is_some() || view.indent < indent {
                break;
            }
            if view.indent > indent {
                return Err(self.error(view.start, "unexpected indentation"));
            }
            if !is_seq_item(self.content(&view)) {
                break;
            }
            let dash = view.start;
            let after = dash + 1;
            let item_start = after + leading_ws(&self.text[after..view.end]);
            let (props, item_start) = self.take_props(item_start.min(view.end), view.end);
            let item = if item_start >= view.end {
                self.advance_line();
                match self.peek() {
                    Some(next) if next.marker.is_none() && next.indent > indent => {
                        self.parse_block(Some(indent), Some(id))?
                    }
                    _ => self.null_at(after, Some(id)),
                }
            } else {
                self.resume = Some(item_start);
                self.parse_block(Some(indent), Some(id))?
            };
            self.set_props(item, props);
            end = end.max(self.nodes[item.0].span.end.offset).max(after);
        }
        self.close(id, end);
        Ok(id)
    }

    // ---- values ----

    /// Parses a value starting at `start` on the current line.
    fn parse_inline(
        &mut self,
        view: View,
        start: usize,
        owner: Option<usize>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ParseError> {
        match self.text.as_bytes()[start] {
            b'|' | b'>' => self.parse_block_scalar(view, start, owner, parent),
            b'[' | b'{' => {
                let (id, end) = self.parse_flow(start, start, parent)?;
                self.expect_line_end(end)?;
                Ok(id)
            }
            b'"' | b'\'' => {
                let (id, end) = self.parse_quoted(start, parent)?;
                self.expect_line_end(end)?;
                Ok(id)
            }
            b'*' => {
                let name = self.text[start + 1..view.end].trim().to_string();
                let id = self.scalar(ScalarStyle::Alias, name, start, view.end, parent);
                self.advance_line();
                Ok(id)
            }
            _ => self.parse_plain(view, start, owner, parent),
        }
    }

    fn parse_plain(
        &mut self,
        view: View,
        start: usize,
        owner: Option<usize>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ParseError> {
        let first = &self.text[start..view.end];
        if let Some(split) = split_key(first) {
            return Err(self.error(
                start + split.colon,
                "mapping values are not allowed here",
            ));
        }
        let mut value = first.to_string();
        let mut end = view.end;
        self.advance_line();
        while let Some(next) = self.peek() {
            if next.marker.is_some() || !owner.map_or(true, |o| next.indent > o) {
                break;
            }
            let line = self.content(&next);
            if let Some(split) = split_key(line) {
                return Err(self.error(
                    next.start + split.colon,
                    "mapping values are not allowed here",
                ));
            }
            value.push(' ');
            value.push_str(line);
            end = next.end;
            self.advance_line();
        }
        Ok(self.scalar(ScalarStyle::Plain, value, start, end, parent))
    }

    fn parse_quoted(
        &mut self,
        start: usize,
        parent: Option<NodeId>,
    ) -> Result<(NodeId, usize), ParseError> {
        let double = self.text.as_bytes()[start] == b'"';
        let Some(end) = quoted_end(self.text, start) else {
            let kind = if double { "double" } else { "single" };
            return Err(self.error(start, format!("unterminated {kind}-quoted scalar")));
        };
        let style = if double {
            ScalarStyle::DoubleQuoted
        } else {
            ScalarStyle::SingleQuoted
        };
        let value = decode_quoted(&self.text[start..end]);
        Ok((self.scalar(style, value, start, end, parent), end))
    }

    /// Requires that nothing but a comment follows `end` on its line, then
    /// moves past that line.
    fn expect_line_end(&mut self, end: usize) -> Result<(), ParseError> {
        let line_end = self.line_end_of(end);
        let rest = &self.text[end..line_end.max(end)];
        let rest = rest[..find_comment(rest).unwrap_or(rest.len())].trim();
        if !rest.is_empty() {
            let at = end + leading_ws(&self.text[end..]);
            return Err(self.error(at, "unexpected content after value"));
        }
        self.skip_past(end);
        Ok(())
    }

    fn parse_block_scalar(
        &mut self,
        view: View,
        start: usize,
        owner: Option<usize>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ParseError> {
        let header = &self.text[start..view.end];
        let style = if header.starts_with('|') {
            ScalarStyle::Literal
        } else {
            ScalarStyle::Folded
        };
        let mut chomp = Chomp::Clip;
        let mut explicit = None;
        for ch in header[1..].chars() {
            match ch {
                '-' => chomp = Chomp::Strip,
                '+' => chomp = Chomp::Keep,
                '1'..='9' => explicit = ch.to_digit(10).map(|d| d as usize),
                _ => return Err(self.error(start, "invalid block scalar header")),
            }
        }
        let min_indent = owner.map_or(0, |o| o + 1);
        let mut content_indent = explicit.map(|n| owner.map_or(n, |o| o + n));
        let mut body: Vec<&'a str> = Vec::new();
        let mut end = view.end;
        self.advance_line();
        while let Some(&(line_start, line_end)) = self.lines.get(self.cur) {
            let raw = &self.text[line_start..line_end];
            if raw.trim().is_empty() {
                body.push("");
                self.cur += 1;
                continue;
            }
            let indent = leading_ws(raw);
            let expected = *content_indent.get_or_insert(indent);
            if indent < expected || indent < min_indent {
                break;
            }
            body.push(&raw[expected..]);
            end = line_end;
            self.cur += 1;
        }
        let trailing = body.iter().rev().take_while(|l| l.is_empty()).count();
        let body = &body[..body.len() - trailing];
        let mut value = match style {
            ScalarStyle::Literal => body.join("\n"),
            _ => fold_block(body),
        };
        match chomp {
            Chomp::Strip => {}
            Chomp::Clip if !body.is_empty() => value.push('\n'),
            Chomp::Clip => {}
            Chomp::Keep => {
                value.push('\n');
                value.push_str(&"\n".repeat(trailing));
            }
        }
        Ok(self.scalar(style, value, start, end, parent))
    }

    // ---- flow collections ----

    /// Parses a flow node at `at`. `open` is the outermost bracket, used to
    /// report unterminated collections at the line where they started.
    fn parse_flow(
        &mut self,
        at: usize,
        open: usize,
        parent: Option<NodeId>,
    ) -> Result<(NodeId, usize), ParseError> {
        match self.text.as_bytes().get(at) {
            None => Err(self.unterminated(open)),
            Some(b'[') => self.parse_flow_sequence(at, parent),
            Some(b'{') => self.parse_flow_mapping(at, parent),
            Some(b'"' | b'\'') => self.parse_quoted(at, parent),
            Some(_) => self.parse_flow_plain(at, parent),
        }
    }

    fn parse_flow_sequence(
        &mut self,
        open: usize,
        parent: Option<NodeId>,
    ) -> Result<(NodeId, usize), ParseError> {
        let id = self.alloc(NodeKind::Sequence, ScalarStyle::Flow, open, open, parent);
        let mut at = open + 1;
        loop {
            at = self.skip_flow_ws(at);
            match self.text.as_bytes().get(at) {
                None => return Err(self.unterminated(open)),
                Some(b']') => {
                    self.close(id, at + 1);
                    return Ok((id, at + 1));
                }
                Some(_) => {}
            }
            let (_, end) = self.parse_flow(at, open, Some(id))?;
            at = self.skip_flow_ws(end);
            match self.text.as_bytes().get(at) {
                None => return Err(self.unterminated(open)),
                Some(b',') => at += 1,
                Some(b']') => {}
                Some(_) => return Err(self.misplaced(at, end, open, "`,` or `]`")),
            }
        }
    }

    fn parse_flow_mapping(
        &mut self,
        open: usize,
        parent: Option<NodeId>,
    ) -> Result<(NodeId, usize), ParseError> {
        let id = self.alloc(NodeKind::Mapping, ScalarStyle::Flow, open, open, parent);
        let text = self.text;
        let bytes = text.as_bytes();
        let mut at = open + 1;
        loop {
            at = self.skip_flow_ws(at);
            match bytes.get(at) {
                None => return Err(self.unterminated(open)),
                Some(b'}') => {
                    self.close(id, at + 1);
                    return Ok((id, at + 1));
                }
                Some(_) => {}
            }
            let key_start = at;
            let key_end = if matches!(bytes[at], b'"' | b'\'') {
                quoted_end(self.text, at).ok_or_else(|| self.unterminated(open))?
            } else {
                flow_plain_end(self.text, at)
            };
            if key_end == key_start {
                return Err(self.error(at, "expected a key in flow mapping"));
            }
            let key_text = self.text[key_start..key_end].trim_end();
            let key = Key {
                text: decode_key(key_text),
                span: self.span(key_start, key_start + key_text.len()),
            };
            at = self.skip_flow_ws(key_end);
            let value = match bytes.get(at) {
                None => return Err(self.unterminated(open)),
                Some(b':') => {
                    at = self.skip_flow_ws(at + 1);
                    match bytes.get(at) {
                        None => return Err(self.unterminated(open)),
                        Some(b',' | b'}') => self.null_at(at, Some(id)),
                        Some(_) => {
                            let (value, end) = self.parse_flow(at, open, Some(id))?;
                            at = end;
                            value
                        }
                    }
                }
                Some(b',' | b'}') => self.null_at(at, Some(id)),
                Some(_) => return Err(self.error(at, "expected `:` in flow mapping")),
            };
            self.nodes[value.0].key = Some(key);
            let value_end = self.nodes[value.0].span.end.offset;
            at = self.skip_flow_ws(at);
            match bytes.get(at) {
                None => return Err(self.unterminated(open)),
                Some(b',') => at += 1,
                Some(b'}') => {}
                Some(_) => return Err(self.misplaced(at, value_end, open, "`,` or `}`")),
            }
        }
    }

    fn parse_flow_plain(
        &mut self,
        at: usize,
        parent: Option<NodeId>,
    ) -> Result<(NodeId, usize), ParseError> {
        let end = flow_plain_end(self.text, at);
        let raw = self.text[at..end].trim_end();
        if raw.is_empty() {
            return Err(self.error(at, "expected a value in flow collection"));
        }
        let style = if raw.starts_with('*') {
            ScalarStyle::Alias
        } else {
            ScalarStyle::Plain
        };
        let value = raw.trim_start_matches('*').to_string();
        let end = at + raw.len();
        Ok((self.scalar(style, value, at, end, parent), end))
    }

    fn skip_flow_ws(&self, mut at: usize) -> usize {
        let bytes = self.text.as_bytes();
        while let Some(b) = bytes.get(at) {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => at += 1,
                b'#' if at == 0 || matches!(bytes[at - 1], b' ' | b'\t' | b'\n') => {
                    at = self.text[at..].find('\n').map_or(bytes.len(), |i| at + i);
                }
                _ => break,
            }
        }
        at
    }

    /// Unexpected token after a flow item. A token on a later line means the
    /// collection was never closed.
    fn misplaced(&self, at: usize, item_end: usize, open: usize, expected: &str) -> ParseError {
        if self.pos(at).line == self.pos(item_end).line {
            self.error(at, format!("expected {expected} in flow collection"))
        } else {
            self.unterminated(open)
        }
    }

    fn unterminated(&self, open: usize) -> ParseError {
        let kind = if self.text.as_bytes().get(open) == Some(&b'{') {
            "flow mapping"
        } else {
            "flow sequence"
        };
        self.error(open, format!("unterminated {kind}"))
    }
}

fn document_marker(content: &str) -> Option<Marker> {
    let is = |marker: &str| {
        content == marker
            || content
                .strip_prefix(marker)
                .is_some_and(|rest| rest.starts_with([' ', '\t']))
    };
    if is("---") {
        Some(Marker::Start)
    } else if is("...") {
        Some(Marker::End)
    } else {
        None
    }
}

/// End of a plain scalar inside a flow collection.
fn flow_plain_end(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = start;
    while let Some(&b) = bytes.get(i) {
        match b {
            b',' | b']' | b'}' | b'\n' | b'\r' => break,
            b':' if bytes
                .get(i + 1)
                .map_or(true, |n| matches!(n, b' ' | b'\t' | b'\n' | b',' | b']' | b'}')) =>
            {
                break
            }
            b'#' if i > start && matches!(bytes[i - 1], b' ' | b'\t') => break,
            _ => i += 1,
        }
    }
    i
}

fn fold_block(lines: &[&str]) -> String {
    let mut out = String::new();
    let mut after_break = true;
    for line in lines {
        if line.is_empty() {
            out.push('\n');
            after_break = true;
            continue;
        }
        if !after_break {
            out.push(' ');
        }
        out.push_str(line);
        after_break = false;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_entry<'d>(doc: &'d Document, key: &str) -> &'d Node {
        doc.entry(doc.roots()[0], key).unwrap()
    }

    #[test]
    fn parses_nested_block_structure() {
        let text = "- hosts: web\n  tasks:\n    - name: install\n      apt: name=nginx\n";
        let doc = parse(text, "site.yml").unwrap();
        let root = doc.node(doc.roots()[0]);
        assert!(root.is_sequence());
        let play = doc.children(root.id).next().unwrap();
        assert!(play.is_mapping());
        assert_eq!(doc.entry(play.id, "hosts").and_then(Node::as_str), Some("web"));
        let tasks = doc.entry(play.id, "tasks").unwrap();
        assert!(tasks.is_sequence());
        let task = doc.children(tasks.id).next().unwrap();
        let apt = doc.entry(task.id, "apt").unwrap();
        assert_eq!(apt.as_str(), Some("name=nginx"));
        assert_eq!((apt.span.start.line, apt.span.start.column), (4, 12));
    }

    #[test]
    fn serialize_round_trips_untouched_text() {
        let text = "# c\r\nkey:   value   \r\nlist:\n\t- a\n";
        let doc = parse(text, "t.yml").unwrap();
        assert_eq!(doc.serialize(), text);
    }

    #[test]
    fn duplicate_keys_are_kept() {
        let doc = parse("name: a\nname: b\n", "t.yml").unwrap();
        let values: Vec<_> = doc
            .children(doc.roots()[0])
            .filter_map(Node::as_str)
            .collect();
        assert_eq!(values, ["a", "b"]);
    }

    #[test]
    fn trailing_whitespace_and_comments_are_ignored() {
        let doc = parse("a: 1   # one\nb: 'x # y'  \n", "t.yml").unwrap();
        assert_eq!(root_entry(&doc, "a").as_str(), Some("1"));
        assert_eq!(root_entry(&doc, "b").as_str(), Some("x # y"));
    }

    #[test]
    fn empty_value_is_null_scalar() {
        let doc = parse("a:\nb: 2\n", "t.yml").unwrap();
        let a = root_entry(&doc, "a");
        assert!(a.is_null());
        assert_eq!(a.span.start.offset, 2);
    }

    #[test]
    fn sequence_at_mapping_indent() {
        let doc = parse("tags:\n- a\n- b\nnext: 1\n", "t.yml").unwrap();
        let tags = root_entry(&doc, "tags");
        assert!(tags.is_sequence());
        assert_eq!(doc.children(tags.id).count(), 2);
        assert_eq!(root_entry(&doc, "next").as_str(), Some("1"));
    }

    #[test]
    fn nested_compact_sequences() {
        let doc = parse("- - a\n  - b\n- c\n", "t.yml").unwrap();
        let root = doc.roots()[0];
        let first = doc.children(root).next().unwrap();
        assert!(first.is_sequence());
        assert_eq!(doc.children(first.id).count(), 2);
        assert_eq!(doc.children(root).count(), 2);
    }

    #[test]
    fn flow_collections_across_lines() {
        let text = "ports: [80,\n  443]\nenv: {A: 1, B: \"two\"}\n";
        let doc = parse(text, "t.yml").unwrap();
        let ports = root_entry(&doc, "ports");
        assert!(ports.is_sequence());
        let values: Vec<_> = doc.children(ports.id).filter_map(Node::as_str).collect();
        assert_eq!(values, ["80", "443"]);
        let env = root_entry(&doc, "env");
        assert_eq!(doc.entry(env.id, "B").and_then(Node::as_str), Some("two"));
    }

    #[test]
    fn block_scalars_honor_chomping() {
        let text = "lit: |\n  one\n  two\n\nfold: >-\n  a\n  b\nkeep: |+\n  x\n\n";
        let doc = parse(text, "t.yml").unwrap();
        assert_eq!(root_entry(&doc, "lit").as_str(), Some("one\ntwo\n"));
        assert_eq!(root_entry(&doc, "fold").as_str(), Some("a b"));
        assert_eq!(root_entry(&doc, "keep").as_str(), Some("x\n\n"));
    }

    #[test]
    fn block_scalar_keeps_hash_lines() {
        let doc = parse("script: |\n  # not a comment\n  run\n", "t.yml").unwrap();
        assert_eq!(
            root_entry(&doc, "script").as_str(),
            Some("# not a comment\nrun\n")
        );
    }

    #[test]
    fn multi_line_plain_and_quoted_scalars() {
        let text = "msg: first\n  second\nq: \"a\n  b\"\nnext: 1\n";
        let doc = parse(text, "t.yml").unwrap();
        assert_eq!(root_entry(&doc, "msg").as_str(), Some("first second"));
        assert_eq!(root_entry(&doc, "q").as_str(), Some("a b"));
        assert_eq!(root_entry(&doc, "next").as_str(), Some("1"));
    }

    #[test]
    fn tags_anchors_and_aliases() {
        let text = "base: &defaults\n  a: 1\nother: *defaults\nsecret: !vault abc\n";
        let doc = parse(text, "t.yml").unwrap();
        assert_eq!(root_entry(&doc, "base").anchor.as_deref(), Some("defaults"));
        let other = root_entry(&doc, "other");
        assert_eq!(other.style, ScalarStyle::Alias);
        assert_eq!(other.as_str(), Some("defaults"));
        let secret = root_entry(&doc, "secret");
        assert_eq!(secret.tag.as_deref(), Some("vault"));
        assert_eq!(secret.as_str(), Some("abc"));
    }

    #[test]
    fn multiple_documents_and_markers() {
        let text = "%YAML 1.2\n---\na: 1\n...\n---\n- b\n";
        let doc = parse(text, "t.yml").unwrap();
        assert_eq!(doc.roots().len(), 2);
        assert!(doc.node(doc.roots()[1]).is_sequence());
    }

    #[test]
    fn tabs_in_indentation_are_tolerated() {
        let doc = parse("a:\n\tb: 1\n", "t.yml").unwrap();
        let a = root_entry(&doc, "a");
        assert_eq!(doc.entry(a.id, "b").and_then(Node::as_str), Some("1"));
    }

    #[test]
    fn unterminated_flow_sequence_reports_opening_line() {
        let err = parse("a: 1\nb: [1, 2\nc: 3\n", "bad.yml").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unterminated flow sequence"));
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = parse("a: \"open\n", "bad.yml").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("double-quoted"));
    }

    #[test]
    fn bad_indentation_is_an_error() {
        let err = parse("a: 1\n    b: 2\n", "bad.yml").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn content_after_flow_value_is_an_error() {
        let err = parse("a: [1] x\n", "bad.yml").unwrap_err();
        assert!(err.message.contains("after value"));
    }

    #[test]
    fn spans_locate_keys_and_values() {
        let doc = parse("outer:\n  inner: \"v\"\n", "t.yml").unwrap();
        let outer = root_entry(&doc, "outer");
        let inner = doc.entry(outer.id, "inner").unwrap();
        assert_eq!(doc.span_text(&inner.span), "\"v\"");
        let key = inner.key.as_ref().unwrap();
        assert_eq!(doc.span_text(&key.span), "inner");
        assert_eq!(outer.span.start.line, 2);
    }
}
