//! Context types for rule execution.

use crate::config::RuleConfig;
use crate::document::{Document, NodeId};
use crate::types::Span;
use std::collections::HashMap;

/// A value left on a node by one rule for later rules to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// A boolean reading of the node (e.g., a normalized truthy value).
    Bool(bool),
    /// Free-form text.
    Text(String),
}

impl Annotation {
    /// Returns the boolean payload, if any.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(_) => None,
        }
    }
}

/// Per-document annotation store, keyed by node and annotation name.
#[derive(Debug, Default, Clone)]
pub struct Annotations {
    values: HashMap<(NodeId, &'static str), Annotation>,
}

impl Annotations {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an annotation, replacing any previous value.
    pub fn set(&mut self, node: NodeId, key: &'static str, value: Annotation) {
        self.values.insert((node, key), value);
    }

    /// Reads an annotation.
    #[must_use]
    pub fn get(&self, node: NodeId, key: &'static str) -> Option<&Annotation> {
        self.values.get(&(node, key))
    }

    /// Number of stored annotations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing has been annotated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Context provided to a rule for one callback.
///
/// Gives access to the document, the rule's configured options and the
/// shared annotation store of the current traversal.
#[derive(Debug)]
pub struct RuleContext<'a> {
    /// The document being checked.
    pub document: &'a Document,
    /// Options configured under `[rules.<id>]`.
    pub options: &'a RuleConfig,
    annotations: &'a mut Annotations,
}

impl<'a> RuleContext<'a> {
    /// Creates a new rule context.
    #[must_use]
    pub fn new(
        document: &'a Document,
        options: &'a RuleConfig,
        annotations: &'a mut Annotations,
    ) -> Self {
        Self {
            document,
            options,
            annotations,
        }
    }

    /// Leaves an annotation on a node for later rules.
    pub fn annotate(&mut self, node: NodeId, key: &'static str, value: Annotation) {
        self.annotations.set(node, key, value);
    }

    /// Reads an annotation left by an earlier rule.
    #[must_use]
    pub fn annotation(&self, node: NodeId, key: &'static str) -> Option<&Annotation> {
        self.annotations.get(node, key)
    }

    /// Builds a span from byte offsets of the current document.
    #[must_use]
    pub fn span(&self, start: usize, end: usize) -> Span {
        self.document.span(start, end)
    }
}
