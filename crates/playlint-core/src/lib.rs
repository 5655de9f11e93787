//! # playlint-core
//!
//! Core framework for linting indentation-significant configuration
//! documents such as playbooks, inventories and CI definitions.
//!
//! This crate provides:
//!
//! - [`parse`] and [`Document`], a position-preserving document tree
//! - [`Rule`] trait and [`RuleRegistry`] for declarative rules
//! - [`Engine`] for single-traversal evaluation with inline suppressions
//! - [`Fixer`] for safe, conflict-free textual fixes
//! - [`Analyzer`] for parallel runs over many files
//! - [`report`] for text, compact and JSON output
//!
//! ## Example
//!
//! ```ignore
//! use playlint_core::{Analyzer, Config, RuleRegistry};
//!
//! let mut registry = RuleRegistry::new();
//! registry.register(MyRule)?;
//!
//! let analyzer = Analyzer::builder()
//!     .registry(&registry)
//!     .config(Config::default())
//!     .build()?;
//!
//! let result = analyzer.analyze(&["playbooks".into()])?;
//! print!("{}", playlint_core::report::render(&result, Format::Text)?);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod context;
mod document;
mod engine;
mod error;
mod fix;
mod registry;
mod rule;
mod types;

/// Baseline files of accepted findings.
pub mod baseline;
/// Parser for configuration documents.
pub mod parser;
/// Report rendering and exit status.
pub mod report;
/// Inline suppression directives.
pub mod suppression;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError, CancellationToken};
pub use baseline::{Baseline, BaselineEntry};
pub use config::{AnalyzerConfig, Config, RuleConfig};
pub use context::{Annotation, Annotations, RuleContext};
pub use document::{Document, Key, Node, NodeId, NodeKind, ScalarStyle};
pub use engine::{Engine, EngineError, Evaluation};
pub use error::{ConfigurationError, RuleError};
pub use fix::{FixError, FixOutcome, FixPass, FixSelection, Fixer, DEFAULT_MAX_FIX_PASSES};
pub use parser::{parse, ParseError};
pub use registry::{ResolvedRule, ResolvedRules, RuleRegistry};
pub use report::{exit_code, Format, ReportError, Reporter};
pub use rule::{Match, Rule, RuleBox, RuleKind, RuleRef};
pub use types::{
    Edit, FileError, FileErrorKind, Finding, FixSummary, LintResult, Position, Severity, Span,
    MISSING_SUPPRESSION_REASON, MISSING_SUPPRESSION_REASON_CODE, RULE_ERROR, RULE_ERROR_CODE,
};

/// Version of the playlint framework.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
