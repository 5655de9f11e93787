//! # playlint-rules
//!
//! Built-in lint rules for playlint.
//!
//! ## Available Rules
//!
//! | Code | Name | Default | Description |
//! |------|------|---------|-------------|
//! | PL001 | `duplicate-key` | error | Forbids repeated keys in a mapping |
//! | PL002 | `trailing-whitespace` | warning | Forbids trailing spaces and tabs (fixable) |
//! | PL003 | `no-tabs` | warning | Forbids tabs in indentation (fixable) |
//! | PL004 | `truthy` | warning | Requires `true`/`false` for booleans (fixable) |
//! | PL005 | `line-length` | warning | Limits line length |
//! | PL006 | `document-start` | info, opt-in | Requires a leading `---` (fixable) |
//! | PL007 | `new-line-at-end-of-file` | warning | Requires a final newline (fixable) |
//! | PL008 | `risky-octal` | error | Requires quoted file modes (fixable) |
//! | PL009 | `partial-become` | warning | Requires `become` with `become_user` |
//!
//! ## Usage
//!
//! ```ignore
//! use playlint_core::Analyzer;
//! use playlint_rules::builtin_registry;
//!
//! let registry = builtin_registry()?;
//! let analyzer = Analyzer::builder().registry(&registry).build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod document_start;
pub mod duplicate_key;
pub mod line_length;
pub mod new_line_at_end_of_file;
pub mod no_tabs;
pub mod partial_become;
pub mod risky_octal;
pub mod trailing_whitespace;
pub mod truthy;

mod presets;

#[cfg(test)]
mod test_util;

pub use document_start::DocumentStart;
pub use duplicate_key::DuplicateKey;
pub use line_length::LineLength;
pub use new_line_at_end_of_file::NewLineAtEndOfFile;
pub use no_tabs::NoTabs;
pub use partial_become::PartialBecome;
pub use presets::{all_rules, builtin_registry, opt_in_rules, Preset};
pub use risky_octal::RiskyOctal;
pub use trailing_whitespace::TrailingWhitespace;
pub use truthy::Truthy;

/// Re-export core types for convenience.
pub use playlint_core::{Finding, Rule, Severity};
