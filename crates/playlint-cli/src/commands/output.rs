//! Shared output formatting for lint results.

use anyhow::Result;
use playlint_core::{LintResult, Reporter};
use std::io::{IsTerminal, Write};

use crate::OutputFormat;

/// Print lint results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat) -> Result<()> {
    let rendered = Reporter::new(format.into())
        .color(use_color())
        .render(result)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Colors only on a terminal, and never when `NO_COLOR` is set.
fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
