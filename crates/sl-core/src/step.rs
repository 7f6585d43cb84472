//! Progress step labels shared by the drivers, engine and CLI

use std::fmt;

/// Width every step label is right-aligned to
pub const MAX_STEP_LENGTH: usize = 8;

/// Phase of a reconciliation run, printed in front of each progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Connect,
    Setup,
    Ledger,
    Read,
    Error,
    Skip,
    Forward,
    Rollback,
    Complete,
    Disconnect,
}

impl Step {
    /// Upper-case label
    pub fn label(self) -> &'static str {
        match self {
            Step::Connect => "CONNECT",
            Step::Setup => "SETUP",
            Step::Ledger => "LEDGER",
            Step::Read => "READ",
            Step::Error => "ERROR",
            Step::Skip => "SKIP",
            Step::Forward => "FORWARD",
            Step::Rollback => "ROLLBACK",
            Step::Complete => "COMPLETE",
            Step::Disconnect => "DISCONNECT",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>width$}", self.label(), width = MAX_STEP_LENGTH)
    }
}

/// Shorten a statement to its first word.
///
/// Keeps credentials embedded in statements (e.g. `CREATE ROLE ... PASSWORD`)
/// out of info-level output.
pub fn abbreviate(statement: &str) -> &str {
    let trimmed = statement.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(idx) if idx > 0 => &trimmed[..idx],
        _ => trimmed,
    }
}
