//! File positions and diagnostic counting
// (c) 2024 Ross Younger

use std::{fmt::Display, sync::Arc};

use tracing::{error, warn};

/// The current file name and line number, for diagnostic messages.
///
/// This is cheap to clone, and a clone can be kept for reporting long after the file has been closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    filename: Arc<str>,
    line: usize,
}

impl Position {
    /// Creates a position before the first line of a file
    #[must_use]
    pub fn new(filename: &str) -> Self {
        Self {
            filename: filename.into(),
            line: 0,
        }
    }

    /// The name of the file being parsed
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The current line of the file being parsed (1-based; 0 before the first line)
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn next_line(&mut self) {
        self.line += 1;
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.filename, self.line)
    }
}

/// Running error and warning counts.
///
/// Each file being parsed has its own; they are folded into the totals of the
/// whole configuration when the file is finished with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    errors: usize,
    warnings: usize,
}

impl Diagnostics {
    /// Number of errors reported
    #[must_use]
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Number of warnings reported
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// Reports an error at a given position
    pub(crate) fn error<M: Display>(&mut self, pos: &Position, msg: M) {
        self.errors += 1;
        error!("{pos}: {msg}");
    }

    /// Reports a warning at a given position
    pub(crate) fn warning<M: Display>(&mut self, pos: &Position, msg: M) {
        self.warnings += 1;
        warn!("{pos}: {msg}");
    }

    /// Reports an error that is not about any particular line
    pub(crate) fn unpositioned_error<M: Display>(&mut self, msg: M) {
        self.errors += 1;
        error!("{msg}");
    }

    /// Adds another set of counts to this one
    pub(crate) fn absorb(&mut self, other: Diagnostics) {
        self.errors += other.errors;
        self.warnings += other.warnings;
    }
}
