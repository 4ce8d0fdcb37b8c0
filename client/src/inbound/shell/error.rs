//! Errors raised while reading and dispatching shell commands.

use std::io;

use thiserror::Error;

use crate::domain::Error;

/// Failure of a single shell line, or of the shell's own I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// A quote was opened and never closed.
    #[error("unterminated quote")]
    UnterminatedQuote,
    /// The line ended with a lone backslash.
    #[error("nothing to escape at end of line")]
    DanglingEscape,
    /// The command or its arguments did not parse.
    #[error("{message}")]
    Usage {
        /// Rendered parser message, usage included.
        message: String,
    },
    /// A 1-based list position outside the list shown.
    #[error("no {what} #{position} (showing {len})")]
    NoSuchItem {
        /// Kind of list item.
        what: &'static str,
        /// Position typed by the user.
        position: usize,
        /// Items currently listed.
        len: usize,
    },
    /// The command needs a screen that is not shown.
    #[error("{message}")]
    WrongScreen {
        /// What the user should do first.
        message: &'static str,
    },
    /// A board operation failed.
    #[error(transparent)]
    Board(#[from] Error),
    /// Reading input or writing output failed.
    #[error("terminal I/O failed: {message}")]
    Io {
        /// Underlying error message.
        message: String,
    },
}

impl From<io::Error> for ShellError {
    fn from(value: io::Error) -> Self {
        Self::Io {
            message: value.to_string(),
        }
    }
}
