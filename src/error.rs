//! Error types for running a menu.

use std::io;

/// Result type alias for menu operations.
pub type MenuResult<T> = std::result::Result<T, MenuError>;

/// Errors that can end a menu invocation.
#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    /// The caller passed no options at all.
    #[error("cannot show a menu without options")]
    EmptyCandidateList,

    /// Raw mode could not be entered or restored, or the key device could
    /// not be opened.
    #[error("{context}: {source}")]
    TerminalConfiguration {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    /// Reading keys or drawing failed after the terminal was set up.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl MenuError {
    pub(crate) fn terminal(context: &'static str, source: io::Error) -> Self {
        MenuError::TerminalConfiguration { context, source }
    }

    /// Whether the caller should fall back to a non-interactive input path.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, MenuError::TerminalConfiguration { .. })
    }
}
