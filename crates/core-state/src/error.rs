//! User-facing errors, reported on the status line with Vim's codes.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VimError {
    #[error("E353: Nothing in register {0}")]
    NothingInRegister(char),
    #[error("E354: Invalid register name: '{0}'")]
    InvalidRegisterName(char),
    #[error("E486: Pattern not found: {0}")]
    PatternNotFound(String),
    #[error("E385: Search hit BOTTOM without match for: {0}")]
    SearchHitBottom(String),
    #[error("E384: Search hit TOP without match for: {0}")]
    SearchHitTop(String),
    #[error("E35: No previous regular expression")]
    NoPreviousPattern,
    #[error("E23: No alternate file")]
    NoAlternateFile,
    #[error("E748: No previously used register")]
    NoPreviouslyUsedRegister,
    #[error("E345: Can't find file \"{0}\" in path")]
    CantFindFileInPath(String),
    #[error("E492: Not an editor command: {0}")]
    NotAnEditorCommand(String),
    #[error("E348: No string under cursor")]
    NoStringUnderCursor,
    #[error("E30: No previous command line")]
    NoPreviousCommandLine,
    /// Free-form message from the command-line collaborator.
    #[error("{0}")]
    Other(String),
}
