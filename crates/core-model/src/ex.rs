use crate::HostCommand;
use core_events::{KeyToken, parse_keys};
use thiserror::Error;

/// What the engine should do with a submitted command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExAction {
    /// Zero-based target line.
    GotoLine(usize),
    /// Normal-mode keys to feed back through the engine.
    RunKeys(Vec<KeyToken>),
    Host(HostCommand),
    Message(String),
    Nothing,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExError {
    #[error("E492: Not an editor command: {0}")]
    NotAnEditorCommand(String),
    #[error("{0}")]
    Failed(String),
}

/// Document facts a command-line parser may need to resolve ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExContext {
    pub cursor_line: usize,
    pub last_line: usize,
    /// Line span of the selection the command line was opened from.
    pub visual_lines: Option<(usize, usize)>,
}

/// The ex command-line grammar lives with the host; the engine only hands
/// over the submitted text.
pub trait ExCommandParser: Send {
    fn parse(&self, text: &str, cx: &ExContext) -> Result<ExAction, ExError>;
}

/// Rejects every command.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExCommands;

impl ExCommandParser for NoExCommands {
    fn parse(&self, text: &str, _cx: &ExContext) -> Result<ExAction, ExError> {
        if text.trim().is_empty() {
            return Ok(ExAction::Nothing);
        }
        Err(ExError::NotAnEditorCommand(text.trim().to_string()))
    }
}

/// A handful of commands that need no real ex grammar: `:{N}`, `:$`,
/// `:normal {keys}`, `:e {file}`, `:undo`, `:redo`, `:echo {text}` and
/// `:nohlsearch`. A leading `'<,'>` or `%` range is accepted and ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinimalExCommands;

impl ExCommandParser for MinimalExCommands {
    fn parse(&self, text: &str, cx: &ExContext) -> Result<ExAction, ExError> {
        let mut rest = text.trim_start_matches(':').trim();
        for range in ["'<,'>", "%"] {
            if let Some(stripped) = rest.strip_prefix(range) {
                rest = stripped.trim_start();
            }
        }
        if rest.is_empty() {
            return Ok(ExAction::Nothing);
        }
        if rest == "$" {
            return Ok(ExAction::GotoLine(cx.last_line));
        }
        if let Ok(n) = rest.parse::<usize>() {
            return Ok(ExAction::GotoLine(n.saturating_sub(1).min(cx.last_line)));
        }
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim_start()),
            None => (rest, ""),
        };
        match name {
            "norm" | "normal" => parse_keys(arg)
                .map(ExAction::RunKeys)
                .map_err(|e| ExError::Failed(e.to_string())),
            "e" | "edit" if !arg.is_empty() => Ok(ExAction::Host(HostCommand::OpenFile(arg.to_string()))),
            "u" | "undo" => Ok(ExAction::Host(HostCommand::Undo)),
            "red" | "redo" => Ok(ExAction::Host(HostCommand::Redo)),
            "echo" => Ok(ExAction::Message(arg.trim_matches('"').to_string())),
            "noh" | "nohlsearch" => Ok(ExAction::Nothing),
            _ => Err(ExError::NotAnEditorCommand(rest.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cx() -> ExContext {
        ExContext {
            cursor_line: 0,
            last_line: 9,
            visual_lines: None,
        }
    }

    #[test]
    fn line_numbers_and_dollar() {
        let p = MinimalExCommands;
        assert_eq!(p.parse("3", &cx()), Ok(ExAction::GotoLine(2)));
        assert_eq!(p.parse("0", &cx()), Ok(ExAction::GotoLine(0)));
        assert_eq!(p.parse("400", &cx()), Ok(ExAction::GotoLine(9)));
        assert_eq!(p.parse("$", &cx()), Ok(ExAction::GotoLine(9)));
    }

    #[test]
    fn normal_runs_keys_and_ranges_are_ignored() {
        let p = MinimalExCommands;
        assert_eq!(
            p.parse("'<,'>normal A;", &cx()),
            Ok(ExAction::RunKeys(vec![KeyToken::Char('A'), KeyToken::Char(';')]))
        );
    }

    #[test]
    fn unknown_commands_report_e492() {
        let err = MinimalExCommands.parse("frobnicate", &cx()).unwrap_err();
        assert_eq!(err.to_string(), "E492: Not an editor command: frobnicate");
        assert!(NoExCommands.parse("w", &cx()).is_err());
    }
}
