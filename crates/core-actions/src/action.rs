//! Action kinds and the per-cursor execution context.
//!
//! Actions never touch the buffer. They read through [`Cx::editor`], update
//! `cx.cursor` (in pre-edit coordinates) and push [`Transformation`]s that
//! the transformer commits once the action returns.

use core_config::Config;
use core_events::KeyToken;
use core_model::{ExCommandParser, StatusLine, TextEditor};
use core_state::{
    GlobalState, RegisterMode, Registers, TransformMeta, Transformation, VimError, VimState,
};
use core_text::{Cursor, MatchPairs, Position, PositionDiff, WordChars};

pub type MotionFn = fn(&mut Cx<'_>, Position, usize) -> MoveOutcome;
pub type CommandFn = fn(&mut Cx<'_>, usize) -> Result<(), VimError>;
pub type OperatorFn = fn(&mut Cx<'_>, OpRange) -> Result<(), VimError>;
pub type PrepareFn = fn(&mut Cx<'_>) -> Result<(), VimError>;

// -------------------------------------------------------------------------------------------------
// Movements
// -------------------------------------------------------------------------------------------------

/// What a movement does to `desired_column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPolicy {
    Update,
    Keep,
    EndOfLine,
}

/// A span with overrides, as produced by text objects and searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementResult {
    /// Replaces the range start; `None` keeps the cursor position.
    pub start: Option<Position>,
    pub stop: Position,
    pub inclusive: Option<bool>,
    pub linewise: Option<bool>,
}

impl MovementResult {
    pub fn to(stop: Position) -> Self {
        Self {
            start: None,
            stop,
            inclusive: None,
            linewise: None,
        }
    }

    pub fn span(start: Position, stop: Position) -> Self {
        Self {
            start: Some(start),
            ..Self::to(stop)
        }
    }

    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = Some(inclusive);
        self
    }

    pub fn linewise(mut self, linewise: bool) -> Self {
        self.linewise = Some(linewise);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    To(Position),
    Span(MovementResult),
    Failed,
}

#[derive(Clone, Copy)]
pub struct MovementSpec {
    pub run: MotionFn,
    pub inclusive: bool,
    pub linewise: bool,
    /// The motion sees 0 when no count was typed (`G`, `N%`).
    pub raw_count: bool,
    pub column: ColumnPolicy,
    pub text_object: bool,
    /// Runs once before the per-cursor motion (search commit).
    pub prepare: Option<PrepareFn>,
}

impl MovementSpec {
    pub const fn exclusive(run: MotionFn) -> Self {
        Self {
            run,
            inclusive: false,
            linewise: false,
            raw_count: false,
            column: ColumnPolicy::Update,
            text_object: false,
            prepare: None,
        }
    }

    pub const fn inclusive(run: MotionFn) -> Self {
        Self {
            inclusive: true,
            ..Self::exclusive(run)
        }
    }

    pub const fn linewise(run: MotionFn) -> Self {
        Self {
            linewise: true,
            column: ColumnPolicy::Keep,
            ..Self::exclusive(run)
        }
    }

    pub const fn raw_count(mut self) -> Self {
        self.raw_count = true;
        self
    }

    pub const fn column(mut self, column: ColumnPolicy) -> Self {
        self.column = column;
        self
    }

    pub const fn text_object(mut self) -> Self {
        self.text_object = true;
        self
    }

    pub const fn with_prepare(mut self, prepare: PrepareFn) -> Self {
        self.prepare = Some(prepare);
        self
    }
}

// -------------------------------------------------------------------------------------------------
// Commands
// -------------------------------------------------------------------------------------------------

#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub run: CommandFn,
    /// Ends the logical action (counts, registers and `"x` prefixes do not).
    pub complete: bool,
    /// Runs for the primary cursor only.
    pub runs_once: bool,
    /// Remembered for `.`.
    pub repeatable: bool,
    /// Left out of `q` recordings.
    pub not_recorded: bool,
}

impl CommandSpec {
    pub const fn new(run: CommandFn) -> Self {
        Self {
            run,
            complete: true,
            runs_once: false,
            repeatable: false,
            not_recorded: false,
        }
    }

    pub const fn incomplete(mut self) -> Self {
        self.complete = false;
        self
    }

    pub const fn once(mut self) -> Self {
        self.runs_once = true;
        self
    }

    pub const fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub const fn not_recorded(mut self) -> Self {
        self.not_recorded = true;
        self
    }
}

// -------------------------------------------------------------------------------------------------
// Operators
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Delete,
    Yank,
    Change,
    Indent,
    Outdent,
    Reindent,
    ToggleCase,
    Lower,
    Upper,
    Format,
}

impl OperatorKind {
    /// Operators whose doubled form is spelled with their last key (`g~~`, `guu`, `gqq`).
    pub fn is_case_family(self) -> bool {
        matches!(
            self,
            OperatorKind::ToggleCase | OperatorKind::Lower | OperatorKind::Upper | OperatorKind::Format
        )
    }
}

/// Region an operator acts on.
///
/// Charwise: `[start, end)`. Linewise: lines `start.line..=end.line`.
/// Blockwise: rows `start.line..=end.line`, screen columns
/// `start.character..=end.character` (`usize::MAX` reaches every line end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpRange {
    pub start: Position,
    pub end: Position,
    pub mode: RegisterMode,
}

impl OpRange {
    pub fn charwise(start: Position, end: Position) -> Self {
        Self {
            start,
            end,
            mode: RegisterMode::CharacterWise,
        }
    }

    pub fn lines(first: usize, last: usize) -> Self {
        Self {
            start: Position::new(first, 0),
            end: Position::new(last, 0),
            mode: RegisterMode::LineWise,
        }
    }

    pub fn block(top_left: Position, bottom_right: Position) -> Self {
        Self {
            start: top_left,
            end: bottom_right,
            mode: RegisterMode::BlockWise,
        }
    }

    pub fn line_count(&self) -> usize {
        self.end.line - self.start.line + 1
    }
}

#[derive(Clone, Copy)]
pub struct OperatorSpec {
    pub run: OperatorFn,
    pub kind: OperatorKind,
    /// Visual-mode variants that always act on whole lines (`D`, `Y`, `S`).
    pub force_linewise: bool,
}

impl OperatorSpec {
    pub const fn new(kind: OperatorKind, run: OperatorFn) -> Self {
        Self {
            run,
            kind,
            force_linewise: false,
        }
    }

    pub const fn linewise(mut self) -> Self {
        self.force_linewise = true;
        self
    }

    pub fn repeatable(&self) -> bool {
        self.kind != OperatorKind::Yank
    }
}

#[derive(Clone, Copy)]
pub enum ActionKind {
    Movement(MovementSpec),
    Command(CommandSpec),
    Operator(OperatorSpec),
}

impl ActionKind {
    pub fn repeatable(&self) -> bool {
        match self {
            ActionKind::Movement(_) => false,
            ActionKind::Command(c) => c.repeatable,
            ActionKind::Operator(o) => o.repeatable(),
        }
    }

    pub fn not_recorded(&self) -> bool {
        matches!(self, ActionKind::Command(c) if c.not_recorded)
    }
}

// -------------------------------------------------------------------------------------------------
// Execution context
// -------------------------------------------------------------------------------------------------

/// Everything one action invocation may read or write, for one cursor.
///
/// An action that assigns `vim.cursors` itself (`gv`, cancelling a prompt)
/// replaces the whole cursor list; otherwise the engine rebuilds the list
/// from each invocation's `cursor`, `spawned` and `retire`.
pub struct Cx<'a> {
    pub editor: &'a dyn TextEditor,
    pub vim: &'a mut VimState,
    pub registers: &'a mut Registers,
    pub globals: &'a mut GlobalState,
    pub config: &'a Config,
    pub ex: &'a dyn ExCommandParser,
    pub words: &'a WordChars,
    pub pairs: &'a MatchPairs,
    /// Keys that matched this action.
    pub keys: &'a [KeyToken],
    pub cursor_index: usize,
    pub cursor: Cursor,
    /// Operator waiting on this motion, if any.
    pub operator: Option<OperatorKind>,
    pub messages: &'a mut Vec<StatusLine>,
    /// Cursors to add after this one (one per row of a block insert).
    pub spawned: Vec<Cursor>,
    /// Drop this cursor once the action finishes.
    pub retire: bool,
}

impl<'a> Cx<'a> {
    pub fn caret(&self) -> Position {
        self.cursor.stop
    }

    pub fn set_caret(&mut self, pos: Position) {
        self.cursor = Cursor::at(pos);
    }

    pub fn line(&self, line: usize) -> String {
        self.editor.line_text(line)
    }

    pub fn line_len(&self, line: usize) -> usize {
        self.editor.line_len(line)
    }

    pub fn last_line(&self) -> usize {
        self.editor.last_line()
    }

    pub fn tabstop(&self) -> usize {
        self.config.editor().tabstop
    }

    /// Character carried by the trailing `<character>` / `<register>` key.
    pub fn last_key_char(&self) -> Option<char> {
        self.keys.last().and_then(KeyToken::literal_text)
    }

    pub fn meta(&self) -> TransformMeta {
        TransformMeta::for_cursor(self.cursor_index)
    }

    fn meta_with(&self, diff: Option<PositionDiff>) -> TransformMeta {
        match diff {
            Some(d) => self.meta().with_diff(d),
            None => self.meta(),
        }
    }

    pub fn push(&mut self, t: Transformation) {
        self.vim.recorded.transformations.push(t);
    }

    pub fn insert(&mut self, position: Position, text: impl Into<String>, diff: Option<PositionDiff>) {
        let meta = self.meta_with(diff);
        self.push(Transformation::InsertText {
            position,
            text: text.into(),
            meta,
        });
    }

    pub fn delete(&mut self, start: Position, end: Position, diff: Option<PositionDiff>) {
        let meta = self.meta_with(diff);
        self.push(Transformation::DeleteRange { start, end, meta });
    }

    pub fn replace(
        &mut self,
        start: Position,
        end: Position,
        text: impl Into<String>,
        diff: Option<PositionDiff>,
    ) {
        let meta = self.meta_with(diff);
        self.push(Transformation::ReplaceText {
            start,
            end,
            text: text.into(),
            meta,
        });
    }

    pub fn move_by(&mut self, diff: PositionDiff) {
        let meta = self.meta().with_diff(diff);
        self.push(Transformation::MoveCursor { meta });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.messages.push(StatusLine {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn error(&mut self, err: &VimError) {
        tracing::debug!(target: "engine.dispatch", error = %err, "user_error");
        self.messages.push(StatusLine {
            text: err.to_string(),
            is_error: true,
        });
    }

    /// Line-count message (`3 fewer lines`) when above `report`.
    pub fn report_lines(&mut self, lines: usize, what: &str) {
        if self.cursor_index == 0 && lines > self.config.editor().report {
            self.info(format!("{lines} {what}"));
        }
    }
}
