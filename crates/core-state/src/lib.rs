//! Engine state: modes, registers, recorded actions, search, and the per-
//! document / process-wide state records the action layer reads and writes.
//!
//! `VimState` belongs to one document. `GlobalState` (search, histories,
//! last repeatable action) and the register store are shared by every
//! document the engine serves.

pub mod error;
pub mod mode;
pub mod recorded;
pub mod registers;
pub mod search;

pub use error::VimError;
pub use mode::{Mode, ModeSet};
pub use recorded::{
    ActionId, MAX_COUNT, RecordedAction, RecordedState, ReplayMode, TransformMeta, Transformation,
};
pub use registers::{
    Register, RegisterContent, RegisterEntry, RegisterError, RegisterMode, Registers, WriteKind, is_valid_name,
};
pub use search::{OffsetTarget, SearchDirection, SearchHit, SearchMatch, SearchOffset, SearchState};

use core_text::{Cursor, Position};
use std::collections::VecDeque;
use tracing::trace;

/// Maximum number of entries kept per history list.
pub const HISTORY_MAX: usize = 50;

/// `desired_column` value meaning "end of line" (set by `$`).
pub const DESIRED_EOL: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Search(SearchDirection),
    CommandLine,
}

/// Text being typed after `/`, `?` or `:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: String,
    /// Cursors to restore when the prompt is cancelled.
    pub origin_cursors: Vec<Cursor>,
    pub prior_mode: Mode,
    /// Position while browsing history with `<Up>`/`<Down>`.
    pub history_index: Option<usize>,
}

impl Prompt {
    pub fn leader(&self) -> char {
        match self.kind {
            PromptKind::Search(dir) => dir.prompt_char(),
            PromptKind::CommandLine => ':',
        }
    }

    /// Status-line rendering, e.g. `/foo`.
    pub fn display(&self) -> String {
        format!("{}{}", self.leader(), self.text)
    }
}

/// Edge a VisualBlock `I`/`A` inserts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockInsertion {
    #[default]
    Insert,
    Append,
}

/// The last `f F t T` for `;` and `,`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastFind {
    /// One of `f F t T`.
    pub kind: char,
    pub target: char,
}

impl LastFind {
    pub fn forward(&self) -> bool {
        matches!(self.kind, 'f' | 't')
    }

    pub fn till(&self) -> bool {
        matches!(self.kind, 't' | 'T')
    }

    pub fn reversed(&self) -> Self {
        let kind = match self.kind {
            'f' => 'F',
            'F' => 'f',
            't' => 'T',
            _ => 't',
        };
        Self {
            kind,
            target: self.target,
        }
    }
}

/// Selection remembered for `gv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastVisual {
    pub mode: Mode,
    pub cursors: Vec<Cursor>,
}

/// Per-document engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VimState {
    mode: Mode,
    pub document: String,
    /// Ordered by document position; index 0 is the primary cursor.
    pub cursors: Vec<Cursor>,
    /// Visual column vertical motions aim for; [`DESIRED_EOL`] after `$`.
    pub desired_column: usize,
    pub recorded: RecordedState,
    /// Register and capture of an active `q` recording.
    pub macro_recording: Option<(char, RecordedState)>,
    pub last_movement_failed: bool,
    /// Characters Replace mode overtook, per cursor; `None` marks an append.
    pub replace_originals: Vec<Vec<Option<char>>>,
    pub block_insertion: BlockInsertion,
    pub prompt: Option<Prompt>,
    /// Text typed during the current insert session (for `.` register).
    pub insert_text: String,
    /// Count given to the command that entered Insert (`3ix<Esc>`).
    pub insert_count: usize,
    /// Repeats of the insert each start on a new line (`3oab<Esc>`).
    pub insert_repeat_newline: bool,
    pub last_visual: Option<LastVisual>,
    pub last_find: Option<LastFind>,
    /// Nesting depth of macro / dot-repeat replay.
    pub replaying: usize,
}

impl VimState {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            mode: Mode::Normal,
            document: document.into(),
            cursors: vec![Cursor::at(Position::origin())],
            desired_column: 0,
            recorded: RecordedState::new(),
            macro_recording: None,
            last_movement_failed: false,
            replace_originals: Vec::new(),
            block_insertion: BlockInsertion::Insert,
            prompt: None,
            insert_text: String::new(),
            insert_count: 0,
            insert_repeat_newline: false,
            last_visual: None,
            last_find: None,
            replaying: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, to: Mode) {
        mode::transition(&mut self.mode, to);
    }

    /// Put back the mode an action started in before running it for the
    /// next cursor. Skips the transition check.
    pub fn rewind_mode(&mut self, to: Mode) {
        self.mode = to;
    }

    pub fn primary(&self) -> Cursor {
        self.cursors
            .first()
            .copied()
            .unwrap_or_else(|| Cursor::at(Position::origin()))
    }

    pub fn is_recording(&self) -> bool {
        self.macro_recording.is_some()
    }

    /// Keep cursors sorted by caret and drop exact duplicates.
    pub fn normalize_cursors(&mut self) {
        if self.cursors.is_empty() {
            self.cursors.push(Cursor::at(Position::origin()));
            return;
        }
        self.cursors.sort_by_key(|c| c.sorted().0);
        self.cursors.dedup();
    }

    /// Forget the in-flight action.
    pub fn reset_recorded(&mut self) {
        trace!(target: "engine.dispatch", "recorded_state_reset");
        self.recorded = RecordedState::new();
    }
}

/// Process-wide engine state.
#[derive(Debug, Clone, Default)]
pub struct GlobalState {
    pub search: Option<SearchState>,
    pub search_history: VecDeque<String>,
    pub command_history: VecDeque<String>,
    /// Last completed buffer-changing action, replayed by `.`.
    pub previous_full_action: Option<RecordedState>,
    /// Register of the last `@x`, for `@@`.
    pub last_invoked_macro: Option<char>,
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_search_history(&mut self, entry: &str) {
        push_history(&mut self.search_history, entry);
    }

    pub fn push_command_history(&mut self, entry: &str) {
        push_history(&mut self.command_history, entry);
    }
}

/// Most recent last; a re-used entry moves to the end.
fn push_history(list: &mut VecDeque<String>, entry: &str) {
    if entry.is_empty() {
        return;
    }
    list.retain(|e| e != entry);
    list.push_back(entry.to_string());
    while list.len() > HISTORY_MAX {
        list.pop_front();
    }
}
