//! The in-flight logical action and the deferred edits it produces.

use core_events::{KeyToken, format_keys};
use core_model::{Edit, HostCommand};
use core_text::{Position, PositionDiff};

/// Counts are capped the way Vim caps them.
pub const MAX_COUNT: usize = 999_999;

/// Index of an action in the engine's action table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub u16);

/// One dispatched action together with the keys it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAction {
    pub id: ActionId,
    pub keys: Vec<KeyToken>,
}

/// How a captured action sequence is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// Feed the captured keys back through dispatch.
    Keystrokes,
    /// Re-run each captured action directly.
    ContentChange,
}

/// Per-transformation bookkeeping used when the commit reconciles cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformMeta {
    pub cursor_index: Option<usize>,
    /// Correction applied to the owning cursor after the commit.
    pub diff: Option<PositionDiff>,
    /// The action already placed its cursors in post-edit coordinates.
    pub manually_set_cursor_positions: bool,
}

impl TransformMeta {
    pub fn for_cursor(index: usize) -> Self {
        Self {
            cursor_index: Some(index),
            ..Self::default()
        }
    }

    pub fn with_diff(mut self, diff: PositionDiff) -> Self {
        self.diff = Some(diff);
        self
    }

    pub fn manual(mut self) -> Self {
        self.manually_set_cursor_positions = true;
        self
    }
}

/// A deferred edit or cursor-adjustment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformation {
    InsertText {
        position: Position,
        text: String,
        meta: TransformMeta,
    },
    ReplaceText {
        start: Position,
        end: Position,
        text: String,
        meta: TransformMeta,
    },
    DeleteRange {
        start: Position,
        end: Position,
        meta: TransformMeta,
    },
    MoveCursor {
        meta: TransformMeta,
    },
    /// Let the host type `text` at every cursor (auto-pairing and friends).
    InsertTextViaHost {
        text: String,
        cursor_index: usize,
    },
    HostCommand {
        command: HostCommand,
        meta: TransformMeta,
    },
    RunMacro {
        register: char,
        replay: ReplayMode,
    },
    ReplayDotRepeat {
        count: Option<usize>,
    },
    /// Keys handed back by the command-line collaborator.
    RunKeys {
        keys: Vec<KeyToken>,
    },
}

impl Transformation {
    /// Insert, replace and delete: the kinds that become buffer edits.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Transformation::InsertText { .. }
                | Transformation::ReplaceText { .. }
                | Transformation::DeleteRange { .. }
        )
    }

    pub fn meta(&self) -> Option<&TransformMeta> {
        match self {
            Transformation::InsertText { meta, .. }
            | Transformation::ReplaceText { meta, .. }
            | Transformation::DeleteRange { meta, .. }
            | Transformation::MoveCursor { meta }
            | Transformation::HostCommand { meta, .. } => Some(meta),
            _ => None,
        }
    }

    pub fn to_edit(&self) -> Option<Edit> {
        match self {
            Transformation::InsertText { position, text, .. } => Some(Edit::Insert {
                at: *position,
                text: text.clone(),
            }),
            Transformation::ReplaceText {
                start, end, text, ..
            } => Some(Edit::Replace {
                start: *start,
                end: *end,
                text: text.clone(),
            }),
            Transformation::DeleteRange { start, end, .. } => Some(Edit::Delete {
                start: *start,
                end: *end,
            }),
            _ => None,
        }
    }
}

/// One logical action in progress, or one captured macro.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedState {
    /// Keys typed since the last dispatched action.
    pub action_keys: Vec<KeyToken>,
    /// Every key of the logical action, in order.
    pub command_list: Vec<KeyToken>,
    pub actions_run: Vec<RecordedAction>,
    /// 0 means no count was typed.
    pub count: usize,
    pub operator_count: usize,
    pub register_name: Option<char>,
    pub operator: Option<ActionId>,
    pub transformations: Vec<Transformation>,
}

impl RecordedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_count_digit(&mut self, digit: u32) {
        self.count = (self.count * 10 + digit as usize).min(MAX_COUNT);
    }

    /// Count for a motion under the pending operator: both default to 1.
    pub fn motion_count(&self) -> usize {
        (self.operator_count.max(1) * self.count.max(1)).min(MAX_COUNT)
    }

    pub fn has_operator(&self) -> bool {
        self.operator.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.action_keys.is_empty()
            && self.actions_run.is_empty()
            && self.count == 0
            && self.operator.is_none()
            && self.register_name.is_none()
    }

    /// Copy suitable for storing in a register or for dot-repeat: pending
    /// keys and uncommitted transformations are dropped.
    pub fn captured(&self) -> Self {
        Self {
            action_keys: Vec::new(),
            command_list: self.command_list.clone(),
            actions_run: self.actions_run.clone(),
            count: 0,
            operator_count: 0,
            register_name: None,
            operator: None,
            transformations: Vec::new(),
        }
    }

    /// Append another capture, as recording and `qA` do.
    pub fn extend_from(&mut self, other: &RecordedState) {
        self.command_list.extend(other.command_list.iter().cloned());
        self.actions_run.extend(other.actions_run.iter().cloned());
    }

    pub fn keys_display(&self) -> String {
        format_keys(&self.command_list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_multiply_and_cap() {
        let mut r = RecordedState::new();
        assert_eq!(r.motion_count(), 1);
        r.push_count_digit(2);
        r.operator_count = 3;
        assert_eq!(r.motion_count(), 6);
        for _ in 0..8 {
            r.push_count_digit(9);
        }
        assert_eq!(r.count, MAX_COUNT);
        assert_eq!(r.motion_count(), MAX_COUNT);
    }

    #[test]
    fn captured_drops_pending_state() {
        let mut r = RecordedState::new();
        r.action_keys.push(KeyToken::Char('d'));
        r.command_list = vec![KeyToken::Char('x')];
        r.actions_run.push(RecordedAction {
            id: ActionId(3),
            keys: vec![KeyToken::Char('x')],
        });
        r.transformations.push(Transformation::MoveCursor {
            meta: TransformMeta::for_cursor(0),
        });
        let c = r.captured();
        assert!(c.action_keys.is_empty());
        assert!(c.transformations.is_empty());
        assert_eq!(c.actions_run.len(), 1);
        assert_eq!(c.keys_display(), "x");
    }

    #[test]
    fn text_transformations_become_edits() {
        let t = Transformation::DeleteRange {
            start: Position::new(0, 1),
            end: Position::new(0, 3),
            meta: TransformMeta::for_cursor(0),
        };
        assert!(t.is_text());
        assert_eq!(
            t.to_edit(),
            Some(Edit::Delete {
                start: Position::new(0, 1),
                end: Position::new(0, 3)
            })
        );
        assert!(!Transformation::ReplayDotRepeat { count: None }.is_text());
    }
}
