//! Macro and dot-repeat replay.
//!
//! Replays run after the action that asked for them has been committed.
//! Each returns `Ok(false)` when it stopped early because a motion failed,
//! which aborts any remaining repetitions of the caller (`3@a`).

use crate::EngineError;
use crate::engine::Vim;
use core_events::KeyToken;
use core_model::{StatusLine, TextEditor};
use core_state::{RecordedAction, RegisterContent, ReplayMode, VimError, VimState};
use tracing::{debug, warn};

/// Deepest nesting of `@x` / `.` inside one another before giving up.
pub const MAX_REPLAY_DEPTH: usize = 100;

/// Keys that replay a plain-text register: every character is typed, line
/// breaks as `<CR>`.
fn text_keys(text: &str) -> Vec<KeyToken> {
    text.chars()
        .map(|c| match c {
            '\n' => KeyToken::enter(),
            '\x1b' => KeyToken::esc(),
            c => KeyToken::Char(c),
        })
        .collect()
}

enum Replay {
    Keys(Vec<KeyToken>),
    Actions(Vec<RecordedAction>),
}

impl Vim {
    /// Run `f` one replay level deeper.
    fn nested<F>(&mut self, doc: &mut VimState, f: F) -> Result<bool, EngineError>
    where
        F: FnOnce(&mut Self, &mut VimState) -> Result<bool, EngineError>,
    {
        if doc.replaying >= MAX_REPLAY_DEPTH {
            if self.env.config.strict() {
                return Err(EngineError::ReplayDepth(doc.replaying));
            }
            warn!(target: "engine.macro", depth = doc.replaying, "replay_depth_exceeded");
            return Ok(false);
        }
        doc.replaying += 1;
        let result = f(self, doc);
        doc.replaying -= 1;
        result
    }

    fn replay_actions(
        &mut self,
        doc: &mut VimState,
        editor: &mut dyn TextEditor,
        actions: &[RecordedAction],
    ) -> Result<bool, EngineError> {
        for action in actions {
            doc.recorded.command_list.extend(action.keys.iter().cloned());
            self.run_action(doc, editor, action.id, action.keys.clone())?;
            if doc.last_movement_failed {
                debug!(target: "engine.macro", "replay_aborted_on_failed_motion");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn replay_key_list(
        &mut self,
        doc: &mut VimState,
        editor: &mut dyn TextEditor,
        keys: &[KeyToken],
    ) -> Result<bool, EngineError> {
        for key in keys {
            self.dispatch_key(doc, editor, key.clone())?;
            if doc.last_movement_failed {
                debug!(target: "engine.macro", "replay_aborted_on_failed_motion");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// `@x`: replay register `x`. Recorded registers replay in `mode`;
    /// text registers (and `:`) are always typed as keys.
    pub(crate) fn replay_register(
        &mut self,
        doc: &mut VimState,
        editor: &mut dyn TextEditor,
        register: char,
        mode: ReplayMode,
    ) -> Result<bool, EngineError> {
        let entry = match self.env.registers.get(Some(register)) {
            Ok(found) => found.and_then(|r| r.entry_for(0, 1)),
            Err(err) => {
                let err = VimError::from(err);
                self.env.messages.push(StatusLine {
                    text: err.to_string(),
                    is_error: true,
                });
                return Ok(false);
            }
        };
        let Some(entry) = entry.filter(|e| !e.content.text().is_empty() || e.is_recorded()) else {
            // Keystroke replays are only requested for a recording the
            // caller has just read.
            if mode == ReplayMode::Keystrokes && self.env.config.strict() {
                return Err(EngineError::MissingMacro(register));
            }
            debug!(target: "engine.macro", %register, "empty_macro_register");
            return Ok(false);
        };
        let replay = match entry.content {
            RegisterContent::Recorded(recorded) => match mode {
                ReplayMode::Keystrokes => {
                    debug!(target: "engine.macro", %register, depth = doc.replaying, "replay_register_keys");
                    return self.replay_keys(doc, editor, &recorded.command_list);
                }
                ReplayMode::ContentChange => Replay::Actions(recorded.actions_run),
            },
            content if register == ':' => {
                let mut keys = vec![KeyToken::Char(':')];
                keys.extend(text_keys(&content.text()));
                keys.push(KeyToken::enter());
                Replay::Keys(keys)
            }
            content => Replay::Keys(text_keys(&content.text())),
        };
        debug!(target: "engine.macro", %register, ?mode, depth = doc.replaying, "replay_register");
        self.nested(doc, |vim, doc| match &replay {
            Replay::Keys(keys) => vim.replay_key_list(doc, editor, keys),
            Replay::Actions(actions) => vim.replay_actions(doc, editor, actions),
        })
    }

    /// `.`: replay the last repeatable change, with `count` replacing the
    /// counts it was typed with.
    pub(crate) fn replay_dot(
        &mut self,
        doc: &mut VimState,
        editor: &mut dyn TextEditor,
        count: Option<usize>,
    ) -> Result<bool, EngineError> {
        let Some(previous) = self.env.globals.previous_full_action.clone() else {
            return Ok(true);
        };
        let mut actions = previous.actions_run;
        if count.is_some() {
            actions.retain(|a| {
                !matches!(
                    self.table.get(a.id).map(|s| s.name),
                    Some("count_digit" | "count_zero")
                )
            });
        }
        debug!(target: "engine.dispatch", ?count, actions = actions.len(), "dot_repeat");
        self.nested(doc, |vim, doc| {
            let was = std::mem::replace(&mut vim.replaying_dot, true);
            if let Some(count) = count {
                doc.recorded.count = count;
            }
            let result = vim.replay_actions(doc, editor, &actions);
            vim.replaying_dot = was;
            result
        })
    }

    /// Keys pushed by an action (Insert-mode `<C-r>` of a recording, `:normal`).
    /// The replayed keys join the action that requested them without being
    /// recorded a second time.
    pub(crate) fn replay_keys(
        &mut self,
        doc: &mut VimState,
        editor: &mut dyn TextEditor,
        keys: &[KeyToken],
    ) -> Result<bool, EngineError> {
        let open = (!doc.recorded.actions_run.is_empty())
            .then(|| (doc.recorded.actions_run.len(), doc.recorded.command_list.len()));
        let result = self.nested(doc, |vim, doc| vim.replay_key_list(doc, editor, keys));
        if let Some((actions, keys)) = open {
            doc.recorded.actions_run.truncate(actions);
            doc.recorded.command_list.truncate(keys);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::Config;
    use core_model::{MemoryEditor, MinimalExCommands};
    use core_state::{RegisterEntry, RegisterMode, Registers, WriteKind};
    use pretty_assertions::assert_eq;

    fn engine(config: Config) -> Vim {
        Vim::new(config, Registers::default(), Box::new(MinimalExCommands)).unwrap()
    }

    #[test]
    fn text_registers_type_line_breaks_as_enter() {
        assert_eq!(
            text_keys("x\ny"),
            vec![KeyToken::Char('x'), KeyToken::enter(), KeyToken::Char('y')]
        );
    }

    #[test]
    fn recursive_macro_stops_at_depth_limit() {
        let mut vim = engine(Config::strict_defaults());
        let mut editor = MemoryEditor::from_lines("t", ["abc"]);
        let mut doc = VimState::new("t");
        vim.registers_mut()
            .put(Some('a'), RegisterEntry::text("@a", RegisterMode::CharacterWise), 0, WriteKind::Yank)
            .unwrap();
        let err = vim.send(&mut doc, &mut editor, "@a").unwrap_err();
        assert!(matches!(err, EngineError::ReplayDepth(MAX_REPLAY_DEPTH)));
        assert_eq!(doc.replaying, 0);
    }

    #[test]
    fn runaway_macro_is_cut_off_quietly_when_lenient() {
        let mut vim = engine(Config::default());
        let mut editor = MemoryEditor::from_lines("t", ["abc"]);
        let mut doc = VimState::new("t");
        vim.send(&mut doc, &mut editor, "qa@aq@a").unwrap();
        assert_eq!(doc.replaying, 0);
        assert!(doc.recorded.is_idle());
    }

    #[test]
    fn empty_macro_register_does_nothing_in_either_mode() {
        for config in [Config::default(), Config::strict_defaults()] {
            let mut vim = engine(config);
            let mut editor = MemoryEditor::from_lines("t", ["abc"]);
            let mut doc = VimState::new("t");
            vim.send(&mut doc, &mut editor, "@z").unwrap();
            vim.send(&mut doc, &mut editor, "3@y").unwrap();
            assert_eq!(editor.lines(), vec!["abc"]);
            assert_eq!(doc.replaying, 0);
        }
    }

    #[test]
    fn keystroke_replay_of_a_vanished_recording_is_an_engine_error() {
        let mut vim = engine(Config::strict_defaults());
        let mut editor = MemoryEditor::from_lines("t", ["abc"]);
        let mut doc = VimState::new("t");
        let err = vim.replay_register(&mut doc, &mut editor, 'q', ReplayMode::Keystrokes).unwrap_err();
        assert!(matches!(err, EngineError::MissingMacro('q')));
    }

    #[test]
    fn dot_with_count_replaces_the_original_count() {
        let mut vim = engine(Config::strict_defaults());
        let mut editor = MemoryEditor::from_lines("t", ["abcdefgh"]);
        let mut doc = VimState::new("t");
        vim.send(&mut doc, &mut editor, "2x").unwrap();
        assert_eq!(editor.lines(), vec!["cdefgh"]);
        vim.send(&mut doc, &mut editor, "3.").unwrap();
        assert_eq!(editor.lines(), vec!["fgh"]);
    }
}
