//! Commits the transformations one action produced.
//!
//! Text edits from every cursor go to the editor as one batch. Cursors are
//! handed to the editor first so it can carry them through the edit; each
//! cursor's queued diffs are applied to the position the editor reports
//! back. Replays (`@x`, `.`, command-line keys) are returned to the engine,
//! which runs them once the current action has finished.

use crate::EngineError;
use core_config::Config;
use core_model::{Edit, HostCommand, StatusLine, TextEditor};
use core_state::{Mode, TransformMeta, Transformation, VimError, VimState};
use core_text::{Cursor, Position, PositionDiff};
use tracing::{debug, trace, warn};

pub(crate) struct Transformer<'a> {
    pub editor: &'a mut dyn TextEditor,
    pub config: &'a Config,
    pub messages: &'a mut Vec<StatusLine>,
}

/// Where each cursor index of the action ended up in `VimState::cursors`
/// (`None` for a retired cursor).
pub(crate) type Owners = [Option<usize>];

struct TextEdit {
    edit: Edit,
    start: Position,
    end: Position,
}

impl Transformer<'_> {
    pub fn commit(&mut self, vim: &mut VimState, owners: &Owners) -> Result<Vec<Transformation>, EngineError> {
        let pending = std::mem::take(&mut vim.recorded.transformations);
        let mut edits = Vec::new();
        let mut diffs: Vec<TransformMeta> = Vec::new();
        let mut typed: Vec<(usize, String)> = Vec::new();
        let mut host = Vec::new();
        let mut deferred = Vec::new();

        for t in pending {
            match t {
                Transformation::InsertTextViaHost { text, cursor_index } => typed.push((cursor_index, text)),
                Transformation::HostCommand { command, meta } => host.push((command, meta)),
                Transformation::MoveCursor { meta } => diffs.push(meta),
                Transformation::RunMacro { .. }
                | Transformation::ReplayDotRepeat { .. }
                | Transformation::RunKeys { .. } => deferred.push(t),
                text => {
                    let Some(meta) = text.meta().copied() else {
                        continue;
                    };
                    let meta = self.checked_meta(meta)?;
                    if let Some(edit) = text.to_edit() {
                        let (start, end) = edit.span();
                        edits.push(TextEdit { edit, start, end });
                    }
                    diffs.push(meta);
                }
            }
        }

        self.editor.set_selections(vim.cursors.clone());
        self.type_via_host(vim, typed, &mut edits, &mut diffs)?;
        self.apply_text(edits)?;
        let mut cursors = self.editor.selections();
        if cursors.len() != vim.cursors.len() {
            cursors = vim.cursors.clone();
        }
        if self.run_host(&host)? {
            cursors = self.editor.selections();
        }

        let start_of_line = self.config.editor().startofline;
        let metas = diffs.into_iter().chain(host.iter().map(|(_, m)| *m));
        for meta in metas {
            let Some(diff) = meta.diff else {
                continue;
            };
            let index = meta.cursor_index.unwrap_or(0);
            let Some(slot) = owners.get(index).copied().flatten() else {
                continue;
            };
            if let Some(cursor) = cursors.get_mut(slot) {
                let moved = cursor.stop.apply_diff(&*self.editor, diff, start_of_line);
                trace!(target: "engine.transformer", index, ?diff, to = %moved, "diff_applied");
                *cursor = Cursor::at(moved);
            }
        }

        vim.cursors = cursors;
        self.settle(vim);
        Ok(deferred)
    }

    fn checked_meta(&self, meta: TransformMeta) -> Result<TransformMeta, EngineError> {
        if meta.cursor_index.is_some() {
            return Ok(meta);
        }
        if self.config.strict() {
            return Err(EngineError::MissingCursorIndex);
        }
        warn!(target: "engine.transformer", "transformation_without_cursor_index");
        Ok(TransformMeta {
            cursor_index: Some(0),
            ..meta
        })
    }

    /// Identical text for every cursor is typed once by the host, which
    /// fans it out itself; anything else becomes ordinary inserts.
    fn type_via_host(
        &mut self,
        vim: &VimState,
        typed: Vec<(usize, String)>,
        edits: &mut Vec<TextEdit>,
        diffs: &mut Vec<TransformMeta>,
    ) -> Result<(), EngineError> {
        let Some((_, first)) = typed.first() else {
            return Ok(());
        };
        let uniform = typed.len() == vim.cursors.len() && typed.iter().all(|(_, t)| t == first);
        if uniform {
            debug!(target: "engine.transformer", text = %first, cursors = typed.len(), "host_typing");
            self.editor.type_text(first)?;
            return Ok(());
        }
        for (index, text) in typed {
            let Some(cursor) = vim.cursors.get(index) else {
                continue;
            };
            let at = cursor.stop;
            diffs.push(TransformMeta::for_cursor(index).with_diff(PositionDiff::over_text(&text)));
            edits.push(TextEdit {
                edit: Edit::Insert { at, text },
                start: at,
                end: at,
            });
        }
        Ok(())
    }

    fn apply_text(&mut self, mut edits: Vec<TextEdit>) -> Result<(), EngineError> {
        if edits.is_empty() {
            return Ok(());
        }
        edits.sort_by_key(|e| (e.start, e.end));
        let overlap = edits.windows(2).find(|w| w[0].end > w[1].start).map(|w| w[1].start);
        let Some(at) = overlap else {
            debug!(target: "engine.transformer", edits = edits.len(), "batch_applied");
            self.editor.apply_edits(edits.into_iter().map(|e| e.edit).collect())?;
            return Ok(());
        };
        if self.config.strict() {
            return Err(EngineError::Overlap { at });
        }
        warn!(target: "engine.transformer", %at, edits = edits.len(), "overlapping_edits_applied_serially");
        for e in edits.into_iter().rev() {
            if let Err(err) = self.editor.apply_edits(vec![e.edit]) {
                warn!(target: "engine.transformer", error = %err, "serial_edit_skipped");
            }
        }
        Ok(())
    }

    /// Returns whether any command ran (the editor then owns the cursors).
    fn run_host(&mut self, host: &[(HostCommand, TransformMeta)]) -> Result<bool, EngineError> {
        let mut ran = false;
        for (command, _) in host {
            let handled = self.editor.run_host_command(command)?;
            debug!(target: "engine.transformer", ?command, handled, "host_command");
            if handled {
                ran = true;
                continue;
            }
            let text = match command {
                HostCommand::OpenFile(name) => VimError::CantFindFileInPath(name.clone()).to_string(),
                HostCommand::Undo => "Already at oldest change".to_string(),
                HostCommand::Redo => "Already at newest change".to_string(),
                _ => continue,
            };
            let is_error = matches!(command, HostCommand::OpenFile(_));
            self.messages.push(StatusLine { text, is_error });
        }
        Ok(ran)
    }

    /// Clamp every cursor for the active mode and hand the result to the editor.
    pub fn settle(&mut self, vim: &mut VimState) {
        let editor = &*self.editor;
        let mode = vim.mode();
        for cursor in &mut vim.cursors {
            *cursor = match mode {
                Mode::Normal => Cursor::at(cursor.stop.clamp_normal(editor)),
                m if m.is_visual() => Cursor::new(cursor.start.clamp_to(editor), cursor.stop.clamp_to(editor)),
                m if m.is_prompt() => *cursor,
                _ => Cursor::at(cursor.stop.clamp_to(editor)),
            };
        }
        if !mode.is_visual() {
            vim.normalize_cursors();
        }
        self.editor.set_selections(vim.cursors.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::MemoryEditor;
    use core_text::TextSource;
    use pretty_assertions::assert_eq;

    fn p(line: usize, character: usize) -> Position {
        Position::new(line, character)
    }

    fn insert(at: Position, text: &str, index: usize, diff: Option<PositionDiff>) -> Transformation {
        let meta = TransformMeta::for_cursor(index);
        Transformation::InsertText {
            position: at,
            text: text.to_string(),
            meta: match diff {
                Some(d) => meta.with_diff(d),
                None => meta,
            },
        }
    }

    fn commit(
        editor: &mut MemoryEditor,
        config: &Config,
        vim: &mut VimState,
    ) -> Result<Vec<Transformation>, EngineError> {
        let owners: Vec<_> = (0..vim.cursors.len()).map(Some).collect();
        let mut messages = Vec::new();
        Transformer {
            editor,
            config,
            messages: &mut messages,
        }
        .commit(vim, &owners)
    }

    #[test]
    fn edits_from_two_cursors_commit_independently() {
        let mut editor = MemoryEditor::from_lines("t", ["ab", "cd"]);
        let mut vim = VimState::new("t");
        vim.set_mode(Mode::Insert);
        vim.cursors = vec![Cursor::at(p(0, 1)), Cursor::at(p(1, 1))];
        vim.recorded.transformations = vec![
            insert(p(0, 1), "X", 0, Some(PositionDiff::characters(1))),
            insert(p(1, 1), "Y", 1, Some(PositionDiff::characters(1))),
        ];
        commit(&mut editor, &Config::strict_defaults(), &mut vim).unwrap();
        assert_eq!(editor.lines(), vec!["aXb", "cYd"]);
        assert_eq!(vim.cursors, vec![Cursor::at(p(0, 2)), Cursor::at(p(1, 2))]);
        assert!(vim.recorded.transformations.is_empty());
    }

    #[test]
    fn overlap_is_fatal_when_strict_and_serial_otherwise() {
        let overlapping = || {
            vec![
                Transformation::DeleteRange {
                    start: p(0, 0),
                    end: p(0, 3),
                    meta: TransformMeta::for_cursor(0),
                },
                Transformation::DeleteRange {
                    start: p(0, 1),
                    end: p(0, 2),
                    meta: TransformMeta::for_cursor(0),
                },
            ]
        };
        let mut editor = MemoryEditor::from_lines("t", ["abcdef"]);
        let mut vim = VimState::new("t");
        vim.recorded.transformations = overlapping();
        let err = commit(&mut editor, &Config::strict_defaults(), &mut vim).unwrap_err();
        assert!(matches!(err, EngineError::Overlap { at } if at == p(0, 1)));
        assert_eq!(editor.lines(), vec!["abcdef"]);

        vim.recorded.transformations = overlapping();
        commit(&mut editor, &Config::default(), &mut vim).unwrap();
        assert_eq!(editor.line_text(0), "ef");
    }

    #[test]
    fn missing_cursor_index_is_fatal_when_strict() {
        let mut editor = MemoryEditor::from_lines("t", ["abc"]);
        let mut vim = VimState::new("t");
        vim.recorded.transformations = vec![Transformation::DeleteRange {
            start: p(0, 0),
            end: p(0, 1),
            meta: TransformMeta::default(),
        }];
        assert!(matches!(
            commit(&mut editor, &Config::strict_defaults(), &mut vim),
            Err(EngineError::MissingCursorIndex)
        ));
    }

    #[test]
    fn replays_are_handed_back() {
        let mut editor = MemoryEditor::from_lines("t", ["abc"]);
        let mut vim = VimState::new("t");
        vim.recorded.transformations = vec![Transformation::ReplayDotRepeat { count: Some(2) }];
        let deferred = commit(&mut editor, &Config::strict_defaults(), &mut vim).unwrap();
        assert_eq!(deferred, vec![Transformation::ReplayDotRepeat { count: Some(2) }]);
    }

    #[test]
    fn identical_host_typing_runs_once() {
        let mut editor = MemoryEditor::from_lines("t", ["ab", "cd"]);
        let mut vim = VimState::new("t");
        vim.set_mode(Mode::Insert);
        vim.cursors = vec![Cursor::at(p(0, 0)), Cursor::at(p(1, 0))];
        vim.recorded.transformations = vec![
            Transformation::InsertTextViaHost {
                text: "(".into(),
                cursor_index: 0,
            },
            Transformation::InsertTextViaHost {
                text: "(".into(),
                cursor_index: 1,
            },
        ];
        commit(&mut editor, &Config::strict_defaults(), &mut vim).unwrap();
        assert_eq!(editor.lines(), vec!["(ab", "(cd"]);
        assert_eq!(vim.cursors, vec![Cursor::at(p(0, 1)), Cursor::at(p(1, 1))]);
    }
}
