//! Key dispatch.
//!
//! Keys accumulate in [`RecordedState::action_keys`] until the action table
//! resolves them. A matched action runs once per cursor, its
//! transformations are committed in one batch, and the logical action (the
//! keys from the first count or register prefix up to the command that
//! completes it) is then either finished or left open for more keys.
//!
//! A logical action stays open while an operator waits for its motion and
//! for as long as Insert, Replace, a prompt or a visual mode is active, so
//! `vjd`, `3ifoo<Esc>` and `d/x<CR>` each end up as one entry for `.`.

use crate::EngineError;
use crate::action::{ActionKind, ColumnPolicy, CommandSpec, Cx, MovementSpec, OpRange, OperatorKind, OperatorSpec};
use crate::catalog::{self, Table};
use crate::span_resolver;
use crate::transformer::Transformer;
use crate::visual;
use core_config::Config;
use core_events::{KeyToken, format_keys, parse_keys};
use core_keymap::{ContextFlags, Resolution};
use core_model::{ExCommandParser, MinimalExCommands, StatusLine, TextEditor};
use core_state::{
    ActionId, DESIRED_EOL, GlobalState, LastVisual, Mode, RecordedAction, Registers, Transformation, VimError,
    VimState,
};
use core_text::{Cursor, MatchPairs, Position, TextSource, WordChars, width};
use tracing::{debug, error, info, trace};

/// Everything actions borrow besides the document.
pub(crate) struct Env {
    pub config: Config,
    pub words: WordChars,
    pub pairs: MatchPairs,
    pub ex: Box<dyn ExCommandParser>,
    pub registers: Registers,
    pub globals: GlobalState,
    pub messages: Vec<StatusLine>,
}

/// The engine shared by every document: action table, registers, search
/// and the last repeatable change.
pub struct Vim {
    pub(crate) table: Table,
    pub(crate) env: Env,
    /// Set while `.` replays, so the replay does not overwrite what it repeats.
    pub(crate) replaying_dot: bool,
}

/// What one action left behind for the commit.
struct Step {
    complete: bool,
    owners: Vec<Option<usize>>,
    column: ColumnPolicy,
}

impl Vim {
    pub fn new(config: Config, mut registers: Registers, ex: Box<dyn ExCommandParser>) -> Result<Self, EngineError> {
        let table = catalog::build()?;
        registers.set_use_system_clipboard(config.file.clipboard.use_system_clipboard);
        let words = WordChars::parse(&config.editor().iskeyword);
        let pairs = MatchPairs::parse(&config.editor().matchpairs);
        info!(target: "engine.dispatch", actions = table.len(), strict = config.strict(), "engine_ready");
        Ok(Self {
            table,
            env: Env {
                config,
                words,
                pairs,
                ex,
                registers,
                globals: GlobalState::new(),
                messages: Vec::new(),
            },
            replaying_dot: false,
        })
    }

    /// Default configuration, in-memory clipboard and the built-in `:` commands.
    pub fn with_defaults() -> Result<Self, EngineError> {
        Self::new(Config::default(), Registers::default(), Box::new(MinimalExCommands))
    }

    pub fn config(&self) -> &Config {
        &self.env.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.env.words = WordChars::parse(&config.editor().iskeyword);
        self.env.pairs = MatchPairs::parse(&config.editor().matchpairs);
        self.env
            .registers
            .set_use_system_clipboard(config.file.clipboard.use_system_clipboard);
        self.env.config = config;
    }

    pub fn registers(&self) -> &Registers {
        &self.env.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.env.registers
    }

    pub fn globals(&self) -> &GlobalState {
        &self.env.globals
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    // ---------------------------------------------------------------------------------------------
    // Entry points
    // ---------------------------------------------------------------------------------------------

    /// Feed one key typed by the user.
    ///
    /// User-facing failures (`E353: Nothing in register a`) go to the
    /// status line; an `Err` means the engine itself could not keep its
    /// invariants (overlapping edits in strict mode, runaway replay).
    pub fn handle_key(
        &mut self,
        doc: &mut VimState,
        editor: &mut dyn TextEditor,
        key: KeyToken,
    ) -> Result<(), EngineError> {
        self.sync_file_registers(&*editor);
        if doc.mode() == Mode::Normal && doc.recorded.is_idle() && doc.replaying == 0 {
            let selections = editor.selections();
            if !selections.is_empty() {
                doc.cursors = selections.into_iter().map(|s| Cursor::at(s.stop)).collect();
                doc.normalize_cursors();
            }
        }
        let result = self.dispatch_key(doc, editor, key);
        if result.is_err() {
            doc.reset_recorded();
        }
        self.flush_messages(editor);
        result
    }

    pub fn handle_keys(
        &mut self,
        doc: &mut VimState,
        editor: &mut dyn TextEditor,
        keys: impl IntoIterator<Item = KeyToken>,
    ) -> Result<(), EngineError> {
        for key in keys {
            self.handle_key(doc, editor, key)?;
        }
        Ok(())
    }

    /// Feed keys written in `<C-x>` notation.
    pub fn send(&mut self, doc: &mut VimState, editor: &mut dyn TextEditor, notation: &str) -> Result<(), EngineError> {
        let keys = parse_keys(notation)?;
        self.handle_keys(doc, editor, keys)
    }

    fn sync_file_registers(&mut self, editor: &dyn TextEditor) {
        self.env.registers.put_engine_register('%', editor.document_name());
        match editor.alternate_name() {
            Some(name) => self.env.registers.put_engine_register('#', name),
            None => self.env.registers.clear_engine_register('#'),
        }
    }

    fn flush_messages(&mut self, editor: &mut dyn TextEditor) {
        for line in self.env.messages.drain(..) {
            editor.show_status(&line.text, line.is_error);
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------------------------------------

    fn context(&self, doc: &VimState) -> ContextFlags {
        let recorded = &doc.recorded;
        let mut ctx = ContextFlags::empty();
        ctx.set(ContextFlags::COUNT, recorded.count > 0);
        ctx.set(ContextFlags::OPERATOR, recorded.has_operator());
        ctx.set(
            ContextFlags::CASE_OPERATOR,
            self.pending_operator(doc).is_some_and(|o| o.kind.is_case_family()),
        );
        ctx.set(
            ContextFlags::FIRST_KEY,
            recorded.action_keys.is_empty() && recorded.actions_run.is_empty(),
        );
        ctx.set(ContextFlags::RECORDING, doc.is_recording());
        ctx
    }

    fn pending_operator(&self, doc: &VimState) -> Option<OperatorSpec> {
        let id = doc.recorded.operator?;
        match self.table.get(id)?.payload {
            ActionKind::Operator(spec) => Some(spec),
            _ => None,
        }
    }

    pub(crate) fn dispatch_key(
        &mut self,
        doc: &mut VimState,
        editor: &mut dyn TextEditor,
        key: KeyToken,
    ) -> Result<(), EngineError> {
        let ctx = self.context(doc);
        doc.recorded.action_keys.push(key.clone());
        doc.recorded.command_list.push(key);
        match self.table.resolve(doc.mode(), &doc.recorded.action_keys, ctx) {
            Resolution::NeedMore => Ok(()),
            Resolution::NoMatch => {
                debug!(
                    target: "engine.dispatch",
                    keys = %format_keys(&doc.recorded.action_keys),
                    mode = ?doc.mode(),
                    "no_action"
                );
                self.abandon_keys(doc);
                Ok(())
            }
            Resolution::Matched(id) => {
                let keys = std::mem::take(&mut doc.recorded.action_keys);
                self.run_action(doc, editor, id, keys)
            }
        }
    }

    /// Unmatched keys: Normal forgets the pending count/operator; other
    /// modes only drop the keys so an insert or selection survives.
    fn abandon_keys(&self, doc: &mut VimState) {
        if doc.mode() == Mode::Normal {
            doc.reset_recorded();
            return;
        }
        let dropped = doc.recorded.action_keys.len();
        let kept = doc.recorded.command_list.len().saturating_sub(dropped);
        doc.recorded.command_list.truncate(kept);
        doc.recorded.action_keys.clear();
    }

    pub(crate) fn run_action(
        &mut self,
        doc: &mut VimState,
        editor: &mut dyn TextEditor,
        id: ActionId,
        keys: Vec<KeyToken>,
    ) -> Result<(), EngineError> {
        let Some(spec) = self.table.get(id) else {
            return Ok(());
        };
        let (name, kind) = (spec.name, spec.payload);
        if doc.recorded.actions_run.is_empty() {
            doc.last_movement_failed = false;
        }
        trace!(target: "engine.dispatch", action = name, keys = %format_keys(&keys), "run_action");

        let action = RecordedAction { id, keys };
        if doc.replaying == 0
            && !kind.not_recorded()
            && let Some((_, capture)) = doc.macro_recording.as_mut()
        {
            capture.command_list.extend(action.keys.iter().cloned());
            capture.actions_run.push(action.clone());
        }
        doc.recorded.actions_run.push(action.clone());

        let pre_mode = doc.mode();
        let selection = doc.cursors.clone();
        let outcome = match kind {
            ActionKind::Command(c) => self.run_command(doc, &*editor, c, &action.keys),
            ActionKind::Operator(o) => self.run_operator(doc, &*editor, id, o, &action.keys),
            ActionKind::Movement(m) => self.run_movement(doc, &*editor, m, &action.keys),
        };
        let step = match outcome {
            Ok(step) => step,
            Err(err) => {
                debug!(target: "engine.dispatch", action = name, error = %err, "action_failed");
                self.env.messages.push(StatusLine {
                    text: err.to_string(),
                    is_error: true,
                });
                doc.recorded.transformations.clear();
                doc.last_movement_failed = true;
                if !doc.mode().is_insert_like() {
                    doc.reset_recorded();
                }
                return Ok(());
            }
        };

        let deferred = {
            let mut transformer = Transformer {
                editor: &mut *editor,
                config: &self.env.config,
                messages: &mut self.env.messages,
            };
            match transformer.commit(doc, &step.owners) {
                Ok(deferred) => deferred,
                Err(err) => {
                    error!(target: "engine.transformer", action = name, error = %err, "commit_failed");
                    return Err(err);
                }
            }
        };
        self.update_column(doc, &*editor, step.column);

        let mode = doc.mode();
        if pre_mode.is_visual() && !mode.is_visual() && !mode.is_prompt() {
            doc.last_visual = Some(LastVisual {
                mode: pre_mode,
                cursors: selection,
            });
        }

        if step.complete {
            if mode == Mode::Normal {
                self.finish(doc, editor);
            } else {
                let recorded = &mut doc.recorded;
                recorded.count = 0;
                recorded.operator_count = 0;
                recorded.operator = None;
                recorded.register_name = None;
            }
        }
        self.run_deferred(doc, editor, deferred)
    }

    /// Close the logical action: remember it for `.` when it changed
    /// something and end the host's undo step.
    fn finish(&mut self, doc: &mut VimState, editor: &mut dyn TextEditor) {
        let repeatable = doc
            .recorded
            .actions_run
            .iter()
            .any(|a| self.table.get(a.id).is_some_and(|s| s.payload.repeatable()));
        if repeatable && !self.replaying_dot {
            debug!(target: "engine.dispatch", keys = %doc.recorded.keys_display(), "repeatable_action_saved");
            self.env.globals.previous_full_action = Some(doc.recorded.captured());
        }
        editor.undo_stop();
        doc.reset_recorded();
    }

    fn run_deferred(
        &mut self,
        doc: &mut VimState,
        editor: &mut dyn TextEditor,
        deferred: Vec<Transformation>,
    ) -> Result<(), EngineError> {
        for t in deferred {
            let completed = match t {
                Transformation::RunMacro { register, replay } => self.replay_register(doc, editor, register, replay)?,
                Transformation::ReplayDotRepeat { count } => self.replay_dot(doc, editor, count)?,
                Transformation::RunKeys { keys } => self.replay_keys(doc, editor, &keys)?,
                _ => true,
            };
            if !completed {
                doc.last_movement_failed = true;
                break;
            }
        }
        Ok(())
    }

    fn update_column(&self, doc: &mut VimState, editor: &dyn TextEditor, policy: ColumnPolicy) {
        match policy {
            ColumnPolicy::Keep => {}
            ColumnPolicy::EndOfLine => doc.desired_column = DESIRED_EOL,
            ColumnPolicy::Update => {
                let caret = doc.primary().stop;
                let line = editor.line_text(caret.line);
                doc.desired_column = width::visual_col(&line, caret.character, self.env.config.editor().tabstop);
            }
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Action kinds
    // ---------------------------------------------------------------------------------------------

    fn run_command(
        &mut self,
        doc: &mut VimState,
        editor: &dyn TextEditor,
        spec: CommandSpec,
        keys: &[KeyToken],
    ) -> Result<Step, VimError> {
        let count = doc.recorded.count;
        let operator = self.pending_operator(doc).map(|o| o.kind);
        let owners = self.each_cursor(doc, editor, keys, operator, spec.runs_once, |cx| (spec.run)(cx, count))?;
        Ok(Step {
            complete: spec.complete,
            owners,
            column: if spec.complete { ColumnPolicy::Update } else { ColumnPolicy::Keep },
        })
    }

    fn run_operator(
        &mut self,
        doc: &mut VimState,
        editor: &dyn TextEditor,
        id: ActionId,
        spec: OperatorSpec,
        keys: &[KeyToken],
    ) -> Result<Step, VimError> {
        let mode = doc.mode();
        if !mode.is_visual() {
            let recorded = &mut doc.recorded;
            recorded.operator = Some(id);
            recorded.operator_count = recorded.count;
            recorded.count = 0;
            trace!(target: "engine.dispatch", kind = ?spec.kind, count = recorded.operator_count, "operator_pending");
            return Ok(Step {
                complete: false,
                owners: (0..doc.cursors.len()).map(Some).collect(),
                column: ColumnPolicy::Keep,
            });
        }
        let whole_rows = mode == Mode::VisualBlock && matches!(spec.kind, OperatorKind::Delete | OperatorKind::Change);
        let owners = self.each_cursor(doc, editor, keys, Some(spec.kind), false, |cx| {
            let mut range = visual::selection_range(cx, mode);
            if spec.force_linewise {
                range = if whole_rows {
                    OpRange::block(range.start, Position::new(range.end.line, usize::MAX))
                } else {
                    OpRange::lines(range.start.line, range.end.line)
                };
            }
            (spec.run)(cx, range)
        })?;
        if doc.mode().is_visual() {
            doc.set_mode(Mode::Normal);
        }
        Ok(Step {
            complete: true,
            owners,
            column: ColumnPolicy::Update,
        })
    }

    fn run_movement(
        &mut self,
        doc: &mut VimState,
        editor: &dyn TextEditor,
        spec: MovementSpec,
        keys: &[KeyToken],
    ) -> Result<Step, VimError> {
        if let Some(prepare) = spec.prepare {
            self.each_cursor(doc, editor, keys, None, true, |cx| prepare(cx))?;
        }
        let recorded = &doc.recorded;
        let count = if spec.raw_count && recorded.count == 0 && recorded.operator_count == 0 {
            0
        } else {
            recorded.motion_count()
        };
        let operator = self.pending_operator(doc);
        let mode = doc.mode();
        let owners = self.each_cursor(doc, editor, keys, operator.map(|o| o.kind), false, |cx| {
            let origin = cx.caret();
            let outcome = (spec.run)(cx, origin, count);
            let Some(resolved) = span_resolver::settle(&spec, outcome, origin) else {
                cx.vim.last_movement_failed = true;
                return Ok(());
            };
            if let Some(op) = operator {
                let range = span_resolver::operator_range(cx.editor, &resolved, spec.text_object);
                if span_resolver::is_empty(&range) && op.kind != OperatorKind::Change {
                    return Ok(());
                }
                return (op.run)(cx, range);
            }
            if mode.is_visual() {
                let (selection, linewise) = span_resolver::visual_selection(cx.editor, cx.cursor, &resolved);
                cx.cursor = selection;
                if linewise && mode == Mode::Visual {
                    cx.vim.set_mode(Mode::VisualLine);
                }
                return Ok(());
            }
            cx.set_caret(resolved.stop);
            Ok(())
        })?;
        Ok(Step {
            complete: true,
            owners,
            column: if operator.is_some() { ColumnPolicy::Update } else { spec.column },
        })
    }

    /// Run `f` once per cursor (or for the primary only), each time from the
    /// mode the action started in, and rebuild the cursor list from what
    /// each invocation left in its context. Returns, per original cursor
    /// index, its slot in the new list.
    fn each_cursor<F>(
        &mut self,
        doc: &mut VimState,
        editor: &dyn TextEditor,
        keys: &[KeyToken],
        operator: Option<OperatorKind>,
        once: bool,
        mut f: F,
    ) -> Result<Vec<Option<usize>>, VimError>
    where
        F: FnMut(&mut Cx<'_>) -> Result<(), VimError>,
    {
        let snapshot = doc.cursors.clone();
        let start_mode = doc.mode();
        let limit = if once { snapshot.len().min(1) } else { snapshot.len() };
        let mut rebuilt = Vec::with_capacity(snapshot.len());
        let mut owners = vec![None; snapshot.len()];
        for (index, cursor) in snapshot.iter().take(limit).enumerate() {
            let mode_before = doc.mode();
            doc.rewind_mode(start_mode);
            let env = &mut self.env;
            let mut cx = Cx {
                editor,
                vim: &mut *doc,
                registers: &mut env.registers,
                globals: &mut env.globals,
                config: &env.config,
                ex: env.ex.as_ref(),
                words: &env.words,
                pairs: &env.pairs,
                keys,
                cursor_index: index,
                cursor: *cursor,
                operator,
                messages: &mut env.messages,
                spawned: Vec::new(),
                retire: false,
            };
            let result = f(&mut cx);
            let (moved, spawned, retire) = (cx.cursor, cx.spawned, cx.retire);
            if let Err(err) = result {
                if index > 0 {
                    doc.rewind_mode(mode_before);
                }
                return Err(err);
            }
            if !retire {
                owners[index] = Some(rebuilt.len());
                rebuilt.push(moved);
            }
            rebuilt.extend(spawned);
        }
        if doc.cursors != snapshot {
            trace!(target: "engine.dispatch", cursors = doc.cursors.len(), "cursors_reassigned");
            return Ok((0..snapshot.len().max(doc.cursors.len())).map(Some).collect());
        }
        for (index, cursor) in snapshot.iter().enumerate().skip(limit) {
            owners[index] = Some(rebuilt.len());
            rebuilt.push(*cursor);
        }
        if rebuilt.is_empty() {
            rebuilt.push(snapshot.first().copied().unwrap_or_default());
        }
        doc.cursors = rebuilt;
        Ok(owners)
    }
}
