//! The `/`, `?` and `:` prompts.
//!
//! Typing in a prompt only edits [`Prompt::text`]. Submitting a search is a
//! movement (so `d/foo<CR>` composes with the pending operator); submitting
//! a command line hands the text to the [`core_model::ExCommandParser`].

use crate::action::{ActionKind, CommandSpec, Cx, MoveOutcome, MovementSpec};
use crate::catalog::{Spec, Table};
use crate::movements;
use core_events::NotationError;
use core_model::{ExAction, ExContext, ExError};
use core_state::{
    LastVisual, Mode, ModeSet, Prompt, PromptKind, SearchDirection, SearchState, Transformation, VimError,
};
use core_text::{Cursor, Position};
use tracing::debug;

fn open(cx: &mut Cx<'_>, kind: PromptKind, text: String) {
    let prior_mode = cx.vim.mode();
    cx.vim.prompt = Some(Prompt {
        kind,
        text,
        origin_cursors: cx.vim.cursors.clone(),
        prior_mode,
        history_index: None,
    });
    cx.vim.set_mode(match kind {
        PromptKind::Search(_) => Mode::SearchInProgressMode,
        PromptKind::CommandLine => Mode::CommandlineInProgress,
    });
}

fn search_forward(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    open(cx, PromptKind::Search(SearchDirection::Forward), String::new());
    Ok(())
}

fn search_backward(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    open(cx, PromptKind::Search(SearchDirection::Backward), String::new());
    Ok(())
}

fn command_line(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let text = if cx.vim.mode().is_visual() {
        "'<,'>".to_string()
    } else {
        String::new()
    };
    open(cx, PromptKind::CommandLine, text);
    Ok(())
}

/// Close the prompt and put cursors and mode back where they were.
fn close(cx: &mut Cx<'_>) -> Option<Prompt> {
    let prompt = cx.vim.prompt.take()?;
    cx.vim.cursors = prompt.origin_cursors.clone();
    cx.vim.set_mode(prompt.prior_mode);
    Some(prompt)
}

// -------------------------------------------------------------------------------------------------
// Editing
// -------------------------------------------------------------------------------------------------

fn prompt_text<'c>(cx: &'c mut Cx<'_>) -> Option<&'c mut String> {
    cx.vim.prompt.as_mut().map(|p| &mut p.text)
}

fn type_character(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    if let Some(c) = cx.last_key_char()
        && let Some(text) = prompt_text(cx)
    {
        text.push(c);
    }
    Ok(())
}

fn backspace(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let emptied = match prompt_text(cx) {
        Some(text) => text.pop().is_none(),
        None => true,
    };
    if emptied {
        close(cx);
    }
    Ok(())
}

fn insert_register(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let Some(name) = cx.last_key_char() else {
        return Ok(());
    };
    let Some(register) = cx.registers.get(Some(name))? else {
        return Ok(());
    };
    let pasted = register.text();
    if let Some(text) = prompt_text(cx) {
        text.push_str(pasted.trim_end_matches('\n'));
    }
    Ok(())
}

fn browse_history(cx: &mut Cx<'_>, older: bool) {
    let Some(prompt) = cx.vim.prompt.as_mut() else {
        return;
    };
    let history = match prompt.kind {
        PromptKind::Search(_) => &cx.globals.search_history,
        PromptKind::CommandLine => &cx.globals.command_history,
    };
    let len = history.len();
    let current = prompt.history_index.unwrap_or(len);
    let next = if older {
        current.checked_sub(1)
    } else {
        Some(current + 1).filter(|&i| i <= len)
    };
    let Some(next) = next else {
        return;
    };
    if next == len {
        prompt.history_index = None;
        prompt.text.clear();
    } else if let Some(entry) = history.get(next) {
        prompt.history_index = Some(next);
        prompt.text = entry.clone();
    }
}

fn history_older(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    browse_history(cx, true);
    Ok(())
}

fn history_newer(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    browse_history(cx, false);
    Ok(())
}

fn cancel(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    close(cx);
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Submitting
// -------------------------------------------------------------------------------------------------

/// Runs once before the search motion: installs the typed pattern (an
/// empty one repeats the last search) and restores the pre-prompt state.
fn commit_search(cx: &mut Cx<'_>) -> Result<(), VimError> {
    let Some(prompt) = close(cx) else {
        return Ok(());
    };
    let PromptKind::Search(direction) = prompt.kind else {
        return Ok(());
    };
    let origin = prompt.origin_cursors.first().map(|c| c.stop).unwrap_or_default();
    let search = if prompt.text.is_empty() {
        let last = cx.globals.search.as_ref().ok_or(VimError::NoPreviousPattern)?;
        last.redirected(direction, origin)
    } else {
        SearchState::new(direction, &prompt.text, origin, cx.config.search())
    };
    debug!(target: "engine.search", pattern = %search.pattern, ?direction, "search_committed");
    cx.registers.put_engine_register('/', search.pattern.clone());
    cx.globals.push_search_history(&prompt.text);
    cx.globals.search = Some(search);
    Ok(())
}

fn search_submit(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let direction = cx.globals.search.as_ref().map(|s| s.direction).unwrap_or_default();
    movements::search_step(cx, pos, count, direction)
}

fn command_submit(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let Some(prompt) = close(cx) else {
        return Ok(());
    };
    let text = prompt.text.trim().to_string();
    let caret = cx.vim.primary().stop;
    let visual_lines = prompt.prior_mode.is_visual().then(|| {
        let (start, end) = cx.vim.primary().sorted();
        (start.line, end.line)
    });
    if prompt.prior_mode.is_visual() {
        cx.vim.last_visual = Some(LastVisual {
            mode: prompt.prior_mode,
            cursors: prompt.origin_cursors.clone(),
        });
        cx.vim.set_mode(Mode::Normal);
    }
    if !text.is_empty() {
        cx.registers.put_engine_register(':', text.clone());
        cx.globals.push_command_history(&text);
    }
    let context = ExContext {
        cursor_line: caret.line,
        last_line: cx.last_line(),
        visual_lines,
    };
    debug!(target: "engine.dispatch", command = %text, "command_line_submitted");
    let action = cx.ex.parse(&text, &context).map_err(|e| match e {
        ExError::NotAnEditorCommand(c) => VimError::NotAnEditorCommand(c),
        ExError::Failed(msg) => VimError::Other(msg),
    })?;
    match action {
        ExAction::GotoLine(line) => {
            let line = line.min(cx.last_line());
            let target = Position::new(line, 0).first_non_blank(cx.editor);
            cx.vim.cursors = vec![Cursor::at(target)];
        }
        ExAction::RunKeys(keys) => cx.push(Transformation::RunKeys { keys }),
        ExAction::Host(command) => {
            let meta = cx.meta();
            cx.push(Transformation::HostCommand { command, meta });
        }
        ExAction::Message(text) => cx.info(text),
        ExAction::Nothing => {}
    }
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Registration
// -------------------------------------------------------------------------------------------------

/// Prompt actions never exclude a pending operator: `d/foo<CR>` and `c?x<CR>`
/// run through the prompt with the operator still waiting.
pub fn register(t: &mut Table) -> Result<(), NotationError> {
    use CommandSpec as C;
    let start = ModeSet::NORMAL_AND_VISUAL;
    let prompts = ModeSet::PROMPTS;
    let cmd = |spec: C| ActionKind::Command(spec.once());
    t.push(Spec::new("search_forward", start, &["/"], cmd(C::new(search_forward).incomplete()))?);
    t.push(Spec::new("search_backward", start, &["?"], cmd(C::new(search_backward).incomplete()))?);
    t.push(Spec::new("command_line", start, &[":"], cmd(C::new(command_line).incomplete()))?);
    t.push(Spec::new(
        "search_submit",
        ModeSet::SEARCH,
        &["<CR>", "<C-m>", "<C-j>"],
        ActionKind::Movement(MovementSpec::exclusive(search_submit).with_prepare(commit_search)),
    )?);
    t.push(Spec::new(
        "command_line_submit",
        ModeSet::COMMAND_LINE,
        &["<CR>", "<C-m>", "<C-j>"],
        cmd(C::new(command_submit)),
    )?);
    t.push(Spec::new("prompt_cancel", prompts, &["<Esc>", "<C-c>", "<C-[>"], cmd(C::new(cancel)))?);
    t.push(Spec::new("prompt_backspace", prompts, &["<BS>", "<C-h>"], cmd(C::new(backspace).incomplete()))?);
    t.push(Spec::new(
        "prompt_insert_register",
        prompts,
        &["<C-r><register>"],
        cmd(C::new(insert_register).incomplete()),
    )?);
    t.push(Spec::new("prompt_history_older", prompts, &["<Up>"], cmd(C::new(history_older).incomplete()))?);
    t.push(Spec::new("prompt_history_newer", prompts, &["<Down>"], cmd(C::new(history_newer).incomplete()))?);
    t.push(Spec::new("prompt_character", prompts, &["<character>"], cmd(C::new(type_character).incomplete()))?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::with_cx;
    use pretty_assertions::assert_eq;

    #[test]
    fn history_browsing_walks_back_and_returns_to_empty() {
        with_cx(&["x"], |cx| {
            cx.globals.push_search_history("one");
            cx.globals.push_search_history("two");
            search_forward(cx, 0).unwrap();
            history_older(cx, 0).unwrap();
            assert_eq!(cx.vim.prompt.as_ref().unwrap().text, "two");
            history_older(cx, 0).unwrap();
            history_older(cx, 0).unwrap();
            assert_eq!(cx.vim.prompt.as_ref().unwrap().text, "one");
            history_newer(cx, 0).unwrap();
            history_newer(cx, 0).unwrap();
            assert_eq!(cx.vim.prompt.as_ref().unwrap().text, "");
            assert_eq!(cx.vim.prompt.as_ref().unwrap().history_index, None);
        });
    }

    #[test]
    fn backspace_on_empty_prompt_cancels() {
        with_cx(&["x"], |cx| {
            command_line(cx, 0).unwrap();
            assert_eq!(cx.vim.mode(), Mode::CommandlineInProgress);
            backspace(cx, 0).unwrap();
            assert_eq!(cx.vim.mode(), Mode::Normal);
            assert!(cx.vim.prompt.is_none());
        });
    }

    #[test]
    fn empty_search_without_history_reports_e35() {
        with_cx(&["x"], |cx| {
            search_forward(cx, 0).unwrap();
            assert_eq!(commit_search(cx), Err(VimError::NoPreviousPattern));
        });
    }
}
