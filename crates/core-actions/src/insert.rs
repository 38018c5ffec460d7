//! Insert, VisualBlockInsert and Replace mode keys.

use crate::action::{CommandSpec, Cx};
use crate::catalog::{Table, command};
use core_events::NotationError;
use core_state::{Mode, ModeSet, RegisterContent, ReplayMode, Transformation, VimError};
use core_text::{Position, PositionDiff, TextSource, first_non_blank_col, motion, width};
use tracing::trace;

const TYPING: ModeSet = ModeSet::INSERTING;

fn record_typed(cx: &mut Cx<'_>, text: &str) {
    if cx.cursor_index == 0 {
        cx.vim.insert_text.push_str(text);
    }
}

/// Insert `text` at the caret and leave the caret after it.
fn type_text(cx: &mut Cx<'_>, text: &str) {
    let caret = cx.caret();
    cx.insert(caret, text, Some(PositionDiff::over_text(text)));
}

fn type_character(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let Some(c) = cx.last_key_char() else {
        return Ok(());
    };
    let text = c.to_string();
    record_typed(cx, &text);
    if cx.config.file.insert.defer_to_host {
        let cursor_index = cx.cursor_index;
        cx.push(Transformation::InsertTextViaHost { text, cursor_index });
    } else {
        type_text(cx, &text);
    }
    Ok(())
}

fn newline(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let line = cx.line(cx.caret().line);
    let indent: String = line.chars().take(first_non_blank_col(&line)).collect();
    record_typed(cx, "\n");
    type_text(cx, &format!("\n{indent}"));
    Ok(())
}

fn tab(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let editor = cx.config.editor();
    let text = if editor.expandtab {
        let line = cx.line(cx.caret().line);
        let col = width::visual_col(&line, cx.caret().character, editor.tabstop);
        let ts = editor.tabstop.max(1);
        " ".repeat(ts - col % ts)
    } else {
        "\t".to_string()
    };
    record_typed(cx, "\t");
    type_text(cx, &text);
    Ok(())
}

fn forget_typed(cx: &mut Cx<'_>, chars: usize) {
    if cx.cursor_index == 0 {
        for _ in 0..chars {
            cx.vim.insert_text.pop();
        }
    }
}

fn backspace(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    if caret.character > 0 {
        cx.delete(caret.with_character(caret.character - 1), caret, None);
    } else if caret.line > 0 {
        let prev = caret.line - 1;
        cx.delete(Position::new(prev, cx.line_len(prev)), caret, None);
    } else {
        return Ok(());
    }
    forget_typed(cx, 1);
    Ok(())
}

fn delete_forward(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    let len = cx.line_len(caret.line);
    if caret.character < len {
        cx.delete(caret, caret.with_character(caret.character + 1), None);
    } else if caret.line < cx.last_line() {
        cx.delete(caret, Position::new(caret.line + 1, 0), None);
    }
    Ok(())
}

fn delete_word_before(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    if caret.character == 0 {
        return backspace(cx, count);
    }
    let start = motion::prev_word_start(cx.editor, caret, cx.words, false);
    let start = if start.line == caret.line { start } else { caret.line_begin() };
    forget_typed(cx, caret.character - start.character);
    cx.delete(start, caret, None);
    Ok(())
}

fn delete_line_before(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    let indent = first_non_blank_col(&cx.line(caret.line));
    let start = if caret.character > indent { indent } else { 0 };
    if start == caret.character {
        return Ok(());
    }
    forget_typed(cx, caret.character - start);
    cx.delete(caret.with_character(start), caret, None);
    Ok(())
}

fn insert_register(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let Some(name) = cx.keys.last().and_then(|k| k.as_char()) else {
        return Ok(());
    };
    let register = cx.registers.get(Some(name))?.ok_or(VimError::NothingInRegister(name))?;
    let Some(entry) = register.entry_for(cx.cursor_index, cx.vim.cursors.len()) else {
        return Ok(());
    };
    match entry.content {
        RegisterContent::Recorded(_) => {
            if cx.cursor_index == 0 {
                cx.push(Transformation::RunMacro {
                    register: name,
                    replay: ReplayMode::Keystrokes,
                });
            }
        }
        content => {
            let text = content.text();
            record_typed(cx, &text);
            type_text(cx, &text);
        }
    }
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Caret movement without leaving Insert
// -------------------------------------------------------------------------------------------------

fn caret_left(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    cx.set_caret(caret.get_left());
    Ok(())
}

fn caret_right(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    cx.set_caret(caret.get_right(cx.editor).min(caret.line_end(cx.editor)).max(caret));
    Ok(())
}

fn caret_vertical(cx: &mut Cx<'_>, down: bool) {
    let caret = cx.caret();
    let line = if down {
        (caret.line + 1).min(cx.last_line())
    } else {
        caret.line.saturating_sub(1)
    };
    cx.set_caret(Position::new(line, caret.character).clamp_to(cx.editor));
}

fn caret_up(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    caret_vertical(cx, false);
    Ok(())
}

fn caret_down(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    caret_vertical(cx, true);
    Ok(())
}

fn caret_home(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    cx.set_caret(caret.line_begin());
    Ok(())
}

fn caret_end(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    cx.set_caret(caret.line_end(cx.editor));
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Replace mode
// -------------------------------------------------------------------------------------------------

fn originals<'c>(cx: &'c mut Cx<'_>) -> &'c mut Vec<Option<char>> {
    let index = cx.cursor_index;
    if cx.vim.replace_originals.len() <= index {
        cx.vim.replace_originals.resize_with(index + 1, Vec::new);
    }
    &mut cx.vim.replace_originals[index]
}

fn replace_character(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let Some(c) = cx.last_key_char() else {
        return Ok(());
    };
    let caret = cx.caret();
    let text = c.to_string();
    record_typed(cx, &text);
    let existing = cx.line(caret.line).chars().nth(caret.character);
    match existing {
        Some(old) if c != '\n' => {
            originals(cx).push(Some(old));
            cx.replace(
                caret,
                caret.with_character(caret.character + 1),
                text,
                Some(PositionDiff::characters(1)),
            );
        }
        _ => {
            originals(cx).push(None);
            type_text(cx, &text);
        }
    }
    Ok(())
}

/// Backspace in Replace mode puts back what the typing overwrote.
fn replace_backspace(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    match originals(cx).pop() {
        Some(Some(old)) => {
            let start = caret.with_character(caret.character.saturating_sub(1));
            forget_typed(cx, 1);
            cx.replace(start, caret, old.to_string(), None);
            cx.set_caret(start);
            Ok(())
        }
        Some(None) => backspace(cx, count),
        None => caret_left(cx, count),
    }
}

// -------------------------------------------------------------------------------------------------
// Leaving Insert
// -------------------------------------------------------------------------------------------------

fn back_one(diff: PositionDiff) -> PositionDiff {
    match diff {
        PositionDiff::Offset { line, character } => PositionDiff::Offset {
            line,
            character: character - 1,
        },
        PositionDiff::ExactCharacter { line, character } => PositionDiff::ExactCharacter {
            line,
            character: character.saturating_sub(1),
        },
        other => other,
    }
}

fn escape(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let mode = cx.vim.mode();
    let caret = cx.caret();
    let typed = cx.vim.insert_text.clone();
    match mode {
        Mode::Insert if cx.vim.insert_count > 1 && !typed.is_empty() => {
            let unit = if cx.vim.insert_repeat_newline {
                format!("\n{typed}")
            } else {
                typed.clone()
            };
            let repeated = unit.repeat(cx.vim.insert_count - 1);
            let diff = back_one(PositionDiff::over_text(&repeated));
            cx.insert(caret, repeated, Some(diff));
        }
        Mode::VisualBlockInsert if cx.cursor_index > 0 => cx.retire = true,
        Mode::VisualBlockInsert => {
            let tail = typed.rsplit('\n').next().unwrap_or_default().chars().count();
            cx.set_caret(caret.with_character(caret.character.saturating_sub(tail)));
        }
        _ => cx.set_caret(caret.get_left()),
    }
    if cx.cursor_index == 0 {
        trace!(target: "engine.dispatch", typed = typed.len(), ?mode, "insert_finished");
        cx.registers.put_engine_register('.', typed);
        cx.vim.replace_originals.clear();
    }
    cx.vim.set_mode(Mode::Normal);
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Registration
// -------------------------------------------------------------------------------------------------

pub fn register(t: &mut Table) -> Result<(), NotationError> {
    use CommandSpec as C;
    let editing = TYPING | ModeSet::REPLACE;
    let specs = [
        command("insert_escape", editing, &["<Esc>", "<C-c>", "<C-[>"], C::new(escape))?,
        command("insert_register", editing, &["<C-r><register>"], C::new(insert_register))?,
        command("insert_newline", TYPING, &["<CR>", "<C-j>", "<C-m>"], C::new(newline))?,
        command("insert_tab", TYPING, &["<Tab>", "<C-i>"], C::new(tab))?,
        command("insert_backspace", TYPING, &["<BS>", "<C-h>"], C::new(backspace))?,
        command("insert_delete", TYPING, &["<Del>"], C::new(delete_forward))?,
        command("insert_delete_word", TYPING, &["<C-w>"], C::new(delete_word_before))?,
        command("insert_delete_line", TYPING, &["<C-u>"], C::new(delete_line_before))?,
        command("insert_left", editing, &["<Left>"], C::new(caret_left))?,
        command("insert_right", editing, &["<Right>"], C::new(caret_right))?,
        command("insert_up", editing, &["<Up>"], C::new(caret_up))?,
        command("insert_down", editing, &["<Down>"], C::new(caret_down))?,
        command("insert_home", editing, &["<Home>"], C::new(caret_home))?,
        command("insert_end", editing, &["<End>"], C::new(caret_end))?,
        command("replace_backspace", ModeSet::REPLACE, &["<BS>", "<C-h>"], C::new(replace_backspace))?,
        command("replace_character", ModeSet::REPLACE, &["<character>"], C::new(replace_character))?,
        command("type_character", TYPING, &["<character>"], C::new(type_character))?,
    ];
    for spec in specs {
        t.push(spec);
    }
    Ok(())
}
