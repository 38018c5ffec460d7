//! Normal-mode commands: counts and registers, insert entry, simple edits,
//! put, replace, join, case, increments, undo, macros and dot-repeat.

use crate::action::{ActionKind, CommandSpec, Cx, OpRange};
use crate::catalog::{Spec, Table, command};
use crate::operators;
use core_events::NotationError;
use core_keymap::ContextFlags;
use core_model::{HostCommand, RevealAt};
use core_state::{
    Mode, ModeSet, RecordedState, RegisterEntry, RegisterMode, ReplayMode,
    Transformation, VimError, is_valid_name,
};
use core_text::motion::class_run_at;
use core_text::{Cursor, Position, PositionDiff, TextSource, first_non_blank_col, width};
use tracing::debug;

// -------------------------------------------------------------------------------------------------
// Counts and registers
// -------------------------------------------------------------------------------------------------

fn count_digit(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    if let Some(d) = cx.keys.last().and_then(|k| k.as_char()).and_then(|c| c.to_digit(10)) {
        cx.vim.recorded.push_count_digit(d);
    }
    Ok(())
}

fn select_register(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let Some(name) = cx.keys.last().and_then(|k| k.as_char()) else {
        return Ok(());
    };
    if !is_valid_name(name) {
        return Err(VimError::InvalidRegisterName(name));
    }
    cx.vim.recorded.register_name = Some(name);
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Insert entry
// -------------------------------------------------------------------------------------------------

pub(crate) fn enter_insert(cx: &mut Cx<'_>, at: Position, count: usize) {
    cx.set_caret(at);
    if cx.cursor_index == 0 {
        cx.vim.insert_text.clear();
        cx.vim.insert_count = count.max(1);
        cx.vim.insert_repeat_newline = false;
    }
    cx.vim.set_mode(Mode::Insert);
}

fn insert(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let at = cx.caret();
    enter_insert(cx, at, count);
    Ok(())
}

fn append(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    let len = cx.line_len(caret.line);
    enter_insert(cx, caret.with_character((caret.character + 1).min(len)), count);
    Ok(())
}

fn insert_at_first_non_blank(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let at = cx.caret().first_non_blank(cx.editor);
    enter_insert(cx, at, count);
    Ok(())
}

fn insert_at_column_zero(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let at = cx.caret().line_begin();
    enter_insert(cx, at, count);
    Ok(())
}

fn append_at_end(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let at = cx.caret().line_end(cx.editor);
    enter_insert(cx, at, count);
    Ok(())
}

fn indent_text(cx: &Cx<'_>, line: usize) -> String {
    let text = cx.line(line);
    text.chars().take(first_non_blank_col(&text)).collect()
}

fn open_below(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let line = cx.caret().line;
    let indent = indent_text(cx, line);
    let at = Position::new(line, cx.line_len(line));
    let width = indent.chars().count();
    cx.insert(
        at,
        format!("\n{indent}"),
        Some(PositionDiff::ExactCharacter {
            line: 1,
            character: width,
        }),
    );
    enter_insert(cx, at, count);
    cx.vim.insert_repeat_newline = true;
    Ok(())
}

fn open_above(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let line = cx.caret().line;
    let indent = indent_text(cx, line);
    let at = Position::new(line, 0);
    let width = indent.chars().count();
    cx.insert(
        at,
        format!("{indent}\n"),
        Some(PositionDiff::ExactCharacter {
            line: 0,
            character: width,
        }),
    );
    enter_insert(cx, at, count);
    cx.vim.insert_repeat_newline = true;
    Ok(())
}

fn enter_replace(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    if cx.cursor_index == 0 {
        cx.vim.replace_originals.clear();
        cx.vim.insert_text.clear();
        cx.vim.insert_count = count.max(1);
    }
    cx.vim.set_mode(Mode::Replace);
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Operator shorthands
// -------------------------------------------------------------------------------------------------

fn chars_right(cx: &Cx<'_>, count: usize) -> Option<OpRange> {
    let caret = cx.caret();
    let len = cx.line_len(caret.line);
    if len == 0 {
        return None;
    }
    let end = (caret.character + count.max(1)).min(len);
    Some(OpRange::charwise(caret, caret.with_character(end)))
}

fn to_line_end(cx: &Cx<'_>, count: usize) -> OpRange {
    let caret = cx.caret();
    let last = (caret.line + count.max(1) - 1).min(cx.last_line());
    OpRange::charwise(caret, Position::new(last, cx.line_len(last)))
}

fn count_lines(cx: &Cx<'_>, count: usize) -> OpRange {
    let line = cx.caret().line;
    OpRange::lines(line, (line + count.max(1) - 1).min(cx.last_line()))
}

fn delete_char(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    match chars_right(cx, count) {
        Some(r) => operators::delete(cx, r),
        None => Ok(()),
    }
}

fn delete_char_before(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    if caret.character == 0 {
        return Ok(());
    }
    let start = caret.with_character(caret.character.saturating_sub(count.max(1)));
    operators::delete(cx, OpRange::charwise(start, caret))
}

fn delete_to_end(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let r = to_line_end(cx, count);
    operators::delete(cx, r)
}

fn change_to_end(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let r = to_line_end(cx, count);
    operators::change(cx, r)
}

fn substitute(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    match chars_right(cx, count) {
        Some(r) => operators::change(cx, r),
        None => insert(cx, 1),
    }
}

fn substitute_lines(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let r = count_lines(cx, count);
    operators::change(cx, r)
}

fn yank_lines(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let r = count_lines(cx, count);
    operators::yank(cx, r)
}

// -------------------------------------------------------------------------------------------------
// Put
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PutAt {
    After,
    Before,
}

/// The register entry a put by this cursor uses.
pub(crate) fn put_source(cx: &mut Cx<'_>) -> Result<RegisterEntry, VimError> {
    let name = cx.vim.recorded.register_name;
    let shown = name.unwrap_or('"');
    let missing = match shown {
        '#' => VimError::NoAlternateFile,
        c => VimError::NothingInRegister(c),
    };
    let register = cx.registers.get(name)?.ok_or(missing.clone())?;
    register
        .entry_for(cx.cursor_index, cx.vim.cursors.len())
        .ok_or(missing)
}

/// Put `entry` `count` times relative to `caret`; `after_cursor` is `gp`/`gP`.
pub(crate) fn put_entry(
    cx: &mut Cx<'_>,
    entry: &RegisterEntry,
    caret: Position,
    at: PutAt,
    count: usize,
    after_cursor: bool,
) {
    let count = count.max(1);
    match entry.mode {
        RegisterMode::LineWise => {
            let body = entry.as_lines();
            let mut block = Vec::with_capacity(body.len() * count);
            for _ in 0..count {
                block.extend(body.iter().cloned());
            }
            let fnb = block.first().map(|l| first_non_blank_col(l)).unwrap_or(0);
            let n = block.len() as isize;
            let line = caret.line;
            let (pos, text, diff) = match at {
                PutAt::Before => (
                    Position::new(line, 0),
                    format!("{}\n", block.join("\n")),
                    if after_cursor {
                        PositionDiff::ExactCharacter { line: n, character: 0 }
                    } else {
                        PositionDiff::ExactCharacter { line: 0, character: fnb }
                    },
                ),
                PutAt::After if line < cx.last_line() => (
                    Position::new(line + 1, 0),
                    format!("{}\n", block.join("\n")),
                    if after_cursor {
                        PositionDiff::ExactCharacter { line: n, character: 0 }
                    } else {
                        PositionDiff::ExactCharacter { line: 0, character: fnb }
                    },
                ),
                PutAt::After => (
                    Position::new(line, cx.line_len(line)),
                    format!("\n{}", block.join("\n")),
                    if after_cursor {
                        PositionDiff::ExactCharacter { line: n, character: 0 }
                    } else {
                        PositionDiff::ExactCharacter { line: 1, character: fnb }
                    },
                ),
            };
            cx.insert(pos, text, Some(diff));
            cx.set_caret(pos);
            cx.report_lines(block.len(), "more lines");
        }
        RegisterMode::BlockWise => put_block(cx, &entry.as_lines(), caret, at, count),
        RegisterMode::CharacterWise => {
            let text = entry.content.text().repeat(count);
            if text.is_empty() {
                return;
            }
            let len = cx.line_len(caret.line);
            let pos = match at {
                PutAt::After if len > 0 => caret.with_character((caret.character + 1).min(len)),
                _ => caret,
            };
            let diff = if after_cursor {
                PositionDiff::over_text(&text)
            } else if text.contains('\n') {
                PositionDiff::identity()
            } else {
                PositionDiff::characters(text.chars().count() as isize - 1)
            };
            cx.insert(pos, text, Some(diff));
            cx.set_caret(pos);
        }
    }
}

fn put_block(cx: &mut Cx<'_>, pieces: &[String], caret: Position, at: PutAt, count: usize) {
    let ts = cx.tabstop();
    let caret_line = cx.line(caret.line);
    let col = match at {
        PutAt::After if !caret_line.is_empty() => caret.character + 1,
        _ => caret.character,
    };
    let vcol = width::visual_col(&caret_line, col, ts);
    let last = cx.last_line();
    let mut tail = String::new();
    let mut first_insert = None;
    for (i, piece) in pieces.iter().enumerate() {
        let piece = piece.repeat(count);
        let line = caret.line + i;
        if line > last {
            tail.push('\n');
            tail.push_str(&" ".repeat(vcol));
            tail.push_str(&piece);
            continue;
        }
        let text = cx.line(line);
        let w = width::line_width(&text, ts);
        let (pos, insert) = if w < vcol {
            (Position::new(line, text.chars().count()), format!("{}{piece}", " ".repeat(vcol - w)))
        } else {
            (Position::new(line, width::char_at_visual_col(&text, vcol, ts)), piece)
        };
        if line == last && pos.character == cx.line_len(last) {
            tail.insert_str(0, &insert);
        } else {
            cx.insert(pos, insert, None);
        }
        first_insert.get_or_insert(pos);
    }
    if !tail.is_empty() {
        cx.insert(Position::new(last, cx.line_len(last)), tail, None);
    }
    cx.set_caret(first_insert.unwrap_or(caret));
}

fn put(cx: &mut Cx<'_>, count: usize, at: PutAt, after_cursor: bool) -> Result<(), VimError> {
    let entry = put_source(cx)?;
    let caret = cx.caret();
    put_entry(cx, &entry, caret, at, count, after_cursor);
    Ok(())
}

fn put_after(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    put(cx, count, PutAt::After, false)
}

fn put_before(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    put(cx, count, PutAt::Before, false)
}

fn put_after_move(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    put(cx, count, PutAt::After, true)
}

fn put_before_move(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    put(cx, count, PutAt::Before, true)
}

// -------------------------------------------------------------------------------------------------
// Replace, join, case, increment
// -------------------------------------------------------------------------------------------------

fn replace_char(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let Some(c) = cx.last_key_char() else {
        return Ok(());
    };
    let caret = cx.caret();
    let n = count.max(1);
    if caret.character + n > cx.line_len(caret.line) {
        cx.vim.last_movement_failed = true;
        return Ok(());
    }
    let end = caret.with_character(caret.character + n);
    if c == '\n' {
        cx.replace(caret, end, "\n", Some(PositionDiff::ExactCharacter { line: 1, character: 0 }));
    } else {
        let text: String = std::iter::repeat_n(c, n).collect();
        cx.replace(caret, end, text, Some(PositionDiff::characters(n as isize - 1)));
    }
    Ok(())
}

/// Join `lines` lines starting at `first`. `spaces` is `J`; `gJ` keeps the
/// text as it is.
pub(crate) fn join_lines(cx: &mut Cx<'_>, first: usize, lines: usize, spaces: bool) -> bool {
    let last = (first + lines.max(2) - 1).min(cx.last_line());
    if last == first {
        return false;
    }
    let mut join_at = Position::new(first, 0);
    for line in first..last {
        let current = cx.line(line);
        let next = cx.line(line + 1);
        let start = Position::new(line, current.chars().count());
        if !spaces {
            cx.delete(start, Position::new(line + 1, 0), None);
            join_at = start;
            continue;
        }
        let indent = first_non_blank_col(&next);
        let rest: String = next.chars().skip(indent).collect();
        let sep = if rest.is_empty() || rest.starts_with(')') || current.ends_with([' ', '\t']) || current.is_empty() {
            ""
        } else {
            " "
        };
        cx.replace(start, Position::new(line + 1, indent), sep, None);
        join_at = start;
    }
    cx.set_caret(join_at);
    true
}

fn join(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let line = cx.caret().line;
    if !join_lines(cx, line, count, true) {
        cx.vim.last_movement_failed = true;
    }
    Ok(())
}

fn join_raw(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let line = cx.caret().line;
    if !join_lines(cx, line, count, false) {
        cx.vim.last_movement_failed = true;
    }
    Ok(())
}

fn toggle_case_char(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let Some(r) = chars_right(cx, count) else {
        return Ok(());
    };
    let text = cx.editor.text_in_range(r.start, r.end);
    let mapped = operators::toggle_case_str(&text);
    let diff = PositionDiff::over_text(&mapped);
    cx.replace(r.start, r.end, mapped, Some(diff));
    cx.set_caret(r.start);
    Ok(())
}

/// Number at or after the caret: start, end (exclusive), value, hex.
fn number_at(line: &str, from: usize) -> Option<(usize, usize, i64, bool)> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = from.min(chars.len());
    // Back up to the start of a number the caret sits in.
    while i > 0 && chars.get(i).is_some_and(|c| c.is_ascii_hexdigit()) && chars[i - 1].is_ascii_hexdigit() {
        i -= 1;
    }
    let is_hex_at = |k: usize| {
        chars.get(k) == Some(&'0')
            && matches!(chars.get(k + 1), Some('x' | 'X'))
            && chars.get(k + 2).is_some_and(|c| c.is_ascii_hexdigit())
    };
    if i >= 2 && chars[i - 1].to_ascii_lowercase() == 'x' && is_hex_at(i - 2) {
        i -= 2;
    }
    while i < chars.len() && !chars[i].is_ascii_digit() {
        i += 1;
    }
    if i >= chars.len() {
        return None;
    }
    if is_hex_at(i) {
        let mut end = i + 2;
        while end < chars.len() && chars[end].is_ascii_hexdigit() {
            end += 1;
        }
        let digits: String = chars[i + 2..end].iter().collect();
        let value = i64::from_str_radix(&digits, 16).ok()?;
        return Some((i, end, value, true));
    }
    let mut end = i;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    let negative = i > 0 && chars[i - 1] == '-';
    let start = if negative { i - 1 } else { i };
    let digits: String = chars[start..end].iter().collect();
    Some((start, end, digits.parse().ok()?, false))
}

fn add_to_number(cx: &mut Cx<'_>, delta: i64) -> Result<(), VimError> {
    let caret = cx.caret();
    let Some((start, end, value, hex)) = number_at(&cx.line(caret.line), caret.character) else {
        cx.vim.last_movement_failed = true;
        return Ok(());
    };
    let next = value.saturating_add(delta);
    let text = if hex {
        let digits = end - start - 2;
        format!("0x{:0width$x}", next.max(0), width = digits)
    } else {
        next.to_string()
    };
    let n = text.chars().count() as isize;
    let from = caret.with_character(start);
    cx.replace(from, caret.with_character(end), text, Some(PositionDiff::characters(n - 1)));
    cx.set_caret(from);
    Ok(())
}

fn increment(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    add_to_number(cx, count.max(1) as i64)
}

fn decrement(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    add_to_number(cx, -(count.max(1) as i64))
}

// -------------------------------------------------------------------------------------------------
// Undo, dot-repeat, macros
// -------------------------------------------------------------------------------------------------

fn host(cx: &mut Cx<'_>, command: HostCommand, times: usize) {
    for _ in 0..times.max(1) {
        let meta = cx.meta();
        cx.push(Transformation::HostCommand {
            command: command.clone(),
            meta,
        });
    }
}

fn undo(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    host(cx, HostCommand::Undo, count);
    Ok(())
}

fn redo(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    host(cx, HostCommand::Redo, count);
    Ok(())
}

fn repeat_last_change(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let count = (count > 0).then_some(count);
    cx.push(Transformation::ReplayDotRepeat { count });
    Ok(())
}

fn macro_record_start(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let Some(name) = cx.last_key_char() else {
        return Ok(());
    };
    if !(name.is_ascii_alphanumeric() || name == '"') {
        return Err(VimError::InvalidRegisterName(name));
    }
    debug!(target: "engine.macro", register = %name, "recording_started");
    cx.vim.macro_recording = Some((name, RecordedState::new()));
    cx.info(format!("recording @{name}"));
    Ok(())
}

fn macro_record_stop(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    if let Some((name, recorded)) = cx.vim.macro_recording.take() {
        debug!(target: "engine.macro", register = %name, actions = recorded.actions_run.len(), "recording_stopped");
        cx.registers.store_macro(name, recorded)?;
    }
    Ok(())
}

fn run_macro(cx: &mut Cx<'_>, register: char, count: usize) {
    cx.globals.last_invoked_macro = Some(register);
    for _ in 0..count.max(1) {
        cx.push(Transformation::RunMacro {
            register,
            replay: ReplayMode::ContentChange,
        });
    }
}

fn macro_run(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let Some(name) = cx.last_key_char() else {
        return Ok(());
    };
    // `%` and `#` hold document names, not keys.
    if !is_valid_name(name) || matches!(name, '%' | '#') {
        return Err(VimError::InvalidRegisterName(name));
    }
    run_macro(cx, name.to_ascii_lowercase(), count);
    Ok(())
}

fn macro_repeat_last(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let register = cx.globals.last_invoked_macro.ok_or(VimError::NoPreviouslyUsedRegister)?;
    run_macro(cx, register, count);
    Ok(())
}

fn macro_run_command_line(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let present = cx.registers.get(Some(':'))?.is_some();
    if !present {
        return Err(VimError::NoPreviousCommandLine);
    }
    run_macro(cx, ':', count);
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Visual entry, view and files
// -------------------------------------------------------------------------------------------------

fn enter_visual_mode(cx: &mut Cx<'_>, mode: Mode) {
    let caret = cx.caret();
    cx.cursor = Cursor::at(caret);
    cx.vim.set_mode(mode);
}

fn visual(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    enter_visual_mode(cx, Mode::Visual);
    Ok(())
}

fn visual_line(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    enter_visual_mode(cx, Mode::VisualLine);
    Ok(())
}

fn visual_block(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    enter_visual_mode(cx, Mode::VisualBlock);
    Ok(())
}

/// `gv`: reselect the last visual area.
pub(crate) fn reselect(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let Some(last) = cx.vim.last_visual.clone() else {
        return Ok(());
    };
    if let Some(current) = cx.vim.mode().is_visual().then(|| core_state::LastVisual {
        mode: cx.vim.mode(),
        cursors: cx.vim.cursors.clone(),
    }) {
        cx.vim.last_visual = Some(current);
    }
    let clamped = last
        .cursors
        .iter()
        .map(|c| Cursor::new(c.start.clamp_normal(cx.editor), c.stop.clamp_normal(cx.editor)))
        .collect();
    cx.vim.cursors = clamped;
    cx.vim.set_mode(last.mode);
    Ok(())
}

fn reveal(cx: &mut Cx<'_>, at: RevealAt) {
    let line = cx.caret().line;
    let meta = cx.meta();
    cx.push(Transformation::HostCommand {
        command: HostCommand::RevealLine { line, at },
        meta,
    });
}

fn reveal_center(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    reveal(cx, RevealAt::Center);
    Ok(())
}

fn reveal_top(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    reveal(cx, RevealAt::Top);
    Ok(())
}

fn reveal_bottom(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    reveal(cx, RevealAt::Bottom);
    Ok(())
}

fn open_file_under_cursor(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let caret = cx.caret();
    let Some((start, end)) = class_run_at(cx.editor, caret, cx.words, true)
        .filter(|(s, _)| cx.line(s.line).chars().nth(s.character).is_some_and(|c| !c.is_whitespace()))
    else {
        return Err(VimError::Other("E446: No file name under cursor".into()));
    };
    let name = cx.editor.text_in_range(start, end.with_character(end.character + 1));
    let meta = cx.meta();
    cx.push(Transformation::HostCommand {
        command: HostCommand::OpenFile(name),
        meta,
    });
    Ok(())
}

fn open_alternate(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let name = cx.editor.alternate_name().ok_or(VimError::NoAlternateFile)?;
    let meta = cx.meta();
    cx.push(Transformation::HostCommand {
        command: HostCommand::OpenFile(name),
        meta,
    });
    Ok(())
}

/// `<Esc>` in Normal drops the pending count/register and any extra cursors.
fn cancel(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    cx.vim.cursors = vec![cx.cursor];
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Registration
// -------------------------------------------------------------------------------------------------

/// Counts, `"x` and macro commands: declared before anything that could
/// claim their keys.
pub fn register_prefixes(t: &mut Table) -> Result<(), NotationError> {
    use CommandSpec as C;
    let nv = ModeSet::NORMAL_AND_VISUAL;
    let n = ModeSet::NORMAL;
    // Counts also apply to the motion after an operator (`d3w`), so unlike
    // other commands they stay available while an operator is pending.
    let count = || ActionKind::Command(C::new(count_digit).incomplete().once());
    t.push(Spec::new("count_zero", nv, &["0"], count())?.requires(ContextFlags::COUNT));
    t.push(Spec::new("count_digit", nv, &["<number>"], count())?);
    t.push(command("select_register", nv, &["\"<register>"], C::new(select_register).incomplete().once())?);
    t.push(
        command("macro_record_stop", n, &["q"], C::new(macro_record_stop).once().not_recorded())?
            .requires(ContextFlags::RECORDING),
    );
    let replay = ModeSet::NORMAL | ModeSet::VISUAL | ModeSet::VISUAL_LINE;
    t.push(command("macro_repeat_last", replay, &["@@"], C::new(macro_repeat_last).once())?);
    t.push(command("macro_run_command_line", replay, &["@:"], C::new(macro_run_command_line).once())?);
    t.push(command("macro_run", replay, &["@<macro>"], C::new(macro_run).once())?);
    t.push(
        command("macro_record_start", n, &["q<register>"], C::new(macro_record_start).once().not_recorded())?
            .excludes(ContextFlags::RECORDING),
    );
    Ok(())
}

pub fn register(t: &mut Table) -> Result<(), NotationError> {
    use CommandSpec as C;
    let n = ModeSet::NORMAL;
    let specs = [
        command("insert", n, &["i", "<Insert>"], C::new(insert).repeatable())?,
        command("append", n, &["a"], C::new(append).repeatable())?,
        command("insert_first_non_blank", n, &["I"], C::new(insert_at_first_non_blank).repeatable())?,
        command("insert_column_zero", n, &["gI"], C::new(insert_at_column_zero).repeatable())?,
        command("append_end", n, &["A"], C::new(append_at_end).repeatable())?,
        command("open_below", n, &["o"], C::new(open_below).repeatable())?,
        command("open_above", n, &["O"], C::new(open_above).repeatable())?,
        command("replace_mode", n, &["R"], C::new(enter_replace).repeatable())?,
        command("delete_char", n, &["x", "<Del>"], C::new(delete_char).repeatable())?,
        command("delete_char_before", n, &["X"], C::new(delete_char_before).repeatable())?,
        command("delete_to_end", n, &["D"], C::new(delete_to_end).repeatable())?,
        command("change_to_end", n, &["C"], C::new(change_to_end).repeatable())?,
        command("substitute", n, &["s"], C::new(substitute).repeatable())?,
        command("substitute_lines", n, &["S"], C::new(substitute_lines).repeatable())?,
        command("yank_lines", n, &["Y"], C::new(yank_lines))?,
        command("put_after", n, &["p"], C::new(put_after).repeatable())?,
        command("put_before", n, &["P"], C::new(put_before).repeatable())?,
        command("put_after_move", n, &["gp"], C::new(put_after_move).repeatable())?,
        command("put_before_move", n, &["gP"], C::new(put_before_move).repeatable())?,
        command("replace_char", n, &["r<character>"], C::new(replace_char).repeatable())?,
        command("join", n, &["J"], C::new(join).repeatable())?,
        command("join_raw", n, &["gJ"], C::new(join_raw).repeatable())?,
        command("toggle_case_char", n, &["~"], C::new(toggle_case_char).repeatable())?,
        command("increment", n, &["<C-a>"], C::new(increment).repeatable())?,
        command("decrement", n, &["<C-x>"], C::new(decrement).repeatable())?,
        command("undo", n, &["u", "<C-z>"], C::new(undo).once())?,
        command("redo", n, &["<C-r>"], C::new(redo).once())?,
        command("repeat_last_change", n, &["."], C::new(repeat_last_change).once())?,
        command("visual", n, &["v"], C::new(visual))?,
        command("visual_line", n, &["V"], C::new(visual_line))?,
        command("visual_block", n, &["<C-v>", "<C-q>"], C::new(visual_block))?,
        command("reselect", n, &["gv"], C::new(reselect).once())?,
        command("reveal_center", n, &["zz"], C::new(reveal_center).once())?,
        command("reveal_top", n, &["zt"], C::new(reveal_top).once())?,
        command("reveal_bottom", n, &["zb"], C::new(reveal_bottom).once())?,
        command("open_file", n, &["gf"], C::new(open_file_under_cursor).once())?,
        command("open_alternate", n, &["<C-^>", "<C-6>"], C::new(open_alternate).once())?,
        command("cancel", n, &["<Esc>", "<C-c>"], C::new(cancel).once())?,
    ];
    for spec in specs {
        t.push(spec);
    }
    Ok(())
}
