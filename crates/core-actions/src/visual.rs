//! Visual-mode keys: mode toggles, selection-only operators and commands
//! that act on the selection (`J`, `r`, `p`, block `I`/`A`).

use crate::action::{CommandSpec, Cx, OpRange, OperatorKind, OperatorSpec};
use crate::catalog::{Table, command, operator};
use crate::commands;
use crate::operators;
use core_events::NotationError;
use core_state::{
    BlockInsertion, DESIRED_EOL, Mode, ModeSet, RegisterContent, RegisterMode, VimError, WriteKind,
};
use core_text::{Cursor, Position, PositionDiff, TextSource, first_non_blank_col, width};

const VISUAL: ModeSet = ModeSet::ANY_VISUAL;

/// The region a visual selection covers, in operator form.
pub(crate) fn selection_range(cx: &Cx<'_>, mode: Mode) -> OpRange {
    let (start, end) = cx.cursor.sorted();
    match mode {
        Mode::VisualLine => OpRange::lines(start.line, end.line),
        Mode::VisualBlock => {
            let ts = cx.tabstop();
            let col = |p: Position| width::visual_col(&cx.line(p.line), p.character, ts);
            let (a, b) = (col(cx.cursor.start), col(cx.cursor.stop));
            let right = if cx.vim.desired_column == DESIRED_EOL {
                usize::MAX
            } else {
                // The right edge covers the whole last cell (tabs, wide characters).
                let right_pos = if a >= b { cx.cursor.start } else { cx.cursor.stop };
                let text = cx.line(right_pos.line);
                let w = text
                    .chars()
                    .nth(right_pos.character)
                    .map(|c| width::char_width(c, a.max(b), ts))
                    .unwrap_or(1);
                a.max(b) + w.max(1) - 1
            };
            OpRange::block(Position::new(start.line, a.min(b)), Position::new(end.line, right))
        }
        _ => {
            let len = cx.line_len(end.line);
            let stop = if end.character < len {
                end.with_character(end.character + 1)
            } else if end.line < cx.last_line() {
                Position::new(end.line + 1, 0)
            } else {
                end.with_character(len)
            };
            OpRange::charwise(start, stop)
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Mode switching
// -------------------------------------------------------------------------------------------------

fn leave(cx: &mut Cx<'_>) {
    let caret = cx.caret();
    cx.cursor = Cursor::at(caret);
    cx.vim.set_mode(Mode::Normal);
}

fn switch_to(cx: &mut Cx<'_>, mode: Mode) {
    if cx.vim.mode() == mode {
        leave(cx);
    } else {
        cx.vim.set_mode(mode);
    }
}

fn escape(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    leave(cx);
    Ok(())
}

fn toggle_visual(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    switch_to(cx, Mode::Visual);
    Ok(())
}

fn toggle_visual_line(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    switch_to(cx, Mode::VisualLine);
    Ok(())
}

fn toggle_visual_block(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    switch_to(cx, Mode::VisualBlock);
    Ok(())
}

fn other_end(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    cx.cursor = cx.cursor.swapped();
    Ok(())
}

/// `O`: in block mode move to the other corner on the same line.
fn other_corner(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    if cx.vim.mode() != Mode::VisualBlock {
        return other_end(cx, count);
    }
    let Cursor { start, stop } = cx.cursor;
    cx.cursor = Cursor::new(
        start.with_character(stop.character),
        stop.with_character(start.character),
    );
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Selection commands
// -------------------------------------------------------------------------------------------------

fn join_selection(cx: &mut Cx<'_>, spaces: bool) {
    let (start, end) = cx.cursor.sorted();
    let lines = (end.line - start.line + 1).max(2);
    commands::join_lines(cx, start.line, lines, spaces);
    cx.vim.set_mode(Mode::Normal);
}

fn join(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    join_selection(cx, true);
    Ok(())
}

fn join_raw(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    join_selection(cx, false);
    Ok(())
}

fn replace_chars(cx: &mut Cx<'_>, _count: usize) -> Result<(), VimError> {
    let Some(c) = cx.last_key_char() else {
        return Ok(());
    };
    let mode = cx.vim.mode();
    let r = selection_range(cx, mode);
    let fill = |s: &str| -> String { s.chars().map(|ch| if ch == '\n' { ch } else { c }).collect() };
    match r.mode {
        RegisterMode::BlockWise => {
            for line in r.start.line..=r.end.line {
                if let Some((from, to)) = operators::block_columns(cx, line, &r) {
                    let text = c.to_string().repeat(to - from);
                    cx.replace(Position::new(line, from), Position::new(line, to), text, None);
                }
            }
            let col = width::char_at_visual_col(&cx.line(r.start.line), r.start.character, cx.tabstop());
            cx.set_caret(Position::new(r.start.line, col));
        }
        RegisterMode::LineWise => {
            let end = Position::new(r.end.line, cx.line_len(r.end.line));
            let text = fill(&cx.editor.text_in_range(r.start, end));
            cx.replace(r.start, end, text, None);
            cx.set_caret(r.start);
        }
        RegisterMode::CharacterWise => {
            let text = fill(&cx.editor.text_in_range(r.start, r.end));
            cx.replace(r.start, r.end, text, None);
            cx.set_caret(r.start);
        }
    }
    cx.vim.set_mode(Mode::Normal);
    Ok(())
}

/// `p`/`P` over a selection: the selection is replaced by the register;
/// `p` also stores the replaced text in the unnamed register.
fn put_over(cx: &mut Cx<'_>, count: usize, keep_register: bool) -> Result<(), VimError> {
    let entry = commands::put_source(cx)?;
    let mode = cx.vim.mode();
    let r = selection_range(cx, mode);
    let replaced = operators::range_entry(cx, &r);
    let count = count.max(1);
    match (r.mode, entry.mode) {
        (RegisterMode::BlockWise, _) => {
            let text = entry.content.text().repeat(count);
            let single = !text.contains('\n');
            for (i, line) in (r.start.line..=r.end.line).enumerate() {
                let Some((from, to)) = operators::block_columns(cx, line, &r) else {
                    continue;
                };
                let piece = if single || i == 0 { text.clone() } else { String::new() };
                cx.replace(Position::new(line, from), Position::new(line, to), piece, None);
            }
            let col = width::char_at_visual_col(&cx.line(r.start.line), r.start.character, cx.tabstop());
            cx.set_caret(Position::new(r.start.line, col));
        }
        (RegisterMode::LineWise, _) => {
            let end = Position::new(r.end.line, cx.line_len(r.end.line));
            let body = match entry.mode {
                RegisterMode::LineWise => entry.as_lines().join("\n"),
                _ => entry.content.text(),
            };
            let body = vec![body; count].join("\n");
            let fnb = first_non_blank_col(body.lines().next().unwrap_or_default());
            cx.replace(
                r.start,
                end,
                body,
                Some(PositionDiff::ExactCharacter { line: 0, character: fnb }),
            );
            cx.set_caret(r.start);
        }
        (RegisterMode::CharacterWise, RegisterMode::LineWise) => {
            let body = vec![entry.as_lines().join("\n"); count].join("\n");
            let fnb = first_non_blank_col(body.lines().next().unwrap_or_default());
            cx.replace(
                r.start,
                r.end,
                format!("\n{body}\n"),
                Some(PositionDiff::ExactCharacter { line: 1, character: fnb }),
            );
            cx.set_caret(r.start);
        }
        (RegisterMode::CharacterWise, _) => {
            let text = entry.content.text().repeat(count);
            let diff = if text.contains('\n') {
                PositionDiff::identity()
            } else {
                PositionDiff::characters(text.chars().count() as isize - 1)
            };
            cx.replace(r.start, r.end, text, Some(diff));
            cx.set_caret(r.start);
        }
    }
    if !keep_register && !matches!(entry.content, RegisterContent::Recorded(_)) {
        cx.registers.put(None, replaced, cx.cursor_index, WriteKind::Delete)?;
    }
    cx.vim.set_mode(Mode::Normal);
    Ok(())
}

fn put_replacing(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    put_over(cx, count, false)
}

fn put_keeping(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    put_over(cx, count, true)
}

fn start_block_insert(cx: &mut Cx<'_>, carets: Vec<Position>, edge: BlockInsertion) {
    let mut carets = carets.into_iter();
    let Some(first) = carets.next() else {
        cx.vim.set_mode(Mode::Normal);
        return;
    };
    cx.set_caret(first);
    cx.spawned.extend(carets.map(Cursor::at));
    if cx.cursor_index == 0 {
        cx.vim.insert_text.clear();
        cx.vim.insert_count = 1;
        cx.vim.insert_repeat_newline = false;
    }
    cx.vim.block_insertion = edge;
    cx.vim.set_mode(Mode::VisualBlockInsert);
}

/// `I`: insert before the selection (on every block row in block mode).
fn insert_before(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let mode = cx.vim.mode();
    if mode != Mode::VisualBlock {
        let (start, _) = cx.cursor.sorted();
        let at = if mode == Mode::VisualLine {
            start.line_begin().first_non_blank(cx.editor)
        } else {
            start
        };
        commands::enter_insert(cx, at, count);
        return Ok(());
    }
    let r = selection_range(cx, mode);
    let ts = cx.tabstop();
    let carets = (r.start.line..=r.end.line)
        .filter_map(|line| {
            let text = cx.line(line);
            (width::line_width(&text, ts) >= r.start.character || line == r.start.line)
                .then(|| Position::new(line, width::char_at_visual_col(&text, r.start.character, ts)))
        })
        .collect();
    start_block_insert(cx, carets, BlockInsertion::Insert);
    Ok(())
}

/// `A`: append after the selection (after every block row in block mode).
fn append_after(cx: &mut Cx<'_>, count: usize) -> Result<(), VimError> {
    let mode = cx.vim.mode();
    if mode != Mode::VisualBlock {
        let (_, end) = cx.cursor.sorted();
        let len = cx.line_len(end.line);
        let at = if mode == Mode::VisualLine {
            end.with_character(len)
        } else {
            end.with_character((end.character + 1).min(len))
        };
        commands::enter_insert(cx, at, count);
        return Ok(());
    }
    let r = selection_range(cx, mode);
    let ts = cx.tabstop();
    let carets = (r.start.line..=r.end.line)
        .map(|line| {
            let text = cx.line(line);
            let len = text.chars().count();
            let col = if r.end.character == usize::MAX {
                len
            } else {
                (width::char_at_visual_col(&text, r.end.character, ts) + 1).min(len)
            };
            Position::new(line, col)
        })
        .collect();
    start_block_insert(cx, carets, BlockInsertion::Append);
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Registration
// -------------------------------------------------------------------------------------------------

pub fn register(t: &mut Table) -> Result<(), NotationError> {
    use CommandSpec as C;
    use OperatorKind as K;
    use OperatorSpec as O;
    let specs = [
        command("visual_escape", VISUAL, &["<Esc>", "<C-c>"], C::new(escape))?,
        command("visual_toggle", VISUAL, &["v"], C::new(toggle_visual))?,
        command("visual_toggle_line", VISUAL, &["V"], C::new(toggle_visual_line))?,
        command("visual_toggle_block", VISUAL, &["<C-v>", "<C-q>"], C::new(toggle_visual_block))?,
        command("visual_other_end", VISUAL, &["o"], C::new(other_end))?,
        command("visual_other_corner", VISUAL, &["O"], C::new(other_corner))?,
        command("visual_reselect", VISUAL, &["gv"], C::new(commands::reselect).once())?,
        operator("visual_delete", VISUAL, &["x", "<Del>"], O::new(K::Delete, operators::delete))?,
        operator("visual_substitute", VISUAL, &["s"], O::new(K::Change, operators::change))?,
        operator("visual_toggle_case", VISUAL, &["~"], O::new(K::ToggleCase, operators::toggle_case))?,
        operator("visual_lower", VISUAL, &["u"], O::new(K::Lower, operators::lower))?,
        operator("visual_upper", VISUAL, &["U"], O::new(K::Upper, operators::upper))?,
        operator("visual_delete_lines", VISUAL, &["D", "X"], O::new(K::Delete, operators::delete).linewise())?,
        operator("visual_yank_lines", VISUAL, &["Y"], O::new(K::Yank, operators::yank).linewise())?,
        operator("visual_change_lines", VISUAL, &["C", "S", "R"], O::new(K::Change, operators::change).linewise())?,
        command("visual_join", VISUAL, &["J"], C::new(join).repeatable())?,
        command("visual_join_raw", VISUAL, &["gJ"], C::new(join_raw).repeatable())?,
        command("visual_replace", VISUAL, &["r<character>"], C::new(replace_chars).repeatable())?,
        command("visual_put", VISUAL, &["p"], C::new(put_replacing).repeatable())?,
        command("visual_put_keep", VISUAL, &["P"], C::new(put_keeping).repeatable())?,
        command("visual_insert", VISUAL, &["I"], C::new(insert_before).repeatable())?,
        command("visual_append", VISUAL, &["A"], C::new(append_after).repeatable())?,
    ];
    for spec in specs {
        t.push(spec);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::with_cx;
    use pretty_assertions::assert_eq;

    #[test]
    fn charwise_selection_including_line_end_takes_the_break() {
        with_cx(&["ab", "cd"], |cx| {
            cx.vim.set_mode(Mode::Visual);
            cx.cursor = Cursor::new(Position::new(0, 1), Position::new(0, 2));
            let r = selection_range(cx, Mode::Visual);
            assert_eq!((r.start, r.end), (Position::new(0, 1), Position::new(1, 0)));
        });
    }

    #[test]
    fn block_selection_uses_screen_columns() {
        with_cx(&["\tab", "abcdefghij"], |cx| {
            cx.cursor = Cursor::new(Position::new(0, 1), Position::new(1, 9));
            let r = selection_range(cx, Mode::VisualBlock);
            assert_eq!(r.mode, RegisterMode::BlockWise);
            assert_eq!((r.start.character, r.end.character), (8, 9));
            cx.vim.desired_column = DESIRED_EOL;
            assert_eq!(selection_range(cx, Mode::VisualBlock).end.character, usize::MAX);
        });
    }
}
