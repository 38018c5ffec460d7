//! Operators: `d y c < > = g~ gu gU gq`.
//!
//! An operator runs once per cursor with the range its motion (or the
//! visual selection) produced. Register writes go through
//! [`core_state::Registers::put`], which handles the numbered and small
//! delete registers.

use crate::action::{Cx, OpRange, OperatorKind, OperatorSpec};
use crate::catalog::{MOTION_MODES, Table, operator};
use core_events::NotationError;
use core_model::HostCommand;
use core_state::{BlockInsertion, Mode, RegisterEntry, RegisterMode, VimError, WriteKind};
use core_text::{Cursor, Position, PositionDiff, TextSource, first_non_blank_col, width};

// -------------------------------------------------------------------------------------------------
// Range helpers
// -------------------------------------------------------------------------------------------------

/// Character span `[from, to)` a block range covers on `line`; `None` when
/// the line is too short to reach the block.
pub(crate) fn block_columns(cx: &Cx<'_>, line: usize, r: &OpRange) -> Option<(usize, usize)> {
    let text = cx.line(line);
    let len = text.chars().count();
    let ts = cx.tabstop();
    let from = width::char_at_visual_col(&text, r.start.character, ts);
    if from >= len {
        return None;
    }
    let to = if r.end.character == usize::MAX {
        len
    } else {
        (width::char_at_visual_col(&text, r.end.character, ts) + 1).min(len)
    };
    Some((from, to.max(from)))
}

/// What the range holds, in register form.
pub(crate) fn range_entry(cx: &Cx<'_>, r: &OpRange) -> RegisterEntry {
    match r.mode {
        RegisterMode::CharacterWise => {
            RegisterEntry::text(cx.editor.text_in_range(r.start, r.end), RegisterMode::CharacterWise)
        }
        RegisterMode::LineWise => {
            let lines: Vec<String> = (r.start.line..=r.end.line).map(|l| cx.line(l)).collect();
            RegisterEntry::lines(&lines)
        }
        RegisterMode::BlockWise => {
            let lines = (r.start.line..=r.end.line)
                .map(|l| match block_columns(cx, l, r) {
                    Some((from, to)) => cx.line(l).chars().skip(from).take(to - from).collect(),
                    None => String::new(),
                })
                .collect();
            RegisterEntry::block(lines)
        }
    }
}

fn store(cx: &mut Cx<'_>, entry: RegisterEntry, kind: WriteKind) -> Result<(), VimError> {
    let name = cx.vim.recorded.register_name;
    cx.registers.put(name, entry, cx.cursor_index, kind)?;
    Ok(())
}

/// Delete whole lines `first..=last`, taking the line break that joins them
/// to the rest of the buffer.
pub(crate) fn delete_lines(cx: &mut Cx<'_>, first: usize, last: usize, diff: Option<PositionDiff>) -> Position {
    let last_line = cx.last_line();
    if last < last_line {
        cx.delete(Position::new(first, 0), Position::new(last + 1, 0), diff);
        Position::new(first, 0)
    } else if first > 0 {
        let prev = first - 1;
        cx.delete(
            Position::new(prev, cx.line_len(prev)),
            Position::new(last, cx.line_len(last)),
            diff,
        );
        Position::new(prev, 0)
    } else {
        cx.delete(Position::origin(), Position::new(last, cx.line_len(last)), diff);
        Position::origin()
    }
}

fn line_span(r: &OpRange) -> (usize, usize) {
    (r.start.line, r.end.line)
}

fn in_visual(cx: &Cx<'_>) -> bool {
    cx.vim.mode().is_visual()
}

// -------------------------------------------------------------------------------------------------
// Delete, yank, change
// -------------------------------------------------------------------------------------------------

pub(crate) fn delete(cx: &mut Cx<'_>, r: OpRange) -> Result<(), VimError> {
    store(cx, range_entry(cx, &r), WriteKind::Delete)?;
    match r.mode {
        RegisterMode::CharacterWise => {
            cx.delete(r.start, r.end, None);
            cx.set_caret(r.start);
        }
        RegisterMode::LineWise => {
            let (first, last) = line_span(&r);
            let caret = delete_lines(cx, first, last, Some(PositionDiff::ObeyStartOfLine { line: 0 }));
            cx.set_caret(caret);
            cx.report_lines(last - first + 1, "fewer lines");
        }
        RegisterMode::BlockWise => {
            for line in r.start.line..=r.end.line {
                if let Some((from, to)) = block_columns(cx, line, &r) {
                    cx.delete(Position::new(line, from), Position::new(line, to), None);
                }
            }
            let text = cx.line(r.start.line);
            let col = width::char_at_visual_col(&text, r.start.character, cx.tabstop());
            cx.set_caret(Position::new(r.start.line, col));
        }
    }
    Ok(())
}

pub(crate) fn yank(cx: &mut Cx<'_>, r: OpRange) -> Result<(), VimError> {
    store(cx, range_entry(cx, &r), WriteKind::Yank)?;
    let caret = cx.caret();
    match r.mode {
        RegisterMode::LineWise => {
            let (first, last) = line_span(&r);
            if in_visual(cx) {
                let col = cx.cursor.sorted().0.character;
                cx.set_caret(Position::new(first, col).clamp_normal(cx.editor));
            } else if caret.line != first {
                cx.set_caret(Position::new(first, caret.character).clamp_normal(cx.editor));
            }
            let n = last - first + 1;
            if cx.cursor_index == 0 && n > cx.config.editor().report {
                cx.info(format!("{n} lines yanked"));
            }
        }
        RegisterMode::BlockWise => {
            let text = cx.line(r.start.line);
            let col = width::char_at_visual_col(&text, r.start.character, cx.tabstop());
            cx.set_caret(Position::new(r.start.line, col));
            let n = r.line_count();
            if cx.cursor_index == 0 && n > cx.config.editor().report {
                cx.info(format!("block of {n} lines yanked"));
            }
        }
        RegisterMode::CharacterWise => cx.set_caret(r.start),
    }
    Ok(())
}

pub(crate) fn change(cx: &mut Cx<'_>, r: OpRange) -> Result<(), VimError> {
    store(cx, range_entry(cx, &r), WriteKind::Delete)?;
    match r.mode {
        RegisterMode::CharacterWise => {
            cx.delete(r.start, r.end, None);
            cx.set_caret(r.start);
            cx.vim.set_mode(Mode::Insert);
        }
        RegisterMode::LineWise => {
            let (first, last) = line_span(&r);
            let indent = first_non_blank_col(&cx.line(first));
            let start = Position::new(first, indent);
            cx.delete(start, Position::new(last, cx.line_len(last)), None);
            cx.set_caret(start);
            cx.vim.set_mode(Mode::Insert);
        }
        RegisterMode::BlockWise => {
            let mut carets = Vec::new();
            for line in r.start.line..=r.end.line {
                let text = cx.line(line);
                let col = width::char_at_visual_col(&text, r.start.character, cx.tabstop());
                match block_columns(cx, line, &r) {
                    Some((from, to)) => {
                        cx.delete(Position::new(line, from), Position::new(line, to), None);
                        carets.push(Position::new(line, from));
                    }
                    // Short lines only take part when the block reaches line ends.
                    None if r.end.character == usize::MAX => carets.push(Position::new(line, col)),
                    None => {}
                }
            }
            let mut carets = carets.into_iter();
            let first = carets.next().unwrap_or(r.start);
            cx.set_caret(first);
            cx.spawned.extend(carets.map(Cursor::at));
            cx.vim.block_insertion = BlockInsertion::Insert;
            cx.vim.set_mode(Mode::VisualBlockInsert);
        }
    }
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Shifting and host formatting
// -------------------------------------------------------------------------------------------------

/// Leading white space width in screen columns and its length in characters.
fn indent_of(line: &str, tabstop: usize) -> (usize, usize) {
    let chars = first_non_blank_col(line);
    (width::visual_col(line, chars, tabstop), chars)
}

/// Indentation string for `columns` screen columns.
fn indent_string(cx: &Cx<'_>, columns: usize) -> String {
    let cfg = cx.config.editor();
    if cfg.expandtab || cfg.tabstop == 0 {
        " ".repeat(columns)
    } else {
        format!("{}{}", "\t".repeat(columns / cfg.tabstop), " ".repeat(columns % cfg.tabstop))
    }
}

fn shift(cx: &mut Cx<'_>, r: OpRange, right: bool) -> Result<(), VimError> {
    let (first, last) = line_span(&r);
    let times = if in_visual(cx) { cx.vim.recorded.count.max(1) } else { 1 };
    let sw = cx.config.editor().shiftwidth.max(1);
    let ts = cx.tabstop();
    let mut first_indent = 0;
    for line in first..=last {
        let text = cx.line(line);
        let (columns, chars) = indent_of(&text, ts);
        let blank = chars == text.chars().count();
        let new_columns = if right {
            if blank {
                columns
            } else {
                columns + sw * times
            }
        } else {
            columns.saturating_sub(sw * times)
        };
        let new_indent = if blank && right { text.clone() } else { indent_string(cx, new_columns) };
        if line == first {
            first_indent = new_indent.chars().count();
        }
        if new_columns != columns {
            cx.replace(Position::new(line, 0), Position::new(line, chars), new_indent, None);
        }
    }
    cx.set_caret(Position::new(first, 0));
    cx.move_by(PositionDiff::ExactCharacter {
        line: 0,
        character: first_indent,
    });
    let n = last - first + 1;
    if cx.cursor_index == 0 && n > cx.config.editor().report {
        let dir = if right { '>' } else { '<' };
        let plural = if times == 1 { "time" } else { "times" };
        cx.info(format!("{n} lines {dir}ed {times} {plural}"));
    }
    Ok(())
}

pub(crate) fn indent(cx: &mut Cx<'_>, r: OpRange) -> Result<(), VimError> {
    shift(cx, r, true)
}

pub(crate) fn outdent(cx: &mut Cx<'_>, r: OpRange) -> Result<(), VimError> {
    shift(cx, r, false)
}

fn host_lines(cx: &mut Cx<'_>, command: HostCommand, first: usize) {
    let meta = cx.meta().with_diff(PositionDiff::ObeyStartOfLine { line: 0 });
    cx.push(core_state::Transformation::HostCommand { command, meta });
    cx.set_caret(Position::new(first, 0));
}

pub(crate) fn reindent(cx: &mut Cx<'_>, r: OpRange) -> Result<(), VimError> {
    let (first_line, last_line) = line_span(&r);
    host_lines(cx, HostCommand::Reindent { first_line, last_line }, first_line);
    Ok(())
}

pub(crate) fn format(cx: &mut Cx<'_>, r: OpRange) -> Result<(), VimError> {
    let (first_line, last_line) = line_span(&r);
    host_lines(cx, HostCommand::Reformat { first_line, last_line }, first_line);
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// Case
// -------------------------------------------------------------------------------------------------

pub(crate) fn toggle_case_str(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            let flipped: Vec<char> = if c.is_uppercase() {
                c.to_lowercase().collect()
            } else if c.is_lowercase() {
                c.to_uppercase().collect()
            } else {
                vec![c]
            };
            flipped
        })
        .collect()
}

fn map_case(cx: &mut Cx<'_>, r: OpRange, f: fn(&str) -> String) -> Result<(), VimError> {
    match r.mode {
        RegisterMode::CharacterWise => {
            let text = cx.editor.text_in_range(r.start, r.end);
            let mapped = f(&text);
            if mapped != text {
                cx.replace(r.start, r.end, mapped, None);
            }
            cx.set_caret(r.start);
        }
        RegisterMode::LineWise => {
            let (first, last) = line_span(&r);
            for line in first..=last {
                let text = cx.line(line);
                let mapped = f(&text);
                if mapped != text {
                    cx.replace(Position::new(line, 0), Position::new(line, text.chars().count()), mapped, None);
                }
            }
            let caret = cx.caret();
            if in_visual(cx) || caret.line != first {
                cx.set_caret(Position::new(first, 0));
            }
            cx.report_lines(last - first + 1, "lines changed");
        }
        RegisterMode::BlockWise => {
            for line in r.start.line..=r.end.line {
                if let Some((from, to)) = block_columns(cx, line, &r) {
                    let start = Position::new(line, from);
                    let end = Position::new(line, to);
                    let text = cx.editor.text_in_range(start, end);
                    let mapped = f(&text);
                    if mapped != text {
                        cx.replace(start, end, mapped, None);
                    }
                }
            }
            let text = cx.line(r.start.line);
            let col = width::char_at_visual_col(&text, r.start.character, cx.tabstop());
            cx.set_caret(Position::new(r.start.line, col));
        }
    }
    Ok(())
}

pub(crate) fn toggle_case(cx: &mut Cx<'_>, r: OpRange) -> Result<(), VimError> {
    map_case(cx, r, toggle_case_str)
}

pub(crate) fn lower(cx: &mut Cx<'_>, r: OpRange) -> Result<(), VimError> {
    map_case(cx, r, str::to_lowercase)
}

pub(crate) fn upper(cx: &mut Cx<'_>, r: OpRange) -> Result<(), VimError> {
    map_case(cx, r, str::to_uppercase)
}

// -------------------------------------------------------------------------------------------------
// Registration
// -------------------------------------------------------------------------------------------------

pub fn register(t: &mut Table) -> Result<(), NotationError> {
    use OperatorKind as K;
    use OperatorSpec as O;
    let m = MOTION_MODES;
    let specs = [
        operator("delete", m, &["d"], O::new(K::Delete, delete))?,
        operator("yank", m, &["y"], O::new(K::Yank, yank))?,
        operator("change", m, &["c"], O::new(K::Change, change))?,
        operator("indent", m, &[">"], O::new(K::Indent, indent))?,
        operator("outdent", m, &["<lt>"], O::new(K::Outdent, outdent))?,
        operator("reindent", m, &["="], O::new(K::Reindent, reindent))?,
        operator("toggle_case", m, &["g~"], O::new(K::ToggleCase, toggle_case))?,
        operator("lower_case", m, &["gu"], O::new(K::Lower, lower))?,
        operator("upper_case", m, &["gU"], O::new(K::Upper, upper))?,
        operator("format", m, &["gq"], O::new(K::Format, format))?,
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
    use core_state::Transformation;
    use pretty_assertions::assert_eq;

    #[test]
    fn toggle_case_handles_expanding_characters() {
        assert_eq!(toggle_case_str("aBc-ß"), "AbC-SS");
    }

    #[test]
    fn deleting_last_lines_takes_the_preceding_break() {
        with_cx(&["a", "b", "c"], |cx| {
            delete(cx, OpRange::lines(1, 2)).unwrap();
            assert_eq!(
                cx.vim.recorded.transformations[0].to_edit(),
                Some(core_model::Edit::Delete {
                    start: Position::new(0, 1),
                    end: Position::new(2, 1),
                })
            );
            assert_eq!(cx.caret(), Position::new(0, 0));
            let reg = cx.registers.get(None).unwrap().unwrap();
            assert_eq!(reg.text(), "b\nc\n");
            assert_eq!(reg.mode(), RegisterMode::LineWise);
        });
    }

    #[test]
    fn block_yank_takes_screen_columns() {
        with_cx(&["abcdef", "ab", "\tbcdef"], |cx| {
            yank(cx, OpRange::block(Position::new(0, 1), Position::new(2, 2))).unwrap();
            let reg = cx.registers.get(None).unwrap().unwrap();
            assert_eq!(reg.mode(), RegisterMode::BlockWise);
            // The tab covers screen columns 0-7, so it is the block's cell on row 2.
            assert_eq!(reg.entries[0].as_lines(), vec!["bc", "b", "\t"]);
        });
    }

    #[test]
    fn shift_right_skips_blank_lines_and_moves_to_indent() {
        with_cx(&["a", "", "b"], |cx| {
            indent(cx, OpRange::lines(0, 2)).unwrap();
            let edits = cx.vim.recorded.transformations.iter().filter(|t| t.is_text()).count();
            assert_eq!(edits, 2);
            assert!(matches!(
                cx.vim.recorded.transformations.last(),
                Some(Transformation::MoveCursor { .. })
            ));
        });
    }
}
