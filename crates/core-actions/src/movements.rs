//! Cursor motions. Every motion is also an operator target.

use crate::action::{ColumnPolicy, Cx, MoveOutcome, MovementResult, MovementSpec, OperatorKind};
use crate::catalog::{MOTION_MODES, Table, movement};
use core_events::NotationError;
use core_keymap::ContextFlags;
use core_state::{DESIRED_EOL, LastFind, ModeSet, SearchDirection, SearchState, VimError};
use core_text::{Position, TextSource, matching, motion, width};

// -------------------------------------------------------------------------------------------------
// Character and line motions
// -------------------------------------------------------------------------------------------------

fn left(_cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    if pos.character == 0 {
        return MoveOutcome::Failed;
    }
    MoveOutcome::To(pos.with_character(pos.character.saturating_sub(count)))
}

fn right(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let len = cx.line_len(pos.line);
    let limit = if cx.operator.is_some() {
        len
    } else {
        len.saturating_sub(1)
    };
    if pos.character >= limit {
        return MoveOutcome::Failed;
    }
    MoveOutcome::To(pos.with_character((pos.character + count).min(limit)))
}

fn left_wrapping(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let mut p = pos;
    for _ in 0..count {
        let next = p.get_left_through_line_breaks(cx.editor, false);
        if next == p {
            break;
        }
        p = next;
    }
    if p == pos { MoveOutcome::Failed } else { MoveOutcome::To(p) }
}

fn right_wrapping(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let include_eol = cx.operator.is_some();
    let mut p = pos;
    for _ in 0..count {
        let next = p.get_right_through_line_breaks(cx.editor, include_eol);
        if next == p {
            break;
        }
        p = next;
    }
    if p == pos { MoveOutcome::Failed } else { MoveOutcome::To(p) }
}

/// Character column on `line` that `desired_column` (a screen column) maps to.
pub(crate) fn column_for(cx: &Cx<'_>, line: usize) -> usize {
    let text = cx.line(line);
    if cx.vim.desired_column == DESIRED_EOL {
        return text.chars().count().saturating_sub(1);
    }
    width::char_at_visual_col(&text, cx.vim.desired_column, cx.tabstop())
}

fn vertical(cx: &mut Cx<'_>, pos: Position, delta: isize) -> MoveOutcome {
    let last = cx.last_line() as isize;
    let target = (pos.line as isize + delta).clamp(0, last) as usize;
    if target == pos.line {
        return MoveOutcome::Failed;
    }
    MoveOutcome::To(Position::new(target, column_for(cx, target)))
}

fn down(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    vertical(cx, pos, count as isize)
}

fn up(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    vertical(cx, pos, -(count as isize))
}

fn line_start(_cx: &mut Cx<'_>, pos: Position, _count: usize) -> MoveOutcome {
    MoveOutcome::To(pos.line_begin())
}

fn first_non_blank(cx: &mut Cx<'_>, pos: Position, _count: usize) -> MoveOutcome {
    MoveOutcome::To(pos.first_non_blank(cx.editor))
}

fn count_line(cx: &Cx<'_>, pos: Position, count: usize) -> usize {
    (pos.line + count.saturating_sub(1)).min(cx.last_line())
}

fn line_end(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let line = count_line(cx, pos, count);
    MoveOutcome::To(Position::new(line, cx.line_len(line).saturating_sub(1)))
}

fn last_non_blank(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let line = count_line(cx, pos, count);
    let text: Vec<char> = cx.line(line).chars().collect();
    let col = text.iter().rposition(|c| !c.is_whitespace()).unwrap_or(0);
    MoveOutcome::To(Position::new(line, col))
}

fn first_non_blank_down_less_one(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let line = count_line(cx, pos, count);
    MoveOutcome::To(Position::new(line, 0).first_non_blank(cx.editor))
}

fn first_non_blank_down(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    if pos.line >= cx.last_line() {
        return MoveOutcome::Failed;
    }
    let line = (pos.line + count).min(cx.last_line());
    MoveOutcome::To(Position::new(line, 0).first_non_blank(cx.editor))
}

fn first_non_blank_up(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    if pos.line == 0 {
        return MoveOutcome::Failed;
    }
    let line = pos.line.saturating_sub(count);
    MoveOutcome::To(Position::new(line, 0).first_non_blank(cx.editor))
}

fn screen_column(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let text = cx.line(pos.line);
    let col = width::char_at_visual_col(&text, count.saturating_sub(1), cx.tabstop());
    MoveOutcome::To(pos.with_character(col.min(text.chars().count().saturating_sub(1))))
}

fn jump_to_line(cx: &Cx<'_>, line: usize) -> Position {
    let line = line.min(cx.last_line());
    if cx.config.editor().startofline {
        Position::new(line, 0).first_non_blank(cx.editor)
    } else {
        Position::new(line, column_for(cx, line)).clamp_to(cx.editor)
    }
}

fn goto_first_line(cx: &mut Cx<'_>, _pos: Position, count: usize) -> MoveOutcome {
    let line = count.saturating_sub(1);
    MoveOutcome::To(jump_to_line(cx, line))
}

fn goto_last_line(cx: &mut Cx<'_>, _pos: Position, count: usize) -> MoveOutcome {
    let line = if count == 0 { cx.last_line() } else { count - 1 };
    MoveOutcome::To(jump_to_line(cx, line))
}

/// The operator's own key repeated (`dd`, `3yy`, `g~~`).
fn current_lines(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let last = count_line(cx, pos, count);
    MoveOutcome::Span(
        MovementResult::span(Position::new(pos.line, 0), Position::new(last, 0)).linewise(true),
    )
}

// -------------------------------------------------------------------------------------------------
// Word motions
// -------------------------------------------------------------------------------------------------

fn word_forward(cx: &mut Cx<'_>, pos: Position, count: usize, big: bool) -> MoveOutcome {
    if cx.operator == Some(OperatorKind::Change) {
        let here = cx.line(pos.line).chars().nth(pos.character);
        if here.is_some_and(|c| !c.is_whitespace()) {
            return change_word_end(cx, pos, count, big);
        }
    }
    let mut p = pos;
    for i in 0..count {
        let next = motion::next_word_start(cx.editor, p, cx.words, big);
        if cx.operator.is_some() && i + 1 == count && next.line > p.line {
            // The last word moved over ends the line: the operated text ends there too.
            return MoveOutcome::To(Position::new(p.line, cx.line_len(p.line)));
        }
        if next == p {
            break;
        }
        p = next;
    }
    if p == pos { MoveOutcome::Failed } else { MoveOutcome::To(p) }
}

/// `cw` on a non-blank: like `ce`, but a word's last character is its own end.
fn change_word_end(cx: &mut Cx<'_>, pos: Position, count: usize, big: bool) -> MoveOutcome {
    let mut p = pos;
    for i in 0..count {
        let run_end = motion::class_run_at(cx.editor, p, cx.words, big).map(|(_, end)| end);
        if i == 0 && run_end == Some(p) {
            continue;
        }
        p = motion::word_end(cx.editor, p, cx.words, big);
    }
    MoveOutcome::Span(MovementResult::to(p).inclusive(true))
}

fn repeat_word<F>(cx: &mut Cx<'_>, pos: Position, count: usize, step: F) -> MoveOutcome
where
    F: Fn(&Cx<'_>, Position) -> Position,
{
    let mut p = pos;
    for _ in 0..count {
        let next = step(cx, p);
        if next == p {
            break;
        }
        p = next;
    }
    if p == pos { MoveOutcome::Failed } else { MoveOutcome::To(p) }
}

fn word(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    word_forward(cx, pos, count, false)
}

fn big_word(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    word_forward(cx, pos, count, true)
}

fn word_back(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    repeat_word(cx, pos, count, |cx, p| motion::prev_word_start(cx.editor, p, cx.words, false))
}

fn big_word_back(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    repeat_word(cx, pos, count, |cx, p| motion::prev_word_start(cx.editor, p, cx.words, true))
}

fn word_end(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    repeat_word(cx, pos, count, |cx, p| motion::word_end(cx.editor, p, cx.words, false))
}

fn big_word_end(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    repeat_word(cx, pos, count, |cx, p| motion::word_end(cx.editor, p, cx.words, true))
}

fn word_end_back(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    repeat_word(cx, pos, count, |cx, p| motion::prev_word_end(cx.editor, p, cx.words, false))
}

fn big_word_end_back(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    repeat_word(cx, pos, count, |cx, p| motion::prev_word_end(cx.editor, p, cx.words, true))
}

// -------------------------------------------------------------------------------------------------
// Paragraphs, sentences and pairs
// -------------------------------------------------------------------------------------------------

fn paragraph_forward(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    repeat_word(cx, pos, count, |cx, p| motion::next_paragraph_boundary(cx.editor, p))
}

fn paragraph_back(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    repeat_word(cx, pos, count, |cx, p| motion::prev_paragraph_boundary(cx.editor, p))
}

fn sentence_forward(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    repeat_word(cx, pos, count, |cx, p| motion::next_sentence_start(cx.editor, p))
}

fn sentence_back(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    repeat_word(cx, pos, count, |cx, p| motion::prev_sentence_start(cx.editor, p))
}

/// `%` jumps to the matching pair; `N%` to N percent of the file.
fn percent(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    if count > 0 {
        let lines = cx.editor.line_count();
        let line = ((count.min(100) * lines).div_ceil(100)).saturating_sub(1);
        let target = Position::new(line, 0).first_non_blank(cx.editor);
        return MoveOutcome::Span(MovementResult::to(target).linewise(true).inclusive(false));
    }
    match matching::matching_pair(cx.editor, pos, cx.pairs) {
        Some(p) => MoveOutcome::To(p),
        None => MoveOutcome::Failed,
    }
}

// -------------------------------------------------------------------------------------------------
// f F t T ; ,
// -------------------------------------------------------------------------------------------------

fn find_in_line(cx: &Cx<'_>, pos: Position, count: usize, find: LastFind, repeat: bool) -> Option<Position> {
    let chars: Vec<char> = cx.line(pos.line).chars().collect();
    let at = pos.character;
    let mut found = 0;
    if find.forward() {
        let skip = if find.till() && repeat { 2 } else { 1 };
        for j in (at + skip)..chars.len() {
            if chars[j] == find.target {
                found += 1;
                if found == count {
                    return Some(pos.with_character(if find.till() { j - 1 } else { j }));
                }
            }
        }
    } else {
        let end = if find.till() && repeat { at.saturating_sub(1) } else { at };
        for j in (0..end.min(chars.len())).rev() {
            if chars[j] == find.target {
                found += 1;
                if found == count {
                    return Some(pos.with_character(if find.till() { j + 1 } else { j }));
                }
            }
        }
    }
    None
}

fn find_outcome(cx: &Cx<'_>, pos: Position, count: usize, find: LastFind, repeat: bool) -> MoveOutcome {
    match find_in_line(cx, pos, count, find, repeat) {
        Some(p) => MoveOutcome::Span(MovementResult::to(p).inclusive(find.forward())),
        None => MoveOutcome::Failed,
    }
}

fn find_char(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let (Some(kind), Some(target)) = (cx.keys.first().and_then(|k| k.as_char()), cx.last_key_char()) else {
        return MoveOutcome::Failed;
    };
    let find = LastFind { kind, target };
    cx.vim.last_find = Some(find);
    find_outcome(cx, pos, count, find, false)
}

fn repeat_find(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    match cx.vim.last_find {
        Some(find) => find_outcome(cx, pos, count, find, true),
        None => MoveOutcome::Failed,
    }
}

fn repeat_find_reversed(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    match cx.vim.last_find {
        Some(find) => find_outcome(cx, pos, count, find.reversed(), true),
        None => MoveOutcome::Failed,
    }
}

// -------------------------------------------------------------------------------------------------
// Search motions
// -------------------------------------------------------------------------------------------------

/// Step through matches of the current search `count` times.
pub(crate) fn search_step(
    cx: &mut Cx<'_>,
    pos: Position,
    count: usize,
    direction: SearchDirection,
) -> MoveOutcome {
    let Some(mut search) = cx.globals.search.take() else {
        cx.error(&VimError::NoPreviousPattern);
        return MoveOutcome::Failed;
    };
    let document = cx.editor.document_name();
    let version = cx.editor.version();
    let wrapscan = cx.config.search().wrapscan;
    let mut from = pos;
    let mut last = None;
    for _ in 0..count.max(1) {
        match search.next_match(cx.editor, &document, version, from, direction, wrapscan) {
            Ok(hit) => {
                if hit.wrapped && cx.cursor_index == 0 {
                    cx.info(match direction {
                        SearchDirection::Forward => "search hit BOTTOM, continuing at TOP",
                        SearchDirection::Backward => "search hit TOP, continuing at BOTTOM",
                    });
                }
                from = hit.found.start;
                last = Some(hit.found);
            }
            Err(e) => {
                cx.error(&e);
                cx.globals.search = Some(search);
                return MoveOutcome::Failed;
            }
        }
    }
    let outcome = match last {
        Some(found) => {
            let target = search.apply_offset(cx.editor, found);
            MoveOutcome::Span(
                MovementResult::to(target.position)
                    .inclusive(target.inclusive)
                    .linewise(target.linewise),
            )
        }
        None => MoveOutcome::Failed,
    };
    cx.globals.search = Some(search);
    outcome
}

fn search_next(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let direction = cx.globals.search.as_ref().map(|s| s.direction).unwrap_or_default();
    search_step(cx, pos, count, direction)
}

fn search_previous(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let direction = cx
        .globals
        .search
        .as_ref()
        .map(|s| s.direction.reversed())
        .unwrap_or(SearchDirection::Backward);
    search_step(cx, pos, count, direction)
}

fn search_word(cx: &mut Cx<'_>, pos: Position, count: usize, direction: SearchDirection) -> MoveOutcome {
    let Some((start, word)) = motion::keyword_at_or_after(cx.editor, pos, cx.words) else {
        cx.error(&VimError::NoStringUnderCursor);
        return MoveOutcome::Failed;
    };
    let search = SearchState::whole_word(direction, &word, pos, cx.config.search());
    cx.registers.put_engine_register('/', search.pattern.clone());
    cx.globals.push_search_history(&search.pattern);
    cx.globals.search = Some(search);
    search_step(cx, start, count, direction)
}

fn star(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    search_word(cx, pos, count, SearchDirection::Forward)
}

fn hash(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    search_word(cx, pos, count, SearchDirection::Backward)
}

// -------------------------------------------------------------------------------------------------
// Registration
// -------------------------------------------------------------------------------------------------

/// Doubled operator keys: `dd yy cc << >> ==` under any pending operator,
/// `g~~ guu gUU gqq` (and `g~g~`, `gugu`, `gUgU`, `gqgq`) under a case operator.
pub fn register_doubled(t: &mut Table) -> Result<(), NotationError> {
    t.push(
        movement(
            "current_lines",
            ModeSet::NORMAL,
            &["d", "y", "c", "<lt>", ">", "="],
            MovementSpec::linewise(current_lines),
        )?
        .requires(ContextFlags::OPERATOR),
    );
    t.push(
        movement(
            "current_lines_case",
            ModeSet::NORMAL,
            &["~", "u", "U", "q", "g~", "gu", "gU", "gq"],
            MovementSpec::linewise(current_lines),
        )?
        .requires(ContextFlags::OPERATOR | ContextFlags::CASE_OPERATOR),
    );
    Ok(())
}

pub fn register(t: &mut Table) -> Result<(), NotationError> {
    use MovementSpec as M;
    let m = MOTION_MODES;
    let specs = [
        movement("left", m, &["h", "<Left>", "<C-h>"], M::exclusive(left))?,
        movement("right", m, &["l", "<Right>"], M::exclusive(right))?,
        movement("left_wrapping", m, &["<BS>"], M::exclusive(left_wrapping))?,
        movement("right_wrapping", m, &["<Space>"], M::exclusive(right_wrapping))?,
        movement("down", m, &["j", "<Down>", "<C-j>", "<C-n>"], M::linewise(down))?,
        movement("up", m, &["k", "<Up>", "<C-p>"], M::linewise(up))?,
        movement("line_start", m, &["0", "<Home>"], M::exclusive(line_start))?,
        movement("first_non_blank", m, &["^"], M::exclusive(first_non_blank))?,
        movement(
            "line_end",
            m,
            &["$", "<End>"],
            M::inclusive(line_end).column(ColumnPolicy::EndOfLine),
        )?,
        movement("last_non_blank", m, &["g_"], M::inclusive(last_non_blank))?,
        movement("line_first_non_blank", m, &["_"], M::linewise(first_non_blank_down_less_one))?,
        movement("next_line_start", m, &["+", "<CR>"], M::linewise(first_non_blank_down))?,
        movement("prev_line_start", m, &["-"], M::linewise(first_non_blank_up))?,
        movement("screen_column", m, &["<Bar>"], M::exclusive(screen_column))?,
        movement("goto_first_line", m, &["gg", "<C-Home>"], M::linewise(goto_first_line).raw_count())?,
        movement("goto_last_line", m, &["G", "<C-End>"], M::linewise(goto_last_line).raw_count())?,
        movement("word", m, &["w", "<S-Right>"], M::exclusive(word))?,
        movement("big_word", m, &["W"], M::exclusive(big_word))?,
        movement("word_back", m, &["b", "<S-Left>"], M::exclusive(word_back))?,
        movement("big_word_back", m, &["B"], M::exclusive(big_word_back))?,
        movement("word_end", m, &["e"], M::inclusive(word_end))?,
        movement("big_word_end", m, &["E"], M::inclusive(big_word_end))?,
        movement("word_end_back", m, &["ge"], M::inclusive(word_end_back))?,
        movement("big_word_end_back", m, &["gE"], M::inclusive(big_word_end_back))?,
        movement("paragraph_forward", m, &["}"], M::exclusive(paragraph_forward))?,
        movement("paragraph_back", m, &["{"], M::exclusive(paragraph_back))?,
        movement("sentence_forward", m, &[")"], M::exclusive(sentence_forward))?,
        movement("sentence_back", m, &["("], M::exclusive(sentence_back))?,
        movement("match_pair", m, &["%"], M::inclusive(percent).raw_count())?,
        movement("find", m, &["f<character>", "F<character>", "t<character>", "T<character>"], M::exclusive(find_char))?,
        movement("repeat_find", m, &[";"], M::exclusive(repeat_find))?,
        movement("repeat_find_reversed", m, &[","], M::exclusive(repeat_find_reversed))?,
        movement("search_next", m, &["n"], M::exclusive(search_next))?,
        movement("search_previous", m, &["N"], M::exclusive(search_previous))?,
        movement("search_word_forward", m, &["*"], M::exclusive(star))?,
        movement("search_word_backward", m, &["#"], M::exclusive(hash))?,
    ];
    for spec in specs {
        t.push(spec);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motions_register_without_notation_errors() {
        let mut t = Table::new();
        register_doubled(&mut t).unwrap();
        register(&mut t).unwrap();
        assert!(t.iter().any(|(_, s)| s.name == "find"));
    }
}
