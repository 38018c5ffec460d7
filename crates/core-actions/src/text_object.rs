//! Text objects (`iw`, `a(`, `it`, ...).
//!
//! Text objects are movements that also move the range start. They are
//! available after an operator and in the visual modes. Non-empty results
//! are inclusive spans; an empty inner object (`i(` on `()`) is an empty
//! exclusive span, which operators treat as a no-op.

use crate::action::{Cx, MotionFn, MoveOutcome, MovementResult, MovementSpec};
use crate::catalog::{Table, movement};
use core_events::NotationError;
use core_keymap::ContextFlags;
use core_state::ModeSet;
use core_text::motion::{class_run_at, paragraph_lines, sentence_at};
use core_text::{Position, TextSource, matching};

fn inclusive(start: Position, end: Position) -> MoveOutcome {
    MoveOutcome::Span(MovementResult::span(start, end).inclusive(true).linewise(false))
}

fn empty_at(pos: Position) -> MoveOutcome {
    MoveOutcome::Span(MovementResult::span(pos, pos).inclusive(false).linewise(false))
}

fn lines(first: usize, last: usize) -> MoveOutcome {
    MoveOutcome::Span(
        MovementResult::span(Position::new(first, 0), Position::new(last, 0)).linewise(true),
    )
}

// -------------------------------------------------------------------------------------------------
// Words
// -------------------------------------------------------------------------------------------------

fn is_blank(c: Option<&char>) -> bool {
    c.is_some_and(|c| c.is_whitespace())
}

fn run_end(cx: &Cx<'_>, pos: Position, big: bool) -> Option<Position> {
    class_run_at(cx.editor, pos, cx.words, big).map(|(_, end)| end)
}

fn word_object(cx: &mut Cx<'_>, pos: Position, count: usize, big: bool, around: bool) -> MoveOutcome {
    let chars: Vec<char> = cx.line(pos.line).chars().collect();
    let Some((mut start, mut end)) = class_run_at(cx.editor, pos, cx.words, big) else {
        return empty_at(pos);
    };
    let on_blank = is_blank(chars.get(pos.character));
    // Inner objects count white space runs as words; `aw` on white space
    // takes the blank run and the word after it.
    let runs = match (around, on_blank) {
        (false, _) => count,
        (true, true) => count * 2,
        (true, false) => count * 2 - 1,
    };
    for _ in 1..runs {
        match run_end(cx, end.with_character(end.character + 1), big) {
            Some(next) => end = next,
            None => break,
        }
    }
    if around && !on_blank {
        if is_blank(chars.get(end.character + 1)) {
            end = run_end(cx, end.with_character(end.character + 1), big).unwrap_or(end);
        } else if start.character > 0 && is_blank(chars.get(start.character - 1)) {
            if let Some((s, _)) = class_run_at(cx.editor, start.with_character(start.character - 1), cx.words, big) {
                start = s;
            }
        }
    }
    inclusive(start, end)
}

fn inner_word(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    word_object(cx, pos, count, false, false)
}

fn a_word(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    word_object(cx, pos, count, false, true)
}

fn inner_big_word(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    word_object(cx, pos, count, true, false)
}

fn a_big_word(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    word_object(cx, pos, count, true, true)
}

// -------------------------------------------------------------------------------------------------
// Sentences and paragraphs
// -------------------------------------------------------------------------------------------------

fn sentence_object(cx: &mut Cx<'_>, pos: Position, around: bool) -> MoveOutcome {
    let (start, mut end) = sentence_at(cx.editor, pos);
    if around {
        let chars: Vec<char> = cx.line(end.line).chars().collect();
        let mut col = end.character + 1;
        while col < chars.len() && chars[col].is_whitespace() {
            end = end.with_character(col);
            col += 1;
        }
    }
    inclusive(start, end)
}

fn inner_sentence(cx: &mut Cx<'_>, pos: Position, _count: usize) -> MoveOutcome {
    sentence_object(cx, pos, false)
}

fn a_sentence(cx: &mut Cx<'_>, pos: Position, _count: usize) -> MoveOutcome {
    sentence_object(cx, pos, true)
}

fn is_blank_line(src: &dyn core_model::TextEditor, line: usize) -> bool {
    src.line_text(line).trim().is_empty()
}

fn inner_paragraph(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let (first, mut last) = paragraph_lines(cx.editor, pos.line);
    for _ in 1..count {
        if last >= cx.last_line() {
            break;
        }
        last = paragraph_lines(cx.editor, last + 1).1;
    }
    lines(first, last)
}

/// A paragraph plus the blank lines after it (or before it at the end of
/// the buffer). Starting on blank lines, the paragraph after them.
fn a_paragraph(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    let (mut first, mut last) = paragraph_lines(cx.editor, pos.line);
    let starts_blank = is_blank_line(cx.editor, pos.line);
    for i in 0..count {
        let blocks = if i == 0 { 1 } else { 2 };
        for _ in 0..blocks {
            if last >= cx.last_line() {
                break;
            }
            last = paragraph_lines(cx.editor, last + 1).1;
        }
    }
    let ends_blank = is_blank_line(cx.editor, last);
    if !starts_blank && !ends_blank && first > 0 {
        let (before, _) = paragraph_lines(cx.editor, first - 1);
        if is_blank_line(cx.editor, first - 1) {
            first = before;
        }
    }
    lines(first, last)
}

// -------------------------------------------------------------------------------------------------
// Brackets, quotes and tags
// -------------------------------------------------------------------------------------------------

fn bracket_object(cx: &mut Cx<'_>, pos: Position, count: usize, open: char, close: char, around: bool) -> MoveOutcome {
    let Some((o, c)) = matching::enclosing_pair(cx.editor, pos, open, close, count) else {
        return MoveOutcome::Failed;
    };
    if around {
        return inclusive(o, c);
    }
    let mut start = Position::new(o.line, o.character + 1);
    if start.character >= cx.line_len(o.line) && o.line < c.line {
        start = Position::new(o.line + 1, 0);
    }
    let before_close: String = cx.line(c.line).chars().take(c.character).collect();
    if c.line > start.line && before_close.trim().is_empty() {
        // `{` and `}` on lines of their own: the lines in between.
        if start.character == 0 {
            return lines(start.line, c.line - 1);
        }
        let prev = c.line - 1;
        return MoveOutcome::Span(
            MovementResult::span(start, Position::new(prev, cx.line_len(prev))).inclusive(false).linewise(false),
        );
    }
    if start == c {
        return empty_at(c);
    }
    MoveOutcome::Span(MovementResult::span(start, c).inclusive(false).linewise(false))
}

fn quote_object(cx: &mut Cx<'_>, pos: Position, quote: char, around: bool) -> MoveOutcome {
    let Some((a, b)) = matching::quote_pair(cx.editor, pos, quote) else {
        return MoveOutcome::Failed;
    };
    if !around {
        if b.character == a.character + 1 {
            return empty_at(b);
        }
        return inclusive(a.with_character(a.character + 1), b.with_character(b.character - 1));
    }
    let chars: Vec<char> = cx.line(pos.line).chars().collect();
    let mut start = a;
    let mut end = b;
    let mut col = b.character + 1;
    while col < chars.len() && chars[col].is_whitespace() {
        end = end.with_character(col);
        col += 1;
    }
    if end == b {
        while start.character > 0 && chars[start.character - 1].is_whitespace() {
            start = start.with_character(start.character - 1);
        }
    }
    inclusive(start, end)
}

fn tag_object(cx: &mut Cx<'_>, pos: Position, count: usize, around: bool) -> MoveOutcome {
    let Some(tag) = matching::tag_pair(cx.editor, pos, count) else {
        return MoveOutcome::Failed;
    };
    if around {
        return inclusive(tag.open_start, tag.close_end);
    }
    let start = tag.open_end.offset_through_line_breaks(cx.editor, 1);
    if start == tag.close_start {
        return empty_at(start);
    }
    MoveOutcome::Span(MovementResult::span(start, tag.close_start).inclusive(false).linewise(false))
}

macro_rules! pair_objects {
    ($($inner:ident, $around:ident => $open:literal, $close:literal;)*) => {
        $(
            fn $inner(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
                bracket_object(cx, pos, count, $open, $close, false)
            }
            fn $around(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
                bracket_object(cx, pos, count, $open, $close, true)
            }
        )*
    };
}

pair_objects! {
    inner_paren, a_paren => '(', ')';
    inner_brace, a_brace => '{', '}';
    inner_bracket, a_bracket => '[', ']';
    inner_angle, a_angle => '<', '>';
}

macro_rules! quote_objects {
    ($($inner:ident, $around:ident => $quote:literal;)*) => {
        $(
            fn $inner(cx: &mut Cx<'_>, pos: Position, _count: usize) -> MoveOutcome {
                quote_object(cx, pos, $quote, false)
            }
            fn $around(cx: &mut Cx<'_>, pos: Position, _count: usize) -> MoveOutcome {
                quote_object(cx, pos, $quote, true)
            }
        )*
    };
}

quote_objects! {
    inner_double_quote, a_double_quote => '"';
    inner_single_quote, a_single_quote => '\'';
    inner_backtick, a_backtick => '`';
}

fn inner_tag(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    tag_object(cx, pos, count, false)
}

fn a_tag(cx: &mut Cx<'_>, pos: Position, count: usize) -> MoveOutcome {
    tag_object(cx, pos, count, true)
}

// -------------------------------------------------------------------------------------------------
// Registration
// -------------------------------------------------------------------------------------------------

pub fn register(t: &mut Table) -> Result<(), NotationError> {
    let objects: &[(&'static str, &[&str], MotionFn)] = &[
        ("inner_word", &["iw"], inner_word),
        ("a_word", &["aw"], a_word),
        ("inner_big_word", &["iW"], inner_big_word),
        ("a_big_word", &["aW"], a_big_word),
        ("inner_sentence", &["is"], inner_sentence),
        ("a_sentence", &["as"], a_sentence),
        ("inner_paragraph", &["ip"], inner_paragraph),
        ("a_paragraph", &["ap"], a_paragraph),
        ("inner_paren", &["i(", "i)", "ib"], inner_paren),
        ("a_paren", &["a(", "a)", "ab"], a_paren),
        ("inner_brace", &["i{", "i}", "iB"], inner_brace),
        ("a_brace", &["a{", "a}", "aB"], a_brace),
        ("inner_bracket", &["i[", "i]"], inner_bracket),
        ("a_bracket", &["a[", "a]"], a_bracket),
        ("inner_angle", &["i<lt>", "i>"], inner_angle),
        ("a_angle", &["a<lt>", "a>"], a_angle),
        ("inner_double_quote", &["i\""], inner_double_quote),
        ("a_double_quote", &["a\""], a_double_quote),
        ("inner_single_quote", &["i'"], inner_single_quote),
        ("a_single_quote", &["a'"], a_single_quote),
        ("inner_backtick", &["i`"], inner_backtick),
        ("a_backtick", &["a`"], a_backtick),
        ("inner_tag", &["it"], inner_tag),
        ("a_tag", &["at"], a_tag),
    ];
    for &(name, keys, run) in objects {
        let spec = MovementSpec::exclusive(run).text_object();
        t.push(movement(name, ModeSet::NORMAL, keys, spec)?.requires(ContextFlags::OPERATOR));
        t.push(movement(name, ModeSet::ANY_VISUAL, keys, spec)?);
    }
    Ok(())
}
