//! Line/character positions and ranges.
//!
//! A `Position` addresses a character (not a byte) inside a line. Positions
//! are plain values: every helper returns a new `Position` and never mutates
//! in place. Helpers that need to know line lengths take a `TextSource`, so
//! the same arithmetic works against the rope `Buffer` and any host editor.
//!
//! Column `len` (one past the last character) is a valid position: it is
//! where Insert mode appends and where the line break "lives" for motions
//! that cross lines. Normal mode clamps it back with [`Position::clamp_normal`].

use std::cmp::Ordering;

/// Read access to line-oriented text.
///
/// `line_count` is always at least 1 (an empty document has one empty line).
/// `line_text` never includes the line terminator and returns an empty string
/// for out-of-range lines.
pub trait TextSource {
    fn line_count(&self) -> usize;
    fn line_text(&self, line: usize) -> String;

    fn line_len(&self, line: usize) -> usize {
        self.line_text(line).chars().count()
    }

    fn last_line(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    /// Text in `[start, end)`, joining lines with `\n`.
    fn text_in_range(&self, start: Position, end: Position) -> String {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let mut out = String::new();
        for line in start.line..=end.line.min(self.last_line()) {
            let chars: Vec<char> = self.line_text(line).chars().collect();
            let from = if line == start.line {
                start.character.min(chars.len())
            } else {
                0
            };
            let to = if line == end.line {
                end.character.min(chars.len())
            } else {
                chars.len()
            };
            if from < to {
                out.extend(&chars[from..to]);
            }
            if line != end.line {
                out.push('\n');
            }
        }
        out
    }
}

impl<T: TextSource + ?Sized> TextSource for &T {
    fn line_count(&self) -> usize {
        (**self).line_count()
    }
    fn line_text(&self, line: usize) -> String {
        (**self).line_text(line)
    }
    fn line_len(&self, line: usize) -> usize {
        (**self).line_len(line)
    }
}

/// Plain vector of lines, handy for tests and scratch computations.
impl TextSource for Vec<String> {
    fn line_count(&self) -> usize {
        self.len().max(1)
    }
    fn line_text(&self, line: usize) -> String {
        self.get(line).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.character.cmp(&other.character))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

impl Position {
    pub const fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }

    pub const fn origin() -> Self {
        Self {
            line: 0,
            character: 0,
        }
    }

    pub fn with_character(self, character: usize) -> Self {
        Self { character, ..self }
    }

    pub fn with_line(self, line: usize) -> Self {
        Self { line, ..self }
    }

    pub fn is_line_beginning(&self) -> bool {
        self.character == 0
    }

    pub fn is_line_end<S: TextSource + ?Sized>(&self, src: &S) -> bool {
        self.character >= src.line_len(self.line)
    }

    pub fn is_at_document_end<S: TextSource + ?Sized>(&self, src: &S) -> bool {
        self.line >= src.last_line() && self.is_line_end(src)
    }

    pub fn line_begin(&self) -> Self {
        self.with_character(0)
    }

    /// One past the last character of the line.
    pub fn line_end<S: TextSource + ?Sized>(&self, src: &S) -> Self {
        self.with_character(src.line_len(self.line))
    }

    /// The last character of the line (column 0 on an empty line).
    pub fn last_char<S: TextSource + ?Sized>(&self, src: &S) -> Self {
        self.with_character(src.line_len(self.line).saturating_sub(1))
    }

    pub fn first_non_blank<S: TextSource + ?Sized>(&self, src: &S) -> Self {
        self.with_character(first_non_blank_col(&src.line_text(self.line)))
    }

    pub fn document_begin() -> Self {
        Self::origin()
    }

    pub fn document_end<S: TextSource + ?Sized>(src: &S) -> Self {
        let line = src.last_line();
        Self::new(line, src.line_len(line))
    }

    pub fn get_left(&self) -> Self {
        self.with_character(self.character.saturating_sub(1))
    }

    /// Right one character, stopping at one past the last character.
    pub fn get_right<S: TextSource + ?Sized>(&self, src: &S) -> Self {
        let len = src.line_len(self.line);
        self.with_character((self.character + 1).min(len))
    }

    /// Left one character, wrapping to the end of the previous line. With
    /// `include_eol` the wrap lands on the line-break position, otherwise on
    /// the last character.
    pub fn get_left_through_line_breaks<S: TextSource + ?Sized>(
        &self,
        src: &S,
        include_eol: bool,
    ) -> Self {
        if self.character > 0 {
            return self.get_left();
        }
        if self.line == 0 {
            return *self;
        }
        let prev = self.line - 1;
        let len = src.line_len(prev);
        let character = if include_eol { len } else { len.saturating_sub(1) };
        Self::new(prev, character)
    }

    /// Right one character, wrapping to the start of the next line. Without
    /// `include_eol` the last character wraps directly.
    pub fn get_right_through_line_breaks<S: TextSource + ?Sized>(
        &self,
        src: &S,
        include_eol: bool,
    ) -> Self {
        let len = src.line_len(self.line);
        let wrap_at = if include_eol { len } else { len.saturating_sub(1) };
        if self.character < wrap_at {
            return self.with_character(self.character + 1);
        }
        if self.line >= src.last_line() {
            return self.with_character(len.min(self.character + 1));
        }
        Self::new(self.line + 1, 0)
    }

    pub fn get_up(&self, desired_column: usize) -> Self {
        if self.line == 0 {
            return *self;
        }
        Self::new(self.line - 1, desired_column)
    }

    pub fn get_down<S: TextSource + ?Sized>(&self, src: &S, desired_column: usize) -> Self {
        if self.line >= src.last_line() {
            return *self;
        }
        Self::new(self.line + 1, desired_column)
    }

    /// Clamp to an existing line and to `0..=len`.
    pub fn clamp_to<S: TextSource + ?Sized>(&self, src: &S) -> Self {
        let line = self.line.min(src.last_line());
        let len = src.line_len(line);
        Self::new(line, self.character.min(len))
    }

    /// Clamp for Normal mode, where the cursor rests on a character.
    pub fn clamp_normal<S: TextSource + ?Sized>(&self, src: &S) -> Self {
        let line = self.line.min(src.last_line());
        let len = src.line_len(line);
        Self::new(line, self.character.min(len.saturating_sub(1)))
    }

    /// Where a cursor ends up after `text` is inserted at this position.
    pub fn advance_by_text(&self, text: &str) -> Self {
        let mut pos = *self;
        for c in text.chars() {
            if c == '\n' {
                pos.line += 1;
                pos.character = 0;
            } else {
                pos.character += 1;
            }
        }
        pos
    }

    /// Move `offset` characters through the document, counting each line
    /// break as one character.
    pub fn offset_through_line_breaks<S: TextSource + ?Sized>(&self, src: &S, offset: isize) -> Self {
        let mut pos = self.clamp_to(src);
        if offset >= 0 {
            for _ in 0..offset {
                let next = pos.get_right_through_line_breaks(src, true);
                if next == pos {
                    break;
                }
                pos = next;
            }
        } else {
            for _ in 0..offset.unsigned_abs() {
                let prev = pos.get_left_through_line_breaks(src, true);
                if prev == pos {
                    break;
                }
                pos = prev;
            }
        }
        pos
    }

    /// Apply a post-edit correction.
    pub fn apply_diff<S: TextSource + ?Sized>(
        &self,
        src: &S,
        diff: PositionDiff,
        start_of_line: bool,
    ) -> Self {
        match diff {
            PositionDiff::Offset { line, character } => {
                let line = offset_usize(self.line, line);
                let character = offset_usize(self.character, character);
                Self::new(line, character).clamp_to(src)
            }
            PositionDiff::ExactCharacter { line, character } => {
                Self::new(offset_usize(self.line, line), character).clamp_to(src)
            }
            PositionDiff::Exact(pos) => pos.clamp_to(src),
            PositionDiff::ObeyStartOfLine { line } => {
                let moved = Self::new(offset_usize(self.line, line), self.character).clamp_to(src);
                if start_of_line {
                    moved.first_non_blank(src)
                } else {
                    moved
                }
            }
        }
    }
}

fn offset_usize(base: usize, delta: isize) -> usize {
    if delta >= 0 {
        base.saturating_add(delta as usize)
    } else {
        base.saturating_sub(delta.unsigned_abs())
    }
}

/// Column of the first non-blank character, or the line length for an
/// all-blank line.
pub fn first_non_blank_col(line: &str) -> usize {
    line.chars()
        .position(|c| !c.is_whitespace())
        .unwrap_or_else(|| line.chars().count())
}

/// Correction applied to a cursor after its edits are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionDiff {
    /// Relative line and character offset.
    Offset { line: isize, character: isize },
    /// Relative line offset with an absolute column.
    ExactCharacter { line: isize, character: usize },
    /// Absolute position in post-edit coordinates.
    Exact(Position),
    /// Relative line offset; lands on the first non-blank when
    /// `startofline` is set, otherwise keeps the column.
    ObeyStartOfLine { line: isize },
}

impl PositionDiff {
    pub const fn identity() -> Self {
        Self::Offset {
            line: 0,
            character: 0,
        }
    }

    pub const fn characters(character: isize) -> Self {
        Self::Offset { line: 0, character }
    }

    /// Moves a caret sitting at an insertion point to just past `text`.
    pub fn over_text(text: &str) -> Self {
        let lines = text.matches('\n').count();
        if lines == 0 {
            return Self::characters(text.chars().count() as isize);
        }
        let tail = text.rsplit('\n').next().unwrap_or_default();
        Self::ExactCharacter {
            line: lines as isize,
            character: tail.chars().count(),
        }
    }
}

/// Ordered pair of positions. `start` is the anchor, `stop` the moving end;
/// `start` may come after `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub stop: Position,
}

/// A cursor is a range whose `stop` is the caret.
pub type Cursor = Range;

impl Range {
    pub const fn new(start: Position, stop: Position) -> Self {
        Self { start, stop }
    }

    pub const fn at(pos: Position) -> Self {
        Self {
            start: pos,
            stop: pos,
        }
    }

    pub fn sorted(&self) -> (Position, Position) {
        if self.start <= self.stop {
            (self.start, self.stop)
        } else {
            (self.stop, self.start)
        }
    }

    pub fn normalized(&self) -> Self {
        let (start, stop) = self.sorted();
        Self { start, stop }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }

    pub fn swapped(&self) -> Self {
        Self {
            start: self.stop,
            stop: self.start,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        let (s, e) = self.sorted();
        s <= pos && pos <= e
    }

    /// True when the ranges share more than a single boundary point.
    pub fn overlaps(&self, other: &Range) -> bool {
        let (a0, a1) = self.sorted();
        let (b0, b1) = other.sorted();
        a0.max(b0) < a1.min(b1)
    }
}
