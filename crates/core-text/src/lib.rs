//! Text primitives for the keystroke engine: positions, ranges, boundary
//! search and a rope-backed buffer.

use ropey::Rope;

pub mod matching;
pub mod motion;
pub mod position;
pub mod width;

pub use matching::MatchPairs;
pub use motion::{CharClass, DocWalker, WordChars};
pub use position::{Cursor, Position, PositionDiff, Range, TextSource, first_non_blank_col};

/// A text buffer backed by a `ropey::Rope`, addressed by line/character.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("lines", &self.line_count())
            .finish()
    }
}

impl std::fmt::Display for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
            name: name.into(),
        }
    }

    pub fn from_lines<I, L>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let text = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::from_str(name, &text)
    }

    /// All lines without terminators.
    pub fn lines(&self) -> Vec<String> {
        (0..self.line_count()).map(|l| self.line_text(l)).collect()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Absolute character index of a (clamped) position.
    pub fn char_index(&self, pos: Position) -> usize {
        let pos = pos.clamp_to(self);
        self.rope.line_to_char(pos.line) + pos.character
    }

    pub fn position_of(&self, char_idx: usize) -> Position {
        let idx = char_idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(idx);
        Position::new(line, idx - self.rope.line_to_char(line))
    }

    pub fn insert(&mut self, pos: Position, text: &str) {
        let idx = self.char_index(pos);
        self.rope.insert(idx, text);
    }

    /// Remove `[start, end)` and return the removed text.
    pub fn delete(&mut self, start: Position, end: Position) -> String {
        let (a, b) = (self.char_index(start), self.char_index(end));
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        let removed = self.rope.slice(a..b).to_string();
        self.rope.remove(a..b);
        removed
    }

    pub fn replace(&mut self, start: Position, end: Position, text: &str) -> String {
        let removed = self.delete(start, end);
        self.insert(start.min(end), text);
        removed
    }
}

impl TextSource for Buffer {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_text(&self, line: usize) -> String {
        if line >= self.rope.len_lines() {
            return String::new();
        }
        let mut s = self.rope.line(line).to_string();
        if s.ends_with('\n') {
            s.pop();
            if s.ends_with('\r') {
                s.pop();
            }
        }
        s
    }

    fn line_len(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return 0;
        }
        let slice = self.rope.line(line);
        let mut len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
            if len > 0 && slice.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        len
    }

    fn text_in_range(&self, start: Position, end: Position) -> String {
        let (a, b) = (self.char_index(start), self.char_index(end));
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        self.rope.slice(a..b).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_buffer_and_read_lines() {
        let b = Buffer::from_str("test", "hello\nworld");
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line_text(0), "hello");
        assert_eq!(b.line_text(1), "world");
        assert_eq!(b.line_len(0), 5);
        assert_eq!(b.line_text(9), "");
    }

    #[test]
    fn positions_are_character_based() {
        let mut b = Buffer::from_str("t", "a😀b\nxy");
        assert_eq!(b.line_len(0), 3);
        b.insert(Position::new(0, 2), "Z");
        assert_eq!(b.line_text(0), "a😀Zb");
        let removed = b.delete(Position::new(0, 1), Position::new(0, 2));
        assert_eq!(removed, "😀");
        assert_eq!(b.to_string(), "aZb\nxy");
    }

    #[test]
    fn delete_across_lines_and_index_roundtrip() {
        let mut b = Buffer::from_lines("t", ["one", "two", "three"]);
        let idx = b.char_index(Position::new(2, 1));
        assert_eq!(b.position_of(idx), Position::new(2, 1));
        assert_eq!(b.text_in_range(Position::new(0, 2), Position::new(1, 1)), "e\nt");
        b.delete(Position::new(0, 3), Position::new(1, 3));
        assert_eq!(b.lines(), vec!["one", "three"]);
    }

    #[test]
    fn replace_swaps_text() {
        let mut b = Buffer::from_str("t", "hello world");
        let old = b.replace(Position::new(0, 6), Position::new(0, 11), "there");
        assert_eq!(old, "world");
        assert_eq!(b.to_string(), "hello there");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn insert_then_delete_restores_content(
                lines in prop::collection::vec("[a-z ]{0,8}", 1..5),
                line in 0usize..5,
                col in 0usize..10,
                text in "[a-z\n]{0,6}",
            ) {
                let mut b = Buffer::from_lines("p", &lines);
                let before = b.to_string();
                let at = Position::new(line, col).clamp_to(&b);
                b.insert(at, &text);
                let end = at.advance_by_text(&text);
                prop_assert_eq!(b.text_in_range(at, end), text.clone());
                b.delete(at, end);
                prop_assert_eq!(b.to_string(), before);
            }
        }
    }
}
