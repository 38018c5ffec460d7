//! Boundary search over line text: words, WORDs, paragraphs, sentences.
//!
//! These are pure functions of buffer content. They take a starting
//! `Position`, walk the document through a [`DocWalker`], and return the
//! target `Position`. Callers decide what "no movement" means (a failed
//! motion, or a clamp at the document edge).
//!
//! Line breaks are addressed as the position one past the last character of
//! a line and classify as blank. An empty line counts as a word of its own
//! for `w`/`b` and as a paragraph boundary.

use crate::{Position, TextSource};

/// Character class used by word motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Blank,
    Punctuation,
    Keyword,
}

/// Set of characters that make up a keyword, parsed from Vim's `iskeyword`
/// syntax (`@` for alphabetic characters, `48-57` ranges, single characters,
/// `^x` exclusions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordChars {
    alpha: bool,
    ranges: Vec<(u32, u32)>,
    excluded: Vec<(u32, u32)>,
}

impl Default for WordChars {
    fn default() -> Self {
        Self::parse("@,48-57,_,192-255")
    }
}

impl WordChars {
    pub fn parse(spec: &str) -> Self {
        let mut out = Self {
            alpha: false,
            ranges: Vec::new(),
            excluded: Vec::new(),
        };
        for part in split_keyword_spec(spec) {
            let (negate, body) = match part.strip_prefix('^') {
                Some(rest) if !rest.is_empty() => (true, rest),
                _ => (false, part.as_str()),
            };
            if body == "@" {
                if !negate {
                    out.alpha = true;
                }
                continue;
            }
            let Some(range) = parse_keyword_range(body) else {
                continue;
            };
            if negate {
                out.excluded.push(range);
            } else {
                out.ranges.push(range);
            }
        }
        out
    }

    pub fn is_keyword(&self, c: char) -> bool {
        let code = c as u32;
        if self.excluded.iter().any(|&(lo, hi)| lo <= code && code <= hi) {
            return false;
        }
        if self.alpha && c.is_alphabetic() {
            return true;
        }
        // Wide non-ASCII letters and digits behave like keywords in Vim.
        if code > 255 && c.is_alphanumeric() {
            return true;
        }
        self.ranges.iter().any(|&(lo, hi)| lo <= code && code <= hi)
    }

    pub fn classify(&self, c: Option<char>) -> CharClass {
        match c {
            None => CharClass::Blank,
            Some(c) if c.is_whitespace() => CharClass::Blank,
            Some(c) if self.is_keyword(c) => CharClass::Keyword,
            Some(_) => CharClass::Punctuation,
        }
    }

    /// Class for WORD motions: every non-blank is one class.
    pub fn classify_big(&self, c: Option<char>) -> CharClass {
        match self.classify(c) {
            CharClass::Blank => CharClass::Blank,
            _ => CharClass::Keyword,
        }
    }
}

fn split_keyword_spec(spec: &str) -> Vec<String> {
    // A bare "," item is written as ",," in the middle of the list.
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = spec.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ',' {
            if current.is_empty() && chars.peek() == Some(&',') {
                chars.next();
                parts.push(",".to_string());
                continue;
            }
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn parse_keyword_range(body: &str) -> Option<(u32, u32)> {
    let value = |s: &str| -> Option<u32> {
        if let Ok(n) = s.parse::<u32>() {
            return Some(n);
        }
        let mut it = s.chars();
        match (it.next(), it.next()) {
            (Some(c), None) => Some(c as u32),
            _ => None,
        }
    };
    if body.len() > 1
        && let Some((lo, hi)) = body.split_once('-')
        && !lo.is_empty()
        && !hi.is_empty()
    {
        return Some((value(lo)?, value(hi)?));
    }
    let v = value(body)?;
    Some((v, v))
}

/// Lazily caches the characters of each visited line.
pub struct DocWalker<'a, S: TextSource + ?Sized> {
    src: &'a S,
    lines: Vec<Option<Vec<char>>>,
}

impl<'a, S: TextSource + ?Sized> DocWalker<'a, S> {
    pub fn new(src: &'a S) -> Self {
        Self {
            src,
            lines: vec![None; src.line_count()],
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&mut self, line: usize) -> &[char] {
        if line >= self.lines.len() {
            return &[];
        }
        let src = self.src;
        self.lines[line].get_or_insert_with(|| src.line_text(line).chars().collect())
    }

    pub fn len(&mut self, line: usize) -> usize {
        self.line(line).len()
    }

    pub fn is_empty_line(&mut self, line: usize) -> bool {
        self.len(line) == 0
    }

    pub fn is_blank_line(&mut self, line: usize) -> bool {
        self.line(line).iter().all(|c| c.is_whitespace())
    }

    /// Character at `pos`, `None` on a line break.
    pub fn char_at(&mut self, pos: Position) -> Option<char> {
        self.line(pos.line).get(pos.character).copied()
    }

    pub fn next(&mut self, pos: Position) -> Option<Position> {
        let len = self.len(pos.line);
        if pos.character < len {
            return Some(pos.with_character(pos.character + 1));
        }
        if pos.line + 1 < self.line_count() {
            return Some(Position::new(pos.line + 1, 0));
        }
        None
    }

    pub fn prev(&mut self, pos: Position) -> Option<Position> {
        if pos.character > 0 {
            let len = self.len(pos.line);
            return Some(pos.with_character((pos.character - 1).min(len)));
        }
        if pos.line == 0 {
            return None;
        }
        let line = pos.line - 1;
        Some(Position::new(line, self.len(line)))
    }

    pub fn last_position(&mut self) -> Position {
        let line = self.line_count().saturating_sub(1);
        Position::new(line, self.len(line))
    }
}

fn class_of<S: TextSource + ?Sized>(
    walker: &mut DocWalker<'_, S>,
    words: &WordChars,
    big: bool,
    pos: Position,
) -> CharClass {
    let c = walker.char_at(pos);
    if big {
        words.classify_big(c)
    } else {
        words.classify(c)
    }
}

/// `w` / `W`: start of the next word. Returns the document end when there
/// is no further word.
pub fn next_word_start<S: TextSource + ?Sized>(
    src: &S,
    pos: Position,
    words: &WordChars,
    big: bool,
) -> Position {
    let mut w = DocWalker::new(src);
    let mut p = pos;
    let start_class = class_of(&mut w, words, big, p);
    if start_class != CharClass::Blank {
        loop {
            match w.next(p) {
                Some(n) if n.line == p.line && class_of(&mut w, words, big, n) == start_class => {
                    p = n;
                }
                Some(n) => {
                    p = n;
                    break;
                }
                None => return w.last_position(),
            }
        }
    }
    loop {
        if class_of(&mut w, words, big, p) != CharClass::Blank {
            return p;
        }
        if p.line != pos.line && p.character == 0 && w.is_empty_line(p.line) {
            return p;
        }
        match w.next(p) {
            Some(n) => p = n,
            None => return p,
        }
    }
}

/// `b` / `B`: start of the current or previous word.
pub fn prev_word_start<S: TextSource + ?Sized>(
    src: &S,
    pos: Position,
    words: &WordChars,
    big: bool,
) -> Position {
    let mut w = DocWalker::new(src);
    let Some(mut p) = w.prev(pos) else {
        return pos;
    };
    loop {
        if class_of(&mut w, words, big, p) != CharClass::Blank {
            break;
        }
        if p.character == 0 && w.is_empty_line(p.line) {
            return p;
        }
        match w.prev(p) {
            Some(q) => p = q,
            None => return p,
        }
    }
    let class = class_of(&mut w, words, big, p);
    while let Some(q) = w.prev(p) {
        if q.line != p.line || class_of(&mut w, words, big, q) != class {
            break;
        }
        p = q;
    }
    p
}

/// `e` / `E`: end of the current or next word.
pub fn word_end<S: TextSource + ?Sized>(
    src: &S,
    pos: Position,
    words: &WordChars,
    big: bool,
) -> Position {
    let mut w = DocWalker::new(src);
    let Some(mut p) = w.next(pos) else {
        return pos;
    };
    while class_of(&mut w, words, big, p) == CharClass::Blank {
        match w.next(p) {
            Some(n) => p = n,
            None => return pos,
        }
    }
    let class = class_of(&mut w, words, big, p);
    while let Some(n) = w.next(p) {
        if n.line != p.line || class_of(&mut w, words, big, n) != class {
            break;
        }
        p = n;
    }
    p
}

/// `ge` / `gE`: end of the previous word.
pub fn prev_word_end<S: TextSource + ?Sized>(
    src: &S,
    pos: Position,
    words: &WordChars,
    big: bool,
) -> Position {
    let mut w = DocWalker::new(src);
    let mut p = pos;
    let class = class_of(&mut w, words, big, p);
    if class != CharClass::Blank {
        while let Some(q) = w.prev(p) {
            if q.line != p.line || class_of(&mut w, words, big, q) != class {
                break;
            }
            p = q;
        }
    }
    let Some(mut p) = w.prev(p) else {
        return Position::origin();
    };
    while class_of(&mut w, words, big, p) == CharClass::Blank {
        if p.character == 0 && w.is_empty_line(p.line) {
            return p;
        }
        match w.prev(p) {
            Some(q) => p = q,
            None => return p,
        }
    }
    p
}

/// Start and end (inclusive) of the run of same-class characters under
/// `pos` on its line. On a line break the run is empty and `None` is
/// returned.
pub fn class_run_at<S: TextSource + ?Sized>(
    src: &S,
    pos: Position,
    words: &WordChars,
    big: bool,
) -> Option<(Position, Position)> {
    let chars: Vec<char> = src.line_text(pos.line).chars().collect();
    if pos.character >= chars.len() {
        return None;
    }
    let class = |c: char| {
        if big {
            words.classify_big(Some(c))
        } else {
            words.classify(Some(c))
        }
    };
    let target = class(chars[pos.character]);
    let mut start = pos.character;
    while start > 0 && class(chars[start - 1]) == target {
        start -= 1;
    }
    let mut end = pos.character;
    while end + 1 < chars.len() && class(chars[end + 1]) == target {
        end += 1;
    }
    Some((pos.with_character(start), pos.with_character(end)))
}

/// Keyword under or after the cursor on its line, as used by `*` and `#`.
pub fn keyword_at_or_after<S: TextSource + ?Sized>(
    src: &S,
    pos: Position,
    words: &WordChars,
) -> Option<(Position, String)> {
    let chars: Vec<char> = src.line_text(pos.line).chars().collect();
    let mut i = pos.character.min(chars.len());
    while i < chars.len() && !words.is_keyword(chars[i]) {
        i += 1;
    }
    if i >= chars.len() {
        return None;
    }
    let mut start = i;
    while start > 0 && words.is_keyword(chars[start - 1]) {
        start -= 1;
    }
    let mut end = i;
    while end < chars.len() && words.is_keyword(chars[end]) {
        end += 1;
    }
    Some((
        pos.with_character(start),
        chars[start..end].iter().collect(),
    ))
}

/// `}`: the next empty line after a run of non-empty lines, or the end of
/// the last line.
pub fn next_paragraph_boundary<S: TextSource + ?Sized>(src: &S, pos: Position) -> Position {
    let mut w = DocWalker::new(src);
    let last = w.line_count().saturating_sub(1);
    let mut line = pos.line;
    while line < last && w.is_empty_line(line) {
        line += 1;
    }
    while line < last && !w.is_empty_line(line) {
        line += 1;
    }
    if line == last && !w.is_empty_line(line) {
        return Position::new(line, w.len(line).saturating_sub(1));
    }
    Position::new(line, 0)
}

/// `{`: the previous empty line before a run of non-empty lines, or the
/// document start.
pub fn prev_paragraph_boundary<S: TextSource + ?Sized>(src: &S, pos: Position) -> Position {
    let mut w = DocWalker::new(src);
    let mut line = pos.line;
    while line > 0 && w.is_empty_line(line) {
        line -= 1;
    }
    while line > 0 && !w.is_empty_line(line) {
        line -= 1;
    }
    Position::new(line, 0)
}

/// Line range `[first, last]` of the paragraph (or run of blank lines)
/// containing `line`.
pub fn paragraph_lines<S: TextSource + ?Sized>(src: &S, line: usize) -> (usize, usize) {
    let mut w = DocWalker::new(src);
    let last = w.line_count().saturating_sub(1);
    let blank = w.is_blank_line(line);
    let mut first = line;
    while first > 0 && w.is_blank_line(first - 1) == blank {
        first -= 1;
    }
    let mut end = line;
    while end < last && w.is_blank_line(end + 1) == blank {
        end += 1;
    }
    (first, end)
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_sentence_closer(c: char) -> bool {
    matches!(c, ')' | ']' | '"' | '\'')
}

/// Sentence starts in document order. Empty lines are sentence boundaries
/// of their own.
fn sentence_starts<S: TextSource + ?Sized>(src: &S) -> Vec<Position> {
    let mut w = DocWalker::new(src);
    let mut starts = Vec::new();
    let mut expect_start = true;
    let mut pending_end = false;
    let mut p = Position::origin();
    loop {
        let c = w.char_at(p);
        let empty = p.character == 0 && w.is_empty_line(p.line);
        if empty {
            starts.push(p);
            expect_start = true;
            pending_end = false;
        } else {
            match c {
                None => {
                    if pending_end {
                        expect_start = true;
                    }
                }
                Some(c) if c.is_whitespace() => {
                    if pending_end {
                        expect_start = true;
                        pending_end = false;
                    }
                }
                Some(c) => {
                    if expect_start {
                        starts.push(p);
                        expect_start = false;
                        pending_end = false;
                    }
                    if is_sentence_end(c) {
                        pending_end = true;
                    } else if !(pending_end && is_sentence_closer(c)) {
                        pending_end = false;
                    }
                }
            }
        }
        match w.next(p) {
            Some(n) => p = n,
            None => break,
        }
    }
    starts
}

/// `)`: start of the next sentence.
pub fn next_sentence_start<S: TextSource + ?Sized>(src: &S, pos: Position) -> Position {
    sentence_starts(src)
        .into_iter()
        .find(|&s| s > pos)
        .unwrap_or_else(|| Position::document_end(src).clamp_normal(src))
}

/// `(`: start of the current or previous sentence.
pub fn prev_sentence_start<S: TextSource + ?Sized>(src: &S, pos: Position) -> Position {
    sentence_starts(src)
        .into_iter()
        .rev()
        .find(|&s| s < pos)
        .unwrap_or(Position::origin())
}

/// The sentence containing `pos` as `(start, end_inclusive)`, where the end
/// stops before the whitespace that follows the sentence.
pub fn sentence_at<S: TextSource + ?Sized>(src: &S, pos: Position) -> (Position, Position) {
    let starts = sentence_starts(src);
    let start = starts
        .iter()
        .rev()
        .find(|&&s| s <= pos)
        .copied()
        .unwrap_or(Position::origin());
    let next = starts.iter().find(|&&s| s > start).copied();
    let mut w = DocWalker::new(src);
    let mut end = match next {
        Some(n) => w.prev(n).unwrap_or(n),
        None => w.last_position(),
    };
    while end > start {
        match w.char_at(end) {
            Some(c) if !c.is_whitespace() => break,
            _ => match w.prev(end) {
                Some(q) => end = q,
                None => break,
            },
        }
    }
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn iskeyword_parsing() {
        let w = WordChars::parse("@,48-57,_,192-255");
        assert!(w.is_keyword('a'));
        assert!(w.is_keyword('7'));
        assert!(w.is_keyword('_'));
        assert!(!w.is_keyword('-'));
        let dash = WordChars::parse("@,-");
        assert!(dash.is_keyword('-'));
        let no_digits = WordChars::parse("@,48-57,^50");
        assert!(!no_digits.is_keyword('2'));
        assert!(no_digits.is_keyword('3'));
    }

    #[test]
    fn word_forward_and_backward() {
        let d = doc(&["foo, bar baz", "qux!! zip"]);
        let w = WordChars::default();
        let mut p = Position::origin();
        p = next_word_start(&d, p, &w, false);
        assert_eq!(p, Position::new(0, 3));
        p = next_word_start(&d, p, &w, false);
        assert_eq!(p, Position::new(0, 5));
        p = next_word_start(&d, Position::new(0, 9), &w, false);
        assert_eq!(p, Position::new(1, 0));
        assert_eq!(prev_word_start(&d, p, &w, false), Position::new(0, 9));
        assert_eq!(prev_word_start(&d, Position::new(0, 5), &w, false), Position::new(0, 3));
    }

    #[test]
    fn big_words_skip_punctuation_runs() {
        let d = doc(&["a.b c"]);
        let w = WordChars::default();
        assert_eq!(next_word_start(&d, Position::origin(), &w, true), Position::new(0, 4));
        assert_eq!(word_end(&d, Position::origin(), &w, true), Position::new(0, 2));
    }

    #[test]
    fn empty_line_is_a_word_stop() {
        let d = doc(&["alpha", "", "beta"]);
        let w = WordChars::default();
        assert_eq!(next_word_start(&d, Position::origin(), &w, false), Position::new(1, 0));
        assert_eq!(prev_word_start(&d, Position::new(2, 0), &w, false), Position::new(1, 0));
    }

    #[test]
    fn word_end_and_previous_end() {
        let d = doc(&["one two", "three"]);
        let w = WordChars::default();
        assert_eq!(word_end(&d, Position::origin(), &w, false), Position::new(0, 2));
        assert_eq!(word_end(&d, Position::new(0, 2), &w, false), Position::new(0, 6));
        assert_eq!(word_end(&d, Position::new(0, 6), &w, false), Position::new(1, 4));
        assert_eq!(prev_word_end(&d, Position::new(1, 2), &w, false), Position::new(0, 6));
        assert_eq!(prev_word_end(&d, Position::new(0, 5), &w, false), Position::new(0, 2));
    }

    #[test]
    fn last_word_moves_to_document_end() {
        let d = doc(&["end"]);
        let w = WordChars::default();
        assert_eq!(next_word_start(&d, Position::origin(), &w, false), Position::new(0, 3));
    }

    #[test]
    fn paragraphs() {
        let d = doc(&["a", "b", "", "c", "", "", "d"]);
        assert_eq!(next_paragraph_boundary(&d, Position::origin()), Position::new(2, 0));
        assert_eq!(next_paragraph_boundary(&d, Position::new(2, 0)), Position::new(4, 0));
        assert_eq!(next_paragraph_boundary(&d, Position::new(6, 0)), Position::new(6, 0));
        assert_eq!(prev_paragraph_boundary(&d, Position::new(3, 0)), Position::new(2, 0));
        assert_eq!(paragraph_lines(&d, 0), (0, 1));
        assert_eq!(paragraph_lines(&d, 4), (4, 5));
    }

    #[test]
    fn sentences() {
        let d = doc(&["One. Two!  Three", "four.", "", "Five"]);
        assert_eq!(next_sentence_start(&d, Position::origin()), Position::new(0, 5));
        assert_eq!(next_sentence_start(&d, Position::new(0, 5)), Position::new(0, 11));
        assert_eq!(next_sentence_start(&d, Position::new(0, 11)), Position::new(2, 0));
        assert_eq!(prev_sentence_start(&d, Position::new(0, 7)), Position::new(0, 5));
        assert_eq!(sentence_at(&d, Position::new(0, 6)), (Position::new(0, 5), Position::new(0, 8)));
    }

    #[test]
    fn keyword_lookup_for_star() {
        let d = doc(&["  foo(bar)"]);
        let w = WordChars::default();
        let (at, word) = keyword_at_or_after(&d, Position::origin(), &w).expect("keyword");
        assert_eq!(at, Position::new(0, 2));
        assert_eq!(word, "foo");
        assert!(keyword_at_or_after(&d, Position::new(0, 9), &w).is_none());
    }
}
