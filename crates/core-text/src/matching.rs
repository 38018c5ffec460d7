//! Pair matching: brackets (`%` and bracket text objects), quotes and tags.

use crate::motion::DocWalker;
use crate::{Position, TextSource};

/// Character pairs used by `%`, parsed from Vim's `matchpairs` syntax
/// (`(:),{:},[:]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPairs {
    pairs: Vec<(char, char)>,
}

impl Default for MatchPairs {
    fn default() -> Self {
        Self::parse("(:),{:},[:]")
    }
}

impl MatchPairs {
    pub fn parse(spec: &str) -> Self {
        let pairs = spec
            .split(',')
            .filter_map(|item| {
                let mut it = item.chars();
                match (it.next(), it.next(), it.next(), it.next()) {
                    (Some(open), Some(':'), Some(close), None) => Some((open, close)),
                    _ => None,
                }
            })
            .collect();
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(char, char)] {
        &self.pairs
    }

    /// `(open, close, is_open)` for a character taking part in a pair.
    pub fn lookup(&self, c: char) -> Option<(char, char, bool)> {
        self.pairs.iter().find_map(|&(o, cl)| {
            if c == o {
                Some((o, cl, true))
            } else if c == cl {
                Some((o, cl, false))
            } else {
                None
            }
        })
    }
}

/// `%`: find the first pair character at or after the cursor on its line
/// and jump to its partner.
pub fn matching_pair<S: TextSource + ?Sized>(
    src: &S,
    pos: Position,
    pairs: &MatchPairs,
) -> Option<Position> {
    let chars: Vec<char> = src.line_text(pos.line).chars().collect();
    let (col, (open, close, is_open)) = chars
        .iter()
        .enumerate()
        .skip(pos.character)
        .find_map(|(i, &c)| pairs.lookup(c).map(|p| (i, p)))?;
    let at = pos.with_character(col);
    if is_open {
        find_close(src, at, open, close)
    } else {
        find_open(src, at, open, close)
    }
}

/// Partner of the opening character at `at`.
fn find_close<S: TextSource + ?Sized>(
    src: &S,
    at: Position,
    open: char,
    close: char,
) -> Option<Position> {
    let mut w = DocWalker::new(src);
    let mut depth = 0usize;
    let mut p = at;
    loop {
        match w.char_at(p) {
            Some(c) if c == open => depth += 1,
            Some(c) if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(p);
                }
            }
            _ => {}
        }
        p = w.next(p)?;
    }
}

/// Partner of the closing character at `at`.
fn find_open<S: TextSource + ?Sized>(
    src: &S,
    at: Position,
    open: char,
    close: char,
) -> Option<Position> {
    let mut w = DocWalker::new(src);
    let mut depth = 0usize;
    let mut p = at;
    loop {
        match w.char_at(p) {
            Some(c) if c == close => depth += 1,
            Some(c) if c == open => {
                depth -= 1;
                if depth == 0 {
                    return Some(p);
                }
            }
            _ => {}
        }
        p = w.prev(p)?;
    }
}

/// Innermost `open`/`close` pair surrounding `pos` (a cursor on either
/// bracket selects that pair). `count` widens to outer pairs. Returns the
/// positions of the two bracket characters.
pub fn enclosing_pair<S: TextSource + ?Sized>(
    src: &S,
    pos: Position,
    open: char,
    close: char,
    count: usize,
) -> Option<(Position, Position)> {
    let mut w = DocWalker::new(src);
    let mut opening = match w.char_at(pos) {
        Some(c) if c == open => Some(pos),
        Some(c) if c == close => find_open(src, pos, open, close),
        _ => None,
    };
    let mut remaining = count.max(1);
    let mut cursor = pos;
    if opening.is_some() {
        remaining -= 1;
    }
    while remaining > 0 {
        let start = match opening {
            Some(o) => w.prev(o)?,
            None => w.prev(cursor)?,
        };
        opening = Some(unmatched_open_before(&mut w, start, open, close)?);
        cursor = start;
        remaining -= 1;
    }
    let opening = opening?;
    let closing = find_close(src, opening, open, close)?;
    Some((opening, closing))
}

fn unmatched_open_before<S: TextSource + ?Sized>(
    w: &mut DocWalker<'_, S>,
    from: Position,
    open: char,
    close: char,
) -> Option<Position> {
    let mut depth = 0usize;
    let mut p = from;
    loop {
        match w.char_at(p) {
            Some(c) if c == close => depth += 1,
            Some(c) if c == open => {
                if depth == 0 {
                    return Some(p);
                }
                depth -= 1;
            }
            _ => {}
        }
        p = w.prev(p)?;
    }
}

/// Quote pair on the cursor line containing or following the cursor.
/// Backslash-escaped quotes are skipped. Returns the positions of the two
/// quote characters.
pub fn quote_pair<S: TextSource + ?Sized>(
    src: &S,
    pos: Position,
    quote: char,
) -> Option<(Position, Position)> {
    let chars: Vec<char> = src.line_text(pos.line).chars().collect();
    let quotes: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| c == quote && (i == 0 || chars[i - 1] != '\\'))
        .map(|(i, _)| i)
        .collect();
    let col = pos.character;
    if let Some(idx) = quotes.iter().position(|&q| q == col) {
        // On a quote: pair it with its neighbour depending on parity.
        let (a, b) = if idx % 2 == 0 {
            (quotes.get(idx).copied()?, quotes.get(idx + 1).copied()?)
        } else {
            (quotes[idx - 1], quotes[idx])
        };
        return Some((pos.with_character(a), pos.with_character(b)));
    }
    let before = quotes.iter().rev().find(|&&q| q < col).copied();
    let after = quotes.iter().find(|&&q| q > col).copied();
    match (before, after) {
        (Some(a), Some(b)) => Some((pos.with_character(a), pos.with_character(b))),
        (None, Some(a)) => {
            let b = quotes.iter().find(|&&q| q > a).copied()?;
            Some((pos.with_character(a), pos.with_character(b)))
        }
        _ => None,
    }
}

/// Positions of an enclosing tag pair. `open_end` and `close_start` bound
/// the inner content; `open_start`/`close_end` are the outer `<`/`>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPair {
    pub open_start: Position,
    pub open_end: Position,
    pub close_start: Position,
    pub close_end: Position,
}

struct Tag {
    name: String,
    closing: bool,
    start: usize,
    end: usize,
}

fn scan_tags(text: &[char]) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut i = 0;
    while i < text.len() {
        if text[i] != '<' {
            i += 1;
            continue;
        }
        let Some(rel) = text[i..].iter().position(|&c| c == '>') else {
            break;
        };
        let end = i + rel;
        let body: String = text[i + 1..end].iter().collect();
        let self_closing = body.ends_with('/');
        let (closing, rest) = match body.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, body.as_str()),
        };
        let name: String = rest
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '/')
            .collect();
        if !name.is_empty() && !self_closing && name.chars().all(|c| c.is_alphanumeric() || "-_:.".contains(c)) {
            tags.push(Tag {
                name,
                closing,
                start: i,
                end,
            });
        }
        i = end + 1;
    }
    tags
}

/// Innermost tag pair whose span contains `pos`; `count` widens outward.
pub fn tag_pair<S: TextSource + ?Sized>(src: &S, pos: Position, count: usize) -> Option<TagPair> {
    let mut text = Vec::new();
    let mut line_starts = Vec::with_capacity(src.line_count());
    for line in 0..src.line_count() {
        line_starts.push(text.len());
        text.extend(src.line_text(line).chars());
        text.push('\n');
    }
    let to_index = |p: Position| line_starts.get(p.line).copied().unwrap_or(text.len()) + p.character;
    let to_pos = |idx: usize| {
        let line = line_starts.partition_point(|&s| s <= idx).saturating_sub(1);
        Position::new(line, idx - line_starts[line])
    };
    let cursor = to_index(pos);

    let mut stack: Vec<&Tag> = Vec::new();
    let mut pairs: Vec<(usize, usize, usize, usize)> = Vec::new();
    let tags = scan_tags(&text);
    for tag in &tags {
        if !tag.closing {
            stack.push(tag);
            continue;
        }
        if let Some(depth) = stack.iter().rposition(|t| t.name == tag.name) {
            let open = stack[depth];
            stack.truncate(depth);
            pairs.push((open.start, open.end, tag.start, tag.end));
        }
    }
    let mut containing: Vec<_> = pairs
        .into_iter()
        .filter(|&(os, _, _, ce)| os <= cursor && cursor <= ce)
        .collect();
    containing.sort_by_key(|&(os, _, _, ce)| ce - os);
    let (os, oe, cs, ce) = *containing.get(count.max(1) - 1)?;
    Some(TagPair {
        open_start: to_pos(os),
        open_end: to_pos(oe),
        close_start: to_pos(cs),
        close_end: to_pos(ce),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matchpairs_parse_and_lookup() {
        let pairs = MatchPairs::parse("(:),<:>");
        assert_eq!(pairs.pairs(), &[('(', ')'), ('<', '>')]);
        assert_eq!(pairs.lookup('>'), Some(('<', '>', false)));
        assert_eq!(pairs.lookup('x'), None);
    }

    #[test]
    fn percent_jumps_across_lines() {
        let d = doc(&["fn x() {", "  a[1];", "}"]);
        let pairs = MatchPairs::default();
        assert_eq!(matching_pair(&d, Position::new(0, 0), &pairs), Some(Position::new(0, 5)));
        assert_eq!(matching_pair(&d, Position::new(0, 6), &pairs), Some(Position::new(2, 0)));
        assert_eq!(matching_pair(&d, Position::new(2, 0), &pairs), Some(Position::new(0, 7)));
        assert_eq!(matching_pair(&d, Position::new(1, 6), &pairs), None);
    }

    #[test]
    fn enclosing_pairs_nest_with_count() {
        let d = doc(&["f(a, (b), c)"]);
        assert_eq!(
            enclosing_pair(&d, Position::new(0, 6), '(', ')', 1),
            Some((Position::new(0, 5), Position::new(0, 7)))
        );
        assert_eq!(
            enclosing_pair(&d, Position::new(0, 6), '(', ')', 2),
            Some((Position::new(0, 1), Position::new(0, 11)))
        );
        assert_eq!(
            enclosing_pair(&d, Position::new(0, 11), '(', ')', 1),
            Some((Position::new(0, 1), Position::new(0, 11)))
        );
        assert_eq!(enclosing_pair(&d, Position::new(0, 0), '(', ')', 1), None);
    }

    #[test]
    fn quotes_on_the_cursor_line() {
        let d = doc(&[r#"say "hi \" there" now"#]);
        assert_eq!(
            quote_pair(&d, Position::new(0, 6), '"'),
            Some((Position::new(0, 4), Position::new(0, 16)))
        );
        assert_eq!(
            quote_pair(&d, Position::new(0, 0), '"'),
            Some((Position::new(0, 4), Position::new(0, 16)))
        );
        assert_eq!(quote_pair(&d, Position::new(0, 18), '"'), None);
    }

    #[test]
    fn tags_pair_innermost_first() {
        let d = doc(&["<div><b>x</b>", "</div>"]);
        let inner = tag_pair(&d, Position::new(0, 8), 1).expect("inner tag");
        assert_eq!(inner.open_start, Position::new(0, 5));
        assert_eq!(inner.open_end, Position::new(0, 7));
        assert_eq!(inner.close_start, Position::new(0, 9));
        let outer = tag_pair(&d, Position::new(0, 8), 2).expect("outer tag");
        assert_eq!(outer.open_start, Position::new(0, 0));
        assert_eq!(outer.close_end, Position::new(1, 5));
    }
}
