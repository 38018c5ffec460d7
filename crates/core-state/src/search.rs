//! Compiled search patterns and their per-version match cache.
//!
//! Input is Vim-flavoured: `pattern/offset` (or `pattern?offset` backwards),
//! `\c`/`\C` case overrides and `\<`/`\>` word boundaries. Everything else is
//! handed to `regex`. A pattern that fails to compile is searched literally.

use crate::VimError;
use core_config::SearchConfig;
use core_text::{Position, TextSource};
use regex::{Regex, RegexBuilder};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

impl SearchDirection {
    pub fn reversed(self) -> Self {
        match self {
            SearchDirection::Forward => SearchDirection::Backward,
            SearchDirection::Backward => SearchDirection::Forward,
        }
    }

    pub fn prompt_char(self) -> char {
        match self {
            SearchDirection::Forward => '/',
            SearchDirection::Backward => '?',
        }
    }
}

/// Where the cursor lands relative to a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOffset {
    #[default]
    None,
    /// `+N` / `-N`: N lines below/above, column 0, linewise.
    Line(isize),
    /// `e`, `e+N`, `e-N`: relative to the last matched character.
    End(isize),
    /// `s`, `b`, `s+N`, `b-N`: relative to the match start.
    Begin(isize),
}

impl SearchOffset {
    pub fn parse(text: &str) -> SearchOffset {
        let text = text.trim();
        if text.is_empty() {
            return SearchOffset::None;
        }
        let (kind, rest) = match text.chars().next() {
            Some('e') => ('e', &text[1..]),
            Some('s') | Some('b') => ('b', &text[1..]),
            _ => ('l', text),
        };
        let amount = match rest {
            "" => 0,
            "+" => 1,
            "-" => -1,
            r => r.parse::<isize>().unwrap_or(0),
        };
        match kind {
            'e' => SearchOffset::End(amount),
            'b' => SearchOffset::Begin(amount),
            _ => SearchOffset::Line(amount),
        }
    }
}

/// One match: start and exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub start: Position,
    pub end: Position,
}

/// Result of a next-match lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub found: SearchMatch,
    pub wrapped: bool,
}

/// Where an offset puts the cursor and how the motion behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetTarget {
    pub position: Position,
    pub linewise: bool,
    pub inclusive: bool,
}

#[derive(Debug, Clone)]
struct MatchCache {
    document: String,
    version: u64,
    matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone)]
pub struct SearchState {
    pub direction: SearchDirection,
    /// Raw text typed after `/` or `?`.
    pub input: String,
    /// The pattern part of `input`, offset removed.
    pub pattern: String,
    pub offset: SearchOffset,
    pub origin: Position,
    matcher: Option<Regex>,
    cache: Option<MatchCache>,
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.direction == other.direction
            && self.input == other.input
            && self.offset == other.offset
            && self.origin == other.origin
    }
}

impl SearchState {
    pub fn new(
        direction: SearchDirection,
        input: &str,
        origin: Position,
        config: &SearchConfig,
    ) -> Self {
        let (pattern, offset) = split_offset(input, direction.prompt_char());
        let matcher = compile(&pattern, config, config.regex);
        Self {
            direction,
            input: input.to_string(),
            pattern,
            offset: SearchOffset::parse(&offset),
            origin,
            matcher,
            cache: None,
        }
    }

    /// `*` / `#`: the keyword as a whole word.
    pub fn whole_word(
        direction: SearchDirection,
        word: &str,
        origin: Position,
        config: &SearchConfig,
    ) -> Self {
        let pattern = format!("\\<{}\\>", regex::escape(word));
        let no_smartcase = SearchConfig {
            smartcase: false,
            ..config.clone()
        };
        let matcher = compile(&pattern, &no_smartcase, true);
        Self {
            direction,
            input: pattern.clone(),
            pattern,
            offset: SearchOffset::None,
            origin,
            matcher,
            cache: None,
        }
    }

    /// Same pattern and offset in another direction, from another origin.
    pub fn redirected(&self, direction: SearchDirection, origin: Position) -> Self {
        Self {
            direction,
            origin,
            ..self.clone()
        }
    }

    /// All matches in document order, recomputed when `version` changes.
    pub fn matches<S: TextSource + ?Sized>(
        &mut self,
        src: &S,
        document: &str,
        version: u64,
    ) -> &[SearchMatch] {
        let stale = self
            .cache
            .as_ref()
            .is_none_or(|c| c.version != version || c.document != document);
        if stale {
            let matches = self.scan(src);
            debug!(target: "engine.search", pattern = %self.pattern, version, count = matches.len(), "match_cache_rebuilt");
            self.cache = Some(MatchCache {
                document: document.to_string(),
                version,
                matches,
            });
        }
        self.cache.as_ref().map(|c| c.matches.as_slice()).unwrap_or(&[])
    }

    fn scan<S: TextSource + ?Sized>(&self, src: &S) -> Vec<SearchMatch> {
        let Some(re) = &self.matcher else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for line in 0..src.line_count() {
            let text = src.line_text(line);
            for m in re.find_iter(&text) {
                let start = text[..m.start()].chars().count();
                let len = m.as_str().chars().count();
                out.push(SearchMatch {
                    start: Position::new(line, start),
                    end: Position::new(line, start + len),
                });
            }
        }
        out
    }

    /// The match after (or before) `from`, wrapping per `wrapscan`.
    pub fn next_match<S: TextSource + ?Sized>(
        &mut self,
        src: &S,
        document: &str,
        version: u64,
        from: Position,
        direction: SearchDirection,
        wrapscan: bool,
    ) -> Result<SearchHit, VimError> {
        let pattern = self.pattern.clone();
        let matches = self.matches(src, document, version);
        if matches.is_empty() {
            return Err(VimError::PatternNotFound(pattern));
        }
        let hit = match direction {
            SearchDirection::Forward => match matches.iter().find(|m| m.start > from) {
                Some(m) => SearchHit {
                    found: *m,
                    wrapped: false,
                },
                None if wrapscan => SearchHit {
                    found: matches[0],
                    wrapped: true,
                },
                None => return Err(VimError::SearchHitBottom(pattern)),
            },
            SearchDirection::Backward => match matches.iter().rev().find(|m| m.start < from) {
                Some(m) => SearchHit {
                    found: *m,
                    wrapped: false,
                },
                None if wrapscan => SearchHit {
                    found: matches[matches.len() - 1],
                    wrapped: true,
                },
                None => return Err(VimError::SearchHitTop(pattern)),
            },
        };
        if hit.wrapped {
            debug!(target: "engine.search", pattern = %pattern, ?direction, "search_wrapped");
        }
        Ok(hit)
    }

    pub fn apply_offset<S: TextSource + ?Sized>(&self, src: &S, found: SearchMatch) -> OffsetTarget {
        match self.offset {
            SearchOffset::None => OffsetTarget {
                position: found.start,
                linewise: false,
                inclusive: false,
            },
            SearchOffset::Line(n) => {
                let last = src.line_count().saturating_sub(1) as isize;
                let line = (found.start.line as isize + n).clamp(0, last) as usize;
                OffsetTarget {
                    position: Position::new(line, 0),
                    linewise: true,
                    inclusive: false,
                }
            }
            SearchOffset::End(n) => {
                let last_char = if found.end.character > found.start.character {
                    Position::new(found.end.line, found.end.character - 1)
                } else {
                    found.start
                };
                OffsetTarget {
                    position: last_char.offset_through_line_breaks(src, n),
                    linewise: false,
                    inclusive: true,
                }
            }
            SearchOffset::Begin(n) => OffsetTarget {
                position: found.start.offset_through_line_breaks(src, n),
                linewise: false,
                inclusive: false,
            },
        }
    }
}

/// Split `pat/off` at the first separator not escaped by a backslash.
fn split_offset(input: &str, separator: char) -> (String, String) {
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == separator {
            return (input[..i].to_string(), input[i + 1..].to_string());
        }
    }
    (input.to_string(), String::new())
}

/// Translate Vim atoms, resolve case sensitivity, then compile.
fn compile(pattern: &str, config: &SearchConfig, as_regex: bool) -> Option<Regex> {
    let mut forced: Option<bool> = None;
    let mut translated = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            translated.push(c);
            continue;
        }
        match chars.next() {
            Some('c') => forced = Some(true),
            Some('C') => forced = Some(false),
            Some('<') | Some('>') if as_regex => translated.push_str("\\b"),
            Some(other) => {
                translated.push('\\');
                translated.push(other);
            }
            None => translated.push('\\'),
        }
    }
    let has_upper = translated.chars().any(char::is_uppercase);
    let insensitive =
        forced.unwrap_or(config.ignorecase && !(config.smartcase && has_upper));
    let build = |source: &str| {
        RegexBuilder::new(source)
            .case_insensitive(insensitive)
            .build()
    };
    if as_regex {
        match build(&translated) {
            Ok(re) => return Some(re),
            Err(e) => {
                debug!(target: "engine.search", pattern, error = %e, "pattern_compile_failed_searching_literally");
            }
        }
    }
    build(&regex::escape(&translated)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Buffer;
    use pretty_assertions::assert_eq;

    fn buf(lines: &[&str]) -> Buffer {
        Buffer::from_lines("t", lines.iter().copied())
    }

    fn search(input: &str) -> SearchState {
        SearchState::new(SearchDirection::Forward, input, Position::origin(), &SearchConfig::default())
    }

    #[test]
    fn offsets_parse() {
        let cases = [
            ("", SearchOffset::None),
            ("e", SearchOffset::End(0)),
            ("e+1", SearchOffset::End(1)),
            ("b-2", SearchOffset::Begin(-2)),
            ("s", SearchOffset::Begin(0)),
            ("+2", SearchOffset::Line(2)),
            ("-", SearchOffset::Line(-1)),
            ("3", SearchOffset::Line(3)),
        ];
        for (text, expected) in cases {
            assert_eq!(SearchOffset::parse(text), expected, "offset {text:?}");
        }
        let s = search("a\\/b/e");
        assert_eq!(s.pattern, "a\\/b");
        assert_eq!(s.offset, SearchOffset::End(0));
    }

    #[test]
    fn forward_search_wraps_to_top() {
        let b = buf(&["foo x", "bar", "foo y"]);
        let mut s = search("foo");
        let hit = s
            .next_match(&b, "t", 1, Position::new(0, 0), SearchDirection::Forward, true)
            .unwrap();
        assert_eq!(hit.found.start, Position::new(2, 0));
        assert!(!hit.wrapped);
        let hit = s
            .next_match(&b, "t", 1, Position::new(2, 0), SearchDirection::Forward, true)
            .unwrap();
        assert_eq!(hit.found.start, Position::new(0, 0));
        assert!(hit.wrapped);
    }

    #[test]
    fn single_match_is_found_from_anywhere() {
        let b = buf(&["alpha", "beta needle", "gamma"]);
        let mut s = search("needle");
        for line in 0..3 {
            for dir in [SearchDirection::Forward, SearchDirection::Backward] {
                let hit = s
                    .next_match(&b, "t", 1, Position::new(line, 0), dir, true)
                    .unwrap();
                assert_eq!(hit.found.start, Position::new(1, 5));
            }
        }
    }

    #[test]
    fn no_wrapscan_reports_top_and_bottom() {
        let b = buf(&["foo", "bar"]);
        let mut s = search("foo");
        let err = s
            .next_match(&b, "t", 1, Position::new(0, 0), SearchDirection::Forward, false)
            .unwrap_err();
        assert_eq!(err, VimError::SearchHitBottom("foo".into()));
        let err = s
            .next_match(&b, "t", 1, Position::new(0, 0), SearchDirection::Backward, false)
            .unwrap_err();
        assert_eq!(err, VimError::SearchHitTop("foo".into()));
        let mut missing = search("zzz");
        assert_eq!(
            missing
                .next_match(&b, "t", 1, Position::origin(), SearchDirection::Forward, true)
                .unwrap_err(),
            VimError::PatternNotFound("zzz".into())
        );
    }

    #[test]
    fn cache_is_rebuilt_on_new_version() {
        let mut s = search("x");
        assert_eq!(s.matches(&buf(&["x x"]), "t", 1).len(), 2);
        assert_eq!(s.matches(&buf(&["x"]), "t", 1).len(), 2, "same version reuses cache");
        assert_eq!(s.matches(&buf(&["x"]), "t", 2).len(), 1);
    }

    #[test]
    fn case_rules() {
        let b = buf(&["Foo foo"]);
        let cfg = SearchConfig {
            ignorecase: true,
            smartcase: true,
            ..SearchConfig::default()
        };
        let mut lower = SearchState::new(SearchDirection::Forward, "foo", Position::origin(), &cfg);
        assert_eq!(lower.matches(&b, "t", 1).len(), 2);
        let mut upper = SearchState::new(SearchDirection::Forward, "Foo", Position::origin(), &cfg);
        assert_eq!(upper.matches(&b, "t", 1).len(), 1);
        let mut forced = SearchState::new(SearchDirection::Forward, "Foo\\c", Position::origin(), &cfg);
        assert_eq!(forced.matches(&b, "t", 1).len(), 2);
    }

    #[test]
    fn word_boundaries_and_literal_fallback() {
        let b = buf(&["cat concat cat(", "a+b"]);
        let mut word = search("\\<cat\\>");
        let starts: Vec<_> = word.matches(&b, "t", 1).iter().map(|m| m.start).collect();
        assert_eq!(starts, vec![Position::new(0, 0), Position::new(0, 11)]);
        let mut broken = search("cat(");
        assert_eq!(broken.matches(&b, "t", 1)[0].start, Position::new(0, 11));
        let literal_cfg = SearchConfig {
            regex: false,
            ..SearchConfig::default()
        };
        let mut lit = SearchState::new(SearchDirection::Forward, "a+b", Position::origin(), &literal_cfg);
        assert_eq!(lit.matches(&b, "t", 1)[0].start, Position::new(1, 0));
    }

    #[test]
    fn offset_targets() {
        let b = buf(&["one two", "three", "four"]);
        let mut s = search("two/e");
        let hit = s
            .next_match(&b, "t", 1, Position::origin(), SearchDirection::Forward, true)
            .unwrap();
        let t = s.apply_offset(&b, hit.found);
        assert_eq!(t.position, Position::new(0, 6));
        assert!(t.inclusive);
        let lines = search("two/+1");
        let t = lines.apply_offset(&b, hit.found);
        assert_eq!(t.position, Position::new(1, 0));
        assert!(t.linewise);
    }
}
