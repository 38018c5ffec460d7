//! `/`, `?`, `n`, `N`, `*` and `#`.

mod common;

use common::{Harness, lines};
use core_config::Config;
use core_state::Mode;
use pretty_assertions::assert_eq;

#[test]
fn forward_search_lands_on_the_next_match() {
    let mut h = Harness::new(&["one foo", "two", "foo three"]);
    h.keys("/foo<CR>");
    assert_eq!(h.caret(), (0, 4));
    assert_eq!(h.mode(), Mode::Normal);
    h.keys("n");
    assert_eq!(h.caret(), (2, 0));
    assert_eq!(h.register_text('/'), "foo");
}

#[test]
fn search_wraps_around_the_end() {
    let mut h = Harness::new(&["foo", "bar", "foo"]);
    h.carets(&[(2, 0)]);
    h.keys("n");
    // No previous pattern yet.
    assert_eq!(h.status().as_deref(), Some("E35: No previous regular expression"));
    h.keys("/foo<CR>");
    assert_eq!(h.caret(), (0, 0));
    assert_eq!(h.status().as_deref(), Some("search hit BOTTOM, continuing at TOP"));
}

#[test]
fn a_single_match_is_always_found_again() {
    let mut h = Harness::new(&["alpha needle beta", "gamma"]);
    h.keys("/needle<CR>");
    assert_eq!(h.caret(), (0, 6));
    for _ in 0..3 {
        h.keys("n");
        assert_eq!(h.caret(), (0, 6));
        h.keys("N");
        assert_eq!(h.caret(), (0, 6));
    }
}

#[test]
fn nowrapscan_stops_at_the_bottom() {
    let config = Config::parse("[search]\nwrapscan = false\n[engine]\nstrict = true\n").unwrap();
    let mut h = Harness::with_config(&["foo", "bar"], config);
    h.carets(&[(1, 0)]);
    h.keys("/foo<CR>");
    assert_eq!(h.caret(), (1, 0));
    assert_eq!(h.status().as_deref(), Some("E385: Search hit BOTTOM without match for: foo"));
    h.keys("?foo<CR>");
    assert_eq!(h.caret(), (0, 0));
}

#[test]
fn missing_pattern_reports_e486() {
    let mut h = Harness::new(&["abc"]);
    h.keys("/zzz<CR>");
    assert_eq!(h.status().as_deref(), Some("E486: Pattern not found: zzz"));
    assert_eq!(h.caret(), (0, 0));
}

#[test]
fn backward_search_and_reverse_repeat() {
    let mut h = Harness::new(&["x1", "x2", "x3"]);
    h.carets(&[(2, 0)]);
    h.keys("?x<CR>");
    assert_eq!(h.caret(), (1, 0));
    h.keys("n");
    assert_eq!(h.caret(), (0, 0));
    h.keys("N");
    assert_eq!(h.caret(), (1, 0));
}

#[test]
fn star_searches_the_word_under_the_caret() {
    let mut h = Harness::new(&["foo foobar foo"]);
    h.keys("*");
    assert_eq!(h.caret(), (0, 11));
    h.keys("#");
    assert_eq!(h.caret(), (0, 0));
}

#[test]
fn search_is_an_operator_target() {
    let mut h = Harness::new(&["abc def foo"]);
    h.keys("d/foo<CR>");
    assert_eq!(h.lines(), lines(&["foo"]));
    assert_eq!(h.register_text('"'), "abc def ");
}

#[test]
fn empty_pattern_repeats_the_last_search() {
    let mut h = Harness::new(&["ab", "ab", "ab"]);
    h.keys("/b<CR>/<CR>");
    assert_eq!(h.caret(), (1, 1));
}

#[test]
fn cancelled_search_restores_the_caret() {
    let mut h = Harness::new(&["abc", "abc"]);
    h.keys("l/c<Esc>");
    assert_eq!(h.caret(), (0, 1));
    assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn search_history_is_browsable() {
    let mut h = Harness::new(&["aa bb", "bb aa"]);
    h.keys("/bb<CR>/<Up><CR>");
    assert_eq!(h.caret(), (1, 0));
}
