//! Operator + motion composition.

mod common;

use common::{Harness, lines};
use core_config::Config;
use pretty_assertions::assert_eq;

struct Case {
    name: &'static str,
    text: &'static [&'static str],
    caret: (usize, usize),
    keys: &'static str,
    want: &'static [&'static str],
    want_caret: (usize, usize),
}

#[test]
fn operator_motion_matrix() {
    let cases = [
        Case {
            name: "dw mid-line stops before next word",
            text: &["foo bar baz"],
            caret: (0, 0),
            keys: "dw",
            want: &["bar baz"],
            want_caret: (0, 0),
        },
        Case {
            name: "dw on last word stops at end of line",
            text: &["foo bar", "next"],
            caret: (0, 4),
            keys: "dw",
            want: &["foo ", "next"],
            want_caret: (0, 3),
        },
        Case {
            name: "counted operator and motion multiply",
            text: &["a b c d e f g"],
            caret: (0, 0),
            keys: "2d2w",
            want: &["e f g"],
            want_caret: (0, 0),
        },
        Case {
            name: "de is inclusive",
            text: &["foo bar"],
            caret: (0, 0),
            keys: "de",
            want: &[" bar"],
            want_caret: (0, 0),
        },
        Case {
            name: "d$ deletes to end of line",
            text: &["foo bar"],
            caret: (0, 3),
            keys: "d$",
            want: &["foo"],
            want_caret: (0, 2),
        },
        Case {
            name: "dj is linewise",
            text: &["l1", "l2", "l3"],
            caret: (0, 1),
            keys: "dj",
            want: &["l3"],
            want_caret: (0, 0),
        },
        Case {
            name: "dd with count",
            text: &["l1", "l2", "l3", "l4"],
            caret: (1, 0),
            keys: "2dd",
            want: &["l1", "l4"],
            want_caret: (1, 0),
        },
        Case {
            name: "dG deletes to last line",
            text: &["keep", "x", "y"],
            caret: (1, 0),
            keys: "dG",
            want: &["keep"],
            want_caret: (0, 0),
        },
        Case {
            name: "failed find abandons the operator",
            text: &["abc"],
            caret: (0, 0),
            keys: "dfz",
            want: &["abc"],
            want_caret: (0, 0),
        },
        Case {
            name: "dt stops before the target",
            text: &["a(b)c"],
            caret: (0, 0),
            keys: "dt)",
            want: &[")c"],
            want_caret: (0, 0),
        },
        Case {
            name: "diw removes the word only",
            text: &["foo bar baz"],
            caret: (0, 5),
            keys: "diw",
            want: &["foo  baz"],
            want_caret: (0, 4),
        },
        Case {
            name: "daw takes trailing space",
            text: &["foo bar baz"],
            caret: (0, 5),
            keys: "daw",
            want: &["foo baz"],
            want_caret: (0, 4),
        },
        Case {
            name: "di( inside parentheses",
            text: &["f(a, b)"],
            caret: (0, 3),
            keys: "di(",
            want: &["f()"],
            want_caret: (0, 2),
        },
        Case {
            name: "gUiw uppercases the word",
            text: &["foo bar"],
            caret: (0, 5),
            keys: "gUiw",
            want: &["foo BAR"],
            want_caret: (0, 4),
        },
        Case {
            name: "g~~ toggles the line",
            text: &["Foo Bar"],
            caret: (0, 2),
            keys: "g~~",
            want: &["fOO bAR"],
            want_caret: (0, 2),
        },
        Case {
            name: "yy then p duplicates the line",
            text: &["one", "two"],
            caret: (0, 1),
            keys: "yyp",
            want: &["one", "one", "two"],
            want_caret: (1, 0),
        },
        Case {
            name: "x with count",
            text: &["abcdef"],
            caret: (0, 1),
            keys: "3x",
            want: &["aef"],
            want_caret: (0, 1),
        },
    ];
    for case in cases {
        let mut h = Harness::new(case.text);
        h.carets(&[case.caret]);
        h.keys(case.keys);
        assert_eq!(h.lines(), lines(case.want), "{}", case.name);
        assert_eq!(h.caret(), case.want_caret, "{} (caret)", case.name);
    }
}

#[test]
fn shifting_follows_shiftwidth_and_expandtab() {
    let config = Config::parse("[editor]\nshiftwidth = 4\nexpandtab = true\n[engine]\nstrict = true\n").unwrap();
    let mut h = Harness::with_config(&["x", "", "        y"], config);
    h.keys(">>");
    assert_eq!(h.lines(), lines(&["    x", "", "        y"]));
    assert_eq!(h.caret(), (0, 4));
    h.keys("jj<<");
    assert_eq!(h.lines(), lines(&["    x", "", "    y"]));
    assert_eq!(h.caret(), (2, 4));
    h.keys("gg>2j");
    assert_eq!(h.lines(), lines(&["        x", "", "        y"]));
}

#[test]
fn shifting_with_tabs_uses_tabstop() {
    let mut h = Harness::new(&["x"]);
    h.keys(">>");
    assert_eq!(h.lines(), lines(&["\tx"]));
    assert_eq!(h.caret(), (0, 1));
}

#[test]
fn change_word_enters_insert_and_types() {
    let mut h = Harness::new(&["foo bar"]);
    h.keys("cwbaz<Esc>");
    assert_eq!(h.lines(), lines(&["baz bar"]));
    assert_eq!(h.caret(), (0, 2));
}

#[test]
fn change_line_keeps_indent() {
    let mut h = Harness::new(&["    old", "next"]);
    h.keys("ccnew<Esc>");
    assert_eq!(h.lines(), lines(&["    new", "next"]));
}

#[test]
fn exclusive_motion_to_column_zero_becomes_linewise() {
    let mut h = Harness::new(&["first", "", "second", "third"]);
    h.keys("d}");
    assert_eq!(h.lines(), lines(&["", "second", "third"]));
}

#[test]
fn join_lines_with_count() {
    let mut h = Harness::new(&["a", "  b", "c", "d"]);
    h.keys("3J");
    assert_eq!(h.lines(), lines(&["a b c", "d"]));
}
