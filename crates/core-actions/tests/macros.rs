//! Macro recording and replay.

mod common;

use common::{Harness, lines};
use core_config::Config;
use core_model::MemoryEditor;
use core_state::Mode;
use pretty_assertions::assert_eq;

#[test]
fn replaying_a_macro_matches_typing_it() {
    let mut recorded = Harness::new(&["abc", "def", "ghi"]);
    recorded.keys("qa0xjq@a");

    let mut typed = Harness::new(&["abc", "def", "ghi"]);
    typed.keys("0xj0xj");

    assert_eq!(recorded.lines(), typed.lines());
    assert_eq!(recorded.caret(), typed.caret());
    assert_eq!(recorded.lines(), lines(&["bc", "ef", "ghi"]));
}

#[test]
fn counted_replay_runs_each_time() {
    let mut h = Harness::new(&["a", "b", "c", "d"]);
    h.keys("qaA;<Esc>jq2@a");
    assert_eq!(h.lines(), lines(&["a;", "b;", "c;", "d"]));
    assert_eq!(h.caret().0, 3);
    assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn failed_motion_aborts_remaining_repetitions() {
    let mut h = Harness::new(&["x1", "x2", "x3"]);
    h.keys("qaA!<Esc>jq5@a");
    assert_eq!(h.lines(), lines(&["x1!", "x2!", "x3!"]));
    assert_eq!(h.caret(), (2, 2));
}

#[test]
fn at_at_repeats_the_last_macro() {
    let mut h = Harness::new(&["1", "2", "3", "4"]);
    h.keys("qbI-<Esc>jq@b@@");
    assert_eq!(h.lines(), lines(&["-1", "-2", "-3", "4"]));
}

#[test]
fn at_at_without_a_previous_macro_reports_e748() {
    let mut h = Harness::new(&["x"]);
    h.keys("@@");
    assert_eq!(h.status().as_deref(), Some("E748: No previously used register"));
}

#[test]
fn at_colon_repeats_the_command_line() {
    let mut h = Harness::new(&["a", "b"]);
    h.keys(":normal A.<lt>Esc><CR>");
    assert_eq!(h.lines(), lines(&["a.", "b"]));
    h.keys("j@:");
    assert_eq!(h.lines(), lines(&["a.", "b."]));
    assert_eq!(h.register_text(':'), "normal A.<Esc>");
}

#[test]
fn text_register_replays_as_typed_keys() {
    let mut h = Harness::new(&["Ax<Esc>", "target"]);
    // Yank the first line's text (without its break) and run it.
    h.keys("\"ty$j@t");
    assert_eq!(h.lines(), lines(&["Ax<Esc>", "targetx<Esc>"]));
    assert_eq!(h.mode(), Mode::Insert);
}

#[test]
fn recording_stops_on_q_and_keeps_the_register() {
    let mut h = Harness::new(&["abc"]);
    h.keys("qzxq");
    assert!(h.vim.registers_mut().get(Some('z')).unwrap().is_some());
    assert_eq!(h.lines(), lines(&["bc"]));
    h.keys("@z");
    assert_eq!(h.lines(), lines(&["c"]));
}

#[test]
fn lenient_mode_ignores_empty_registers() {
    let mut h = Harness::with_config(&["abc"], Config::default());
    h.keys("@kx");
    assert_eq!(h.lines(), lines(&["bc"]));
}

#[test]
fn unwritten_register_is_a_no_op_when_strict() {
    let mut h = Harness::new(&["abc"]);
    h.keys("@z3@yx");
    assert_eq!(h.lines(), lines(&["bc"]));
    assert_eq!(h.doc.replaying, 0);
}

#[test]
fn document_name_registers_cannot_be_run() {
    let mut h = Harness::new(&["one", "two", "three"]);
    h.editor = MemoryEditor::from_lines("dd", ["one", "two", "three"]);
    h.keys("@%");
    assert_eq!(h.status().as_deref(), Some("E354: Invalid register name: '%'"));
    h.keys("@#");
    assert_eq!(h.status().as_deref(), Some("E354: Invalid register name: '#'"));
    assert_eq!(h.lines(), lines(&["one", "two", "three"]));
    assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn macros_run_inside_a_visual_selection() {
    let mut h = Harness::new(&["abcdef"]);
    h.keys("qalq0v@a");
    assert_eq!(h.mode(), Mode::Visual);
    h.keys("d");
    assert_eq!(h.lines(), lines(&["cdef"]));
}
