//! Visual, visual-line and visual-block selections.

mod common;

use common::{Harness, lines};
use core_state::{Mode, RegisterMode};
use pretty_assertions::assert_eq;

#[test]
fn charwise_delete_is_inclusive() {
    let mut h = Harness::new(&["abcd"]);
    h.keys("vld");
    assert_eq!(h.lines(), lines(&["cd"]));
    assert_eq!(h.register_text('"'), "ab");
    assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn charwise_selection_across_lines() {
    let mut h = Harness::new(&["abc", "def"]);
    h.carets(&[(0, 1)]);
    h.keys("vjd");
    assert_eq!(h.lines(), lines(&["af"]));
}

#[test]
fn linewise_yank_and_put() {
    let mut h = Harness::new(&["one", "two"]);
    h.keys("Vyjp");
    assert_eq!(h.lines(), lines(&["one", "two", "one"]));
    assert_eq!(h.register('"').unwrap().mode(), RegisterMode::LineWise);
}

#[test]
fn put_over_a_line_selection_swaps_the_register() {
    let mut h = Harness::new(&["a", "b"]);
    h.keys("yyjVp");
    assert_eq!(h.lines(), lines(&["a", "a"]));
    assert_eq!(h.register_text('"'), "b\n");
}

#[test]
fn other_end_swaps_the_moving_side() {
    let mut h = Harness::new(&["abcdef"]);
    h.carets(&[(0, 2)]);
    h.keys("vllo");
    let primary = h.doc.primary();
    assert_eq!((primary.start.character, primary.stop.character), (4, 2));
    h.keys("hd");
    assert_eq!(h.lines(), lines(&["af"]));
}

#[test]
fn gv_restores_the_last_selection() {
    let mut h = Harness::new(&["abcdef"]);
    h.keys("vll<Esc>");
    assert_eq!(h.mode(), Mode::Normal);
    h.keys("$gv");
    assert_eq!(h.mode(), Mode::Visual);
    let primary = h.doc.primary();
    assert_eq!((primary.start.character, primary.stop.character), (0, 2));
    h.keys("d");
    assert_eq!(h.lines(), lines(&["def"]));
}

#[test]
fn text_objects_extend_the_selection() {
    let mut h = Harness::new(&["foo bar baz"]);
    h.carets(&[(0, 5)]);
    h.keys("viwd");
    assert_eq!(h.lines(), lines(&["foo  baz"]));
}

#[test]
fn case_operators_on_a_selection() {
    let mut h = Harness::new(&["abc"]);
    h.keys("vlU");
    assert_eq!(h.lines(), lines(&["ABc"]));
    h.keys("v$~");
    assert_eq!(h.lines(), lines(&["abC"]));
}

#[test]
fn block_delete_removes_a_column() {
    let mut h = Harness::new(&["abcd", "efgh", "ijk"]);
    h.carets(&[(0, 1)]);
    h.keys("<C-v>jjld");
    assert_eq!(h.lines(), lines(&["ad", "eh", "i"]));
    assert_eq!(h.register('"').unwrap().mode(), RegisterMode::BlockWise);
}

#[test]
fn line_selection_with_a_motion_switches_modes() {
    let mut h = Harness::new(&["a", "b", "c"]);
    h.keys("vV");
    assert_eq!(h.mode(), Mode::VisualLine);
    h.keys("jd");
    assert_eq!(h.lines(), lines(&["c"]));
}

#[test]
fn replace_every_selected_character() {
    let mut h = Harness::new(&["abcd"]);
    h.keys("lvlrx");
    assert_eq!(h.lines(), lines(&["axxd"]));
}

#[test]
fn join_selected_lines() {
    let mut h = Harness::new(&["a", "b", "c", "d"]);
    h.keys("VjjJ");
    assert_eq!(h.lines(), lines(&["a b c", "d"]));
}

#[test]
fn command_line_from_a_selection_records_it_for_gv() {
    let mut h = Harness::new(&["abc", "def"]);
    h.keys("vj:<CR>");
    assert_eq!(h.mode(), Mode::Normal);
    h.keys("gv");
    assert_eq!(h.mode(), Mode::Visual);
    assert_eq!(h.doc.primary().stop.line, 1);
}
