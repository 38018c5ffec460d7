//! Insert-mode editing keys.

mod common;

use common::{Harness, lines};
use core_config::Config;
use core_state::Mode;
use pretty_assertions::assert_eq;

fn expanding_tabs() -> Config {
    Config::parse("[editor]\ntabstop = 4\nexpandtab = true\n[engine]\nstrict = true\n").unwrap()
}

#[test]
fn ctrl_w_deletes_the_word_before_the_caret() {
    let mut h = Harness::new(&["foo bar"]);
    h.keys("A<C-w>baz<Esc>");
    assert_eq!(h.lines(), lines(&["foo baz"]));
    assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn ctrl_u_stops_at_the_indent_then_clears_it() {
    let mut h = Harness::new(&["    indented text"]);
    h.keys("A<C-u>x<Esc>");
    assert_eq!(h.lines(), lines(&["    x"]));

    let mut h = Harness::new(&["    indented text"]);
    h.keys("A<C-u><C-u>y<Esc>");
    assert_eq!(h.lines(), lines(&["y"]));
}

#[test]
fn tab_inserts_a_tab_character_by_default() {
    let mut h = Harness::new(&["ab"]);
    h.keys("A<Tab>c<Esc>");
    assert_eq!(h.lines(), lines(&["ab\tc"]));
}

#[test]
fn tab_with_expandtab_pads_to_the_next_stop() {
    let mut h = Harness::with_config(&["ab", "x"], expanding_tabs());
    h.keys("A<Tab>c<Esc>");
    assert_eq!(h.lines(), lines(&["ab  c", "x"]));
    h.keys("jI<Tab><Esc>");
    assert_eq!(h.lines(), lines(&["ab  c", "    x"]));
}

#[test]
fn ctrl_r_inserts_register_text() {
    let mut h = Harness::new(&["hello"]);
    h.keys("yiwA <C-r>\"<Esc>");
    assert_eq!(h.lines(), lines(&["hello hello"]));

    h.keys("\"ayiwo<C-r>a!<Esc>");
    assert_eq!(h.lines(), lines(&["hello hello", "hello!"]));
}

#[test]
fn ctrl_r_of_an_empty_register_reports_e353_and_stays_in_insert() {
    let mut h = Harness::new(&["abc"]);
    h.keys("A<C-r>z");
    assert_eq!(h.status().as_deref(), Some("E353: Nothing in register z"));
    assert_eq!(h.mode(), Mode::Insert);
    h.keys("<Esc>");
    assert_eq!(h.lines(), lines(&["abc"]));
}

#[test]
fn ctrl_r_of_a_recording_types_its_keys() {
    let mut h = Harness::new(&["abc"]);
    h.keys("qqxlq");
    assert_eq!(h.lines(), lines(&["bc"]));
    h.keys("A<C-r>q<Esc>");
    assert_eq!(h.lines(), lines(&["bcxl"]));
    assert_eq!(h.mode(), Mode::Normal);
}
