#![allow(dead_code)] // Shared across many integration tests; each test binary uses a subset of helpers.

use core_actions::Vim;
use core_config::Config;
use core_model::{MemoryEditor, MinimalExCommands, TextEditor};
use core_state::{Mode, Register, Registers, VimState};
use core_text::{Cursor, Position};

/// One engine, one document and an in-memory editor, driven by key notation.
pub struct Harness {
    pub vim: Vim,
    pub doc: VimState,
    pub editor: MemoryEditor,
}

impl Harness {
    pub fn new(lines: &[&str]) -> Self {
        Self::with_config(lines, Config::strict_defaults())
    }

    pub fn with_config(lines: &[&str], config: Config) -> Self {
        let vim = Vim::new(config, Registers::default(), Box::new(MinimalExCommands)).expect("engine");
        Self {
            vim,
            doc: VimState::new("test.txt"),
            editor: MemoryEditor::from_lines("test.txt", lines.iter().copied()),
        }
    }

    /// Send keys and return `self` for chaining.
    pub fn keys(&mut self, notation: &str) -> &mut Self {
        self.vim
            .send(&mut self.doc, &mut self.editor, notation)
            .unwrap_or_else(|e| panic!("keys {notation:?} failed: {e}"));
        self
    }

    /// Place carets (Normal mode) the way a host would before the next key.
    pub fn carets(&mut self, carets: &[(usize, usize)]) -> &mut Self {
        let selections = carets.iter().map(|&(l, c)| Cursor::at(Position::new(l, c))).collect();
        self.editor.set_selections(selections);
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.editor.lines()
    }

    pub fn caret(&self) -> (usize, usize) {
        let p = self.doc.primary().stop;
        (p.line, p.character)
    }

    pub fn carets_now(&self) -> Vec<(usize, usize)> {
        self.doc.cursors.iter().map(|c| (c.stop.line, c.stop.character)).collect()
    }

    pub fn mode(&self) -> Mode {
        self.doc.mode()
    }

    pub fn register(&mut self, name: char) -> Option<Register> {
        self.vim.registers_mut().get(Some(name)).expect("valid register")
    }

    pub fn register_text(&mut self, name: char) -> String {
        self.register(name).map(|r| r.text()).unwrap_or_default()
    }

    pub fn status(&self) -> Option<String> {
        self.editor.last_status().map(|s| s.text.clone())
    }
}

pub fn lines(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}
