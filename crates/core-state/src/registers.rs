//! Register store.
//!
//! One store per engine, shared by every document. Holds the named (`a`-`z`),
//! numbered (`0`-`9`) and special registers. Writes from the action layer go
//! through [`Registers::put`], which applies append, black-hole, read-only and
//! numbered-register rules; the engine fills the read-only registers through
//! [`Registers::put_engine_register`].
//!
//! Multi-cursor yanks store one entry per cursor index. A put with a matching
//! number of cursors addresses entries by index; otherwise the entries are
//! joined.

use crate::{RecordedState, VimError};
use core_model::{Clipboard, MemoryClipboard, RegisterStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

pub const PERSIST_VERSION: u32 = 1;

const NUMBERED: [char; 9] = ['1', '2', '3', '4', '5', '6', '7', '8', '9'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RegisterMode {
    #[default]
    CharacterWise,
    LineWise,
    BlockWise,
}

impl RegisterMode {
    /// Mode of `a` appended with `b`: linewise wins, then blockwise.
    pub fn combine(a: RegisterMode, b: RegisterMode) -> RegisterMode {
        use RegisterMode::*;
        match (a, b) {
            (LineWise, _) | (_, LineWise) => LineWise,
            (BlockWise, _) | (_, BlockWise) => BlockWise,
            _ => CharacterWise,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterContent {
    Text(String),
    /// One string per line of a block selection.
    Lines(Vec<String>),
    /// A captured action sequence (macro).
    Recorded(Box<RecordedState>),
}

impl RegisterContent {
    pub fn text(&self) -> String {
        match self {
            RegisterContent::Text(s) => s.clone(),
            RegisterContent::Lines(lines) => lines.join("\n"),
            RegisterContent::Recorded(r) => r.keys_display(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterEntry {
    pub content: RegisterContent,
    pub mode: RegisterMode,
}

impl RegisterEntry {
    pub fn text(text: impl Into<String>, mode: RegisterMode) -> Self {
        Self {
            content: RegisterContent::Text(text.into()),
            mode,
        }
    }

    pub fn block(lines: Vec<String>) -> Self {
        Self {
            content: RegisterContent::Lines(lines),
            mode: RegisterMode::BlockWise,
        }
    }

    pub fn recorded(recorded: RecordedState) -> Self {
        Self {
            content: RegisterContent::Recorded(Box::new(recorded)),
            mode: RegisterMode::CharacterWise,
        }
    }

    /// Linewise text is stored with its trailing line break.
    pub fn lines(lines: &[String]) -> Self {
        let mut text = lines.join("\n");
        text.push('\n');
        Self::text(text, RegisterMode::LineWise)
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self.content, RegisterContent::Recorded(_))
    }

    /// The content split into lines; linewise text loses its final break.
    pub fn as_lines(&self) -> Vec<String> {
        match &self.content {
            RegisterContent::Lines(lines) => lines.clone(),
            other => {
                let text = other.text();
                let body = match self.mode {
                    RegisterMode::LineWise => text.strip_suffix('\n').unwrap_or(&text).to_string(),
                    _ => text,
                };
                body.split('\n').map(str::to_string).collect()
            }
        }
    }

    fn append(self, new: RegisterEntry) -> RegisterEntry {
        match (self.content, new.content) {
            (RegisterContent::Recorded(mut old), RegisterContent::Recorded(more)) => {
                old.extend_from(&more);
                RegisterEntry::recorded(*old)
            }
            (old, new_content) => {
                let mode = RegisterMode::combine(self.mode, new.mode);
                match mode {
                    RegisterMode::LineWise => {
                        let mut text = old.text();
                        if !text.is_empty() && !text.ends_with('\n') {
                            text.push('\n');
                        }
                        text.push_str(&new_content.text());
                        if !text.ends_with('\n') {
                            text.push('\n');
                        }
                        RegisterEntry::text(text, mode)
                    }
                    RegisterMode::BlockWise => {
                        let mut lines = RegisterEntry {
                            content: old,
                            mode: self.mode,
                        }
                        .as_lines();
                        lines.extend(
                            RegisterEntry {
                                content: new_content,
                                mode: new.mode,
                            }
                            .as_lines(),
                        );
                        RegisterEntry::block(lines)
                    }
                    RegisterMode::CharacterWise => {
                        RegisterEntry::text(old.text() + &new_content.text(), mode)
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Register {
    pub entries: Vec<RegisterEntry>,
}

impl Register {
    pub fn single(entry: RegisterEntry) -> Self {
        Self {
            entries: vec![entry],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mode(&self) -> RegisterMode {
        self.entries.first().map(|e| e.mode).unwrap_or_default()
    }

    /// All entries as one string.
    pub fn text(&self) -> String {
        match self.mode() {
            RegisterMode::LineWise => self.entries.iter().map(|e| e.content.text()).collect(),
            _ => self
                .entries
                .iter()
                .map(|e| e.content.text())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// The entry a put by cursor `cursor_index` of `cursor_count` uses.
    pub fn entry_for(&self, cursor_index: usize, cursor_count: usize) -> Option<RegisterEntry> {
        if self.entries.len() == 1 {
            return self.entries.first().cloned();
        }
        if self.entries.len() == cursor_count {
            return self.entries.get(cursor_index).cloned();
        }
        if self.entries.iter().any(RegisterEntry::is_recorded) {
            return self.entries.first().cloned();
        }
        Some(RegisterEntry::text(self.text(), self.mode()))
    }
}

/// Which numbered-register bookkeeping a write triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Yank,
    Delete,
    Other,
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("invalid register name '{0}'")]
    InvalidName(char),
    #[error("register blob: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RegisterError> for VimError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::InvalidName(c) => VimError::InvalidRegisterName(c),
            other => VimError::Other(other.to_string()),
        }
    }
}

pub fn is_valid_name(c: char) -> bool {
    c.is_ascii_alphanumeric() || "\"*+.-/:%#_=".contains(c)
}

pub fn is_read_only(c: char) -> bool {
    ".%#:/".contains(c)
}

pub fn is_clipboard(c: char) -> bool {
    c == '*' || c == '+'
}

fn persistable(c: char) -> bool {
    c != '_' && !is_clipboard(c) && !is_read_only(c)
}

/// `:registers` listing order.
const LIST_ORDER: &str = "\"0123456789abcdefghijklmnopqrstuvwxyz-.:%#/*+=";

/// Render register text for a listing: line breaks as `^J`, other control
/// characters in caret notation.
pub fn display_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("^J"),
            c if (c as u32) < 0x20 => {
                out.push('^');
                out.push(char::from(b'@' + c as u8));
            }
            '\u{7f}' => out.push_str("^?"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PersistedContent {
    Text(String),
    Lines(Vec<String>),
}

#[derive(Serialize, Deserialize)]
struct PersistedEntry {
    content: PersistedContent,
    mode: RegisterMode,
}

#[derive(Serialize, Deserialize)]
struct PersistedRegisters {
    version: u32,
    registers: Vec<(char, Vec<PersistedEntry>)>,
}

pub struct Registers {
    slots: HashMap<char, Register>,
    clipboard: Box<dyn Clipboard>,
    use_system_clipboard: bool,
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registers")
            .field("slots", &self.slots)
            .field("use_system_clipboard", &self.use_system_clipboard)
            .finish_non_exhaustive()
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(Box::new(MemoryClipboard::new()), false)
    }
}

impl Registers {
    pub fn new(clipboard: Box<dyn Clipboard>, use_system_clipboard: bool) -> Self {
        Self {
            slots: HashMap::new(),
            clipboard,
            use_system_clipboard,
        }
    }

    pub fn set_use_system_clipboard(&mut self, on: bool) {
        self.use_system_clipboard = on;
    }

    /// Register used when none is named.
    pub fn default_name(&self) -> char {
        if self.use_system_clipboard { '*' } else { '"' }
    }

    /// Write from the action layer.
    pub fn put(
        &mut self,
        name: Option<char>,
        entry: RegisterEntry,
        cursor_index: usize,
        kind: WriteKind,
    ) -> Result<(), RegisterError> {
        let target = name.unwrap_or_else(|| self.default_name());
        if !is_valid_name(target) {
            return Err(RegisterError::InvalidName(target));
        }
        if target == '_' {
            debug!(target: "registers", "black_hole_write");
            return Ok(());
        }
        if is_read_only(target) {
            debug!(target: "registers", register = %target, "read_only_write_ignored");
            return Ok(());
        }
        let explicit = name.is_some_and(|c| c != '"' && c != self.default_name());
        let slot = target.to_ascii_lowercase();
        let append = target.is_ascii_uppercase();
        debug!(target: "registers", register = %slot, append, cursor_index, ?kind, mode = ?entry.mode, "put");

        if !explicit {
            match kind {
                WriteKind::Yank => self.write_slot('0', entry.clone(), cursor_index, false),
                WriteKind::Delete => {
                    let multiline =
                        entry.mode == RegisterMode::LineWise || entry.content.text().contains('\n');
                    if multiline {
                        if cursor_index == 0 {
                            self.shift_numbered();
                        }
                        self.write_slot('1', entry.clone(), cursor_index, false);
                    } else {
                        self.write_slot('-', entry.clone(), cursor_index, false);
                    }
                }
                WriteKind::Other => {}
            }
        }

        self.write_slot(slot, entry, cursor_index, append);
        if is_clipboard(slot) {
            self.sync_clipboard(slot);
        }
        if slot != '"'
            && let Some(reg) = self.slots.get(&slot).cloned()
        {
            self.slots.insert('"', reg);
        }
        Ok(())
    }

    /// Store a recorded macro; `qA` appends.
    pub fn store_macro(&mut self, name: char, recorded: RecordedState) -> Result<(), RegisterError> {
        if !is_valid_name(name) || is_read_only(name) {
            return Err(RegisterError::InvalidName(name));
        }
        if name == '_' {
            return Ok(());
        }
        let slot = name.to_ascii_lowercase();
        self.write_slot(slot, RegisterEntry::recorded(recorded), 0, name.is_ascii_uppercase());
        debug!(target: "registers", register = %slot, "macro_stored");
        Ok(())
    }

    /// Write path reserved for the engine (`.`, `:`, `/`, `%`, `#`).
    pub fn put_engine_register(&mut self, name: char, text: impl Into<String>) {
        self.slots.insert(
            name,
            Register::single(RegisterEntry::text(text, RegisterMode::CharacterWise)),
        );
    }

    pub fn clear_engine_register(&mut self, name: char) {
        self.slots.remove(&name);
    }

    /// Read a register. Clipboard registers first adopt any change made to
    /// the clipboard outside the engine. `Ok(None)` means empty.
    pub fn get(&mut self, name: Option<char>) -> Result<Option<Register>, RegisterError> {
        let target = name.unwrap_or_else(|| self.default_name());
        if !is_valid_name(target) {
            return Err(RegisterError::InvalidName(target));
        }
        if target == '_' {
            return Ok(None);
        }
        let slot = target.to_ascii_lowercase();
        if is_clipboard(slot) {
            self.reconcile_clipboard(slot);
        }
        Ok(self.slots.get(&slot).filter(|r| !r.is_empty()).cloned())
    }

    /// Non-empty registers in `:registers` order with their display text.
    pub fn list(&mut self) -> Vec<(char, String)> {
        self.reconcile_clipboard('*');
        self.reconcile_clipboard('+');
        LIST_ORDER
            .chars()
            .filter_map(|c| {
                let reg = self.slots.get(&c).filter(|r| !r.is_empty())?;
                let text = match reg.entries.first().map(|e| &e.content) {
                    Some(RegisterContent::Recorded(r)) => r.keys_display(),
                    _ => display_text(&reg.text()),
                };
                Some((c, text))
            })
            .collect()
    }

    fn write_slot(&mut self, slot: char, entry: RegisterEntry, cursor_index: usize, append: bool) {
        let reg = self.slots.entry(slot).or_default();
        if append && let Some(existing) = reg.entries.get_mut(cursor_index) {
            let old = std::mem::replace(existing, RegisterEntry::text("", RegisterMode::CharacterWise));
            *existing = old.append(entry);
            return;
        }
        if cursor_index == 0 {
            reg.entries = vec![entry];
        } else if cursor_index < reg.entries.len() {
            reg.entries[cursor_index] = entry;
        } else {
            reg.entries.push(entry);
        }
    }

    fn shift_numbered(&mut self) {
        for i in (1..NUMBERED.len()).rev() {
            match self.slots.remove(&NUMBERED[i - 1]) {
                Some(reg) => {
                    self.slots.insert(NUMBERED[i], reg);
                }
                None => {
                    self.slots.remove(&NUMBERED[i]);
                }
            }
        }
    }

    fn sync_clipboard(&mut self, slot: char) {
        let Some(text) = self.slots.get(&slot).map(Register::text) else {
            return;
        };
        if let Err(e) = self.clipboard.set(&text) {
            warn!(target: "registers", error = %e, "clipboard_write_failed");
        }
    }

    fn reconcile_clipboard(&mut self, slot: char) {
        let text = match self.clipboard.get() {
            Ok(text) => text,
            Err(e) => {
                warn!(target: "registers", error = %e, "clipboard_read_failed");
                return;
            }
        };
        let known = self.slots.get(&slot).map(Register::text);
        if known.as_deref() == Some(text.as_str()) || (known.is_none() && text.is_empty()) {
            return;
        }
        debug!(target: "registers", register = %slot, "clipboard_changed_externally");
        let mode = if text.ends_with('\n') {
            RegisterMode::LineWise
        } else {
            RegisterMode::CharacterWise
        };
        self.slots
            .insert(slot, Register::single(RegisterEntry::text(text, mode)));
    }

    // ---------------------------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------------------------

    pub fn to_json(&self) -> Result<String, RegisterError> {
        let mut registers: Vec<(char, Vec<PersistedEntry>)> = self
            .slots
            .iter()
            .filter(|(c, _)| persistable(**c))
            .filter_map(|(c, reg)| {
                let entries: Vec<PersistedEntry> = reg
                    .entries
                    .iter()
                    .filter_map(|e| {
                        let content = match &e.content {
                            RegisterContent::Text(s) => PersistedContent::Text(s.clone()),
                            RegisterContent::Lines(l) => PersistedContent::Lines(l.clone()),
                            RegisterContent::Recorded(_) => return None,
                        };
                        Some(PersistedEntry {
                            content,
                            mode: e.mode,
                        })
                    })
                    .collect();
                (!entries.is_empty()).then_some((*c, entries))
            })
            .collect();
        registers.sort_by_key(|(c, _)| LIST_ORDER.find(*c).unwrap_or(usize::MAX));
        Ok(serde_json::to_string(&PersistedRegisters {
            version: PERSIST_VERSION,
            registers,
        })?)
    }

    /// Merge a persisted blob. Blobs from another version are ignored.
    pub fn load_json(&mut self, blob: &str) -> Result<(), RegisterError> {
        let persisted: PersistedRegisters = serde_json::from_str(blob)?;
        if persisted.version != PERSIST_VERSION {
            warn!(target: "registers", version = persisted.version, "unknown_register_blob_version_ignored");
            return Ok(());
        }
        for (name, entries) in persisted.registers {
            if !is_valid_name(name) || !persistable(name) {
                continue;
            }
            let entries = entries
                .into_iter()
                .map(|e| RegisterEntry {
                    content: match e.content {
                        PersistedContent::Text(s) => RegisterContent::Text(s),
                        PersistedContent::Lines(l) => RegisterContent::Lines(l),
                    },
                    mode: e.mode,
                })
                .collect();
            self.slots.insert(name, Register { entries });
        }
        Ok(())
    }

    pub fn load(&mut self, store: &dyn RegisterStore) -> anyhow::Result<()> {
        if let Some(blob) = store.load()? {
            self.load_json(&blob)?;
        }
        Ok(())
    }

    pub fn save(&self, store: &dyn RegisterStore) -> anyhow::Result<()> {
        store.save(&self.to_json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::MemoryRegisterStore;
    use pretty_assertions::assert_eq;

    fn text_of(regs: &mut Registers, c: char) -> Option<String> {
        regs.get(Some(c)).unwrap().map(|r| r.text())
    }

    #[test]
    fn unnamed_yank_also_fills_register_zero() {
        let mut regs = Registers::default();
        regs.put(None, RegisterEntry::text("abc", RegisterMode::CharacterWise), 0, WriteKind::Yank)
            .unwrap();
        assert_eq!(text_of(&mut regs, '0').as_deref(), Some("abc"));
        assert_eq!(text_of(&mut regs, '"').as_deref(), Some("abc"));

        regs.put(Some('a'), RegisterEntry::text("x", RegisterMode::CharacterWise), 0, WriteKind::Yank)
            .unwrap();
        assert_eq!(text_of(&mut regs, '0').as_deref(), Some("abc"), "explicit register leaves 0 alone");
        assert_eq!(text_of(&mut regs, '"').as_deref(), Some("x"));
    }

    #[test]
    fn linewise_deletes_shift_numbered_registers() {
        let mut regs = Registers::default();
        for i in 1..=11 {
            regs.put(None, RegisterEntry::lines(&[format!("line{i}")]), 0, WriteKind::Delete)
                .unwrap();
        }
        assert_eq!(text_of(&mut regs, '1').as_deref(), Some("line11\n"));
        assert_eq!(text_of(&mut regs, '9').as_deref(), Some("line3\n"));
        assert_eq!(text_of(&mut regs, '-'), None);
    }

    #[test]
    fn small_deletes_go_to_the_minus_register() {
        let mut regs = Registers::default();
        regs.put(None, RegisterEntry::text("w", RegisterMode::CharacterWise), 0, WriteKind::Delete)
            .unwrap();
        assert_eq!(text_of(&mut regs, '-').as_deref(), Some("w"));
        assert_eq!(text_of(&mut regs, '1'), None);
        regs.put(None, RegisterEntry::text("a\nb", RegisterMode::CharacterWise), 0, WriteKind::Delete)
            .unwrap();
        assert_eq!(text_of(&mut regs, '1').as_deref(), Some("a\nb"));
    }

    #[test]
    fn black_hole_and_read_only_writes_are_dropped() {
        let mut regs = Registers::default();
        regs.put(None, RegisterEntry::text("keep", RegisterMode::CharacterWise), 0, WriteKind::Yank)
            .unwrap();
        regs.put(Some('_'), RegisterEntry::lines(&["gone".into()]), 0, WriteKind::Delete)
            .unwrap();
        regs.put(Some('.'), RegisterEntry::text("nope", RegisterMode::CharacterWise), 0, WriteKind::Other)
            .unwrap();
        assert_eq!(text_of(&mut regs, '"').as_deref(), Some("keep"));
        assert_eq!(text_of(&mut regs, '1'), None);
        assert_eq!(text_of(&mut regs, '.'), None);
        assert_eq!(regs.get(Some('_')).unwrap(), None);

        regs.put_engine_register('.', "typed");
        assert_eq!(text_of(&mut regs, '.').as_deref(), Some("typed"));
        assert_eq!(text_of(&mut regs, '"').as_deref(), Some("keep"));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut regs = Registers::default();
        let err = regs
            .put(Some('!'), RegisterEntry::text("x", RegisterMode::CharacterWise), 0, WriteKind::Yank)
            .unwrap_err();
        assert_eq!(VimError::from(err), VimError::InvalidRegisterName('!'));
        assert!(regs.get(Some('?')).is_err());
    }

    #[test]
    fn uppercase_appends_with_line_rules() {
        let mut regs = Registers::default();
        regs.put(Some('a'), RegisterEntry::text("foo", RegisterMode::CharacterWise), 0, WriteKind::Yank)
            .unwrap();
        regs.put(Some('A'), RegisterEntry::text("bar", RegisterMode::CharacterWise), 0, WriteKind::Yank)
            .unwrap();
        assert_eq!(text_of(&mut regs, 'a').as_deref(), Some("foobar"));
        regs.put(Some('A'), RegisterEntry::lines(&["line".into()]), 0, WriteKind::Yank)
            .unwrap();
        let reg = regs.get(Some('a')).unwrap().unwrap();
        assert_eq!(reg.mode(), RegisterMode::LineWise);
        assert_eq!(reg.text(), "foobar\nline\n");
    }

    #[test]
    fn multi_cursor_entries_are_indexed() {
        let mut regs = Registers::default();
        for (i, word) in ["one", "two"].iter().enumerate() {
            regs.put(None, RegisterEntry::text(*word, RegisterMode::CharacterWise), i, WriteKind::Yank)
                .unwrap();
        }
        let reg = regs.get(None).unwrap().unwrap();
        assert_eq!(reg.entries.len(), 2);
        assert_eq!(reg.entry_for(1, 2).unwrap().content.text(), "two");
        assert_eq!(reg.entry_for(0, 1).unwrap().content.text(), "one\ntwo");
    }

    #[test]
    fn clipboard_registers_mirror_and_adopt_external_changes() {
        let clip = MemoryClipboard::new();
        let mut handle = clip.clone();
        let mut regs = Registers::new(Box::new(clip), true);
        assert_eq!(regs.default_name(), '*');
        regs.put(None, RegisterEntry::text("yanked", RegisterMode::CharacterWise), 0, WriteKind::Yank)
            .unwrap();
        assert_eq!(handle.get().unwrap(), "yanked");
        assert_eq!(text_of(&mut regs, '"').as_deref(), Some("yanked"));

        handle.set("from outside\n").unwrap();
        let reg = regs.get(None).unwrap().unwrap();
        assert_eq!(reg.text(), "from outside\n");
        assert_eq!(reg.mode(), RegisterMode::LineWise);
    }

    #[test]
    fn listing_follows_vim_order_and_escapes_controls() {
        let mut regs = Registers::default();
        regs.put(Some('b'), RegisterEntry::lines(&["x\ty".into()]), 0, WriteKind::Yank)
            .unwrap();
        regs.put_engine_register(':', "s/a/b/");
        let mut rec = RecordedState::new();
        rec.command_list = core_events::parse_keys("dw<Esc>").unwrap();
        regs.store_macro('q', rec).unwrap();
        let listed: Vec<char> = regs.list().iter().map(|(c, _)| *c).collect();
        assert_eq!(listed, vec!['"', 'b', 'q', ':']);
        let all = regs.list();
        assert_eq!(all[1].1, "x^Iy^J");
        assert_eq!(all[2].1, "dw<Esc>");
    }

    #[test]
    fn persistence_skips_macros_and_special_registers() {
        let mut regs = Registers::default();
        regs.put(Some('a'), RegisterEntry::lines(&["one".into()]), 0, WriteKind::Yank)
            .unwrap();
        regs.put(Some('b'), RegisterEntry::block(vec!["ab".into(), "cd".into()]), 0, WriteKind::Yank)
            .unwrap();
        regs.store_macro('q', RecordedState::new()).unwrap();
        regs.put_engine_register('/', "pat");

        let store = MemoryRegisterStore::new();
        regs.save(&store).unwrap();
        let blob = store.contents().unwrap();
        assert!(blob.starts_with("{\"version\":1,"));

        let mut fresh = Registers::default();
        fresh.load(&store).unwrap();
        assert_eq!(text_of(&mut fresh, 'a').as_deref(), Some("one\n"));
        assert_eq!(fresh.get(Some('b')).unwrap().unwrap().mode(), RegisterMode::BlockWise);
        assert_eq!(fresh.get(Some('q')).unwrap(), None);
        assert_eq!(fresh.get(Some('/')).unwrap(), None);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = core_model::FileRegisterStore::new(dir.path().join("nested").join("regs.json"));
        let mut regs = Registers::default();
        regs.put(Some('z'), RegisterEntry::text("zed", RegisterMode::CharacterWise), 0, WriteKind::Yank)
            .unwrap();
        regs.save(&store).unwrap();
        let mut fresh = Registers::default();
        fresh.load(&store).unwrap();
        assert_eq!(text_of(&mut fresh, 'z').as_deref(), Some("zed"));
    }

    #[test]
    fn unknown_blob_versions_are_ignored() {
        let mut regs = Registers::default();
        regs.load_json(r#"{"version":7,"registers":[["a",[{"content":{"text":"x"},"mode":"CharacterWise"}]]]}"#)
            .unwrap();
        assert_eq!(regs.get(Some('a')).unwrap(), None);
        assert!(regs.load_json("not json").is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn mode() -> impl Strategy<Value = RegisterMode> {
            prop_oneof![Just(RegisterMode::CharacterWise), Just(RegisterMode::LineWise)]
        }

        proptest! {
            #[test]
            fn appending_to_or_from_linewise_is_linewise(
                first in "[a-z]{1,6}",
                second in "[a-z]{1,6}",
                m1 in mode(),
                m2 in mode(),
            ) {
                prop_assume!(m1 == RegisterMode::LineWise || m2 == RegisterMode::LineWise);
                let mut regs = Registers::default();
                let entry = |s: &str, m| if m == RegisterMode::LineWise {
                    RegisterEntry::lines(&[s.to_string()])
                } else {
                    RegisterEntry::text(s, m)
                };
                regs.put(Some('r'), entry(&first, m1), 0, WriteKind::Yank).unwrap();
                regs.put(Some('R'), entry(&second, m2), 0, WriteKind::Yank).unwrap();
                let reg = regs.get(Some('r')).unwrap().unwrap();
                prop_assert_eq!(reg.mode(), RegisterMode::LineWise);
                prop_assert_eq!(reg.text(), format!("{first}\n{second}\n"));
            }
        }
    }
}
