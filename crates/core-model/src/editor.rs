use core_text::{Buffer, Position, Range, TextSource, first_non_blank_col};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, trace};

/// One text edit against the pre-commit snapshot of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Insert { at: Position, text: String },
    Replace { start: Position, end: Position, text: String },
    Delete { start: Position, end: Position },
}

impl Edit {
    /// Sorted `[start, end)` span the edit removes (empty for inserts).
    pub fn span(&self) -> (Position, Position) {
        match self {
            Edit::Insert { at, .. } => (*at, *at),
            Edit::Replace { start, end, .. } | Edit::Delete { start, end } => {
                Range::new(*start, *end).sorted()
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Edit::Insert { text, .. } | Edit::Replace { text, .. } => text,
            Edit::Delete { .. } => "",
        }
    }
}

/// Where a revealed line should sit in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealAt {
    Center,
    Top,
    Bottom,
}

/// Functionality the engine leaves to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Undo,
    Redo,
    Reindent { first_line: usize, last_line: usize },
    Reformat { first_line: usize, last_line: usize },
    RevealLine { line: usize, at: RevealAt },
    OpenFile(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("edit position {0} is outside the document")]
    OutOfRange(Position),
    #[error("edits overlap at {0}")]
    Overlapping(Position),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("host command failed: {0}")]
    HostCommand(String),
}

/// The document surface the engine drives.
///
/// `apply_edits` is atomic: either every edit lands or none does. Edits are
/// expressed against the content as it was before the call; the host maps
/// existing selections through the edits, keeping a caret that sits exactly
/// on an insertion point in front of the inserted text.
pub trait TextEditor: TextSource {
    fn document_name(&self) -> String;

    fn alternate_name(&self) -> Option<String> {
        None
    }

    /// Edit version, bumped on every content change.
    fn version(&self) -> u64;

    fn selections(&self) -> Vec<Range>;

    fn set_selections(&mut self, selections: Vec<Range>);

    fn apply_edits(&mut self, edits: Vec<Edit>) -> Result<(), EditError>;

    /// Host-side typing: replace every selection with `text` and leave each
    /// caret after it, running whatever auto-pairing the host does.
    fn type_text(&mut self, text: &str) -> Result<(), EditError>;

    /// Returns `Ok(false)` when the host could not carry the command out.
    fn run_host_command(&mut self, command: &HostCommand) -> Result<bool, EditError>;

    fn show_status(&mut self, text: &str, is_error: bool);

    /// Marks the end of one logical change for the host's undo history.
    fn undo_stop(&mut self) {}
}

// -------------------------------------------------------------------------------------------------
// In-memory editor
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone)]
struct Snapshot {
    buffer: Buffer,
    selections: Vec<Range>,
}

/// A rope-backed [`TextEditor`] with snapshot undo, used by the CLI and tests.
#[derive(Debug)]
pub struct MemoryEditor {
    buffer: Buffer,
    version: u64,
    selections: Vec<Range>,
    alternate: Option<String>,
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    group_open: bool,
    files: HashMap<String, String>,
    pub status: Vec<StatusLine>,
    pub host_log: Vec<HostCommand>,
}

impl MemoryEditor {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            buffer,
            version: 0,
            selections: vec![Range::default()],
            alternate: None,
            undo: Vec::new(),
            redo: Vec::new(),
            group_open: false,
            files: HashMap::new(),
            status: Vec::new(),
            host_log: Vec::new(),
        }
    }

    pub fn from_lines<I, L>(name: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        Self::new(Buffer::from_lines(name, lines))
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn lines(&self) -> Vec<String> {
        self.buffer.lines()
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Makes `name` openable through [`HostCommand::OpenFile`].
    pub fn register_file(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.files.insert(name.into(), content.into());
    }

    pub fn set_alternate(&mut self, name: Option<String>) {
        self.alternate = name;
    }

    pub fn last_status(&self) -> Option<&StatusLine> {
        self.status.last()
    }

    fn checkpoint(&mut self) {
        if self.group_open {
            return;
        }
        self.undo.push(Snapshot {
            buffer: self.buffer.clone(),
            selections: self.selections.clone(),
        });
        self.redo.clear();
        self.group_open = true;
    }

    fn check_in_range(&self, pos: Position) -> Result<(), EditError> {
        if pos.line >= self.buffer.line_count() || pos.character > self.buffer.line_len(pos.line) {
            return Err(EditError::OutOfRange(pos));
        }
        Ok(())
    }

    fn restore(&mut self, from_undo: bool) -> bool {
        let (source, sink) = if from_undo {
            (&mut self.undo, &mut self.redo)
        } else {
            (&mut self.redo, &mut self.undo)
        };
        let Some(snapshot) = source.pop() else {
            return false;
        };
        sink.push(Snapshot {
            buffer: self.buffer.clone(),
            selections: self.selections.clone(),
        });
        self.buffer = snapshot.buffer;
        self.selections = snapshot
            .selections
            .iter()
            .map(|s| Range::new(s.start.clamp_to(&self.buffer), s.stop.clamp_to(&self.buffer)))
            .collect();
        self.version += 1;
        self.group_open = false;
        true
    }

    fn replace_lines(&mut self, first: usize, last: usize, lines: Vec<String>) -> Result<(), EditError> {
        let end = Position::new(last, self.buffer.line_len(last));
        self.apply_edits(vec![Edit::Replace {
            start: Position::new(first, 0),
            end,
            text: lines.join("\n"),
        }])
    }

    fn reindent(&mut self, first: usize, last: usize) -> Result<(), EditError> {
        let indent = (0..first)
            .rev()
            .map(|l| self.buffer.line_text(l))
            .find(|l| !l.trim().is_empty())
            .map(|l| l.chars().take(first_non_blank_col(&l)).collect::<String>())
            .unwrap_or_default();
        let lines = (first..=last)
            .map(|l| {
                let text = self.buffer.line_text(l);
                let body = text.trim_start();
                if body.is_empty() {
                    String::new()
                } else {
                    format!("{indent}{body}")
                }
            })
            .collect();
        self.replace_lines(first, last, lines)
    }

    fn reformat(&mut self, first: usize, last: usize) -> Result<(), EditError> {
        const TEXT_WIDTH: usize = 79;
        let mut out = Vec::new();
        let mut current = String::new();
        for l in first..=last {
            let text = self.buffer.line_text(l);
            if text.trim().is_empty() {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                out.push(String::new());
                continue;
            }
            for word in text.split_whitespace() {
                if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > TEXT_WIDTH {
                    out.push(std::mem::take(&mut current));
                }
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
        self.replace_lines(first, last, out)
    }
}

/// Map a point through one edit that removed `[start, end)` and inserted
/// text ending at `new_end`.
fn map_point(p: Position, start: Position, end: Position, new_end: Position) -> Position {
    if p <= start {
        return p;
    }
    if p < end {
        return start;
    }
    if p.line == end.line {
        Position::new(new_end.line, new_end.character + (p.character - end.character))
    } else {
        let line = p.line as isize + new_end.line as isize - end.line as isize;
        Position::new(line.max(0) as usize, p.character)
    }
}

impl TextSource for MemoryEditor {
    fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    fn line_text(&self, line: usize) -> String {
        self.buffer.line_text(line)
    }

    fn line_len(&self, line: usize) -> usize {
        self.buffer.line_len(line)
    }

    fn text_in_range(&self, start: Position, end: Position) -> String {
        self.buffer.text_in_range(start, end)
    }
}

impl TextEditor for MemoryEditor {
    fn document_name(&self) -> String {
        self.buffer.name.clone()
    }

    fn alternate_name(&self) -> Option<String> {
        self.alternate.clone()
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn selections(&self) -> Vec<Range> {
        self.selections.clone()
    }

    fn set_selections(&mut self, selections: Vec<Range>) {
        self.selections = selections;
    }

    fn apply_edits(&mut self, edits: Vec<Edit>) -> Result<(), EditError> {
        if edits.is_empty() {
            return Ok(());
        }
        let mut ordered: Vec<(Position, Position, &Edit)> = Vec::with_capacity(edits.len());
        for edit in &edits {
            let (start, end) = edit.span();
            self.check_in_range(start)?;
            self.check_in_range(end)?;
            ordered.push((start, end, edit));
        }
        ordered.sort_by_key(|(start, _, _)| *start);
        for pair in ordered.windows(2) {
            if pair[0].1 > pair[1].0 {
                return Err(EditError::Overlapping(pair[1].0));
            }
        }
        self.checkpoint();
        for (start, end, edit) in ordered.iter().rev() {
            let text = edit.text();
            self.buffer.replace(*start, *end, text);
            let new_end = start.advance_by_text(text);
            for sel in &mut self.selections {
                sel.start = map_point(sel.start, *start, *end, new_end);
                sel.stop = map_point(sel.stop, *start, *end, new_end);
            }
        }
        self.version += 1;
        trace!(target: "model", edits = edits.len(), version = self.version, "edits_applied");
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<(), EditError> {
        self.checkpoint();
        let mut order: Vec<usize> = (0..self.selections.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(self.selections[i].sorted().0));
        for i in order {
            let (start, end) = self.selections[i].sorted();
            self.check_in_range(start)?;
            self.check_in_range(end)?;
            self.buffer.replace(start, end, text);
            let new_end = start.advance_by_text(text);
            for (j, sel) in self.selections.iter_mut().enumerate() {
                if j == i {
                    *sel = Range::at(new_end);
                } else {
                    sel.start = map_point(sel.start, start, end, new_end);
                    sel.stop = map_point(sel.stop, start, end, new_end);
                }
            }
        }
        self.version += 1;
        Ok(())
    }

    fn run_host_command(&mut self, command: &HostCommand) -> Result<bool, EditError> {
        debug!(target: "model", ?command, "host_command");
        self.host_log.push(command.clone());
        match command {
            HostCommand::Undo => Ok(self.restore(true)),
            HostCommand::Redo => Ok(self.restore(false)),
            HostCommand::Reindent {
                first_line,
                last_line,
            } => self.reindent(*first_line, *last_line).map(|_| true),
            HostCommand::Reformat {
                first_line,
                last_line,
            } => self.reformat(*first_line, *last_line).map(|_| true),
            HostCommand::RevealLine { .. } => Ok(true),
            HostCommand::OpenFile(name) => {
                let Some(content) = self.files.get(name).cloned() else {
                    return Ok(false);
                };
                let previous = std::mem::replace(&mut self.buffer, Buffer::from_str(name.clone(), &content));
                self.alternate = Some(previous.name);
                self.selections = vec![Range::default()];
                self.undo.clear();
                self.redo.clear();
                self.version += 1;
                Ok(true)
            }
        }
    }

    fn show_status(&mut self, text: &str, is_error: bool) {
        self.status.push(StatusLine {
            text: text.to_string(),
            is_error,
        });
    }

    fn undo_stop(&mut self) {
        self.group_open = false;
    }
}
