//! The event loop: keys arrive on the channel, the engine applies them to
//! an in-memory document, status messages are collected for the caller.

use anyhow::{Context, Result};
use core_actions::Vim;
use core_config::Config;
use core_events::{AsyncEventSource, Event, InputEvent, KeyToken, parse_keys};
use core_model::{MemoryEditor, MinimalExCommands, StatusLine};
use core_state::{Mode, Registers, VimState};
use core_text::Buffer;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    SourcesFinished,
    ChannelClosed,
    Requested,
}

impl ShutdownReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ShutdownReason::SourcesFinished => "sources_finished",
            ShutdownReason::ChannelClosed => "channel_closed",
            ShutdownReason::Requested => "requested",
        }
    }
}

enum LoopControl {
    Continue,
    Break(ShutdownReason),
}

// -------------------------------------------------------------------------------------------------
// Session
// -------------------------------------------------------------------------------------------------

/// One engine editing one document.
pub struct Session {
    pub vim: Vim,
    pub doc: VimState,
    pub editor: MemoryEditor,
    path: Option<PathBuf>,
    trailing_newline: bool,
    /// Engine failures (not Vim errors, which go to the status line).
    pub engine_errors: usize,
    status_seen: usize,
}

impl Session {
    pub fn from_text(name: &str, text: &str, config: Config, registers: Registers) -> Result<Self> {
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        let editor = MemoryEditor::new(Buffer::from_str(name, body));
        let vim = Vim::new(config, registers, Box::new(MinimalExCommands)).context("building the engine")?;
        Ok(Self {
            vim,
            doc: VimState::new(name),
            editor,
            path: None,
            trailing_newline,
            engine_errors: 0,
            status_seen: 0,
        })
    }

    /// Open `path`; a missing file starts an empty document with that name.
    pub fn open(path: &Path, config: Config, registers: Registers) -> Result<Self> {
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("untitled").to_string();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(target: "runtime", file = %path.display(), size_bytes = text.len(), "file_read_ok");
                text
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(target: "runtime", file = %path.display(), "new_file");
                String::new()
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let mut session = Self::from_text(&name, &text, config, registers)?;
        session.path = Some(path.to_path_buf());
        Ok(session)
    }

    pub fn mode(&self) -> Mode {
        self.doc.mode()
    }

    /// Document text, with the final line break the file was read with.
    pub fn text(&self) -> String {
        let mut text = self.editor.text();
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }

    pub fn write(&self) -> Result<()> {
        let Some(path) = &self.path else {
            anyhow::bail!("no file name");
        };
        std::fs::write(path, self.text()).with_context(|| format!("writing {}", path.display()))?;
        info!(target: "runtime", file = %path.display(), "file_written");
        Ok(())
    }

    /// Status lines shown since the last call.
    pub fn take_status(&mut self) -> Vec<StatusLine> {
        let fresh = self.editor.status[self.status_seen..].to_vec();
        self.status_seen = self.editor.status.len();
        fresh
    }

    pub fn handle_key(&mut self, key: KeyToken) {
        trace!(target: "runtime", ?key, "key");
        if let Err(e) = self.vim.handle_key(&mut self.doc, &mut self.editor, key) {
            self.engine_errors += 1;
            error!(target: "runtime", error = %e, "engine_error");
        }
    }

    fn handle_event(&mut self, event: Event, live_sources: &mut usize) -> LoopControl {
        match event {
            Event::Input(InputEvent::Key(key)) => self.handle_key(key),
            Event::Input(InputEvent::Text(text)) => {
                for c in text.chars() {
                    self.handle_key(KeyToken::Char(c));
                }
            }
            Event::SourceFinished(name) => {
                *live_sources = live_sources.saturating_sub(1);
                debug!(target: "runtime.events", source = name, remaining = *live_sources, "source_finished");
                if *live_sources == 0 {
                    return LoopControl::Break(ShutdownReason::SourcesFinished);
                }
            }
            Event::Shutdown => return LoopControl::Break(ShutdownReason::Requested),
        }
        LoopControl::Continue
    }

    /// Consume events until every source has finished or the channel closes.
    pub async fn run(&mut self, mut rx: mpsc::Receiver<Event>, sources: usize) -> ShutdownReason {
        let span = tracing::debug_span!(target: "runtime", "event_loop");
        async move {
            let mut live = sources;
            let mut reason = ShutdownReason::ChannelClosed;
            while let Some(event) = rx.recv().await {
                if let LoopControl::Break(why) = self.handle_event(event, &mut live) {
                    reason = why;
                    break;
                }
            }
            rx.close();
            info!(target: "runtime", reason = reason.as_str(), mode = ?self.mode(), "event_loop_finished");
            reason
        }
        .instrument(span)
        .await
    }
}

// -------------------------------------------------------------------------------------------------
// Stdin key source
// -------------------------------------------------------------------------------------------------

/// Reads key notation from stdin, one line at a time.
pub struct StdinKeySource;

impl AsyncEventSource for StdinKeySource {
    fn name(&self) -> &'static str {
        "stdin"
    }

    fn spawn(self: Box<Self>, tx: mpsc::Sender<Event>) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(target: "runtime.events", error = %e, "stdin_read_failed");
                        break;
                    }
                };
                let keys = match parse_keys(&line) {
                    Ok(keys) => keys,
                    Err(e) => {
                        warn!(target: "runtime.events", error = %e, line = %line, "stdin_notation_rejected");
                        continue;
                    }
                };
                for key in keys {
                    if tx.blocking_send(Event::Input(InputEvent::Key(key))).is_err() {
                        debug!(target: "runtime.events", "stdin source stopped: channel closed");
                        return;
                    }
                }
            }
            let _ = tx.blocking_send(Event::SourceFinished("stdin"));
        })
    }
}
