//! Host collaborator contracts consumed by the keystroke engine.
//!
//! The engine never owns a document. It reads text and selections through
//! [`TextEditor`], writes through a single batched [`TextEditor::apply_edits`]
//! call per commit, mirrors clipboard registers through [`Clipboard`], hands
//! command-line text to an [`ExCommandParser`], and persists registers as an
//! opaque blob through [`RegisterStore`].
//!
//! Every contract ships with an in-memory implementation. The command line
//! driver and the test suites run the engine against these.
//!
//! Calls are synchronous: one keystroke is fully dispatched and committed
//! before the next one is read, so there is never more than one outstanding
//! collaborator call.

mod clipboard;
mod editor;
mod ex;
mod store;

pub use clipboard::{Clipboard, MemoryClipboard};
pub use editor::{Edit, EditError, HostCommand, MemoryEditor, RevealAt, StatusLine, TextEditor};
pub use ex::{ExAction, ExCommandParser, ExContext, ExError, MinimalExCommands, NoExCommands};
pub use store::{FileRegisterStore, MemoryRegisterStore, RegisterStore};
