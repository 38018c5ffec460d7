//! core-actions: the Vim keystroke engine.
//!
//! [`Vim`] resolves keys against the action table built in [`catalog`],
//! runs the matched action for every cursor and commits the resulting
//! transformations to a [`core_model::TextEditor`] in one batch.
//!
//! ```text
//! key -> RecordedState::action_keys -> ActionTable::resolve
//!     -> action (per cursor, via Cx) -> Transformation list
//!     -> Transformer::commit -> TextEditor edits + cursor diffs
//!     -> replays (@x, ., :normal)
//! ```

pub mod action;
pub mod catalog;
mod commands;
mod engine;
mod insert;
mod movements;
mod operators;
mod prompt;
mod replay;
mod span_resolver;
mod text_object;
mod transformer;
mod visual;

pub use action::{
    ActionKind, ColumnPolicy, CommandSpec, Cx, MoveOutcome, MovementResult, MovementSpec, OpRange, OperatorKind,
    OperatorSpec,
};
pub use catalog::{Spec, Table};
pub use engine::Vim;
pub use replay::MAX_REPLAY_DEPTH;

use core_events::NotationError;
use core_model::EditError;
use core_text::Position;
use thiserror::Error;

/// Failures of the engine itself, as opposed to the `E123:` errors users
/// see on the status line. Strict mode (`[engine] strict = true`) turns
/// internal inconsistencies into these instead of logging and carrying on.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("edits from one action overlap at {at}")]
    Overlap { at: Position },
    #[error("transformation has no cursor index")]
    MissingCursorIndex,
    #[error("register {0} holds no macro")]
    MissingMacro(char),
    #[error("replay nested {0} levels deep")]
    ReplayDepth(usize),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Keymap(#[from] NotationError),
}
