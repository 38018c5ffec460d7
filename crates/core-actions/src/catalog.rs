//! Assembles the action table.
//!
//! Declaration order matters: the first action whose keys fully match wins,
//! so context-restricted variants (`0` while counting, doubled operator
//! keys) come before the general ones.

use crate::action::{ActionKind, CommandSpec, MovementSpec, OperatorSpec};
use crate::{commands, insert, movements, operators, prompt, text_object, visual};
use core_events::NotationError;
use core_keymap::{ActionSpec, ActionTable, ContextFlags};
use core_state::ModeSet;

pub type Table = ActionTable<ActionKind>;
pub type Spec = ActionSpec<ActionKind>;

/// Modes motions are available in (operator-pending is Normal with an operator).
pub const MOTION_MODES: ModeSet = ModeSet::NORMAL_AND_VISUAL;

pub fn movement(
    name: &'static str,
    modes: ModeSet,
    keys: &[&str],
    spec: MovementSpec,
) -> Result<Spec, NotationError> {
    ActionSpec::new(name, modes, keys, ActionKind::Movement(spec))
}

/// Commands never apply while an operator waits for its motion.
pub fn command(
    name: &'static str,
    modes: ModeSet,
    keys: &[&str],
    spec: CommandSpec,
) -> Result<Spec, NotationError> {
    Ok(ActionSpec::new(name, modes, keys, ActionKind::Command(spec))?.excludes(ContextFlags::OPERATOR))
}

pub fn operator(
    name: &'static str,
    modes: ModeSet,
    keys: &[&str],
    spec: OperatorSpec,
) -> Result<Spec, NotationError> {
    Ok(ActionSpec::new(name, modes, keys, ActionKind::Operator(spec))?.excludes(ContextFlags::OPERATOR))
}

pub fn build() -> Result<Table, NotationError> {
    let mut t = Table::new();
    prompt::register(&mut t)?;
    insert::register(&mut t)?;
    commands::register_prefixes(&mut t)?;
    movements::register_doubled(&mut t)?;
    text_object::register(&mut t)?;
    movements::register(&mut t)?;
    operators::register(&mut t)?;
    visual::register(&mut t)?;
    commands::register(&mut t)?;
    tracing::debug!(target: "engine.dispatch", actions = t.len(), "action_table_built");
    Ok(t)
}
