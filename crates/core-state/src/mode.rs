//! Modal state machine.

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    Visual,
    VisualLine,
    VisualBlock,
    VisualBlockInsert,
    Replace,
    CommandlineInProgress,
    SearchInProgressMode,
}

bitflags::bitflags! {
    /// Set of modes an action is valid in.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModeSet: u16 {
        const NORMAL = 1;
        const INSERT = 1 << 1;
        const VISUAL = 1 << 2;
        const VISUAL_LINE = 1 << 3;
        const VISUAL_BLOCK = 1 << 4;
        const VISUAL_BLOCK_INSERT = 1 << 5;
        const REPLACE = 1 << 6;
        const COMMAND_LINE = 1 << 7;
        const SEARCH = 1 << 8;

        const ANY_VISUAL = Self::VISUAL.bits() | Self::VISUAL_LINE.bits() | Self::VISUAL_BLOCK.bits();
        const NORMAL_AND_VISUAL = Self::NORMAL.bits() | Self::ANY_VISUAL.bits();
        const INSERTING = Self::INSERT.bits() | Self::VISUAL_BLOCK_INSERT.bits();
        const PROMPTS = Self::COMMAND_LINE.bits() | Self::SEARCH.bits();
    }
}

impl Mode {
    pub const fn bit(self) -> ModeSet {
        match self {
            Mode::Normal => ModeSet::NORMAL,
            Mode::Insert => ModeSet::INSERT,
            Mode::Visual => ModeSet::VISUAL,
            Mode::VisualLine => ModeSet::VISUAL_LINE,
            Mode::VisualBlock => ModeSet::VISUAL_BLOCK,
            Mode::VisualBlockInsert => ModeSet::VISUAL_BLOCK_INSERT,
            Mode::Replace => ModeSet::REPLACE,
            Mode::CommandlineInProgress => ModeSet::COMMAND_LINE,
            Mode::SearchInProgressMode => ModeSet::SEARCH,
        }
    }

    pub fn is_visual(self) -> bool {
        matches!(self, Mode::Visual | Mode::VisualLine | Mode::VisualBlock)
    }

    /// Modes in which typed characters change the buffer. A logical action
    /// stays open while one of these is active.
    pub fn is_insert_like(self) -> bool {
        matches!(self, Mode::Insert | Mode::VisualBlockInsert | Mode::Replace)
    }

    pub fn is_prompt(self) -> bool {
        matches!(self, Mode::CommandlineInProgress | Mode::SearchInProgressMode)
    }

    /// Short label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Visual => "VISUAL",
            Mode::VisualLine => "VISUAL LINE",
            Mode::VisualBlock => "VISUAL BLOCK",
            Mode::VisualBlockInsert => "VISUAL BLOCK INSERT",
            Mode::Replace => "REPLACE",
            Mode::CommandlineInProgress => "COMMAND",
            Mode::SearchInProgressMode => "SEARCH",
        }
    }

    /// Transitions the action layer is allowed to make.
    pub fn can_transition(self, to: Mode) -> bool {
        use Mode::*;
        if self == to {
            return true;
        }
        match self {
            Normal => true,
            Insert | Replace | VisualBlockInsert => to == Normal,
            Visual | VisualLine | VisualBlock => matches!(
                to,
                Normal
                    | Visual
                    | VisualLine
                    | VisualBlock
                    | Insert
                    | CommandlineInProgress
                    | SearchInProgressMode
            ) || (self == VisualBlock && to == VisualBlockInsert),
            CommandlineInProgress | SearchInProgressMode => {
                matches!(to, Normal | Visual | VisualLine | VisualBlock)
            }
        }
    }
}

/// Checked mode change. Illegal transitions are still applied (the action
/// layer is the authority) but logged.
pub fn transition(current: &mut Mode, to: Mode) {
    if !current.can_transition(to) {
        warn!(target: "engine.dispatch", from = ?current, to = ?to, "unexpected_mode_transition");
    }
    *current = to;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visual_block_is_the_only_way_into_block_insert() {
        assert!(Mode::VisualBlock.can_transition(Mode::VisualBlockInsert));
        assert!(!Mode::Visual.can_transition(Mode::VisualBlockInsert));
        assert!(!Mode::Insert.can_transition(Mode::Visual));
        assert!(Mode::SearchInProgressMode.can_transition(Mode::VisualLine));
    }

    #[test]
    fn mode_bits_compose_into_sets() {
        assert!(ModeSet::NORMAL_AND_VISUAL.contains(Mode::VisualBlock.bit()));
        assert!(!ModeSet::NORMAL_AND_VISUAL.contains(Mode::Insert.bit()));
        assert!(ModeSet::INSERTING.contains(Mode::VisualBlockInsert.bit()));
        assert!(Mode::Replace.is_insert_like());
        assert!(Mode::CommandlineInProgress.is_prompt());
    }
}
