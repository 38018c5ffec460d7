//! core-keymap: key patterns and the action table matcher.
//!
//! Every action declares one or more key sequences made of [`KeyPattern`]s,
//! the modes it is valid in, and context flags it requires or excludes.
//! Dispatch asks the table two questions about the keys typed so far:
//!
//! - does an action apply (a full match)? The first one in declaration
//!   order wins, so more specific actions are declared before general ones
//!   (`@@` before `@<macro>`).
//! - could an action still apply with more keys (a strict prefix)?
//!
//! The table is pure: resolution depends only on the mode, the keys, and the
//! context flags supplied by the caller. Tracing happens at TRACE only.

use bitflags::bitflags;
use core_events::{KeyToken, NotationError, parse_keys};
use core_state::{ActionId, Mode, ModeSet};
use smallvec::SmallVec;
use tracing::trace;

// -------------------------------------------------------------------------------------------------
// Key Patterns
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPattern {
    /// Exactly this key.
    Key(KeyToken),
    /// `<character>`: any key that stands for literal text (`<CR>`, `<Tab>` included).
    Character,
    /// `<number>`: a count digit `1`-`9`.
    Number,
    /// `<any>`: any key at all.
    Any,
    /// `<register>`: any plain character; the action validates the name.
    Register,
    /// `<macro>`: any plain character other than `@` and `:`.
    Macro,
}

impl KeyPattern {
    pub fn matches(&self, key: &KeyToken) -> bool {
        match self {
            KeyPattern::Key(k) => k == key,
            KeyPattern::Character => key.literal_text().is_some(),
            KeyPattern::Number => matches!(key.as_char(), Some('1'..='9')),
            KeyPattern::Any => true,
            KeyPattern::Register => key.as_char().is_some(),
            KeyPattern::Macro => matches!(key.as_char(), Some(c) if c != '@' && c != ':'),
        }
    }

    fn placeholder(name: &str) -> Option<KeyPattern> {
        Some(match name {
            "character" => KeyPattern::Character,
            "number" => KeyPattern::Number,
            "any" => KeyPattern::Any,
            "register" => KeyPattern::Register,
            "macro" => KeyPattern::Macro,
            _ => return None,
        })
    }
}

pub type KeySequence = SmallVec<[KeyPattern; 4]>;

/// Parse a sequence written in key notation with placeholders, e.g.
/// `"f<character>"`, `"<C-r><register>"`, `"g~"`.
pub fn parse_sequence(notation: &str) -> Result<KeySequence, NotationError> {
    let mut out = KeySequence::new();
    let mut rest = notation;
    while !rest.is_empty() {
        let next_placeholder = rest.match_indices('<').find_map(|(at, _)| {
            let close = rest[at..].find('>')? + at;
            KeyPattern::placeholder(&rest[at + 1..close]).map(|p| (at, close, p))
        });
        match next_placeholder {
            Some((at, close, pattern)) => {
                out.extend(parse_keys(&rest[..at])?.into_iter().map(KeyPattern::Key));
                out.push(pattern);
                rest = &rest[close + 1..];
            }
            None => {
                out.extend(parse_keys(rest)?.into_iter().map(KeyPattern::Key));
                rest = "";
            }
        }
    }
    Ok(out)
}

// -------------------------------------------------------------------------------------------------
// Context Flags
// -------------------------------------------------------------------------------------------------
bitflags! {
    /// Dispatch context an action can require or exclude.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ContextFlags: u8 {
        /// A count is being typed.
        const COUNT = 1;
        /// An operator is waiting for its motion.
        const OPERATOR = 1 << 1;
        /// The pending operator is a case or format operator.
        const CASE_OPERATOR = 1 << 2;
        /// Nothing has been typed for the current action yet.
        const FIRST_KEY = 1 << 3;
        /// A `q` recording is active.
        const RECORDING = 1 << 4;
    }
}

// -------------------------------------------------------------------------------------------------
// Action Definitions
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct ActionSpec<T> {
    pub name: &'static str,
    pub modes: ModeSet,
    /// Alternative key sequences; any of them triggers the action.
    pub keys: SmallVec<[KeySequence; 2]>,
    pub requires: ContextFlags,
    pub excludes: ContextFlags,
    pub payload: T,
}

impl<T> ActionSpec<T> {
    pub fn new(name: &'static str, modes: ModeSet, keys: &[&str], payload: T) -> Result<Self, NotationError> {
        let keys = keys
            .iter()
            .map(|k| parse_sequence(k))
            .collect::<Result<SmallVec<_>, _>>()?;
        Ok(Self {
            name,
            modes,
            keys,
            requires: ContextFlags::empty(),
            excludes: ContextFlags::empty(),
            payload,
        })
    }

    pub fn requires(mut self, flags: ContextFlags) -> Self {
        self.requires |= flags;
        self
    }

    pub fn excludes(mut self, flags: ContextFlags) -> Self {
        self.excludes |= flags;
        self
    }

    fn context_ok(&self, mode: Mode, ctx: ContextFlags) -> bool {
        self.modes.contains(mode.bit()) && ctx.contains(self.requires) && !ctx.intersects(self.excludes)
    }

    /// Every typed key matches and the sequence is exactly as long.
    pub fn does_apply(&self, mode: Mode, keys: &[KeyToken], ctx: ContextFlags) -> bool {
        self.context_ok(mode, ctx)
            && self
                .keys
                .iter()
                .any(|seq| seq.len() == keys.len() && seq.iter().zip(keys).all(|(p, k)| p.matches(k)))
    }

    /// The typed keys are a strict prefix of one of the sequences.
    pub fn could_apply(&self, mode: Mode, keys: &[KeyToken], ctx: ContextFlags) -> bool {
        self.context_ok(mode, ctx)
            && self
                .keys
                .iter()
                .any(|seq| seq.len() > keys.len() && seq.iter().zip(keys).all(|(p, k)| p.matches(k)))
    }
}

// -------------------------------------------------------------------------------------------------
// Resolution Result
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Matched(ActionId),
    /// Strict prefix of at least one action.
    NeedMore,
    NoMatch,
}

// -------------------------------------------------------------------------------------------------
// Action Table
// -------------------------------------------------------------------------------------------------
#[derive(Debug)]
pub struct ActionTable<T> {
    specs: Vec<ActionSpec<T>>,
}

impl<T> Default for ActionTable<T> {
    fn default() -> Self {
        Self { specs: Vec::new() }
    }
}

impl<T> ActionTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, spec: ActionSpec<T>) -> ActionId {
        let id = ActionId(self.specs.len() as u16);
        self.specs.push(spec);
        id
    }

    pub fn get(&self, id: ActionId) -> Option<&ActionSpec<T>> {
        self.specs.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionId, &ActionSpec<T>)> {
        self.specs
            .iter()
            .enumerate()
            .map(|(i, s)| (ActionId(i as u16), s))
    }

    pub fn resolve(&self, mode: Mode, keys: &[KeyToken], ctx: ContextFlags) -> Resolution {
        if keys.is_empty() {
            return Resolution::NeedMore;
        }
        if let Some((id, spec)) = self.iter().find(|(_, s)| s.does_apply(mode, keys, ctx)) {
            trace!(target: "engine.dispatch", action = spec.name, ?mode, "matched");
            return Resolution::Matched(id);
        }
        if self.specs.iter().any(|s| s.could_apply(mode, keys, ctx)) {
            trace!(target: "engine.dispatch", ?mode, pending = keys.len(), "need_more");
            return Resolution::NeedMore;
        }
        Resolution::NoMatch
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(s: &str) -> Vec<KeyToken> {
        parse_keys(s).unwrap()
    }

    fn table() -> ActionTable<&'static str> {
        let mut t = ActionTable::new();
        let n = ModeSet::NORMAL;
        t.push(ActionSpec::new("count", n, &["<number>"], "count").unwrap());
        t.push(
            ActionSpec::new("zero_count", n, &["0"], "zero_count")
                .unwrap()
                .requires(ContextFlags::COUNT),
        );
        t.push(ActionSpec::new("line_start", n, &["0"], "line_start").unwrap());
        t.push(
            ActionSpec::new("delete", n | ModeSet::ANY_VISUAL, &["d"], "delete")
                .unwrap()
                .excludes(ContextFlags::OPERATOR),
        );
        t.push(
            ActionSpec::new("dd", n, &["d"], "dd")
                .unwrap()
                .requires(ContextFlags::OPERATOR),
        );
        t.push(ActionSpec::new("find", n, &["f<character>"], "find").unwrap());
        t.push(ActionSpec::new("gg", n, &["gg"], "gg").unwrap());
        t.push(ActionSpec::new("ge", n, &["ge"], "ge").unwrap());
        t.push(ActionSpec::new("macro_repeat", n, &["@@"], "@@").unwrap());
        t.push(ActionSpec::new("macro", n, &["@<macro>"], "@x").unwrap());
        t.push(ActionSpec::new("left", n, &["h", "<Left>", "<BS>"], "left").unwrap());
        t
    }

    fn payload(t: &ActionTable<&'static str>, mode: Mode, s: &str, ctx: ContextFlags) -> Option<&'static str> {
        match t.resolve(mode, &keys(s), ctx) {
            Resolution::Matched(id) => t.get(id).map(|a| a.payload),
            _ => None,
        }
    }

    #[test]
    fn placeholders_parse_between_literal_keys() {
        let seq = parse_sequence("<C-r><register>x").unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq[1], KeyPattern::Register);
        assert_eq!(seq[2], KeyPattern::Key(KeyToken::Char('x')));
        assert_eq!(parse_sequence("<lt>").unwrap()[0], KeyPattern::Key(KeyToken::Char('<')));
    }

    #[test]
    fn zero_depends_on_count_context() {
        let t = table();
        assert_eq!(payload(&t, Mode::Normal, "0", ContextFlags::empty()), Some("line_start"));
        assert_eq!(payload(&t, Mode::Normal, "0", ContextFlags::COUNT), Some("zero_count"));
        assert_eq!(payload(&t, Mode::Normal, "5", ContextFlags::empty()), Some("count"));
    }

    #[test]
    fn doubled_operator_requires_pending_operator() {
        let t = table();
        assert_eq!(payload(&t, Mode::Normal, "d", ContextFlags::empty()), Some("delete"));
        assert_eq!(payload(&t, Mode::Normal, "d", ContextFlags::OPERATOR), Some("dd"));
        assert_eq!(payload(&t, Mode::Visual, "d", ContextFlags::empty()), Some("delete"));
        assert_eq!(t.resolve(Mode::Insert, &keys("d"), ContextFlags::empty()), Resolution::NoMatch);
    }

    #[test]
    fn prefixes_need_more_keys() {
        let t = table();
        assert_eq!(t.resolve(Mode::Normal, &keys("g"), ContextFlags::empty()), Resolution::NeedMore);
        assert_eq!(t.resolve(Mode::Normal, &keys("f"), ContextFlags::empty()), Resolution::NeedMore);
        assert_eq!(payload(&t, Mode::Normal, "f<CR>", ContextFlags::empty()), Some("find"));
        assert_eq!(t.resolve(Mode::Normal, &keys("gx"), ContextFlags::empty()), Resolution::NoMatch);
        assert_eq!(t.resolve(Mode::Normal, &keys("f<Esc>"), ContextFlags::empty()), Resolution::NoMatch);
    }

    #[test]
    fn declaration_order_breaks_ties() {
        let t = table();
        assert_eq!(payload(&t, Mode::Normal, "@@", ContextFlags::empty()), Some("@@"));
        assert_eq!(payload(&t, Mode::Normal, "@q", ContextFlags::empty()), Some("@x"));
        assert_eq!(t.resolve(Mode::Normal, &keys("@:"), ContextFlags::empty()), Resolution::NoMatch);
    }

    #[test]
    fn alternative_sequences() {
        let t = table();
        for k in ["h", "<Left>", "<BS>"] {
            assert_eq!(payload(&t, Mode::Normal, k, ContextFlags::empty()), Some("left"), "key {k}");
        }
    }
}
