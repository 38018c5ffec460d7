//! Vim key notation: `dw<Esc>`, `<C-r>a`, `<lt>`, `<S-Tab>`.
//!
//! Parsing is strict about unknown `<...>` names only when they look like a
//! key name; a lone `<` followed by text that is not a key name stays a
//! literal `<` (so `i<div>` types the tag).

use crate::{KeyToken, ModMask, NamedKey};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NotationError {
    #[error("unknown key name <{0}>")]
    UnknownKey(String),
    #[error("empty chord <{0}>")]
    EmptyChord(String),
}

fn named_key(name: &str) -> Option<KeyToken> {
    let lower = name.to_ascii_lowercase();
    let named = match lower.as_str() {
        "esc" => NamedKey::Esc,
        "cr" | "enter" | "return" => NamedKey::Enter,
        "bs" | "backspace" => NamedKey::Backspace,
        "tab" => NamedKey::Tab,
        "del" | "delete" => NamedKey::Delete,
        "up" => NamedKey::Up,
        "down" => NamedKey::Down,
        "left" => NamedKey::Left,
        "right" => NamedKey::Right,
        "home" => NamedKey::Home,
        "end" => NamedKey::End,
        "pageup" => NamedKey::PageUp,
        "pagedown" => NamedKey::PageDown,
        "insert" => NamedKey::Insert,
        "space" => return Some(KeyToken::Char(' ')),
        "lt" => return Some(KeyToken::Char('<')),
        "bar" => return Some(KeyToken::Char('|')),
        "bslash" => return Some(KeyToken::Char('\\')),
        _ => {
            let n = lower.strip_prefix('f')?.parse::<u8>().ok()?;
            if (1..=12).contains(&n) {
                NamedKey::F(n)
            } else {
                return None;
            }
        }
    };
    Some(KeyToken::Named(named))
}

fn parse_bracketed(body: &str) -> Result<Option<KeyToken>, NotationError> {
    if let Some(token) = named_key(body) {
        return Ok(Some(token));
    }
    // Chords: one or more modifier prefixes then a key.
    let mut mods = ModMask::empty();
    let mut rest = body;
    while rest.len() > 2 && rest.as_bytes()[1] == b'-' {
        let m = match rest.as_bytes()[0].to_ascii_uppercase() {
            b'C' => ModMask::CTRL,
            b'A' => ModMask::ALT,
            b'S' => ModMask::SHIFT,
            b'M' => ModMask::META,
            b'D' => ModMask::SUPER,
            _ => break,
        };
        mods |= m;
        rest = &rest[2..];
    }
    if mods.is_empty() {
        return Ok(None);
    }
    let base = if rest.chars().count() == 1 {
        let c = rest.chars().next().ok_or_else(|| NotationError::EmptyChord(body.into()))?;
        if mods.contains(ModMask::CTRL) {
            KeyToken::Char(c.to_ascii_lowercase())
        } else {
            KeyToken::Char(c)
        }
    } else {
        named_key(rest).ok_or_else(|| NotationError::UnknownKey(body.into()))?
    };
    Ok(Some(KeyToken::Chord {
        base: Box::new(base),
        mods,
    }))
}

/// Parse a key script into tokens.
pub fn parse_keys(input: &str) -> Result<Vec<KeyToken>, NotationError> {
    let mut out = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '<'
            && let Some(len) = chars[i + 1..].iter().position(|&c| c == '>')
            && len > 0
        {
            let body: String = chars[i + 1..i + 1 + len].iter().collect();
            if let Some(token) = parse_bracketed(&body)? {
                out.push(token);
                i += len + 2;
                continue;
            }
        }
        out.push(match c {
            '\n' => KeyToken::Named(NamedKey::Enter),
            '\t' => KeyToken::Named(NamedKey::Tab),
            '\u{1b}' => KeyToken::Named(NamedKey::Esc),
            c => KeyToken::Char(c),
        });
        i += 1;
    }
    Ok(out)
}

fn named_key_name(key: NamedKey) -> String {
    match key {
        NamedKey::Enter => "CR".into(),
        NamedKey::Esc => "Esc".into(),
        NamedKey::Backspace => "BS".into(),
        NamedKey::Tab => "Tab".into(),
        NamedKey::F(n) => format!("F{n}"),
        NamedKey::Up => "Up".into(),
        NamedKey::Down => "Down".into(),
        NamedKey::Left => "Left".into(),
        NamedKey::Right => "Right".into(),
        NamedKey::Home => "Home".into(),
        NamedKey::End => "End".into(),
        NamedKey::PageUp => "PageUp".into(),
        NamedKey::PageDown => "PageDown".into(),
        NamedKey::Insert => "Insert".into(),
        NamedKey::Delete => "Del".into(),
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Char('<') => f.write_str("<lt>"),
            KeyToken::Char(c) => write!(f, "{c}"),
            KeyToken::Named(n) => write!(f, "<{}>", named_key_name(*n)),
            KeyToken::Chord { base, mods } => {
                f.write_str("<")?;
                for (flag, prefix) in [
                    (ModMask::CTRL, "C-"),
                    (ModMask::ALT, "A-"),
                    (ModMask::SHIFT, "S-"),
                    (ModMask::META, "M-"),
                    (ModMask::SUPER, "D-"),
                ] {
                    if mods.contains(flag) {
                        f.write_str(prefix)?;
                    }
                }
                match base.as_ref() {
                    KeyToken::Named(n) => f.write_str(&named_key_name(*n))?,
                    KeyToken::Char('<') => f.write_str("lt")?,
                    KeyToken::Char(c) => write!(f, "{c}")?,
                    other => write!(f, "{other}")?,
                }
                f.write_str(">")
            }
        }
    }
}

/// Render tokens back into notation.
pub fn format_keys(keys: &[KeyToken]) -> String {
    keys.iter().map(ToString::to_string).collect()
}
