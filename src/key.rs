//! Key identities and their string codecs.
//!
//! The platform listener reports [`RawKey`] values, which keep the left/right
//! distinction of modifiers. Matching and display work on [`KeyIdentity`],
//! where both sides of a modifier collapse into one logical key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AutoclickError, Result};

/// The four modifier keys, declared in canonical combo order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Cmd,
}

impl Modifier {
    /// All modifiers in canonical order: ctrl, alt, shift, cmd.
    pub const ALL: [Modifier; 4] = [Modifier::Ctrl, Modifier::Alt, Modifier::Shift, Modifier::Cmd];

    pub fn name(self) -> &'static str {
        self.named_key().name()
    }

    pub fn named_key(self) -> NamedKey {
        match self {
            Modifier::Ctrl => NamedKey::Ctrl,
            Modifier::Alt => NamedKey::Alt,
            Modifier::Shift => NamedKey::Shift,
            Modifier::Cmd => NamedKey::Cmd,
        }
    }
}

/// Which physical copy of a modifier was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// The closed set of named (non-character) keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Ctrl,
    Shift,
    Alt,
    Cmd,
    Space,
    Enter,
    Backspace,
    Tab,
    Esc,
    Up,
    Down,
    Left,
    Right,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl NamedKey {
    pub const ALL: [NamedKey; 30] = [
        NamedKey::Ctrl,
        NamedKey::Shift,
        NamedKey::Alt,
        NamedKey::Cmd,
        NamedKey::Space,
        NamedKey::Enter,
        NamedKey::Backspace,
        NamedKey::Tab,
        NamedKey::Esc,
        NamedKey::Up,
        NamedKey::Down,
        NamedKey::Left,
        NamedKey::Right,
        NamedKey::Delete,
        NamedKey::Home,
        NamedKey::End,
        NamedKey::PageUp,
        NamedKey::PageDown,
        NamedKey::F1,
        NamedKey::F2,
        NamedKey::F3,
        NamedKey::F4,
        NamedKey::F5,
        NamedKey::F6,
        NamedKey::F7,
        NamedKey::F8,
        NamedKey::F9,
        NamedKey::F10,
        NamedKey::F11,
        NamedKey::F12,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            NamedKey::Ctrl => "ctrl",
            NamedKey::Shift => "shift",
            NamedKey::Alt => "alt",
            NamedKey::Cmd => "cmd",
            NamedKey::Space => "space",
            NamedKey::Enter => "enter",
            NamedKey::Backspace => "backspace",
            NamedKey::Tab => "tab",
            NamedKey::Esc => "esc",
            NamedKey::Up => "up",
            NamedKey::Down => "down",
            NamedKey::Left => "left",
            NamedKey::Right => "right",
            NamedKey::Delete => "delete",
            NamedKey::Home => "home",
            NamedKey::End => "end",
            NamedKey::PageUp => "pageup",
            NamedKey::PageDown => "pagedown",
            NamedKey::F1 => "f1",
            NamedKey::F2 => "f2",
            NamedKey::F3 => "f3",
            NamedKey::F4 => "f4",
            NamedKey::F5 => "f5",
            NamedKey::F6 => "f6",
            NamedKey::F7 => "f7",
            NamedKey::F8 => "f8",
            NamedKey::F9 => "f9",
            NamedKey::F10 => "f10",
            NamedKey::F11 => "f11",
            NamedKey::F12 => "f12",
        }
    }

    /// Inverse of [`NamedKey::name`], also accepting common aliases.
    /// Expects lowercase input.
    pub fn from_name(name: &str) -> Option<NamedKey> {
        let key = match name {
            "ctrl" | "control" => NamedKey::Ctrl,
            "shift" => NamedKey::Shift,
            "alt" | "option" => NamedKey::Alt,
            "cmd" | "command" | "meta" | "super" => NamedKey::Cmd,
            "space" => NamedKey::Space,
            "enter" | "return" => NamedKey::Enter,
            "backspace" => NamedKey::Backspace,
            "tab" => NamedKey::Tab,
            "esc" | "escape" => NamedKey::Esc,
            "up" | "arrowup" => NamedKey::Up,
            "down" | "arrowdown" => NamedKey::Down,
            "left" | "arrowleft" => NamedKey::Left,
            "right" | "arrowright" => NamedKey::Right,
            "delete" => NamedKey::Delete,
            "home" => NamedKey::Home,
            "end" => NamedKey::End,
            "pageup" => NamedKey::PageUp,
            "pagedown" => NamedKey::PageDown,
            "f1" => NamedKey::F1,
            "f2" => NamedKey::F2,
            "f3" => NamedKey::F3,
            "f4" => NamedKey::F4,
            "f5" => NamedKey::F5,
            "f6" => NamedKey::F6,
            "f7" => NamedKey::F7,
            "f8" => NamedKey::F8,
            "f9" => NamedKey::F9,
            "f10" => NamedKey::F10,
            "f11" => NamedKey::F11,
            "f12" => NamedKey::F12,
            _ => return None,
        };
        Some(key)
    }

    pub fn modifier(self) -> Option<Modifier> {
        match self {
            NamedKey::Ctrl => Some(Modifier::Ctrl),
            NamedKey::Alt => Some(Modifier::Alt),
            NamedKey::Shift => Some(Modifier::Shift),
            NamedKey::Cmd => Some(Modifier::Cmd),
            _ => None,
        }
    }
}

/// A key exactly as the platform listener reported it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKey {
    /// A key that produces a character.
    Char(char),
    /// One physical copy of a modifier.
    Modifier(Modifier, Side),
    /// A named non-modifier key.
    Named(NamedKey),
    /// Anything else; never maps to a [`KeyIdentity`].
    Unknown(u32),
}

impl RawKey {
    /// The logical modifier this raw key stands for, if any.
    pub fn modifier(&self) -> Option<Modifier> {
        match self {
            RawKey::Modifier(modifier, _) => Some(*modifier),
            RawKey::Named(named) => named.modifier(),
            _ => None,
        }
    }
}

/// Logical identity of a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyIdentity {
    Character(char),
    Named(NamedKey),
}

impl KeyIdentity {
    /// Decode a raw platform key. Left/right modifiers collapse to one
    /// identity; whitespace characters become their named keys.
    pub fn from_raw(raw: &RawKey) -> Option<KeyIdentity> {
        match *raw {
            RawKey::Modifier(modifier, _) => Some(KeyIdentity::Named(modifier.named_key())),
            RawKey::Named(named) => Some(KeyIdentity::Named(named)),
            RawKey::Char(' ') => Some(KeyIdentity::Named(NamedKey::Space)),
            RawKey::Char('\t') => Some(KeyIdentity::Named(NamedKey::Tab)),
            RawKey::Char('\r' | '\n') => Some(KeyIdentity::Named(NamedKey::Enter)),
            RawKey::Char(c) if c.is_control() => None,
            RawKey::Char(c) => Some(KeyIdentity::Character(c)),
            RawKey::Unknown(_) => None,
        }
    }

    /// Parse a canonical (or alias) key name, or a single character.
    pub fn parse_canonical(s: &str) -> Option<KeyIdentity> {
        let s = s.trim();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_control() {
                return None;
            }
            return Some(KeyIdentity::Character(lowercase_char(c)));
        }
        NamedKey::from_name(&s.to_lowercase()).map(KeyIdentity::Named)
    }

    /// Lowercase form used for storage and comparison.
    pub fn canonical(&self) -> String {
        match self {
            KeyIdentity::Character(c) => c.to_lowercase().collect(),
            KeyIdentity::Named(named) => named.name().to_string(),
        }
    }

    /// Uppercase for named keys, the character itself otherwise.
    pub fn display(&self) -> String {
        match self {
            KeyIdentity::Character(c) => c.to_string(),
            KeyIdentity::Named(named) => named.name().to_uppercase(),
        }
    }

    /// Same key with characters folded to lowercase.
    pub fn normalized(&self) -> KeyIdentity {
        match *self {
            KeyIdentity::Character(c) => KeyIdentity::Character(lowercase_char(c)),
            named => named,
        }
    }

    pub fn modifier(&self) -> Option<Modifier> {
        match self {
            KeyIdentity::Named(named) => named.modifier(),
            KeyIdentity::Character(_) => None,
        }
    }

    pub fn is_modifier(&self) -> bool {
        self.modifier().is_some()
    }

    /// Whether an actuator can synthesize this key.
    pub fn is_injectable(&self) -> bool {
        match self {
            KeyIdentity::Named(_) => true,
            KeyIdentity::Character(c) => !c.is_control() && !c.is_whitespace(),
        }
    }

    /// Equality with case-insensitive comparison of characters.
    pub fn matches(&self, other: &KeyIdentity) -> bool {
        match (self, other) {
            (KeyIdentity::Character(a), KeyIdentity::Character(b)) => {
                lowercase_char(*a) == lowercase_char(*b)
            }
            _ => self == other,
        }
    }
}

fn lowercase_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

impl fmt::Display for KeyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl std::str::FromStr for KeyIdentity {
    type Err = AutoclickError;

    fn from_str(s: &str) -> Result<Self> {
        KeyIdentity::parse_canonical(s).ok_or_else(|| AutoclickError::invalid_key(s, "unknown key"))
    }
}

impl TryFrom<String> for KeyIdentity {
    type Error = AutoclickError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<KeyIdentity> for String {
    fn from(key: KeyIdentity) -> Self {
        key.canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_key_names_round_trip() {
        for key in NamedKey::ALL {
            assert_eq!(NamedKey::from_name(key.name()), Some(key));
        }
    }

    #[test]
    fn test_left_right_modifiers_collapse() {
        let left = KeyIdentity::from_raw(&RawKey::Modifier(Modifier::Ctrl, Side::Left));
        let right = KeyIdentity::from_raw(&RawKey::Modifier(Modifier::Ctrl, Side::Right));
        assert_eq!(left, Some(KeyIdentity::Named(NamedKey::Ctrl)));
        assert_eq!(left, right);
    }

    #[test]
    fn test_from_raw_rejects_unknown_and_control() {
        assert_eq!(KeyIdentity::from_raw(&RawKey::Unknown(42)), None);
        assert_eq!(KeyIdentity::from_raw(&RawKey::Char('\u{1b}')), None);
        assert_eq!(
            KeyIdentity::from_raw(&RawKey::Char(' ')),
            Some(KeyIdentity::Named(NamedKey::Space))
        );
    }

    #[test]
    fn test_display_and_canonical() {
        let f6 = KeyIdentity::Named(NamedKey::F6);
        assert_eq!(f6.display(), "F6");
        assert_eq!(f6.canonical(), "f6");

        let a = KeyIdentity::Character('A');
        assert_eq!(a.display(), "A");
        assert_eq!(a.canonical(), "a");

        assert_eq!(KeyIdentity::Named(NamedKey::PageDown).display(), "PAGEDOWN");
    }

    #[test]
    fn test_parse_canonical() {
        assert_eq!(
            KeyIdentity::parse_canonical("F6"),
            Some(KeyIdentity::Named(NamedKey::F6))
        );
        assert_eq!(
            KeyIdentity::parse_canonical(" escape "),
            Some(KeyIdentity::Named(NamedKey::Esc))
        );
        assert_eq!(
            KeyIdentity::parse_canonical("Q"),
            Some(KeyIdentity::Character('q'))
        );
        assert_eq!(KeyIdentity::parse_canonical(""), None);
        assert_eq!(KeyIdentity::parse_canonical("f13"), None);
        assert!("nonsense".parse::<KeyIdentity>().is_err());
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        assert!(KeyIdentity::Character('a').matches(&KeyIdentity::Character('A')));
        assert!(!KeyIdentity::Character('a').matches(&KeyIdentity::Character('b')));
        assert!(!KeyIdentity::Character('a').matches(&KeyIdentity::Named(NamedKey::F1)));
    }

    #[test]
    fn test_injectable() {
        assert!(KeyIdentity::Character('x').is_injectable());
        assert!(KeyIdentity::Named(NamedKey::Enter).is_injectable());
        assert!(!KeyIdentity::Character('\u{7}').is_injectable());
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let json = serde_json::to_string(&KeyIdentity::Named(NamedKey::PageUp)).unwrap();
        assert_eq!(json, "\"pageup\"");

        let key: KeyIdentity = serde_json::from_str("\"Z\"").unwrap();
        assert_eq!(key, KeyIdentity::Character('z'));

        assert!(serde_json::from_str::<KeyIdentity>("\"hyper\"").is_err());
    }
}
