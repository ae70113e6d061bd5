//! Host-agnostic keyboard event types.
//!
//! Every host maps its native keyboard matrix to these types. The framework
//! and the apps never see raw scan codes.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// A logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A printable ASCII character (space included).
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    Up,
    Down,
    Left,
    Right,
    /// A code the host could not map.
    Unknown(u8),
}

impl Key {
    /// Decode a key code delivered by the keyboard in ASCII mode.
    ///
    /// Arrow keys have no ASCII code; hosts report them as `Key::Up` etc.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x1B => Self::Escape,
            0x0D | 0x0A => Self::Enter,
            0x08 => Self::Backspace,
            0x09 => Self::Tab,
            0x7F => Self::Delete,
            0x20..=0x7E => Self::Char(code as char),
            other => Self::Unknown(other),
        }
    }

    /// Short display name for special keys, `None` for ordinary characters.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::Escape => Some("ESC"),
            Self::Enter => Some("ENTER"),
            Self::Backspace => Some("BKSP"),
            Self::Tab => Some("TAB"),
            Self::Delete => Some("DEL"),
            Self::Char(' ') => Some("SPACE"),
            Self::Up => Some("UP"),
            Self::Down => Some("DOWN"),
            Self::Left => Some("LEFT"),
            Self::Right => Some("RIGHT"),
            Self::Char(_) | Self::Unknown(_) => None,
        }
    }

    /// `;` doubles as "up" because the arrows sit behind the Fn layer.
    pub fn is_nav_up(&self) -> bool {
        matches!(self, Self::Up | Self::Char(';'))
    }

    /// `.` doubles as "down".
    pub fn is_nav_down(&self) -> bool {
        matches!(self, Self::Down | Self::Char('.'))
    }

    /// `,` doubles as "left".
    pub fn is_nav_left(&self) -> bool {
        matches!(self, Self::Left | Self::Char(','))
    }

    /// `/` doubles as "right".
    pub fn is_nav_right(&self) -> bool {
        matches!(self, Self::Right | Self::Char('/'))
    }

    /// The ASCII-mode key code, the inverse of [`Key::from_code`]. Arrow
    /// keys have none.
    pub fn code(&self) -> Option<u8> {
        match self {
            Self::Escape => Some(0x1B),
            Self::Enter => Some(0x0D),
            Self::Backspace => Some(0x08),
            Self::Tab => Some(0x09),
            Self::Delete => Some(0x7F),
            Self::Char(c) if c.is_ascii() => Some(*c as u8),
            Self::Unknown(code) => Some(*code),
            Self::Char(_) | Self::Up | Self::Down | Self::Left | Self::Right => None,
        }
    }

    /// Printable character carried by this key, if any.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name(), self) {
            (Some(name), _) => f.write_str(name),
            (None, Self::Char(c)) => write!(f, "{c}"),
            (None, Self::Unknown(code)) => write!(f, "0x{code:02X}"),
            (None, _) => f.write_str("?"),
        }
    }
}

/// Modifier keys held while a key was pressed (8-bit HID mask).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const LCTRL: Self = Self(0x01);
    pub const LSHIFT: Self = Self(0x02);
    pub const LALT: Self = Self(0x04);
    pub const LMETA: Self = Self(0x08);
    pub const RCTRL: Self = Self(0x10);
    pub const RSHIFT: Self = Self(0x20);
    pub const RALT: Self = Self(0x40);
    pub const RMETA: Self = Self(0x80);

    /// Labels in mask-bit order.
    const LABELS: [(Self, &'static str); 8] = [
        (Self::LCTRL, "Ctrl"),
        (Self::LSHIFT, "Shft"),
        (Self::LALT, "Alt"),
        (Self::LMETA, "Opt"),
        (Self::RCTRL, "RCtrl"),
        (Self::RSHIFT, "RShft"),
        (Self::RALT, "RAlt"),
        (Self::RMETA, "ROpt"),
    ];

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn ctrl(self) -> bool {
        self.0 & (Self::LCTRL.0 | Self::RCTRL.0) != 0
    }

    pub const fn shift(self) -> bool {
        self.0 & (Self::LSHIFT.0 | Self::RSHIFT.0) != 0
    }

    /// Human-readable form such as `Ctrl+Shft`, empty when nothing is held.
    pub fn describe(self) -> String {
        Self::LABELS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, label)| *label)
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One key press delivered to an app.
///
/// Handlers call [`KeyEvent::mark_handled`] when they consume the event.
/// An unhandled `Escape` sends the active app back to the launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    handled: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
            handled: false,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            handled: false,
        }
    }

    pub fn mark_handled(&mut self) {
        self.handled = true;
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_codes_decode() {
        assert_eq!(Key::from_code(0x1B), Key::Escape);
        assert_eq!(Key::from_code(0x0D), Key::Enter);
        assert_eq!(Key::from_code(0x0A), Key::Enter);
        assert_eq!(Key::from_code(0x08), Key::Backspace);
        assert_eq!(Key::from_code(0x09), Key::Tab);
        assert_eq!(Key::from_code(0x7F), Key::Delete);
    }

    #[test]
    fn printable_codes_decode_to_chars() {
        assert_eq!(Key::from_code(b'a'), Key::Char('a'));
        assert_eq!(Key::from_code(b' '), Key::Char(' '));
        assert_eq!(Key::from_code(b'~'), Key::Char('~'));
    }

    #[test]
    fn out_of_range_codes_are_unknown() {
        assert_eq!(Key::from_code(0x00), Key::Unknown(0));
        assert_eq!(Key::from_code(0x80), Key::Unknown(0x80));
    }

    #[test]
    fn codes_of_special_keys() {
        assert_eq!(Key::Enter.code(), Some(0x0D));
        assert_eq!(Key::Escape.code(), Some(0x1B));
        assert_eq!(Key::Up.code(), None);
        assert_eq!(Key::Char('é').code(), None);
    }

    #[test]
    fn special_key_names() {
        assert_eq!(Key::Escape.name(), Some("ESC"));
        assert_eq!(Key::Backspace.name(), Some("BKSP"));
        assert_eq!(Key::Char(' ').name(), Some("SPACE"));
        assert_eq!(Key::Right.name(), Some("RIGHT"));
        assert_eq!(Key::Char('q').name(), None);
    }

    #[test]
    fn display_uses_name_or_char() {
        assert_eq!(Key::Enter.to_string(), "ENTER");
        assert_eq!(Key::Char('x').to_string(), "x");
        assert_eq!(Key::Unknown(0x81).to_string(), "0x81");
    }

    #[test]
    fn nav_aliases() {
        assert!(Key::Char(';').is_nav_up());
        assert!(Key::Up.is_nav_up());
        assert!(Key::Char('.').is_nav_down());
        assert!(Key::Down.is_nav_down());
        assert!(Key::Char(',').is_nav_left());
        assert!(Key::Char('/').is_nav_right());
        assert!(!Key::Char('a').is_nav_up());
    }

    #[test]
    fn describe_modifiers() {
        assert_eq!(Modifiers::NONE.describe(), "");
        assert_eq!((Modifiers::LCTRL | Modifiers::LSHIFT).describe(), "Ctrl+Shft");
        assert_eq!((Modifiers::RALT | Modifiers::LMETA).describe(), "Opt+RAlt");
    }

    #[test]
    fn modifier_queries() {
        let m = Modifiers::RCTRL | Modifiers::LSHIFT;
        assert!(m.ctrl());
        assert!(m.shift());
        assert!(!m.is_empty());
        assert!(m.contains(Modifiers::RCTRL));
        assert!(!m.contains(Modifiers::LALT));
    }

    #[test]
    fn key_event_starts_unhandled() {
        let mut ev = KeyEvent::new(Key::Escape);
        assert!(!ev.is_handled());
        ev.mark_handled();
        assert!(ev.is_handled());
    }

    #[test]
    fn key_serde_roundtrip() {
        let json = serde_json::to_string(&Key::Char('z')).unwrap();
        let back: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Key::Char('z'));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn printable_codes_roundtrip(code in 0x20u8..=0x7E) {
                prop_assert_eq!(Key::from_code(code).as_char(), Some(code as char));
            }

            #[test]
            fn code_inverts_from_code(code in 0x20u8..=0x7F) {
                prop_assert_eq!(Key::from_code(code).code(), Some(code));
            }
        }
    }
}
