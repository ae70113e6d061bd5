//! Stdin line -> key presses.
//!
//! A line is a whitespace-separated list of tokens:
//!
//! - a key name: `enter`, `esc`, `tab`, `bksp`, `del`, `space`, `up`,
//!   `down`, `left`, `right`
//! - `ctrl+`, `shift+`, `alt+` or `opt+` prefixes on a key name or single
//!   character, e.g. `ctrl+c`
//! - `'text`: every character after the quote, spaces included up to the
//!   end of the line
//! - anything else: one press per character
//!
//! An empty line produces no keys.

use cardkit_core::{Key, KeyEvent, Modifiers};

fn named(token: &str) -> Option<Key> {
    let key = match token.to_ascii_lowercase().as_str() {
        "enter" | "ret" => Key::Enter,
        "esc" | "escape" => Key::Escape,
        "tab" => Key::Tab,
        "bksp" | "backspace" => Key::Backspace,
        "del" | "delete" => Key::Delete,
        "space" => Key::Char(' '),
        "up" => Key::Up,
        "down" => Key::Down,
        "left" => Key::Left,
        "right" => Key::Right,
        _ => return None,
    };
    Some(key)
}

fn modifier(prefix: &str) -> Option<Modifiers> {
    match prefix.to_ascii_lowercase().as_str() {
        "ctrl" => Some(Modifiers::LCTRL),
        "shift" | "shft" => Some(Modifiers::LSHIFT),
        "alt" => Some(Modifiers::LALT),
        "opt" | "meta" => Some(Modifiers::LMETA),
        _ => None,
    }
}

/// Parse a `ctrl+shift+x` style chord. `None` if any prefix is not a
/// modifier or the final part is not a single key.
fn chord(token: &str) -> Option<KeyEvent> {
    let mut parts: Vec<&str> = token.split('+').collect();
    let last = parts.pop()?;
    if parts.is_empty() {
        return None;
    }
    let mut mods = Modifiers::NONE;
    for part in parts {
        mods = mods | modifier(part)?;
    }
    let key = named(last).or_else(|| {
        let mut chars = last.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Key::Char(c)),
            _ => None,
        }
    })?;
    Some(KeyEvent::with_modifiers(key, mods))
}

/// Parse one input line.
pub fn parse_line(line: &str) -> Vec<KeyEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(text) = line.trim_start().strip_prefix('\'') {
        return text.chars().map(|c| KeyEvent::new(Key::Char(c))).collect();
    }

    let mut events = Vec::new();
    for token in line.split_whitespace() {
        if let Some(key) = named(token) {
            events.push(KeyEvent::new(key));
        } else if let Some(event) = chord(token) {
            events.push(event);
        } else {
            events.extend(token.chars().map(|c| KeyEvent::new(Key::Char(c))));
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(line: &str) -> Vec<Key> {
        parse_line(line).into_iter().map(|e| e.key).collect()
    }

    #[test]
    fn empty_line_is_no_keys() {
        assert!(parse_line("").is_empty());
        assert!(parse_line("   \n").is_empty());
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(keys("Enter ESC up"), vec![Key::Enter, Key::Escape, Key::Up]);
        assert_eq!(keys("space bksp"), vec![Key::Char(' '), Key::Backspace]);
    }

    #[test]
    fn other_tokens_type_each_character() {
        assert_eq!(
            keys("hi ;"),
            vec![Key::Char('h'), Key::Char('i'), Key::Char(';')]
        );
    }

    #[test]
    fn quote_types_the_rest_verbatim() {
        assert_eq!(
            keys("'a b"),
            vec![Key::Char('a'), Key::Char(' '), Key::Char('b')]
        );
    }

    #[test]
    fn chords_carry_modifiers() {
        let events = parse_line("ctrl+shift+c alt+enter");
        assert_eq!(events[0].key, Key::Char('c'));
        assert_eq!(events[0].modifiers.describe(), "Ctrl+Shft");
        assert_eq!(events[1].key, Key::Enter);
        assert_eq!(events[1].modifiers, Modifiers::LALT);
    }

    #[test]
    fn bad_chords_are_typed_literally() {
        assert_eq!(keys("foo+x").len(), 5);
        assert_eq!(keys("+").len(), 1);
    }
}
