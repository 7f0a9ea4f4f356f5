//! Keyboard events as seen by hint modes.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;

/// A keydown or keyup. `key` follows DOM `KeyboardEvent.key` naming:
/// printable keys are the character itself, others are names such as
/// `Enter`, `Tab` or `Shift`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
    /// Auto-repeat from a held key.
    #[serde(default)]
    pub repeat: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
            repeat: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn is_escape(&self) -> bool {
        self.key == "Escape" || (self.ctrl && self.key == "[")
    }

    pub fn is_backspace(&self) -> bool {
        matches!(self.key.as_str(), "Backspace" | "Delete")
    }

    pub fn is_enter(&self) -> bool {
        self.key == "Enter"
    }

    pub fn is_tab(&self) -> bool {
        self.key == "Tab"
    }

    pub fn has_modifier(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }

    /// The typed character, for printable keys.
    pub fn key_char(&self) -> Option<char> {
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Some(ch),
            _ => None,
        }
    }

    /// Parse a key sequence such as `ab<Tab><Enter>`. Bracketed names:
    /// `Tab`, `S-Tab`, `Enter`, `Esc`, `BS`, `Del`, `Space`, `Shift`,
    /// `Control`; anything else in brackets is taken as a key name.
    pub fn parse_sequence(sequence: &str) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        let mut chars = sequence.chars();
        while let Some(ch) = chars.next() {
            if ch != '<' {
                let event = KeyEvent::new(ch.to_string());
                events.push(if ch.is_uppercase() { event.with_shift() } else { event });
                continue;
            }
            let name: String = chars.by_ref().take_while(|c| *c != '>').collect();
            events.push(match name.as_str() {
                "Tab" => KeyEvent::new("Tab"),
                "S-Tab" => KeyEvent::new("Tab").with_shift(),
                "Enter" | "CR" => KeyEvent::new("Enter"),
                "Esc" | "Escape" => KeyEvent::new("Escape"),
                "BS" | "Backspace" => KeyEvent::new("Backspace"),
                "Del" | "Delete" => KeyEvent::new("Delete"),
                "Space" => KeyEvent::new(" "),
                "S-Space" => KeyEvent::new(" ").with_shift(),
                "Shift" => KeyEvent::new("Shift").with_shift(),
                "Control" | "Ctrl" => KeyEvent::new("Control").with_ctrl(),
                other => KeyEvent::new(other),
            });
        }
        events
    }
}
