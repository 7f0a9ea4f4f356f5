use crate::keys::KeyEvent;
use crate::marker::HintMarker;
use crate::matcher::{MarkerMatcher, MatchOutcome};

#[cfg(test)]
#[path = "alphabet_tests.rs"]
mod tests;

/// `count` distinct, prefix-free hint strings over `characters`.
///
/// Strings are generated breadth first, so shorter strings come first and no
/// string is longer than needed. Reversing each string spreads the first
/// keystroke across the alphabet.
pub fn hint_strings(characters: &[char], count: usize) -> Vec<String> {
    if count == 0 || characters.len() < 2 {
        return Vec::new();
    }
    let mut hints = vec![String::new()];
    let mut offset = 0;
    while hints.len() - offset < count || hints.len() == 1 {
        let hint = hints[offset].clone();
        offset += 1;
        for ch in characters {
            hints.push(format!("{ch}{hint}"));
        }
    }
    let mut chosen = hints[offset..offset + count].to_vec();
    chosen.sort();
    chosen
        .into_iter()
        .map(|hint| hint.chars().rev().collect())
        .collect()
}

pub struct AlphabetHints {
    characters: Vec<char>,
    hint_keystroke_queue: Vec<char>,
    link_text_keystroke_queue: Vec<char>,
}

impl AlphabetHints {
    pub fn new(characters: &str) -> Self {
        Self {
            characters: characters.to_lowercase().chars().collect(),
            hint_keystroke_queue: Vec::new(),
            link_text_keystroke_queue: Vec::new(),
        }
    }
}

impl MarkerMatcher for AlphabetHints {
    fn fill_in_markers(&mut self, markers: &mut [HintMarker]) {
        let strings = hint_strings(&self.characters, markers.len());
        for (marker, hint_string) in markers.iter_mut().zip(strings) {
            marker.rendered = hint_string.to_uppercase();
            marker.hint_string = hint_string;
        }
    }

    fn get_matching_hints(&mut self, markers: &mut [HintMarker], _tab_count: i32) -> MatchOutcome {
        let typed: String = self.hint_keystroke_queue.iter().collect();
        MatchOutcome {
            links_matched: markers
                .iter()
                .enumerate()
                .filter(|(_, m)| m.hint_string.starts_with(&typed))
                .map(|(i, _)| i)
                .collect(),
            user_might_over_type: false,
        }
    }

    fn push_key_char(&mut self, ch: char) {
        self.hint_keystroke_queue.push(ch);
    }

    fn pop_key_char(&mut self) -> bool {
        self.hint_keystroke_queue.pop().is_some()
    }

    fn should_rotate_hints(&self, _event: &KeyEvent) -> bool {
        true
    }

    fn hint_keystroke_queue(&self) -> &[char] {
        &self.hint_keystroke_queue
    }

    fn link_text_keystroke_queue(&self) -> &[char] {
        &self.link_text_keystroke_queue
    }

    fn set_keystroke_queues(&mut self, hint_keystrokes: Vec<char>, link_text_keystrokes: Vec<char>) {
        self.hint_keystroke_queue = hint_keystrokes;
        self.link_text_keystroke_queue = link_text_keystrokes;
    }

    fn active_hint(&self) -> Option<usize> {
        None
    }
}
