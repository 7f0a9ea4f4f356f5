//! Marker matchers turn typed keys into the set of matching markers.
//!
//! [`AlphabetHints`] labels markers with prefix-free strings over the hint
//! alphabet. [`FilterHints`] narrows markers by their link text and numbers
//! the survivors.

mod alphabet;
mod filter;

use std::collections::HashSet;

use keyhints_config::Settings;
use tracing::warn;

use crate::keys::KeyEvent;
use crate::marker::HintMarker;

pub use alphabet::{AlphabetHints, hint_strings};
pub use filter::FilterHints;

/// Result of matching the current keystrokes against the markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// Indices of matching markers, best first.
    pub links_matched: Vec<usize>,
    /// Text was typed but no hint digits: the user may still be typing the
    /// link text when a single match resolves.
    pub user_might_over_type: bool,
}

pub trait MarkerMatcher: Send + Sync {
    /// Assign labels to freshly created markers.
    fn fill_in_markers(&mut self, markers: &mut [HintMarker]);

    fn get_matching_hints(&mut self, markers: &mut [HintMarker], tab_count: i32) -> MatchOutcome;

    fn push_key_char(&mut self, ch: char);

    /// Remove the last typed character; false when nothing was typed.
    fn pop_key_char(&mut self) -> bool;

    fn should_rotate_hints(&self, event: &KeyEvent) -> bool;

    fn hint_keystroke_queue(&self) -> &[char];

    fn link_text_keystroke_queue(&self) -> &[char];

    /// Adopt keystroke queues broadcast by the frame the user is typing in.
    fn set_keystroke_queues(&mut self, hint_keystrokes: Vec<char>, link_text_keystrokes: Vec<char>);

    /// Marker activated by Enter, if the matcher has one.
    fn active_hint(&self) -> Option<usize>;
}

/// Matcher selected by the user's settings. Hint alphabets are reduced to
/// their distinct characters; fewer than two falls back to the default.
pub fn matcher_for(settings: &Settings) -> Box<dyn MarkerMatcher> {
    let defaults = Settings::default();
    if settings.filter_link_hints {
        let numbers = usable_alphabet(
            &settings.link_hint_numbers,
            &defaults.link_hint_numbers,
            "link hint numbers",
        );
        return Box::new(FilterHints::new(&numbers, settings.hints.rendered_link_text_max));
    }
    let characters = usable_alphabet(
        &settings.link_hint_characters.to_lowercase(),
        &defaults.link_hint_characters,
        "link hint characters",
    );
    Box::new(AlphabetHints::new(&characters))
}

fn usable_alphabet(configured: &str, default: &str, what: &str) -> String {
    let mut seen = HashSet::new();
    let distinct: String = configured.chars().filter(|ch| seen.insert(*ch)).collect();
    if seen.len() < 2 {
        warn!(configured, "{} need two distinct characters, using default", what);
        return default.to_string();
    }
    distinct
}
