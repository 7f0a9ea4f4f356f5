use once_cell::sync::Lazy;
use regex::Regex;

use crate::keys::KeyEvent;
use crate::link_text::render_marker_text;
use crate::marker::HintMarker;
use crate::matcher::{MarkerMatcher, MatchOutcome};

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid regex"));

/// Length assumed for markers without link text when normalising scores.
/// Scores divide by `ln(1 + length)`, so short link texts beat long ones.
const EMPTY_TEXT_LENGTH: usize = 100;

/// Filter-mode matching: typed text narrows markers by link text, typed
/// hint digits pick among the survivors.
pub struct FilterHints {
    link_hint_numbers: Vec<char>,
    numbers_have_letters: bool,
    split: Regex,
    rendered_link_text_max: usize,
    hint_keystroke_queue: Vec<char>,
    link_text_keystroke_queue: Vec<char>,
    active_hint: Option<usize>,
}

impl FilterHints {
    pub fn new(link_hint_numbers: &str, rendered_link_text_max: usize) -> Self {
        // Hint digits never count as part of a word.
        let split = Regex::new(&format!(r"[\W{}]+", regex::escape(link_hint_numbers)))
            .unwrap_or_else(|_| NON_WORD.clone());
        Self {
            link_hint_numbers: link_hint_numbers.chars().collect(),
            numbers_have_letters: link_hint_numbers.to_lowercase() != link_hint_numbers.to_uppercase(),
            split,
            rendered_link_text_max,
            hint_keystroke_queue: Vec::new(),
            link_text_keystroke_queue: Vec::new(),
            active_hint: None,
        }
    }

    /// `n` written in base `link_hint_numbers.len()` with the hint digits.
    pub fn generate_hint_string(&self, mut n: usize) -> String {
        let base = self.link_hint_numbers.len();
        if base < 2 {
            return String::new();
        }
        let mut digits = Vec::new();
        while n > 0 {
            digits.push(self.link_hint_numbers[n % base]);
            n /= base;
        }
        digits.iter().rev().collect()
    }

    /// Relevance of `link_text` to the typed `search` text; zero unless
    /// every search word occurs in some word of the link text.
    ///
    /// Each search word takes its best score over the link words: a whole
    /// word scores 8 (first word) or 4, a word prefix 6 or 2, any other
    /// substring 1. Shorter link texts score higher.
    pub fn score_link_hint(&self, link_text: &str, search: &str) -> f64 {
        let search = search.trim().to_lowercase();
        let text = link_text.to_lowercase();
        let link_words: Vec<&str> = self.split.split(&text).filter(|w| !w.is_empty()).collect();

        let mut total = 0.0;
        for search_word in self.split.split(&search) {
            let best = link_words
                .iter()
                .enumerate()
                .map(|(index, link_word)| word_score(search_word, link_word, index))
                .fold(f64::NEG_INFINITY, f64::max);
            if best == 0.0 {
                return 0.0;
            }
            total += best;
        }

        let length = match link_text.chars().count() {
            0 => EMPTY_TEXT_LENGTH,
            n => n,
        };
        total / (1.0 + length as f64).ln()
    }

    /// Score every marker, keep the matches best first and number them.
    /// With no match at all, the last typed text character is dropped and
    /// matching retried.
    fn filter_link_hints(&mut self, markers: &mut [HintMarker]) -> Vec<usize> {
        loop {
            let search: String = self.link_text_keystroke_queue.iter().collect();
            let keep_all = search.trim().is_empty();
            let mut matching = Vec::new();
            for (index, marker) in markers.iter_mut().enumerate() {
                let score = self.score_link_hint(marker.link_text(), &search);
                marker.score = score;
                if keep_all || score > 0.0 {
                    matching.push(index);
                }
            }

            if matching.is_empty()
                && self.hint_keystroke_queue.is_empty()
                && !self.link_text_keystroke_queue.is_empty()
            {
                self.link_text_keystroke_queue.pop();
                continue;
            }

            matching.sort_by(|a, b| {
                let (a, b) = (&markers[*a], &markers[*b]);
                b.score
                    .total_cmp(&a.score)
                    .then(b.stable_sort_count.cmp(&a.stable_sort_count))
            });
            for (position, index) in matching.iter().enumerate() {
                let hint_string = self.generate_hint_string(position + 1);
                let marker = &mut markers[*index];
                marker.rendered = render_marker_text(
                    &hint_string,
                    Some(marker.link_text()),
                    marker.show_link_text,
                    self.rendered_link_text_max,
                );
                marker.hint_string = hint_string;
            }
            return matching;
        }
    }
}

fn word_score(search_word: &str, link_word: &str, index: usize) -> f64 {
    let first = index == 0;
    match link_word.find(search_word) {
        None => 0.0,
        Some(0) if search_word.len() == link_word.len() => {
            if first {
                8.0
            } else {
                4.0
            }
        }
        Some(0) => {
            if first {
                6.0
            } else {
                2.0
            }
        }
        Some(_) => 1.0,
    }
}

impl MarkerMatcher for FilterHints {
    fn fill_in_markers(&mut self, markers: &mut [HintMarker]) {
        self.get_matching_hints(markers, 0);
    }

    fn get_matching_hints(&mut self, markers: &mut [HintMarker], tab_count: i32) -> MatchOutcome {
        let typed: String = self.hint_keystroke_queue.iter().collect();
        let links_matched: Vec<usize> = self
            .filter_link_hints(markers)
            .into_iter()
            .filter(|index| markers[*index].hint_string.starts_with(&typed))
            .collect();

        self.active_hint = if links_matched.is_empty() {
            None
        } else {
            let len = links_matched.len() as i32;
            let position = (len * tab_count.abs() + tab_count) % len;
            links_matched.get(position as usize).copied()
        };

        MatchOutcome {
            links_matched,
            user_might_over_type: self.hint_keystroke_queue.is_empty()
                && !self.link_text_keystroke_queue.is_empty(),
        }
    }

    fn push_key_char(&mut self, ch: char) {
        if self.link_hint_numbers.contains(&ch) {
            self.hint_keystroke_queue.push(ch);
            return;
        }
        // Upper-case letters are never hint digits, nor link text.
        if ch.is_uppercase() && self.numbers_have_letters {
            return;
        }
        if ch == ' ' || !self.split.is_match(&ch.to_string()) {
            self.hint_keystroke_queue.clear();
            self.link_text_keystroke_queue.extend(ch.to_lowercase());
        }
    }

    fn pop_key_char(&mut self) -> bool {
        self.hint_keystroke_queue.pop().is_some() || self.link_text_keystroke_queue.pop().is_some()
    }

    /// Space is link text unless a modifier is held.
    fn should_rotate_hints(&self, event: &KeyEvent) -> bool {
        event.has_modifier()
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
        self.active_hint
    }
}
