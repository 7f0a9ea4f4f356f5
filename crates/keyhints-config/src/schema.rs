//! Settings schema definitions.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

/// Root settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Alphabet used for alphabet-mode hint labels.
    #[serde(default = "default_link_hint_characters")]
    pub link_hint_characters: String,

    /// Alphabet used for filter-mode hint labels.
    #[serde(default = "default_link_hint_numbers")]
    pub link_hint_numbers: String,

    #[serde(default)]
    pub filter_link_hints: bool,

    #[serde(default = "default_true")]
    pub wait_for_enter_for_filtered_hints: bool,

    /// Fallback search URL for queries that are not URLs.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Custom search engines, one `keyword: url description` per line.
    #[serde(default = "default_search_engines")]
    pub search_engines: String,

    #[serde(default = "default_exclusion_rules")]
    pub exclusion_rules: Vec<ExclusionRule>,

    #[serde(default)]
    pub hints: HintsConfig,

    #[serde(default)]
    pub completion: CompletionConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            link_hint_characters: default_link_hint_characters(),
            link_hint_numbers: default_link_hint_numbers(),
            filter_link_hints: false,
            wait_for_enter_for_filtered_hints: true,
            search_url: default_search_url(),
            search_engines: default_search_engines(),
            exclusion_rules: default_exclusion_rules(),
            hints: HintsConfig::default(),
            completion: CompletionConfig::default(),
        }
    }
}

fn default_link_hint_characters() -> String {
    "sadfjklewcmpgh".to_string()
}

fn default_link_hint_numbers() -> String {
    "0123456789".to_string()
}

fn default_true() -> bool {
    true
}

fn default_search_url() -> String {
    "https://www.google.com/search?q=".to_string()
}

fn default_search_engines() -> String {
    "w: https://www.wikipedia.org/w/index.php?title=Special:Search&search=%s Wikipedia\n\
     \n\
     # More examples.\n\
     #\n\
     # g: https://www.google.com/search?q=%s Google\n\
     # y: https://www.youtube.com/results?search_query=%s Youtube\n\
     # gm: https://www.google.com/maps?q=%s Google maps\n\
     # b: https://www.bing.com/search?q=%s Bing\n\
     # d: https://duckduckgo.com/?q=%s DuckDuckGo\n\
     # az: https://www.amazon.com/s/?field-keywords=%s Amazon\n\
     # qw: https://www.qwant.com/?q=%s Qwant\n"
        .to_string()
}

fn default_exclusion_rules() -> Vec<ExclusionRule> {
    vec![ExclusionRule {
        pattern: "https?://mail.google.com/*".to_string(),
        pass_keys: String::new(),
    }]
}

/// Disables (or partially disables) key handling on matching URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// URL pattern; `*` matches anything.
    pub pattern: String,

    /// Keys passed through to the page; empty means fully excluded.
    #[serde(default)]
    pub pass_keys: String,
}

/// Link-hint tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintsConfig {
    /// Failsafe for the pre-activation key suppression mode.
    #[serde(default = "default_suppression_timeout_ms")]
    pub suppression_timeout_ms: u64,

    /// How long the tab coordinator waits for silent frames.
    #[serde(default = "default_descriptor_timeout_ms")]
    pub descriptor_timeout_ms: u64,

    #[serde(default = "default_typing_protector_ms")]
    pub typing_protector_ms: u64,

    #[serde(default = "default_flash_ms")]
    pub flash_ms: u64,

    #[serde(default = "default_false_positive_lookback")]
    pub false_positive_lookback: usize,

    #[serde(default = "default_false_positive_ancestor_hops")]
    pub false_positive_ancestor_hops: usize,

    /// Rects narrower or shorter than this are treated as invisible.
    #[serde(default = "default_min_rect_size")]
    pub min_rect_size: f64,

    /// Inward nudge applied to rect corners when probing for occlusion.
    #[serde(default = "default_corner_nudge")]
    pub corner_nudge: f64,

    #[serde(default = "default_link_text_max_chars")]
    pub link_text_max_chars: usize,

    #[serde(default = "default_rendered_link_text_max")]
    pub rendered_link_text_max: usize,
}

impl Default for HintsConfig {
    fn default() -> Self {
        Self {
            suppression_timeout_ms: default_suppression_timeout_ms(),
            descriptor_timeout_ms: default_descriptor_timeout_ms(),
            typing_protector_ms: default_typing_protector_ms(),
            flash_ms: default_flash_ms(),
            false_positive_lookback: default_false_positive_lookback(),
            false_positive_ancestor_hops: default_false_positive_ancestor_hops(),
            min_rect_size: default_min_rect_size(),
            corner_nudge: default_corner_nudge(),
            link_text_max_chars: default_link_text_max_chars(),
            rendered_link_text_max: default_rendered_link_text_max(),
        }
    }
}

fn default_suppression_timeout_ms() -> u64 {
    1000
}

fn default_descriptor_timeout_ms() -> u64 {
    1000
}

fn default_typing_protector_ms() -> u64 {
    200
}

fn default_flash_ms() -> u64 {
    400
}

fn default_false_positive_lookback() -> usize {
    6
}

fn default_false_positive_ancestor_hops() -> usize {
    3
}

fn default_min_rect_size() -> f64 {
    3.0
}

fn default_corner_nudge() -> f64 {
    0.1
}

fn default_link_text_max_chars() -> usize {
    256
}

fn default_rendered_link_text_max() -> usize {
    35
}

/// Omnibar completion tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Typing debounce before a completion-engine request.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_failure_cache_secs")]
    pub failure_cache_secs: u64,

    #[serde(default = "default_cache_expiry_secs")]
    pub cache_expiry_secs: u64,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Shorter queries never reach a completion engine.
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            debounce_ms: default_debounce_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            failure_cache_secs: default_failure_cache_secs(),
            cache_expiry_secs: default_cache_expiry_secs(),
            cache_capacity: default_cache_capacity(),
            history_size: default_history_size(),
            min_query_length: default_min_query_length(),
        }
    }
}

fn default_max_results() -> usize {
    10
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_request_timeout_ms() -> u64 {
    2500
}

fn default_failure_cache_secs() -> u64 {
    30
}

fn default_cache_expiry_secs() -> u64 {
    2 * 60 * 60
}

fn default_cache_capacity() -> usize {
    5000
}

fn default_history_size() -> usize {
    20000
}

fn default_min_query_length() -> usize {
    4
}
