//! Exclusion rules: URL patterns on which key handling is disabled or
//! restricted to a set of pass-through keys.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use tracing::warn;

use crate::schema::ExclusionRule;

static EMPTY_MATCH: Lazy<Regex> = Lazy::new(|| Regex::new("^$").expect("valid regex"));

/// Merged result of every rule matching a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionMatch {
    /// A rule without pass keys matched; the page is fully excluded.
    Absolute(ExclusionRule),
    /// Only rules with pass keys matched; their keys are merged.
    PassKeys(String),
}

/// Whether key handling is enabled on a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlStatus {
    pub is_enabled_for_url: bool,
    pub pass_keys: String,
}

/// Compiled exclusion rules.
pub struct ExclusionRules {
    rules: Vec<ExclusionRule>,
    cache: Mutex<HashMap<String, Regex>>,
}

impl ExclusionRules {
    pub fn new(rules: Vec<ExclusionRule>) -> Self {
        Self {
            rules: rules.into_iter().filter(|r| !r.pattern.is_empty()).collect(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    /// Replace the rule set; compiled patterns are discarded.
    pub fn set_rules(&mut self, rules: Vec<ExclusionRule>) {
        self.rules = rules.into_iter().filter(|r| !r.pattern.is_empty()).collect();
        self.cache.lock().clear();
    }

    /// Compile a `*`-glob pattern anchored at both ends. A pattern that does
    /// not compile matches only the empty string.
    pub fn pattern_regex(&self, pattern: &str) -> Regex {
        let mut cache = self.cache.lock();
        if let Some(re) = cache.get(pattern) {
            return re.clone();
        }
        let source = format!("^{}$", pattern.replace('*', ".*"));
        let re = match Regex::new(&source) {
            Ok(re) => re,
            Err(e) => {
                warn!("bad regexp in exclusion rule: {} ({})", pattern, e);
                EMPTY_MATCH.clone()
            }
        };
        cache.insert(pattern.to_string(), re.clone());
        re
    }

    /// Merge every rule matching `url`.
    pub fn rule_for_url(&self, url: &str) -> Option<ExclusionMatch> {
        let matching: Vec<&ExclusionRule> = self
            .rules
            .iter()
            .filter(|r| self.pattern_regex(&r.pattern).is_match(url))
            .collect();

        if let Some(rule) = matching.iter().find(|r| r.pass_keys.is_empty()) {
            return Some(ExclusionMatch::Absolute((*rule).clone()));
        }
        if matching.is_empty() {
            return None;
        }

        let mut pass_keys = String::new();
        for rule in matching {
            for ch in rule.pass_keys.chars().filter(|c| !c.is_whitespace()) {
                if !pass_keys.contains(ch) {
                    pass_keys.push(ch);
                }
            }
        }
        Some(ExclusionMatch::PassKeys(pass_keys))
    }

    pub fn is_enabled_for_url(&self, url: &str) -> UrlStatus {
        match self.rule_for_url(url) {
            None => UrlStatus {
                is_enabled_for_url: true,
                pass_keys: String::new(),
            },
            Some(ExclusionMatch::Absolute(_)) => UrlStatus {
                is_enabled_for_url: false,
                pass_keys: String::new(),
            },
            Some(ExclusionMatch::PassKeys(keys)) => UrlStatus {
                is_enabled_for_url: true,
                pass_keys: keys,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, pass_keys: &str) -> ExclusionRule {
        ExclusionRule {
            pattern: pattern.to_string(),
            pass_keys: pass_keys.to_string(),
        }
    }

    #[test]
    fn test_no_rules_enabled() {
        let rules = ExclusionRules::new(vec![]);
        let status = rules.is_enabled_for_url("https://example.com/");
        assert!(status.is_enabled_for_url);
        assert!(status.pass_keys.is_empty());
    }

    #[test]
    fn test_absolute_rule_disables() {
        let rules = ExclusionRules::new(vec![rule("https?://mail.google.com/*", "")]);
        let status = rules.is_enabled_for_url("https://mail.google.com/mail/u/0");
        assert!(!status.is_enabled_for_url);
        assert!(rules.rule_for_url("https://www.google.com/").is_none());
    }

    #[test]
    fn test_pass_keys_merged_and_deduplicated() {
        let rules = ExclusionRules::new(vec![
            rule("https://example.com/*", "j k"),
            rule("https://example.com/docs*", "k l"),
        ]);
        let result = rules.rule_for_url("https://example.com/docs/intro");
        assert_eq!(result, Some(ExclusionMatch::PassKeys("jkl".to_string())));
    }

    #[test]
    fn test_absolute_rule_wins_over_pass_keys() {
        let rules = ExclusionRules::new(vec![
            rule("https://example.com/*", "jk"),
            rule("https://example.com/*", ""),
        ]);
        assert!(matches!(
            rules.rule_for_url("https://example.com/x"),
            Some(ExclusionMatch::Absolute(_))
        ));
    }

    #[test]
    fn test_bad_pattern_matches_nothing() {
        let rules = ExclusionRules::new(vec![rule("https://(unclosed*", "")]);
        assert!(rules.rule_for_url("https://(unclosed/x").is_none());
        assert!(rules.pattern_regex("https://(unclosed*").is_match(""));
    }

    #[test]
    fn test_empty_patterns_dropped() {
        let rules = ExclusionRules::new(vec![rule("", ""), rule("https://a.com/*", "")]);
        assert_eq!(rules.rules().len(), 1);
    }

    #[test]
    fn test_set_rules_clears_cache() {
        let mut rules = ExclusionRules::new(vec![rule("https://a.com/*", "")]);
        assert!(rules.rule_for_url("https://a.com/x").is_some());
        rules.set_rules(vec![rule("https://b.com/*", "")]);
        assert!(rules.rule_for_url("https://a.com/x").is_none());
        assert!(rules.rule_for_url("https://b.com/x").is_some());
    }
}
