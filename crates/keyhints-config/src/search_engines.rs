//! Custom search-engine configuration parsing.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use keyhints_protocols::UserSearchEngine;

static PROTOCOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://").expect("valid regex"));

/// Parsed search-engine configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchEngineConfig {
    pub keyword_to_engine: HashMap<String, UserSearchEngine>,
    pub validation_errors: Vec<String>,
}

/// Split configuration text into meaningful lines, dropping blanks and
/// `#`/`"` comments.
pub fn parse_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('"'))
        .collect()
}

/// Parse `keyword: url [description...]` lines.
pub fn parse_search_engines(text: &str) -> SearchEngineConfig {
    let mut config = SearchEngineConfig::default();

    for line in parse_lines(text) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            config
                .validation_errors
                .push(format!("This line has less than two tokens: {}", line));
            continue;
        }
        let Some((keyword, _)) = tokens[0].split_once(':') else {
            config
                .validation_errors
                .push(format!("This line doesn't include a \":\" character: {}", line));
            continue;
        };
        let url = tokens[1];
        if !PROTOCOL.is_match(url) && !url.starts_with("javascript:") {
            config
                .validation_errors
                .push(format!("This search engine doesn't have a valid URL: {}", line));
            continue;
        }
        let description = if tokens.len() > 2 {
            tokens[2..].join(" ")
        } else {
            format!("search ({})", keyword)
        };
        config.keyword_to_engine.insert(
            keyword.to_string(),
            UserSearchEngine {
                keyword: keyword.to_string(),
                url: url.to_string(),
                description,
            },
        );
    }

    for error in &config.validation_errors {
        warn!("search engine config: {}", error);
    }
    config
}
