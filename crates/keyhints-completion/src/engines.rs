//! Completion engines: where to fetch search suggestions for a search URL,
//! and how to read the response.

use std::sync::Arc;

use keyhints_protocols::CompletionError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::url_utils::create_search_url;

#[cfg(test)]
#[path = "engines_tests.rs"]
mod tests;

const GOOGLE_MAPS_PREFIX: &str = "map of";

static GOOGLE_SUGGESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<suggestion\s+data="([^"]*)""#).expect("valid regex"));

/// How an engine's response body is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseFormat {
    /// `<suggestion data="..."/>` elements.
    GoogleXml,
    /// Google XML, keeping only suggestions that start with "map of".
    GoogleMapsXml,
    /// `[query, [suggestion, ...], ...]`.
    OpenSearch,
    /// `[{"phrase": ...}, ...]`.
    DuckDuckGo,
    /// `{"docs": [{"word": ...}]}`.
    Webster,
    /// `{"data": {"items": [{"value": ...}]}}`.
    Qwant,
    /// `{"data": {"searchTerms": [...]}}`.
    UpToDate,
    /// Never yields anything.
    Empty,
}

impl ResponseFormat {
    /// Extract suggestion strings from a response body.
    pub fn parse(&self, body: &str) -> Result<Vec<String>, CompletionError> {
        match self {
            Self::GoogleXml => Ok(parse_google_xml(body)),
            Self::GoogleMapsXml => Ok(parse_google_xml(body)
                .into_iter()
                .filter_map(|s| {
                    s.strip_prefix(GOOGLE_MAPS_PREFIX)
                        .map(|rest| rest.trim_start().to_string())
                })
                .collect()),
            Self::OpenSearch => {
                let json: Value = serde_json::from_str(body)?;
                strings(json.get(1))
            }
            Self::DuckDuckGo => {
                let json: Value = serde_json::from_str(body)?;
                field_of_each(Some(&json), "phrase")
            }
            Self::Webster => {
                let json: Value = serde_json::from_str(body)?;
                field_of_each(json.get("docs"), "word")
            }
            Self::Qwant => {
                let json: Value = serde_json::from_str(body)?;
                field_of_each(json.pointer("/data/items"), "value")
            }
            Self::UpToDate => {
                let json: Value = serde_json::from_str(body)?;
                strings(json.pointer("/data/searchTerms"))
            }
            Self::Empty => Ok(Vec::new()),
        }
    }
}

fn parse_google_xml(body: &str) -> Vec<String> {
    GOOGLE_SUGGESTION
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| unescape_xml(m.as_str()))
        .filter(|s| !s.is_empty())
        .collect()
}

fn unescape_xml(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn strings(value: Option<&Value>) -> Result<Vec<String>, CompletionError> {
    let array = value
        .and_then(Value::as_array)
        .ok_or_else(|| CompletionError::Parse("expected an array of suggestions".into()))?;
    Ok(array
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

fn field_of_each(value: Option<&Value>, field: &str) -> Result<Vec<String>, CompletionError> {
    let array = value
        .and_then(Value::as_array)
        .ok_or_else(|| CompletionError::Parse(format!("expected an array of {field} objects")))?;
    Ok(array
        .iter()
        .filter_map(|item| item.get(field).and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

/// Custom search engine a user could configure to benefit from an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineExample {
    pub keyword: String,
    pub search_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// A suggestion service for one family of search URLs.
#[derive(Debug, Clone)]
pub struct CompletionEngine {
    pub name: String,
    /// Suggestion endpoint with a `%s` placeholder; `None` for the catch-all engine.
    pub engine_url: Option<String>,
    regexps: Vec<Regex>,
    pub format: ResponseFormat,
    pub example: Option<EngineExample>,
}

impl CompletionEngine {
    /// Build an engine; unparsable match patterns are logged and skipped.
    pub fn new(
        name: impl Into<String>,
        engine_url: Option<&str>,
        regexps: &[&str],
        format: ResponseFormat,
    ) -> Self {
        let name = name.into();
        let regexps = regexps
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(engine = %name, pattern, error = %e, "ignoring bad engine pattern");
                    None
                }
            })
            .collect();
        Self {
            name,
            engine_url: engine_url.map(str::to_string),
            regexps,
            format,
            example: None,
        }
    }

    pub fn with_example(mut self, keyword: &str, search_url: &str) -> Self {
        self.example = Some(EngineExample {
            keyword: keyword.to_string(),
            search_url: search_url.to_string(),
            description: None,
            explanation: None,
        });
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        if let Some(example) = self.example.as_mut() {
            example.description = Some(description.to_string());
        }
        self
    }

    pub fn with_explanation(mut self, explanation: &str) -> Self {
        if let Some(example) = self.example.as_mut() {
            example.explanation = Some(explanation.to_string());
        }
        self
    }

    pub fn matches(&self, search_url: &str) -> bool {
        self.regexps.iter().any(|re| re.is_match(search_url))
    }

    /// The catch-all engine that never produces completions.
    pub fn is_dummy(&self) -> bool {
        self.engine_url.is_none()
    }

    /// Suggestion endpoint for these terms.
    pub fn url_for(&self, query_terms: &[String]) -> Option<String> {
        self.engine_url
            .as_deref()
            .map(|template| create_search_url(&query_terms.join(" "), template))
    }

    pub fn parse(&self, body: &str) -> Result<Vec<String>, CompletionError> {
        self.format.parse(body)
    }
}

const GOOGLE_HOSTS: &str = r"^https?://[a-z]+\.google\.(com|ie|co\.(uk|jp)|ca|com\.au)/";

/// Built-in engines, most specific first; the last one matches everything.
pub fn builtin_engines() -> Vec<Arc<CompletionEngine>> {
    let google_maps_pattern = format!("{GOOGLE_HOSTS}maps");
    vec![
        CompletionEngine::new(
            "youtube",
            Some("https://suggestqueries.google.com/complete/search?client=youtube&ds=yt&xml=t&q=%s"),
            &[r"^https?://[a-z]+\.youtube\.com/results"],
            ResponseFormat::GoogleXml,
        )
        .with_example("y", "https://www.youtube.com/results?search_query=%s"),
        CompletionEngine::new(
            "google-maps",
            Some("https://suggestqueries.google.com/complete/search?ss_protocol=legace&client=toolbar&q=map+of+%s"),
            &[google_maps_pattern.as_str()],
            ResponseFormat::GoogleMapsXml,
        )
        .with_example("m", "https://www.google.com/maps?q=%s")
        .with_explanation(
            "Google completion with \"map of\" prepended to the query. Good for places and regions, not addresses.",
        ),
        CompletionEngine::new(
            "google",
            Some("https://suggestqueries.google.com/complete/search?ss_protocol=legace&client=toolbar&q=%s"),
            &[GOOGLE_HOSTS],
            ResponseFormat::GoogleXml,
        )
        .with_example("g", "https://www.google.com/search?q=%s"),
        CompletionEngine::new(
            "duckduckgo",
            Some("https://duckduckgo.com/ac/?q=%s"),
            &[r"^https?://([a-z]+\.)?duckduckgo\.com/"],
            ResponseFormat::DuckDuckGo,
        )
        .with_example("d", "https://duckduckgo.com/?q=%s"),
        CompletionEngine::new(
            "wikipedia",
            Some("https://en.wikipedia.org/w/api.php?action=opensearch&format=json&search=%s"),
            &[r"^https?://[a-z]+\.wikipedia\.org/"],
            ResponseFormat::OpenSearch,
        )
        .with_example(
            "w",
            "https://www.wikipedia.org/w/index.php?title=Special:Search&search=%s",
        ),
        CompletionEngine::new(
            "bing",
            Some("https://api.bing.com/osjson.aspx?query=%s"),
            &[r"^https?://www\.bing\.com/search"],
            ResponseFormat::OpenSearch,
        )
        .with_example("b", "https://www.bing.com/search?q=%s"),
        CompletionEngine::new(
            "amazon",
            Some("https://completion.amazon.com/search/complete?method=completion&search-alias=aps&client=amazon-search-ui&mkt=1&q=%s"),
            &[r"^https?://(www|smile)\.amazon\.(com|co\.uk|ca|de|com\.au)/s/"],
            ResponseFormat::OpenSearch,
        )
        .with_example("a", "https://www.amazon.com/s/?field-keywords=%s"),
        CompletionEngine::new(
            "amazon-japan",
            Some("https://completion.amazon.co.jp/search/complete?method=completion&search-alias=aps&client=amazon-search-ui&mkt=6&q=%s"),
            &[r"^https?://www\.amazon\.co\.jp/(s/|gp/search)"],
            ResponseFormat::OpenSearch,
        )
        .with_example("aj", "https://www.amazon.co.jp/s/?field-keywords=%s"),
        CompletionEngine::new(
            "webster",
            Some("https://www.merriam-webster.com/lapi/v1/mwol-search/autocomplete?search=%s"),
            &[r"^https?://www\.merriam-webster\.com/dictionary/"],
            ResponseFormat::Webster,
        )
        .with_example("dw", "https://www.merriam-webster.com/dictionary/%s")
        .with_description("Dictionary"),
        CompletionEngine::new(
            "qwant",
            Some("https://api.qwant.com/api/suggest?q=%s"),
            &[r"^https?://www\.qwant\.com/"],
            ResponseFormat::Qwant,
        )
        .with_example("qw", "https://www.qwant.com/?q=%s"),
        CompletionEngine::new(
            "uptodate",
            Some("https://www.uptodate.com/services/app/contents/search/autocomplete/json?term=%s&limit=10"),
            &[r"^https?://www\.uptodate\.com/"],
            ResponseFormat::UpToDate,
        )
        .with_example(
            "upto",
            "https://www.uptodate.com/contents/search?search=%s&searchType=PLAIN_TEXT&source=USER_INPUT&searchControl=TOP_PULLDOWN&autoComplete=false",
        ),
        CompletionEngine::new("dummy", None, &["."], ResponseFormat::Empty),
    ]
    .into_iter()
    .map(Arc::new)
    .collect()
}

/// The first engine in `engines` that accepts `search_url`.
pub fn lookup_engine(
    engines: &[Arc<CompletionEngine>],
    search_url: &str,
) -> Option<Arc<CompletionEngine>> {
    engines.iter().find(|e| e.matches(search_url)).cloned()
}
