//! URL classification and search-URL helpers.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use url::form_urlencoded;

#[cfg(test)]
#[path = "url_utils_tests.rs"]
mod tests;

/// Search URL used when none is configured.
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search?q=";

const CHROME_PREFIXES: &[&str] = &[
    "about:",
    "view-source:",
    "extension:",
    "chrome-extension:",
    "data:",
];

const SPECIAL_HOST_NAMES: &[&str] = &["localhost"];

const OTHER_TLDS: &[&str] = &["local", "onion"];

const KNOWN_TLDS: &str = "\
com org net edu gov mil int info biz name pro aero coop museum mobi asia tel travel jobs cat post xxx \
app dev page io ai co me tv cc ly gg sh to fm am xyz online site tech store blog shop cloud club \
design live news space website social media network digital agency studio today world life email \
solutions services systems software company center zone tools wiki academy art bar bike build care \
cash city codes community computer consulting dating direct education energy engineering enterprises \
equipment events exchange expert express finance financial foundation fund games gallery global gold \
group guide guru health help holdings host house institute international investments land lawyer legal \
link ltd management market marketing money ninja one partners photo photography photos pics pizza place \
plus press productions properties reviews rocks run school science security show singles ski soccer \
social software solar support surf systems team technology tips top town toys trade training tube \
university vacations ventures video vision watch win works wtf yoga zone google youtube amazon \
ac ad ae af ag ai al am ao aq ar as at au aw ax az ba bb bd be bf bg bh bi bj bm bn bo br bs bt bw \
by bz ca cd cf cg ch ci ck cl cm cn co cr cu cv cw cx cy cz de dj dk dm do dz ec ee eg er es et eu fi \
fj fk fm fo fr ga gb gd ge gf gg gh gi gl gm gn gp gq gr gs gt gu gw gy hk hm hn hr ht hu id ie il im \
in io iq ir is it je jm jo jp ke kg kh ki km kn kp kr kw ky kz la lb lc li lk lr ls lt lu lv ly ma mc \
md me mg mh mk ml mm mn mo mp mq mr ms mt mu mv mw mx my mz na nc ne nf ng ni nl no np nr nu nz om pa \
pe pf pg ph pk pl pm pn pr ps pt pw py qa re ro rs ru rw sa sb sc sd se sg sh si sk sl sm sn so sr ss \
st su sv sx sy sz tc td tf tg th tj tk tl tm tn to tr tt tv tw tz ua ug uk us uy uz va vc ve vg vi vn \
vu wf ws ye yt za zm zw";

static TLDS: Lazy<HashSet<&'static str>> = Lazy::new(|| KNOWN_TLDS.split_whitespace().collect());

static FULL_URL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][-+.a-z0-9]{2,}://.").expect("valid regex"));

static HOST_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:([^:]+)(?::([^:]+))?@)?([^:]+|\[[^\]]+\])(?::(\d+))?$").expect("valid regex")
});

static IPV4: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").expect("valid regex"));

static HTTP_PROTOCOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://").expect("valid regex"));

static QUERY_TERMINATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&#/]").expect("valid regex"));

static PROTOCOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][-+.a-z0-9]*:").expect("valid regex"));

/// Heuristic: does `s` look like something the user meant to open rather than search for?
pub fn is_url(s: &str) -> bool {
    if s.contains(' ') {
        return false;
    }
    if has_full_url_prefix(s) {
        return true;
    }

    let head = s.split('/').next().unwrap_or_default();
    let Some(captures) = HOST_PART.captures(head) else {
        return false;
    };
    let host = captures.get(3).map(|m| m.as_str()).unwrap_or_default();

    if SPECIAL_HOST_NAMES.contains(&host) {
        return true;
    }
    // The host pattern only admits colons inside IPv6 brackets.
    if host.contains(':') {
        return true;
    }

    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() > 1 {
        if let Some(last) = parts.last() {
            if TLDS.contains(last) || OTHER_TLDS.contains(last) {
                return true;
            }
        }
    }

    IPV4.is_match(host)
}

pub fn has_chrome_prefix(url: &str) -> bool {
    CHROME_PREFIXES.iter().any(|prefix| url.starts_with(prefix))
}

pub fn has_javascript_prefix(url: &str) -> bool {
    url.starts_with("javascript:")
}

pub fn has_full_url_prefix(url: &str) -> bool {
    FULL_URL_PREFIX.is_match(url)
}

/// True when `url` starts with any scheme, e.g. `http:` or `javascript:`.
pub fn url_has_protocol(url: &str) -> bool {
    PROTOCOL.is_match(url)
}

/// Prefix partial URLs with `http://`.
pub fn create_full_url(partial: &str) -> String {
    if has_full_url_prefix(partial) {
        partial.to_string()
    } else {
        format!("http://{partial}")
    }
}

/// Turn user input into something to navigate to: a URL as-is, or a search.
pub fn convert_to_url(input: &str, search_url: &str) -> String {
    let input = input.trim();
    if has_chrome_prefix(input) || has_javascript_prefix(input) {
        input.to_string()
    } else if is_url(input) {
        create_full_url(input)
    } else {
        create_search_url(input, search_url)
    }
}

/// Percent-encode each whitespace-separated word and join with `%20`.
pub fn create_search_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| form_urlencoded::byte_serialize(word.as_bytes()).collect::<String>())
        .collect::<Vec<_>>()
        .join("%20")
}

/// Substitute the query into `search_url`: `%S` verbatim and `%s` encoded.
/// A template without either placeholder gets `%s` appended.
pub fn create_search_url(query: &str, search_url: &str) -> String {
    let mut template = search_url.to_string();
    if !template.contains("%s") && !template.contains("%S") {
        template.push_str("%s");
    }
    template
        .replace("%S", query)
        .replace("%s", &create_search_query(query))
}

/// Recover the search terms from `url`, if it could have been produced by `search_url`.
pub fn extract_query(search_url: &str, url: &str) -> Option<String> {
    let url = HTTP_PROTOCOL.replace(url, "");
    let search_url = HTTP_PROTOCOL.replace(search_url, "");
    let mut pieces = search_url.split("%s");
    let head = pieces.next().unwrap_or_default();

    if !url.starts_with(head) {
        return None;
    }
    if pieces.any(|suffix| !url.contains(suffix)) {
        return None;
    }

    let rest = &url[head.len()..];
    let raw = QUERY_TERMINATOR.split(rest).next().unwrap_or_default();
    let words: Vec<String> = raw.split('+').map(decode_component).collect();
    Some(words.join(" "))
}

fn decode_component(component: &str) -> String {
    // `+` has already been split off, so this only undoes percent-escapes.
    form_urlencoded::parse(format!("q={component}").as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}
