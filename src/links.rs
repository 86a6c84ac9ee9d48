//! Link parsing for report sections
//!
//! Operators paste links in whatever shape they have at hand: markdown
//! anchors, `Name — url`, `Name url`, or a bare url. Each line is matched
//! against those shapes in a fixed priority order and the first hit wins.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Short-link domain of the messaging platform; `t.me/<channel>/<post>`
/// is labelled with the channel name.
const SHORT_LINK_HOSTS: &[&str] = &["t.me", "telegram.me"];

/// Host substrings mapped to the display name used in reports.
///
/// Order matters: the first matching substring wins.
const SOCIAL_DOMAINS: &[(&str, &str)] = &[
    ("vk.com", "VK"),
    ("vkvideo.ru", "VK Видео"),
    ("ok.ru", "Одноклассники"),
    ("dzen.ru", "Дзен"),
    ("youtube.com", "YouTube"),
    ("youtu.be", "YouTube"),
    ("rutube.ru", "RUTUBE"),
    ("instagram.com", "Instagram"),
    ("tiktok.com", "TikTok"),
    ("twitter.com", "Twitter"),
    ("facebook.com", "Facebook"),
    ("pikabu.ru", "Пикабу"),
];

static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https?://[^\s)]+)\)").expect("markdown link pattern")
});

static SEPARATED_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(.+?)\s*[—–:\-]\s*(https?://\S+)").expect("separated link pattern")
});

static SPACED_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(.+?)\s+(https?://\S+)").expect("spaced link pattern"));

static BARE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("bare url pattern"));

/// A rendered link: display label plus target url
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub label: String,
    pub url: String,
}

impl LinkEntry {
    fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Turn freeform lines into labelled links, one entry per recognised line.
///
/// Lines that match none of the shapes are dropped. Order follows the input
/// and duplicate urls are kept.
pub fn parse_labeled_links<S: AsRef<str>>(lines: &[S]) -> Vec<LinkEntry> {
    lines
        .iter()
        .map(AsRef::as_ref)
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_line)
        .collect()
}

/// Extract the first bare url of every line, without relabelling.
pub fn extract_urls_only<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| BARE_URL.find(line.as_ref()))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn parse_line(line: &str) -> Option<LinkEntry> {
    if let Some(caps) = MARKDOWN_LINK.captures(line) {
        return Some(LinkEntry::new(&caps[1], &caps[2]));
    }

    if let Some(caps) = SEPARATED_LINK.captures(line) {
        let label = caps[1].trim();
        if !label.is_empty() {
            return Some(LinkEntry::new(label, &caps[2]));
        }
    }

    if let Some(caps) = SPACED_LINK.captures(line) {
        let label = caps[1].trim();
        if !label.is_empty() && !label.contains("http") {
            return Some(LinkEntry::new(label, &caps[2]));
        }
    }

    BARE_URL.find(line).map(|m| {
        let url = m.as_str();
        LinkEntry::new(label_for_url(url), url)
    })
}

/// Synthesize a label for a bare url.
///
/// Short links become their channel name, known social hosts their
/// platform name, anything else its host without `www.`. Unparsable urls
/// label themselves.
pub fn label_for_url(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return raw.to_string();
    };
    let Some(host) = url.host_str().map(str::to_lowercase) else {
        return raw.to_string();
    };

    if SHORT_LINK_HOSTS.contains(&host.as_str()) {
        let channel = url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|segment| !segment.is_empty());
        if let Some(channel) = channel {
            return channel.to_string();
        }
    }

    if let Some((_, name)) = SOCIAL_DOMAINS.iter().find(|(domain, _)| host.contains(domain)) {
        return (*name).to_string();
    }

    host.strip_prefix("www.").unwrap_or(&host).to_string()
}
