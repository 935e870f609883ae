//! Lexical conventions shared by extraction, description and formatting.
//!
//! A place mention is a name wrapped in double asterisks (`**Old Town**`).
//! A day header is a line such as `### Day 2: Old Town` or `- Day 3 - Coast`.

use regex::Regex;
use std::sync::LazyLock;

pub(crate) static PLACE_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

static DAY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#*\s*day\s*(\d+)\s*(?:[:\-–—]\s*)?(.*)$").unwrap()
});

/// Whole day-header lines inside a multi-line text
pub(crate) static DAY_HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*[-*•]?[ \t]*#*[ \t]*day[ \t]*\d+.*$").unwrap()
});

static HEADING_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*#+\s*").unwrap());

// A `*` bullet needs trailing whitespace so `**Name**` is left intact
static BULLET_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-•]\s*|\*\s+)").unwrap());

static NUMBERING_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+\.\s*").unwrap());

static LEADING_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[#\-*•]+[\s:]*)+").unwrap());

/// A recognized day header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayHeader {
    /// Day number exactly as written
    pub day: String,
    /// Free text after the separator, possibly empty
    pub subtitle: String,
}

impl DayHeader {
    /// `Day <n>` or `Day <n>: <subtitle>`
    #[must_use]
    pub fn title(&self) -> String {
        if self.subtitle.is_empty() {
            format!("Day {}", self.day)
        } else {
            format!("Day {}: {}", self.day, self.subtitle)
        }
    }
}

/// Recognize a day header after stripping heading and bullet markers
#[must_use]
pub fn parse_day_header(line: &str) -> Option<DayHeader> {
    let line = strip_bullet(strip_heading(line.trim()));
    let captures = DAY_HEADER.captures(line)?;
    Some(DayHeader {
        day: captures[1].to_string(),
        subtitle: captures
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
    })
}

/// Remove leading `#` heading markers
#[must_use]
pub fn strip_heading(line: &str) -> &str {
    match HEADING_PREFIX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Remove a single leading bullet (`-`, `*`, `•`)
#[must_use]
pub fn strip_bullet(line: &str) -> &str {
    match BULLET_PREFIX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Remove leading list numbering such as `3. `
#[must_use]
pub fn strip_numbering(line: &str) -> &str {
    match NUMBERING_PREFIX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Strip any run of leading markdown-like tokens (`###`, `-`, `*`, bullets)
#[must_use]
pub fn sanitize_leading(text: &str) -> String {
    LEADING_TOKENS.replace(text, "").trim().to_string()
}

/// Replace every `**mention**` with its bare text
#[must_use]
pub fn strip_marker_delimiters(text: &str) -> String {
    PLACE_MENTION.replace_all(text, "$1").into_owned()
}

/// Escape a value for use inside a double-quoted HTML attribute
#[must_use]
pub fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
