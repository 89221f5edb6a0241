//! Listener track requests
//!
//! Free-text requests such as `artist - "title"` or `"title" by artist` are
//! split into artist and title, and matched against a record with case and
//! diacritics folded.

use crate::types::{fields, Metadata};
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static MENTION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+for\s+@\S+\s*$").expect("valid regex"));

static QUOTED_TITLE_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"([^"]*)"$"#).expect("valid regex"));

static QUOTED_TITLE_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^"(?P<title>[^"]+)"\s*(?:-|\bby\b)\s*(?P<artist>.+)$"#).expect("valid regex")
});

static SPACED_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<artist>.+?)\s+-\s+(?P<title>.+)$").expect("valid regex"));

static BARE_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<artist>.+?)-(?P<title>.+)$").expect("valid regex"));

/// Artist and title pulled out of request text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRequest {
    pub artist: Option<String>,
    pub title: Option<String>,
}

fn clean(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
}

/// Split request text into artist and title
pub fn parse_request(text: &str) -> ParsedRequest {
    let text = MENTION_SUFFIX.replace(text.trim(), "");
    let text = text.trim();

    if let Some(caps) = QUOTED_TITLE_ONLY.captures(text) {
        return ParsedRequest {
            artist: None,
            title: clean(&caps[1]),
        };
    }

    if let Some(caps) = QUOTED_TITLE_FIRST.captures(text) {
        return ParsedRequest {
            artist: clean(&caps["artist"]),
            title: clean(&caps["title"]),
        };
    }

    if let Some(caps) = SPACED_DASH
        .captures(text)
        .or_else(|| BARE_DASH.captures(text))
    {
        return ParsedRequest {
            artist: clean(&caps["artist"]),
            title: clean(unquote(&caps["title"])),
        };
    }

    ParsedRequest {
        artist: clean(text),
        title: None,
    }
}

/// Fold case and strip diacritics (`Níne Ínch Näíls` matches `nine inch nails`)
pub fn normalize_for_match(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// One listener request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRequest {
    pub artist: Option<String>,
    pub title: Option<String>,
    /// Account name of the requester
    pub requester: String,
    pub requestdisplayname: Option<String>,
}

impl TrackRequest {
    pub fn new(requester: impl Into<String>, text: &str) -> Self {
        let parsed = parse_request(text);
        Self {
            artist: parsed.artist,
            title: parsed.title,
            requester: requester.into(),
            requestdisplayname: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.requestdisplayname = Some(name.into());
        self
    }

    /// Whether the record is the requested track
    ///
    /// Every part the request names must match; an empty request matches nothing.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        if self.artist.is_none() && self.title.is_none() {
            return false;
        }
        let same = |wanted: &Option<String>, key: &str| match wanted {
            Some(wanted) => metadata
                .get_text(key)
                .map(|have| normalize_for_match(&have) == normalize_for_match(wanted))
                .unwrap_or(false),
            None => true,
        };
        same(&self.artist, fields::ARTIST) && same(&self.title, fields::TITLE)
    }

    /// Copy request fields into a record
    pub fn apply_to(&self, metadata: &mut Metadata) {
        if let Some(artist) = &self.artist {
            metadata.insert(fields::REQUESTARTIST, artist.as_str());
        }
        if let Some(title) = &self.title {
            metadata.insert(fields::REQUESTTITLE, title.as_str());
        }
        metadata.insert(fields::REQUESTER, self.requester.as_str());
        if let Some(name) = &self.requestdisplayname {
            metadata.insert(fields::REQUESTDISPLAYNAME, name.as_str());
        }
    }
}
