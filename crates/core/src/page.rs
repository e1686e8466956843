//! Page snapshots produced by the page scraper.
//!
//! A snapshot is ephemeral input: it is produced per analysis request and
//! only the bounded projections built by the history store are persisted.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything the scraper captured about a page.
///
/// All fields are optional on the wire; absent fields take empty defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub headings: Vec<Heading>,
    pub links: Vec<PageLink>,
    pub images: Vec<PageImage>,
    pub word_count: Option<WordCount>,
    pub language: String,
    pub timestamp: Option<String>,
}

impl PageSnapshot {
    /// True when nothing at all was captured.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Total word count, or 0 when the scraper did not count words.
    pub fn total_words(&self) -> u64 {
        self.word_count.as_ref().map_or(0, |wc| wc.total)
    }
}

/// A heading element (`h1`..`h6`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PageLink {
    pub text: String,
    pub href: String,
    pub is_external: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PageImage {
    pub src: String,
    pub alt: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

/// Word counts split by script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WordCount {
    pub total: u64,
    pub chinese: u64,
    pub english: u64,
}

/// Truncate `text` to at most `max_chars` characters.
///
/// Truncated text gets a trailing ellipsis (`…`) so previews never pass for
/// the full value.
pub fn slice_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}…", &text[..cut]),
    }
}
