//! History entry types and the pure parts of entry building.

use std::borrow::Cow;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::page::{Heading, PageSnapshot, WordCount, slice_text};

const SNAPSHOT_HEADINGS: usize = 20;
const SNAPSHOT_CONTENT_CHARS: usize = 500;
const META_PREVIEW_CHARS: usize = 140;

/// Where an entry's analysis came from.
///
/// Unknown tags round-trip unchanged through [`EntrySource::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntrySource {
    #[default]
    Ai,
    ManualRefresh,
    Other(String),
}

impl EntrySource {
    pub fn as_str(&self) -> &str {
        match self {
            EntrySource::Ai => "ai",
            EntrySource::ManualRefresh => "manual-refresh",
            EntrySource::Other(tag) => tag,
        }
    }
}

impl From<String> for EntrySource {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "ai" => EntrySource::Ai,
            "manual-refresh" => EntrySource::ManualRefresh,
            _ => EntrySource::Other(tag),
        }
    }
}

impl From<EntrySource> for String {
    fn from(source: EntrySource) -> Self {
        source.as_str().to_string()
    }
}

impl JsonSchema for EntrySource {
    fn schema_name() -> Cow<'static, str> {
        "EntrySource".into()
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        <String as JsonSchema>::json_schema(generator)
    }
}

/// Summary counts derived from a page snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    pub language: String,
    pub headings: usize,
    pub links: usize,
    pub images: usize,
    pub word_count: Option<WordCount>,
    pub timestamp: Option<String>,
}

/// The bounded copy of a page snapshot kept with an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageDataSnapshot {
    pub title: String,
    pub url: String,
    pub description: String,
    pub language: String,
    pub word_count: Option<WordCount>,
    pub headings: Vec<Heading>,
    pub content_preview: String,
    pub timestamp: Option<String>,
}

/// A persisted page analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub normalized_url: String,
    pub original_url: String,
    pub page_title: String,
    pub page_signature: String,
    pub created_at: String,
    pub source: EntrySource,
    pub analysis_text: String,
    pub page_metrics: PageMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_data: Option<PageDataSnapshot>,
}

impl HistoryEntry {
    /// Whether this entry is the cached analysis for `(normalized_url, signature)`.
    pub fn matches(&self, normalized_url: &str, signature: &str) -> bool {
        self.normalized_url == normalized_url && self.page_signature == signature
    }
}

/// The small projection of an entry kept in the synced namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMeta {
    pub id: String,
    pub normalized_url: String,
    pub page_title: String,
    pub analysis_preview: String,
    pub created_at: String,
    pub original_url: String,
}

impl From<&HistoryEntry> for HistoryMeta {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id.clone(),
            normalized_url: entry.normalized_url.clone(),
            page_title: entry.page_title.clone(),
            analysis_preview: slice_text(&entry.analysis_text, META_PREVIEW_CHARS),
            created_at: entry.created_at.clone(),
            original_url: entry.original_url.clone(),
        }
    }
}

/// What a caller hands to [`HistoryStore::save_analysis_entry`].
///
/// [`HistoryStore::save_analysis_entry`]: super::HistoryStore::save_analysis_entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveRequest {
    /// Page URL; falls back to `pageData.url`.
    pub url: Option<String>,
    pub page_data: Option<PageSnapshot>,
    /// Analysis result in any shape; see [`to_analysis_text`].
    pub analysis_text: Value,
    /// Explicit signature, preferred over everything else.
    pub page_signature: Option<String>,
    pub source: EntrySource,
    /// Signature the caller used as a request key, second choice.
    pub cache_key: Option<String>,
}

impl SaveRequest {
    /// The URL this entry is about: `url`, else the snapshot's URL.
    pub fn page_url(&self) -> &str {
        self.url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.page_data.as_ref().map(|p| p.url.as_str()))
            .unwrap_or("")
    }

    /// The caller-supplied signature, in priority order, if any.
    ///
    /// Empty strings count as absent.
    pub fn supplied_signature(&self) -> Option<&str> {
        [self.page_signature.as_deref(), self.cache_key.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }
}

/// Flatten an analysis result into plain text.
///
/// - strings pass through
/// - objects with a non-empty string `analysis` field are unwrapped
/// - arrays are joined with newlines
/// - other objects become compact JSON
/// - numbers, booleans and null become empty
pub fn to_analysis_text(input: &Value) -> String {
    match input {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("analysis") {
            Some(Value::String(text)) if !text.is_empty() => text.clone(),
            _ => input.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Number(_) | Value::Bool(_) | Value::Null => String::new(),
    }
}

pub fn extract_metrics(page: &PageSnapshot) -> PageMetrics {
    PageMetrics {
        language: page.language.clone(),
        headings: page.headings.len(),
        links: page.links.len(),
        images: page.images.len(),
        word_count: page.word_count,
        timestamp: page.timestamp.clone(),
    }
}

pub fn build_page_snapshot(page: &PageSnapshot) -> PageDataSnapshot {
    PageDataSnapshot {
        title: page.title.clone(),
        url: page.url.clone(),
        description: page.description.clone(),
        language: page.language.clone(),
        word_count: page.word_count,
        headings: page.headings.iter().take(SNAPSHOT_HEADINGS).cloned().collect(),
        content_preview: slice_text(&page.content, SNAPSHOT_CONTENT_CHARS),
        timestamp: page.timestamp.clone(),
    }
}

/// `<unix millis>-<6 hex chars>`; unique enough for a 20-entry list.
pub(crate) fn new_entry_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), &suffix[..6])
}
