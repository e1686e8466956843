//! Page analysis history.
//!
//! The history is an ordered, bounded list of [`HistoryEntry`] values,
//! most recent first, keyed implicitly by `(normalized URL, signature)`.
//! Full entries live in the "local" namespace; a small [`HistoryMeta`]
//! projection is re-derived into the "synced" namespace on every write.
//!
//! The history is a best-effort cache. Reads never fail: a missing store,
//! a storage error or malformed data all read as an empty history. Writes
//! without a local store are no-ops.

pub mod entry;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use entry::{
    EntrySource, HistoryEntry, HistoryMeta, PageDataSnapshot, PageMetrics, SaveRequest, build_page_snapshot,
    extract_metrics, to_analysis_text,
};

use crate::Error;
use crate::normalize::normalize_url;
use crate::page::PageSnapshot;
use crate::signature::{Signature, SignatureStrategy, compute_signature};
use crate::storage::KvStore;

pub const DEFAULT_LIMIT: usize = 20;
pub const LOCAL_KEY: &str = "analysisHistory";
pub const SYNC_KEY: &str = "analysisHistoryMeta";

/// Tunables for a [`HistoryStore`].
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Maximum number of entries kept (default: 20).
    pub limit: usize,
    /// Key of the entry list in the local namespace.
    pub local_key: String,
    /// Key of the meta list in the synced namespace.
    pub sync_key: String,
    pub signature_strategy: SignatureStrategy,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            local_key: LOCAL_KEY.to_string(),
            sync_key: SYNC_KEY.to_string(),
            signature_strategy: SignatureStrategy::default(),
        }
    }
}

/// The analysis history over two injected key-value namespaces.
///
/// There is no locking around read-modify-write: concurrent saves against
/// the same namespace are last-write-wins.
#[derive(Clone)]
pub struct HistoryStore {
    local: Option<Arc<dyn KvStore>>,
    synced: Option<Arc<dyn KvStore>>,
    options: HistoryOptions,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("local", &self.local.is_some())
            .field("synced", &self.synced.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl HistoryStore {
    /// Create a store over the given namespaces with default options.
    ///
    /// Either namespace may be absent; see the module docs for how that
    /// degrades.
    pub fn new(local: Option<Arc<dyn KvStore>>, synced: Option<Arc<dyn KvStore>>) -> Self {
        Self::with_options(local, synced, HistoryOptions::default())
    }

    pub fn with_options(
        local: Option<Arc<dyn KvStore>>, synced: Option<Arc<dyn KvStore>>, options: HistoryOptions,
    ) -> Self {
        if options.signature_strategy == SignatureStrategy::Fallback {
            tracing::warn!("history signatures use the fallback hash; collisions are possible");
        }
        Self { local, synced, options }
    }

    /// A store with no backing storage: reads are empty, writes do nothing.
    pub fn detached() -> Self {
        Self::new(None, None)
    }

    pub fn options(&self) -> &HistoryOptions {
        &self.options
    }

    /// All entries, most recent first.
    pub async fn get_history(&self) -> Vec<HistoryEntry> {
        read_list(self.local.as_deref(), &self.options.local_key).await
    }

    /// The synced meta projection, most recent first.
    pub async fn get_history_meta(&self) -> Vec<HistoryMeta> {
        read_list(self.synced.as_deref(), &self.options.sync_key).await
    }

    /// Remove all entries from both namespaces.
    pub async fn clear_history(&self) -> Result<(), Error> {
        if let Some(local) = &self.local {
            local.remove(&self.options.local_key).await?;
        }
        if let Some(synced) = &self.synced {
            synced.remove(&self.options.sync_key).await?;
        }
        tracing::debug!("history cleared");
        Ok(())
    }

    /// Signature of `page` under this store's strategy.
    pub fn compute_signature(&self, page: &PageSnapshot, normalized_url: &str) -> Result<Signature, Error> {
        compute_signature(page, normalized_url, self.options.signature_strategy)
    }

    /// Build an entry from `request` and persist it at the front of the
    /// history.
    ///
    /// An existing entry with the same `(normalized URL, signature)` is
    /// replaced, which moves the key to the front. Entries beyond the limit
    /// are dropped from the tail. Returns `Ok(None)` when there is no local
    /// namespace to write to.
    pub async fn save_analysis_entry(&self, request: SaveRequest) -> Result<Option<HistoryEntry>, Error> {
        let Some(local) = &self.local else {
            tracing::debug!("no local storage, history entry not saved");
            return Ok(None);
        };

        let entry = self.build_entry(&request)?;

        let mut history = self.get_history().await;
        history.retain(|item| !item.matches(&entry.normalized_url, &entry.page_signature));
        history.insert(0, entry.clone());
        history.truncate(self.options.limit);

        local
            .set(&self.options.local_key, serde_json::to_value(&history)?)
            .await?;
        self.persist_meta(&history).await;

        tracing::debug!(
            id = %entry.id,
            url = %entry.normalized_url,
            signature = %entry.page_signature,
            size = history.len(),
            "history entry saved"
        );

        Ok(Some(entry))
    }

    /// The cached entry for `url` and `signature`, if any.
    ///
    /// `url` is normalized before comparing, so e.g. a missing trailing
    /// slash still matches.
    pub async fn find_by_signature(&self, url: &str, signature: &str) -> Option<HistoryEntry> {
        if url.is_empty() || signature.is_empty() {
            return None;
        }
        let normalized_url = normalize_url(url);
        self.get_history()
            .await
            .into_iter()
            .find(|item| item.matches(&normalized_url, signature))
    }

    fn build_entry(&self, request: &SaveRequest) -> Result<HistoryEntry, Error> {
        let original_url = request.page_url().to_string();
        let normalized_url = normalize_url(&original_url);
        let page_signature = self.resolve_signature(request, &normalized_url)?;

        let empty = PageSnapshot::default();
        let page = request.page_data.as_ref().unwrap_or(&empty);

        Ok(HistoryEntry {
            id: entry::new_entry_id(),
            normalized_url,
            original_url,
            page_title: page.title.clone(),
            page_signature,
            created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            source: request.source.clone(),
            analysis_text: to_analysis_text(&request.analysis_text),
            page_metrics: extract_metrics(page),
            page_data: (!page.is_empty()).then(|| build_page_snapshot(page)),
        })
    }

    /// Explicit signature, then cache key, then a freshly computed one.
    fn resolve_signature(&self, request: &SaveRequest, normalized_url: &str) -> Result<String, Error> {
        match request.supplied_signature() {
            Some(signature) => Ok(signature.to_string()),
            None => {
                let page = request.page_data.clone().unwrap_or_default();
                Ok(self.compute_signature(&page, normalized_url)?.to_string())
            }
        }
    }

    async fn persist_meta(&self, history: &[HistoryEntry]) {
        let Some(synced) = &self.synced else {
            return;
        };
        let meta: Vec<HistoryMeta> = history.iter().map(HistoryMeta::from).collect();
        let result = match serde_json::to_value(&meta) {
            Ok(value) => synced.set(&self.options.sync_key, value).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist history meta");
        }
    }
}

/// Read a JSON list, skipping elements that don't deserialize.
async fn read_list<T: DeserializeOwned>(store: Option<&dyn KvStore>, key: &str) -> Vec<T> {
    let Some(store) = store else {
        return Vec::new();
    };

    let items = match store.get(key).await {
        Ok(Some(Value::Array(items))) => items,
        Ok(Some(other)) => {
            tracing::warn!(key, kind = value_kind(&other), "stored history is not a list, ignoring");
            return Vec::new();
        }
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read history");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(key, error = %e, "skipping malformed history item");
                None
            }
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
